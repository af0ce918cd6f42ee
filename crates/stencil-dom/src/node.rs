//! Shared-ownership DOM nodes.
//!
//! A [`Node`] is a cheap handle to a reference-counted tree node. Cloning a
//! handle never copies the node; use [`Node::deep_clone`] for that. Identity
//! comparisons go through [`Node::ptr_eq`].
//!
//! Elements carry both serialized attributes and live properties. Attributes
//! are what [`Node::outer_html`](crate::Node::outer_html) writes out;
//! properties model browser-style live state (`value` on inputs, `selected`
//! on options, `checked` on checkboxes) that exists independently of the
//! serialized form.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// The kind of a DOM node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// An element with a tag name, attributes and children.
    Element,
    /// A text node.
    Text,
    /// A comment node.
    Comment,
}

#[derive(Debug, Clone)]
enum Payload {
    Element { tag: String },
    Text(String),
    Comment(String),
}

struct NodeData {
    payload: Payload,
    attrs: Vec<(String, String)>,
    props: BTreeMap<String, String>,
    parent: Weak<RefCell<NodeData>>,
    children: Vec<Node>,
}

/// Handle to a DOM node.
#[derive(Clone)]
pub struct Node(Rc<RefCell<NodeData>>);

impl Node {
    fn new(payload: Payload) -> Self {
        Self(Rc::new(RefCell::new(NodeData {
            payload,
            attrs: Vec::new(),
            props: BTreeMap::new(),
            parent: Weak::new(),
            children: Vec::new(),
        })))
    }

    /// Create a detached element node.
    #[must_use]
    pub fn element(tag: impl Into<String>) -> Self {
        Self::new(Payload::Element { tag: tag.into() })
    }

    /// Create a detached text node.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(Payload::Text(content.into()))
    }

    /// Create a detached comment node.
    #[must_use]
    pub fn comment(content: impl Into<String>) -> Self {
        Self::new(Payload::Comment(content.into()))
    }

    /// The kind of this node.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self.0.borrow().payload {
            Payload::Element { .. } => NodeKind::Element,
            Payload::Text(_) => NodeKind::Text,
            Payload::Comment(_) => NodeKind::Comment,
        }
    }

    /// Whether this node is an element.
    #[must_use]
    pub fn is_element(&self) -> bool {
        self.kind() == NodeKind::Element
    }

    /// Whether this node is a comment.
    #[must_use]
    pub fn is_comment(&self) -> bool {
        self.kind() == NodeKind::Comment
    }

    /// Tag name, lowercased as stored. `None` for non-elements.
    #[must_use]
    pub fn tag(&self) -> Option<String> {
        match &self.0.borrow().payload {
            Payload::Element { tag } => Some(tag.clone()),
            _ => None,
        }
    }

    /// Text or comment content. `None` for elements.
    #[must_use]
    pub fn node_value(&self) -> Option<String> {
        match &self.0.borrow().payload {
            Payload::Element { .. } => None,
            Payload::Text(s) | Payload::Comment(s) => Some(s.clone()),
        }
    }

    /// Replace the content of a text or comment node. No-op for elements.
    pub fn set_node_value(&self, value: impl Into<String>) {
        let mut data = self.0.borrow_mut();
        match &mut data.payload {
            Payload::Element { .. } => {}
            Payload::Text(s) | Payload::Comment(s) => *s = value.into(),
        }
    }

    /// Identity comparison: do both handles point at the same node?
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // Attributes ----------------------------------------------------------

    /// Serialized attribute value, if present.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<String> {
        self.0
            .borrow()
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    /// Set (or overwrite) a serialized attribute.
    pub fn set_attr(&self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        let mut data = self.0.borrow_mut();
        if let Some(entry) = data.attrs.iter_mut().find(|(k, _)| *k == name) {
            entry.1 = value;
        } else {
            data.attrs.push((name, value));
        }
    }

    /// Remove a serialized attribute.
    pub fn remove_attr(&self, name: &str) {
        self.0.borrow_mut().attrs.retain(|(k, _)| k != name);
    }

    /// All attributes in insertion order.
    #[must_use]
    pub fn attrs(&self) -> Vec<(String, String)> {
        self.0.borrow().attrs.clone()
    }

    /// Class attribute split on whitespace.
    #[must_use]
    pub fn classes(&self) -> Vec<String> {
        self.attr("class")
            .map(|c| c.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default()
    }

    // Live properties -----------------------------------------------------

    /// Live property value, if set.
    #[must_use]
    pub fn prop(&self, name: &str) -> Option<String> {
        self.0.borrow().props.get(name).cloned()
    }

    /// Set a live property.
    pub fn set_prop(&self, name: impl Into<String>, value: impl Into<String>) {
        self.0.borrow_mut().props.insert(name.into(), value.into());
    }

    /// Remove a live property.
    pub fn remove_prop(&self, name: &str) {
        self.0.borrow_mut().props.remove(name);
    }

    // Tree structure ------------------------------------------------------

    /// Parent node, if attached.
    #[must_use]
    pub fn parent(&self) -> Option<Node> {
        self.0.borrow().parent.upgrade().map(Node)
    }

    /// Snapshot of child handles.
    #[must_use]
    pub fn children(&self) -> Vec<Node> {
        self.0.borrow().children.clone()
    }

    /// Number of children.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.0.borrow().children.len()
    }

    /// First child, if any.
    #[must_use]
    pub fn first_child(&self) -> Option<Node> {
        self.0.borrow().children.first().cloned()
    }

    /// Position of this node in its parent's child list.
    #[must_use]
    pub fn index_in_parent(&self) -> Option<usize> {
        let parent = self.parent()?;
        let index = parent
            .0
            .borrow()
            .children
            .iter()
            .position(|c| c.ptr_eq(self));
        index
    }

    /// The sibling immediately after this node.
    #[must_use]
    pub fn next_sibling(&self) -> Option<Node> {
        let parent = self.parent()?;
        let index = self.index_in_parent()?;
        let sibling = parent.0.borrow().children.get(index + 1).cloned();
        sibling
    }

    /// Detach this node from its parent, if attached.
    pub fn detach(&self) {
        if let Some(parent) = self.parent() {
            parent
                .0
                .borrow_mut()
                .children
                .retain(|c| !c.ptr_eq(self));
        }
        self.0.borrow_mut().parent = Weak::new();
    }

    /// Append `child` as the last child, detaching it from any previous
    /// parent first.
    pub fn append_child(&self, child: &Node) {
        child.detach();
        child.0.borrow_mut().parent = Rc::downgrade(&self.0);
        self.0.borrow_mut().children.push(child.clone());
    }

    /// Insert `new` immediately before `reference`. Appends when
    /// `reference` is not a child of this node.
    pub fn insert_before(&self, new: &Node, reference: &Node) {
        new.detach();
        let index = self
            .0
            .borrow()
            .children
            .iter()
            .position(|c| c.ptr_eq(reference));
        new.0.borrow_mut().parent = Rc::downgrade(&self.0);
        match index {
            Some(i) => self.0.borrow_mut().children.insert(i, new.clone()),
            None => self.0.borrow_mut().children.push(new.clone()),
        }
    }

    /// Remove `child` from this node. No-op when `child` is not a child.
    pub fn remove_child(&self, child: &Node) {
        let mut data = self.0.borrow_mut();
        if let Some(i) = data.children.iter().position(|c| c.ptr_eq(child)) {
            data.children.remove(i);
            drop(data);
            child.0.borrow_mut().parent = Weak::new();
        }
    }

    /// Replace `old` with `new` in place. No-op when `old` is not a child.
    pub fn replace_child(&self, new: &Node, old: &Node) {
        let index = self
            .0
            .borrow()
            .children
            .iter()
            .position(|c| c.ptr_eq(old));
        let Some(i) = index else { return };
        new.detach();
        new.0.borrow_mut().parent = Rc::downgrade(&self.0);
        old.0.borrow_mut().parent = Weak::new();
        self.0.borrow_mut().children[i] = new.clone();
    }

    /// Remove all children.
    pub fn clear_children(&self) {
        let children = std::mem::take(&mut self.0.borrow_mut().children);
        for child in children {
            child.0.borrow_mut().parent = Weak::new();
        }
    }

    // Content -------------------------------------------------------------

    /// Concatenated text of this subtree. Comments do not contribute to an
    /// element's text; a comment's own value is returned when called on it.
    #[must_use]
    pub fn text_content(&self) -> String {
        if let Payload::Text(s) | Payload::Comment(s) = &self.0.borrow().payload {
            return s.clone();
        }
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Replace an element's children with a single text node. For text and
    /// comment nodes this sets the node value.
    pub fn set_text_content(&self, content: impl Into<String>) {
        if self.is_element() {
            self.clear_children();
            self.append_child(&Node::text(content));
        } else {
            self.set_node_value(content);
        }
    }

    /// Deep copy of this subtree. The clone is detached and shares no state
    /// with the original.
    #[must_use]
    pub fn deep_clone(&self) -> Node {
        let data = self.0.borrow();
        let clone = Node::new(data.payload.clone());
        {
            let mut clone_data = clone.0.borrow_mut();
            clone_data.attrs = data.attrs.clone();
            clone_data.props = data.props.clone();
        }
        for child in &data.children {
            clone.append_child(&child.deep_clone());
        }
        clone
    }

    /// All descendants in document order, excluding this node.
    #[must_use]
    pub fn descendants(&self) -> Vec<Node> {
        let mut out = Vec::new();
        collect_descendants(self, &mut out);
        out
    }
}

fn collect_text(node: &Node, out: &mut String) {
    for child in node.children() {
        match &child.0.borrow().payload {
            Payload::Text(s) => out.push_str(s),
            Payload::Comment(_) => {}
            Payload::Element { .. } => {}
        }
        if child.is_element() {
            collect_text(&child, out);
        }
    }
}

fn collect_descendants(node: &Node, out: &mut Vec<Node>) {
    for child in node.children() {
        out.push(child.clone());
        collect_descendants(&child, out);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.borrow().payload {
            Payload::Element { tag } => write!(f, "Element(<{tag}>)"),
            Payload::Text(s) => write!(f, "Text({s:?})"),
            Payload::Comment(s) => write!(f, "Comment({s:?})"),
        }
    }
}
