//! Write-site location, including loop reconciliation.
//!
//! A finder resolves the nodes a binding writes to. For loops it also
//! patches the DOM so that exactly one node exists per collection item,
//! growing from pristine basis clones and marking an emptied collection
//! with a tagged comment so the insertion point survives.

use std::rc::Rc;

use serde_json::Value;
use stencil_dom::{Node, NodeKind};

use crate::backend::QueryBackend;
use crate::error::RenderError;
use crate::template::Formatted;

pub enum Finder {
    /// The current node itself.
    Top,
    /// All descendants matching a selector.
    Query {
        backend: Rc<dyn QueryBackend>,
        selector: String,
    },
    /// A reconciled run of loop nodes.
    Loop(LoopFinder),
}

impl Finder {
    /// Resolve the nodes to write, mutating the DOM for loops.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::MissingLoopTemplate`] when a loop must grow
    /// but no basis template exists for its selector.
    pub fn resolve(&self, target: &Node, bound: &Formatted) -> Result<Vec<Node>, RenderError> {
        match self {
            Self::Top => Ok(vec![target.clone()]),
            Self::Query { backend, selector } => {
                backend.query(std::slice::from_ref(target), selector)
            }
            Self::Loop(finder) => {
                let len = match bound {
                    Formatted::Value(Value::Array(items)) => items.len(),
                    Formatted::Value(_) | Formatted::Node(_) => 0,
                };
                finder.reconcile(target, len)
            }
        }
    }

    /// Locate nodes without structural mutation (the parse direction).
    pub fn locate(&self, target: &Node) -> Result<Vec<Node>, RenderError> {
        match self {
            Self::Top => Ok(vec![target.clone()]),
            Self::Query { backend, selector }
            | Self::Loop(LoopFinder {
                backend, selector, ..
            }) => backend.query(std::slice::from_ref(target), selector),
        }
    }
}

/// Reconciles a contiguous run of sibling nodes against a collection.
pub struct LoopFinder {
    pub backend: Rc<dyn QueryBackend>,
    /// The raw directive key; doubles as the placeholder comment's tag, so
    /// it must match byte for byte when the placeholder is searched for.
    pub raw: String,
    /// Selector for the loop nodes.
    pub selector: String,
    /// Pristine basis nodes matching the selector; growth clones cycle
    /// through these, which preserves striped markup.
    pub templates: Vec<Node>,
}

impl LoopFinder {
    /// Patch the DOM under `target` so exactly `len` nodes match the loop
    /// selector, and return them in order.
    pub fn reconcile(&self, target: &Node, len: usize) -> Result<Vec<Node>, RenderError> {
        let mut nodes = self
            .backend
            .query(std::slice::from_ref(target), &self.selector)?;

        if len == 0 {
            // Collapse the whole run into a placeholder comment so the
            // insertion point can be found again later.
            if !nodes.is_empty() {
                for node in nodes.iter().skip(1) {
                    node.detach();
                }
                let placeholder = Node::comment(self.raw.clone());
                match nodes[0].parent() {
                    Some(parent) => parent.replace_child(&placeholder, &nodes[0]),
                    None => nodes[0].detach(),
                }
                tracing::debug!(key = %self.raw, removed = nodes.len(), "collapsed loop to placeholder");
            }
            return Ok(Vec::new());
        }

        // An untouched run keeps node identity, and with it any state the
        // user has put into unchanged rows.
        if len == nodes.len() {
            return Ok(nodes);
        }

        if nodes.is_empty() {
            let first = self.template(0)?.deep_clone();
            if let Some(marker) = self.find_placeholder(target) {
                if let Some(parent) = marker.parent() {
                    parent.replace_child(&first, &marker);
                }
            }
            nodes.push(first);
        }

        if len != nodes.len() {
            let last = nodes[nodes.len() - 1].clone();
            let parent = last.parent();
            let anchor = last.next_sibling();

            let mut index = nodes.len().min(len);
            while nodes.len() < len {
                let clone = self.template(index)?.deep_clone();
                if let Some(parent) = &parent {
                    match &anchor {
                        Some(anchor) => parent.insert_before(&clone, anchor),
                        None => parent.append_child(&clone),
                    }
                }
                nodes.push(clone);
                index += 1;
            }
            while nodes.len() > len {
                if let Some(node) = nodes.pop() {
                    node.detach();
                }
            }
            tracing::trace!(key = %self.raw, len, "reconciled loop run");
        }

        Ok(nodes)
    }

    fn template(&self, index: usize) -> Result<&Node, RenderError> {
        if self.templates.is_empty() {
            return Err(RenderError::MissingLoopTemplate {
                selector: self.selector.clone(),
            });
        }
        Ok(&self.templates[index % self.templates.len()])
    }

    /// Depth-first search for the placeholder comment tagged with this
    /// loop's raw key.
    fn find_placeholder(&self, target: &Node) -> Option<Node> {
        target.descendants().into_iter().find(|node| {
            node.kind() == NodeKind::Comment
                && node.node_value().as_deref() == Some(self.raw.as_str())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DomBackend;
    use pretty_assertions::assert_eq;
    use stencil_dom::parse_html;

    fn loop_finder(basis: &Node, raw: &str, selector: &str) -> LoopFinder {
        let backend: Rc<dyn QueryBackend> = Rc::new(DomBackend);
        let templates = backend
            .query(std::slice::from_ref(basis), selector)
            .unwrap();
        LoopFinder {
            backend,
            raw: raw.to_owned(),
            selector: selector.to_owned(),
            templates,
        }
    }

    #[test]
    fn test_reconcile_grow() {
        let basis = parse_html(r#"<ul><li class="item">x</li></ul>"#).unwrap();
        let live = basis.deep_clone();
        let finder = loop_finder(&basis, ".item", ".item");
        let nodes = finder.reconcile(&live, 3).unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(live.children().len(), 3);
    }

    #[test]
    fn test_reconcile_shrink() {
        let basis = parse_html(r#"<ul><li class="item">x</li></ul>"#).unwrap();
        let live = basis.deep_clone();
        let finder = loop_finder(&basis, ".item", ".item");
        finder.reconcile(&live, 4).unwrap();
        let nodes = finder.reconcile(&live, 2).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(live.children().len(), 2);
    }

    #[test]
    fn test_reconcile_same_length_keeps_identity() {
        let basis = parse_html(r#"<ul><li class="item">x</li></ul>"#).unwrap();
        let live = basis.deep_clone();
        let finder = loop_finder(&basis, ".item", ".item");
        let first = finder.reconcile(&live, 2).unwrap();
        let second = finder.reconcile(&live, 2).unwrap();
        assert!(first[0].ptr_eq(&second[0]));
        assert!(first[1].ptr_eq(&second[1]));
    }

    #[test]
    fn test_reconcile_empty_leaves_placeholder() {
        let basis = parse_html(r#"<ul><li class="item">x</li></ul>"#).unwrap();
        let live = basis.deep_clone();
        let finder = loop_finder(&basis, ".item", ".item");
        let nodes = finder.reconcile(&live, 0).unwrap();
        assert!(nodes.is_empty());
        let children = live.children();
        assert_eq!(children.len(), 1);
        assert!(children[0].is_comment());
        assert_eq!(children[0].node_value().as_deref(), Some(".item"));
    }

    #[test]
    fn test_reconcile_replaces_placeholder() {
        let basis = parse_html(r#"<ul><li class="item">x</li></ul>"#).unwrap();
        let live = basis.deep_clone();
        let finder = loop_finder(&basis, ".item", ".item");
        finder.reconcile(&live, 0).unwrap();
        let nodes = finder.reconcile(&live, 2).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(live.children().len(), 2);
        assert!(live.children().iter().all(|n| n.is_element()));
    }

    #[test]
    fn test_growth_preserves_following_siblings() {
        let basis = parse_html(r#"<div><span class="row">x</span><p>after</p></div>"#).unwrap();
        let live = basis.deep_clone();
        let finder = loop_finder(&basis, ".row", ".row");
        finder.reconcile(&live, 3).unwrap();
        let children = live.children();
        assert_eq!(children.len(), 4);
        assert_eq!(children[3].tag().as_deref(), Some("p"));
    }

    #[test]
    fn test_growth_cycles_templates() {
        let basis =
            parse_html(r#"<ul><li class="row odd">a</li><li class="row even">b</li></ul>"#)
                .unwrap();
        let live = basis.deep_clone();
        let finder = loop_finder(&basis, ".row", ".row");
        let nodes = finder.reconcile(&live, 4).unwrap();
        assert_eq!(nodes[2].attr("class").as_deref(), Some("row odd"));
        assert_eq!(nodes[3].attr("class").as_deref(), Some("row even"));
    }

    #[test]
    fn test_missing_template_error() {
        let basis = parse_html("<ul><li>x</li></ul>").unwrap();
        let live = parse_html("<ul></ul>").unwrap();
        let finder = loop_finder(&basis, ".none", ".none");
        match finder.reconcile(&live, 2) {
            Err(RenderError::MissingLoopTemplate { selector }) => {
                assert_eq!(selector, ".none");
            }
            other => panic!("expected missing template error, got {other:?}"),
        }
    }
}
