//! CSS-subset selector engine.
//!
//! Supports the selector shapes directive keys use in practice: tag names,
//! `#id`, `.class`, compounds of those (`td.name`), and the descendant
//! combinator (`tbody tr`). Anything outside that subset is rejected.

use crate::error::DomError;
use crate::node::Node;

/// One compound selector: `tag#id.class1.class2`, all parts optional but at
/// least one present.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Compound {
    universal: bool,
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Compound {
    fn parse(part: &str) -> Result<Self, DomError> {
        let invalid = || DomError::InvalidSelector {
            selector: part.to_owned(),
        };

        let mut compound = Compound {
            universal: false,
            tag: None,
            id: None,
            classes: Vec::new(),
        };
        let mut rest = part;

        if rest.starts_with('*') {
            compound.universal = true;
            rest = &rest[1..];
        } else if !rest.starts_with(['.', '#']) {
            let end = rest.find(['.', '#']).unwrap_or(rest.len());
            let tag = &rest[..end];
            if !is_name(tag) {
                return Err(invalid());
            }
            compound.tag = Some(tag.to_ascii_lowercase());
            rest = &rest[end..];
        }

        while !rest.is_empty() {
            let marker = rest.as_bytes()[0];
            rest = &rest[1..];
            let end = rest.find(['.', '#']).unwrap_or(rest.len());
            let name = &rest[..end];
            if !is_name(name) {
                return Err(invalid());
            }
            match marker {
                b'.' => compound.classes.push(name.to_owned()),
                b'#' => compound.id = Some(name.to_owned()),
                _ => return Err(invalid()),
            }
            rest = &rest[end..];
        }

        if !compound.universal
            && compound.tag.is_none()
            && compound.id.is_none()
            && compound.classes.is_empty()
        {
            return Err(invalid());
        }
        Ok(compound)
    }

    fn matches(&self, node: &Node) -> bool {
        if !node.is_element() {
            return false;
        }
        if let Some(tag) = &self.tag {
            if node.tag().map(|t| t.to_ascii_lowercase()) != Some(tag.clone()) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if node.attr("id").as_deref() != Some(id) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let classes = node.classes();
            if !self.classes.iter().all(|c| classes.contains(c)) {
                return false;
            }
        }
        true
    }
}

/// A parsed selector: a chain of compounds joined by descendant combinators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    compounds: Vec<Compound>,
}

impl Selector {
    /// Parse a selector string.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidSelector`] when the string is empty or
    /// uses syntax outside the supported subset.
    pub fn parse(selector: &str) -> Result<Self, DomError> {
        let compounds = selector
            .split_whitespace()
            .map(Compound::parse)
            .collect::<Result<Vec<_>, _>>()?;
        if compounds.is_empty() {
            return Err(DomError::InvalidSelector {
                selector: selector.to_owned(),
            });
        }
        Ok(Self { compounds })
    }

    /// All descendants of `context` matching this selector, in document
    /// order. `context` itself is never returned.
    #[must_use]
    pub fn query_all(&self, context: &Node) -> Vec<Node> {
        context
            .descendants()
            .into_iter()
            .filter(|node| self.matches_within(node, context))
            .collect()
    }

    /// Whether `node` itself matches this selector, with ancestor compounds
    /// resolved against any of its ancestors.
    #[must_use]
    pub fn matches(&self, node: &Node) -> bool {
        self.matches_upward(node, None)
    }

    /// Whether `node` matches this selector with ancestor compounds resolved
    /// against ancestors up to (and including) `context`.
    fn matches_within(&self, node: &Node, context: &Node) -> bool {
        self.matches_upward(node, Some(context))
    }

    fn matches_upward(&self, node: &Node, context: Option<&Node>) -> bool {
        let (last, rest) = self
            .compounds
            .split_last()
            .expect("selector has at least one compound");
        if !last.matches(node) {
            return false;
        }
        // Match remaining compounds right-to-left against strict ancestors.
        let mut remaining = rest;
        let mut current = node.parent();
        while let Some(ancestor) = current {
            let Some((innermost, outer)) = remaining.split_last() else {
                return true;
            };
            if innermost.matches(&ancestor) {
                remaining = outer;
            }
            if context.is_some_and(|c| ancestor.ptr_eq(c)) {
                break;
            }
            current = ancestor.parent();
        }
        remaining.is_empty()
    }
}

fn is_name(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}
