//! Query-selection capability.
//!
//! All selector evaluation goes through a [`QueryBackend`] handed to the
//! [`Compiler`](crate::Compiler) at construction. The default backend uses
//! the in-memory DOM's own selector engine; a consumer with a different
//! node store can substitute its own.

use stencil_dom::{Node, Selector};

use crate::error::RenderError;

pub trait QueryBackend {
    /// Find the nodes under each context matching `selector`, in document
    /// order. A context node that matches the selector itself is returned
    /// ahead of its descendants, so a key can address the element a
    /// directive was compiled against.
    ///
    /// # Errors
    ///
    /// Returns an error when the selector cannot be evaluated.
    fn query(&self, contexts: &[Node], selector: &str) -> Result<Vec<Node>, RenderError>;

    /// Check a selector without evaluating it, so grammar errors surface
    /// at compile time.
    ///
    /// # Errors
    ///
    /// Returns an error when the selector is malformed.
    fn validate(&self, selector: &str) -> Result<(), RenderError>;
}

/// The default, DOM-backed query implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct DomBackend;

impl QueryBackend for DomBackend {
    fn query(&self, contexts: &[Node], selector: &str) -> Result<Vec<Node>, RenderError> {
        let compiled = Selector::parse(selector)?;
        let mut found = Vec::new();
        for context in contexts {
            if compiled.matches(context) {
                found.push(context.clone());
            }
            found.extend(compiled.query_all(context));
        }
        Ok(found)
    }

    fn validate(&self, selector: &str) -> Result<(), RenderError> {
        Selector::parse(selector)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use stencil_dom::parse_html;

    #[test]
    fn test_query_across_contexts() {
        let a = parse_html("<div><span>1</span></div>").unwrap();
        let b = parse_html("<div><span>2</span><span>3</span></div>").unwrap();
        let found = DomBackend.query(&[a, b], "span").unwrap();
        assert_eq!(found.len(), 3);
        assert_eq!(found[2].text_content(), "3");
    }

    #[test]
    fn test_query_includes_matching_context() {
        let span = parse_html(r#"<span title="Hello">x</span>"#).unwrap();
        let found = DomBackend.query(std::slice::from_ref(&span), "span").unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].ptr_eq(&span));
    }

    #[test]
    fn test_validate_rejects_garbage() {
        assert!(DomBackend.validate("span.x").is_ok());
        assert!(DomBackend.validate("###").is_err());
    }
}
