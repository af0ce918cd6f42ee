//! Directive-key selector parsing.
//!
//! A directive key names the write site for one binding:
//!
//! ```text
//! [modifier] selector [ @attr ] [ pseudo ] [ modifier ]
//! ```
//!
//! Two modifier syntaxes are accepted. The prefix/suffix form uses `+` and
//! `-` around the selector (`+span`, `span@title+`); the pseudo form uses
//! `:before`, `:after` and `:toggle` suffixes. A `+` prefix (or `:before`)
//! prepends, a `+` suffix (or `:after`) appends, and `:toggle` — or the
//! mixed `+…-` / `-…+` forms — toggles between two states.
//!
//! A selector of `.` or whitespace denotes the current node.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::RenderError;

static SELECTOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*([+-])?\s*([^@+:]*?)\s*(?:@([^\s@+:]+))?\s*(?::(before|after|toggle))?\s*([+-])?\s*$",
    )
    .expect("invalid selector regex")
});

/// Parsed form of a directive key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorSpec {
    /// The key exactly as written. Doubles as the placeholder-comment tag
    /// for loops, so it must be preserved byte for byte.
    pub raw: String,
    /// CSS selector, empty when the key denotes the current node.
    pub selector: String,
    /// Attribute to write instead of element content.
    pub attr: Option<String>,
    /// Prepend new content before existing content.
    pub prepend: bool,
    /// Append new content after existing content.
    pub append: bool,
    /// Toggle between two states (class membership XOR).
    pub toggle: bool,
}

impl SelectorSpec {
    /// Parse a directive key.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidSelector`] naming the raw key when it
    /// does not match the grammar (e.g. a dangling `@`).
    pub fn parse(raw: &str) -> Result<Self, RenderError> {
        let captures = SELECTOR_RE
            .captures(raw)
            .ok_or_else(|| RenderError::InvalidSelector { raw: raw.to_owned() })?;

        let prefix = captures.get(1).map(|m| m.as_str());
        let pseudo = captures.get(4).map(|m| m.as_str());
        let suffix = captures.get(5).map(|m| m.as_str());

        let mut selector = captures.get(2).map_or("", |m| m.as_str()).trim().to_owned();
        if selector == "." {
            selector.clear();
        }

        let prepend = prefix == Some("+") || pseudo == Some("before");
        let append = suffix == Some("+") || pseudo == Some("after");
        let shift = prefix == Some("-");
        let pop = suffix == Some("-");
        let toggle = pseudo == Some("toggle") || (prepend && pop) || (shift && append);

        Ok(Self {
            raw: raw.to_owned(),
            selector,
            attr: captures.get(3).map(|m| m.as_str().to_owned()),
            prepend,
            append,
            toggle,
        })
    }

    /// Whether the key denotes the current node rather than a query.
    #[must_use]
    pub fn is_self(&self) -> bool {
        self.selector.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_selector() {
        let spec = SelectorSpec::parse("span").unwrap();
        assert_eq!(spec.selector, "span");
        assert_eq!(spec.attr, None);
        assert!(!spec.prepend && !spec.append && !spec.toggle);
    }

    #[test]
    fn test_attribute() {
        let spec = SelectorSpec::parse("span@title").unwrap();
        assert_eq!(spec.selector, "span");
        assert_eq!(spec.attr.as_deref(), Some("title"));
    }

    #[test]
    fn test_attribute_append_suffix() {
        let spec = SelectorSpec::parse("span@title+").unwrap();
        assert_eq!(spec.selector, "span");
        assert_eq!(spec.attr.as_deref(), Some("title"));
        assert!(spec.append);
        assert!(!spec.prepend);
    }

    #[test]
    fn test_prepend_prefix() {
        let spec = SelectorSpec::parse("+.").unwrap();
        assert!(spec.is_self());
        assert!(spec.prepend);
    }

    #[test]
    fn test_append_suffix_on_self() {
        let spec = SelectorSpec::parse(".+").unwrap();
        assert!(spec.is_self());
        assert!(spec.append);
    }

    #[test]
    fn test_self_forms() {
        assert!(SelectorSpec::parse("").unwrap().is_self());
        assert!(SelectorSpec::parse("  ").unwrap().is_self());
        assert!(SelectorSpec::parse(".").unwrap().is_self());
        assert!(SelectorSpec::parse(" . ").unwrap().is_self());
        assert!(SelectorSpec::parse("@selected").unwrap().is_self());
    }

    #[test]
    fn test_self_with_attr() {
        let spec = SelectorSpec::parse(".@attr").unwrap();
        assert!(spec.is_self());
        assert_eq!(spec.attr.as_deref(), Some("attr"));
    }

    #[test]
    fn test_pseudo_forms() {
        assert!(SelectorSpec::parse("span:before").unwrap().prepend);
        assert!(SelectorSpec::parse("span:after").unwrap().append);
        assert!(SelectorSpec::parse("span@class:toggle").unwrap().toggle);
    }

    #[test]
    fn test_legacy_toggle_combinations() {
        assert!(SelectorSpec::parse("+span-").unwrap().toggle);
        assert!(SelectorSpec::parse("-span+").unwrap().toggle);
        assert!(!SelectorSpec::parse("+span").unwrap().toggle);
    }

    #[test]
    fn test_descendant_selector_kept_verbatim() {
        let spec = SelectorSpec::parse("tbody tr").unwrap();
        assert_eq!(spec.selector, "tbody tr");
    }

    #[test]
    fn test_dangling_at_is_error() {
        let err = SelectorSpec::parse("thing@").unwrap_err();
        match err {
            RenderError::InvalidSelector { raw } => assert_eq!(raw, "thing@"),
            other => panic!("expected InvalidSelector, got {other:?}"),
        }
    }

    #[test]
    fn test_raw_preserved() {
        let spec = SelectorSpec::parse(" .thing ").unwrap();
        assert_eq!(spec.raw, " .thing ");
        assert_eq!(spec.selector, ".thing");
    }
}
