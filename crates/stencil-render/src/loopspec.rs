//! Loop declarations inside nested directives.
//!
//! A nested directive must carry exactly one binding whose key is a loop
//! declaration, `lhs <- rhs` (the `<=` operator is accepted as a synonym).
//! The right-hand side is the dotted path of the collection; the left-hand
//! side, when present, names the per-item binding the loop body refers to.
//! The loop key's value is the directive applied to each item's node.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::RenderError;
use crate::template::{Directive, Template};

static LOOP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ *([^ ]*) *<([-=]) *([^ ]*) *$").expect("invalid loop regex"));

/// A parsed loop declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSpec {
    /// Per-item binding name. When present, each item is re-wrapped as
    /// `{ variable: item }` before the loop body renders; when absent the
    /// item itself becomes the scope.
    pub variable: Option<String>,
    /// Dotted path of the collection in the enclosing scope.
    pub collection: Vec<String>,
}

impl LoopSpec {
    /// Try to read a directive key as a loop declaration. Returns `None`
    /// for ordinary selector keys.
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        let captures = LOOP_RE.captures(key)?;
        let variable = match &captures[1] {
            "" => None,
            name => Some(name.to_owned()),
        };
        Some(Self {
            variable,
            collection: crate::path::split_path(&captures[3]),
        })
    }
}

/// Split a nested directive into its loop declaration and the loop body.
///
/// Non-loop keys alongside the loop key are not part of the body and are
/// ignored. Sort and filter settings stay on the containing directive.
///
/// # Errors
///
/// [`RenderError::MissingLoop`] when no key is a loop declaration,
/// [`RenderError::DuplicateLoop`] when more than one is.
pub fn extract_loop(directive: &Directive) -> Result<(LoopSpec, Directive), RenderError> {
    let mut found: Option<(String, LoopSpec, Template)> = None;

    for (key, value) in directive.bindings() {
        if let Some(spec) = LoopSpec::parse(key) {
            if let Some((first, ..)) = &found {
                return Err(RenderError::DuplicateLoop {
                    first: first.clone(),
                    second: key.clone(),
                });
            }
            found = Some((key.clone(), spec, value.clone()));
        } else {
            tracing::debug!(key, "ignoring non-loop key in nested directive");
        }
    }

    let Some((_, spec, template)) = found else {
        return Err(RenderError::MissingLoop);
    };

    let body = match template {
        Template::Nested(inner) => inner,
        other => Directive::new().bind(".", other),
    };
    Ok((spec, body))
}
