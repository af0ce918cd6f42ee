//! Engine error types.
//!
//! Grammar and structural errors surface at compile time, before any DOM
//! mutation. Inversion errors surface when `parse` is invoked, because the
//! same directive may still be perfectly renderable.

use stencil_dom::DomError;

/// Errors raised by directive compilation, rendering and parsing.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A directive key did not match the selector grammar.
    #[error("invalid selector: '{raw}'")]
    InvalidSelector {
        /// The offending directive key.
        raw: String,
    },

    /// A nested directive is missing its `lhs <- rhs` loop key.
    #[error("expected looping directive (<-) is missing")]
    MissingLoop,

    /// A nested directive contains more than one loop key.
    #[error("duplicate looping directive: '{first}' and '{second}'")]
    DuplicateLoop {
        /// The first loop key found.
        first: String,
        /// The conflicting loop key.
        second: String,
    },

    /// A loop must grow but the basis has no node matching its selector.
    #[error("no basis template matches '{selector}', cannot grow loop")]
    MissingLoopTemplate {
        /// The loop's selector.
        selector: String,
    },

    /// Parse was requested for a function template without an inverse.
    #[error("unable to parse '{raw}', cannot find inverse of function")]
    MissingInverse {
        /// The directive key bound to the function.
        raw: String,
    },

    /// Parse was requested for a class toggle, whose boolean state cannot
    /// be recovered from the DOM.
    #[error("unable to parse '{raw}', cannot determine value of toggle")]
    ToggleNotInvertible {
        /// The toggling directive key.
        raw: String,
    },

    /// Two data paths are concatenated with no literal separator between
    /// them; the reverse mapping is ambiguous.
    #[error(
        "unable to parse '{raw}', cannot separate consecutive data paths \
         that have been concatenated together"
    )]
    AdjacentPaths {
        /// The directive key bound to the ambiguous template.
        raw: String,
    },

    /// Parse could not locate the node a directive key refers to.
    #[error("unable to parse '{raw}', no node matches")]
    NodeNotFound {
        /// The directive key whose target is missing.
        raw: String,
    },

    /// Error from the DOM layer (selector parsing, markup handling).
    #[error(transparent)]
    Dom(#[from] DomError),
}
