//! DOM error types.

/// Errors raised by the DOM layer.
#[derive(Debug, thiserror::Error)]
pub enum DomError {
    /// Markup could not be parsed.
    #[error("markup parse error")]
    Parse(#[from] quick_xml::Error),

    /// Encoding error during markup parsing.
    #[error("encoding error")]
    Encoding(#[from] quick_xml::encoding::EncodingError),

    /// Malformed attribute in markup.
    #[error("attribute error")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    /// A selector string did not match the supported CSS subset.
    #[error("invalid selector: '{selector}'")]
    InvalidSelector {
        /// The offending selector string.
        selector: String,
    },

    /// Markup parsed to something other than a single top-level element.
    #[error("expected exactly one top-level element, found {found}")]
    NotASingleElement {
        /// Number of top-level nodes found.
        found: usize,
    },
}
