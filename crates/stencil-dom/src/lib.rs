//! Lightweight in-memory DOM for the stencil templating engine.
//!
//! This crate provides the host-tree capability that the directive compiler
//! in `stencil-render` operates on:
//!
//! - [`Node`]: shared-ownership handles to element, text and comment nodes,
//!   with attribute storage, live properties and sibling surgery.
//! - [`Selector`]: a CSS-subset selector engine (tag, `#id`, `.class`,
//!   compounds, descendant combinator).
//! - [`parse_html`] / [`parse_fragment`]: well-formed (XHTML-style) markup
//!   to node trees, preserving comment nodes.
//! - [`Node::outer_html`]: serialization back to markup.
//!
//! # Example
//!
//! ```
//! use stencil_dom::{Node, Selector, parse_html};
//!
//! let root = parse_html("<div><span>Hi</span></div>").unwrap();
//! let spans = Selector::parse("span").unwrap().query_all(&root);
//! assert_eq!(spans.len(), 1);
//! spans[0].set_text_content("Hello, World");
//! assert_eq!(root.outer_html(), "<div><span>Hello, World</span></div>");
//! ```

mod error;
mod html;
mod node;
mod selector;

pub use error::DomError;
pub use html::{parse_fragment, parse_html};
pub use node::{Node, NodeKind};
pub use selector::Selector;
