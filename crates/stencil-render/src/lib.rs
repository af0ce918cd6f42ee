//! Two-way DOM templating: a directive maps selector keys to data paths,
//! and once compiled against a pristine basis it both renders a data
//! object into a live tree and parses an equivalent object back out.
//!
//! ```
//! use serde_json::json;
//! use stencil_dom::parse_html;
//! use stencil_render::{Compiler, Directive};
//!
//! let basis = parse_html("<div><span>x</span></div>")?;
//! let live = basis.deep_clone();
//!
//! let directive = Directive::new().bind("span", "greeting");
//! let compiled = Compiler::new().compile(std::slice::from_ref(&basis), &directive)?;
//!
//! compiled.render(&live, &json!({"greeting": "Hello"}))?;
//! assert_eq!(live.text_content(), "Hello");
//!
//! let parsed = compiled.parse(&live)?;
//! assert_eq!(parsed, json!({"greeting": "Hello"}));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod auto;
mod backend;
mod compile;
mod error;
mod finder;
mod formatter;
mod loopspec;
mod parse;
mod path;
mod reader;
mod selector;
mod template;
mod util;
mod writer;

pub use auto::auto_render;
pub use backend::{DomBackend, QueryBackend};
pub use compile::{CompiledDirective, Compiler};
pub use error::RenderError;
pub use finder::{Finder, LoopFinder};
pub use formatter::Formatter;
pub use loopspec::{extract_loop, LoopSpec};
pub use parse::Parser;
pub use path::Token;
pub use reader::Reader;
pub use selector::SelectorSpec;
pub use template::{
    Directive, FilterFn, FormatArgs, FormatFn, Formatted, InverseFn, SortFn, Template,
};
pub use util::{position, toggle_class};
pub use writer::Writer;
