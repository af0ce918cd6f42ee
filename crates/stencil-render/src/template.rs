//! Directive values: what a directive key binds to.
//!
//! A binding's value is either a string template, a custom format function
//! (optionally paired with its inverse for parsing), or a nested directive
//! whose keys include a loop declaration.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use stencil_dom::Node;

use crate::error::RenderError;

/// Arguments handed to a custom format function.
pub struct FormatArgs<'a> {
    /// The scope data for the node being rendered. Inside a loop this is
    /// the loop-local scope (the iteration item is visible under the loop
    /// variable).
    pub data: &'a Value,
    /// The node the formatted value will be written to.
    pub target: &'a Node,
    /// Iteration index when formatting inside a loop.
    pub index: Option<usize>,
    /// The full run of sibling nodes the loop manages, in order.
    pub nodes: &'a [Node],
    /// The collection being iterated, when inside a loop.
    pub collection: Option<&'a [Value]>,
}

/// What a format function produced.
pub enum Formatted {
    /// A value, written through the directive key like a template result.
    Value(Value),
    /// A replacement node; the target is swapped out wholesale.
    Node(Node),
}

/// Custom format function.
pub type FormatFn = Rc<dyn Fn(&FormatArgs<'_>) -> Formatted>;

/// Inverse of a format function: fold a value read from the DOM back into
/// the data.
pub type InverseFn = Rc<dyn Fn(&mut Value, Value) -> Result<(), RenderError>>;

/// Sort comparator applied to a loop's collection before rendering.
pub type SortFn = Rc<dyn Fn(&Value, &Value) -> std::cmp::Ordering>;

/// Filter predicate applied to a loop's collection before rendering.
/// Receives the item, its index and the whole collection.
pub type FilterFn = Rc<dyn Fn(&Value, usize, &[Value]) -> bool>;

/// The value side of one directive binding.
#[derive(Clone)]
pub enum Template {
    /// A string template of quoted literals and dotted data paths.
    Text(String),
    /// An explicit data path, segment by segment. Equivalent to a
    /// single-path string template but with no tokenization applied, so
    /// segments may contain characters the micro-language reserves.
    Path(Vec<String>),
    /// A custom format function with an optional inverse.
    Format {
        format: FormatFn,
        inverse: Option<InverseFn>,
    },
    /// A nested directive. Its keys must contain exactly one loop
    /// declaration (`variable <- collection`).
    Nested(Directive),
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(t) => f.debug_tuple("Text").field(t).finish(),
            Self::Path(p) => f.debug_tuple("Path").field(p).finish(),
            Self::Format { inverse, .. } => f
                .debug_struct("Format")
                .field("has_inverse", &inverse.is_some())
                .finish(),
            Self::Nested(d) => f.debug_tuple("Nested").field(d).finish(),
        }
    }
}

impl From<&str> for Template {
    fn from(template: &str) -> Self {
        Self::Text(template.to_owned())
    }
}

impl From<String> for Template {
    fn from(template: String) -> Self {
        Self::Text(template)
    }
}

impl From<Directive> for Template {
    fn from(directive: Directive) -> Self {
        Self::Nested(directive)
    }
}

impl From<Vec<String>> for Template {
    fn from(path: Vec<String>) -> Self {
        Self::Path(path)
    }
}

impl<const N: usize> From<[&str; N]> for Template {
    fn from(path: [&str; N]) -> Self {
        Self::Path(path.iter().map(|s| (*s).to_owned()).collect())
    }
}

/// An ordered set of directive-key bindings.
///
/// Binding order is meaningful: actions run in insertion order, so later
/// bindings observe the writes of earlier ones.
#[derive(Clone, Default)]
pub struct Directive {
    bindings: Vec<(String, Template)>,
    sort: Option<SortFn>,
    filter: Option<FilterFn>,
}

impl Directive {
    /// Create an empty directive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a directive key to a value.
    #[must_use]
    pub fn bind(mut self, key: impl Into<String>, value: impl Into<Template>) -> Self {
        self.bindings.push((key.into(), value.into()));
        self
    }

    /// Bind a directive key to a custom format function.
    #[must_use]
    pub fn bind_fn<F>(mut self, key: impl Into<String>, format: F) -> Self
    where
        F: Fn(&FormatArgs<'_>) -> Formatted + 'static,
    {
        self.bindings.push((
            key.into(),
            Template::Format {
                format: Rc::new(format),
                inverse: None,
            },
        ));
        self
    }

    /// Bind a directive key to a format function paired with its inverse,
    /// making the binding parseable.
    #[must_use]
    pub fn bind_fn_with_inverse<F, I>(mut self, key: impl Into<String>, format: F, inverse: I) -> Self
    where
        F: Fn(&FormatArgs<'_>) -> Formatted + 'static,
        I: Fn(&mut Value, Value) -> Result<(), RenderError> + 'static,
    {
        self.bindings.push((
            key.into(),
            Template::Format {
                format: Rc::new(format),
                inverse: Some(Rc::new(inverse)),
            },
        ));
        self
    }

    /// Sort the loop collection before rendering. Only meaningful on a
    /// directive used as a loop body.
    #[must_use]
    pub fn with_sort<F>(mut self, sort: F) -> Self
    where
        F: Fn(&Value, &Value) -> std::cmp::Ordering + 'static,
    {
        self.sort = Some(Rc::new(sort));
        self
    }

    /// Filter the loop collection before rendering. Only meaningful on a
    /// directive used as a loop body.
    #[must_use]
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Value, usize, &[Value]) -> bool + 'static,
    {
        self.filter = Some(Rc::new(filter));
        self
    }

    /// The bindings in insertion order.
    #[must_use]
    pub fn bindings(&self) -> &[(String, Template)] {
        &self.bindings
    }

    pub(crate) fn sort_fn(&self) -> Option<SortFn> {
        self.sort.clone()
    }

    pub(crate) fn filter_fn(&self) -> Option<FilterFn> {
        self.filter.clone()
    }

}

impl fmt::Debug for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directive")
            .field("bindings", &self.bindings)
            .field("sorted", &self.sort.is_some())
            .field("filtered", &self.filter.is_some())
            .finish()
    }
}
