//! Declarative two-way DOM templating.
//!
//! A [`Stencil`] wraps an element together with a pristine clone of it,
//! the basis. Directives map selector keys to data paths; rendering
//! mutates the element to reflect a data object, and parsing reads an
//! equivalent object back out of it.
//!
//! ```
//! use serde_json::json;
//! use stencil::{Directive, Stencil};
//!
//! let stencil = Stencil::from_html("<div><span>Hi</span></div>")?;
//! let directive = Directive::new().bind("span", "hello");
//!
//! stencil.render(&json!({"hello": "Hello, World"}), &directive)?;
//! assert_eq!(stencil.html(), "<div><span>Hello, World</span></div>");
//!
//! let parsed = stencil.parse(&directive)?;
//! assert_eq!(parsed, json!({"hello": "Hello, World"}));
//! # Ok::<(), stencil::RenderError>(())
//! ```

use std::fmt;

use serde_json::Value;
use stencil_dom::Node;

pub use stencil_dom::{parse_fragment, parse_html, DomError, NodeKind, Selector};
pub use stencil_render::{
    auto_render, position, toggle_class, CompiledDirective, Compiler, Directive, DomBackend,
    FormatArgs, Formatted, QueryBackend, RenderError, Template,
};

/// A directive precompiled against a stencil's basis, reusable across any
/// number of render calls. It carries its own inverse: [`Renderer::parse`]
/// reads data back out of a rendered element.
pub struct Renderer {
    compiled: CompiledDirective,
}

impl Renderer {
    /// Render `data` into `element`.
    ///
    /// # Errors
    ///
    /// Loop and DOM errors raised while applying the directive.
    pub fn render(&self, element: &Node, data: &Value) -> Result<(), RenderError> {
        self.compiled.render(element, data)
    }

    /// Reconstruct a data object from `element`.
    ///
    /// # Errors
    ///
    /// Inversion errors: functions without inverses, toggles, or
    /// ambiguous concatenations.
    pub fn parse(&self, element: &Node) -> Result<Value, RenderError> {
        self.compiled.parse(element)
    }
}

/// An element paired with its pristine basis.
pub struct Stencil {
    element: Node,
    basis: Node,
    compiler: Compiler,
}

impl Stencil {
    /// Wrap an element; the basis is captured as a deep clone now, before
    /// any rendering touches the tree.
    #[must_use]
    pub fn new(element: Node) -> Self {
        let basis = element.deep_clone();
        Self::with_basis(element, basis)
    }

    /// Wrap an element with an explicitly supplied basis.
    #[must_use]
    pub fn with_basis(element: Node, basis: Node) -> Self {
        Self {
            element,
            basis,
            compiler: Compiler::new(),
        }
    }

    /// Parse markup and wrap its single root element.
    ///
    /// # Errors
    ///
    /// Returns a DOM error when the markup is malformed or does not have
    /// exactly one root element.
    pub fn from_html(html: &str) -> Result<Self, RenderError> {
        Ok(Self::new(parse_html(html)?))
    }

    /// Replace the query capability used when compiling directives.
    #[must_use]
    pub fn with_compiler(mut self, compiler: Compiler) -> Self {
        self.compiler = compiler;
        self
    }

    /// The wrapped element.
    #[must_use]
    pub fn get(&self) -> Node {
        self.element.clone()
    }

    /// The wrapped element serialized to markup.
    #[must_use]
    pub fn html(&self) -> String {
        self.element.outer_html()
    }

    /// Precompile a directive against the basis for reuse.
    ///
    /// # Errors
    ///
    /// Grammar and structural errors in the directive.
    pub fn compile(&self, directive: &Directive) -> Result<Renderer, RenderError> {
        let compiled = self
            .compiler
            .compile(std::slice::from_ref(&self.basis), directive)?;
        Ok(Renderer { compiled })
    }

    /// Compile and render in one step.
    ///
    /// # Errors
    ///
    /// Compile-time grammar errors, then render-time loop and DOM errors.
    pub fn render(&self, data: &Value, directive: &Directive) -> Result<&Self, RenderError> {
        self.compile(directive)?.render(&self.element, data)?;
        Ok(self)
    }

    /// Render with a precompiled directive.
    ///
    /// # Errors
    ///
    /// Render-time loop and DOM errors.
    pub fn render_with(&self, data: &Value, renderer: &Renderer) -> Result<&Self, RenderError> {
        renderer.render(&self.element, data)?;
        Ok(self)
    }

    /// Render without a directive, matching element class names against
    /// data properties.
    ///
    /// # Errors
    ///
    /// DOM errors from class-derived selectors.
    pub fn auto_render(&self, data: &Value) -> Result<&Self, RenderError> {
        stencil_render::auto_render(&self.element, data)?;
        Ok(self)
    }

    /// Compile and parse in one step. A directive is required; there is
    /// no auto-parse.
    ///
    /// # Errors
    ///
    /// Compile-time grammar errors, then inversion errors.
    pub fn parse(&self, directive: &Directive) -> Result<Value, RenderError> {
        self.compile(directive)?.parse(&self.element)
    }

    /// Parse with a precompiled directive.
    ///
    /// # Errors
    ///
    /// Inversion errors.
    pub fn parse_with(&self, renderer: &Renderer) -> Result<Value, RenderError> {
        renderer.parse(&self.element)
    }
}

impl fmt::Debug for Stencil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stencil")
            .field("element", &self.element)
            .field("basis", &self.basis)
            .finish_non_exhaustive()
    }
}

impl Clone for Stencil {
    /// Deep-clones both the element and the basis; the clone renders
    /// independently of the original.
    fn clone(&self) -> Self {
        Self {
            element: self.element.deep_clone(),
            basis: self.basis.deep_clone(),
            compiler: self.compiler.clone(),
        }
    }
}

impl PartialEq for Stencil {
    /// Structural comparison of the serialized element and basis.
    fn eq(&self, other: &Self) -> bool {
        self.element.outer_html() == other.element.outer_html()
            && self.basis.outer_html() == other.basis.outer_html()
    }
}
