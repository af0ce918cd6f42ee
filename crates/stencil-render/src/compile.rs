//! Directive compilation and the render/parse pipeline.
//!
//! A directive is resolved once, against the basis, into a list of
//! actions. Each action binds the five stages for one key: a formatter
//! and finder and writer for rendering, a parser and reader for the
//! inverse direction. Rendering runs format, then find, then write;
//! parsing runs find, then parse, then read.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use stencil_dom::Node;

use crate::backend::{DomBackend, QueryBackend};
use crate::error::RenderError;
use crate::finder::{Finder, LoopFinder};
use crate::formatter::Formatter;
use crate::loopspec::extract_loop;
use crate::parse::Parser;
use crate::reader::Reader;
use crate::selector::SelectorSpec;
use crate::template::{Directive, FormatArgs, Template};
use crate::writer::Writer;

/// Positional context threaded through loop bodies, for format functions
/// that need the index, the sibling run, or the whole collection.
pub(crate) struct LoopFrame<'a> {
    pub index: usize,
    pub nodes: &'a [Node],
    pub collection: &'a [Value],
}

/// Compiles directives against a basis.
#[derive(Clone)]
pub struct Compiler {
    backend: Rc<dyn QueryBackend>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self {
            backend: Rc::new(DomBackend),
        }
    }
}

impl Compiler {
    /// A compiler using the default DOM-backed query engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A compiler with a caller-supplied query capability.
    #[must_use]
    pub fn with_backend(backend: Rc<dyn QueryBackend>) -> Self {
        Self { backend }
    }

    /// Resolve `directive` against the pristine `basis` nodes.
    ///
    /// All grammar and structural errors surface here, before any DOM
    /// mutation.
    ///
    /// # Errors
    ///
    /// Selector-key grammar errors, malformed CSS selectors, and missing
    /// or duplicated loop declarations.
    pub fn compile(
        &self,
        basis: &[Node],
        directive: &Directive,
    ) -> Result<CompiledDirective, RenderError> {
        let mut actions = Vec::with_capacity(directive.bindings().len());
        for (key, template) in directive.bindings() {
            actions.push(self.compile_action(basis, key, template)?);
        }
        tracing::debug!(actions = actions.len(), "compiled directive");
        Ok(CompiledDirective { actions })
    }

    fn compile_action(
        &self,
        basis: &[Node],
        key: &str,
        template: &Template,
    ) -> Result<Action, RenderError> {
        let spec = SelectorSpec::parse(key)?;
        if !spec.is_self() {
            self.backend.validate(&spec.selector)?;
        }

        if let Template::Nested(nested) = template {
            return self.compile_loop(basis, spec, nested);
        }

        let finder = if spec.is_self() {
            Finder::Top
        } else {
            Finder::Query {
                backend: Rc::clone(&self.backend),
                selector: spec.selector.clone(),
            }
        };
        let (formatter, reader) = match template {
            Template::Text(text) => (
                Formatter::from_text(text),
                Reader::from_text(text, &spec.raw),
            ),
            Template::Path(p) => (Formatter::Path(p.clone()), Reader::Path(p.clone())),
            Template::Format { format, inverse } => (
                Formatter::Func(Rc::clone(format)),
                match inverse {
                    Some(inverse) => Reader::Inverse(Rc::clone(inverse)),
                    None => Reader::MissingInverse {
                        raw: spec.raw.clone(),
                    },
                },
            ),
            Template::Nested(_) => unreachable!("handled above"),
        };
        let (writer, parser) = match &spec.attr {
            Some(name) => (
                Writer::Attr {
                    name: name.clone(),
                    prepend: spec.prepend,
                    append: spec.append,
                    toggle: spec.toggle,
                },
                Parser::Attr {
                    name: name.clone(),
                    prepend: spec.prepend,
                    append: spec.append,
                    toggle: spec.toggle,
                },
            ),
            None => (
                Writer::Element {
                    prepend: spec.prepend,
                    append: spec.append,
                },
                Parser::Element {
                    prepend: spec.prepend,
                    append: spec.append,
                },
            ),
        };

        Ok(Action {
            spec,
            basis: basis.to_vec(),
            formatter,
            finder,
            writer,
            parser,
            reader,
        })
    }

    fn compile_loop(
        &self,
        basis: &[Node],
        spec: SelectorSpec,
        nested: &Directive,
    ) -> Result<Action, RenderError> {
        let (loop_spec, body) = extract_loop(nested)?;

        // The loop body compiles against the basis nodes its selector
        // matches; those same nodes are the growth templates.
        let inner_basis = if spec.is_self() {
            basis.to_vec()
        } else {
            self.backend.query(basis, &spec.selector)?
        };
        let renderer = Rc::new(self.compile(&inner_basis, &body)?);

        let finder = if spec.is_self() {
            Finder::Top
        } else {
            Finder::Loop(LoopFinder {
                backend: Rc::clone(&self.backend),
                raw: spec.raw.clone(),
                selector: spec.selector.clone(),
                templates: inner_basis.clone(),
            })
        };

        Ok(Action {
            formatter: Formatter::Loop {
                path: loop_spec.collection.clone(),
                sort: nested.sort_fn(),
                filter: nested.filter_fn(),
            },
            writer: Writer::Loop {
                renderer: Rc::clone(&renderer),
                variable: loop_spec.variable.clone(),
            },
            parser: Parser::Loop {
                backend: Rc::clone(&self.backend),
                selector: spec.selector.clone(),
                renderer,
                variable: loop_spec.variable,
            },
            reader: Reader::Path(loop_spec.collection),
            finder,
            basis: basis.to_vec(),
            spec,
        })
    }
}

/// A directive resolved against a basis, ready to render or parse any
/// number of times.
pub struct CompiledDirective {
    actions: Vec<Action>,
}

impl CompiledDirective {
    /// Render `data` into `element`. Either every action applies or the
    /// failing action aborts the rest of the batch.
    ///
    /// # Errors
    ///
    /// Loop-template and DOM errors raised by individual actions.
    pub fn render(&self, element: &Node, data: &Value) -> Result<(), RenderError> {
        self.render_scoped(element, data, None)
    }

    pub(crate) fn render_scoped(
        &self,
        element: &Node,
        data: &Value,
        frame: Option<&LoopFrame<'_>>,
    ) -> Result<(), RenderError> {
        for action in &self.actions {
            action.render(element, data, frame)?;
        }
        Ok(())
    }

    /// Reconstruct a data object from `element`.
    ///
    /// # Errors
    ///
    /// Inversion errors: missing function inverses, toggles, ambiguous
    /// concatenations, or nodes that no longer match.
    pub fn parse(&self, element: &Node) -> Result<Value, RenderError> {
        let mut data = Value::Object(serde_json::Map::new());
        self.parse_into(element, &mut data)?;
        Ok(data)
    }

    /// Parse into an existing data object.
    ///
    /// # Errors
    ///
    /// Same as [`CompiledDirective::parse`].
    pub fn parse_into(&self, element: &Node, data: &mut Value) -> Result<(), RenderError> {
        for action in &self.actions {
            action.inverse(element, data)?;
        }
        Ok(())
    }
}

impl fmt::Debug for CompiledDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledDirective")
            .field("actions", &self.actions.len())
            .finish()
    }
}

/// One compiled key: the five stages bound to a selector spec.
struct Action {
    spec: SelectorSpec,
    /// Compile-time context nodes, the diff baseline for append/prepend
    /// parsing.
    basis: Vec<Node>,
    formatter: Formatter,
    finder: Finder,
    writer: Writer,
    parser: Parser,
    reader: Reader,
}

impl Action {
    fn render(
        &self,
        target: &Node,
        data: &Value,
        frame: Option<&LoopFrame<'_>>,
    ) -> Result<(), RenderError> {
        let args = FormatArgs {
            data,
            target,
            index: frame.map(|f| f.index),
            nodes: frame.map_or(&[][..], |f| f.nodes),
            collection: frame.map(|f| f.collection),
        };
        let bound = self.formatter.format(&args);
        let nodes = self.finder.resolve(target, &bound)?;
        for (i, node) in nodes.iter().enumerate() {
            if let Some(replacement) = self.writer.write(node, &bound, i, &nodes)? {
                if let Some(parent) = node.parent() {
                    parent.replace_child(&replacement, node);
                }
            }
        }
        Ok(())
    }

    fn inverse(&self, source: &Node, data: &mut Value) -> Result<(), RenderError> {
        let value = self
            .parser
            .extract(source, &self.finder, &self.basis, &self.spec.raw)?;
        self.reader.read(data, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{Directive, Formatted};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use stencil_dom::parse_html;

    fn compile_for(basis: &Node, directive: &Directive) -> CompiledDirective {
        Compiler::new()
            .compile(std::slice::from_ref(basis), directive)
            .unwrap()
    }

    #[test]
    fn test_render_simple_binding() {
        let basis = parse_html("<div><span>Hi</span></div>").unwrap();
        let live = basis.deep_clone();
        let directive = Directive::new().bind("span", "hello");
        let compiled = compile_for(&basis, &directive);
        compiled
            .render(&live, &json!({"hello": "Hello, World"}))
            .unwrap();
        assert_eq!(live.outer_html(), "<div><span>Hello, World</span></div>");
    }

    #[test]
    fn test_debug_reports_action_count() {
        let basis = parse_html("<div><span>Hi</span></div>").unwrap();
        let directive = Directive::new().bind("span", "a").bind("span@title", "b");
        let compiled = compile_for(&basis, &directive);
        assert_eq!(
            format!("{compiled:?}"),
            "CompiledDirective { actions: 2 }"
        );
    }

    #[test]
    fn test_invalid_key_fails_at_compile() {
        let basis = parse_html("<div><span>Hi</span></div>").unwrap();
        let directive = Directive::new().bind("thing@", "hello");
        match Compiler::new().compile(std::slice::from_ref(&basis), &directive) {
            Err(RenderError::InvalidSelector { raw }) => assert_eq!(raw, "thing@"),
            other => panic!("expected a grammar error, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_css_fails_at_compile() {
        let basis = parse_html("<div><span>Hi</span></div>").unwrap();
        let directive = Directive::new().bind("##", "hello");
        assert!(Compiler::new()
            .compile(std::slice::from_ref(&basis), &directive)
            .is_err());
    }

    #[test]
    fn test_missing_loop_fails_at_compile() {
        let basis = parse_html(r#"<div><p class="row">x</p></div>"#).unwrap();
        let directive =
            Directive::new().bind(".row", Directive::new().bind("span", "x"));
        assert!(matches!(
            Compiler::new().compile(std::slice::from_ref(&basis), &directive),
            Err(RenderError::MissingLoop)
        ));
    }

    #[test]
    fn test_render_loop_and_parse_back() {
        let basis = parse_html(r#"<ul><li class="item"><span>x</span></li></ul>"#).unwrap();
        let live = basis.deep_clone();
        let directive = Directive::new().bind(
            ".item",
            Directive::new().bind("t <- things", Directive::new().bind("span", "t")),
        );
        let compiled = compile_for(&basis, &directive);

        let data = json!({"things": ["World", "PURE"]});
        compiled.render(&live, &data).unwrap();
        assert_eq!(live.children().len(), 2);
        assert_eq!(live.children()[0].text_content(), "World");
        assert_eq!(live.children()[1].text_content(), "PURE");

        let parsed = compiled.parse(&live).unwrap();
        assert_eq!(parsed, data);
    }

    #[test]
    fn test_loop_without_binding_name() {
        let basis = parse_html(r#"<ul><li class="item">x</li></ul>"#).unwrap();
        let live = basis.deep_clone();
        let directive = Directive::new().bind(
            ".item",
            Directive::new().bind("<- names", Directive::new().bind(".", [""])),
        );
        let compiled = compile_for(&basis, &directive);
        compiled
            .render(&live, &json!({"names": ["a", "b"]}))
            .unwrap();
        assert_eq!(live.children()[0].text_content(), "a");
        assert_eq!(live.children()[1].text_content(), "b");
    }

    #[test]
    fn test_render_format_function() {
        let basis = parse_html("<div><span>x</span></div>").unwrap();
        let live = basis.deep_clone();
        let directive = Directive::new().bind_fn("span", |args: &FormatArgs<'_>| {
            let name = args.data["name"].as_str().unwrap_or("");
            Formatted::Value(json!(format!("Hello, {name}")))
        });
        let compiled = compile_for(&basis, &directive);
        compiled.render(&live, &json!({"name": "Ada"})).unwrap();
        assert_eq!(live.text_content(), "Hello, Ada");
    }

    #[test]
    fn test_parse_function_without_inverse_fails() {
        let basis = parse_html("<div><span>x</span></div>").unwrap();
        let directive = Directive::new()
            .bind_fn("span", |_args: &FormatArgs<'_>| Formatted::Value(json!("y")));
        let compiled = compile_for(&basis, &directive);
        match compiled.parse(&basis) {
            Err(RenderError::MissingInverse { raw }) => assert_eq!(raw, "span"),
            other => panic!("expected missing inverse, got {other:?}"),
        }
    }

    #[test]
    fn test_function_with_inverse_round_trips() {
        let basis = parse_html("<div><span>x</span></div>").unwrap();
        let live = basis.deep_clone();
        let directive = Directive::new().bind_fn_with_inverse(
            "span",
            |args: &FormatArgs<'_>| {
                Formatted::Value(json!(args.data["n"].as_i64().unwrap_or(0) * 2))
            },
            |data, value| {
                let n: i64 = value.as_str().and_then(|s| s.parse().ok()).unwrap_or(0);
                data["n"] = json!(n / 2);
                Ok(())
            },
        );
        let compiled = compile_for(&basis, &directive);
        compiled.render(&live, &json!({"n": 21})).unwrap();
        assert_eq!(live.text_content(), "42");
        assert_eq!(compiled.parse(&live).unwrap(), json!({"n": 21}));
    }

    #[test]
    fn test_actions_apply_in_order() {
        let basis = parse_html("<div><span>x</span></div>").unwrap();
        let live = basis.deep_clone();
        let directive = Directive::new()
            .bind("span", "'first'")
            .bind("span", "'second'");
        let compiled = compile_for(&basis, &directive);
        compiled.render(&live, &json!({})).unwrap();
        assert_eq!(live.text_content(), "second");
    }

    #[test]
    fn test_failing_action_aborts_batch() {
        // the basis has no .row node, so the loop has no growth template
        let basis = parse_html("<div><span>y</span></div>").unwrap();
        let live = basis.deep_clone();
        let directive = Directive::new()
            .bind(
                ".row",
                Directive::new().bind("r <- rows", Directive::new().bind(".", "r")),
            )
            .bind("span", "'never'");
        let compiled = compile_for(&basis, &directive);
        let result = compiled.render(&live, &json!({"rows": ["a"]}));
        assert!(matches!(
            result,
            Err(RenderError::MissingLoopTemplate { .. })
        ));
        // the later binding never ran
        assert_eq!(live.text_content(), "y");
    }
}
