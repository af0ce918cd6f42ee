//! Parse-direction value extraction.
//!
//! A parser is the structural inverse of a writer: it locates the node a
//! binding wrote to and pulls the current value back out. For append and
//! prepend bindings the corresponding basis node supplies the immutable
//! base text, and only the positional delta around it is recovered.

use std::rc::Rc;

use serde_json::Value;
use stencil_dom::Node;

use crate::backend::QueryBackend;
use crate::compile::CompiledDirective;
use crate::error::RenderError;
use crate::finder::Finder;

pub enum Parser {
    Attr {
        name: String,
        prepend: bool,
        append: bool,
        toggle: bool,
    },
    Element {
        prepend: bool,
        append: bool,
    },
    Loop {
        backend: Rc<dyn QueryBackend>,
        selector: String,
        renderer: Rc<CompiledDirective>,
        variable: Option<String>,
    },
}

impl Parser {
    /// Extract the value this binding currently holds in `source`.
    ///
    /// # Errors
    ///
    /// [`RenderError::NodeNotFound`] when no node matches the binding's
    /// key, [`RenderError::ToggleNotInvertible`] for class toggles.
    pub fn extract(
        &self,
        source: &Node,
        finder: &Finder,
        basis: &[Node],
        raw: &str,
    ) -> Result<Value, RenderError> {
        match self {
            Self::Element { prepend, append } => {
                let target = first_match(finder, source, raw)?;
                let original = basis_match(finder, basis, *prepend, *append)?;
                Ok(Value::String(element_value(&target, original.as_ref(), *append)))
            }
            Self::Attr {
                name,
                prepend,
                append,
                toggle,
            } => {
                let target = first_match(finder, source, raw)?;
                let original = basis_match(finder, basis, *prepend, *append)?;
                attr_value(&target, original.as_ref(), name, *append, *toggle, raw)
            }
            Self::Loop {
                backend,
                selector,
                renderer,
                variable,
            } => {
                let nodes = backend.query(std::slice::from_ref(source), selector)?;
                let mut items = Vec::with_capacity(nodes.len());
                for node in &nodes {
                    let mut item = renderer.parse(node)?;
                    if let Some(name) = variable {
                        item = match item {
                            Value::Object(mut map) => {
                                map.remove(name).unwrap_or(Value::Null)
                            }
                            other => other,
                        };
                    }
                    items.push(item);
                }
                Ok(Value::Array(items))
            }
        }
    }
}

fn first_match(finder: &Finder, source: &Node, raw: &str) -> Result<Node, RenderError> {
    finder
        .locate(source)?
        .into_iter()
        .next()
        .ok_or_else(|| RenderError::NodeNotFound { raw: raw.to_owned() })
}

/// The basis counterpart of the target, needed only for delta recovery.
fn basis_match(
    finder: &Finder,
    basis: &[Node],
    prepend: bool,
    append: bool,
) -> Result<Option<Node>, RenderError> {
    if !prepend && !append {
        return Ok(None);
    }
    let Some(context) = basis.first() else {
        return Ok(None);
    };
    Ok(finder.locate(context)?.into_iter().next())
}

fn element_value(target: &Node, original: Option<&Node>, end: bool) -> String {
    if !target.is_element() {
        let value = target.node_value().unwrap_or_default();
        return match original {
            Some(original) => diff(&value, &original.node_value().unwrap_or_default(), end),
            None => value,
        };
    }

    let tag = target.tag().unwrap_or_default();
    if tag == "input" || tag == "textarea" {
        let value = target
            .prop("value")
            .or_else(|| target.attr("value"))
            .unwrap_or_default();
        return match original {
            Some(original) => {
                let base = if tag == "input" {
                    original.attr("value").unwrap_or_default()
                } else {
                    original.text_content()
                };
                diff(&value, &base, end)
            }
            None => value,
        };
    }

    let value = target.text_content();
    match original {
        Some(original) => diff(&value, &original.text_content(), end),
        None => value,
    }
}

fn attr_value(
    target: &Node,
    original: Option<&Node>,
    name: &str,
    end: bool,
    toggle: bool,
    raw: &str,
) -> Result<Value, RenderError> {
    if !target.is_element() {
        let value = target.prop(name).unwrap_or_default();
        return Ok(Value::String(match original {
            Some(original) => diff(&value, &original.prop(name).unwrap_or_default(), end),
            None => value,
        }));
    }

    let tag = target.tag().unwrap_or_default();
    if (name == "selected" && tag == "option") || (name == "checked" && tag == "input") {
        // Boolean state lives in the property after a render; an untouched
        // node still carries only the serialized attribute.
        let on = target
            .prop(name)
            .map_or_else(|| target.attr(name).is_some(), |p| p == "true");
        return Ok(Value::Bool(on));
    }

    if name == "class" || name == "className" || name == "classList" {
        if toggle {
            return Err(RenderError::ToggleNotInvertible { raw: raw.to_owned() });
        }
        let value = target.attr("class").unwrap_or_default();
        let value = match original {
            Some(original) => {
                diff(&value, &original.attr("class").unwrap_or_default(), end)
                    .trim()
                    .to_owned()
            }
            None => value,
        };
        return Ok(Value::String(value));
    }

    match target.attr(name) {
        None => Ok(Value::Null),
        Some(value) => Ok(Value::String(match original {
            Some(original) => diff(&value, &original.attr(name).unwrap_or_default(), end),
            None => value,
        })),
    }
}

/// Strip the immutable base text out of a live value: the portion after it
/// for appends (`end`), before it for prepends. An untraceable base yields
/// the empty string.
fn diff(value: &str, original: &str, end: bool) -> String {
    match value.find(original) {
        Some(at) if end => value[at + original.len()..].to_owned(),
        Some(at) => value[..at].to_owned(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use stencil_dom::parse_html;

    fn self_finder() -> Finder {
        Finder::Top
    }

    #[test]
    fn test_diff() {
        assert_eq!(diff("Hello World", "Hello", true), " World");
        assert_eq!(diff("Hello World", " World", false), "Hello");
        assert_eq!(diff("anything", "missing", true), "");
        assert_eq!(diff("tail", "", true), "tail");
    }

    #[test]
    fn test_element_text_extraction() {
        let div = parse_html("<div>Hello</div>").unwrap();
        let parser = Parser::Element {
            prepend: false,
            append: false,
        };
        let value = parser.extract(&div, &self_finder(), &[], "").unwrap();
        assert_eq!(value, Value::String("Hello".to_owned()));
    }

    #[test]
    fn test_element_append_delta() {
        let basis = parse_html("<div>Hello</div>").unwrap();
        let live = parse_html("<div>Hello World</div>").unwrap();
        let parser = Parser::Element {
            prepend: false,
            append: true,
        };
        let value = parser
            .extract(&live, &self_finder(), &[basis], "")
            .unwrap();
        assert_eq!(value, Value::String(" World".to_owned()));
    }

    #[test]
    fn test_input_value_extraction() {
        let input = parse_html(r#"<input value="typed" />"#).unwrap();
        let parser = Parser::Element {
            prepend: false,
            append: false,
        };
        let value = parser.extract(&input, &self_finder(), &[], "").unwrap();
        assert_eq!(value, Value::String("typed".to_owned()));
    }

    #[test]
    fn test_attr_extraction() {
        let span = parse_html(r#"<span title="note">x</span>"#).unwrap();
        let parser = Parser::Attr {
            name: "title".to_owned(),
            prepend: false,
            append: false,
            toggle: false,
        };
        let value = parser.extract(&span, &self_finder(), &[], "").unwrap();
        assert_eq!(value, Value::String("note".to_owned()));
    }

    #[test]
    fn test_missing_attr_is_null() {
        let span = parse_html("<span>x</span>").unwrap();
        let parser = Parser::Attr {
            name: "title".to_owned(),
            prepend: false,
            append: false,
            toggle: false,
        };
        let value = parser.extract(&span, &self_finder(), &[], "").unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn test_selected_reads_attribute_when_untouched() {
        let option = parse_html(r#"<option selected="selected">x</option>"#).unwrap();
        let parser = Parser::Attr {
            name: "selected".to_owned(),
            prepend: false,
            append: false,
            toggle: false,
        };
        let value = parser.extract(&option, &self_finder(), &[], "").unwrap();
        assert_eq!(value, Value::Bool(true));
    }

    #[test]
    fn test_toggle_is_not_invertible() {
        let div = parse_html(r#"<div class="on">x</div>"#).unwrap();
        let parser = Parser::Attr {
            name: "class".to_owned(),
            prepend: false,
            append: false,
            toggle: true,
        };
        match parser.extract(&div, &self_finder(), &[], ".@class:toggle") {
            Err(RenderError::ToggleNotInvertible { raw }) => {
                assert_eq!(raw, ".@class:toggle");
            }
            other => panic!("expected toggle error, got {other:?}"),
        }
    }
}
