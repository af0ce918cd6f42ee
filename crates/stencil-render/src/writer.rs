//! Write-site mutation.
//!
//! A writer places a formatted value at one resolved node. Attribute
//! writers special-case the boolean `selected`/`checked` pair and the
//! class attribute; element writers special-case form controls, whose
//! content lives in the `value` property rather than in child nodes.

use std::rc::Rc;

use serde_json::Value;
use stencil_dom::Node;

use crate::compile::{CompiledDirective, LoopFrame};
use crate::error::RenderError;
use crate::path;
use crate::template::Formatted;

pub enum Writer {
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
        renderer: Rc<CompiledDirective>,
        variable: Option<String>,
    },
}

impl Writer {
    /// Write `bound` into `node`. Returns a replacement node when the
    /// write produced a structural substitution instead of a content
    /// update; the caller swaps it in via the parent.
    pub fn write(
        &self,
        node: &Node,
        bound: &Formatted,
        index: usize,
        nodes: &[Node],
    ) -> Result<Option<Node>, RenderError> {
        match self {
            Self::Attr {
                name,
                prepend,
                append,
                toggle,
            } => {
                if let Formatted::Value(value) = bound {
                    write_attr(node, name, value, *prepend, *append, *toggle);
                }
                Ok(None)
            }
            Self::Element { prepend, append } => {
                Ok(write_element(node, bound, *prepend, *append))
            }
            Self::Loop { renderer, variable } => {
                let Formatted::Value(Value::Array(items)) = bound else {
                    return Ok(None);
                };
                let item = items.get(index).cloned().unwrap_or(Value::Null);
                let scope = match variable {
                    Some(name) => {
                        let mut wrapped = serde_json::Map::new();
                        wrapped.insert(name.clone(), item);
                        Value::Object(wrapped)
                    }
                    None => item,
                };
                let frame = LoopFrame {
                    index,
                    nodes,
                    collection: items,
                };
                renderer.render_scoped(node, &scope, Some(&frame))?;
                Ok(None)
            }
        }
    }
}

fn write_attr(node: &Node, name: &str, value: &Value, prepend: bool, append: bool, toggle: bool) {
    let text = path::display(value).unwrap_or_default();
    if !node.is_element() {
        let old = node.prop(name).unwrap_or_default();
        let merged = merge(&old, &text, prepend, append);
        node.set_prop(name, merged);
        return;
    }

    let tag = node.tag().unwrap_or_default();
    if (name == "selected" && tag == "option") || (name == "checked" && tag == "input") {
        // Boolean attributes track both the live property and the
        // serialized attribute.
        let on = path::truthy(value);
        node.set_prop(name, on.to_string());
        if on {
            node.set_attr(name, text);
        } else {
            node.remove_attr(name);
        }
    } else if name == "class" || name == "className" || name == "classList" {
        let old = node.attr("class").unwrap_or_default();
        let merged = if toggle {
            let mut tokens: Vec<String> =
                old.split_whitespace().map(str::to_owned).collect();
            if let Some(at) = tokens.iter().position(|t| *t == text) {
                tokens.remove(at);
            } else {
                tokens.push(text);
            }
            tokens.join(" ")
        } else {
            normalize_classes(&merge_spaced(&old, &text, prepend, append))
        };
        node.set_attr("class", merged);
    } else {
        let old = node.attr(name).unwrap_or_default();
        node.set_attr(name, merge(&old, &text, prepend, append));
    }
}

fn write_element(node: &Node, bound: &Formatted, prepend: bool, append: bool) -> Option<Node> {
    if let Formatted::Node(replacement) = bound {
        if node.ptr_eq(replacement) {
            return None;
        }
        if append {
            node.append_child(replacement);
            return None;
        }
        if prepend {
            match node.first_child() {
                Some(first) => node.insert_before(replacement, &first),
                None => node.append_child(replacement),
            }
            return None;
        }
        return Some(replacement.clone());
    }

    let Formatted::Value(value) = bound else {
        return None;
    };
    let text = path::display(value).unwrap_or_default();

    if !node.is_element() {
        let old = node.node_value().unwrap_or_default();
        node.set_node_value(merge(&old, &text, prepend, append));
        return None;
    }

    let tag = node.tag().unwrap_or_default();
    // Form controls have no useful children; their content is the live
    // `value` property.
    if tag == "input" || tag == "textarea" {
        let old = node
            .prop("value")
            .or_else(|| node.attr("value"))
            .unwrap_or_default();
        node.set_prop("value", merge(&old, &text, prepend, append));
        return None;
    }

    if append || (prepend && node.child_count() == 0) {
        node.append_child(&Node::text(text));
    } else if prepend {
        if let Some(first) = node.first_child() {
            node.insert_before(&Node::text(text), &first);
        }
    } else {
        node.set_text_content(text);
    }
    None
}

fn merge(old: &str, new: &str, prepend: bool, append: bool) -> String {
    if append {
        format!("{old}{new}")
    } else if prepend {
        format!("{new}{old}")
    } else {
        new.to_owned()
    }
}

fn merge_spaced(old: &str, new: &str, prepend: bool, append: bool) -> String {
    if append {
        format!("{old} {new}")
    } else if prepend {
        format!("{new} {old}")
    } else {
        new.to_owned()
    }
}

fn normalize_classes(classes: &str) -> String {
    classes.split_whitespace().collect::<Vec<_>>().join(" ")
}
