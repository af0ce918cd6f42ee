//! Directive-free rendering driven by class names.
//!
//! The element tree is walked recursively; whenever a class name parses
//! as a directive key whose selector part names a property of the
//! current data scope, that property is rendered into the element. Object
//! properties narrow the scope for the element's descendants, array
//! properties reconcile a sibling run keyed by the class, and scalars are
//! written in place. The scope chain is the recursion stack itself: each
//! nested object extends it, and it unwinds naturally.

use std::rc::Rc;

use serde_json::Value;
use stencil_dom::Node;

use crate::backend::{DomBackend, QueryBackend};
use crate::error::RenderError;
use crate::finder::LoopFinder;
use crate::selector::SelectorSpec;
use crate::template::Formatted;
use crate::writer::Writer;

/// Render `data` into `element` by matching class names against data
/// properties.
///
/// # Errors
///
/// DOM errors from class-derived selectors, and loop errors when a
/// matched array cannot be reconciled.
pub fn auto_render(element: &Node, data: &Value) -> Result<(), RenderError> {
    walk(element, data)
}

fn walk(node: &Node, scope: &Value) -> Result<(), RenderError> {
    if !node.is_element() {
        return Ok(());
    }

    let Value::Object(head) = scope else {
        return Ok(());
    };

    let mut child_scope = scope.clone();
    let mut looped = false;

    for class in node.classes() {
        let Ok(spec) = SelectorSpec::parse(&class) else {
            continue;
        };
        if spec.is_self() || !head.contains_key(&spec.selector) {
            continue;
        }
        let key = spec.selector.clone();
        // Modifier syntax in a class name is directive-only; strip it so
        // the serialized class stays a plain name.
        if class != key {
            rewrite_class(node, &class, &key);
        }

        let value = &head[&key];
        match value {
            Value::Array(items) => {
                looped = true;
                render_array(node, &spec, &class, items)?;
            }
            Value::Object(_) => {
                child_scope = value.clone();
            }
            scalar => write_scalar(node, &spec, scalar)?,
        }
    }

    // An array match re-walks its own run with per-item scopes.
    if looped {
        return Ok(());
    }
    for child in node.children() {
        walk(&child, &child_scope)?;
    }
    Ok(())
}

fn render_array(
    node: &Node,
    spec: &SelectorSpec,
    class: &str,
    items: &[Value],
) -> Result<(), RenderError> {
    let parent = match node.parent() {
        Some(parent) => parent,
        None => {
            // A detached root still needs a parent to host the run.
            let holder = Node::element("stencil-root");
            holder.append_child(node);
            holder
        }
    };

    let backend: Rc<dyn QueryBackend> = Rc::new(DomBackend);
    let selector = format!(".{}", spec.selector);
    let templates = backend.query(std::slice::from_ref(&parent), &selector)?;
    let finder = LoopFinder {
        backend,
        raw: class.to_owned(),
        selector,
        templates,
    };
    let nodes = finder.reconcile(&parent, items.len())?;

    for (item, target) in items.iter().zip(&nodes) {
        if item.is_object() {
            walk(target, item)?;
        } else {
            write_scalar(target, spec, item)?;
        }
    }
    Ok(())
}

fn write_scalar(node: &Node, spec: &SelectorSpec, value: &Value) -> Result<(), RenderError> {
    let writer = match &spec.attr {
        Some(name) => Writer::Attr {
            name: name.clone(),
            prepend: spec.prepend,
            append: spec.append,
            toggle: spec.toggle,
        },
        None => Writer::Element {
            prepend: spec.prepend,
            append: spec.append,
        },
    };
    writer.write(node, &Formatted::Value(value.clone()), 0, &[])?;
    Ok(())
}

fn rewrite_class(node: &Node, from: &str, to: &str) {
    let rewritten: Vec<String> = node
        .classes()
        .into_iter()
        .map(|c| if c == from { to.to_owned() } else { c })
        .collect();
    node.set_attr("class", rewritten.join(" "));
}
