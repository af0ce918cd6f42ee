//! Ready-made format functions.

use std::rc::Rc;

use serde_json::Value;

use crate::path;
use crate::template::{Formatted, Template};

/// A formatter producing the one-based position of the current loop item.
/// Parsing it back is a no-op.
#[must_use]
pub fn position() -> Template {
    Template::Format {
        format: Rc::new(|args| {
            args.index
                .map_or(Formatted::Value(Value::Null), |i| {
                    Formatted::Value(Value::from(i as u64 + 1))
                })
        }),
        inverse: Some(Rc::new(|_data, _value| Ok(()))),
    }
}

/// A formatter that adds or removes `class` on the target's class list
/// depending on the truthiness of the data property at `property`. The
/// inverse recovers that boolean from class membership.
///
/// Bind it to a `@class` key on the node whose class should change.
#[must_use]
pub fn toggle_class(class: &str, property: &str) -> Template {
    let class = class.to_owned();
    let path = path::split_path(property);

    let format_class = class.clone();
    let format_path = path.clone();
    let inverse_class = class;

    Template::Format {
        format: Rc::new(move |args| {
            let on = path::truthy(&path::walk(args.data, &format_path));
            let mut tokens = args.target.classes();
            let present = tokens.iter().position(|t| *t == format_class);
            match (on, present) {
                (true, None) => tokens.push(format_class.clone()),
                (false, Some(at)) => {
                    tokens.remove(at);
                }
                _ => {}
            }
            Formatted::Value(Value::String(tokens.join(" ")))
        }),
        inverse: Some(Rc::new(move |data, value| {
            let on = value
                .as_str()
                .is_some_and(|s| s.split_whitespace().any(|t| t == inverse_class));
            path::write(data, &path, Value::Bool(on));
            Ok(())
        })),
    }
}
