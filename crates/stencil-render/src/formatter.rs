//! Render-direction value production.
//!
//! A formatter turns the scope data into the value a writer will place at
//! the write site. The variant is chosen once, at compile time, from the
//! shape of the binding's template.

use serde_json::Value;

use crate::path::{self, Token};
use crate::template::{FilterFn, FormatArgs, FormatFn, Formatted, SortFn};

pub enum Formatter {
    /// No tokens: always the empty string.
    Empty,
    /// A constant literal.
    Literal(String),
    /// A dotted-path walk over the scope data.
    Path(Vec<String>),
    /// Multiple tokens concatenated; unresolved paths contribute nothing.
    Concat(Vec<Token>),
    /// A caller-supplied function.
    Func(FormatFn),
    /// A loop collection: the path is walked, then the collection is
    /// filtered and sorted over a copy. The referenced array is never
    /// mutated.
    Loop {
        path: Vec<String>,
        sort: Option<SortFn>,
        filter: Option<FilterFn>,
    },
}

impl Formatter {
    /// Build a formatter from a string template.
    #[must_use]
    pub fn from_text(template: &str) -> Self {
        let mut tokens = path::tokenize(template);
        match tokens.len() {
            0 => Self::Empty,
            1 => match tokens.remove(0) {
                Token::Literal(literal) => Self::Literal(literal),
                Token::Path(p) => Self::Path(p),
            },
            _ => Self::Concat(tokens),
        }
    }

    /// Produce the value to write.
    pub fn format(&self, args: &FormatArgs<'_>) -> Formatted {
        match self {
            Self::Empty => Formatted::Value(Value::String(String::new())),
            Self::Literal(literal) => Formatted::Value(Value::String(literal.clone())),
            Self::Path(p) => Formatted::Value(path::walk(args.data, p)),
            Self::Concat(tokens) => {
                let mut cat = String::new();
                for token in tokens {
                    match token {
                        Token::Literal(literal) => cat.push_str(literal),
                        Token::Path(p) => {
                            if let Some(part) = path::display(&path::walk(args.data, p)) {
                                cat.push_str(&part);
                            }
                        }
                    }
                }
                Formatted::Value(Value::String(cat))
            }
            Self::Func(format) => format(args),
            Self::Loop { path: p, sort, filter } => {
                let walked = path::walk(args.data, p);
                let Value::Array(items) = walked else {
                    return Formatted::Value(walked);
                };
                let mut selected: Vec<Value> = match filter {
                    Some(filter) => items
                        .iter()
                        .enumerate()
                        .filter(|(i, item)| filter(item, *i, &items))
                        .map(|(_, item)| item.clone())
                        .collect(),
                    None => items,
                };
                if let Some(sort) = sort {
                    selected.sort_by(|a, b| sort(a, b));
                }
                Formatted::Value(Value::Array(selected))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use stencil_dom::Node;

    fn args<'a>(data: &'a Value, target: &'a Node) -> FormatArgs<'a> {
        FormatArgs {
            data,
            target,
            index: None,
            nodes: &[],
            collection: None,
        }
    }

    fn formatted_value(formatter: &Formatter, data: &Value) -> Value {
        let target = Node::element("div");
        match formatter.format(&args(data, &target)) {
            Formatted::Value(v) => v,
            Formatted::Node(_) => panic!("expected a value"),
        }
    }

    #[test]
    fn test_empty_template() {
        let formatter = Formatter::from_text("");
        assert_eq!(formatted_value(&formatter, &json!({})), json!(""));
    }

    #[test]
    fn test_single_path() {
        let formatter = Formatter::from_text("player.name");
        let data = json!({"player": {"name": "Bob"}});
        assert_eq!(formatted_value(&formatter, &data), json!("Bob"));
    }

    #[test]
    fn test_single_literal() {
        let formatter = Formatter::from_text("'Exactly this'");
        assert_eq!(
            formatted_value(&formatter, &json!({})),
            json!("Exactly this")
        );
    }

    #[test]
    fn test_concatenation() {
        let formatter = Formatter::from_text("first ' ' last");
        let data = json!({"first": "Ada", "last": "Lovelace"});
        assert_eq!(formatted_value(&formatter, &data), json!("Ada Lovelace"));
    }

    #[test]
    fn test_concatenation_skips_unresolved_paths() {
        let formatter = Formatter::from_text("first ' ' missing");
        let data = json!({"first": "Ada"});
        assert_eq!(formatted_value(&formatter, &data), json!("Ada "));
    }

    #[test]
    fn test_loop_formatter_plain() {
        let formatter = Formatter::Loop {
            path: vec!["items".to_owned()],
            sort: None,
            filter: None,
        };
        let data = json!({"items": [3, 1, 2]});
        assert_eq!(formatted_value(&formatter, &data), json!([3, 1, 2]));
    }

    #[test]
    fn test_loop_formatter_filter_then_sort() {
        let formatter = Formatter::Loop {
            path: vec!["items".to_owned()],
            sort: Some(std::rc::Rc::new(|a: &Value, b: &Value| {
                a.as_i64().cmp(&b.as_i64())
            })),
            filter: Some(std::rc::Rc::new(|item: &Value, _, _| {
                item.as_i64().is_some_and(|n| n > 1)
            })),
        };
        let data = json!({"items": [3, 1, 2]});
        assert_eq!(formatted_value(&formatter, &data), json!([2, 3]));
        // the source array is untouched
        assert_eq!(data["items"], json!([3, 1, 2]));
    }
}
