//! The template-value micro-language.
//!
//! A string template is a whitespace-separated sequence of tokens. A token
//! is either a quoted literal (`'...'` or `"..."`) or a bareword dotted
//! data path (`player.name`). Rendering concatenates the resolved tokens;
//! parsing inverts the same token sequence.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#" *(?:"([^"]*)"|'([^']*)'|([^'" ]+)) *"#).expect("invalid token regex")
});

/// One token of a string template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A quoted literal run.
    Literal(String),
    /// A dotted data path.
    Path(Vec<String>),
}

/// Tokenize a template string into literal and path tokens.
#[must_use]
pub fn tokenize(template: &str) -> Vec<Token> {
    TOKEN_RE
        .captures_iter(template)
        .map(|captures| {
            captures.get(3).map_or_else(
                || {
                    let literal = captures
                        .get(1)
                        .or_else(|| captures.get(2))
                        .map_or("", |m| m.as_str());
                    Token::Literal(literal.to_owned())
                },
                |path| Token::Path(split_path(path.as_str())),
            )
        })
        .collect()
}

/// Split a dotted path into segments.
#[must_use]
pub fn split_path(path: &str) -> Vec<String> {
    path.split('.').map(str::to_owned).collect()
}

/// Walk `data` along `path` by sequential property access.
///
/// The walk short-circuits as soon as an intermediate value is false-y
/// (null, `false`, `0`, or the empty string), returning that value. Empty
/// path segments are skipped. A missing property yields `Value::Null`.
#[must_use]
pub fn walk(data: &Value, path: &[String]) -> Value {
    let mut current = data.clone();
    for segment in path {
        if segment.is_empty() {
            continue;
        }
        if !truthy(&current) {
            return current;
        }
        current = match &current {
            Value::Object(map) => map.get(segment).cloned().unwrap_or(Value::Null),
            Value::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i).cloned())
                .unwrap_or(Value::Null),
            _ => Value::Null,
        };
    }
    current
}

/// Write `value` into `data` at `path`, creating intermediate containers as
/// needed. A segment followed by a non-negative integer segment creates an
/// array; anything else creates an object. Arrays grow with nulls to reach
/// an index.
pub fn write(data: &mut Value, path: &[String], value: Value) {
    let path: Vec<&String> = path.iter().filter(|s| !s.is_empty()).collect();
    if path.is_empty() {
        return;
    }

    let mut current = data;
    for (i, segment) in path.iter().enumerate() {
        let last = i + 1 == path.len();
        let next_is_index = path
            .get(i + 1)
            .is_some_and(|next| next.parse::<usize>().is_ok());

        if let Ok(index) = segment.parse::<usize>() {
            if !current.is_array() {
                *current = Value::Array(Vec::new());
            }
            let items = current.as_array_mut().expect("just made an array");
            while items.len() <= index {
                items.push(Value::Null);
            }
            if last {
                items[index] = value;
                return;
            }
            if items[index].is_null() {
                items[index] = empty_container(next_is_index);
            }
            current = &mut items[index];
        } else {
            if !current.is_object() {
                *current = Value::Object(serde_json::Map::new());
            }
            let map = current.as_object_mut().expect("just made an object");
            if last {
                map.insert((*segment).clone(), value);
                return;
            }
            let entry = map
                .entry((*segment).clone())
                .or_insert_with(|| empty_container(next_is_index));
            if entry.is_null() {
                *entry = empty_container(next_is_index);
            }
            current = entry;
        }
    }
}

fn empty_container(array: bool) -> Value {
    if array {
        Value::Array(Vec::new())
    } else {
        Value::Object(serde_json::Map::new())
    }
}

/// JavaScript-style truthiness over JSON values.
#[must_use]
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty() && s != "false",
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a value as DOM text. `None` for null (an unresolved path
/// contributes nothing to concatenation).
#[must_use]
pub fn display(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_tokenize_single_path() {
        assert_eq!(
            tokenize("player.name"),
            vec![Token::Path(vec!["player".to_owned(), "name".to_owned()])]
        );
    }

    #[test]
    fn test_tokenize_mixed() {
        let tokens = tokenize("player.first ' (' player.last ')'");
        assert_eq!(
            tokens,
            vec![
                Token::Path(vec!["player".to_owned(), "first".to_owned()]),
                Token::Literal(" (".to_owned()),
                Token::Path(vec!["player".to_owned(), "last".to_owned()]),
                Token::Literal(")".to_owned()),
            ]
        );
    }

    #[test]
    fn test_tokenize_double_quotes() {
        let tokens = tokenize(r#""alert('" child.name "');""#);
        assert_eq!(
            tokens,
            vec![
                Token::Literal("alert('".to_owned()),
                Token::Path(vec!["child".to_owned(), "name".to_owned()]),
                Token::Literal("');".to_owned()),
            ]
        );
    }

    #[test]
    fn test_tokenize_empty() {
        assert_eq!(tokenize(""), Vec::new());
        assert_eq!(tokenize("   "), Vec::new());
    }

    #[test]
    fn test_walk_nested() {
        let data = json!({"a": {"b": {"c": "deep"}}});
        let path = split_path("a.b.c");
        assert_eq!(walk(&data, &path), json!("deep"));
    }

    #[test]
    fn test_walk_array_index() {
        let data = json!({"items": ["x", "y"]});
        assert_eq!(walk(&data, &split_path("items.1")), json!("y"));
    }

    #[test]
    fn test_walk_missing_yields_null() {
        let data = json!({"a": 1});
        assert_eq!(walk(&data, &split_path("a.b.c")), Value::Null);
        assert_eq!(walk(&data, &split_path("nope")), Value::Null);
    }

    #[test]
    fn test_walk_short_circuits_on_falsy() {
        let data = json!({"a": 0});
        assert_eq!(walk(&data, &split_path("a.b")), json!(0));
        let data = json!({"a": null});
        assert_eq!(walk(&data, &split_path("a.b")), Value::Null);
    }

    #[test]
    fn test_write_creates_objects() {
        let mut data = json!({});
        write(&mut data, &split_path("a.b"), json!("v"));
        assert_eq!(data, json!({"a": {"b": "v"}}));
    }

    #[test]
    fn test_write_creates_arrays_for_integer_segments() {
        let mut data = json!({});
        write(&mut data, &split_path("list.1"), json!("second"));
        assert_eq!(data, json!({"list": [null, "second"]}));
    }

    #[test]
    fn test_write_into_existing() {
        let mut data = json!({"a": {"x": 1}});
        write(&mut data, &split_path("a.y"), json!(2));
        assert_eq!(data, json!({"a": {"x": 1, "y": 2}}));
    }

    #[test]
    fn test_truthy() {
        assert!(truthy(&json!({"k": 1})));
        assert!(truthy(&json!([1])));
        assert!(truthy(&json!("x")));
        assert!(!truthy(&json!("")));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!(false)));
        assert!(!truthy(&Value::Null));
    }

    #[test]
    fn test_display() {
        assert_eq!(display(&json!("s")).as_deref(), Some("s"));
        assert_eq!(display(&json!(2)).as_deref(), Some("2"));
        assert_eq!(display(&json!(true)).as_deref(), Some("true"));
        assert_eq!(display(&Value::Null), None);
    }
}
