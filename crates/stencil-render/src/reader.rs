//! Parse-direction value placement.
//!
//! A reader is the inverse of a formatter: it takes the value a parser
//! extracted from the DOM and folds it back into the result data object.
//! String templates are inverted token by token; literal tokens are
//! matched and discarded, path tokens receive the text between them.

use serde_json::Value;

use crate::error::RenderError;
use crate::path::{self, Token};
use crate::template::InverseFn;

pub enum Reader {
    /// Literal-only template: nothing to read back.
    Empty,
    /// A single dotted path receiving the whole value.
    Path(Vec<String>),
    /// A mixed template, split positionally around its literals.
    Deconcat { parts: Vec<Token>, raw: String },
    /// Inverse of a caller-supplied format function.
    Inverse(InverseFn),
    /// A format function without an inverse; hard error at parse time.
    MissingInverse { raw: String },
}

impl Reader {
    /// Build a reader from a string template. Adjacent literal tokens are
    /// merged so each literal is one positional anchor.
    #[must_use]
    pub fn from_text(template: &str, raw: &str) -> Self {
        let mut parts: Vec<Token> = Vec::new();
        for token in path::tokenize(template) {
            match (&token, parts.last_mut()) {
                (Token::Literal(next), Some(Token::Literal(prev))) => prev.push_str(next),
                _ => parts.push(token),
            }
        }

        let paths = parts
            .iter()
            .filter(|t| matches!(t, Token::Path(_)))
            .count();
        match (parts.len(), paths) {
            (_, 0) => Self::Empty,
            (1, _) => match parts.remove(0) {
                Token::Path(p) => Self::Path(p),
                Token::Literal(_) => Self::Empty,
            },
            _ => Self::Deconcat {
                parts,
                raw: raw.to_owned(),
            },
        }
    }

    /// Fold `value` into `data`.
    ///
    /// # Errors
    ///
    /// [`RenderError::MissingInverse`] for uninvertible functions,
    /// [`RenderError::AdjacentPaths`] when two paths meet with no literal
    /// separator to split on.
    pub fn read(&self, data: &mut Value, value: Value) -> Result<(), RenderError> {
        match self {
            Self::Empty => Ok(()),
            Self::Path(p) => {
                path::write(data, p, value);
                Ok(())
            }
            Self::Inverse(inverse) => inverse(data, value),
            Self::MissingInverse { raw } => {
                Err(RenderError::MissingInverse { raw: raw.clone() })
            }
            Self::Deconcat { parts, raw } => deconcat(parts, raw, data, value),
        }
    }
}

fn deconcat(
    parts: &[Token],
    raw: &str,
    data: &mut Value,
    value: Value,
) -> Result<(), RenderError> {
    let text = match &value {
        Value::String(s) => s.clone(),
        other => path::display(other).unwrap_or_default(),
    };
    let mut rest = text.as_str();

    let mut i = 0;
    while i < parts.len() {
        match &parts[i] {
            Token::Literal(literal) => {
                // A leading literal prefixes the remaining text.
                rest = rest
                    .strip_prefix(literal.as_str())
                    .or_else(|| rest.get(literal.len()..))
                    .unwrap_or("");
                i += 1;
            }
            Token::Path(p) => {
                match parts.get(i + 1) {
                    // The next literal bounds this path's slice.
                    Some(Token::Literal(literal)) => {
                        let (slice, after) = match rest.find(literal.as_str()) {
                            Some(at) => (&rest[..at], &rest[at + literal.len()..]),
                            None => (rest, ""),
                        };
                        path::write(data, p, Value::String(slice.to_owned()));
                        rest = after;
                        i += 2;
                    }
                    Some(Token::Path(_)) => {
                        return Err(RenderError::AdjacentPaths { raw: raw.to_owned() });
                    }
                    // A trailing path takes everything left.
                    None => {
                        path::write(data, p, Value::String(rest.to_owned()));
                        rest = "";
                        i += 1;
                    }
                }
            }
        }
    }
    Ok(())
}
