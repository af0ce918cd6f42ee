//! Markup parsing and serialization.
//!
//! Input must be well-formed (XHTML-style: every element closed, void
//! elements self-closed). Comment nodes are preserved since the templating
//! engine uses them as placeholder markers.

use std::fmt::Write;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::DomError;
use crate::node::{Node, NodeKind};

/// Parse markup into its top-level nodes.
///
/// # Errors
///
/// Returns [`DomError::Parse`] when the markup is not well formed.
pub fn parse_fragment(html: &str) -> Result<Vec<Node>, DomError> {
    // Wrap so that fragments with multiple roots (or leading text) parse.
    let wrapped = format!("<stencil-root>{html}</stencil-root>");
    let mut reader = Reader::from_str(&wrapped);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Node> = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let element = decode_element(&reader, &e)?;
                if let Some(top) = stack.last() {
                    top.append_child(&element);
                }
                stack.push(element);
            }
            Event::Empty(e) => {
                let element = decode_element(&reader, &e)?;
                if let Some(top) = stack.last() {
                    top.append_child(&element);
                }
            }
            Event::End(_) => {
                if stack.len() > 1 {
                    stack.pop();
                }
            }
            Event::Text(e) => {
                let text = reader.decoder().decode(&e)?.into_owned();
                if let Some(top) = stack.last() {
                    append_text(top, &text);
                }
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                if let Some(top) = stack.last() {
                    append_text(top, &text);
                }
            }
            Event::GeneralRef(e) => {
                let entity = reader.decoder().decode(&e)?.into_owned();
                if let Some(top) = stack.last() {
                    append_text(top, &decode_entity(&entity));
                }
            }
            Event::Comment(e) => {
                let text = reader.decoder().decode(&e)?.into_owned();
                if let Some(top) = stack.last() {
                    top.append_child(&Node::comment(text));
                }
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
        }
        buf.clear();
    }

    let wrapper = stack.into_iter().next().unwrap_or_else(|| Node::element("stencil-root"));
    let children = wrapper.children();
    for child in &children {
        child.detach();
    }
    Ok(children)
}

/// Parse markup that must contain exactly one top-level element.
///
/// Whitespace-only text around the element is ignored.
///
/// # Errors
///
/// Returns [`DomError::NotASingleElement`] when zero or more than one
/// top-level element is present, or [`DomError::Parse`] for malformed
/// markup.
pub fn parse_html(html: &str) -> Result<Node, DomError> {
    let nodes: Vec<Node> = parse_fragment(html)?
        .into_iter()
        .filter(|n| match n.kind() {
            NodeKind::Element | NodeKind::Comment => true,
            NodeKind::Text => !n.node_value().unwrap_or_default().trim().is_empty(),
        })
        .collect();
    match nodes.as_slice() {
        [single] if single.is_element() => Ok(single.clone()),
        _ => Err(DomError::NotASingleElement { found: nodes.len() }),
    }
}

fn decode_element<R>(reader: &Reader<R>, e: &BytesStart<'_>) -> Result<Node, DomError> {
    let tag = reader
        .decoder()
        .decode(e.name().as_ref())?
        .to_ascii_lowercase();
    let element = Node::element(tag);
    for attr in e.attributes() {
        let attr = attr?;
        let key = reader.decoder().decode(attr.key.as_ref())?.into_owned();
        let value = attr
            .unescape_value()
            .map_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned(), std::borrow::Cow::into_owned);
        element.set_attr(key, value);
    }
    Ok(element)
}

/// Append text, merging with a trailing text node when present.
fn append_text(parent: &Node, text: &str) {
    if let Some(last) = parent.children().last() {
        if last.kind() == NodeKind::Text {
            let merged = last.node_value().unwrap_or_default() + text;
            last.set_node_value(merged);
            return;
        }
    }
    parent.append_child(&Node::text(text));
}

/// Decode an entity reference to its character value.
fn decode_entity(entity: &str) -> String {
    match entity {
        "lt" => "<".to_owned(),
        "gt" => ">".to_owned(),
        "amp" => "&".to_owned(),
        "apos" => "'".to_owned(),
        "quot" => "\"".to_owned(),
        "nbsp" => "\u{00a0}".to_owned(),
        // Numeric character references
        s if s.starts_with('#') => {
            let code = if s.starts_with("#x") || s.starts_with("#X") {
                u32::from_str_radix(&s[2..], 16).ok()
            } else {
                s[1..].parse::<u32>().ok()
            };
            code.and_then(char::from_u32)
                .map_or_else(|| format!("&{entity};"), |c| c.to_string())
        }
        // Unknown entity - preserve as-is
        _ => format!("&{entity};"),
    }
}

impl Node {
    /// Serialize this node and its subtree to markup.
    ///
    /// Elements without content are self-closed. Live properties are not
    /// serialized; only attributes appear in the output.
    #[must_use]
    pub fn outer_html(&self) -> String {
        let mut out = String::with_capacity(256);
        serialize_node(self, &mut out);
        out
    }

    /// Serialize only the children of this node.
    #[must_use]
    pub fn inner_html(&self) -> String {
        let mut out = String::with_capacity(256);
        for child in self.children() {
            serialize_node(&child, &mut out);
        }
        out
    }
}

fn serialize_node(node: &Node, out: &mut String) {
    match node.kind() {
        NodeKind::Text => {
            let text = node.node_value().unwrap_or_default();
            out.push_str(&html_escape::encode_text(&text));
        }
        NodeKind::Comment => {
            let text = node.node_value().unwrap_or_default();
            write!(out, "<!--{text}-->").unwrap();
        }
        NodeKind::Element => {
            let tag = node.tag().unwrap_or_default();
            out.push('<');
            out.push_str(&tag);
            for (key, value) in node.attrs() {
                write!(
                    out,
                    r#" {}="{}""#,
                    key,
                    html_escape::encode_double_quoted_attribute(&value)
                )
                .unwrap();
            }
            let children = node.children();
            if children.is_empty() {
                out.push_str(" />");
            } else {
                out.push('>');
                for child in children {
                    serialize_node(&child, out);
                }
                write!(out, "</{tag}>").unwrap();
            }
        }
    }
}
