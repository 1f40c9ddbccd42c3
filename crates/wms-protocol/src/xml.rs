//! Minimal element tree over the quick-xml event reader.
//!
//! Capability documents are small enough to hold in memory, and the decoders
//! need random access to siblings, so the event stream is folded into a tree
//! of [`XmlElement`]s. Namespace prefixes are dropped from element and
//! attribute names.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

use wms_common::{WmsError, WmsResult};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    /// Local name, without namespace prefix
    pub name: String,
    pub attributes: HashMap<String, String>,
    /// Concatenated text content directly under this element
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// Parse a document and return its root element.
    pub fn parse(xml: &str) -> WmsResult<XmlElement> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    stack.push(element_from_start(&e)?);
                }
                Ok(Event::Empty(e)) => {
                    let element = element_from_start(&e)?;
                    attach(&mut stack, &mut root, element);
                }
                Ok(Event::Text(t)) => {
                    if let Some(current) = stack.last_mut() {
                        let text = t.unescape().map_err(|e| malformed(&reader, e))?;
                        current.text.push_str(&text);
                    }
                }
                Ok(Event::CData(c)) => {
                    if let Some(current) = stack.last_mut() {
                        current
                            .text
                            .push_str(&String::from_utf8_lossy(&c.into_inner()));
                    }
                }
                Ok(Event::End(_)) => {
                    let element = stack.pop().ok_or_else(|| {
                        WmsError::MalformedDocument("unbalanced closing tag".to_string())
                    })?;
                    attach(&mut stack, &mut root, element);
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(malformed(&reader, e)),
                _ => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(WmsError::MalformedDocument(format!(
                "unclosed element <{}>",
                stack.last().map(|e| e.name.as_str()).unwrap_or_default()
            )));
        }

        root.ok_or_else(|| WmsError::MalformedDocument("document has no root element".to_string()))
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// First direct child with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given local name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text of the first direct child with the given name, if non-empty.
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name)
            .map(|c| c.text.trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Follow a chain of child names, e.g. `["Capability", "Request", "GetMap"]`.
    pub fn path(&self, names: &[&str]) -> Option<&XmlElement> {
        names
            .iter()
            .try_fold(self, |element, name| element.child(name))
    }

    /// Attribute parsed as `f64`.
    pub fn attr_f64(&self, name: &str) -> Option<f64> {
        self.attr(name).and_then(|v| v.trim().parse().ok())
    }
}

fn element_from_start(e: &BytesStart<'_>) -> WmsResult<XmlElement> {
    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let mut attributes = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| {
            WmsError::MalformedDocument(format!("bad attribute on <{}>: {}", name, err))
        })?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| WmsError::MalformedDocument(err.to_string()))?
            .into_owned();
        attributes.insert(key, value);
    }

    Ok(XmlElement {
        name,
        attributes,
        ..Default::default()
    })
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn malformed<R>(reader: &Reader<R>, err: impl std::fmt::Display) -> WmsError {
    WmsError::MalformedDocument(format!(
        "XML parsing error at position {}: {}",
        reader.buffer_position(),
        err
    ))
}
