//! XML to tree, by structural inference.
//!
//! XML has no native arrays or objects, so each element's shape is inferred
//! from its children:
//!
//! - no child elements and no attributes: an empty object
//! - every child element name and attribute name occurs once: an object, child
//!   elements first, then attributes
//! - a single element name repeated: an array of those elements
//! - anything else: [`FormatError::UnsupportedXmlShape`]
//!
//! An element whose only content is text becomes a string value. Attributes
//! named `xmlns` or `xmlns:*`, and attributes sharing a name with a child
//! element, are left out. Comments, processing instructions and text mixed
//! in with child elements are ignored.

use crate::error::FormatError;
use crate::tree::{NodeId, Tree};
use crate::value::Scalar;
use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Parse XML text into a tree.
pub fn from_xml(text: &str) -> Result<Tree, FormatError> {
    let root = parse_document(text)?;
    let mut tree = Tree::new();
    let node = match root.text_only() {
        Some(text) => tree.add_value(text),
        None => adapt(&mut tree, &root)?,
    };
    tree.adopt_root(node);
    Ok(tree)
}

#[derive(Debug)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Child>,
}

#[derive(Debug)]
enum Child {
    Element(Element),
    Text(String),
}

impl Element {
    /// The text of an element whose whole content is one run of text.
    fn text_only(&self) -> Option<&str> {
        match self.children.as_slice() {
            [Child::Text(text)] => Some(text),
            _ => None,
        }
    }

    fn elements(&self) -> impl Iterator<Item = &Element> + '_ {
        self.children.iter().filter_map(|child| match child {
            Child::Element(e) => Some(e),
            Child::Text(_) => None,
        })
    }

    /// Attributes that become properties: no namespace declarations, and no
    /// names already taken by a child element.
    fn data_attributes(&self) -> impl Iterator<Item = &(String, String)> + '_ {
        self.attributes.iter().filter(move |(name, _)| {
            !is_namespace_declaration(name) && !self.elements().any(|e| &e.name == name)
        })
    }

    fn push_text(&mut self, text: String) {
        if let Some(Child::Text(last)) = self.children.last_mut() {
            last.push_str(&text);
        } else {
            self.children.push(Child::Text(text));
        }
    }
}

fn is_namespace_declaration(name: &str) -> bool {
    name == "xmlns" || name.starts_with("xmlns:")
}

fn utf8(bytes: &[u8]) -> Result<String, FormatError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| FormatError::XmlText(e.to_string()))
}

fn open(start: &BytesStart<'_>) -> Result<Element, FormatError> {
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| FormatError::XmlAttribute(e.to_string()))?;
        let name = utf8(attr.key.as_ref())?;
        let value = attr
            .unescape_value()
            .map_err(|e| FormatError::XmlAttribute(format!("{name}: {e}")))?
            .into_owned();
        attributes.push((name, value));
    }
    Ok(Element {
        name: utf8(start.name().as_ref())?,
        attributes,
        children: Vec::new(),
    })
}

/// Hand a finished element to its parent, or make it the document root.
fn close(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<(), FormatError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Child::Element(element));
        return Ok(());
    }
    if let Some(first) = root {
        return Err(FormatError::XmlStructure(format!(
            "second root element <{}> after <{}>",
            element.name, first.name
        )));
    }
    *root = Some(element);
    Ok(())
}

fn parse_document(text: &str) -> Result<Element, FormatError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => stack.push(open(e)?),
            Ok(Event::Empty(ref e)) => {
                let element = open(e)?;
                close(&mut stack, &mut root, element)?;
            }
            Ok(Event::End(ref e)) => {
                let element = stack.pop().ok_or_else(|| {
                    FormatError::XmlStructure(format!(
                        "closing tag </{}> without an open element",
                        String::from_utf8_lossy(e.name().as_ref())
                    ))
                })?;
                close(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| FormatError::XmlText(err.to_string()))?
                    .into_owned();
                match stack.last_mut() {
                    Some(parent) => parent.push_text(text),
                    None if text.trim().is_empty() => {}
                    None => {
                        return Err(FormatError::XmlStructure(
                            "text outside the root element".to_string(),
                        ))
                    }
                }
            }
            Ok(Event::CData(e)) => {
                let text = utf8(&e.into_inner())?;
                if let Some(parent) = stack.last_mut() {
                    parent.push_text(text);
                }
            }
            Ok(Event::Eof) => break,
            Err(source) => {
                return Err(FormatError::Xml {
                    position: reader.error_position(),
                    source,
                })
            }
            _ => {}
        }
        buf.clear();
    }

    if let Some(unclosed) = stack.last() {
        return Err(FormatError::XmlStructure(format!("element <{}> is never closed", unclosed.name)));
    }
    root.ok_or_else(|| FormatError::XmlStructure("document has no root element".to_string()))
}

/// Child element names and data attribute names with their occurrence counts.
fn tally(element: &Element) -> IndexMap<&str, usize> {
    let mut counts = IndexMap::new();
    for child in element.elements() {
        *counts.entry(child.name.as_str()).or_insert(0) += 1;
    }
    for (name, _) in element.data_attributes() {
        *counts.entry(name.as_str()).or_insert(0) += 1;
    }
    counts
}

fn adapt(tree: &mut Tree, element: &Element) -> Result<NodeId, FormatError> {
    let counts = tally(element);
    if counts.is_empty() {
        Ok(tree.add_object())
    } else if counts.values().all(|&count| count == 1) {
        adapt_object(tree, element)
    } else if counts.len() == 1 {
        adapt_array(tree, element)
    } else {
        Err(FormatError::UnsupportedXmlShape {
            element: element.name.clone(),
            names: counts.keys().map(|name| name.to_string()).collect(),
        })
    }
}

fn adapt_child(tree: &mut Tree, element: &Element) -> Result<NodeId, FormatError> {
    match element.text_only() {
        Some(text) => Ok(tree.add_value(text)),
        None => adapt(tree, element),
    }
}

fn adapt_object(tree: &mut Tree, element: &Element) -> Result<NodeId, FormatError> {
    let object = tree.add_object();
    for child in element.elements() {
        let value = adapt_child(tree, child)?;
        tree.attach_property(object, child.name.clone(), value);
    }
    for (name, text) in element.data_attributes() {
        let value = tree.add_value(Scalar::String(text.clone()));
        tree.attach_property(object, name.clone(), value);
    }
    Ok(object)
}

fn adapt_array(tree: &mut Tree, element: &Element) -> Result<NodeId, FormatError> {
    let array = tree.add_array();
    for child in element.elements() {
        let item = adapt_child(tree, child)?;
        tree.attach_item(array, item);
    }
    Ok(array)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacent_text_and_cdata_join() {
        let root = parse_document("<a>x &amp; <![CDATA[<y>]]></a>").unwrap();
        assert_eq!(root.text_only(), Some("x &<y>"));
    }

    #[test]
    fn namespace_and_colliding_attributes_are_not_data() {
        let root = parse_document(r#"<a xmlns="urn:x" xmlns:p="urn:p" b="attr" c="1"><b>el</b></a>"#).unwrap();
        let names: Vec<&str> = root.data_attributes().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["c"]);
    }
}
