//! Minimal XML element tree for the document metadata files.
//!
//! `Document.xml` and `GuiDocument.xml` are small and are queried by tag
//! name at arbitrary depth, so they are read into a tree once with
//! `quick-xml` and then walked.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// Errors raised while building an element tree.
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("XML syntax error at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    #[error("invalid attribute in <{element}>: {message}")]
    Attribute { element: String, message: String },

    #[error("document has no root element")]
    NoRoot,

    #[error("unexpected end of document inside <{0}>")]
    Unclosed(String),
}

pub type XmlResult<T> = Result<T, XmlError>;

/// One element with its attributes and child elements. Text content is
/// dropped; the metadata files keep all values in attributes.
#[derive(Clone, Debug, Default)]
pub struct XmlElement {
    pub name: String,
    attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// Attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Direct children with the given tag.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.name == tag)
    }

    /// All descendants (not including `self`) with the given tag, in
    /// document order.
    pub fn descendants<'a>(&'a self, tag: &str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        self.collect_descendants(tag, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, tag: &str, found: &mut Vec<&'a XmlElement>) {
        for child in &self.children {
            if child.name == tag {
                found.push(child);
            }
            child.collect_descendants(tag, found);
        }
    }

    /// First descendant with the given tag, in document order.
    pub fn first_descendant(&self, tag: &str) -> Option<&XmlElement> {
        for child in &self.children {
            if child.name == tag {
                return Some(child);
            }
            if let Some(found) = child.first_descendant(tag) {
                return Some(found);
            }
        }
        None
    }

    /// Attribute of the first descendant with the given tag.
    pub fn first_descendant_attr(&self, tag: &str, attr: &str) -> Option<&str> {
        self.first_descendant(tag).and_then(|e| e.attr(attr))
    }
}

/// Parse a UTF-8 XML document and return its root element.
pub fn parse_document(bytes: &[u8]) -> XmlResult<XmlElement> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => stack.push(element_from_start(e)?),
            Ok(Event::Empty(ref e)) => {
                let element = element_from_start(e)?;
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::End(_)) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(XmlError::Syntax {
                    position: reader.buffer_position() as u64,
                    message: e.to_string(),
                })
            }
        }
        buf.clear();
    }

    if let Some(open) = stack.pop() {
        return Err(XmlError::Unclosed(open.name));
    }
    root.ok_or(XmlError::NoRoot)
}

/// Attach a finished element to its parent, or make it the root.
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

fn element_from_start(e: &BytesStart) -> XmlResult<XmlElement> {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
    let mut attributes = Vec::new();

    for attr in e.attributes() {
        let attr = attr.map_err(|err| XmlError::Attribute {
            element: name.clone(),
            message: err.to_string(),
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|err| XmlError::Attribute {
                element: name.clone(),
                message: err.to_string(),
            })?
            .to_string();
        attributes.push((key, value));
    }

    Ok(XmlElement {
        name,
        attributes,
        children: Vec::new(),
    })
}
