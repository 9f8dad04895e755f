//! Support for the grouped phrase XML format.
//!
//! ```xml
//! <texts>
//!   <group name="menu">
//!     <phrase name="open" text="Open"/>
//!   </group>
//! </texts>
//! ```
//!
//! The document is kept as a plain element tree; text nodes between elements
//! carry no meaning in this format and are dropped while parsing.

use quick_xml::{
    Reader, Writer,
    events::{BytesDecl, BytesEnd, BytesStart, Event},
};
use std::io::{BufRead, Write};

use crate::{error::Error, traits::Parser};

/// Root tag of an exported document.
pub const ROOT_TAG: &str = "texts";
/// Tag of intermediate path nodes.
pub const GROUP_TAG: &str = "group";
/// Tag of leaf nodes.
pub const PHRASE_TAG: &str = "phrase";
/// Attribute holding a node's path segment.
pub const NAME_ATTR: &str = "name";
/// Attribute holding a leaf's value.
pub const TEXT_ATTR: &str = "text";

/// One XML element with ordered attributes and child elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Element {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// An empty `<texts>` document root.
    pub fn root() -> Self {
        Self::new(ROOT_TAG)
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Sets an attribute, replacing an existing value with the same key.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Shortcut for the `name` attribute.
    pub fn name(&self) -> Option<&str> {
        self.attr(NAME_ATTR)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Index of the first child with the given tag and `name` attribute.
    pub fn position_of(&self, tag: &str, name: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|child| child.tag == tag && child.name() == Some(name))
    }

    fn write_into<W: Write>(&self, xml_writer: &mut Writer<W>) -> Result<(), Error> {
        let mut start = BytesStart::new(self.tag.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() {
            xml_writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        xml_writer.write_event(Event::Start(start))?;
        for child in &self.children {
            child.write_into(xml_writer)?;
        }
        xml_writer.write_event(Event::End(BytesEnd::new(self.tag.as_str())))?;
        Ok(())
    }
}

impl Parser for Element {
    /// Parses a document and returns its root element.
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => stack.push(element_from_start(e)?),
                Ok(Event::Empty(ref e)) => {
                    let element = element_from_start(e)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::End(_)) => {
                    let element = stack.pop().ok_or_else(|| {
                        Error::InvalidResource("unexpected closing tag".to_string())
                    })?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(Error::XmlParse(e)),
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(Error::InvalidResource(
                "unexpected end of document".to_string(),
            ));
        }
        root.ok_or_else(|| Error::InvalidResource("document has no root element".to_string()))
    }

    /// Writes the element as a pretty-printed document with a 2-space indent.
    fn to_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        let mut xml_writer = Writer::new_with_indent(&mut writer, b' ', 2);
        xml_writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        self.write_into(&mut xml_writer)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

fn element_from_start(e: &BytesStart) -> Result<Element, Error> {
    let mut element = Element::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), Error> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(Error::InvalidResource(
                "document has more than one root element".to_string(),
            ));
        }
    }
    Ok(())
}
