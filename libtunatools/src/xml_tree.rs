use std::io::Write;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use super::error::XmlTreeError;

const INDENT_SIZE: usize = 2;

/// A child of an [`Element`]: either another element or a run of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An owned XML element.
///
/// This is the in-memory form of sensor descriptors, templates and composed XMLCON
/// documents. Attribute order is preserved so that documents are written back the way
/// they were read. Comments, processing instructions and whitespace-only text are not
/// kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    /// Create an empty element with the given tag
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: vec![],
            children: vec![],
        }
    }

    /// Builder style attribute setter
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Builder style child setter
    pub fn with_child(mut self, child: Element) -> Self {
        self.push_child(child);
        self
    }

    /// Parse a document, returning its root element
    pub fn parse(text: &str) -> Result<Self, XmlTreeError> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;
        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(Self::from_start(&start)?),
                Event::Empty(start) => {
                    let element = Self::from_start(&start)?;
                    Self::attach(&mut stack, &mut root, element)?;
                }
                Event::End(end) => {
                    let element = stack.pop().ok_or_else(|| {
                        XmlTreeError::UnexpectedEndTag(
                            String::from_utf8_lossy(end.name().as_ref()).into_owned(),
                        )
                    })?;
                    Self::attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    let content = text.unescape()?;
                    match stack.last_mut() {
                        Some(parent) => parent.push_text(&content),
                        None => return Err(XmlTreeError::TextOutsideRoot),
                    }
                }
                Event::CData(data) => {
                    let content = data.into_inner();
                    match stack.last_mut() {
                        Some(parent) => parent.push_text(&String::from_utf8_lossy(&content)),
                        None => return Err(XmlTreeError::TextOutsideRoot),
                    }
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions and doctypes are dropped
                _ => (),
            }
        }

        if let Some(open) = stack.pop() {
            return Err(XmlTreeError::UnclosedElement(open.tag));
        }
        root.ok_or(XmlTreeError::NoRootElement)
    }

    /// Read and parse a document from a file
    pub fn from_file(path: &Path) -> Result<Self, XmlTreeError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    fn from_start(start: &BytesStart) -> Result<Self, XmlTreeError> {
        let mut element = Element::new(&String::from_utf8_lossy(start.name().as_ref()));
        for attribute in start.attributes() {
            let attribute = attribute?;
            let name = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute.unescape_value()?.into_owned();
            element.attributes.push((name, value));
        }
        Ok(element)
    }

    /// Hand a finished element to its parent, or make it the root
    fn attach(
        stack: &mut [Element],
        root: &mut Option<Element>,
        element: Element,
    ) -> Result<(), XmlTreeError> {
        if let Some(parent) = stack.last_mut() {
            parent.push_child(element);
            Ok(())
        } else if root.is_some() {
            Err(XmlTreeError::MultipleRootElements(element.tag))
        } else {
            *root = Some(element);
            Ok(())
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing the value in place if it already exists
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, old)) => *old = value.to_string(),
            None => self
                .attributes
                .push((name.to_string(), value.to_string())),
        }
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Iterate over the element children, skipping text
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn push_text(&mut self, text: &str) {
        self.children.push(Node::Text(text.to_string()));
    }

    /// First direct child with the given tag
    pub fn find_child(&self, tag: &str) -> Option<&Element> {
        self.child_elements().find(|child| child.tag == tag)
    }

    /// The text directly held by this element (not its descendants)
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Trimmed text of the first direct child with the given tag
    pub fn child_text(&self, tag: &str) -> Option<String> {
        self.find_child(tag)
            .map(|child| child.text().trim().to_string())
    }

    /// First element with the given tag in depth-first order, starting with self
    pub fn find_descendant(&self, tag: &str) -> Option<&Element> {
        if self.tag == tag {
            return Some(self);
        }
        self.child_elements()
            .find_map(|child| child.find_descendant(tag))
    }

    /// Mutable version of [`Element::find_descendant`]
    pub fn find_descendant_mut(&mut self, tag: &str) -> Option<&mut Element> {
        if self.tag == tag {
            return Some(self);
        }
        for child in self.children.iter_mut() {
            if let Node::Element(element) = child {
                if let Some(found) = element.find_descendant_mut(tag) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Render the element as an indented document with an XML declaration
    pub fn to_string_pretty(&self) -> Result<String, XmlTreeError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_SIZE);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        self.write_to(&mut writer)?;
        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }

    /// Write the element as a standalone document
    pub fn write_file(&self, path: &Path) -> Result<(), XmlTreeError> {
        let document = self.to_string_pretty()?;
        let mut file = std::fs::File::create(path)?;
        file.write_all(document.as_bytes())?;
        Ok(())
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), XmlTreeError> {
        let mut start = BytesStart::new(self.tag.as_str());
        for (name, value) in self.attributes.iter() {
            start.push_attribute((name.as_str(), value.as_str()));
        }

        if self.children.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        for child in self.children.iter() {
            match child {
                Node::Element(element) => element.write_to(writer)?,
                Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
            }
        }
        writer.write_event(Event::End(BytesEnd::new(self.tag.as_str())))?;
        Ok(())
    }
}
