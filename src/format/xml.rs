//! XML element tree built on `quick-xml` events.
//!
//! Only what the manifest patches need: element lookup by a small
//! ElementTree-style path, attribute edits, child insertion, and a
//! re-indented write-out.

use super::{decode_utf8, Format, FormatError};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// Indentation width used when writing documents back.
const INDENT: usize = 4;

pub struct XmlFormat;

#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    /// Comments, doctype and processing instructions before the root
    prolog: Vec<Node>,
    root: Element,
    epilog: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Unescaped character data
    Text(String),
    CData(String),
    /// Raw comment body
    Comment(String),
    /// Doctype, processing instructions
    Other(Event<'static>),
}

impl XmlDocument {
    pub fn new(root: Element) -> Self {
        Self {
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
        }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Overwrite an attribute in place, or append it when absent.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => *slot = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn append_child(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Direct child elements.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    /// Name without a namespace prefix.
    pub fn local_name(&self) -> &str {
        self.name
            .rsplit_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    /// First element matching an ElementTree-style path relative to `self`.
    ///
    /// Steps are separated by `/`; a step is a tag name or `*`, optionally
    /// followed by an `[@attr]` presence predicate, e.g. `*/Application[@StartPage]`.
    pub fn find(&self, path: &str) -> Option<&Element> {
        let steps = parse_path(path)?;
        let indices = locate(self, &steps)?;
        let mut current = self;
        for idx in indices {
            current = match &current.children[idx] {
                Node::Element(el) => el,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn find_mut(&mut self, path: &str) -> Option<&mut Element> {
        let steps = parse_path(path)?;
        let indices = locate(self, &steps)?;
        let mut current = self;
        for idx in indices {
            current = match &mut current.children[idx] {
                Node::Element(el) => el,
                _ => return None,
            };
        }
        Some(current)
    }

    fn from_start(start: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<Self, FormatError> {
        let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
        for attr in start.attributes() {
            let attr = attr.map_err(|e| malformed(reader, e))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(|e| malformed(reader, e))?;
            element.attributes.push((key, value.into_owned()));
        }
        Ok(element)
    }
}

#[derive(Debug)]
struct Step<'a> {
    name: &'a str,
    attribute: Option<&'a str>,
}

impl Step<'_> {
    fn matches(&self, el: &Element) -> bool {
        let name_ok = self.name == "*"
            || el.name == self.name
            || (!self.name.contains(':') && el.local_name() == self.name);
        name_ok && self.attribute.map_or(true, |attr| el.attribute(attr).is_some())
    }
}

fn parse_path(path: &str) -> Option<Vec<Step<'_>>> {
    path.split('/')
        .map(|raw| match raw.split_once("[@") {
            Some((name, rest)) => Some(Step {
                name,
                attribute: Some(rest.strip_suffix(']')?),
            }),
            None => Some(Step {
                name: raw,
                attribute: None,
            }),
        })
        .collect::<Option<Vec<_>>>()
        .filter(|steps| steps.iter().all(|s| !s.name.is_empty()))
}

/// Child-index path to the first depth-first match of `steps` below `el`.
fn locate(el: &Element, steps: &[Step<'_>]) -> Option<Vec<usize>> {
    let (step, rest) = steps.split_first()?;
    for (idx, node) in el.children.iter().enumerate() {
        let Node::Element(child) = node else {
            continue;
        };
        if !step.matches(child) {
            continue;
        }
        if rest.is_empty() {
            return Some(vec![idx]);
        }
        if let Some(mut tail) = locate(child, rest) {
            tail.insert(0, idx);
            return Some(tail);
        }
    }
    None
}

fn malformed(reader: &Reader<&[u8]>, err: impl std::fmt::Display) -> FormatError {
    FormatError::Xml {
        position: reader.buffer_position() as u64,
        message: err.to_string(),
    }
}

fn write_failed(err: impl std::fmt::Display) -> FormatError {
    FormatError::XmlWrite {
        message: err.to_string(),
    }
}

impl Format for XmlFormat {
    type Document = XmlDocument;

    const NAME: &'static str = "XML";

    fn parse(bytes: &[u8]) -> Result<XmlDocument, FormatError> {
        let text = decode_utf8(bytes)?;
        let mut reader = Reader::from_str(text);

        let mut stack: Vec<Element> = Vec::new();
        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader.read_event().map_err(|e| malformed(&reader, e))?;
            let node = match event {
                Event::Start(start) => {
                    stack.push(Element::from_start(&start, &reader)?);
                    continue;
                }
                Event::Empty(start) => Node::Element(Element::from_start(&start, &reader)?),
                Event::End(_) => match stack.pop() {
                    Some(el) => Node::Element(el),
                    None => return Err(malformed(&reader, "unexpected closing tag")),
                },
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| malformed(&reader, e))?;
                    // Indentation between elements is regenerated on write
                    if text.trim().is_empty() {
                        continue;
                    }
                    Node::Text(text.into_owned())
                }
                Event::CData(data) => {
                    Node::CData(String::from_utf8_lossy(&data.into_inner()).into_owned())
                }
                Event::Comment(comment) => {
                    Node::Comment(String::from_utf8_lossy(&comment.into_inner()).into_owned())
                }
                // A fresh declaration is always written back
                Event::Decl(_) => continue,
                Event::Eof => break,
                other => Node::Other(other.into_owned()),
            };

            if let Some(parent) = stack.last_mut() {
                parent.children.push(node);
                continue;
            }
            match node {
                Node::Element(el) if root.is_none() => root = Some(el),
                Node::Element(_) => return Err(malformed(&reader, "multiple root elements")),
                Node::Text(_) | Node::CData(_) => {
                    return Err(malformed(&reader, "text outside the root element"))
                }
                other if root.is_none() => prolog.push(other),
                other => epilog.push(other),
            }
        }

        if let Some(open) = stack.last() {
            return Err(malformed(&reader, format!("unclosed element <{}>", open.name)));
        }
        let root = root.ok_or_else(|| malformed(&reader, "document has no root element"))?;

        Ok(XmlDocument {
            prolog,
            root,
            epilog,
        })
    }

    fn serialize(document: &XmlDocument) -> Result<Vec<u8>, FormatError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(write_failed)?;
        for node in &document.prolog {
            write_node(&mut writer, node)?;
        }
        write_element(&mut writer, &document.root)?;
        for node in &document.epilog {
            write_node(&mut writer, node)?;
        }

        let mut out = writer.into_inner();
        out.push(b'\n');
        Ok(out)
    }
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> Result<(), FormatError> {
    match node {
        Node::Element(el) => return write_element(writer, el),
        Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text))),
        Node::CData(data) => writer.write_event(Event::CData(quick_xml::events::BytesCData::new(
            data.as_str(),
        ))),
        Node::Comment(body) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(body.as_str())))
        }
        Node::Other(event) => writer.write_event(event.borrow()),
    }
    .map_err(write_failed)
}

fn write_element(writer: &mut Writer<Vec<u8>>, el: &Element) -> Result<(), FormatError> {
    let mut start = BytesStart::new(el.name.as_str());
    for (key, value) in &el.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if el.children.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(write_failed);
    }

    writer.write_event(Event::Start(start)).map_err(write_failed)?;
    for child in &el.children {
        write_node(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(el.name.as_str())))
        .map_err(write_failed)
}
