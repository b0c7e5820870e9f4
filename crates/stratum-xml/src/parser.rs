//! XML parser that builds `XmlDocument` trees.

use crate::error::Position;
use crate::types::line_col;
use crate::{Error, Result, Span, XmlAttribute, XmlChild, XmlChildren, XmlDocument, XmlElement};
use quick_xml::Reader;
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};

/// Parse XML from a string.
///
/// # Example
///
/// ```rust
/// use stratum_xml::parse;
///
/// let xml = parse(r#"<config><type name="Foo"/></config>"#).unwrap();
/// assert_eq!(xml.root.name, "config");
/// assert_eq!(xml.root.get_children("type")[0].get_attribute("name"), Some("Foo"));
/// ```
///
/// # Errors
///
/// Returns an error if the XML is malformed, has no root, or has more than one.
pub fn parse(content: &str) -> Result<XmlDocument> {
    XmlParser::new(content).parse()
}

/// Internal parser state.
struct XmlParser<'a> {
    /// The source content being parsed.
    source: &'a str,

    reader: Reader<&'a [u8]>,

    /// Stack of elements being built.
    stack: Vec<BuildNode>,
}

/// A node being constructed during parsing.
struct BuildNode {
    name: String,
    prefix: Option<String>,
    attributes: Vec<XmlAttribute>,

    /// Byte offset where this element started (the `<` character).
    start_offset: usize,

    /// Child elements and text accumulated so far.
    children: Vec<XmlChild>,
}

impl<'a> XmlParser<'a> {
    fn new(source: &'a str) -> Self {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;

        Self {
            source,
            reader,
            stack: Vec::new(),
        }
    }

    fn position(&self, offset: usize) -> Option<Position> {
        let (line, column) = line_col(self.source, offset);
        Some(Position { line, column })
    }

    fn parse(&mut self) -> Result<XmlDocument> {
        let mut root: Option<XmlElement> = None;

        loop {
            // Capture position before reading the event
            let event_start = self.reader.buffer_position() as usize;

            match self.reader.read_event() {
                Ok(Event::Start(e)) => {
                    self.handle_start(e, event_start)?;
                }
                Ok(Event::End(e)) => {
                    let element = self.handle_end(e, event_start)?;
                    self.attach(element, &mut root)?;
                }
                Ok(Event::Empty(e)) => {
                    let element = self.handle_empty(e, event_start)?;
                    self.attach(element, &mut root)?;
                }
                Ok(Event::Text(e)) => {
                    self.handle_text(e, event_start)?;
                }
                Ok(Event::CData(e)) => {
                    self.handle_cdata(e, event_start);
                }
                Ok(Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_)) => {}
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlSyntax {
                        message: e.to_string(),
                        position: self.position(self.reader.error_position() as usize),
                    });
                }
            }
        }

        if let Some(node) = self.stack.last() {
            return Err(Error::UnexpectedEof {
                expected: format!("closing tag </{}>", node.name),
                position: self.position(node.start_offset),
            });
        }

        let root = root.ok_or(Error::EmptyDocument)?;
        Ok(XmlDocument::new(root, Span::new(0, self.source.len())))
    }

    /// Hand a finished element to its parent, or make it the root.
    fn attach(&mut self, element: XmlElement, root: &mut Option<XmlElement>) -> Result<()> {
        match self.stack.last_mut() {
            Some(parent) => {
                parent.children.push(XmlChild::Element(element));
                Ok(())
            }
            None if root.is_some() => Err(Error::MultipleRoots {
                position: self.position(element.span.start),
            }),
            None => {
                *root = Some(element);
                Ok(())
            }
        }
    }

    fn handle_start(&mut self, e: BytesStart<'_>, event_start: usize) -> Result<()> {
        let (name, prefix) = split_name(e.name().as_ref());
        let attributes = self.parse_attributes(&e, event_start)?;

        self.stack.push(BuildNode {
            name,
            prefix,
            attributes,
            start_offset: event_start,
            children: Vec::new(),
        });

        Ok(())
    }

    fn handle_end(&mut self, e: BytesEnd<'_>, event_start: usize) -> Result<XmlElement> {
        let (end_name, _) = split_name(e.name().as_ref());

        let node = self.stack.pop().ok_or_else(|| Error::InvalidStructure {
            message: format!("Unexpected closing tag </{}>", end_name),
            position: self.position(event_start),
        })?;

        if node.name != end_name {
            return Err(Error::MismatchedEndTag {
                expected: node.name,
                found: end_name,
                position: self.position(event_start),
            });
        }

        let end_offset = self.reader.buffer_position() as usize;

        Ok(XmlElement {
            name: node.name,
            prefix: node.prefix,
            attributes: node.attributes,
            children: finalize_children(node.children),
            span: Span::new(node.start_offset, end_offset),
        })
    }

    fn handle_empty(&mut self, e: BytesStart<'_>, event_start: usize) -> Result<XmlElement> {
        let (name, prefix) = split_name(e.name().as_ref());
        let attributes = self.parse_attributes(&e, event_start)?;
        let end_offset = self.reader.buffer_position() as usize;

        Ok(XmlElement {
            name,
            prefix,
            attributes,
            children: XmlChildren::Empty,
            span: Span::new(event_start, end_offset),
        })
    }

    fn handle_text(&mut self, e: BytesText<'_>, event_start: usize) -> Result<()> {
        let text = e.unescape().map_err(|err| Error::XmlSyntax {
            message: format!("Invalid text content: {}", err),
            position: self.position(event_start),
        })?;

        let span = Span::new(event_start, self.reader.buffer_position() as usize);
        let content = text.into_owned();

        match self.stack.last_mut() {
            Some(node) => {
                node.children.push(XmlChild::Text { content, span });
                Ok(())
            }
            // Whitespace around the root element is fine, anything else is not
            None if content.trim().is_empty() => Ok(()),
            None => Err(Error::InvalidStructure {
                message: "Text content outside of the root element".to_string(),
                position: self.position(event_start),
            }),
        }
    }

    fn handle_cdata(&mut self, e: BytesCData<'_>, event_start: usize) {
        let content = String::from_utf8_lossy(e.as_ref()).to_string();
        let span = Span::new(event_start, self.reader.buffer_position() as usize);

        if let Some(node) = self.stack.last_mut() {
            node.children.push(XmlChild::Text { content, span });
        }
    }

    fn parse_attributes(&self, e: &BytesStart<'_>, tag_start: usize) -> Result<Vec<XmlAttribute>> {
        let mut attributes = Vec::new();
        let tag_str = String::from_utf8_lossy(e.as_ref());
        let name_len = e.name().as_ref().len();
        // The tag content starts after '<'
        let content_start = tag_start + 1;

        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|err| Error::XmlSyntax {
                message: format!("Attribute error: {}", err),
                position: self.position(tag_start),
            })?;

            let full_name = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let (name, prefix) = split_name(full_name.as_bytes());

            let value = attr.unescape_value().map_err(|err| Error::XmlSyntax {
                message: format!("Invalid attribute value: {}", err),
                position: self.position(tag_start),
            })?;

            let span = attribute_span(&tag_str, name_len, &full_name, content_start);

            attributes.push(XmlAttribute {
                name,
                prefix,
                value: value.into_owned(),
                span,
            });
        }

        Ok(attributes)
    }
}

/// Split a raw `prefix:local` name into its local part and optional prefix.
fn split_name(raw: &[u8]) -> (String, Option<String>) {
    let full_name = String::from_utf8_lossy(raw);
    match full_name.split_once(':') {
        Some((prefix, local)) => (local.to_string(), Some(prefix.to_string())),
        None => (full_name.into_owned(), None),
    }
}

/// Locate `name="value"` inside the raw tag text.
fn attribute_span(tag_str: &str, search_start: usize, attr_name: &str, content_start: usize) -> Span {
    let search_area = &tag_str[search_start.min(tag_str.len())..];
    // The name must follow whitespace and be followed by `\s*=`
    let found = search_area.match_indices(attr_name).find(|(pos, _)| {
        let preceded = search_area[..*pos]
            .chars()
            .next_back()
            .is_some_and(char::is_whitespace);
        let followed = search_area[pos + attr_name.len()..]
            .trim_start()
            .starts_with('=');
        preceded && followed
    });
    let Some((rel_pos, _)) = found else {
        return Span::new(content_start, content_start + 1);
    };

    let start = content_start + search_start + rel_pos;
    let after_name = &search_area[rel_pos + attr_name.len()..];

    // Skip `\s*=\s*` and then the quoted value
    let mut offset = after_name.len() - after_name.trim_start().len();
    let rest = &after_name[offset..];
    if let Some(rest) = rest.strip_prefix('=') {
        offset += 1;
        offset += rest.len() - rest.trim_start().len();
        let value = &after_name[offset..];
        if let Some(quote) = value.chars().next().filter(|c| *c == '"' || *c == '\'') {
            if let Some(close) = value[1..].find(quote) {
                offset += close + 2;
            }
        }
    }

    Span::new(start, start + attr_name.len() + offset)
}

/// Collapse accumulated children into the most specific `XmlChildren` shape.
///
/// Whitespace-only text is dropped as soon as the element has an element
/// child, since it is indentation rather than content.
fn finalize_children(children: Vec<XmlChild>) -> XmlChildren {
    let has_elements = children.iter().any(|c| matches!(c, XmlChild::Element(_)));

    let mut children: Vec<XmlChild> = if has_elements {
        children
            .into_iter()
            .filter(|c| match c {
                XmlChild::Text { content, .. } => !content.trim().is_empty(),
                XmlChild::Element(_) => true,
            })
            .collect()
    } else {
        children
    };

    if children.is_empty() {
        return XmlChildren::Empty;
    }

    if !has_elements {
        // Adjacent text and CDATA runs form one text node
        let start = match &children[0] {
            XmlChild::Text { span, .. } => span.start,
            XmlChild::Element(e) => e.span.start,
        };
        let mut content = String::new();
        let mut end = start;
        for child in children {
            if let XmlChild::Text { content: text, span } = child {
                content.push_str(&text);
                end = span.end;
            }
        }
        return XmlChildren::Text {
            content,
            span: Span::new(start, end),
        };
    }

    if children.iter().all(|c| matches!(c, XmlChild::Element(_))) {
        let elements = children
            .drain(..)
            .filter_map(|c| match c {
                XmlChild::Element(e) => Some(e),
                XmlChild::Text { .. } => None,
            })
            .collect();
        XmlChildren::Elements(elements)
    } else {
        XmlChildren::Mixed(children)
    }
}
