//! Core types for source-tracked XML trees.

/// A byte range in the source text an item was parsed from.
///
/// Spans are only meaningful relative to the file the item came from. After
/// merging, elements of one tree may carry spans from different files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Compute the 1-based line and column of `self.start` within `source`.
    pub fn line_col(&self, source: &str) -> (usize, usize) {
        line_col(source, self.start)
    }
}

/// 1-based line and column for a byte offset.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = &source.as_bytes()[..offset];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let col = match before.iter().rposition(|&b| b == b'\n') {
        Some(nl) => offset - nl,
        None => offset + 1,
    };
    (line, col)
}

/// A parsed XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    /// The root element of the document.
    pub root: XmlElement,

    /// Span of the entire document.
    pub span: Span,
}

/// An XML element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    /// The local name of the element (without namespace prefix).
    pub name: String,

    /// Namespace prefix, if any (e.g., "xsi" in `<xsi:type>`).
    pub prefix: Option<String>,

    /// Attributes of this element, in document order.
    pub attributes: Vec<XmlAttribute>,

    /// Child content of this element.
    pub children: XmlChildren,

    /// Span of the entire element (from `<` to the end of its end tag).
    pub span: Span,
}

/// An XML attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    /// The local name of the attribute (without namespace prefix).
    pub name: String,

    /// Namespace prefix, if any.
    pub prefix: Option<String>,

    /// The attribute value (after unescaping XML entities).
    pub value: String,

    /// Span of the `name="value"` pair.
    pub span: Span,
}

/// Children of an XML element.
///
/// Whitespace between child elements is not kept, so configuration-style
/// documents always end up as `Elements`, `Text` or `Empty`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlChildren {
    /// Element contains only child elements.
    Elements(Vec<XmlElement>),

    /// Element contains only text content.
    Text {
        /// The text content (after unescaping XML entities).
        content: String,
        span: Span,
    },

    /// Element contains text and elements interleaved.
    Mixed(Vec<XmlChild>),

    /// Element is empty.
    Empty,
}

/// A single child in mixed content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlChild {
    Element(XmlElement),
    Text { content: String, span: Span },
}

impl XmlDocument {
    pub fn new(root: XmlElement, span: Span) -> Self {
        Self { root, span }
    }
}

impl XmlElement {
    /// Create a new empty element.
    pub fn new(name: impl Into<String>, attributes: Vec<XmlAttribute>, span: Span) -> Self {
        Self {
            name: name.into(),
            prefix: None,
            attributes,
            children: XmlChildren::Empty,
            span,
        }
    }

    /// Builder-style helper that appends a child element.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.push_element(child);
        self
    }

    /// Builder-style helper that replaces the content with text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.set_text(text, Span::default());
        self
    }

    /// Builder-style helper that sets an attribute.
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value, Span::default());
        self
    }

    /// Get an attribute value by local name.
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Get the full attribute by local name.
    pub fn get_attribute_full(&self, name: &str) -> Option<&XmlAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Set an attribute, overriding the value in place when it already exists.
    pub fn set_attribute(&mut self, name: &str, value: &str, span: Span) {
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => {
                existing.value = value.to_string();
                existing.span = span;
            }
            None => self.attributes.push(XmlAttribute::new(name, value, span)),
        }
    }

    /// Check if this element has child elements.
    pub fn has_elements(&self) -> bool {
        match &self.children {
            XmlChildren::Elements(e) => !e.is_empty(),
            XmlChildren::Mixed(children) => {
                children.iter().any(|c| matches!(c, XmlChild::Element(_)))
            }
            _ => false,
        }
    }

    /// Check if this element has only text content.
    pub fn has_text(&self) -> bool {
        matches!(&self.children, XmlChildren::Text { .. })
    }

    /// Check if this element is empty.
    pub fn is_empty(&self) -> bool {
        matches!(&self.children, XmlChildren::Empty)
    }

    /// Get text content, if this element contains only text.
    pub fn text(&self) -> Option<&str> {
        match &self.children {
            XmlChildren::Text { content, .. } => Some(content),
            _ => None,
        }
    }

    /// Concatenated text of this element, including text in mixed content.
    pub fn text_content(&self) -> String {
        match &self.children {
            XmlChildren::Text { content, .. } => content.clone(),
            XmlChildren::Mixed(children) => children
                .iter()
                .filter_map(|c| match c {
                    XmlChild::Text { content, .. } => Some(content.as_str()),
                    XmlChild::Element(_) => None,
                })
                .collect(),
            _ => String::new(),
        }
    }

    /// Replace all content of this element with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>, span: Span) {
        self.children = XmlChildren::Text {
            content: text.into(),
            span,
        };
    }

    /// Append a child element, keeping any existing text.
    pub fn push_element(&mut self, element: XmlElement) {
        let children = std::mem::replace(&mut self.children, XmlChildren::Empty);
        self.children = match children {
            XmlChildren::Empty => XmlChildren::Elements(vec![element]),
            XmlChildren::Elements(mut elements) => {
                elements.push(element);
                XmlChildren::Elements(elements)
            }
            XmlChildren::Text { content, span } => XmlChildren::Mixed(vec![
                XmlChild::Text { content, span },
                XmlChild::Element(element),
            ]),
            XmlChildren::Mixed(mut children) => {
                children.push(XmlChild::Element(element));
                XmlChildren::Mixed(children)
            }
        };
    }

    /// Append a text node after the current content.
    ///
    /// Adjacent text is concatenated; text after elements yields mixed content.
    pub fn push_text(&mut self, text: impl Into<String>, span: Span) {
        let text = text.into();
        let children = std::mem::replace(&mut self.children, XmlChildren::Empty);
        self.children = match children {
            XmlChildren::Empty => XmlChildren::Text {
                content: text,
                span,
            },
            XmlChildren::Text {
                mut content,
                span: first,
            } => {
                content.push_str(&text);
                XmlChildren::Text {
                    content,
                    span: Span::new(first.start, span.end.max(first.end)),
                }
            }
            XmlChildren::Elements(elements) => {
                let mut children: Vec<XmlChild> =
                    elements.into_iter().map(XmlChild::Element).collect();
                children.push(XmlChild::Text {
                    content: text,
                    span,
                });
                XmlChildren::Mixed(children)
            }
            XmlChildren::Mixed(mut children) => {
                match children.last_mut() {
                    Some(XmlChild::Text { content, .. }) => content.push_str(&text),
                    _ => children.push(XmlChild::Text {
                        content: text,
                        span,
                    }),
                }
                XmlChildren::Mixed(children)
            }
        };
    }

    /// Get child elements by local name.
    pub fn get_children(&self, name: &str) -> Vec<&XmlElement> {
        self.all_children()
            .into_iter()
            .filter(|e| e.name == name)
            .collect()
    }

    /// Get the first child element with the given local name.
    pub fn get_child(&self, name: &str) -> Option<&XmlElement> {
        self.all_children().into_iter().find(|e| e.name == name)
    }

    /// Get all child elements (ignoring text in mixed content).
    pub fn all_children(&self) -> Vec<&XmlElement> {
        match &self.children {
            XmlChildren::Elements(elements) => elements.iter().collect(),
            XmlChildren::Mixed(children) => children
                .iter()
                .filter_map(|c| match c {
                    XmlChild::Element(e) => Some(e),
                    _ => None,
                })
                .collect(),
            _ => vec![],
        }
    }

    /// Mutable access to all child elements (ignoring text in mixed content).
    pub fn all_children_mut(&mut self) -> Vec<&mut XmlElement> {
        match &mut self.children {
            XmlChildren::Elements(elements) => elements.iter_mut().collect(),
            XmlChildren::Mixed(children) => children
                .iter_mut()
                .filter_map(|c| match c {
                    XmlChild::Element(e) => Some(e),
                    _ => None,
                })
                .collect(),
            _ => vec![],
        }
    }

    /// Consume the element and return its child elements.
    pub fn into_child_elements(self) -> Vec<XmlElement> {
        match self.children {
            XmlChildren::Elements(elements) => elements,
            XmlChildren::Mixed(children) => children
                .into_iter()
                .filter_map(|c| match c {
                    XmlChild::Element(e) => Some(e),
                    _ => None,
                })
                .collect(),
            _ => vec![],
        }
    }

    /// The qualified name as written in the source (`prefix:name`).
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.name),
            None => self.name.clone(),
        }
    }
}

impl XmlAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            prefix: None,
            value: value.into(),
            span,
        }
    }

    /// The qualified name as written in the source (`prefix:name`).
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.name),
            None => self.name.clone(),
        }
    }
}
