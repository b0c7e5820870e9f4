//! Serialize element trees back to XML text.

use crate::{Error, Result, XmlChild, XmlChildren, XmlElement};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use std::io::Cursor;

impl XmlElement {
    /// Render this element and its descendants as indented XML.
    ///
    /// ```rust
    /// let xml = stratum_xml::parse(r#"<config><type name="a"/></config>"#).unwrap();
    /// assert_eq!(
    ///     xml.root.to_xml_string().unwrap(),
    ///     "<config>\n  <type name=\"a\"/>\n</config>"
    /// );
    /// ```
    pub fn to_xml_string(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        write_element(&mut writer, self)?;
        String::from_utf8(writer.into_inner().into_inner()).map_err(|e| Error::Write(e.to_string()))
    }
}

fn write_element<W: std::io::Write>(writer: &mut Writer<W>, element: &XmlElement) -> Result<()> {
    let name = element.qualified_name();
    let attribute_names: Vec<String> = element
        .attributes
        .iter()
        .map(|a| a.qualified_name())
        .collect();

    let mut start = BytesStart::new(name.as_str());
    for (attr, attr_name) in element.attributes.iter().zip(&attribute_names) {
        start.push_attribute((attr_name.as_str(), attr.value.as_str()));
    }

    if element.is_empty() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    match &element.children {
        XmlChildren::Elements(children) => {
            for child in children {
                write_element(writer, child)?;
            }
        }
        XmlChildren::Text { content, .. } => {
            emit(writer, Event::Text(BytesText::new(content)))?;
        }
        XmlChildren::Mixed(children) => {
            for child in children {
                match child {
                    XmlChild::Element(e) => write_element(writer, e)?,
                    XmlChild::Text { content, .. } => {
                        emit(writer, Event::Text(BytesText::new(content)))?
                    }
                }
            }
        }
        XmlChildren::Empty => {}
    }
    emit(writer, Event::End(BytesEnd::new(name.as_str())))
}

fn emit<W: std::io::Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::Write(e.to_string()))
}

#[cfg(test)]
mod tests {
    use crate::parse;

    #[test]
    fn test_write_escapes_values() {
        let xml = parse(r#"<a note="x &amp; y">1 &lt; 2</a>"#).unwrap();
        assert_eq!(
            xml.root.to_xml_string().unwrap(),
            r#"<a note="x &amp; y">1 &lt; 2</a>"#
        );
    }

    #[test]
    fn test_written_tree_parses_back_equal_in_structure() {
        let source = r#"<config><type name="Foo" shared="false"><argument name="x">1</argument></type><preference/></config>"#;
        let xml = parse(source).unwrap();
        let reparsed = parse(&xml.root.to_xml_string().unwrap()).unwrap();

        assert_eq!(reparsed.root.get_children("type").len(), 1);
        assert_eq!(
            reparsed.root.get_children("type")[0].get_children("argument")[0].text(),
            Some("1")
        );
        assert!(reparsed.root.get_child("preference").is_some());
    }
}
