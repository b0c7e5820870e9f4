//! Turning a merged document into plain data.

use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use stratum_xml::XmlElement;
use thiserror::Error;

/// Converts a merged document into the structure handed to callers.
pub trait Converter {
    /// Converted configuration. `Default` is returned for an empty scope.
    type Output: Default;

    fn convert(&self, root: &XmlElement) -> Result<Self::Output, ConvertError>;
}

impl<T: Converter + ?Sized> Converter for &T {
    type Output = T::Output;

    fn convert(&self, root: &XmlElement) -> Result<Self::Output, ConvertError> {
        (**self).convert(root)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("Element {path} is nested deeper than {max_depth} levels")]
    NestingTooDeep { max_depth: usize, path: String },

    #[error("Failed to serialize merged document: {0}")]
    Write(#[from] stratum_xml::Error),
}

/// Default nesting limit of [`JsonConverter`].
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Converts the document element's content into a JSON object.
///
/// - attributes become `"@name"` keys
/// - child elements are keyed by local name; repeated names, and names
///   listed with [`JsonConverter::always_array`], become arrays
/// - an element with nothing but text becomes a string, otherwise its text
///   is stored under `"#text"`
/// - an empty element without attributes becomes `null`
///
/// ```rust
/// use stratum_config::{Converter, JsonConverter};
///
/// let doc = stratum_xml::parse(r#"<config><type name="A"/><cache>file</cache></config>"#).unwrap();
/// let json = JsonConverter::new().always_array(["type"]).convert(&doc.root).unwrap();
/// assert_eq!(
///     serde_json::Value::Object(json).to_string(),
///     r#"{"type":[{"@name":"A"}],"cache":"file"}"#
/// );
/// ```
#[derive(Debug, Clone)]
pub struct JsonConverter {
    always_array: HashSet<String>,
    max_depth: usize,
}

impl Default for JsonConverter {
    fn default() -> Self {
        Self {
            always_array: HashSet::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl JsonConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Element names that always convert to arrays, even when they occur
    /// once.
    pub fn always_array<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.always_array.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn object(&self, element: &XmlElement, path: &str, depth: usize) -> Result<Map<String, Value>, ConvertError> {
        if depth > self.max_depth {
            return Err(ConvertError::NestingTooDeep {
                max_depth: self.max_depth,
                path: path.to_string(),
            });
        }

        let mut object = Map::new();
        for attr in &element.attributes {
            object.insert(format!("@{}", attr.qualified_name()), Value::String(attr.value.clone()));
        }

        let children = element.all_children();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for child in &children {
            *counts.entry(child.name.as_str()).or_insert(0) += 1;
        }

        for child in children {
            let child_path = format!("{}/{}", path, child.name);
            let value = self.value(child, &child_path, depth + 1)?;
            let repeated = counts.get(child.name.as_str()).copied().unwrap_or(0) > 1;

            if repeated || self.always_array.contains(&child.name) {
                match object
                    .entry(child.name.clone())
                    .or_insert_with(|| Value::Array(Vec::new()))
                {
                    Value::Array(items) => items.push(value),
                    other => *other = Value::Array(vec![value]),
                }
            } else {
                object.insert(child.name.clone(), value);
            }
        }

        let text = element.text_content();
        let text = text.trim();
        if !text.is_empty() {
            object.insert("#text".to_string(), Value::String(text.to_string()));
        }

        Ok(object)
    }

    fn value(&self, element: &XmlElement, path: &str, depth: usize) -> Result<Value, ConvertError> {
        if element.attributes.is_empty() {
            if element.is_empty() {
                return Ok(Value::Null);
            }
            if let Some(text) = element.text() {
                return Ok(Value::String(text.to_string()));
            }
        }
        Ok(Value::Object(self.object(element, path, depth)?))
    }
}

impl Converter for JsonConverter {
    type Output = Map<String, Value>;

    fn convert(&self, root: &XmlElement) -> Result<Self::Output, ConvertError> {
        self.object(root, &format!("/{}", root.name), 0)
    }
}

/// Renders the merged document back to indented XML text.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlConverter;

impl Converter for XmlConverter {
    type Output = String;

    fn convert(&self, root: &XmlElement) -> Result<String, ConvertError> {
        Ok(root.to_xml_string()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use stratum_xml::parse;

    fn convert(converter: &JsonConverter, xml: &str) -> Value {
        Value::Object(converter.convert(&parse(xml).unwrap().root).unwrap())
    }

    #[test]
    fn test_di_document() {
        let value = convert(
            &JsonConverter::new(),
            r#"<config>
  <type name="A" shared="false">
    <argument name="x">1</argument>
    <argument name="y"/>
  </type>
  <preference for="I" type="A"/>
  <cache/>
</config>"#,
        );

        assert_eq!(
            value,
            json!({
                "type": {
                    "@name": "A",
                    "@shared": "false",
                    "argument": [
                        { "@name": "x", "#text": "1" },
                        { "@name": "y" }
                    ]
                },
                "preference": { "@for": "I", "@type": "A" },
                "cache": null
            })
        );
    }

    #[test]
    fn test_always_array() {
        let converter = JsonConverter::new().always_array(["type"]);
        let value = convert(&converter, r#"<config><type name="A"/><route>x</route></config>"#);
        assert_eq!(value, json!({ "type": [{ "@name": "A" }], "route": "x" }));
    }

    #[test]
    fn test_root_content_is_the_result() {
        let value = convert(&JsonConverter::new(), r#"<config version="2">text</config>"#);
        assert_eq!(value, json!({ "@version": "2", "#text": "text" }));

        let value = convert(&JsonConverter::new(), "<config/>");
        assert_eq!(value, json!({}));
    }

    #[test]
    fn test_key_order_follows_document() {
        let converter = JsonConverter::new();
        let map = converter
            .convert(&parse("<config><z/><a/><m/></config>").unwrap().root)
            .unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_xml_converter() {
        let root = parse(r#"<config><type name="A">x</type></config>"#).unwrap().root;
        assert_eq!(
            XmlConverter.convert(&root).unwrap(),
            "<config>\n  <type name=\"A\">x</type>\n</config>"
        );
    }

    #[test]
    fn test_nesting_limit() {
        let converter = JsonConverter::new().max_depth(2);
        let err = converter
            .convert(&parse("<a><b><c><d x=\"1\"/></c></b></a>").unwrap().root)
            .unwrap_err();
        assert_eq!(
            err,
            ConvertError::NestingTooDeep {
                max_depth: 2,
                path: "/a/b/c/d".to_string()
            }
        );
    }
}
