//! Schema document types and loading.
//!
//! A schema is a YAML document with a required `root` element name and a table
//! of global element declarations:
//!
//! ```yaml
//! root: config
//! elements:
//!   config:
//!     children:
//!       type: { unique: name }
//!   type:
//!     attributes:
//!       name: { required: true }
//!       shared: { values: ["true", "false"] }
//! ```
//!
//! Declarations are closed: an element may only carry the attributes and
//! children its declaration lists, and may only hold text if it declares a
//! `text` rule. Namespace declarations (`xmlns`, `xmlns:*`) and `xsi:*`
//! attributes are always accepted.

use crate::error::{SchemaError, SchemaResult};
use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// A compiled schema, ready to validate documents.
#[derive(Debug, Clone)]
pub struct Schema {
    pub(crate) root: String,
    pub(crate) elements: IndexMap<String, ElementDecl>,
    /// Compiled regexes, keyed by their source text
    pub(crate) patterns: HashMap<String, Regex>,
}

/// Declaration of one element name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ElementDecl {
    /// Free-form description, ignored by validation
    pub description: Option<String>,
    pub attributes: IndexMap<String, ValueDecl>,
    /// Accept attributes that are not listed in `attributes`
    pub open_attributes: bool,
    pub children: IndexMap<String, ChildDecl>,
    /// Rule for text content; `None` means no text is allowed
    pub text: Option<ValueDecl>,
}

/// Constraints on an attribute value or on text content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValueDecl {
    pub required: bool,
    pub values: Option<Vec<String>>,
    pub pattern: Option<String>,
}

/// How often a child may occur under its parent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChildDecl {
    pub min: usize,
    pub max: Option<usize>,
    /// Attribute whose value must be distinct across these children
    pub unique: Option<String>,
}

impl Default for ChildDecl {
    fn default() -> Self {
        Self {
            min: 0,
            max: None,
            unique: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaDocument {
    root: String,
    #[serde(default)]
    elements: IndexMap<String, ElementDecl>,
}

impl Schema {
    /// Parse and compile a schema from YAML text.
    pub fn from_yaml_str(yaml: &str) -> SchemaResult<Self> {
        let document: SchemaDocument = serde_yaml::from_str(yaml)?;
        Self::compile(document.root, document.elements)
    }

    /// Read, parse and compile a schema file.
    pub fn from_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Check cross references and compile every pattern.
    pub fn compile(root: String, elements: IndexMap<String, ElementDecl>) -> SchemaResult<Self> {
        if !elements.contains_key(&root) {
            return Err(SchemaError::UndeclaredRoot(root));
        }

        let mut patterns = HashMap::new();
        for (name, decl) in &elements {
            for (child, rule) in &decl.children {
                if !elements.contains_key(child) {
                    return Err(SchemaError::UndeclaredChild {
                        parent: name.clone(),
                        child: child.clone(),
                    });
                }
                if let Some(max) = rule.max
                    && rule.min > max
                {
                    return Err(SchemaError::InvalidOccurrence {
                        parent: name.clone(),
                        child: child.clone(),
                        min: rule.min,
                        max,
                    });
                }
            }

            let value_rules = decl
                .attributes
                .iter()
                .map(|(attr, rule)| (format!("attribute '{}' of '{}'", attr, name), rule))
                .chain(
                    decl.text
                        .iter()
                        .map(|rule| (format!("text of '{}'", name), rule)),
                );
            for (location, rule) in value_rules {
                if let Some(pattern) = &rule.pattern
                    && !patterns.contains_key(pattern)
                {
                    let regex = Regex::new(pattern).map_err(|source| SchemaError::InvalidPattern {
                        pattern: pattern.clone(),
                        location,
                        source,
                    })?;
                    patterns.insert(pattern.clone(), regex);
                }
            }
        }

        Ok(Self {
            root,
            elements,
            patterns,
        })
    }

    /// Name the document element must have.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Look up the declaration of an element name.
    pub fn element(&self, name: &str) -> Option<&ElementDecl> {
        self.elements.get(name)
    }

    pub(crate) fn pattern(&self, source: &str) -> Option<&Regex> {
        self.patterns.get(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_schema() {
        let schema = Schema::from_yaml_str(
            r#"
root: config
elements:
  config:
    children:
      type: { unique: name }
      preference: { max: 1 }
  type:
    attributes:
      name: { required: true }
      shared: { values: ["true", "false"] }
  preference:
    text: { pattern: "^[a-z]+$" }
"#,
        )
        .unwrap();

        assert_eq!(schema.root(), "config");
        let config = schema.element("config").unwrap();
        assert_eq!(config.children["type"].unique.as_deref(), Some("name"));
        assert_eq!(config.children["preference"].max, Some(1));
        assert_eq!(config.children["preference"].min, 0);
        assert!(schema.element("type").unwrap().attributes["name"].required);
        assert!(schema.pattern("^[a-z]+$").is_some());
    }

    #[test]
    fn test_undeclared_root() {
        let err = Schema::from_yaml_str("root: config\nelements: {}\n").unwrap_err();
        assert!(matches!(err, SchemaError::UndeclaredRoot(ref r) if r == "config"));
    }

    #[test]
    fn test_undeclared_child() {
        let err = Schema::from_yaml_str(
            r#"
root: config
elements:
  config:
    children:
      type: {}
"#,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Element 'config' allows child 'type', which is not declared under 'elements'"
        );
    }

    #[test]
    fn test_invalid_pattern() {
        let err = Schema::from_yaml_str(
            r#"
root: config
elements:
  config:
    attributes:
      name: { pattern: "([a-z" }
"#,
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidPattern { .. }));
    }

    #[test]
    fn test_min_greater_than_max() {
        let err = Schema::from_yaml_str(
            r#"
root: config
elements:
  config:
    children:
      item: { min: 3, max: 1 }
  item: {}
"#,
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidOccurrence { min: 3, max: 1, .. }));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = Schema::from_yaml_str(
            r#"
root: config
elements:
  config:
    childs: {}
"#,
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::Yaml(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("di.yaml");
        std::fs::write(&path, "root: config\nelements:\n  config: {}\n").unwrap();

        let schema = Schema::from_file(&path).unwrap();
        assert_eq!(schema.root(), "config");

        let missing = Schema::from_file(dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(missing, SchemaError::Io { .. }));
    }
}
