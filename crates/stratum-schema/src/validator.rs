// XML tree validation engine

use crate::error::{InstancePath, ValidationError, ValidationErrorKind};
use crate::schema::{ElementDecl, Schema, ValueDecl};
use indexmap::IndexMap;
use std::collections::HashSet;
use stratum_xml::{XmlAttribute, XmlElement};

impl Schema {
    /// Validate a document element against this schema.
    ///
    /// Every violation in the tree is collected; an empty vector means the
    /// document is valid.
    pub fn validate(&self, root: &XmlElement) -> Vec<ValidationError> {
        let mut context = ValidationContext::new(self);
        context.instance_path.push(root.name.clone(), 1);

        if root.name != self.root {
            context.add_error(
                ValidationErrorKind::RootMismatch {
                    expected: self.root.clone(),
                    found: root.name.clone(),
                },
                root,
            );
        } else if let Some(decl) = self.element(&root.name) {
            validate_element(root, decl, &mut context);
        }

        context.errors
    }

    /// Convenience wrapper returning `Err` with all violations.
    pub fn check(&self, root: &XmlElement) -> Result<(), Vec<ValidationError>> {
        let errors = self.validate(root);
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Validation context tracks state during validation
struct ValidationContext<'a> {
    schema: &'a Schema,
    /// Current element path (e.g., /config/type[2])
    instance_path: InstancePath,
    /// Collected validation errors
    errors: Vec<ValidationError>,
}

impl<'a> ValidationContext<'a> {
    fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            instance_path: InstancePath::new(),
            errors: Vec::new(),
        }
    }

    fn add_error(&mut self, kind: ValidationErrorKind, element: &XmlElement) {
        self.errors.push(ValidationError::new(
            kind,
            self.instance_path.clone(),
            element.span,
        ));
    }

    /// Execute a function with a new instance path segment
    fn with_element<F>(&mut self, name: &str, position: usize, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.instance_path.push(name, position);
        f(self);
        self.instance_path.pop();
    }
}

fn validate_element(element: &XmlElement, decl: &ElementDecl, context: &mut ValidationContext<'_>) {
    validate_attributes(element, decl, context);
    validate_text(element, decl, context);

    let children = element.all_children();
    validate_occurrences(element, &children, decl, context);

    let mut positions: IndexMap<&str, usize> = IndexMap::new();
    for child in children {
        let position = positions.entry(child.name.as_str()).or_insert(0);
        *position += 1;
        let position = *position;

        let schema = context.schema;
        context.with_element(&child.name, position, |context| {
            if !decl.children.contains_key(&child.name) {
                context.add_error(
                    ValidationErrorKind::UnexpectedChild {
                        child: child.name.clone(),
                    },
                    child,
                );
                return;
            }
            if let Some(child_decl) = schema.element(&child.name) {
                validate_element(child, child_decl, context);
            }
        });
    }
}

fn validate_attributes(element: &XmlElement, decl: &ElementDecl, context: &mut ValidationContext<'_>) {
    for (name, rule) in &decl.attributes {
        match element.get_attribute(name) {
            Some(value) => validate_value(Some(name), value, rule, element, context),
            None if rule.required => context.add_error(
                ValidationErrorKind::MissingRequiredAttribute {
                    attribute: name.clone(),
                },
                element,
            ),
            None => {}
        }
    }

    if decl.open_attributes {
        return;
    }
    for attr in element.attributes.iter().filter(|a| !is_namespace_attribute(a)) {
        if !decl.attributes.contains_key(&attr.name) {
            context.add_error(
                ValidationErrorKind::UnknownAttribute {
                    attribute: attr.qualified_name(),
                },
                element,
            );
        }
    }
}

fn is_namespace_attribute(attr: &XmlAttribute) -> bool {
    match attr.prefix.as_deref() {
        Some("xmlns" | "xsi" | "xml") => true,
        None => attr.name == "xmlns",
        Some(_) => false,
    }
}

fn validate_text(element: &XmlElement, decl: &ElementDecl, context: &mut ValidationContext<'_>) {
    let text = element.text_content();
    let text = text.trim();

    match &decl.text {
        None if !text.is_empty() => context.add_error(
            ValidationErrorKind::UnexpectedText {
                text: text.to_string(),
            },
            element,
        ),
        None => {}
        Some(rule) if text.is_empty() => {
            if rule.required {
                context.add_error(ValidationErrorKind::MissingText, element);
            }
        }
        Some(rule) => validate_value(None, text, rule, element, context),
    }
}

fn validate_value(
    attribute: Option<&String>,
    value: &str,
    rule: &ValueDecl,
    element: &XmlElement,
    context: &mut ValidationContext<'_>,
) {
    let schema = context.schema;
    if let Some(allowed) = &rule.values
        && !allowed.iter().any(|v| v == value)
    {
        context.add_error(
            ValidationErrorKind::InvalidEnumValue {
                attribute: attribute.cloned(),
                value: value.to_string(),
                allowed: allowed.clone(),
            },
            element,
        );
    }

    if let Some(pattern) = &rule.pattern
        && let Some(regex) = schema.pattern(pattern)
        && !regex.is_match(value)
    {
        context.add_error(
            ValidationErrorKind::PatternMismatch {
                attribute: attribute.cloned(),
                value: value.to_string(),
                pattern: pattern.clone(),
            },
            element,
        );
    }
}

/// Check `min`/`max` counts and `unique` keys of the declared children.
fn validate_occurrences(
    element: &XmlElement,
    children: &[&XmlElement],
    decl: &ElementDecl,
    context: &mut ValidationContext<'_>,
) {
    for (name, rule) in &decl.children {
        let matching: Vec<&XmlElement> = children
            .iter()
            .copied()
            .filter(|c| &c.name == name)
            .collect();
        let count = matching.len();

        if count < rule.min {
            context.add_error(
                ValidationErrorKind::TooFewChildren {
                    child: name.clone(),
                    count,
                    min: rule.min,
                },
                element,
            );
        }
        if let Some(max) = rule.max
            && count > max
        {
            context.add_error(
                ValidationErrorKind::TooManyChildren {
                    child: name.clone(),
                    count,
                    max,
                },
                element,
            );
        }

        if let Some(key) = &rule.unique {
            let mut seen = HashSet::new();
            for child in &matching {
                if let Some(value) = child.get_attribute(key)
                    && !seen.insert(value)
                {
                    context.add_error(
                        ValidationErrorKind::DuplicateKey {
                            child: name.clone(),
                            attribute: key.clone(),
                            value: value.to_string(),
                        },
                        child,
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_xml::parse;

    const DI_SCHEMA: &str = r#"
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
    children:
      argument: {}
  argument:
    attributes:
      name: { required: true }
    text: { pattern: "^[0-9]+$" }
  preference:
    open_attributes: true
"#;

    fn schema() -> Schema {
        Schema::from_yaml_str(DI_SCHEMA).unwrap()
    }

    fn messages(xml: &str) -> Vec<String> {
        let doc = parse(xml).unwrap();
        schema().validate(&doc.root).iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_valid_document() {
        let errors = messages(
            r#"<config xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <type name="A" shared="true"><argument name="x">42</argument></type>
  <type name="B"/>
  <preference for="A" type="B"/>
</config>"#,
        );
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_root_mismatch_stops_validation() {
        let errors = messages("<settings><bogus/></settings>");
        assert_eq!(errors, vec!["/settings: Expected root element 'config', got 'settings'"]);
    }

    #[test]
    fn test_collects_all_violations() {
        let errors = messages(
            r#"<config>
  <type shared="maybe"><argument name="x">abc</argument></type>
  <unknown/>
</config>"#,
        );
        assert_eq!(
            errors,
            vec![
                "/config/type: Missing required attribute 'name'",
                "/config/type: Attribute 'shared' must be one of: true, false, got 'maybe'",
                "/config/type/argument: Text 'abc' does not match pattern '^[0-9]+$'",
                "/config/unknown: Element 'unknown' is not allowed here",
            ]
        );
    }

    #[test]
    fn test_occurrence_and_unique_rules() {
        let errors = messages(
            r#"<config>
  <type name="A"/>
  <type name="A"/>
  <preference/>
  <preference/>
</config>"#,
        );
        assert_eq!(
            errors,
            vec![
                "/config: Duplicate 'type' element with name=\"A\"",
                "/config: Expected at most 1 'preference' element(s), found 2",
            ]
        );
    }

    #[test]
    fn test_text_and_attribute_closure() {
        let errors = messages(r#"<config>stray<type name="A" extra="1"/></config>"#);
        assert_eq!(
            errors,
            vec![
                "/config: Text content is not allowed here, got 'stray'",
                "/config/type: Unknown attribute 'extra'",
            ]
        );
    }

    #[test]
    fn test_sibling_positions_in_paths() {
        let errors = messages(r#"<config><type name="A"/><type/></config>"#);
        assert_eq!(errors, vec!["/config/type[2]: Missing required attribute 'name'"]);
    }

    #[test]
    fn test_check_returns_errors() {
        let doc = parse("<config><type/></config>").unwrap();
        let errors = schema().check(&doc.root).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error_code(), "S-1-6");
        assert!(schema().check(&parse("<config/>").unwrap().root).is_ok());
    }
}
