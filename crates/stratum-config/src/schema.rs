//! Schema and validation-state collaborators.

use crate::environment::EnvironmentConfig;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use stratum_schema::{Schema, SchemaError};
use stratum_xml::XmlElement;

/// A ruleset an XML tree can be checked against.
pub trait DocumentSchema: fmt::Debug + Send + Sync {
    /// Return every violation found in `root`, one message each. An empty
    /// vector means the tree is valid.
    fn validate(&self, root: &XmlElement) -> Vec<String>;
}

impl DocumentSchema for Schema {
    fn validate(&self, root: &XmlElement) -> Vec<String> {
        Schema::validate(self, root)
            .iter()
            .map(ToString::to_string)
            .collect()
    }
}

/// Shared handle to a schema.
pub type SchemaRef = Arc<dyn DocumentSchema>;

/// Supplies the schemas a reader validates against.
pub trait SchemaLocator {
    /// Schema for the fully merged document.
    fn schema(&self) -> Option<SchemaRef>;

    /// Schema each individual file must satisfy before it is merged.
    fn per_file_schema(&self) -> Option<SchemaRef>;
}

/// Locator over schemas that are already built.
#[derive(Debug, Clone, Default)]
pub struct StaticSchemaLocator {
    schema: Option<SchemaRef>,
    per_file_schema: Option<SchemaRef>,
}

impl StaticSchemaLocator {
    pub fn new(schema: Option<SchemaRef>, per_file_schema: Option<SchemaRef>) -> Self {
        Self {
            schema,
            per_file_schema,
        }
    }

    /// A locator that supplies no schema at all.
    pub fn none() -> Self {
        Self::default()
    }
}

impl SchemaLocator for StaticSchemaLocator {
    fn schema(&self) -> Option<SchemaRef> {
        self.schema.clone()
    }

    fn per_file_schema(&self) -> Option<SchemaRef> {
        self.per_file_schema.clone()
    }
}

/// Locator that loads YAML schema files once, at construction.
#[derive(Debug, Clone)]
pub struct FileSchemaLocator {
    inner: StaticSchemaLocator,
}

impl FileSchemaLocator {
    pub fn new(schema: Option<&Path>, per_file_schema: Option<&Path>) -> Result<Self, SchemaError> {
        let load = |path: Option<&Path>| -> Result<Option<SchemaRef>, SchemaError> {
            match path {
                Some(path) => {
                    let schema: SchemaRef = Arc::new(Schema::from_file(path)?);
                    Ok(Some(schema))
                }
                None => Ok(None),
            }
        };

        Ok(Self {
            inner: StaticSchemaLocator::new(load(schema)?, load(per_file_schema)?),
        })
    }
}

impl SchemaLocator for FileSchemaLocator {
    fn schema(&self) -> Option<SchemaRef> {
        self.inner.schema()
    }

    fn per_file_schema(&self) -> Option<SchemaRef> {
        self.inner.per_file_schema()
    }
}

/// Tells a reader whether to validate at all.
pub trait ValidationState {
    fn is_validated(&self) -> bool;
}

impl ValidationState for bool {
    fn is_validated(&self) -> bool {
        *self
    }
}

/// Validation switched by the `validate` environment value.
#[derive(Debug, Clone)]
pub struct EnvironmentValidationState<E> {
    environment: E,
}

/// Environment key consulted by [`EnvironmentValidationState`].
pub const VALIDATE_PARAM: &str = "validate";

impl<E: EnvironmentConfig> EnvironmentValidationState<E> {
    pub fn new(environment: E) -> Self {
        Self { environment }
    }
}

impl<E: EnvironmentConfig> ValidationState for EnvironmentValidationState<E> {
    fn is_validated(&self) -> bool {
        self.environment.flag(VALIDATE_PARAM).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::MapEnvironment;

    #[test]
    fn test_schema_messages() {
        let schema = Schema::from_yaml_str(
            "root: config\nelements:\n  config:\n    attributes:\n      name: { required: true }\n",
        )
        .unwrap();
        let doc = stratum_xml::parse("<config/>").unwrap();

        assert_eq!(
            DocumentSchema::validate(&schema, &doc.root),
            vec!["/config: Missing required attribute 'name'".to_string()]
        );
    }

    #[test]
    fn test_file_schema_locator() {
        let dir = tempfile::tempdir().unwrap();
        let merged = dir.path().join("merged.yaml");
        std::fs::write(&merged, "root: config\nelements:\n  config: {}\n").unwrap();

        let locator = FileSchemaLocator::new(Some(merged.as_path()), None).unwrap();
        assert!(locator.schema().is_some());
        assert!(locator.per_file_schema().is_none());

        let missing = dir.path().join("missing.yaml");
        assert!(FileSchemaLocator::new(Some(merged.as_path()), Some(missing.as_path())).is_err());
    }

    #[test]
    fn test_environment_validation_state() {
        let on = MapEnvironment::new().with_value("validate", "yes");
        let off = MapEnvironment::new().with_value("validate", "0");

        assert!(EnvironmentValidationState::new(on).is_validated());
        assert!(!EnvironmentValidationState::new(off).is_validated());
        assert!(!EnvironmentValidationState::new(MapEnvironment::default()).is_validated());
        assert!(true.is_validated());
    }
}
