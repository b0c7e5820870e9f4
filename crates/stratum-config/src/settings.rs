//! Reader settings file.
//!
//! ```toml
//! file_name = "di.xml"
//! default_scope = "global"
//! roots = ["app/etc", "modules/catalog/etc"]
//! validate = true
//! schema = "schema/di.yaml"
//! per_file_schema = "schema/di.file.yaml"
//! log_directory = "var/log"
//! always_array = ["type"]
//!
//! [id_attributes]
//! "/config/type" = "name"
//! ```
//!
//! Relative paths are resolved against the directory holding the settings
//! file.

use crate::converter::{Converter, JsonConverter};
use crate::environment::EnvironmentConfig;
use crate::error::ConfigError;
use crate::id_attributes::IdAttributes;
use crate::logger::{LogError, Logger};
use crate::reader::ConfigReader;
use crate::resolver::DirectoryResolver;
use crate::schema::{FileSchemaLocator, VALIDATE_PARAM};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use stratum_schema::SchemaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to load schema: {0}")]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Log(#[from] LogError),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReaderSettings {
    /// Glob matched inside each scope directory
    pub file_name: String,
    #[serde(default)]
    pub default_scope: Option<String>,
    #[serde(default)]
    pub roots: Vec<PathBuf>,
    /// Unset means: ask the environment
    #[serde(default)]
    pub validate: Option<bool>,
    #[serde(default)]
    pub schema: Option<PathBuf>,
    #[serde(default)]
    pub per_file_schema: Option<PathBuf>,
    #[serde(default)]
    pub log_directory: Option<PathBuf>,
    #[serde(default)]
    pub always_array: Vec<String>,
    #[serde(default)]
    pub id_attributes: IndexMap<String, String>,
}

impl ReaderSettings {
    /// Parse settings, resolving relative paths against `base_dir`.
    pub fn from_toml_str(content: &str, base_dir: &Path) -> Result<Self, SettingsError> {
        let mut settings: ReaderSettings = toml::from_str(content)?;

        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base_dir.join(&*path);
            }
        };
        settings.roots.iter_mut().for_each(resolve);
        settings.schema.iter_mut().for_each(resolve);
        settings.per_file_schema.iter_mut().for_each(resolve);
        settings.log_directory.iter_mut().for_each(resolve);

        Ok(settings)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_toml_str(&content, base_dir)
    }

    /// The `validate` key, else the environment switch, else off.
    pub fn is_validated(&self, environment: &dyn EnvironmentConfig) -> bool {
        self.validate
            .or_else(|| environment.flag(VALIDATE_PARAM))
            .unwrap_or(false)
    }

    pub fn resolver(&self) -> DirectoryResolver {
        DirectoryResolver::new(self.roots.iter())
    }

    pub fn schema_locator(&self) -> Result<FileSchemaLocator, SettingsError> {
        Ok(FileSchemaLocator::new(
            self.schema.as_deref(),
            self.per_file_schema.as_deref(),
        )?)
    }

    pub fn converter(&self) -> JsonConverter {
        JsonConverter::new().always_array(self.always_array.iter().cloned())
    }

    pub fn id_attributes(&self) -> IdAttributes {
        self.id_attributes.iter().map(|(path, attr)| (path, attr.clone())).collect()
    }

    pub fn logger(&self, environment: &dyn EnvironmentConfig) -> Result<Logger, LogError> {
        Logger::new(self.log_directory.as_deref(), environment)
    }

    /// Assemble a reader producing JSON from these settings.
    pub fn reader(
        &self,
        environment: &dyn EnvironmentConfig,
    ) -> Result<ConfigReader<DirectoryResolver, JsonConverter>, SettingsError> {
        self.reader_with(environment, self.converter())
    }

    /// Assemble a reader with a caller-supplied converter.
    pub fn reader_with<C: Converter>(
        &self,
        environment: &dyn EnvironmentConfig,
        converter: C,
    ) -> Result<ConfigReader<DirectoryResolver, C>, SettingsError> {
        let validated = self.is_validated(environment);
        let locator = self.schema_locator()?;

        let mut builder = ConfigReader::builder(
            self.resolver(),
            converter,
            &locator,
            &validated,
            self.file_name.clone(),
        )
        .id_attributes(self.id_attributes());
        if let Some(scope) = &self.default_scope {
            builder = builder.default_scope(scope.clone());
        }
        Ok(builder.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::MapEnvironment;
    use std::fs;

    const SETTINGS: &str = r#"
file_name = "di.xml"
default_scope = "frontend"
roots = ["app/etc", "/opt/modules/etc"]
schema = "schema/di.yaml"
always_array = ["type"]

[id_attributes]
"/config/type" = "name"
"/config/type/argument" = "name"
"#;

    #[test]
    fn test_parse_and_resolve_paths() {
        let settings = ReaderSettings::from_toml_str(SETTINGS, Path::new("/srv/shop")).unwrap();

        assert_eq!(settings.file_name, "di.xml");
        assert_eq!(settings.default_scope.as_deref(), Some("frontend"));
        assert_eq!(
            settings.roots,
            vec![PathBuf::from("/srv/shop/app/etc"), PathBuf::from("/opt/modules/etc")]
        );
        assert_eq!(settings.schema, Some(PathBuf::from("/srv/shop/schema/di.yaml")));
        assert_eq!(settings.per_file_schema, None);

        let ids = settings.id_attributes();
        assert_eq!(ids.get("/config/type/argument"), Some("name"));
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_validate_falls_back_to_environment() {
        let settings = ReaderSettings::from_toml_str("file_name = \"di.xml\"", Path::new(".")).unwrap();
        let on = MapEnvironment::new().with_value("validate", "true");

        assert!(settings.is_validated(&on));
        assert!(!settings.is_validated(&MapEnvironment::new()));

        let explicit =
            ReaderSettings::from_toml_str("file_name = \"di.xml\"\nvalidate = false", Path::new("."))
                .unwrap();
        assert!(!explicit.is_validated(&on));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = ReaderSettings::from_toml_str("file_name = \"x\"\nroot = []", Path::new("."))
            .unwrap_err();
        assert!(matches!(err, SettingsError::Toml(_)));
    }

    #[test]
    fn test_reader_from_file() {
        let base = tempfile::tempdir().unwrap();
        fs::create_dir_all(base.path().join("etc")).unwrap();
        fs::write(base.path().join("etc/di.xml"), r#"<config><type name="A"/></config>"#).unwrap();
        fs::write(
            base.path().join("stratum.toml"),
            "file_name = \"di.xml\"\nroots = [\"etc\"]\nalways_array = [\"type\"]\nvalidate = false\n",
        )
        .unwrap();

        let settings = ReaderSettings::from_file(base.path().join("stratum.toml")).unwrap();
        let reader = settings.reader(&MapEnvironment::new()).unwrap();
        let config = reader.read(None).unwrap();
        assert_eq!(config["type"][0]["@name"], "A");

        let xml = settings
            .reader_with(&MapEnvironment::new(), crate::converter::XmlConverter)
            .unwrap()
            .read(None)
            .unwrap();
        assert_eq!(xml, "<config>\n  <type name=\"A\"/>\n</config>");
    }

    #[test]
    fn test_reader_requires_schema_when_validating() {
        let settings =
            ReaderSettings::from_toml_str("file_name = \"di.xml\"\nvalidate = true", Path::new("."))
                .unwrap();
        let err = settings.reader(&MapEnvironment::new()).unwrap_err();
        assert!(matches!(err, SettingsError::Config(ConfigError::MissingSchema)));
    }
}
