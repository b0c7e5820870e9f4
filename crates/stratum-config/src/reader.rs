//! Loading the configuration of one scope.

use crate::converter::Converter;
use crate::dom::{DocumentFactory, MergeDocument, StandardDocumentFactory};
use crate::error::ConfigError;
use crate::id_attributes::IdAttributes;
use crate::resolver::{FileResolver, FileSet};
use crate::schema::{SchemaLocator, SchemaRef, ValidationState};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Scope used when a read does not name one.
pub const DEFAULT_SCOPE: &str = "global";

/// Reads, merges, validates and converts the files of a scope.
///
/// A reader holds only its collaborators; every [`read`](Self::read) builds
/// a fresh merged document and drops it after conversion.
///
/// ```rust
/// use stratum_config::{ConfigReader, JsonConverter, MemoryResolver, StaticSchemaLocator};
///
/// let resolver = MemoryResolver::new()
///     .with_file("global", "app/di.xml", r#"<config><type name="A" shared="true"/></config>"#)
///     .with_file("global", "module/di.xml", r#"<config><type name="A" shared="false"/></config>"#);
///
/// let reader = ConfigReader::builder(resolver, JsonConverter::new(), &StaticSchemaLocator::none(), &false, "di.xml")
///     .id_attributes([("/config/type", "name")].into_iter().collect())
///     .build()
///     .unwrap();
///
/// let config = reader.read(None).unwrap();
/// assert_eq!(config["type"]["@shared"], "false");
/// ```
#[derive(Debug)]
pub struct ConfigReader<R, C, F = StandardDocumentFactory> {
    resolver: R,
    converter: C,
    factory: F,
    file_name: String,
    default_scope: String,
    id_attributes: Arc<IdAttributes>,
    schema: Option<SchemaRef>,
    per_file_schema: Option<SchemaRef>,
    validated: bool,
}

/// Builder for [`ConfigReader`].
#[derive(Debug)]
pub struct ConfigReaderBuilder<R, C, F = StandardDocumentFactory> {
    resolver: R,
    converter: C,
    factory: F,
    file_name: String,
    default_scope: String,
    id_attributes: IdAttributes,
    schema: Option<SchemaRef>,
    per_file_schema: Option<SchemaRef>,
    validated: bool,
}

impl<R: FileResolver, C: Converter> ConfigReader<R, C> {
    /// Start building a reader.
    ///
    /// The schemas and the validation switch are captured here, once.
    pub fn builder(
        resolver: R,
        converter: C,
        schema_locator: &dyn SchemaLocator,
        validation_state: &dyn ValidationState,
        file_name: impl Into<String>,
    ) -> ConfigReaderBuilder<R, C> {
        ConfigReaderBuilder {
            resolver,
            converter,
            factory: StandardDocumentFactory,
            file_name: file_name.into(),
            default_scope: DEFAULT_SCOPE.to_string(),
            id_attributes: IdAttributes::default(),
            schema: schema_locator.schema(),
            per_file_schema: schema_locator.per_file_schema(),
            validated: validation_state.is_validated(),
        }
    }
}

impl<R, C, F> ConfigReaderBuilder<R, C, F>
where
    R: FileResolver,
    C: Converter,
    F: DocumentFactory,
{
    pub fn id_attributes(mut self, id_attributes: IdAttributes) -> Self {
        self.id_attributes = id_attributes;
        self
    }

    /// Scope read when none is given. An empty name keeps the current one.
    pub fn default_scope(mut self, scope: impl Into<String>) -> Self {
        let scope = scope.into();
        if !scope.is_empty() {
            self.default_scope = scope;
        }
        self
    }

    /// Replace the merger used to build documents.
    pub fn document_factory<G: DocumentFactory>(self, factory: G) -> ConfigReaderBuilder<R, C, G> {
        ConfigReaderBuilder {
            resolver: self.resolver,
            converter: self.converter,
            factory,
            file_name: self.file_name,
            default_scope: self.default_scope,
            id_attributes: self.id_attributes,
            schema: self.schema,
            per_file_schema: self.per_file_schema,
            validated: self.validated,
        }
    }

    pub fn build(self) -> Result<ConfigReader<R, C, F>, ConfigError> {
        if self.validated && self.schema.is_none() {
            return Err(ConfigError::MissingSchema);
        }

        let per_file_schema = if self.validated {
            self.per_file_schema
        } else {
            if self.per_file_schema.is_some() {
                debug!("Validation is disabled, ignoring the per-file schema");
            }
            None
        };

        Ok(ConfigReader {
            resolver: self.resolver,
            converter: self.converter,
            factory: self.factory,
            file_name: self.file_name,
            default_scope: self.default_scope,
            id_attributes: Arc::new(self.id_attributes),
            schema: self.schema,
            per_file_schema,
            validated: self.validated,
        })
    }
}

impl<R, C, F> ConfigReader<R, C, F>
where
    R: FileResolver,
    C: Converter,
    F: DocumentFactory,
{
    /// Load the configuration of `scope`, or of the default scope.
    ///
    /// A scope without files yields the converter's empty output. The first
    /// file that fails to parse, validate or merge aborts the read with
    /// [`ConfigError::InvalidFile`].
    pub fn read(&self, scope: Option<&str>) -> Result<C::Output, ConfigError> {
        let scope = match scope {
            Some(scope) if !scope.is_empty() => scope,
            _ => self.default_scope.as_str(),
        };

        let files = self.resolver.get(&self.file_name, scope)?;
        let Some(document) = self.merge_files(&files)? else {
            info!(scope, file_name = %self.file_name, "No configuration files found");
            return Ok(C::Output::default());
        };

        if self.validated
            && let Some(schema) = &self.schema
        {
            let violations = document.validate(schema.as_ref());
            if !violations.is_empty() {
                warn!(scope, violations = violations.len(), "Merged configuration is invalid");
                return Err(ConfigError::InvalidDocument { violations });
            }
        }

        let output = self.converter.convert(document.root())?;
        info!(scope, files = files.len(), "Loaded configuration");
        Ok(output)
    }

    fn merge_files(&self, files: &FileSet) -> Result<Option<F::Document>, ConfigError> {
        let mut document: Option<F::Document> = None;

        for (file, content) in files {
            debug!(file = %file, "Merging configuration file");
            let merged = if let Some(existing) = document.as_mut() {
                existing.merge(content)
            } else {
                self.factory
                    .create(
                        content,
                        Arc::clone(&self.id_attributes),
                        self.per_file_schema.clone(),
                    )
                    .map(|created| document = Some(created))
            };

            merged.map_err(|source| {
                warn!(file = %file, error = %source, "Rejected configuration file");
                ConfigError::InvalidFile {
                    file: file.clone(),
                    source,
                }
            })?;
        }

        Ok(document)
    }

    /// Use another file name pattern for later reads.
    pub fn set_file_name(&mut self, file_name: impl Into<String>) {
        self.file_name = file_name.into();
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn default_scope(&self) -> &str {
        &self.default_scope
    }

    pub fn is_validated(&self) -> bool {
        self.validated
    }

    pub fn id_attributes(&self) -> &IdAttributes {
        &self.id_attributes
    }
}
