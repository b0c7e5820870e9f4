//! Layered XML configuration loading.
//!
//! A [`ConfigReader`] asks a [`FileResolver`] for every file that makes up a
//! scope, folds them into one document with the id-aware merger in [`dom`],
//! validates the result against an optional schema and hands the merged tree
//! to a [`Converter`].
//!
//! ```rust
//! use stratum_config::{ConfigReader, JsonConverter, MemoryResolver, StaticSchemaLocator};
//!
//! let resolver = MemoryResolver::new()
//!     .with_file("global", "base/di.xml", r#"<config><cache>file</cache></config>"#)
//!     .with_file("global", "local/di.xml", r#"<config><cache>redis</cache></config>"#);
//! let reader = ConfigReader::builder(
//!     resolver,
//!     JsonConverter::new(),
//!     &StaticSchemaLocator::none(),
//!     &false,
//!     "di.xml",
//! )
//! .build()
//! .unwrap();
//!
//! assert_eq!(reader.read(None).unwrap()["cache"], "redis");
//! ```

pub mod converter;
pub mod dom;
pub mod environment;
pub mod error;
pub mod id_attributes;
pub mod logger;
pub mod reader;
pub mod resolver;
pub mod schema;
pub mod settings;

pub use converter::{ConvertError, Converter, JsonConverter, XmlConverter};
pub use dom::{ConfigDom, DocumentFactory, MergeDocument, StandardDocumentFactory};
pub use environment::{EnvironmentConfig, MapEnvironment, ProcessEnvironment};
pub use error::{ConfigError, DomError};
pub use id_attributes::IdAttributes;
pub use logger::{LOG_DIR_PARAM, LogError, Logger, WriteMode};
pub use reader::{ConfigReader, ConfigReaderBuilder, DEFAULT_SCOPE};
pub use resolver::{DirectoryResolver, FileResolver, FileSet, MemoryResolver, ResolveError};
pub use schema::{
    DocumentSchema, EnvironmentValidationState, FileSchemaLocator, SchemaLocator, SchemaRef,
    StaticSchemaLocator, VALIDATE_PARAM, ValidationState,
};
pub use settings::{ReaderSettings, SettingsError};
