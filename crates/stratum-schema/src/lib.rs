//! Structural schemas for Stratum XML configuration.
//!
//! Schemas are written in YAML (see [`schema`] for the format) and validate a
//! [`stratum_xml::XmlElement`] tree. Validation never stops at the first
//! problem: every violation in the document is reported, each with the path of
//! the element it was found on.
//!
//! ```rust
//! use stratum_schema::Schema;
//!
//! let schema = Schema::from_yaml_str(r#"
//! root: config
//! elements:
//!   config:
//!     children:
//!       type: { unique: name }
//!   type:
//!     attributes:
//!       name: { required: true }
//! "#).unwrap();
//!
//! let doc = stratum_xml::parse(r#"<config><type/><type name="a"/></config>"#).unwrap();
//! let errors = schema.validate(&doc.root);
//! assert_eq!(errors.len(), 1);
//! assert_eq!(errors[0].to_string(), "/config/type: Missing required attribute 'name'");
//! ```

pub mod error;
pub mod schema;
mod validator;

pub use error::{
    InstancePath, PathSegment, SchemaError, SchemaResult, ValidationError, ValidationErrorKind,
};
pub use schema::{ChildDecl, ElementDecl, Schema, ValueDecl};
