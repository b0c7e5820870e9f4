//! Source-tracked XML trees for Stratum configuration files.
//!
//! This crate wraps [`quick-xml`] to produce a tree of [`XmlElement`]s. Each
//! element and attribute remembers the byte [`Span`] it was parsed from, which
//! is what lets validation errors point back into a specific file.
//!
//! # Example
//!
//! ```rust
//! use stratum_xml::parse;
//!
//! let xml = parse(r#"<config>
//!   <type name="Catalog\Product" shared="false">
//!     <argument name="cache">true</argument>
//!   </type>
//! </config>"#).unwrap();
//!
//! assert_eq!(xml.root.name, "config");
//! let types = xml.root.get_children("type");
//! assert_eq!(types[0].get_attribute("shared"), Some("false"));
//! assert_eq!(types[0].get_children("argument")[0].text(), Some("true"));
//! ```
//!
//! Whitespace between elements is not part of the tree. Comments, processing
//! instructions and DOCTYPE declarations are skipped.

pub mod error;
pub mod parser;
pub mod types;
mod writer;

pub use error::{Error, Position, Result};
pub use parser::parse;
pub use types::{Span, XmlAttribute, XmlChild, XmlChildren, XmlDocument, XmlElement, line_col};
