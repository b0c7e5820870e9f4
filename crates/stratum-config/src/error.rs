//! Error types for loading and merging configuration.

use crate::converter::ConvertError;
use crate::resolver::ResolveError;
use thiserror::Error;

/// Errors raised while building a single merged document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// The file is not well-formed XML.
    #[error(transparent)]
    Parse(#[from] stratum_xml::Error),

    /// The file violates the per-file schema.
    #[error("{}", violations.join("\n"))]
    Validation { violations: Vec<String> },

    /// An incoming element matches more than one existing element.
    #[error("More than one node matching the query: {query}")]
    AmbiguousMatch { query: String },

    /// The incoming document element differs from the existing one.
    #[error("Root element <{found}> does not match the merged root <{expected}>")]
    RootMismatch { expected: String, found: String },
}

/// Errors returned by [`ConfigReader`](crate::ConfigReader).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A single file failed to parse, validate or merge.
    #[error("Invalid XML in file {file}:\n{source}")]
    InvalidFile {
        file: String,
        #[source]
        source: DomError,
    },

    /// The fully merged document violates the merged schema.
    #[error("Invalid Document \n{}", violations.join("\n"))]
    InvalidDocument { violations: Vec<String> },

    /// Validation was requested without a schema for the merged document.
    #[error("Validation is enabled but no schema for the merged document was supplied")]
    MissingSchema,

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Convert(#[from] ConvertError),
}

impl ConfigError {
    /// Identifier of the file that caused the failure, if the failure is
    /// attributable to a single file.
    pub fn file(&self) -> Option<&str> {
        match self {
            ConfigError::InvalidFile { file, .. } => Some(file),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_file_message_names_file() {
        let err = ConfigError::InvalidFile {
            file: "app/etc/di.xml".to_string(),
            source: DomError::Validation {
                violations: vec![
                    "/config/type: Missing required attribute 'name'".to_string(),
                    "/config/bogus: Element 'bogus' is not allowed here".to_string(),
                ],
            },
        };

        insta::assert_snapshot!(err.to_string(), @r"
        Invalid XML in file app/etc/di.xml:
        /config/type: Missing required attribute 'name'
        /config/bogus: Element 'bogus' is not allowed here
        ");
        assert_eq!(err.file(), Some("app/etc/di.xml"));
    }

    #[test]
    fn test_invalid_document_lists_every_violation() {
        let err = ConfigError::InvalidDocument {
            violations: vec!["first".to_string(), "second".to_string()],
        };
        assert_eq!(err.to_string(), "Invalid Document \nfirst\nsecond");
        assert_eq!(err.file(), None);
    }
}
