//! Error types for XML parsing.

use thiserror::Error;

/// Result type alias for stratum-xml operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A 1-based line/column position in the parsed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Errors that can occur during XML parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// XML syntax error reported by quick-xml.
    #[error("XML syntax error: {message}{}", at(position))]
    XmlSyntax {
        message: String,
        position: Option<Position>,
    },

    /// Input ended while an element was still open.
    #[error("Unexpected end of input, expected {expected}{}", at(position))]
    UnexpectedEof {
        expected: String,
        position: Option<Position>,
    },

    /// End tag does not close the innermost open element.
    #[error("Mismatched end tag: expected </{expected}>, found </{found}>{}", at(position))]
    MismatchedEndTag {
        expected: String,
        found: String,
        position: Option<Position>,
    },

    /// Invalid XML structure.
    #[error("Invalid XML structure: {message}{}", at(position))]
    InvalidStructure {
        message: String,
        position: Option<Position>,
    },

    /// Document has no root element.
    #[error("Empty XML document: no root element found")]
    EmptyDocument,

    /// Document has more than one root element.
    #[error("Invalid XML: multiple root elements{}", at(position))]
    MultipleRoots { position: Option<Position> },

    /// Serializing a tree back to text failed.
    #[error("Failed to write XML: {0}")]
    Write(String),
}

fn at(position: &Option<Position>) -> String {
    match position {
        Some(pos) => format!(" at {}", pos),
        None => String::new(),
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlSyntax {
            message: err.to_string(),
            position: None,
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlSyntax {
            message: format!("Attribute error: {}", err),
            position: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_position() {
        let err = Error::MismatchedEndTag {
            expected: "config".to_string(),
            found: "type".to_string(),
            position: Some(Position { line: 3, column: 5 }),
        };
        assert_eq!(
            err.to_string(),
            "Mismatched end tag: expected </config>, found </type> at line 3, column 5"
        );
    }

    #[test]
    fn test_display_without_position() {
        let err = Error::MultipleRoots { position: None };
        assert_eq!(err.to_string(), "Invalid XML: multiple root elements");
    }
}
