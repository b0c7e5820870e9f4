// Error types for schema loading and XML validation

use std::fmt;
use stratum_xml::Span;
use thiserror::Error;

/// Errors that can occur while loading a schema
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema document is not valid YAML or does not have the expected shape
    #[error("Invalid schema document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The schema file could not be read
    #[error("Failed to read schema {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The declared root element has no declaration
    #[error("Root element '{0}' is not declared under 'elements'")]
    UndeclaredRoot(String),

    /// A child rule names an element that has no declaration
    #[error("Element '{parent}' allows child '{child}', which is not declared under 'elements'")]
    UndeclaredChild { parent: String, child: String },

    /// A pattern failed to compile
    #[error("Invalid pattern '{pattern}' in {location}: {source}")]
    InvalidPattern {
        pattern: String,
        location: String,
        #[source]
        source: regex::Error,
    },

    /// A `min`/`max` pair that can never be satisfied
    #[error("Child '{child}' of '{parent}' has min {min} greater than max {max}")]
    InvalidOccurrence {
        parent: String,
        child: String,
        min: usize,
        max: usize,
    },
}

/// Result type for schema loading
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Structured validation error kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Document element has the wrong name
    RootMismatch { expected: String, found: String },

    /// Child element not allowed by the parent's declaration
    UnexpectedChild { child: String },

    /// Fewer occurrences of a child than `min`
    TooFewChildren { child: String, count: usize, min: usize },

    /// More occurrences of a child than `max`
    TooManyChildren { child: String, count: usize, max: usize },

    /// Two sibling elements share a value that must be unique
    DuplicateKey {
        child: String,
        attribute: String,
        value: String,
    },

    /// Missing required attribute
    MissingRequiredAttribute { attribute: String },

    /// Attribute not declared for this element
    UnknownAttribute { attribute: String },

    /// Attribute value or text not in the allowed list
    InvalidEnumValue {
        attribute: Option<String>,
        value: String,
        allowed: Vec<String>,
    },

    /// Attribute value or text doesn't match pattern
    PatternMismatch {
        attribute: Option<String>,
        value: String,
        pattern: String,
    },

    /// Element carries text but its declaration allows none
    UnexpectedText { text: String },

    /// Element declaration requires text but there is none
    MissingText,
}

impl ValidationErrorKind {
    /// Get the error code for this error kind
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationErrorKind::RootMismatch { .. } => "S-1-1",
            ValidationErrorKind::UnexpectedChild { .. } => "S-1-2",
            ValidationErrorKind::TooFewChildren { .. } => "S-1-3",
            ValidationErrorKind::TooManyChildren { .. } => "S-1-4",
            ValidationErrorKind::DuplicateKey { .. } => "S-1-5",
            ValidationErrorKind::MissingRequiredAttribute { .. } => "S-1-6",
            ValidationErrorKind::UnknownAttribute { .. } => "S-1-7",
            ValidationErrorKind::InvalidEnumValue { .. } => "S-1-8",
            ValidationErrorKind::PatternMismatch { .. } => "S-1-9",
            ValidationErrorKind::UnexpectedText { .. } => "S-1-10",
            ValidationErrorKind::MissingText => "S-1-11",
        }
    }

    /// Format a human-readable message from this error kind
    pub fn message(&self) -> String {
        match self {
            ValidationErrorKind::RootMismatch { expected, found } => {
                format!("Expected root element '{}', got '{}'", expected, found)
            }
            ValidationErrorKind::UnexpectedChild { child } => {
                format!("Element '{}' is not allowed here", child)
            }
            ValidationErrorKind::TooFewChildren { child, count, min } => {
                format!(
                    "Expected at least {} '{}' element(s), found {}",
                    min, child, count
                )
            }
            ValidationErrorKind::TooManyChildren { child, count, max } => {
                format!(
                    "Expected at most {} '{}' element(s), found {}",
                    max, child, count
                )
            }
            ValidationErrorKind::DuplicateKey {
                child,
                attribute,
                value,
            } => {
                format!(
                    "Duplicate '{}' element with {}=\"{}\"",
                    child, attribute, value
                )
            }
            ValidationErrorKind::MissingRequiredAttribute { attribute } => {
                format!("Missing required attribute '{}'", attribute)
            }
            ValidationErrorKind::UnknownAttribute { attribute } => {
                format!("Unknown attribute '{}'", attribute)
            }
            ValidationErrorKind::InvalidEnumValue {
                attribute,
                value,
                allowed,
            } => {
                format!(
                    "{} must be one of: {}, got '{}'",
                    subject(attribute),
                    allowed.join(", "),
                    value
                )
            }
            ValidationErrorKind::PatternMismatch {
                attribute,
                value,
                pattern,
            } => {
                format!(
                    "{} '{}' does not match pattern '{}'",
                    subject(attribute),
                    value,
                    pattern
                )
            }
            ValidationErrorKind::UnexpectedText { text } => {
                format!("Text content is not allowed here, got '{}'", text)
            }
            ValidationErrorKind::MissingText => "Missing required text content".to_string(),
        }
    }
}

fn subject(attribute: &Option<String>) -> String {
    match attribute {
        Some(name) => format!("Attribute '{}'", name),
        None => "Text".to_string(),
    }
}

/// A single schema violation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    /// The structured error kind
    pub kind: ValidationErrorKind,
    /// Path of the element the violation was found on
    pub instance_path: InstancePath,
    /// Span of that element in the file it was parsed from
    pub span: Span,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.instance_path, self.kind.message())
    }
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, instance_path: InstancePath, span: Span) -> Self {
        Self {
            kind,
            instance_path,
            span,
        }
    }

    /// Get the human-readable message for this error
    pub fn message(&self) -> String {
        self.kind.message()
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        self.kind.error_code()
    }
}

/// One step of an [`InstancePath`]: an element name and its 1-based position
/// among same-named siblings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub name: String,
    pub position: usize,
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.position > 1 {
            write!(f, "{}[{}]", self.name, self.position)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Element path (e.g., `/config/type[2]/argument`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstancePath {
    segments: Vec<PathSegment>,
}

impl InstancePath {
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Push an element segment onto the path
    pub fn push(&mut self, name: impl Into<String>, position: usize) {
        self.segments.push(PathSegment {
            name: name.into(),
            position,
        });
    }

    /// Pop the last segment from the path
    pub fn pop(&mut self) -> Option<PathSegment> {
        self.segments.pop()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for InstancePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}
