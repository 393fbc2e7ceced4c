//! Error types for schema validation and shaping

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::schema::SchemaRef;
use crate::value::{ValueError, ValueErrorIterator};

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema toolkit errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Invalid schema format: {0}")]
    InvalidFormat(String),

    #[error("Unresolved schema reference: {0}")]
    UnresolvedReference(String),

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Unable to decode value as it does not match the expected schema: {0}")]
    DecodeCheck(Box<CheckError>),

    #[error("Unable to encode value as it does not match the expected schema: {0}")]
    EncodeCheck(Box<CheckError>),

    #[error("Transform failed at '{path}': {message}")]
    Transform { path: String, message: String },

    #[error("Validation failed for {}: {}", .0.part, .0.error.message)]
    Validation(Box<ValidationFailure>),

    #[error("No schema configured for {part}{}", .name.as_deref().map(|n| format!(" '{n}'")).unwrap_or_default())]
    MissingSchema { part: String, name: Option<String> },

    #[error("Expected an object schema, got {0}")]
    NotAnObject(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

/// A decode or encode check failure: the value, the schema it was checked
/// against, and the first error the checker produced.
#[derive(Debug, Clone)]
pub struct CheckError {
    pub schema: SchemaRef,
    pub value: Value,
    pub error: ValueError,
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.error.path.is_empty() {
            write!(f, "{}", self.error.message)
        } else {
            write!(f, "{} ({})", self.error.message, self.error.path)
        }
    }
}

/// Raised by the route adapter when a request part or a response fails its
/// schema.
///
/// Carries the same data as the underlying [`CheckError`] plus every error
/// the checker reports for the value, so callers can build a full report.
#[derive(Debug, Clone)]
pub struct ValidationFailure {
    /// Which part failed (`body`, `query`, `param`, `response`)
    pub part: String,
    pub schema: SchemaRef,
    pub value: Value,
    /// First error, as reported by decode/encode
    pub error: ValueError,
    /// All errors for `value`
    pub errors: Vec<ValueError>,
    /// `$ref` targets the schema was checked with
    pub references: Vec<SchemaRef>,
}

impl ValidationFailure {
    pub fn new(part: impl Into<String>, check: CheckError, errors: ValueErrorIterator) -> Self {
        Self {
            part: part.into(),
            schema: check.schema,
            value: check.value,
            error: check.error,
            errors: errors.collect(),
            references: Vec::new(),
        }
    }

    pub fn with_references(mut self, references: &[SchemaRef]) -> Self {
        self.references = references.to_vec();
        self
    }

    /// Enhance and merge all errors into one record per path.
    pub fn report(
        &self,
        options: &crate::enhance::EnhanceOptions,
        strip_empty_paths: bool,
    ) -> Vec<crate::merge::MergedError> {
        crate::merge::merge_errors(
            crate::enhance::enhance_errors_with(
                self.errors.iter().cloned(),
                &self.references,
                options,
            ),
            strip_empty_paths,
        )
    }
}
