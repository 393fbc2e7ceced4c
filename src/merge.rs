//! Error Merging
//!
//! Collapses an error sequence into one record per path, each carrying a
//! `type → message` map. Paths keep their first-appearance order; a type
//! seen twice at one path keeps the later message.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::enhance::EnhancedError;
use crate::schema::SchemaRef;
use crate::value::ValueError;

/// Anything [`merge_errors`] can aggregate
pub trait MergeableError {
    fn path(&self) -> &str;
    /// Key in [`MergedError::errors`]
    fn type_key(&self) -> &str;
    fn message(&self) -> &str;
    fn schema(&self) -> &SchemaRef;
    fn value(&self) -> &Value;
}

impl MergeableError for ValueError {
    fn path(&self) -> &str {
        &self.path
    }

    fn type_key(&self) -> &str {
        self.kind.name()
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    fn value(&self) -> &Value {
        &self.value
    }
}

impl MergeableError for EnhancedError {
    fn path(&self) -> &str {
        &self.path
    }

    fn type_key(&self) -> &str {
        &self.error_type
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    fn value(&self) -> &Value {
        &self.value
    }
}

/// All errors reported at one path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedError {
    pub path: String,
    /// Schema of the first error at this path
    #[serde(skip)]
    pub schema: SchemaRef,
    /// Value of the first error at this path
    pub value: Value,
    /// type → message, in insertion order
    pub errors: IndexMap<String, String>,
}

/// Merge `errors` into one record per path.
///
/// With `strip_empty_paths`, errors at the root path (`""`) are dropped.
pub fn merge_errors<I>(errors: I, strip_empty_paths: bool) -> Vec<MergedError>
where
    I: IntoIterator,
    I::Item: MergeableError,
{
    let mut merged: IndexMap<String, MergedError> = IndexMap::new();
    for error in errors {
        if let Some(record) = merged.get_mut(error.path()) {
            record
                .errors
                .insert(error.type_key().to_string(), error.message().to_string());
        } else if !strip_empty_paths || !error.path().is_empty() {
            let mut messages = IndexMap::new();
            messages.insert(error.type_key().to_string(), error.message().to_string());
            merged.insert(
                error.path().to_string(),
                MergedError {
                    path: error.path().to_string(),
                    schema: SchemaRef::clone(error.schema()),
                    value: error.value().clone(),
                    errors: messages,
                },
            );
        }
    }
    merged.into_values().collect()
}
