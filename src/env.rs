//! Environment Loader
//!
//! Builds a typed settings object from environment variables: undeclared
//! variables are dropped, strings are coerced to the declared types, defaults
//! fill the gaps and the result is checked and decoded.

use serde_json::{Map, Value};
use tracing::error;

use crate::compile::cache_compile;
use crate::error::{Result, SchemaError, ValidationFailure};
use crate::merge::merge_errors;
use crate::schema::SchemaRef;
use crate::value;

/// Build a settings value from `vars` against an object `schema`.
///
/// Every failing path is logged before the error is returned.
pub fn create_env<I>(schema: &SchemaRef, vars: I) -> Result<Value>
where
    I: IntoIterator<Item = (String, String)>,
{
    let raw: Map<String, Value> = vars
        .into_iter()
        .map(|(key, val)| (key, Value::String(val)))
        .collect();

    let refs: &[SchemaRef] = &[];
    let cleaned = value::clean(schema, refs, Value::Object(raw));
    let converted = value::convert(schema, refs, cleaned);
    let defaulted = value::default(schema, refs, converted);

    let checker = cache_compile(schema, refs)?;
    checker.decode(defaulted).map_err(|err| match err {
        SchemaError::DecodeCheck(check) => {
            let errors = checker.errors(&check.value);
            let failure = ValidationFailure::new("env", *check, errors);
            for merged in merge_errors(failure.errors.iter().cloned(), false) {
                let messages: Vec<&str> = merged.errors.values().map(String::as_str).collect();
                error!(
                    path = merged.path.strip_prefix('/').unwrap_or(&merged.path),
                    value = %merged.value,
                    errors = ?messages,
                    "invalid environment variable"
                );
            }
            SchemaError::Validation(Box::new(failure))
        }
        other => other,
    })
}

/// [`create_env`] over the current process environment
pub fn create_env_from_process(schema: &SchemaRef) -> Result<Value> {
    create_env(schema, std::env::vars())
}
