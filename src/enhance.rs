//! Validation Error Enhancement
//!
//! Turns raw checker errors into something an API client can act on:
//!
//! - optional path prefix and dot-path formatting (`/a/0/b` → `a.0.b`)
//! - a string type tag, optionally snake_cased (`ArrayMinItems` → `array_min_items`)
//! - readable messages for the custom `UnionEnum` / `UnionOneOf` kinds
//! - a `T | null` union failure is replaced by the errors of each branch, so
//!   `{"email": "x"}` reports the format failure under `email` instead of an
//!   opaque "Expected union value"
//!
//! The adapter is lazy and keeps input order; branch errors are spliced in
//! where the union error was.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::guard;
use crate::schema::{SchemaKind, SchemaRef};
use crate::value::{self, ValueError, ValueErrorType};

/// How [`enhance_errors`] rewrites each error
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceOptions {
    /// Prepended to every path; useful to avoid empty root paths
    pub prefix: Option<String>,
    /// Convert JSON-pointer paths to dot paths, see [`format_path`]
    pub format_path: bool,
    /// snake_case the type tag
    pub snake_case_type: bool,
}

impl EnhanceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_format_path(mut self, format_path: bool) -> Self {
        self.format_path = format_path;
        self
    }

    pub fn with_snake_case_type(mut self, snake_case_type: bool) -> Self {
        self.snake_case_type = snake_case_type;
        self
    }
}

/// A [`ValueError`] with processed path, type tag and message
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancedError {
    /// Original error kind
    pub kind: ValueErrorType,
    /// Type tag, e.g. `StringFormat` or `string_format`
    pub error_type: String,
    pub schema: SchemaRef,
    pub path: String,
    pub value: Value,
    pub message: String,
}

/// Lazily enhance `errors`.
pub fn enhance_errors<I>(errors: I, options: &EnhanceOptions) -> EnhancedErrors<I::IntoIter>
where
    I: IntoIterator<Item = ValueError>,
{
    enhance_errors_with(errors, &[], options)
}

/// [`enhance_errors`] for errors from a checker with `$ref` targets.
///
/// Nullable-union branches are re-checked against `references`, so a
/// branch holding a `$ref` reports its real failure.
pub fn enhance_errors_with<I>(
    errors: I,
    references: &[SchemaRef],
    options: &EnhanceOptions,
) -> EnhancedErrors<I::IntoIter>
where
    I: IntoIterator<Item = ValueError>,
{
    EnhancedErrors {
        errors: errors.into_iter(),
        references: references.into(),
        options: options.clone(),
        nested: None,
    }
}

/// Iterator returned by [`enhance_errors`]
pub struct EnhancedErrors<I> {
    errors: I,
    references: Arc<[SchemaRef]>,
    options: EnhanceOptions,
    /// Branch errors of the last nullable-union failure, drained first
    nested: Option<Box<dyn Iterator<Item = EnhancedError>>>,
}

enum Step {
    Yield(EnhancedError),
    Expand(Box<dyn Iterator<Item = EnhancedError>>),
}

impl<I> Iterator for EnhancedErrors<I>
where
    I: Iterator<Item = ValueError>,
{
    type Item = EnhancedError;

    fn next(&mut self) -> Option<EnhancedError> {
        loop {
            if let Some(nested) = &mut self.nested {
                if let Some(error) = nested.next() {
                    return Some(error);
                }
                self.nested = None;
            }
            match enhance_one(self.errors.next()?, &self.references, &self.options) {
                Step::Yield(error) => return Some(error),
                Step::Expand(branches) => self.nested = Some(branches),
            }
        }
    }
}

fn enhance_one(error: ValueError, references: &Arc<[SchemaRef]>, options: &EnhanceOptions) -> Step {
    let ValueError {
        kind,
        schema,
        path,
        value,
        mut message,
    } = error;

    let mut path = match options.prefix.as_deref().filter(|p| !p.is_empty()) {
        Some(prefix) => join_prefix(prefix, &path),
        None => path,
    };
    if options.format_path {
        path = format_path(&path);
    }

    let mut error_type = kind.name().to_string();

    if kind == ValueErrorType::Kind {
        match &schema.kind {
            SchemaKind::UnionEnum(values) => {
                let values: Vec<String> = values.iter().map(ToString::to_string).collect();
                message = format!("Expected one of the following: {}", values.join(", "));
                error_type = "UnionEnum".to_string();
            }
            SchemaKind::UnionOneOf(_) => {
                message = "Expected one of union value".to_string();
                error_type = "UnionOneOf".to_string();
            }
            _ => {}
        }
    }

    if kind == ValueErrorType::Union {
        if let SchemaKind::Union(branches) = &schema.kind {
            if guard::is_nullable_union(&schema) {
                let nested_options = EnhanceOptions {
                    prefix: Some(path),
                    ..options.clone()
                };
                let branches = branches.clone();
                let references = Arc::clone(references);
                return Step::Expand(Box::new(branches.into_iter().flat_map(move |branch| {
                    let errors = value::errors_with(&branch, &references, &value);
                    enhance_errors_with(errors, &references, &nested_options)
                })));
            }
        }
    }

    if options.snake_case_type {
        error_type = to_snake_case(&error_type);
    }

    Step::Yield(EnhancedError {
        kind,
        error_type,
        schema,
        path,
        value,
        message,
    })
}

fn join_prefix(prefix: &str, path: &str) -> String {
    if path.is_empty() {
        prefix.to_string()
    } else if path.starts_with('/') {
        format!("{prefix}{path}")
    } else {
        format!("{prefix}/{path}")
    }
}

/// Convert a JSON-pointer path to a dot path: strip one leading `/`, then
/// replace every `/` with `.`.
///
/// ```
/// assert_eq!(typed_schemas::format_path("/a/b/c"), "a.b.c");
/// assert_eq!(typed_schemas::format_path(""), "");
/// ```
pub fn format_path(path: &str) -> String {
    path.strip_prefix('/').unwrap_or(path).replace('/', ".")
}

// =============================================================================
// Naming Utilities
// =============================================================================

/// Convert a PascalCase tag to snake_case
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_lower = false;

    for c in s.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else if c == '-' || c == ' ' {
            result.push('_');
            prev_lower = false;
        } else {
            result.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{kinds, Schema};
    use serde_json::json;

    fn enhanced(schema: Schema, value: Value, options: &EnhanceOptions) -> Vec<EnhancedError> {
        enhance_errors(value::errors(&schema.into_ref(), &value), options).collect()
    }

    #[test]
    fn test_format_path() {
        assert_eq!(format_path("/a/b/c"), "a.b.c");
        assert_eq!(format_path("a/b"), "a.b");
        assert_eq!(format_path("//a"), ".a");
        assert_eq!(format_path(""), "");
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("ArrayMinItems"), "array_min_items");
        assert_eq!(to_snake_case("UnionOneOf"), "union_one_of");
        assert_eq!(to_snake_case("Null"), "null");
    }

    #[test]
    fn test_no_options_keeps_error() {
        let errors = enhanced(Schema::object([("a", Schema::string())]), json!({"a": 1}), &EnhanceOptions::new());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "/a");
        assert_eq!(errors[0].error_type, "String");
        assert_eq!(errors[0].message, "Expected string");
    }

    #[test]
    fn test_prefix_joins_with_slash() {
        let options = EnhanceOptions::new().with_prefix("body");
        let errors = enhanced(Schema::object([("a", Schema::string())]), json!({"a": 1}), &options);
        assert_eq!(errors[0].path, "body/a");

        let options = options.with_format_path(true);
        let errors = enhanced(Schema::object([("a", Schema::string())]), json!({"a": 1}), &options);
        assert_eq!(errors[0].path, "body.a");
    }

    #[test]
    fn test_empty_path_without_prefix() {
        let options = EnhanceOptions::new().with_format_path(true);
        let errors = enhanced(Schema::string(), json!(1), &options);
        assert_eq!(errors[0].path, "");
    }

    #[test]
    fn test_union_enum_numbers() {
        let options = EnhanceOptions::new().with_snake_case_type(true);
        let errors = enhanced(kinds::union_enum([1, 2]), json!(3), &options);
        assert_eq!(errors[0].message, "Expected one of the following: 1, 2");
        assert_eq!(errors[0].error_type, "union_enum");
        assert_eq!(errors[0].kind, ValueErrorType::Kind);
    }

    #[test]
    fn test_nullable_union_branch_with_reference() {
        let user = Schema::object([("name", Schema::string())]).with_id("User").into_ref();
        let schema = Schema::object([("owner", kinds::nullable(Schema::reference("User")))]).into_ref();
        let doc = json!({"owner": {"name": 1}});
        let options = EnhanceOptions::new().with_format_path(true);

        let errors: Vec<_> = enhance_errors_with(
            value::errors_with(&schema, &[Arc::clone(&user)], &doc),
            &[user],
            &options,
        )
        .collect();
        let summary: Vec<_> = errors.iter().map(|e| (e.path.as_str(), e.message.as_str())).collect();
        assert_eq!(
            summary,
            vec![("owner.name", "Expected string"), ("owner", "Expected null")]
        );
    }

    #[test]
    fn test_non_nullable_union_is_kept() {
        let options = EnhanceOptions::new().with_snake_case_type(true);
        let errors = enhanced(Schema::union([Schema::string(), Schema::number()]), json!(true), &options);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error_type, "union");
        assert_eq!(errors[0].message, "Expected union value");
    }

    #[test]
    fn test_nullable_union_root_without_prefix() {
        let errors = enhanced(kinds::nullable(Schema::number()), json!("x"), &EnhanceOptions::new());
        let summary: Vec<_> = errors.iter().map(|e| (e.path.as_str(), e.message.as_str())).collect();
        assert_eq!(summary, vec![("", "Expected number"), ("", "Expected null")]);
    }

    #[test]
    fn test_nullable_union_nested_paths_without_formatting() {
        let schema = Schema::object([(
            "n",
            kinds::nullable(Schema::object([("a", Schema::string())])),
        )]);
        let errors = enhanced(schema, json!({"n": {"a": 1}}), &EnhanceOptions::new());
        let paths: Vec<_> = errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["/n/a", "/n"]);
    }
}
