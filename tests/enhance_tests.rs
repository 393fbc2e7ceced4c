//! Error Enhancement Tests
//!
//! Client-facing error reports for the common schema shapes, with dot paths
//! and snake_case type tags turned on.

use serde_json::{json, Value};

use typed_schemas::schema::kinds;
use typed_schemas::{
    enhance_errors, merge_errors, value, EnhanceOptions, EnhancedError, Schema, SchemaRef,
};

fn email_string() -> Schema {
    Schema::string().with_format("email")
}

fn enhance_with(schema: Schema, value: Value, options: EnhanceOptions) -> Vec<EnhancedError> {
    let schema: SchemaRef = schema.into_ref();
    let options = options.with_format_path(true).with_snake_case_type(true);
    enhance_errors(value::errors(&schema, &value), &options).collect()
}

fn enhance(schema: Schema, value: Value) -> Vec<EnhancedError> {
    enhance_with(schema, value, EnhanceOptions::new())
}

fn summary(errors: &[EnhancedError]) -> Vec<(&str, &str, &str)> {
    errors
        .iter()
        .map(|e| (e.path.as_str(), e.error_type.as_str(), e.message.as_str()))
        .collect()
}

#[test]
fn test_prefix_and_string_format() {
    let errors = enhance_with(email_string(), json!("test"), EnhanceOptions::new().with_prefix("email"));
    assert_eq!(
        summary(&errors),
        vec![("email", "string_format", "Expected string to match 'email' format")]
    );
}

#[test]
fn test_literal() {
    let errors = enhance(Schema::literal("one"), json!("test"));
    assert_eq!(summary(&errors), vec![("", "literal", "Expected 'one'")]);
}

#[test]
fn test_union_enum() {
    let errors = enhance(kinds::string_enum(["one", "two", "three"]), json!("test"));
    assert_eq!(
        summary(&errors),
        vec![("", "union_enum", "Expected one of the following: one, two, three")]
    );
}

#[test]
fn test_union_one_of() {
    let schema = kinds::union_one_of([
        Schema::literal("one"),
        Schema::literal("two"),
        Schema::literal("three"),
    ]);
    let errors = enhance(schema, json!("test"));
    assert_eq!(summary(&errors), vec![("", "union_one_of", "Expected one of union value")]);
}

#[test]
fn test_nullish_fields() {
    let schema = Schema::object([
        ("nullish", kinds::nullable(email_string())),
        ("nested", Schema::object([("nullish", kinds::nullable(email_string()))])),
    ]);
    let errors = enhance(schema, json!({"nullish": "test", "nested": {"nullish": "test"}}));
    assert_eq!(
        summary(&errors),
        vec![
            ("nullish", "string_format", "Expected string to match 'email' format"),
            ("nullish", "null", "Expected null"),
            ("nested.nullish", "string_format", "Expected string to match 'email' format"),
            ("nested.nullish", "null", "Expected null"),
        ]
    );
}

#[test]
fn test_enhancement_is_lazy_and_restartable() {
    let schema = Schema::object([("a", kinds::nullable(email_string()))]).into_ref();
    let doc = json!({"a": "x"});
    let options = EnhanceOptions::new().with_format_path(true);

    let mut lazy = enhance_errors(value::errors(&schema, &doc), &options);
    assert_eq!(lazy.next().map(|e| e.path), Some("a".to_string()));

    let first: Vec<_> = enhance_errors(value::errors(&schema, &doc), &options).collect();
    let second: Vec<_> = enhance_errors(value::errors(&schema, &doc), &options).collect();
    assert_eq!(first, second);
}

#[test]
fn test_merged_report() {
    let schema = Schema::object([
        ("name", Schema::string().with_min_length(3).with_pattern("^[a-z]+$")),
        ("email", kinds::nullable(email_string())),
    ])
    .into_ref();
    let options = EnhanceOptions::new().with_format_path(true).with_snake_case_type(true);
    let report = merge_errors(
        enhance_errors(value::errors(&schema, &json!({"name": "A", "email": 1})), &options),
        true,
    );

    let paths: Vec<_> = report.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, vec!["name", "email"]);
    assert_eq!(
        report[0].errors.keys().collect::<Vec<_>>(),
        vec!["string_min_length", "string_pattern"]
    );
    assert_eq!(report[1].errors.keys().collect::<Vec<_>>(), vec!["string", "null"]);
    assert_eq!(report[1].value, json!(1));
}
