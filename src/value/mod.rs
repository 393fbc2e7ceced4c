//! Value Engine
//!
//! Structural checking of JSON values against [`Schema`] trees, plus the
//! value-shaping passes request pipelines run before decoding:
//!
//! - [`clean`]: drop properties the schema does not declare
//! - [`convert`]: coerce strings from query strings and env vars
//! - [`default`]: fill declared defaults
//! - [`transform_decode`] / [`transform_encode`]: apply codecs
//!
//! Errors come out in schema traversal order: object properties in
//! declaration order, array items by index, union branches in order.

mod clean;
mod convert;
mod default;
mod transform;

pub use clean::clean;
pub use convert::convert;
pub use default::default;
pub use transform::{transform_decode, transform_encode};

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use regex::Regex;
use serde_json::Value;

use crate::formats;
use crate::schema::{
    AdditionalProperties, LiteralValue, NumberBounds, Schema, SchemaKind, SchemaRef,
    StringBounds,
};

// =============================================================================
// Error Types
// =============================================================================

/// What a [`ValueError`] is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueErrorType {
    Array,
    ArrayMinItems,
    ArrayMaxItems,
    Boolean,
    Integer,
    IntegerMinimum,
    IntegerMaximum,
    Intersect,
    /// Custom kind (`UnionEnum`, `UnionOneOf`) rejected the value
    Kind,
    Literal,
    Null,
    Number,
    NumberMinimum,
    NumberMaximum,
    Object,
    ObjectRequiredProperty,
    ObjectAdditionalProperties,
    Ref,
    String,
    StringFormat,
    StringFormatUnknown,
    StringMinLength,
    StringMaxLength,
    StringPattern,
    Union,
}

impl ValueErrorType {
    /// PascalCase name, e.g. `ArrayMinItems`
    pub fn name(&self) -> &'static str {
        match self {
            Self::Array => "Array",
            Self::ArrayMinItems => "ArrayMinItems",
            Self::ArrayMaxItems => "ArrayMaxItems",
            Self::Boolean => "Boolean",
            Self::Integer => "Integer",
            Self::IntegerMinimum => "IntegerMinimum",
            Self::IntegerMaximum => "IntegerMaximum",
            Self::Intersect => "Intersect",
            Self::Kind => "Kind",
            Self::Literal => "Literal",
            Self::Null => "Null",
            Self::Number => "Number",
            Self::NumberMinimum => "NumberMinimum",
            Self::NumberMaximum => "NumberMaximum",
            Self::Object => "Object",
            Self::ObjectRequiredProperty => "ObjectRequiredProperty",
            Self::ObjectAdditionalProperties => "ObjectAdditionalProperties",
            Self::Ref => "Ref",
            Self::String => "String",
            Self::StringFormat => "StringFormat",
            Self::StringFormatUnknown => "StringFormatUnknown",
            Self::StringMinLength => "StringMinLength",
            Self::StringMaxLength => "StringMaxLength",
            Self::StringPattern => "StringPattern",
            Self::Union => "Union",
        }
    }
}

impl fmt::Display for ValueErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single mismatch between a value and a schema node
#[derive(Debug, Clone, PartialEq)]
pub struct ValueError {
    pub kind: ValueErrorType,
    /// The node that rejected the value
    pub schema: SchemaRef,
    /// JSON pointer; `""` for the root
    pub path: String,
    /// Offending value; `null` for a missing property
    pub value: Value,
    pub message: String,
}

/// Errors for one check, in traversal order. Each call to [`errors`]
/// produces a fresh iterator.
#[derive(Debug, Clone)]
pub struct ValueErrorIterator {
    inner: std::vec::IntoIter<ValueError>,
}

impl ValueErrorIterator {
    fn new(errors: Vec<ValueError>) -> Self {
        Self {
            inner: errors.into_iter(),
        }
    }

    /// The next error, consuming the iterator
    pub fn first(mut self) -> Option<ValueError> {
        self.inner.next()
    }
}

impl Iterator for ValueErrorIterator {
    type Item = ValueError;

    fn next(&mut self) -> Option<ValueError> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for ValueErrorIterator {}

// =============================================================================
// Public Entry Points
// =============================================================================

/// Whether `value` matches `schema`
pub fn check(schema: &SchemaRef, value: &Value) -> bool {
    check_with(schema, &[], value)
}

/// [`check`] with `$ref` targets
pub fn check_with(schema: &SchemaRef, references: &[SchemaRef], value: &Value) -> bool {
    Resolver::new(references).check(schema, value)
}

/// Every error for `value`
pub fn errors(schema: &SchemaRef, value: &Value) -> ValueErrorIterator {
    errors_with(schema, &[], value)
}

/// [`errors`] with `$ref` targets
pub fn errors_with(schema: &SchemaRef, references: &[SchemaRef], value: &Value) -> ValueErrorIterator {
    Resolver::new(references).errors(schema, value)
}

/// Escape a property name for use as a JSON pointer segment
pub fn escape_pointer(key: &str) -> Cow<'_, str> {
    if key.contains(['~', '/']) {
        Cow::Owned(key.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(key)
    }
}

pub(crate) fn child_path(path: &str, key: &str) -> String {
    format!("{path}/{}", escape_pointer(key))
}

// =============================================================================
// Resolver
// =============================================================================

/// `$ref` targets and, once compiled, pre-built pattern regexes
#[derive(Clone, Copy)]
pub(crate) struct Resolver<'a> {
    references: &'a [SchemaRef],
    patterns: Option<&'a HashMap<String, Regex>>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(references: &'a [SchemaRef]) -> Self {
        Self {
            references,
            patterns: None,
        }
    }

    pub(crate) fn with_patterns(mut self, patterns: &'a HashMap<String, Regex>) -> Self {
        self.patterns = Some(patterns);
        self
    }

    pub(crate) fn resolve(&self, id: &str) -> Option<&'a SchemaRef> {
        self.references.iter().find(|r| r.id() == Some(id))
    }

    /// Follow `Ref` and `Transform` wrappers down to the node that decides
    /// the value's shape.
    pub(crate) fn target<'s>(&self, schema: &'s SchemaRef) -> Option<&'s SchemaRef>
    where
        'a: 's,
    {
        match &schema.kind {
            SchemaKind::Ref(id) => self.resolve(id).and_then(|s| self.target(s)),
            SchemaKind::Transform(transform) => self.target(&transform.inner),
            _ => Some(schema),
        }
    }

    fn is_match(&self, pattern: &str, value: &str) -> bool {
        if let Some(regex) = self.patterns.and_then(|p| p.get(pattern)) {
            return regex.is_match(value);
        }
        Regex::new(pattern).map(|r| r.is_match(value)).unwrap_or(false)
    }

    pub(crate) fn check(&self, schema: &SchemaRef, value: &Value) -> bool {
        let mut walker = Walker::new(*self, 1);
        walker.visit(schema, "", value);
        walker.errors.is_empty()
    }

    pub(crate) fn errors(&self, schema: &SchemaRef, value: &Value) -> ValueErrorIterator {
        let mut walker = Walker::new(*self, usize::MAX);
        walker.visit(schema, "", value);
        ValueErrorIterator::new(walker.errors)
    }

    fn first_error(&self, schema: &SchemaRef, path: &str, value: &Value) -> Option<ValueError> {
        let mut walker = Walker::new(*self, 1);
        walker.visit(schema, path, value);
        walker.errors.into_iter().next()
    }
}

// =============================================================================
// Walker
// =============================================================================

struct Walker<'a> {
    resolver: Resolver<'a>,
    errors: Vec<ValueError>,
    limit: usize,
}

impl<'a> Walker<'a> {
    fn new(resolver: Resolver<'a>, limit: usize) -> Self {
        Self {
            resolver,
            errors: Vec::new(),
            limit,
        }
    }

    fn full(&self) -> bool {
        self.errors.len() >= self.limit
    }

    fn push(
        &mut self,
        kind: ValueErrorType,
        schema: &SchemaRef,
        path: &str,
        value: &Value,
        message: impl Into<String>,
    ) {
        if self.full() {
            return;
        }
        self.errors.push(ValueError {
            kind,
            schema: SchemaRef::clone(schema),
            path: path.to_string(),
            value: value.clone(),
            message: message.into(),
        });
    }

    fn visit(&mut self, schema: &SchemaRef, path: &str, value: &Value) {
        if self.full() {
            return;
        }
        match &schema.kind {
            SchemaKind::Any => {}
            SchemaKind::Null => {
                if !value.is_null() {
                    self.push(ValueErrorType::Null, schema, path, value, "Expected null");
                }
            }
            SchemaKind::Boolean => {
                if !value.is_boolean() {
                    self.push(ValueErrorType::Boolean, schema, path, value, "Expected boolean");
                }
            }
            SchemaKind::Integer(bounds) => self.visit_integer(schema, bounds, path, value),
            SchemaKind::Number(bounds) => self.visit_number(schema, bounds, path, value),
            SchemaKind::String(bounds) => self.visit_string(schema, bounds, path, value),
            SchemaKind::Literal(literal) => {
                if !literal.value.matches(value) {
                    let message = match &literal.value {
                        LiteralValue::String(s) => format!("Expected '{s}'"),
                        other => format!("Expected {other}"),
                    };
                    self.push(ValueErrorType::Literal, schema, path, value, message);
                }
            }
            SchemaKind::Array(array) => {
                let Some(items) = value.as_array() else {
                    return self.push(ValueErrorType::Array, schema, path, value, "Expected array");
                };
                if let Some(min) = array.min_items.filter(|min| items.len() < *min) {
                    let message = format!("Expected array length to be greater or equal to {min}");
                    self.push(ValueErrorType::ArrayMinItems, schema, path, value, message);
                }
                if let Some(max) = array.max_items.filter(|max| items.len() > *max) {
                    let message = format!("Expected array length to be less or equal to {max}");
                    self.push(ValueErrorType::ArrayMaxItems, schema, path, value, message);
                }
                for (index, item) in items.iter().enumerate() {
                    self.visit(&array.items, &format!("{path}/{index}"), item);
                }
            }
            SchemaKind::Object(object) => {
                let Some(map) = value.as_object() else {
                    return self.push(ValueErrorType::Object, schema, path, value, "Expected object");
                };
                for name in &object.required {
                    if !map.contains_key(name) {
                        let property = object.properties.get(name).unwrap_or(schema);
                        self.push(
                            ValueErrorType::ObjectRequiredProperty,
                            property,
                            &child_path(path, name),
                            &Value::Null,
                            "Expected required property",
                        );
                    }
                }
                for (key, item) in map {
                    if object.properties.contains_key(key) {
                        continue;
                    }
                    match &object.additional_properties {
                        AdditionalProperties::Allow => {}
                        AdditionalProperties::Deny => self.push(
                            ValueErrorType::ObjectAdditionalProperties,
                            schema,
                            &child_path(path, key),
                            item,
                            "Unexpected property",
                        ),
                        AdditionalProperties::Schema(additional) => {
                            self.visit(additional, &child_path(path, key), item)
                        }
                    }
                }
                for (name, property) in &object.properties {
                    if let Some(item) = map.get(name) {
                        self.visit(property, &child_path(path, name), item);
                    }
                }
            }
            SchemaKind::Record(record) => {
                let Some(map) = value.as_object() else {
                    return self.push(ValueErrorType::Object, schema, path, value, "Expected object");
                };
                for (key, item) in map {
                    self.visit(&record.value, &child_path(path, key), item);
                }
            }
            SchemaKind::Union(branches) => {
                if !branches.iter().any(|b| self.resolver.check(b, value)) {
                    self.push(ValueErrorType::Union, schema, path, value, "Expected union value");
                }
            }
            SchemaKind::Intersect(members) => {
                for member in members {
                    if let Some(first) = self.resolver.first_error(member, path, value) {
                        self.push(
                            ValueErrorType::Intersect,
                            schema,
                            path,
                            value,
                            "Expected all values to match",
                        );
                        if !self.full() {
                            self.errors.push(first);
                        }
                    }
                }
            }
            SchemaKind::UnionEnum(values) => {
                if !values.iter().any(|v| v.matches(value)) {
                    self.push(ValueErrorType::Kind, schema, path, value, "Expected kind 'UnionEnum'");
                }
            }
            SchemaKind::UnionOneOf(branches) => {
                let matched = branches
                    .iter()
                    .filter(|b| self.resolver.check(b, value))
                    .take(2)
                    .count();
                if matched != 1 {
                    self.push(ValueErrorType::Kind, schema, path, value, "Expected kind 'UnionOneOf'");
                }
            }
            SchemaKind::Ref(id) => match self.resolver.resolve(id) {
                Some(target) => self.visit(target, path, value),
                None => {
                    let message = format!("Unable to dereference schema with $id '{id}'");
                    self.push(ValueErrorType::Ref, schema, path, value, message);
                }
            },
            SchemaKind::Transform(transform) => self.visit(&transform.inner, path, value),
        }
    }

    fn visit_integer(&mut self, schema: &SchemaRef, bounds: &NumberBounds, path: &str, value: &Value) {
        let Some(number) = value.as_f64().filter(|n| n.is_finite() && n.fract() == 0.0) else {
            return self.push(ValueErrorType::Integer, schema, path, value, "Expected integer");
        };
        if let Some(min) = bounds.minimum.filter(|min| number < *min) {
            let message = format!("Expected integer to be greater or equal to {min}");
            self.push(ValueErrorType::IntegerMinimum, schema, path, value, message);
        }
        if let Some(max) = bounds.maximum.filter(|max| number > *max) {
            let message = format!("Expected integer to be less or equal to {max}");
            self.push(ValueErrorType::IntegerMaximum, schema, path, value, message);
        }
    }

    fn visit_number(&mut self, schema: &SchemaRef, bounds: &NumberBounds, path: &str, value: &Value) {
        let Some(number) = value.as_f64() else {
            return self.push(ValueErrorType::Number, schema, path, value, "Expected number");
        };
        if let Some(min) = bounds.minimum.filter(|min| number < *min) {
            let message = format!("Expected number to be greater or equal to {min}");
            self.push(ValueErrorType::NumberMinimum, schema, path, value, message);
        }
        if let Some(max) = bounds.maximum.filter(|max| number > *max) {
            let message = format!("Expected number to be less or equal to {max}");
            self.push(ValueErrorType::NumberMaximum, schema, path, value, message);
        }
    }

    fn visit_string(&mut self, schema: &SchemaRef, bounds: &StringBounds, path: &str, value: &Value) {
        let Some(text) = value.as_str() else {
            return self.push(ValueErrorType::String, schema, path, value, "Expected string");
        };
        let length = text.chars().count();
        if let Some(min) = bounds.min_length.filter(|min| length < *min) {
            let message = format!("Expected string length greater or equal to {min}");
            self.push(ValueErrorType::StringMinLength, schema, path, value, message);
        }
        if let Some(max) = bounds.max_length.filter(|max| length > *max) {
            let message = format!("Expected string length less or equal to {max}");
            self.push(ValueErrorType::StringMaxLength, schema, path, value, message);
        }
        if let Some(pattern) = &bounds.pattern {
            if !self.resolver.is_match(pattern, text) {
                let message = format!("Expected string to match '{pattern}'");
                self.push(ValueErrorType::StringPattern, schema, path, value, message);
            }
        }
        if let Some(format) = &schema.options.format {
            match formats::check(format, text) {
                Some(true) => {}
                Some(false) => {
                    let message = format!("Expected string to match '{format}' format");
                    self.push(ValueErrorType::StringFormat, schema, path, value, message);
                }
                None => {
                    let message = format!("Unknown format '{format}'");
                    self.push(ValueErrorType::StringFormatUnknown, schema, path, value, message);
                }
            }
        }
    }
}

/// Object properties reachable through an intersect whose members are all
/// objects (after following refs). `None` when any member is not an object.
pub(crate) fn intersect_properties<'s>(
    resolver: &Resolver<'s>,
    members: &'s [SchemaRef],
) -> Option<Vec<(&'s String, &'s SchemaRef, &'s AdditionalProperties)>> {
    let mut properties = Vec::new();
    for member in members {
        let target = resolver.target(member)?;
        let SchemaKind::Object(object) = &target.kind else {
            return None;
        };
        for (name, property) in &object.properties {
            if !properties.iter().any(|(known, _, _)| *known == name) {
                properties.push((name, property, &object.additional_properties));
            }
        }
    }
    Some(properties)
}

/// Shared by the shaping passes: the `additionalProperties` schema of a
/// node, if it is an object with one.
pub(crate) fn additional_schema(schema: &Schema) -> Option<&SchemaRef> {
    match &schema.kind {
        SchemaKind::Object(object) => match &object.additional_properties {
            AdditionalProperties::Schema(additional) => Some(additional),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{kinds, ObjectSchema};
    use serde_json::json;

    fn assert_messages(schema: Schema, value: Value, expected: &[(&str, &str)]) {
        let actual: Vec<(String, String)> = errors(&schema.into_ref(), &value)
            .map(|e| (e.path, e.message))
            .collect();
        let actual: Vec<(&str, &str)> = actual
            .iter()
            .map(|(path, message)| (path.as_str(), message.as_str()))
            .collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_scalars() {
        assert!(check(&Schema::string().into_ref(), &json!("x")));
        assert!(check(&Schema::integer().into_ref(), &json!(2.0)));
        assert!(!check(&Schema::integer().into_ref(), &json!(2.5)));
        assert!(check(&Schema::number().into_ref(), &json!(2.5)));
        assert!(check(&Schema::null().into_ref(), &Value::Null));
        assert!(check(&Schema::any().into_ref(), &json!({"a": 1})));
        assert_messages(Schema::boolean(), json!("true"), &[("", "Expected boolean")]);
    }

    #[test]
    fn test_number_bounds() {
        let schema = Schema::number().with_minimum(1.0).with_maximum(5.0);
        assert_messages(
            schema.clone(),
            json!(0),
            &[("", "Expected number to be greater or equal to 1")],
        );
        assert_messages(schema, json!(6), &[("", "Expected number to be less or equal to 5")]);
    }

    #[test]
    fn test_string_constraints() {
        let schema = Schema::string().with_min_length(3).with_pattern("^[a-z]+$");
        let errs: Vec<_> = errors(&schema.into_ref(), &json!("A")).collect();
        assert_eq!(errs.len(), 2);
        assert_eq!(errs[0].kind, ValueErrorType::StringMinLength);
        assert_eq!(errs[0].message, "Expected string length greater or equal to 3");
        assert_eq!(errs[1].kind, ValueErrorType::StringPattern);
        assert_eq!(errs[1].message, "Expected string to match '^[a-z]+$'");
    }

    #[test]
    fn test_format_messages() {
        assert_messages(
            Schema::string().with_format("email"),
            json!("test"),
            &[("", "Expected string to match 'email' format")],
        );
        let errs: Vec<_> = errors(
            &Schema::string().with_format("value-test-nope").into_ref(),
            &json!("x"),
        )
        .collect();
        assert_eq!(errs[0].kind, ValueErrorType::StringFormatUnknown);
        assert_eq!(errs[0].message, "Unknown format 'value-test-nope'");
    }

    #[test]
    fn test_literal_messages() {
        assert_messages(Schema::literal("one"), json!("test"), &[("", "Expected 'one'")]);
        assert_messages(Schema::literal(1), json!(2), &[("", "Expected 1")]);
    }

    #[test]
    fn test_object_paths_in_declaration_order() {
        let schema = Schema::object([
            ("b", Schema::string()),
            ("a", Schema::array(Schema::number())),
        ]);
        assert_messages(
            schema,
            json!({"a": [1, "x"], "b": 1}),
            &[("/b", "Expected string"), ("/a/1", "Expected number")],
        );
    }

    #[test]
    fn test_missing_required_property() {
        let schema = Schema::from(
            ObjectSchema::new()
                .property("name", Schema::string())
                .optional("nick", Schema::string()),
        );
        let errs: Vec<_> = errors(&schema.into_ref(), &json!({})).collect();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].kind, ValueErrorType::ObjectRequiredProperty);
        assert_eq!(errs[0].path, "/name");
        assert_eq!(errs[0].value, Value::Null);
        assert_eq!(errs[0].schema.tag(), "String");
    }

    #[test]
    fn test_additional_properties() {
        let denied = Schema::from(
            ObjectSchema::new()
                .property("a", Schema::string())
                .additional_properties(AdditionalProperties::Deny),
        );
        assert_messages(
            denied,
            json!({"a": "x", "b/c": 1}),
            &[("/b~1c", "Unexpected property")],
        );

        let typed = Schema::from(
            ObjectSchema::new()
                .additional_properties(AdditionalProperties::Schema(Schema::number().into_ref())),
        );
        assert_messages(typed, json!({"x": "y"}), &[("/x", "Expected number")]);
    }

    #[test]
    fn test_union() {
        let schema = kinds::nullable(Schema::string().with_format("email"));
        let errs: Vec<_> = errors(&schema.into_ref(), &json!("test")).collect();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].kind, ValueErrorType::Union);
        assert_eq!(errs[0].message, "Expected union value");
        assert_eq!(errs[0].schema.tag(), "Union");
    }

    #[test]
    fn test_intersect_reports_first_member_error() {
        let schema = Schema::intersect([
            Schema::object([("a", Schema::string())]),
            Schema::object([("b", Schema::number())]),
        ]);
        let errs: Vec<_> = errors(&schema.into_ref(), &json!({"a": "x", "b": "y"})).collect();
        assert_eq!(errs.len(), 2);
        assert_eq!(errs[0].kind, ValueErrorType::Intersect);
        assert_eq!(errs[1].path, "/b");
        assert_eq!(errs[1].message, "Expected number");
    }

    #[test]
    fn test_custom_kinds() {
        let union_enum = kinds::string_enum(["one", "two"]).into_ref();
        assert!(check(&union_enum, &json!("one")));
        let errs: Vec<_> = errors(&union_enum, &json!("three")).collect();
        assert_eq!(errs[0].kind, ValueErrorType::Kind);

        let one_of = kinds::union_one_of([Schema::string(), Schema::string().with_min_length(1)]).into_ref();
        assert!(check(&one_of, &json!("")));
        // both branches match
        assert!(!check(&one_of, &json!("x")));
    }

    #[test]
    fn test_refs() {
        let user = Schema::object([("id", Schema::integer())]).with_id("User").into_ref();
        let schema = Schema::array(Schema::reference("User")).into_ref();
        assert!(check_with(&schema, &[user.clone()], &json!([{"id": 1}])));
        assert!(!check_with(&schema, &[user], &json!([{"id": "1"}])));

        let errs: Vec<_> = errors(&schema, &json!([{}])).collect();
        assert_eq!(errs[0].kind, ValueErrorType::Ref);
        assert_eq!(errs[0].message, "Unable to dereference schema with $id 'User'");
    }

    #[test]
    fn test_nullable_flag_is_not_validated() {
        let schema = Schema::string().with_nullable(true).into_ref();
        assert!(!check(&schema, &Value::Null));
    }

    #[test]
    fn test_error_iterator_first() {
        let schema = Schema::object([("a", Schema::string()), ("b", Schema::string())]).into_ref();
        let first = errors(&schema, &json!({"a": 1, "b": 2})).first();
        assert_eq!(first.map(|e| e.path), Some("/a".to_string()));
    }

    #[test]
    fn test_escape_pointer() {
        assert_eq!(escape_pointer("a/b~c"), "a~1b~0c");
        assert_eq!(escape_pointer("plain"), "plain");
    }
}
