//! JSON Schema representation
//!
//! [`Schema::to_json`] emits the JSON Schema a documentation exporter expects;
//! [`Schema::from_json`] reads the same dialect back. Kind detection on input
//! follows keyword precedence: `$ref`, `anyOf`, `allOf`, `oneOf`, `const`,
//! `enum`, then `type`. Keywords without a dedicated field survive as
//! extensions.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};

use super::{
    AdditionalProperties, ArraySchema, EnumValue, JsonType, LiteralSchema, LiteralValue,
    NumberBounds, ObjectSchema, RecordSchema, Schema, SchemaKind, SchemaOptions, SchemaRef,
    StringBounds,
};
use crate::error::{Result, SchemaError};

/// Key used for the single `patternProperties` entry of a record
const RECORD_PATTERN: &str = "^(.*)$";

// =============================================================================
// Schema -> JSON
// =============================================================================

impl Schema {
    /// JSON Schema for this node and its subtree
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        write_kind(&self.kind, &mut out);
        write_options(&self.options, &mut out);
        Value::Object(out)
    }
}

fn write_options(options: &SchemaOptions, out: &mut Map<String, Value>) {
    if let Some(id) = &options.id {
        out.insert("$id".into(), Value::from(id.clone()));
    }
    if let Some(title) = &options.title {
        out.insert("title".into(), Value::from(title.clone()));
    }
    if let Some(description) = &options.description {
        out.insert("description".into(), Value::from(description.clone()));
    }
    if let Some(format) = &options.format {
        out.insert("format".into(), Value::from(format.clone()));
    }
    if let Some(default) = &options.default {
        out.insert("default".into(), default.clone());
    }
    if let Some(example) = &options.example {
        out.insert("example".into(), example.clone());
    }
    if let Some(examples) = &options.examples {
        out.insert("examples".into(), examples.clone());
    }
    if options.nullable {
        out.insert("nullable".into(), Value::Bool(true));
    }
    for (key, value) in &options.extensions {
        out.insert(key.clone(), value.clone());
    }
}

fn write_bounds(bounds: &NumberBounds, out: &mut Map<String, Value>) {
    if let Some(minimum) = bounds.minimum {
        out.insert("minimum".into(), json!(minimum));
    }
    if let Some(maximum) = bounds.maximum {
        out.insert("maximum".into(), json!(maximum));
    }
}

fn schema_list(schemas: &[SchemaRef]) -> Value {
    Value::Array(schemas.iter().map(|s| s.to_json()).collect())
}

fn write_kind(kind: &SchemaKind, out: &mut Map<String, Value>) {
    match kind {
        SchemaKind::Any => {}
        SchemaKind::Null => {
            out.insert("type".into(), Value::from("null"));
        }
        SchemaKind::Boolean => {
            out.insert("type".into(), Value::from("boolean"));
        }
        SchemaKind::Integer(bounds) => {
            out.insert("type".into(), Value::from("integer"));
            write_bounds(bounds, out);
        }
        SchemaKind::Number(bounds) => {
            out.insert("type".into(), Value::from("number"));
            write_bounds(bounds, out);
        }
        SchemaKind::String(bounds) => {
            out.insert("type".into(), Value::from("string"));
            if let Some(min) = bounds.min_length {
                out.insert("minLength".into(), Value::from(min));
            }
            if let Some(max) = bounds.max_length {
                out.insert("maxLength".into(), Value::from(max));
            }
            if let Some(pattern) = &bounds.pattern {
                out.insert("pattern".into(), Value::from(pattern.clone()));
            }
        }
        SchemaKind::Literal(literal) => {
            out.insert("const".into(), literal.value.to_value());
            if let Some(json_type) = literal.json_type {
                out.insert("type".into(), Value::from(json_type.as_str()));
            }
            if let Some(values) = &literal.enum_values {
                out.insert(
                    "enum".into(),
                    Value::Array(values.iter().map(LiteralValue::to_value).collect()),
                );
            }
        }
        SchemaKind::Array(array) => {
            out.insert("type".into(), Value::from("array"));
            out.insert("items".into(), array.items.to_json());
            if let Some(min) = array.min_items {
                out.insert("minItems".into(), Value::from(min));
            }
            if let Some(max) = array.max_items {
                out.insert("maxItems".into(), Value::from(max));
            }
        }
        SchemaKind::Object(object) => {
            out.insert("type".into(), Value::from("object"));
            let properties: Map<String, Value> = object
                .properties
                .iter()
                .map(|(name, schema)| (name.clone(), schema.to_json()))
                .collect();
            out.insert("properties".into(), Value::Object(properties));
            if !object.required.is_empty() {
                out.insert(
                    "required".into(),
                    Value::Array(object.required.iter().cloned().map(Value::from).collect()),
                );
            }
            match &object.additional_properties {
                AdditionalProperties::Allow => {}
                AdditionalProperties::Deny => {
                    out.insert("additionalProperties".into(), Value::Bool(false));
                }
                AdditionalProperties::Schema(schema) => {
                    out.insert("additionalProperties".into(), schema.to_json());
                }
            }
        }
        SchemaKind::Record(record) => {
            let value = record.value.to_json();
            out.insert("type".into(), Value::from("object"));
            out.insert("patternProperties".into(), json!({ RECORD_PATTERN: value.clone() }));
            // OpenAPI 3.0 has no patternProperties
            out.insert("additionalProperties".into(), value);
        }
        SchemaKind::Union(branches) => {
            out.insert("anyOf".into(), schema_list(branches));
        }
        SchemaKind::Intersect(members) => {
            out.insert("allOf".into(), schema_list(members));
        }
        SchemaKind::UnionEnum(values) => {
            out.insert(
                "enum".into(),
                Value::Array(values.iter().map(EnumValue::to_value).collect()),
            );
        }
        SchemaKind::UnionOneOf(branches) => {
            out.insert("oneOf".into(), schema_list(branches));
        }
        SchemaKind::Ref(target) => {
            out.insert("$ref".into(), Value::from(target.clone()));
        }
        SchemaKind::Transform(transform) => {
            // Codecs are invisible to documentation
            if let Value::Object(inner) = transform.inner.to_json() {
                out.extend(inner);
            }
        }
    }
}

// =============================================================================
// JSON -> Schema
// =============================================================================

impl Schema {
    /// Parse a JSON Schema document into a schema tree
    pub fn from_json(value: &Value) -> Result<Self> {
        let map = match value {
            Value::Object(map) => map.clone(),
            Value::Bool(true) => Map::new(),
            other => {
                return Err(SchemaError::InvalidFormat(format!(
                    "expected a schema object, got {other}"
                )))
            }
        };
        parse_schema(map)
    }
}

fn parse_child(value: &Value) -> Result<SchemaRef> {
    Schema::from_json(value).map(Arc::new)
}

fn parse_list(keyword: &str, value: Value) -> Result<Vec<SchemaRef>> {
    match value {
        Value::Array(items) => items.iter().map(parse_child).collect(),
        other => Err(SchemaError::InvalidFormat(format!(
            "'{keyword}' must be an array, got {other}"
        ))),
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Result<Option<String>> {
    match map.remove(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(SchemaError::InvalidFormat(format!(
            "'{key}' must be a string, got {other}"
        ))),
    }
}

fn take_f64(map: &mut Map<String, Value>, key: &str) -> Result<Option<f64>> {
    match map.remove(key) {
        None => Ok(None),
        Some(value) => value.as_f64().map(Some).ok_or_else(|| {
            SchemaError::InvalidFormat(format!("'{key}' must be a number, got {value}"))
        }),
    }
}

fn take_usize(map: &mut Map<String, Value>, key: &str) -> Result<Option<usize>> {
    match map.remove(key) {
        None => Ok(None),
        Some(value) => value
            .as_u64()
            .map(|n| Some(n as usize))
            .ok_or_else(|| {
                SchemaError::InvalidFormat(format!(
                    "'{key}' must be a non-negative integer, got {value}"
                ))
            }),
    }
}

fn take_options(map: &mut Map<String, Value>) -> Result<SchemaOptions> {
    let nullable = match map.remove("nullable") {
        None => false,
        Some(Value::Bool(b)) => b,
        Some(other) => {
            return Err(SchemaError::InvalidFormat(format!(
                "'nullable' must be a boolean, got {other}"
            )))
        }
    };
    Ok(SchemaOptions {
        id: take_string(map, "$id")?,
        title: take_string(map, "title")?,
        description: take_string(map, "description")?,
        format: take_string(map, "format")?,
        default: map.remove("default"),
        example: map.remove("example"),
        examples: map.remove("examples"),
        nullable,
        extensions: Map::new(),
    })
}

fn take_number_bounds(map: &mut Map<String, Value>) -> Result<NumberBounds> {
    Ok(NumberBounds {
        minimum: take_f64(map, "minimum")?,
        maximum: take_f64(map, "maximum")?,
    })
}

fn parse_schema(mut map: Map<String, Value>) -> Result<Schema> {
    let mut options = take_options(&mut map)?;
    let kind = parse_kind(&mut map)?;
    // whatever the kind did not consume is carried through untouched
    options.extensions = map;
    Ok(Schema { kind, options })
}

fn parse_kind(map: &mut Map<String, Value>) -> Result<SchemaKind> {
    if let Some(target) = take_string(map, "$ref")? {
        return Ok(SchemaKind::Ref(target));
    }
    if let Some(branches) = map.remove("anyOf") {
        return Ok(SchemaKind::Union(parse_list("anyOf", branches)?));
    }
    if let Some(members) = map.remove("allOf") {
        return Ok(SchemaKind::Intersect(parse_list("allOf", members)?));
    }
    if let Some(branches) = map.remove("oneOf") {
        return Ok(SchemaKind::UnionOneOf(parse_list("oneOf", branches)?));
    }
    if let Some(constant) = map.remove("const") {
        return parse_literal(map, &constant);
    }
    if let Some(values) = map.remove("enum") {
        return parse_union_enum(values);
    }

    let json_type = match map.remove("type") {
        None => return Ok(SchemaKind::Any),
        Some(Value::String(s)) => s,
        Some(Value::Array(types)) => return parse_type_list(map, types),
        Some(other) => {
            return Err(SchemaError::InvalidFormat(format!(
                "'type' must be a string or an array, got {other}"
            )))
        }
    };

    match JsonType::from_json_type(&json_type) {
        Some(JsonType::Null) => Ok(SchemaKind::Null),
        Some(JsonType::Boolean) => Ok(SchemaKind::Boolean),
        Some(JsonType::Integer) => Ok(SchemaKind::Integer(take_number_bounds(map)?)),
        Some(JsonType::Number) => Ok(SchemaKind::Number(take_number_bounds(map)?)),
        Some(JsonType::String) => Ok(SchemaKind::String(StringBounds {
            min_length: take_usize(map, "minLength")?,
            max_length: take_usize(map, "maxLength")?,
            pattern: take_string(map, "pattern")?,
        })),
        Some(JsonType::Array) => {
            let items = match map.remove("items") {
                Some(items) => parse_child(&items)?,
                None => Schema::any().into_ref(),
            };
            Ok(SchemaKind::Array(ArraySchema {
                items,
                min_items: take_usize(map, "minItems")?,
                max_items: take_usize(map, "maxItems")?,
            }))
        }
        Some(JsonType::Object) => parse_object(map),
        None => Err(SchemaError::InvalidFormat(format!(
            "unknown type '{json_type}'"
        ))),
    }
}

/// `{"type": ["string", "null"], ...}` becomes a union of single-type schemas
fn parse_type_list(map: &mut Map<String, Value>, types: Vec<Value>) -> Result<SchemaKind> {
    let shared = std::mem::take(map);
    let branches = types
        .into_iter()
        .map(|json_type| {
            let mut branch = shared.clone();
            branch.insert("type".into(), json_type);
            parse_schema(branch).map(Arc::new)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(SchemaKind::Union(branches))
}

fn parse_literal(map: &mut Map<String, Value>, constant: &Value) -> Result<SchemaKind> {
    let value = LiteralValue::from_value(constant).ok_or_else(|| {
        SchemaError::InvalidFormat(format!("unsupported literal constant {constant}"))
    })?;
    let json_type = match take_string(map, "type")? {
        None => None,
        Some(t) => Some(JsonType::from_json_type(&t).ok_or_else(|| {
            SchemaError::InvalidFormat(format!("unknown type '{t}'"))
        })?),
    };
    let enum_values = match map.remove("enum") {
        None => None,
        Some(Value::Array(values)) => Some(
            values
                .iter()
                .map(|v| {
                    LiteralValue::from_value(v).ok_or_else(|| {
                        SchemaError::InvalidFormat(format!("unsupported enum value {v}"))
                    })
                })
                .collect::<Result<Vec<_>>>()?,
        ),
        Some(other) => {
            return Err(SchemaError::InvalidFormat(format!(
                "'enum' must be an array, got {other}"
            )))
        }
    };
    Ok(SchemaKind::Literal(LiteralSchema {
        value,
        json_type,
        enum_values,
    }))
}

fn parse_union_enum(values: Value) -> Result<SchemaKind> {
    let values = match values {
        Value::Array(values) => values,
        other => {
            return Err(SchemaError::InvalidFormat(format!(
                "'enum' must be an array, got {other}"
            )))
        }
    };
    values
        .iter()
        .map(|v| {
            EnumValue::from_value(v)
                .ok_or_else(|| SchemaError::InvalidFormat(format!("unsupported enum value {v}")))
        })
        .collect::<Result<Vec<_>>>()
        .map(SchemaKind::UnionEnum)
}

fn parse_object(map: &mut Map<String, Value>) -> Result<SchemaKind> {
    if let Some(Value::Object(patterns)) = map.remove("patternProperties") {
        let value = match patterns.values().next() {
            Some(value) => parse_child(value)?,
            None => Schema::any().into_ref(),
        };
        map.remove("additionalProperties");
        return Ok(SchemaKind::Record(RecordSchema { value }));
    }

    let mut properties = IndexMap::new();
    match map.remove("properties") {
        None => {}
        Some(Value::Object(props)) => {
            for (name, schema) in &props {
                properties.insert(name.clone(), parse_child(schema)?);
            }
        }
        Some(other) => {
            return Err(SchemaError::InvalidFormat(format!(
                "'properties' must be an object, got {other}"
            )))
        }
    }

    let required = match map.remove("required") {
        None => Vec::new(),
        Some(Value::Array(names)) => names
            .into_iter()
            .map(|name| match name {
                Value::String(s) => Ok(s),
                other => Err(SchemaError::InvalidFormat(format!(
                    "required entries must be strings, got {other}"
                ))),
            })
            .collect::<Result<Vec<_>>>()?,
        Some(other) => {
            return Err(SchemaError::InvalidFormat(format!(
                "'required' must be an array, got {other}"
            )))
        }
    };

    let additional_properties = match map.remove("additionalProperties") {
        None | Some(Value::Bool(true)) => AdditionalProperties::Allow,
        Some(Value::Bool(false)) => AdditionalProperties::Deny,
        Some(schema) => AdditionalProperties::Schema(parse_child(&schema)?),
    };

    Ok(SchemaKind::Object(ObjectSchema {
        properties,
        required,
        additional_properties,
    }))
}

// =============================================================================
// Serde
// =============================================================================

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Schema::from_json(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::kinds;

    #[test]
    fn test_object_to_json() {
        let schema = Schema::from(
            ObjectSchema::new()
                .property("name", Schema::string().with_min_length(1))
                .optional("age", Schema::integer().with_minimum(0.0)),
        );
        assert_eq!(
            schema.to_json(),
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "minLength": 1 },
                    "age": { "type": "integer", "minimum": 0.0 }
                },
                "required": ["name"]
            })
        );
    }

    #[test]
    fn test_literal_to_json() {
        assert_eq!(Schema::literal("a").to_json(), json!({ "const": "a" }));
        assert_eq!(
            kinds::literal_enum(true).to_json(),
            json!({ "const": true, "type": "boolean", "enum": [true] })
        );
    }

    #[test]
    fn test_record_emits_additional_properties() {
        let json = kinds::record_string(Schema::number()).to_json();
        assert_eq!(json["additionalProperties"], json!({ "type": "number" }));
        assert_eq!(json["patternProperties"]["^(.*)$"], json!({ "type": "number" }));
    }

    #[test]
    fn test_from_json_round_trip() {
        let schema = Schema::from(
            ObjectSchema::new()
                .property("id", kinds::uuid())
                .nullish("email", Schema::string().with_format("email"))
                .property("tags", Schema::array(Schema::string()).with_max_items(4))
                .property("kind", kinds::string_enum(["a", "b"]))
                .additional_properties(AdditionalProperties::Deny),
        )
        .with_description("user");

        let parsed = Schema::from_json(&schema.to_json()).unwrap();
        assert_eq!(parsed, schema);
    }

    #[test]
    fn test_from_json_type_list() {
        let schema = Schema::from_json(&json!({ "type": ["string", "null"] })).unwrap();
        assert_eq!(schema, Schema::union([Schema::string(), Schema::null()]));
    }

    #[test]
    fn test_from_json_keeps_unknown_keywords() {
        let schema =
            Schema::from_json(&json!({ "type": "string", "x-internal": true })).unwrap();
        assert_eq!(schema.options.extensions.get("x-internal"), Some(&json!(true)));
    }

    #[test]
    fn test_from_json_rejects_bad_type() {
        let err = Schema::from_json(&json!({ "type": "tuple" })).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidFormat(_)));
    }

    #[test]
    fn test_serde_impls() {
        let schema: Schema = serde_json::from_str(r#"{"anyOf":[{"type":"null"}]}"#).unwrap();
        assert_eq!(serde_json::to_value(&schema).unwrap(), json!({ "anyOf": [{ "type": "null" }] }));
    }
}
