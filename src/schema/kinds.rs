//! Utility schema kinds
//!
//! Shorthands for shapes that come up in API schemas, most of them chosen so
//! the emitted JSON is also valid OpenAPI 3.0.

use serde_json::Value;

use super::{Codec, EnumValue, LiteralSchema, LiteralValue, Schema, SchemaKind, SchemaRef};

/// `T | null`
pub fn nullable(schema: impl Into<SchemaRef>) -> Schema {
    Schema::union([schema.into(), Schema::null().into_ref()])
}

/// String with the `uuid` format
pub fn uuid() -> Schema {
    Schema::string().with_format("uuid")
}

/// String with the `date-time` format.
///
/// Decoding normalizes the value to UTC with millisecond precision
/// (`2024-01-01T00:00:00.000Z`); encoding does the same in reverse direction.
pub fn date_string() -> Schema {
    Schema::transform(Schema::string().with_format("date-time"), Codec::DateTime)
}

/// String-keyed map, emitted with `additionalProperties` so OpenAPI 3.0
/// (which lacks `patternProperties`) can read it.
pub fn record_string(value: impl Into<SchemaRef>) -> Schema {
    Schema::record(value)
}

/// Union over string/number constants with an `enum` representation
pub fn union_enum<I, V>(values: I) -> Schema
where
    I: IntoIterator<Item = V>,
    V: Into<EnumValue>,
{
    Schema::new(SchemaKind::UnionEnum(values.into_iter().map(Into::into).collect()))
}

/// [`union_enum`] over strings, tagged `type: string`
pub fn string_enum<I, V>(values: I) -> Schema
where
    I: IntoIterator<Item = V>,
    V: Into<String>,
{
    union_enum(values.into_iter().map(|v| EnumValue::String(v.into())))
        .with_extension("type", Value::from("string"))
}

/// Union with a `oneOf` representation: exactly one branch may match
pub fn union_one_of<I, S>(branches: I) -> Schema
where
    I: IntoIterator<Item = S>,
    S: Into<SchemaRef>,
{
    Schema::new(SchemaKind::UnionOneOf(branches.into_iter().map(Into::into).collect()))
}

/// Literal that already carries the `type` and `enum` keywords OpenAPI 3.0
/// tooling needs alongside `const`.
pub fn literal_enum(value: impl Into<LiteralValue>) -> Schema {
    Schema::new(SchemaKind::Literal(LiteralSchema::new(value).enriched()))
}
