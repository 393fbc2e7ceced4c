//! Codec application
//!
//! Walks a value alongside its schema and runs the [`Codec`] of every
//! `Transform` node it meets. Neither direction checks the value; callers
//! check before decoding and after encoding.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use super::{child_path, Resolver};
use crate::error::{Result, SchemaError};
use crate::schema::{Codec, SchemaKind, SchemaRef};

#[derive(Clone, Copy)]
enum Direction {
    Decode,
    Encode,
}

/// Apply decode codecs (wire → application)
pub fn transform_decode(schema: &SchemaRef, references: &[SchemaRef], value: Value) -> Result<Value> {
    visit(&Resolver::new(references), Direction::Decode, schema, "", value)
}

/// Apply encode codecs (application → wire)
pub fn transform_encode(schema: &SchemaRef, references: &[SchemaRef], value: Value) -> Result<Value> {
    visit(&Resolver::new(references), Direction::Encode, schema, "", value)
}

fn visit(
    resolver: &Resolver<'_>,
    direction: Direction,
    schema: &SchemaRef,
    path: &str,
    value: Value,
) -> Result<Value> {
    match (&schema.kind, value) {
        (SchemaKind::Transform(transform), value) => match direction {
            Direction::Decode => {
                let inner = visit(resolver, direction, &transform.inner, path, value)?;
                apply(transform.codec, path, inner)
            }
            Direction::Encode => {
                let outer = apply(transform.codec, path, value)?;
                visit(resolver, direction, &transform.inner, path, outer)
            }
        },
        (SchemaKind::Object(object), Value::Object(map)) => {
            let mut out = serde_json::Map::new();
            for (key, item) in map {
                let item = match object.properties.get(&key) {
                    Some(property) => visit(resolver, direction, property, &child_path(path, &key), item)?,
                    None => item,
                };
                out.insert(key, item);
            }
            Ok(Value::Object(out))
        }
        (SchemaKind::Record(record), Value::Object(map)) => {
            let mut out = serde_json::Map::new();
            for (key, item) in map {
                let item = visit(resolver, direction, &record.value, &child_path(path, &key), item)?;
                out.insert(key, item);
            }
            Ok(Value::Object(out))
        }
        (SchemaKind::Array(array), Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| visit(resolver, direction, &array.items, &format!("{path}/{index}"), item))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        (SchemaKind::Intersect(members), value) => members
            .iter()
            .try_fold(value, |value, member| visit(resolver, direction, member, path, value)),
        (SchemaKind::Union(branches) | SchemaKind::UnionOneOf(branches), value) => {
            match branches.iter().find(|b| resolver.check(b, &value)) {
                Some(branch) => visit(resolver, direction, branch, path, value),
                None => Ok(value),
            }
        }
        (SchemaKind::Ref(id), value) => match resolver.resolve(id) {
            Some(target) => visit(resolver, direction, target, path, value),
            None => Ok(value),
        },
        (_, value) => Ok(value),
    }
}

fn apply(codec: Codec, path: &str, value: Value) -> Result<Value> {
    match codec {
        // both directions normalize to UTC with millisecond precision
        Codec::DateTime => {
            let Some(text) = value.as_str() else {
                return Err(SchemaError::Transform {
                    path: path.to_string(),
                    message: format!("expected a date-time string, got {value}"),
                });
            };
            let parsed = DateTime::parse_from_rfc3339(text).map_err(|e| SchemaError::Transform {
                path: path.to_string(),
                message: format!("invalid date-time '{text}': {e}"),
            })?;
            Ok(Value::String(
                parsed
                    .with_timezone(&Utc)
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
            ))
        }
    }
}
