//! Best-effort coercion of loosely typed input
//!
//! Query strings, path params and environment variables arrive as strings.
//! [`convert`] turns them into the scalar types the schema expects where the
//! conversion is lossless; anything it cannot convert is left for the
//! checker to reject.

use serde_json::{Map, Number, Value};

use super::{additional_schema, intersect_properties, Resolver};
use crate::schema::{EnumValue, LiteralValue, SchemaKind, SchemaRef};

/// Coerce `value` towards `schema`
pub fn convert(schema: &SchemaRef, references: &[SchemaRef], value: Value) -> Value {
    visit(&Resolver::new(references), schema, value)
}

fn visit(resolver: &Resolver<'_>, schema: &SchemaRef, value: Value) -> Value {
    match &schema.kind {
        SchemaKind::Null => to_null(value),
        SchemaKind::Boolean => to_boolean(value),
        SchemaKind::Integer(_) => to_integer(value),
        SchemaKind::Number(_) => to_number(value),
        SchemaKind::String(_) => to_string(value),
        SchemaKind::Literal(literal) => to_literal(&literal.value, value),
        SchemaKind::UnionEnum(values) => to_enum(values, value),
        SchemaKind::Array(array) => match value {
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| visit(resolver, &array.items, item))
                    .collect(),
            ),
            other => other,
        },
        SchemaKind::Object(object) => match value {
            Value::Object(map) => {
                let additional = additional_schema(schema);
                Value::Object(
                    map.into_iter()
                        .map(|(key, item)| {
                            let item = match object.properties.get(&key).or(additional) {
                                Some(property) => visit(resolver, property, item),
                                None => item,
                            };
                            (key, item)
                        })
                        .collect(),
                )
            }
            other => other,
        },
        SchemaKind::Record(record) => match value {
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, item)| (key, visit(resolver, &record.value, item)))
                    .collect(),
            ),
            other => other,
        },
        SchemaKind::Intersect(members) => match (intersect_properties(resolver, members), value) {
            (Some(properties), Value::Object(map)) => {
                let mut converted = Map::new();
                for (key, item) in map {
                    let item = match properties.iter().find(|(name, _, _)| **name == key) {
                        Some((_, property, _)) => visit(resolver, property, item),
                        None => item,
                    };
                    converted.insert(key, item);
                }
                Value::Object(converted)
            }
            (_, value) => match members.first() {
                Some(first) => visit(resolver, first, value),
                None => value,
            },
        },
        SchemaKind::Union(branches) | SchemaKind::UnionOneOf(branches) => {
            // first branch the converted value satisfies
            for branch in branches {
                let converted = visit(resolver, branch, value.clone());
                if resolver.check(branch, &converted) {
                    return converted;
                }
            }
            value
        }
        SchemaKind::Ref(id) => match resolver.resolve(id) {
            Some(target) => visit(resolver, target, value),
            None => value,
        },
        SchemaKind::Transform(transform) => visit(resolver, &transform.inner, value),
        SchemaKind::Any => value,
    }
}

fn parse_number(text: &str) -> Option<Number> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(integer) = text.parse::<i64>() {
        return Some(integer.into());
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}

fn to_null(value: Value) -> Value {
    match value {
        Value::String(s) if s.eq_ignore_ascii_case("null") => Value::Null,
        other => other,
    }
}

fn to_boolean(value: Value) -> Value {
    let converted = match &value {
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => match n.as_f64() {
            Some(x) if x == 1.0 => Some(true),
            Some(x) if x == 0.0 => Some(false),
            _ => None,
        },
        _ => None,
    };
    converted.map(Value::Bool).unwrap_or(value)
}

fn to_number(value: Value) -> Value {
    let converted = match &value {
        Value::String(s) => parse_number(s).or_else(|| match s.to_ascii_lowercase().as_str() {
            "true" => Some(1.into()),
            "false" => Some(0.into()),
            _ => None,
        }),
        Value::Bool(b) => Some(i64::from(*b).into()),
        _ => None,
    };
    converted.map(Value::Number).unwrap_or(value)
}

fn to_integer(value: Value) -> Value {
    match to_number(value) {
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Value::from(i),
            (None, Some(f)) if f.is_finite() && f.abs() < i64::MAX as f64 => Value::from(f.trunc() as i64),
            _ => Value::Number(n),
        },
        other => other,
    }
}

fn to_string(value: Value) -> Value {
    match value {
        Value::Number(n) => Value::String(n.to_string()),
        Value::Bool(b) => Value::String(b.to_string()),
        other => other,
    }
}

fn to_literal(literal: &LiteralValue, value: Value) -> Value {
    match literal {
        LiteralValue::String(_) => to_string(value),
        LiteralValue::Number(_) => to_number(value),
        LiteralValue::Boolean(_) => to_boolean(value),
    }
}

fn to_enum(values: &[EnumValue], value: Value) -> Value {
    if values.iter().any(|v| v.matches(&value)) {
        return value;
    }
    let candidates = [to_number(value.clone()), to_string(value.clone())];
    candidates
        .into_iter()
        .find(|candidate| values.iter().any(|v| v.matches(candidate)))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{kinds, Schema};
    use serde_json::json;

    fn run(schema: Schema, value: Value) -> Value {
        convert(&schema.into_ref(), &[], value)
    }

    #[test]
    fn test_scalars_from_strings() {
        assert_eq!(run(Schema::number(), json!("1.5")), json!(1.5));
        assert_eq!(run(Schema::integer(), json!("42")), json!(42));
        assert_eq!(run(Schema::integer(), json!("4.7")), json!(4));
        assert_eq!(run(Schema::boolean(), json!("true")), json!(true));
        assert_eq!(run(Schema::boolean(), json!("0")), json!(false));
        assert_eq!(run(Schema::null(), json!("null")), Value::Null);
    }

    #[test]
    fn test_unconvertible_left_alone() {
        assert_eq!(run(Schema::number(), json!("abc")), json!("abc"));
        assert_eq!(run(Schema::boolean(), json!("yes")), json!("yes"));
        assert_eq!(run(Schema::integer(), json!("")), json!(""));
    }

    #[test]
    fn test_to_string() {
        assert_eq!(run(Schema::string(), json!(12)), json!("12"));
        assert_eq!(run(Schema::string(), json!(false)), json!("false"));
    }

    #[test]
    fn test_object_properties() {
        let schema = Schema::object([
            ("page", Schema::integer()),
            ("tags", Schema::array(Schema::string())),
        ]);
        assert_eq!(
            run(schema, json!({"page": "2", "tags": [1, "b"], "other": "3"})),
            json!({"page": 2, "tags": ["1", "b"], "other": "3"})
        );
    }

    #[test]
    fn test_union_first_satisfied_branch() {
        let schema = kinds::nullable(Schema::number());
        assert_eq!(run(schema.clone(), json!("3")), json!(3));
        assert_eq!(run(schema, json!("null")), Value::Null);
    }

    #[test]
    fn test_enum_and_literal() {
        assert_eq!(run(kinds::union_enum([1, 2]), json!("2")), json!(2));
        assert_eq!(run(Schema::literal(true), json!("true")), json!(true));
    }
}
