//! Fill declared defaults

use serde_json::Value;

use super::Resolver;
use crate::schema::{SchemaKind, SchemaRef};

/// Fill `default` values for missing object properties.
///
/// A `null` root counts as missing, so a schema-level default replaces it.
/// Properties that are missing and have no default stay missing; objects are
/// never created just to hold nested defaults.
pub fn default(schema: &SchemaRef, references: &[SchemaRef], value: Value) -> Value {
    let value = (!value.is_null()).then_some(value);
    visit(&Resolver::new(references), schema, value).unwrap_or(Value::Null)
}

fn visit(resolver: &Resolver<'_>, schema: &SchemaRef, value: Option<Value>) -> Option<Value> {
    let value = value.or_else(|| schema.options.default.clone());
    match &schema.kind {
        SchemaKind::Object(object) => match value {
            Some(Value::Object(mut map)) => {
                for (name, property) in &object.properties {
                    if let Some(item) = map.get_mut(name) {
                        let current = item.take();
                        *item = visit(resolver, property, Some(current)).unwrap_or(Value::Null);
                    } else if let Some(filled) = visit(resolver, property, None) {
                        map.insert(name.clone(), filled);
                    }
                }
                Some(Value::Object(map))
            }
            other => other,
        },
        SchemaKind::Record(record) => match value {
            Some(Value::Object(map)) => Some(Value::Object(
                map.into_iter()
                    .map(|(key, item)| {
                        let item = visit(resolver, &record.value, Some(item)).unwrap_or(Value::Null);
                        (key, item)
                    })
                    .collect(),
            )),
            other => other,
        },
        SchemaKind::Array(array) => match value {
            Some(Value::Array(items)) => Some(Value::Array(
                items
                    .into_iter()
                    .map(|item| visit(resolver, &array.items, Some(item)).unwrap_or(Value::Null))
                    .collect(),
            )),
            other => other,
        },
        SchemaKind::Intersect(members) => members
            .iter()
            .fold(value, |value, member| visit(resolver, member, value)),
        SchemaKind::Union(branches) | SchemaKind::UnionOneOf(branches) => {
            for branch in branches {
                if let Some(candidate) = visit(resolver, branch, value.clone()) {
                    if resolver.check(branch, &candidate) {
                        return Some(candidate);
                    }
                }
            }
            value
        }
        SchemaKind::Ref(id) => match resolver.resolve(id) {
            Some(target) => visit(resolver, target, value),
            None => value,
        },
        SchemaKind::Transform(transform) => visit(resolver, &transform.inner, value),
        _ => value,
    }
}
