//! Remove undeclared properties

use serde_json::{Map, Value};

use super::{additional_schema, intersect_properties, Resolver};
use crate::schema::{SchemaKind, SchemaRef};

/// Drop object properties `schema` does not declare.
///
/// Unknown keys survive only when the object's `additionalProperties` schema
/// accepts them. Unions clean the value against each branch in order and
/// keep the first result that branch accepts; when none does the value is
/// returned untouched.
pub fn clean(schema: &SchemaRef, references: &[SchemaRef], value: Value) -> Value {
    visit(&Resolver::new(references), schema, value)
}

fn visit(resolver: &Resolver<'_>, schema: &SchemaRef, value: Value) -> Value {
    match (&schema.kind, value) {
        (SchemaKind::Object(object), Value::Object(map)) => {
            let additional = additional_schema(schema);
            let cleaned = map
                .into_iter()
                .filter_map(|(key, item)| match object.properties.get(&key) {
                    Some(property) => Some((key, visit(resolver, property, item))),
                    None => keep_additional(resolver, additional, key, item),
                })
                .collect();
            Value::Object(cleaned)
        }
        (SchemaKind::Record(record), Value::Object(map)) => Value::Object(
            map.into_iter()
                .map(|(key, item)| (key, visit(resolver, &record.value, item)))
                .collect(),
        ),
        (SchemaKind::Array(array), Value::Array(items)) => Value::Array(
            items
                .into_iter()
                .map(|item| visit(resolver, &array.items, item))
                .collect(),
        ),
        (SchemaKind::Intersect(members), Value::Object(map)) => {
            let Some(properties) = intersect_properties(resolver, members) else {
                return Value::Object(map);
            };
            let mut cleaned = Map::new();
            for (key, item) in map {
                if let Some((_, property, _)) = properties.iter().find(|(name, _, _)| **name == key) {
                    let item = visit(resolver, property, item);
                    cleaned.insert(key, item);
                    continue;
                }
                let accepted = members
                    .iter()
                    .filter_map(|m| resolver.target(m))
                    .filter_map(|m| additional_schema(m))
                    .find(|additional| resolver.check(additional, &item));
                if let Some(additional) = accepted {
                    let item = visit(resolver, additional, item);
                    cleaned.insert(key, item);
                }
            }
            Value::Object(cleaned)
        }
        (SchemaKind::Union(branches) | SchemaKind::UnionOneOf(branches), value) => {
            let accepted = branches.iter().find_map(|branch| {
                let cleaned = visit(resolver, branch, value.clone());
                resolver.check(branch, &cleaned).then_some(cleaned)
            });
            accepted.unwrap_or(value)
        }
        (SchemaKind::Ref(id), value) => match resolver.resolve(id) {
            Some(target) => visit(resolver, target, value),
            None => value,
        },
        (SchemaKind::Transform(transform), value) => visit(resolver, &transform.inner, value),
        (_, value) => value,
    }
}

fn keep_additional(
    resolver: &Resolver<'_>,
    additional: Option<&SchemaRef>,
    key: String,
    item: Value,
) -> Option<(String, Value)> {
    let additional = additional?;
    if !resolver.check(additional, &item) {
        return None;
    }
    Some((key, visit(resolver, additional, item)))
}
