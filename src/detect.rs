//! Schema Feature Detection
//!
//! Read-only traversals answering "does this tree contain X" without
//! building anything.

use crate::guard;
use crate::schema::{Schema, SchemaKind};

/// Whether [`crate::downgrade::downgrade`] would change anything.
///
/// Walks the same containers the downgrade does (array items, object
/// properties, intersect members, union branches, transform inner) and
/// stops at the first hit.
pub fn needs_downgrade(schema: &Schema) -> bool {
    if guard::is_nullable_union(schema) || guard::is_bare_literal(schema) {
        return true;
    }
    match &schema.kind {
        SchemaKind::Array(array) => needs_downgrade(&array.items),
        SchemaKind::Object(object) => object.properties.values().any(|p| needs_downgrade(p)),
        SchemaKind::Intersect(members) | SchemaKind::Union(members) => {
            members.iter().any(|m| needs_downgrade(m))
        }
        SchemaKind::Transform(transform) => needs_downgrade(&transform.inner),
        _ => false,
    }
}

/// Whether any node in the tree carries a `$id`
pub fn has_id(schema: &Schema) -> bool {
    any_node(schema, &|node| node.options.id.is_some())
}

/// Every `$id` in the tree, pre-order
pub fn collect_ids(schema: &Schema) -> Vec<String> {
    let mut ids = Vec::new();
    collect_ids_into(schema, &mut ids);
    ids
}

fn collect_ids_into(schema: &Schema, ids: &mut Vec<String>) {
    if let Some(id) = schema.id() {
        ids.push(id.to_string());
    }
    for child in schema.kind.children() {
        collect_ids_into(child, ids);
    }
}

/// Whether decoding can change a value's shape
pub fn has_transform(schema: &Schema) -> bool {
    any_node(schema, &guard::is_transform)
}

/// Whether the tree points at other schemas by `$id`
pub fn has_ref(schema: &Schema) -> bool {
    any_node(schema, &guard::is_ref)
}

fn any_node(schema: &Schema, predicate: &dyn Fn(&Schema) -> bool) -> bool {
    predicate(schema)
        || schema
            .kind
            .children()
            .into_iter()
            .any(|child| any_node(child, predicate))
}
