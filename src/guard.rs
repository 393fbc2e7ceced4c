//! Schema Predicates
//!
//! One-level classification of schema nodes. Nothing here recurses past a
//! node's direct children.

use crate::schema::{Schema, SchemaKind, SchemaRef};

pub fn is_any(schema: &Schema) -> bool {
    matches!(schema.kind, SchemaKind::Any)
}

pub fn is_null(schema: &Schema) -> bool {
    matches!(schema.kind, SchemaKind::Null)
}

pub fn is_string(schema: &Schema) -> bool {
    matches!(schema.kind, SchemaKind::String(_))
}

pub fn is_literal(schema: &Schema) -> bool {
    matches!(schema.kind, SchemaKind::Literal(_))
}

pub fn is_array(schema: &Schema) -> bool {
    matches!(schema.kind, SchemaKind::Array(_))
}

pub fn is_object(schema: &Schema) -> bool {
    matches!(schema.kind, SchemaKind::Object(_))
}

pub fn is_record(schema: &Schema) -> bool {
    matches!(schema.kind, SchemaKind::Record(_))
}

pub fn is_union(schema: &Schema) -> bool {
    matches!(schema.kind, SchemaKind::Union(_))
}

pub fn is_intersect(schema: &Schema) -> bool {
    matches!(schema.kind, SchemaKind::Intersect(_))
}

pub fn is_union_enum(schema: &Schema) -> bool {
    matches!(schema.kind, SchemaKind::UnionEnum(_))
}

pub fn is_union_one_of(schema: &Schema) -> bool {
    matches!(schema.kind, SchemaKind::UnionOneOf(_))
}

pub fn is_ref(schema: &Schema) -> bool {
    matches!(schema.kind, SchemaKind::Ref(_))
}

pub fn is_transform(schema: &Schema) -> bool {
    matches!(schema.kind, SchemaKind::Transform(_))
}

/// Kind tag comparison, e.g. `is_kind_of(schema, "UnionEnum")`
pub fn is_kind_of(schema: &Schema, tag: &str) -> bool {
    schema.tag() == tag
}

/// The non-null branch of a two-branch union where exactly one branch is
/// `Null`.
pub fn nullable_union_branch(schema: &Schema) -> Option<&SchemaRef> {
    match &schema.kind {
        SchemaKind::Union(branches) if branches.len() == 2 => {
            match (is_null(&branches[0]), is_null(&branches[1])) {
                (true, false) => Some(&branches[1]),
                (false, true) => Some(&branches[0]),
                _ => None,
            }
        }
        _ => None,
    }
}

/// `T | null`, see [`nullable_union_branch`]
pub fn is_nullable_union(schema: &Schema) -> bool {
    nullable_union_branch(schema).is_some()
}

/// A literal missing its `type` or `enum` companion keyword
pub fn is_bare_literal(schema: &Schema) -> bool {
    matches!(&schema.kind, SchemaKind::Literal(literal) if !literal.is_enriched())
}
