//! OpenAPI 3.0 Downgrade
//!
//! Rewrites a schema into the older dialect most OpenAPI 3.0 tooling reads:
//!
//! - `anyOf: [T, {type: null}]` becomes `T` with `nullable: true`
//! - `{const: x}` gains `type` and `enum: [x]`
//!
//! Containers (array, object, intersect, union) and transforms, whose
//! documented JSON is their inner schema, are rebuilt only when a
//! descendant changes; untouched subtrees come back as the same reference.
//! [`crate::detect::needs_downgrade`] answers the same question without
//! allocating and must follow the same rules.

use std::sync::Arc;

use crate::guard;
use crate::schema::{ArraySchema, ObjectSchema, Schema, SchemaKind, SchemaRef, TransformSchema};

/// Downgrade `schema` and its subtree.
pub fn downgrade(schema: &SchemaRef) -> SchemaRef {
    // nullable unions collapse to the other branch, itself downgraded
    if let Some(branch) = guard::nullable_union_branch(schema) {
        let mut promoted = Schema::clone(&downgrade(branch));
        promoted.options.nullable = true;
        return Arc::new(promoted);
    }

    match &schema.kind {
        SchemaKind::Literal(literal) if !literal.is_enriched() => Arc::new(Schema {
            kind: SchemaKind::Literal(literal.enriched()),
            options: schema.options.clone(),
        }),
        SchemaKind::Array(array) => {
            let items = downgrade(&array.items);
            if Arc::ptr_eq(&items, &array.items) {
                return Arc::clone(schema);
            }
            rebuild(
                schema,
                SchemaKind::Array(ArraySchema {
                    items,
                    ..array.clone()
                }),
            )
        }
        SchemaKind::Object(object) => {
            let mut changed = false;
            let properties = object
                .properties
                .iter()
                .map(|(name, property)| {
                    let next = downgrade(property);
                    changed |= !Arc::ptr_eq(&next, property);
                    (name.clone(), next)
                })
                .collect();
            if !changed {
                return Arc::clone(schema);
            }
            rebuild(
                schema,
                SchemaKind::Object(ObjectSchema {
                    properties,
                    required: object.required.clone(),
                    additional_properties: object.additional_properties.clone(),
                }),
            )
        }
        SchemaKind::Intersect(members) => match downgrade_all(members) {
            Some(members) => rebuild(schema, SchemaKind::Intersect(members)),
            None => Arc::clone(schema),
        },
        SchemaKind::Union(branches) => match downgrade_all(branches) {
            Some(branches) => rebuild(schema, SchemaKind::Union(branches)),
            None => Arc::clone(schema),
        },
        SchemaKind::Transform(transform) => {
            let inner = downgrade(&transform.inner);
            if Arc::ptr_eq(&inner, &transform.inner) {
                return Arc::clone(schema);
            }
            rebuild(
                schema,
                SchemaKind::Transform(TransformSchema {
                    inner,
                    codec: transform.codec,
                }),
            )
        }
        _ => Arc::clone(schema),
    }
}

/// Downgrade every schema in the list; `None` when nothing changed.
fn downgrade_all(schemas: &[SchemaRef]) -> Option<Vec<SchemaRef>> {
    let next: Vec<SchemaRef> = schemas.iter().map(downgrade).collect();
    let changed = next
        .iter()
        .zip(schemas)
        .any(|(after, before)| !Arc::ptr_eq(after, before));
    changed.then_some(next)
}

fn rebuild(schema: &Schema, kind: SchemaKind) -> SchemaRef {
    Arc::new(Schema {
        kind,
        options: schema.options.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{kinds, Codec};

    #[test]
    fn test_nullable_union() {
        let schema = Schema::union([Schema::null(), Schema::string()]).into_ref();
        assert_eq!(*downgrade(&schema), Schema::string().with_nullable(true));
    }

    #[test]
    fn test_nullable_union_branch_order() {
        let first = Schema::union([Schema::null(), Schema::string()]).into_ref();
        let second = Schema::union([Schema::string(), Schema::null()]).into_ref();
        assert_eq!(downgrade(&first), downgrade(&second));
    }

    #[test]
    fn test_nullable_union_drops_union_options() {
        let schema = Schema::union([Schema::string().with_description("inner"), Schema::null()])
            .with_description("outer")
            .into_ref();
        assert_eq!(
            *downgrade(&schema),
            Schema::string().with_description("inner").with_nullable(true)
        );
    }

    #[test]
    fn test_promoted_branch_is_downgraded() {
        let schema = kinds::nullable(Schema::object([("kind", Schema::literal("a"))])).into_ref();
        let expected = Schema::object([("kind", kinds::literal_enum("a"))]).with_nullable(true);
        assert_eq!(*downgrade(&schema), expected);
    }

    #[test]
    fn test_double_null_union_is_kept() {
        let schema = Schema::union([Schema::null(), Schema::null()]).into_ref();
        assert!(Arc::ptr_eq(&downgrade(&schema), &schema));
    }

    #[test]
    fn test_literal() {
        let schema = Schema::literal("test").into_ref();
        assert_eq!(*downgrade(&schema), kinds::literal_enum("test"));
    }

    #[test]
    fn test_enriched_literal_untouched() {
        let schema = kinds::literal_enum(true).into_ref();
        assert!(Arc::ptr_eq(&downgrade(&schema), &schema));
    }

    #[test]
    fn test_untouched_subtrees_are_shared() {
        let email = Schema::string().with_format("email").into_ref();
        let schema = Schema::object([
            ("email", Arc::clone(&email)),
            ("maybe", kinds::nullable(Schema::number()).into_ref()),
        ])
        .into_ref();

        let out = downgrade(&schema);
        let SchemaKind::Object(object) = &out.kind else {
            panic!("expected object, got {}", out.tag());
        };
        assert!(Arc::ptr_eq(&object.properties["email"], &email));
        assert_eq!(*object.properties["maybe"], Schema::number().with_nullable(true));
    }

    #[test]
    fn test_transform_inner_is_downgraded() {
        let schema = Schema::transform(
            kinds::nullable(Schema::string().with_format("date-time")),
            Codec::DateTime,
        )
        .into_ref();
        let out = downgrade(&schema);
        let SchemaKind::Transform(transform) = &out.kind else {
            panic!("expected transform, got {}", out.tag());
        };
        assert_eq!(transform.codec, Codec::DateTime);
        assert_eq!(
            out.to_json(),
            serde_json::json!({"type": "string", "format": "date-time", "nullable": true})
        );

        let plain = kinds::date_string().into_ref();
        assert!(Arc::ptr_eq(&downgrade(&plain), &plain));
    }

    #[test]
    fn test_boolean_literal() {
        let schema = Schema::literal(true).into_ref();
        assert_eq!(
            downgrade(&schema).to_json(),
            serde_json::json!({"const": true, "type": "boolean", "enum": [true]})
        );
    }

    #[test]
    fn test_leaf_kinds_untouched() {
        for schema in [
            Schema::string(),
            Schema::null(),
            kinds::record_string(Schema::literal(1)),
            kinds::union_one_of([Schema::literal(1), Schema::null()]),
        ] {
            let schema = schema.into_ref();
            assert!(Arc::ptr_eq(&downgrade(&schema), &schema));
        }
    }
}
