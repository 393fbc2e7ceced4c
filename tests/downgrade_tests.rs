//! Downgrade and Detection Tests
//!
//! Whole-tree downgrade behavior plus properties that must hold for any
//! schema: idempotence and agreement between `downgrade` and
//! `needs_downgrade`.

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::json;

use typed_schemas::schema::{kinds, Codec, ObjectSchema};
use typed_schemas::{collect_ids, downgrade, needs_downgrade, Schema, SchemaRef};

// =============================================================================
// Whole-Tree Downgrade
// =============================================================================

#[test]
fn test_composite_schema() {
    let schema = Schema::from(
        ObjectSchema::new()
            .property("kind", Schema::literal("user"))
            .property("tags", Schema::array(kinds::nullable(Schema::string())))
            .nullish("manager", Schema::object([("id", kinds::uuid())]))
            .property(
                "mixed",
                Schema::intersect([
                    Schema::object([("a", Schema::literal(1))]),
                    Schema::object([("b", Schema::boolean())]),
                ]),
            ),
    )
    .into_ref();

    assert!(needs_downgrade(&schema));
    assert_eq!(
        downgrade(&schema).to_json(),
        json!({
            "type": "object",
            "properties": {
                "kind": {"const": "user", "type": "string", "enum": ["user"]},
                "tags": {"type": "array", "items": {"type": "string", "nullable": true}},
                "manager": {
                    "type": "object",
                    "properties": {"id": {"type": "string", "format": "uuid"}},
                    "required": ["id"],
                    "nullable": true
                },
                "mixed": {"allOf": [
                    {"type": "object", "properties": {"a": {"const": 1, "type": "number", "enum": [1]}}, "required": ["a"]},
                    {"type": "object", "properties": {"b": {"type": "boolean"}}, "required": ["b"]}
                ]}
            },
            "required": ["kind", "tags", "mixed"]
        })
    );
}

#[test]
fn test_input_not_mutated() {
    let schema = kinds::nullable(Schema::literal(true)).into_ref();
    let before = schema.to_json();
    let _ = downgrade(&schema);
    assert_eq!(schema.to_json(), before);
}

#[test]
fn test_general_union_recursed_not_collapsed() {
    let schema = Schema::union([Schema::literal("a"), Schema::literal("b")]).into_ref();
    let out = downgrade(&schema);
    assert_eq!(
        out.to_json(),
        json!({"anyOf": [
            {"const": "a", "type": "string", "enum": ["a"]},
            {"const": "b", "type": "string", "enum": ["b"]}
        ]})
    );
}

#[test]
fn test_boolean_literal_enriched() {
    let schema = Schema::literal(true).into_ref();
    assert_eq!(
        downgrade(&schema).to_json(),
        json!({"const": true, "type": "boolean", "enum": [true]})
    );
}

#[test]
fn test_transform_documented_as_nullable() {
    let schema = Schema::object([(
        "deleted_at",
        Schema::transform(
            kinds::nullable(Schema::string().with_format("date-time")),
            Codec::DateTime,
        ),
    )])
    .into_ref();
    assert!(needs_downgrade(&schema));
    assert_eq!(
        downgrade(&schema).to_json()["properties"]["deleted_at"],
        json!({"type": "string", "format": "date-time", "nullable": true})
    );
}

#[test]
fn test_collect_ids_pre_order() {
    let schema = Schema::object([
        ("user", Schema::object([("id", kinds::uuid().with_id("UserId"))]).with_id("User")),
        ("org", Schema::string().with_id("OrgId")),
    ])
    .with_id("Root");
    assert_eq!(collect_ids(&schema), vec!["Root", "User", "UserId", "OrgId"]);
}

// =============================================================================
// Properties
// =============================================================================

fn leaf() -> impl Strategy<Value = SchemaRef> {
    prop_oneof![
        Just(Schema::string()),
        Just(Schema::number()),
        Just(Schema::boolean()),
        Just(Schema::null()),
        "[a-z]{1,6}".prop_map(Schema::literal),
        any::<i32>().prop_map(Schema::literal),
        any::<bool>().prop_map(kinds::literal_enum),
        Just(kinds::union_enum(["a", "b"])),
    ]
    .prop_map(Schema::into_ref)
}

fn schema_tree() -> impl Strategy<Value = SchemaRef> {
    leaf().prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(|s| Schema::array(s).into_ref()),
            prop::collection::vec(("[a-z]{1,4}", inner.clone()), 0..4)
                .prop_map(|props| Schema::object(props).into_ref()),
            inner.clone().prop_map(|s| kinds::nullable(s).into_ref()),
            inner.clone().prop_map(|s| Schema::union([Schema::null().into_ref(), s]).into_ref()),
            prop::collection::vec(inner.clone(), 1..4).prop_map(|s| Schema::union(s).into_ref()),
            prop::collection::vec(inner.clone(), 1..3).prop_map(|s| Schema::intersect(s).into_ref()),
            inner.clone().prop_map(|s| kinds::record_string(s).into_ref()),
            inner.clone().prop_map(|s| Schema::transform(s, Codec::DateTime).into_ref()),
        ]
    })
}

proptest! {
    /// Downgrading twice gives the same tree as downgrading once.
    #[test]
    fn downgrade_is_idempotent(schema in schema_tree()) {
        let once = downgrade(&schema);
        let twice = downgrade(&once);
        prop_assert_eq!(&*once, &*twice);
        prop_assert!(Arc::ptr_eq(&once, &twice));
    }

    /// A downgraded tree never needs another downgrade.
    #[test]
    fn downgraded_tree_needs_nothing(schema in schema_tree()) {
        prop_assert!(!needs_downgrade(&downgrade(&schema)));
    }

    /// `needs_downgrade` is false exactly when downgrade returns the input.
    #[test]
    fn detection_matches_downgrade(schema in schema_tree()) {
        let out = downgrade(&schema);
        prop_assert_eq!(needs_downgrade(&schema), !Arc::ptr_eq(&out, &schema));
        if !needs_downgrade(&schema) {
            prop_assert_eq!(&*out, &*schema);
        }
    }
}
