//! Tests for schema trees: JSON form, exclusion and path round trips.

use super::{PathSegment, SchemaNode};
use proptest::prelude::*;
use serde_json::json;

fn group_schema() -> SchemaNode {
    SchemaNode::from(json!({
        "schemas": ["urn:ietf:params:scim:schemas:core:2.0:Group"],
        "id": {"$ref": "id"},
        "displayName": {"$ref": "display_name"},
        "members": [{"value": {"$ref": "id"}}],
        "meta": {"resourceType": "Group"}
    }))
}

#[test]
fn test_json_form_parses_node_kinds() {
    let schema = group_schema();
    assert_eq!(
        schema.get("displayName"),
        Some(&SchemaNode::reference("display_name"))
    );
    assert_eq!(
        schema.get("schemas"),
        Some(&SchemaNode::list([SchemaNode::literal(
            "urn:ietf:params:scim:schemas:core:2.0:Group"
        )]))
    );
    assert!(matches!(schema.get("meta"), Some(SchemaNode::Object(_))));
}

#[test]
fn test_key_order_is_preserved() {
    assert_eq!(
        group_schema().keys(),
        vec!["schemas", "id", "displayName", "members", "meta"]
    );
}

#[test]
fn test_ref_object_with_extra_keys_is_an_object() {
    let schema = SchemaNode::from(json!({"$ref": "x", "other": 1}));
    assert!(matches!(schema, SchemaNode::Object(ref entries) if entries.len() == 2));
}

#[test]
fn test_to_json_round_trips() {
    let raw = json!({"displayName": {"$ref": "display_name"}, "tags": [1, "two", null]});
    assert_eq!(SchemaNode::from(raw.clone()).to_json(), raw);
}

#[test]
fn test_serde_deserialize() {
    let schema: SchemaNode =
        serde_json::from_str(r#"{"userName": {"$ref": "email"}}"#).expect("valid schema");
    assert_eq!(schema.get("userName"), Some(&SchemaNode::reference("email")));
}

#[test]
fn test_without_keys_only_touches_top_level() {
    let schema = SchemaNode::from(json!({
        "displayName": {"$ref": "display_name"},
        "meta": {"displayName": "nested"}
    }));
    let trimmed = schema.without_keys(&["displayName"]);
    assert_eq!(trimmed.keys(), vec!["meta"]);
    assert!(trimmed.get("meta").unwrap().get("displayName").is_some());
    // the canonical schema is untouched
    assert_eq!(schema.keys(), vec!["displayName", "meta"]);
}

#[test]
fn test_references_keep_duplicates() {
    assert_eq!(group_schema().references(), vec!["id", "display_name", "id"]);
}

#[test]
fn test_dig_follows_resolved_path() {
    let schema = group_schema();
    let path = schema.resolve("display_name").unwrap();
    assert_eq!(
        schema.dig(&path),
        Some(&SchemaNode::reference("display_name"))
    );
}

#[test]
fn test_dig_rejects_wrong_segment_kind() {
    let schema = group_schema();
    let path = vec![PathSegment::Index(0)].into();
    assert_eq!(schema.dig(&path), None);
}

fn arbitrary_schema() -> impl Strategy<Value = SchemaNode> {
    let leaf = prop_oneof![
        Just(SchemaNode::reference("")),
        any::<i64>().prop_map(SchemaNode::literal),
        "[a-z]{0,8}".prop_map(SchemaNode::literal),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(SchemaNode::List),
            prop::collection::btree_map("[a-zA-Z]{1,6}", inner, 0..5)
                .prop_map(|entries| SchemaNode::object(entries)),
        ]
    })
}

/// Give every Reference leaf a distinct name.
fn number_references(node: &mut SchemaNode, next: &mut usize) {
    match node {
        SchemaNode::Reference(name) => {
            *name = format!("attr_{}", next);
            *next += 1;
        }
        SchemaNode::Literal(_) => {}
        SchemaNode::Object(entries) => {
            for (_, child) in entries.iter_mut() {
                number_references(child, next);
            }
        }
        SchemaNode::List(items) => {
            for child in items.iter_mut() {
                number_references(child, next);
            }
        }
    }
}

proptest! {
    #[test]
    fn prop_resolve_then_dig_returns_reference(mut schema in arbitrary_schema()) {
        let mut count = 0;
        number_references(&mut schema, &mut count);

        for index in 0..count {
            let name = format!("attr_{}", index);
            let path = schema.resolve(&name).expect("every reference resolves");
            prop_assert_eq!(schema.dig(&path), Some(&SchemaNode::Reference(name)));
        }
        prop_assert!(schema.resolve("absent").is_none());
    }
}
