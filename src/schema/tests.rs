//! Tests for schema loading and strict object assembly.

use crate::error::EmissaryError;
use crate::schema::{ObjectSchema, Schema, SchemaKind};
use serde_json::json;
use std::collections::BTreeMap;

fn parse_schema(yaml: &str) -> Schema {
    serde_yaml::from_str(yaml).unwrap()
}

#[test]
fn parses_scalar_kinds() {
    for (yaml, kind) in [
        ("type: string", SchemaKind::String),
        ("type: integer", SchemaKind::Integer),
        ("type: number", SchemaKind::Number),
        ("type: boolean", SchemaKind::Boolean),
        ("type: \"null\"", SchemaKind::Null),
    ] {
        let schema = parse_schema(yaml);
        assert_eq!(schema.kind(), kind, "yaml: {yaml}");
    }
}

#[test]
fn unrecognized_type_maps_to_other() {
    let schema = parse_schema("type: timestamp");
    assert_eq!(schema.kind(), SchemaKind::Other);
}

#[test]
fn missing_type_behaves_as_other() {
    let schema = parse_schema("description: anything goes");
    assert_eq!(schema.kind(), SchemaKind::Other);
}

#[test]
fn parses_nested_object_with_defaults() {
    let schema = parse_schema(
        r#"
type: object
properties:
  name:
    type: string
  retries:
    type: integer
    default: 3
required:
  - name
"#,
    );

    assert_eq!(schema.kind(), SchemaKind::Object);
    assert_eq!(schema.properties.len(), 2);
    assert_eq!(schema.required, vec!["name".to_string()]);
    assert_eq!(schema.properties["retries"].default, Some(json!(3)));
}

#[test]
fn parses_array_with_prefix_items() {
    let schema = parse_schema(
        r#"
type: array
prefixItems:
  - type: string
  - type: integer
items:
  type: number
"#,
    );

    assert_eq!(schema.kind(), SchemaKind::Array);
    assert_eq!(schema.prefix_items.len(), 2);
    assert_eq!(schema.prefix_items[0].kind(), SchemaKind::String);
    assert_eq!(schema.items.as_ref().unwrap().kind(), SchemaKind::Number);
}

#[test]
fn object_schema_requires_every_declared_property() {
    let mut props = BTreeMap::new();
    props.insert("question".to_string(), parse_schema("type: string"));
    props.insert("count".to_string(), parse_schema("type: integer"));

    let schema = ObjectSchema::new(props).unwrap();
    let json = schema.as_json();

    assert_eq!(json["type"], "object");
    assert_eq!(json["additionalProperties"], json!(false));
    assert_eq!(json["required"], json!(["count", "question"]));
    assert_eq!(json["properties"]["question"]["type"], "string");
}

#[test]
fn default_matching_its_kind_is_accepted() {
    let mut props = BTreeMap::new();
    props.insert(
        "count".to_string(),
        parse_schema("{type: integer, default: 7}"),
    );
    assert!(ObjectSchema::new(props).is_ok());
}

#[test]
fn default_mismatching_its_kind_is_rejected() {
    let mut props = BTreeMap::new();
    props.insert(
        "count".to_string(),
        parse_schema("{type: integer, default: seven}"),
    );

    let err = ObjectSchema::new(props).unwrap_err();
    match err {
        EmissaryError::ConfigType(msg) => assert!(msg.contains("count"), "msg: {msg}"),
        other => panic!("expected ConfigType error, got {other:?}"),
    }
}

#[test]
fn nested_default_mismatch_names_the_full_path() {
    let mut props = BTreeMap::new();
    props.insert(
        "report".to_string(),
        parse_schema(
            r#"
type: object
properties:
  sections:
    type: array
    default: not-a-list
"#,
        ),
    );

    let err = ObjectSchema::new(props).unwrap_err();
    match err {
        EmissaryError::ConfigType(msg) => {
            assert!(msg.contains("report.sections"), "msg: {msg}")
        }
        other => panic!("expected ConfigType error, got {other:?}"),
    }
}

#[test]
fn unrecognized_type_strings_round_trip_verbatim() {
    let schema = parse_schema("type: timestamp");
    assert_eq!(schema.kind(), SchemaKind::Other);
    assert_eq!(schema.to_json()["type"], "timestamp");
}

#[test]
fn declared_rendering_keeps_unknown_kinds_and_validation_rendering_drops_them() {
    let mut props = BTreeMap::new();
    props.insert("when".to_string(), parse_schema("type: timestamp"));
    props.insert(
        "events".to_string(),
        parse_schema("{type: array, items: {type: duration}}"),
    );

    let schema = ObjectSchema::new(props).unwrap();

    let declared = schema.as_json();
    assert_eq!(declared["properties"]["when"]["type"], "timestamp");
    assert_eq!(declared["properties"]["events"]["items"]["type"], "duration");

    let enforceable = schema.validation_json();
    assert!(enforceable["properties"]["when"].get("type").is_none());
    assert!(
        enforceable["properties"]["events"]["items"]
            .get("type")
            .is_none()
    );
    // Recognized kinds stay constrained in both renderings.
    assert_eq!(enforceable["properties"]["events"]["type"], "array");
    assert_eq!(enforceable["required"], json!(["events", "when"]));
}

#[test]
fn rendered_json_keeps_descriptions() {
    let mut props = BTreeMap::new();
    props.insert(
        "question".to_string(),
        parse_schema("{type: string, description: The question to answer.}"),
    );

    let schema = ObjectSchema::new(props).unwrap();
    assert_eq!(
        schema.as_json()["properties"]["question"]["description"],
        "The question to answer."
    );
}
