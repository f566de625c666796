//! Tests for output conformance and repair.

use crate::error::{EmissaryError, Result};
use crate::format::OutputFormatter;
use crate::output::OutputContract;
use crate::schema::{ObjectSchema, Schema};
use serde_json::{Value, json};
use std::cell::Cell;
use std::collections::BTreeMap;

/// Formatter double that records whether it was called.
struct RecordingFormatter {
    called: Cell<bool>,
    result: Option<Value>,
}

impl RecordingFormatter {
    fn returning(value: Value) -> Self {
        Self {
            called: Cell::new(false),
            result: Some(value),
        }
    }

    fn failing() -> Self {
        Self {
            called: Cell::new(false),
            result: None,
        }
    }
}

impl OutputFormatter for RecordingFormatter {
    fn reformat(&self, _schema: &Value, _raw: &str) -> Result<Value> {
        self.called.set(true);
        self.result.clone().ok_or_else(|| {
            EmissaryError::InvalidOutputFormat("no choices".to_string())
        })
    }
}

fn contract(yaml: &str) -> OutputContract {
    let properties: BTreeMap<String, Schema> = serde_yaml::from_str(yaml).unwrap();
    OutputContract::new(&ObjectSchema::new(properties).unwrap()).unwrap()
}

#[test]
fn conforming_answer_skips_the_formatter() {
    let contract = contract("x: {type: integer}");
    let formatter = RecordingFormatter::returning(json!({"x": 99}));

    let conformed = contract.conform("{\"x\": 3}", &formatter).unwrap();
    assert_eq!(conformed.value, json!({"x": 3}));
    assert!(!conformed.repaired);
    assert!(!formatter.called.get(), "formatter must not run on the fast path");
}

#[test]
fn surrounding_whitespace_is_trimmed_before_the_parse() {
    let contract = contract("x: {type: integer}");
    let formatter = RecordingFormatter::returning(json!({}));

    let conformed = contract.conform("\n  {\"x\": 3}  \n", &formatter).unwrap();
    assert_eq!(conformed.value, json!({"x": 3}));
    assert!(!formatter.called.get());
}

#[test]
fn prose_answer_goes_through_repair() {
    let contract = contract("x: {type: integer}");
    let formatter = RecordingFormatter::returning(json!({"x": 3}));

    let conformed = contract
        .conform("here you go: x is 3", &formatter)
        .unwrap();
    assert_eq!(conformed.value, json!({"x": 3}));
    assert!(conformed.repaired);
    assert!(formatter.called.get());
}

#[test]
fn valid_json_violating_the_schema_goes_through_repair() {
    let contract = contract("x: {type: integer}");
    let formatter = RecordingFormatter::returning(json!({"x": 3}));

    // Decodes fine but "three" is not an integer.
    let conformed = contract.conform("{\"x\": \"three\"}", &formatter).unwrap();
    assert!(conformed.repaired);
    assert!(formatter.called.get());
}

#[test]
fn missing_required_property_goes_through_repair() {
    let contract = contract("x: {type: integer}\ny: {type: string}");
    let formatter = RecordingFormatter::returning(json!({"x": 1, "y": "ok"}));

    let conformed = contract.conform("{\"x\": 1}", &formatter).unwrap();
    assert!(conformed.repaired);
}

#[test]
fn extra_properties_violate_the_strict_contract() {
    let contract = contract("x: {type: integer}");
    let formatter = RecordingFormatter::returning(json!({"x": 1}));

    let conformed = contract
        .conform("{\"x\": 1, \"rogue\": true}", &formatter)
        .unwrap();
    assert!(conformed.repaired, "additionalProperties must be forbidden");
}

#[test]
fn repaired_value_is_trusted_without_revalidation() {
    let contract = contract("x: {type: integer}");
    // The formatter's strict mode is trusted even if the double misbehaves.
    let formatter = RecordingFormatter::returning(json!({"unrelated": true}));

    let conformed = contract.conform("not json", &formatter).unwrap();
    assert_eq!(conformed.value, json!({"unrelated": true}));
    assert!(conformed.repaired);
}

#[test]
fn failed_repair_surfaces_invalid_output_format() {
    let contract = contract("x: {type: integer}");
    let formatter = RecordingFormatter::failing();

    let err = contract.conform("not json", &formatter).unwrap_err();
    assert!(matches!(err, EmissaryError::InvalidOutputFormat(_)));
}

#[test]
fn unknown_kind_properties_compile_and_pass_through() {
    // The escape-hatch kinds cannot be checked, so the contract leaves
    // them unconstrained instead of failing to compile.
    let contract = contract("when: {type: timestamp}\nx: {type: integer}");
    let formatter = RecordingFormatter::returning(json!({}));

    let conformed = contract
        .conform("{\"when\": \"2026-08-27T00:00:00Z\", \"x\": 1}", &formatter)
        .unwrap();
    assert!(!conformed.repaired);
    assert!(!formatter.called.get());

    // Sibling constraints still apply.
    let bad = contract
        .conform("{\"when\": \"2026-08-27T00:00:00Z\", \"x\": \"one\"}", &formatter)
        .unwrap();
    assert!(bad.repaired);
}

#[test]
fn nested_constraints_are_enforced_on_the_fast_path() {
    let contract = contract(
        r#"
report:
  type: object
  properties:
    pages:
      type: integer
  required: [pages]
"#,
    );
    let formatter = RecordingFormatter::returning(json!({}));

    let good = contract
        .conform("{\"report\": {\"pages\": 2}}", &formatter)
        .unwrap();
    assert!(!good.repaired);

    let bad = contract
        .conform("{\"report\": {\"pages\": \"two\"}}", &formatter)
        .unwrap();
    assert!(bad.repaired);
}
