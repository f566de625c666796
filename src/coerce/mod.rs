//! Input coercion: KEY=VALUE arguments to a schema-typed input object.
//!
//! CLI invocations supply loosely-typed arguments such as
//! `report.title=Weekly` or repeated `tags=a tags=b` pairs. This module
//! turns them into a nested JSON object that satisfies an agent's declared
//! input schema, in two passes:
//!
//! 1. [`parse_arguments`] splits keys on `.` and builds an untyped argument
//!    tree. Values stay strings; repeated keys at the same path collect into
//!    a string sequence.
//! 2. [`coerce`] walks the agent's input schema and converts each declared
//!    property to its schema kind, filling absent values from defaults.
//!
//! All failures carry the dotted/indexed path of the offending value
//! (e.g. `a.b[2].c`) and no partial object is ever returned.


use crate::error::{EmissaryError, Result};
use crate::schema::{ObjectSchema, Schema, SchemaKind};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// An untyped argument value, as parsed from KEY=VALUE pairs.
///
/// Only the key structure is parsed at this stage; leaf values remain
/// strings until the schema says what they should become.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    /// A single string value.
    Text(String),
    /// Repeated values for the same key, in argument order.
    List(Vec<String>),
    /// Nested values built from dotted key segments.
    Tree(BTreeMap<String, ArgValue>),
}

/// The root of a parsed argument tree.
pub type ArgumentTree = BTreeMap<String, ArgValue>;

/// Parse `KEY=VALUE` arguments into a nested argument tree.
///
/// Keys may use `.`-separated segments for nested object properties.
/// Repeated keys at the same path collect into a sequence, which array-typed
/// schema properties consume. A path that claims a point another path needs
/// to descend through fails with a conflicting-path error naming the
/// shortest common prefix, regardless of argument order.
pub fn parse_arguments(arguments: &[String]) -> Result<ArgumentTree> {
    let mut tree = ArgumentTree::new();

    for argument in arguments {
        let Some((key, value)) = argument.split_once('=') else {
            return Err(EmissaryError::Usage(format!(
                "argument is not in KEY=VALUE format: {argument}"
            )));
        };

        let segments: Vec<&str> = key.split('.').collect();
        let mut current = &mut tree;

        for (i, segment) in segments[..segments.len() - 1].iter().enumerate() {
            let entry = current
                .entry((*segment).to_string())
                .or_insert_with(|| ArgValue::Tree(BTreeMap::new()));
            match entry {
                ArgValue::Tree(child) => current = child,
                _ => {
                    return Err(EmissaryError::ConflictingPath(segments[..=i].join(".")));
                }
            }
        }

        let leaf = segments[segments.len() - 1];
        match current.get_mut(leaf) {
            None => {
                current.insert(leaf.to_string(), ArgValue::Text(value.to_string()));
            }
            Some(ArgValue::Text(previous)) => {
                let collected = vec![std::mem::take(previous), value.to_string()];
                current.insert(leaf.to_string(), ArgValue::List(collected));
            }
            Some(ArgValue::List(values)) => values.push(value.to_string()),
            Some(ArgValue::Tree(_)) => {
                return Err(EmissaryError::ConflictingPath(key.to_string()));
            }
        }
    }

    Ok(tree)
}

/// Coerce a parsed argument tree into an object satisfying `schema`.
///
/// Every declared top-level property ends up present and type-correct;
/// argument keys not declared in the schema are dropped.
pub fn coerce(arguments: &ArgumentTree, schema: &ObjectSchema) -> Result<Map<String, Value>> {
    let mut input = Map::new();
    for (name, prop_schema) in schema.properties() {
        let value = apply_schema(name, arguments.get(name), prop_schema)?;
        input.insert(name.clone(), value);
    }
    Ok(input)
}

/// Coerce one argument value against one schema node.
///
/// `path` names the value for diagnostics and grows as the walk descends
/// (`report.sections[2].title`).
fn apply_schema(path: &str, value: Option<&ArgValue>, schema: &Schema) -> Result<Value> {
    match schema.kind() {
        SchemaKind::String => match value {
            None => default_value(path, schema),
            Some(ArgValue::Text(text)) => Ok(Value::String(text.clone())),
            Some(_) => Err(EmissaryError::TypeMismatch(path.to_string())),
        },

        SchemaKind::Integer => match value {
            None => default_value(path, schema),
            Some(ArgValue::Text(text)) => {
                let parsed: i64 = text
                    .parse()
                    .map_err(|_| EmissaryError::TypeMismatch(path.to_string()))?;
                Ok(Value::Number(Number::from(parsed)))
            }
            Some(_) => Err(EmissaryError::TypeMismatch(path.to_string())),
        },

        SchemaKind::Number => match value {
            None => default_value(path, schema),
            Some(ArgValue::Text(text)) => {
                let parsed: f64 = text
                    .parse()
                    .map_err(|_| EmissaryError::TypeMismatch(path.to_string()))?;
                let number = Number::from_f64(parsed)
                    .ok_or_else(|| EmissaryError::TypeMismatch(path.to_string()))?;
                Ok(Value::Number(number))
            }
            Some(_) => Err(EmissaryError::TypeMismatch(path.to_string())),
        },

        SchemaKind::Boolean => match value {
            None => default_value(path, schema),
            Some(ArgValue::Text(text)) => parse_bool(text)
                .map(Value::Bool)
                .ok_or_else(|| EmissaryError::TypeMismatch(path.to_string())),
            Some(_) => Err(EmissaryError::TypeMismatch(path.to_string())),
        },

        SchemaKind::Null => match value {
            None => Ok(Value::Null),
            Some(ArgValue::Text(text)) if text == "null" => Ok(Value::Null),
            Some(_) => Err(EmissaryError::TypeMismatch(path.to_string())),
        },

        SchemaKind::Array => match value {
            None => default_value(path, schema),
            Some(ArgValue::List(values)) => {
                let mut array = Vec::with_capacity(values.len());
                for (i, element) in values.iter().enumerate() {
                    let element_path = format!("{path}[{i}]");
                    let element_schema = element_schema_at(schema, i)
                        .ok_or_else(|| EmissaryError::TypeMismatch(element_path.clone()))?;
                    let element_value = ArgValue::Text(element.clone());
                    array.push(apply_schema(
                        &element_path,
                        Some(&element_value),
                        element_schema,
                    )?);
                }
                Ok(Value::Array(array))
            }
            Some(_) => Err(EmissaryError::TypeMismatch(path.to_string())),
        },

        SchemaKind::Object => match value {
            None => default_value(path, schema),
            Some(ArgValue::Tree(tree)) => {
                let mut object = Map::new();
                for (name, prop_schema) in &schema.properties {
                    let prop_path = format!("{path}.{name}");
                    let prop_value = apply_schema(&prop_path, tree.get(name), prop_schema)?;
                    object.insert(name.clone(), prop_value);
                }
                Ok(Value::Object(object))
            }
            Some(_) => Err(EmissaryError::TypeMismatch(path.to_string())),
        },

        // Escape hatch: unknown kinds pass through unchanged.
        SchemaKind::Other => Ok(value.map_or(Value::Null, raw_value)),
    }
}

/// Resolve the element schema for index `i` of an array node.
///
/// Positional `prefixItems` win; elements beyond the declared prefix use the
/// wildcard schema chosen as `contains`, else `items`, else
/// `unevaluatedItems`.
fn element_schema_at(schema: &Schema, i: usize) -> Option<&Schema> {
    if let Some(prefix) = schema.prefix_items.get(i) {
        return Some(prefix);
    }
    schema
        .contains
        .as_deref()
        .or(schema.items.as_deref())
        .or(schema.unevaluated_items.as_deref())
}

/// Use the node's default literal when no argument value was supplied.
fn default_value(path: &str, schema: &Schema) -> Result<Value> {
    let Some(default) = &schema.default else {
        return Err(EmissaryError::MissingRequiredField(path.to_string()));
    };

    let ok = match schema.kind() {
        SchemaKind::String => default.is_string(),
        SchemaKind::Integer => default.is_i64() || default.is_u64(),
        SchemaKind::Number => default.is_number(),
        SchemaKind::Boolean => default.is_boolean(),
        SchemaKind::Array => default.is_array(),
        SchemaKind::Object => default.is_object(),
        SchemaKind::Null | SchemaKind::Other => true,
    };
    if !ok {
        return Err(EmissaryError::TypeMismatch(path.to_string()));
    }

    Ok(default.clone())
}

/// Parse a boolean literal the way command lines conventionally write them.
fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Convert an untyped argument value to JSON without schema guidance.
fn raw_value(value: &ArgValue) -> Value {
    match value {
        ArgValue::Text(text) => Value::String(text.clone()),
        ArgValue::List(values) => {
            Value::Array(values.iter().map(|v| Value::String(v.clone())).collect())
        }
        ArgValue::Tree(tree) => {
            let mut object = Map::new();
            for (name, child) in tree {
                object.insert(name.clone(), raw_value(child));
            }
            Value::Object(object)
        }
    }
}
