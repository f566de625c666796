//! JSON-Schema-subset type descriptors for agent input and output contracts.
//!
//! A [`Schema`] is a recursive, closed descriptor over the kinds an agent
//! contract can declare: object, array, string, integer, number, boolean,
//! and null, plus an escape hatch for unrecognized kinds. It is pure data:
//! the input coercer walks it to bind arguments, and the output contract
//! renders it to a real JSON-Schema document for validation.
//!
//! Schemas are written in the agent YAML as ordinary JSON-Schema nodes:
//!
//! ```yaml
//! input_schema:
//!   question:
//!     type: string
//!     description: The question to answer.
//!   attempts:
//!     type: integer
//!     default: 3
//! ```

#[cfg(test)]
mod tests;

use crate::error::{EmissaryError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// The kind of value a schema node describes.
///
/// This is a closed union: coercion dispatches over it with exhaustive
/// matching, so adding a kind is a compile-time-checked change. Unrecognized
/// `type` strings map to [`SchemaKind::Other`]; the declared string itself
/// is preserved on the node and survives re-rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    /// A nested object with declared properties.
    Object,
    /// A sequence, typed positionally and/or by a wildcard element schema.
    Array,
    /// A UTF-8 string.
    String,
    /// A base-10 integer.
    Integer,
    /// A floating-point number.
    Number,
    /// A boolean.
    Boolean,
    /// The JSON null value.
    Null,
    /// Any unrecognized kind; values pass through coercion unchanged.
    Other,
}

impl SchemaKind {
    /// Map a declared `type` string to its kind.
    fn from_name(name: &str) -> SchemaKind {
        match name {
            "object" => SchemaKind::Object,
            "array" => SchemaKind::Array,
            "string" => SchemaKind::String,
            "integer" => SchemaKind::Integer,
            "number" => SchemaKind::Number,
            "boolean" => SchemaKind::Boolean,
            "null" => SchemaKind::Null,
            _ => SchemaKind::Other,
        }
    }
}

/// A single schema node.
///
/// Unknown JSON-Schema keywords are ignored on load; the fields below are
/// the subset the coercer and validator act on.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Schema {
    /// The declared `type` string, if any, kept verbatim so unrecognized
    /// kinds re-render exactly as written. Absent behaves like
    /// [`SchemaKind::Other`].
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    /// Human-readable description, forwarded to MCP clients and the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Declared properties for object nodes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,

    /// Required property names for object nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    /// Literal fallback used when no argument value is supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Wildcard element schema for array nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,

    /// Positional element schemas for array nodes.
    #[serde(rename = "prefixItems", default, skip_serializing_if = "Vec::is_empty")]
    pub prefix_items: Vec<Schema>,

    /// Containment schema for array nodes; takes precedence over `items`
    /// when choosing the wildcard element schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<Box<Schema>>,

    /// Fallback element schema when neither `contains` nor `items` is set.
    #[serde(
        rename = "unevaluatedItems",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub unevaluated_items: Option<Box<Schema>>,
}

impl Schema {
    /// The effective kind of this node.
    pub fn kind(&self) -> SchemaKind {
        self.type_name
            .as_deref()
            .map_or(SchemaKind::Other, SchemaKind::from_name)
    }

    /// Render this node as a JSON-Schema document fragment, `type` strings
    /// preserved verbatim.
    pub fn to_json(&self) -> Value {
        // Serialize of a plain data struct cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// A copy of this node with unrecognized `type` strings removed, for
    /// rendering enforceable validation documents. An unknown kind cannot
    /// be checked, so its node is left unconstrained.
    fn without_unknown_kinds(&self) -> Schema {
        Schema {
            type_name: self
                .type_name
                .clone()
                .filter(|_| self.kind() != SchemaKind::Other),
            description: self.description.clone(),
            properties: self
                .properties
                .iter()
                .map(|(name, prop)| (name.clone(), prop.without_unknown_kinds()))
                .collect(),
            required: self.required.clone(),
            default: self.default.clone(),
            items: self
                .items
                .as_ref()
                .map(|s| Box::new(s.without_unknown_kinds())),
            prefix_items: self
                .prefix_items
                .iter()
                .map(Schema::without_unknown_kinds)
                .collect(),
            contains: self
                .contains
                .as_ref()
                .map(|s| Box::new(s.without_unknown_kinds())),
            unevaluated_items: self
                .unevaluated_items
                .as_ref()
                .map(|s| Box::new(s.without_unknown_kinds())),
        }
    }

    /// Check that a `default` literal, if present, matches this node's own
    /// declared kind, recursing into nested nodes.
    ///
    /// `path` names the node for diagnostics (e.g. `question` or
    /// `report.sections`).
    fn check_defaults(&self, path: &str) -> Result<()> {
        if let Some(default) = &self.default {
            let ok = match self.kind() {
                SchemaKind::Object => default.is_object(),
                SchemaKind::Array => default.is_array(),
                SchemaKind::String => default.is_string(),
                SchemaKind::Integer => default.is_i64() || default.is_u64(),
                SchemaKind::Number => default.is_number(),
                SchemaKind::Boolean => default.is_boolean(),
                SchemaKind::Null => default.is_null(),
                SchemaKind::Other => true,
            };
            if !ok {
                return Err(EmissaryError::ConfigType(format!(
                    "default value does not match the declared type of {path}"
                )));
            }
        }

        for (name, prop) in &self.properties {
            prop.check_defaults(&format!("{path}.{name}"))?;
        }
        for (i, item) in self.prefix_items.iter().enumerate() {
            item.check_defaults(&format!("{path}[{i}]"))?;
        }
        if let Some(items) = &self.items {
            items.check_defaults(&format!("{path}[]"))?;
        }
        if let Some(contains) = &self.contains {
            contains.check_defaults(&format!("{path}[]"))?;
        }
        if let Some(unevaluated) = &self.unevaluated_items {
            unevaluated.check_defaults(&format!("{path}[]"))?;
        }

        Ok(())
    }
}

/// A strict top-level object schema assembled from a declared property map.
///
/// Every declared property is required and additional properties are
/// forbidden. This is the shape both agent contracts (input and output)
/// take: the property map drives coercion, and the rendered JSON document
/// drives validation and MCP tool declarations.
#[derive(Debug, Clone)]
pub struct ObjectSchema {
    properties: BTreeMap<String, Schema>,
    json: Value,
    validation_json: Value,
}

impl ObjectSchema {
    /// Assemble a strict object schema from declared properties.
    ///
    /// Default literals anywhere in the tree are validated against their own
    /// node's kind; a mismatch fails the build with a config error.
    pub fn new(properties: BTreeMap<String, Schema>) -> Result<Self> {
        let mut required = Vec::with_capacity(properties.len());
        let mut rendered = serde_json::Map::new();
        let mut enforceable = serde_json::Map::new();
        for (name, schema) in &properties {
            schema.check_defaults(name)?;
            required.push(name.clone());
            rendered.insert(name.clone(), schema.to_json());
            enforceable.insert(name.clone(), schema.without_unknown_kinds().to_json());
        }

        let json = json!({
            "type": "object",
            "required": required,
            "properties": Value::Object(rendered),
            "additionalProperties": false,
        });
        let validation_json = json!({
            "type": "object",
            "required": json["required"],
            "properties": Value::Object(enforceable),
            "additionalProperties": false,
        });

        Ok(Self {
            properties,
            json,
            validation_json,
        })
    }

    /// The declared property schemas, in name order.
    pub fn properties(&self) -> &BTreeMap<String, Schema> {
        &self.properties
    }

    /// The rendered JSON-Schema document, declared `type` strings intact.
    /// This is what MCP clients and the engine prompt see.
    pub fn as_json(&self) -> &Value {
        &self.json
    }

    /// The enforceable rendering: identical to [`Self::as_json`] except
    /// that nodes with unrecognized kinds carry no `type` keyword, so the
    /// document always compiles as a real JSON Schema.
    pub fn validation_json(&self) -> &Value {
        &self.validation_json
    }
}
