//! Configuration model for emissary.
//!
//! This module defines the agent config document (`agent.yaml` by default):
//! a mapping of agent name to declared agent settings, plus optional global
//! engine settings and template variables. Parsing is forward-compatible
//! (unknown fields are ignored) and every field has a sensible default.
//!
//! # File Format
//!
//! ```yaml
//! config:
//!   model: o4-mini
//!
//! vars:
//!   product: emissary
//!
//! agents:
//!   summarize:
//!     description: Summarize a document about {product}.
//!     instruction: You are a careful technical writer.
//!     prompt_template: "Summarize the following text: {text}"
//!     input_schema:
//!       text:
//!         type: string
//!     output_schema:
//!       summary:
//!         type: string
//!     approval_policy: never
//!     sandbox: read-only
//!     timeout_sec: 600
//!     sub_agents:
//!       - fact-check
//! ```


use crate::error::{EmissaryError, Result};
use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Opaque engine settings, passed through to the execution engine.
///
/// Keys at the agent level deep-override the same keys at the global level.
/// `serde_json::Value` clones are deep, so merged maps never alias the
/// layers they were built from.
pub type EngineConfig = BTreeMap<String, Value>;

/// The whole agent configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigDocument {
    /// Engine settings applied to every agent in this document.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub config: EngineConfig,

    /// Global template variables substituted into agent descriptions and
    /// instructions. Absent and empty are distinct: when absent, those
    /// fields pass through verbatim without any template parsing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vars: Option<BTreeMap<String, String>>,

    /// Declared agents, keyed by name. The key is also the MCP tool name
    /// and the name sub_agents lists refer to.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub agents: BTreeMap<String, AgentSpec>,
}

/// Raw declared form of one agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSpec {
    /// Shown to MCP clients as the tool description when this agent is
    /// exposed as a tool or called as a sub-agent.
    pub description: String,

    /// System-level directive for the execution engine.
    pub instruction: String,

    /// Prompt template; input schema properties fill its placeholders.
    pub prompt_template: String,

    /// Input contract: property name to schema node. Every property is
    /// required at the top level (defaults satisfy the requirement).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub input_schema: BTreeMap<String, Schema>,

    /// Output contract, same shape as `input_schema`.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub output_schema: BTreeMap<String, Schema>,

    /// When the engine asks for user approval: untrusted, on-failure,
    /// on-request, or never. Empty resolves to never.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub approval_policy: String,

    /// Engine sandbox mode: read-only, workspace-write, or
    /// danger-full-access. Empty resolves to read-only.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sandbox: String,

    /// Tool timeout in seconds when this agent runs as a sub-agent.
    /// Zero resolves to the 1800-second default.
    #[serde(skip_serializing_if = "is_zero")]
    pub timeout_sec: u64,

    /// Extra MCP servers for this agent, folded into the engine settings
    /// under `mcp_servers.<name>`.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub mcp_servers: BTreeMap<String, EngineConfig>,

    /// Names of other agents in this document exposed to this agent as
    /// callable tools. Declaration order is preserved.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_agents: Vec<String>,

    /// Engine settings applied to this agent only.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub config: EngineConfig,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

impl ConfigDocument {
    /// Load a config document from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            EmissaryError::Usage(format!(
                "failed to read agent config '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse a config document from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| EmissaryError::Usage(format!("invalid agent config: {e}")))
    }

    /// Look up a declared agent by name.
    pub fn agent(&self, name: &str) -> Result<&AgentSpec> {
        self.agents
            .get(name)
            .ok_or_else(|| EmissaryError::NoSuchAgent(name.to_string()))
    }
}
