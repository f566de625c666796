//! Resolved agent definitions and the invocation pipeline.
//!
//! An [`AgentDefinition`] is the fully resolved, runnable form of one
//! declared agent: config layers merged, policies defaulted, sub-agent
//! references checked, templates compiled, and contracts assembled. It is
//! built fresh per invocation by [`build::build_agent`] and never mutated
//! afterwards.

pub mod build;
pub mod launch;
pub mod run;


use crate::config::EngineConfig;
use crate::schema::ObjectSchema;
use crate::template::Template;

/// Default approval policy when an agent declares none.
pub const DEFAULT_APPROVAL_POLICY: &str = "never";

/// Default sandbox mode when an agent declares none.
pub const DEFAULT_SANDBOX: &str = "read-only";

/// Default sub-agent tool timeout in seconds.
pub const DEFAULT_TIMEOUT_SEC: u64 = 1800;

/// An immutable, runnable agent definition.
#[derive(Debug)]
pub struct AgentDefinition {
    /// Unique agent name; also the tool name when exposed over MCP.
    pub name: String,
    /// Tool description shown to MCP clients, vars-substituted.
    pub description: String,
    /// System-level directive for the execution engine, vars-substituted.
    pub instruction: String,
    /// Compiled prompt template, rendered per invocation with the input.
    pub prompt_template: Template,
    /// Strict input contract.
    pub input_schema: ObjectSchema,
    /// Strict output contract.
    pub output_schema: ObjectSchema,
    /// Resolved approval policy (never defaulted away from empty).
    pub approval_policy: String,
    /// Resolved sandbox mode.
    pub sandbox: String,
    /// Whether the engine should keep its built-in base instructions.
    pub use_base_instructions: bool,
    /// Merged engine settings (global layer overlaid with agent layer and
    /// declared MCP servers), without build-time directives.
    pub engine_config: EngineConfig,
    /// Resolved sub-agent links in declaration order, duplicates preserved.
    pub sub_agents: Vec<SubAgentLink>,
}

/// A resolved reference to another declared agent, exposed as a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubAgentLink {
    /// The sub-agent's name in the same config document.
    pub name: String,
    /// Tool timeout in seconds, defaulted to [`DEFAULT_TIMEOUT_SEC`].
    pub timeout_sec: u64,
}
