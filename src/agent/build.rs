//! Agent builder: from declared config layers to a runnable definition.
//!
//! Building is a sequence of total steps over the declared spec: merge
//! engine settings, resolve policies, extract build-time directives, fold
//! MCP servers, resolve sub-agents, substitute global vars, and compile the
//! prompt template. Any failure aborts the build; nothing is cached across
//! invocations.

use crate::agent::{
    AgentDefinition, DEFAULT_APPROVAL_POLICY, DEFAULT_SANDBOX, DEFAULT_TIMEOUT_SEC, SubAgentLink,
};
use crate::config::{ConfigDocument, EngineConfig};
use crate::error::{EmissaryError, Result};
use crate::schema::ObjectSchema;
use crate::template::{Template, render_template};
use serde_json::Value;
use std::collections::BTreeMap;

/// Engine config key extracted at build time rather than forwarded.
const USE_BASE_INSTRUCTIONS_KEY: &str = "use_base_instructions";

/// Build the named agent from a config document.
///
/// The global engine config layer is deep-copied before the agent layer is
/// overlaid, so two agents built from the same document never alias each
/// other's settings. Sub-agent references are resolved eagerly: an unknown
/// name fails the build before any template work happens.
pub fn build_agent(doc: &ConfigDocument, name: &str) -> Result<AgentDefinition> {
    let spec = doc.agent(name)?;

    // Merge engine settings; agent-level keys win over global-level keys.
    let mut engine_config: EngineConfig = doc.config.clone();
    for (key, value) in &spec.config {
        engine_config.insert(key.clone(), value.clone());
    }

    let approval_policy = if spec.approval_policy.is_empty() {
        DEFAULT_APPROVAL_POLICY.to_string()
    } else {
        spec.approval_policy.clone()
    };

    let sandbox = if spec.sandbox.is_empty() {
        DEFAULT_SANDBOX.to_string()
    } else {
        spec.sandbox.clone()
    };

    // use_base_instructions is a build-time directive, not an engine setting.
    let use_base_instructions = match engine_config.remove(USE_BASE_INSTRUCTIONS_KEY) {
        None => true,
        Some(Value::Bool(enabled)) => enabled,
        Some(_) => {
            return Err(EmissaryError::ConfigType(
                "use_base_instructions must be a boolean".to_string(),
            ));
        }
    };

    // Declared MCP servers become ordinary nested engine settings.
    for (server_name, server_config) in &spec.mcp_servers {
        let nested: serde_json::Map<String, Value> = server_config
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        engine_config.insert(format!("mcp_servers.{server_name}"), Value::Object(nested));
    }

    // Sub-agent references are validated eagerly, before template rendering.
    let mut sub_agents = Vec::with_capacity(spec.sub_agents.len());
    for sub_name in &spec.sub_agents {
        let sub_spec = doc.agent(sub_name)?;
        let timeout_sec = if sub_spec.timeout_sec == 0 {
            DEFAULT_TIMEOUT_SEC
        } else {
            sub_spec.timeout_sec
        };
        sub_agents.push(SubAgentLink {
            name: sub_name.clone(),
            timeout_sec,
        });
    }

    // Global vars substitute into description and instruction. When no vars
    // are configured the fields pass through verbatim, without even being
    // template-parsed.
    let (description, instruction) = match &doc.vars {
        Some(vars) => (
            render_field("description", &spec.description, vars)?,
            render_field("instruction", &spec.instruction, vars)?,
        ),
        None => (spec.description.clone(), spec.instruction.clone()),
    };

    let prompt_template = Template::compile(&spec.prompt_template)
        .map_err(|e| EmissaryError::Template(format!("prompt_template: {e}")))?;

    let input_schema = ObjectSchema::new(spec.input_schema.clone())?;
    let output_schema = ObjectSchema::new(spec.output_schema.clone())?;

    Ok(AgentDefinition {
        name: name.to_string(),
        description,
        instruction,
        prompt_template,
        input_schema,
        output_schema,
        approval_policy,
        sandbox,
        use_base_instructions,
        engine_config,
        sub_agents,
    })
}

/// Render a vars-substituted prose field, naming the field on failure.
fn render_field(field: &str, text: &str, vars: &BTreeMap<String, String>) -> Result<String> {
    render_template(text, vars).map_err(|e| EmissaryError::Template(format!("{field}: {e}")))
}
