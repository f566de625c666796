//! One agent invocation, from typed input to conforming output.
//!
//! The sequencing layer around the core: render the prompt from the coerced
//! input, hand it to the execution engine with the resolved policy, then
//! force the raw answer through the output contract. Sub-agents are not run
//! here — each link only contributes its MCP server launch config to the
//! engine settings.

use crate::agent::AgentDefinition;
use crate::agent::launch::{SubAgentLauncher, absolute};
use crate::engine::{EngineRequest, ExecutionEngine};
use crate::error::{EmissaryError, Result};
use crate::events::{Event, EventAction, EventLog};
use crate::format::OutputFormatter;
use crate::output::OutputContract;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::path::Path;

/// Collaborators shared by every invocation in one process.
pub struct RunContext<'a> {
    /// The execution engine.
    pub engine: &'a dyn ExecutionEngine,
    /// The repair-path formatter.
    pub formatter: &'a dyn OutputFormatter,
    /// Launch config factory for sub-agent MCP servers.
    pub launcher: &'a SubAgentLauncher,
    /// Event sink.
    pub log: &'a EventLog,
}

/// Run one agent invocation and return the conforming output value.
///
/// `input` must already satisfy the agent's input schema (coerced from
/// KEY=VALUE arguments on the CLI path, or typed JSON on the MCP path).
pub fn run_agent(
    agent: &AgentDefinition,
    workdir: &Path,
    input: &Map<String, Value>,
    ctx: &RunContext<'_>,
) -> Result<Value> {
    let workdir = absolute(workdir)?;

    // Engine settings for this run: the agent's merged config, sub-agent
    // server entries, and a guard against the engine reading project docs.
    let mut engine_config = agent.engine_config.clone();
    for link in &agent.sub_agents {
        engine_config.insert(
            format!("mcp_servers.{}", link.name),
            ctx.launcher.server_config(link)?,
        );
    }
    engine_config.insert("project_doc_max_bytes".to_string(), json!(0));

    let prompt = render_prompt(agent, input)?;

    ctx.log.info(
        Event::new(EventAction::EngineInvoke)
            .with_agent(&agent.name)
            .with_details(json!({
                "workdir": workdir.to_string_lossy(),
                "sandbox": agent.sandbox,
                "approval_policy": agent.approval_policy,
                "sub_agents": agent.sub_agents.len(),
            })),
    );

    let raw = ctx.engine.invoke(&EngineRequest {
        prompt,
        instruction: agent.instruction.clone(),
        use_base_instructions: agent.use_base_instructions,
        workdir,
        approval_policy: agent.approval_policy.clone(),
        sandbox: agent.sandbox.clone(),
        config: engine_config,
    })?;

    let contract = OutputContract::new(&agent.output_schema)?;
    let conformed = contract.conform(&raw, ctx.formatter)?;
    if conformed.repaired {
        ctx.log.info(
            Event::new(EventAction::OutputRepair)
                .with_agent(&agent.name)
                .with_details(json!({"raw_len": raw.trim().len()})),
        );
    }

    ctx.log.info(Event::new(EventAction::RunComplete).with_agent(&agent.name));
    Ok(conformed.value)
}

/// Render the prompt template with the input, then append the output
/// schema directive.
///
/// The engine cannot be hard-constrained, so the directive asks in prose;
/// the output contract provides the real guarantee afterwards.
fn render_prompt(agent: &AgentDefinition, input: &Map<String, Value>) -> Result<String> {
    let mut vars = BTreeMap::new();
    for (name, value) in input {
        vars.insert(name.clone(), variable_text(value));
    }

    let rendered = agent
        .prompt_template
        .render(&vars)
        .map_err(|e| EmissaryError::Template(format!("prompt_template: {e}")))?;

    let schema = serde_json::to_string(agent.output_schema.as_json())
        .map_err(|e| EmissaryError::Engine(format!("cannot serialize output schema: {e}")))?;

    Ok(format!(
        "{rendered}\n\nThe answer must strictly follow this JSON Schema:\n{schema}\n"
    ))
}

/// Stringify one input value for template substitution.
///
/// Strings substitute verbatim; everything else substitutes as JSON.
fn variable_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
