//! The `mcp-server` command: serve agents as MCP tools over stdio.

use crate::agent::build::build_agent;
use crate::agent::launch::SubAgentLauncher;
use crate::agent::run::{RunContext, run_agent};
use crate::cli::McpServerArgs;
use crate::config::ConfigDocument;
use crate::credentials::resolve_api_key;
use crate::engine::CodexCliEngine;
use crate::error::{EmissaryError, Result};
use crate::events::EventLog;
use crate::format::OpenAiFormatter;
use crate::mcp::protocol::ToolDescriptor;
use crate::mcp::server::{McpServer, ToolHandler};
use jsonschema::Draft;
use serde_json::{Map, Value};
use std::path::PathBuf;

pub fn cmd_mcp_server(args: McpServerArgs) -> Result<()> {
    let log = EventLog::new(args.invocation.log_level);
    let doc = ConfigDocument::load(&args.invocation.config)?;

    // Validate the filter eagerly so a bad launch config fails at startup
    // instead of on the first tools/list.
    for name in &args.agents {
        doc.agent(name)?;
    }

    let api_key = resolve_api_key(std::path::Path::new(&args.invocation.env_file))?;
    let program = std::env::current_exe()
        .map_err(|e| EmissaryError::Usage(format!("cannot locate own executable: {e}")))?;
    let launcher = SubAgentLauncher::new(
        program,
        &args.invocation.config,
        &args.invocation.workdir,
        &args.invocation.engine_path,
        api_key.clone(),
    );
    let engine = CodexCliEngine::new(&args.invocation.engine_path)?;
    let formatter = OpenAiFormatter::new(api_key);

    let handler = AgentToolHandler {
        doc,
        served: args.agents,
        workdir: PathBuf::from(&args.invocation.workdir),
        engine,
        formatter,
        launcher,
        log,
    };

    let server = McpServer::new(handler, log);
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    server.serve(stdin.lock(), stdout.lock())
}

/// Tool handler exposing declared agents.
struct AgentToolHandler {
    doc: ConfigDocument,
    /// Agent names to expose; empty means every declared agent.
    served: Vec<String>,
    workdir: PathBuf,
    engine: CodexCliEngine,
    formatter: OpenAiFormatter,
    launcher: SubAgentLauncher,
    log: EventLog,
}

impl AgentToolHandler {
    fn served_names(&self) -> Vec<&str> {
        if self.served.is_empty() {
            self.doc.agents.keys().map(String::as_str).collect()
        } else {
            self.served.iter().map(String::as_str).collect()
        }
    }

    fn is_served(&self, name: &str) -> bool {
        self.served.is_empty() || self.served.iter().any(|served| served == name)
    }
}

impl ToolHandler for AgentToolHandler {
    fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let mut tools = Vec::new();
        for name in self.served_names() {
            let agent = build_agent(&self.doc, name)?;
            tools.push(ToolDescriptor {
                name: agent.name,
                description: (!agent.description.is_empty()).then_some(agent.description),
                input_schema: agent.input_schema.as_json().clone(),
            });
        }
        Ok(tools)
    }

    fn call_tool(&self, name: &str, arguments: &Map<String, Value>) -> Result<Value> {
        if !self.is_served(name) {
            return Err(EmissaryError::NoSuchAgent(name.to_string()));
        }
        let agent = build_agent(&self.doc, name)?;

        // MCP arguments arrive typed; no textual coercion, but they must
        // still satisfy the input contract.
        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(agent.input_schema.validation_json())
            .map_err(|e| {
                EmissaryError::ConfigType(format!("input schema does not compile: {e}"))
            })?;
        if let Some(error) = validator
            .iter_errors(&Value::Object(arguments.clone()))
            .next()
        {
            return Err(EmissaryError::TypeMismatch(error.to_string()));
        }

        // Document vars double as prompt variables here too, shadowed by
        // any argument of the same name.
        let mut input = arguments.clone();
        if let Some(vars) = &self.doc.vars {
            for (name, value) in vars {
                input
                    .entry(name.clone())
                    .or_insert_with(|| Value::String(value.clone()));
            }
        }

        let ctx = RunContext {
            engine: &self.engine,
            formatter: &self.formatter,
            launcher: &self.launcher,
            log: &self.log,
        };
        run_agent(&agent, &self.workdir, &input, &ctx)
    }
}
