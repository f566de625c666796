//! The `exec` command: run one agent from the command line.

use crate::agent::build::build_agent;
use crate::agent::launch::SubAgentLauncher;
use crate::agent::run::{RunContext, run_agent};
use crate::cli::ExecArgs;
use crate::coerce::{coerce, parse_arguments};
use crate::config::ConfigDocument;
use crate::credentials::resolve_api_key;
use crate::engine::CodexCliEngine;
use crate::error::{EmissaryError, Result};
use crate::events::{Event, EventAction, EventLog};
use crate::format::OpenAiFormatter;
use serde_json::{Value, json};
use std::path::Path;

pub fn cmd_exec(args: ExecArgs) -> Result<()> {
    let log = EventLog::new(args.invocation.log_level);

    let doc = ConfigDocument::load(&args.invocation.config)?;
    let agent = build_agent(&doc, &args.agent)?;
    log.info(
        Event::new(EventAction::AgentBuild)
            .with_agent(&agent.name)
            .with_details(json!({
                "config": args.invocation.config,
                "sub_agents": agent.sub_agents.len(),
            })),
    );

    let tree = parse_arguments(&args.bindings)?;
    let mut input = coerce(&tree, &agent.input_schema)?;

    // Document vars double as prompt variables on the CLI path, but an
    // explicit binding always shadows them.
    if let Some(vars) = &doc.vars {
        for (name, value) in vars {
            input
                .entry(name.clone())
                .or_insert_with(|| Value::String(value.clone()));
        }
    }
    log.info(
        Event::new(EventAction::InputBind)
            .with_agent(&agent.name)
            .with_details(json!({"bindings": args.bindings.len()})),
    );

    let api_key = resolve_api_key(Path::new(&args.invocation.env_file))?;
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

    let ctx = RunContext {
        engine: &engine,
        formatter: &formatter,
        launcher: &launcher,
        log: &log,
    };
    let output = run_agent(&agent, Path::new(&args.invocation.workdir), &input, &ctx)
        .inspect_err(|e| {
            log.error(
                Event::new(EventAction::RunFailed)
                    .with_agent(&agent.name)
                    .with_details(json!({"error": e.to_string()})),
            );
        })?;

    let pretty = serde_json::to_string_pretty(&output)
        .map_err(|e| EmissaryError::InvalidOutputFormat(format!("cannot encode output: {e}")))?;
    println!("{pretty}");
    Ok(())
}
