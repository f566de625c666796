//! CLI argument parsing for emissary.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use crate::events::LogLevel;
use clap::{Args, Parser, Subcommand};

/// Emissary: schema-driven agents over an AI coding engine.
///
/// Agents are declared in a YAML document with typed input and output
/// contracts. Invoke them from the command line with KEY=VALUE arguments,
/// or expose them to MCP clients as tools.
#[derive(Parser, Debug)]
#[command(name = "emissary")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for emissary.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one agent and print its JSON output.
    ///
    /// Arguments after the agent name are KEY=VALUE pairs bound against
    /// the agent's input schema. Dotted keys build nested objects and
    /// repeated keys build arrays.
    Exec(ExecArgs),

    /// Serve declared agents as MCP tools over stdio.
    ///
    /// Each agent becomes one tool whose input schema is the agent's
    /// input contract. Without agent names, every declared agent is
    /// served.
    McpServer(McpServerArgs),

    /// List the agents declared in the config document.
    List(ListArgs),

    /// Store the OpenAI API key used for output repair calls.
    ///
    /// Reads the key from stdin and writes it to the user credentials
    /// file.
    Setup,
}

/// Options shared by every invocation of the engine.
#[derive(Args, Debug)]
pub struct InvocationArgs {
    /// Path to the agent config document.
    #[arg(long, default_value = "agent.yaml")]
    pub config: String,

    /// Working directory for the engine run.
    #[arg(long, default_value = ".")]
    pub workdir: String,

    /// Dotenv-style file consulted for OPENAI_API_KEY.
    #[arg(long, default_value = ".env")]
    pub env_file: String,

    /// Engine command; may carry leading arguments (e.g. "npx codex").
    #[arg(long, default_value = "codex")]
    pub engine_path: String,

    /// Event log verbosity on stderr.
    #[arg(long, value_enum, default_value_t = LogLevel::Off)]
    pub log_level: LogLevel,
}

/// Arguments for the `exec` command.
#[derive(Parser, Debug)]
pub struct ExecArgs {
    #[command(flatten)]
    pub invocation: InvocationArgs,

    /// Agent name to run.
    pub agent: String,

    /// Input bindings as KEY=VALUE pairs.
    pub bindings: Vec<String>,
}

/// Arguments for the `mcp-server` command.
#[derive(Parser, Debug)]
pub struct McpServerArgs {
    #[command(flatten)]
    pub invocation: InvocationArgs,

    /// Agents to serve; all declared agents when omitted.
    pub agents: Vec<String>,
}

/// Arguments for the `list` command.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Path to the agent config document.
    #[arg(long, default_value = "agent.yaml")]
    pub config: String,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_debug_assert() {
        // Verifies the CLI arguments configuration is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_exec_minimal() {
        let cli = Cli::try_parse_from(["emissary", "exec", "summarize"]).unwrap();
        if let Command::Exec(args) = cli.command {
            assert_eq!(args.agent, "summarize");
            assert!(args.bindings.is_empty());
            assert_eq!(args.invocation.config, "agent.yaml");
            assert_eq!(args.invocation.workdir, ".");
            assert_eq!(args.invocation.engine_path, "codex");
            assert_eq!(args.invocation.log_level, LogLevel::Off);
        } else {
            panic!("Expected Exec command");
        }
    }

    #[test]
    fn parse_exec_full() {
        let cli = Cli::try_parse_from([
            "emissary",
            "exec",
            "--config",
            "agents/doc.yaml",
            "--workdir",
            "/tmp/project",
            "--log-level",
            "info",
            "summarize",
            "question=What changed?",
            "report.pages=3",
        ])
        .unwrap();
        if let Command::Exec(args) = cli.command {
            assert_eq!(args.agent, "summarize");
            assert_eq!(args.bindings, vec!["question=What changed?", "report.pages=3"]);
            assert_eq!(args.invocation.config, "agents/doc.yaml");
            assert_eq!(args.invocation.log_level, LogLevel::Info);
        } else {
            panic!("Expected Exec command");
        }
    }

    #[test]
    fn parse_mcp_server_with_agent_filter() {
        let cli = Cli::try_parse_from([
            "emissary",
            "mcp-server",
            "--config",
            "/etc/agents/agent.yaml",
            "helper",
        ])
        .unwrap();
        if let Command::McpServer(args) = cli.command {
            assert_eq!(args.agents, vec!["helper"]);
            assert_eq!(args.invocation.config, "/etc/agents/agent.yaml");
        } else {
            panic!("Expected McpServer command");
        }
    }

    #[test]
    fn parse_mcp_server_without_filter_serves_all() {
        let cli = Cli::try_parse_from(["emissary", "mcp-server"]).unwrap();
        if let Command::McpServer(args) = cli.command {
            assert!(args.agents.is_empty());
        } else {
            panic!("Expected McpServer command");
        }
    }

    #[test]
    fn parse_list_and_setup() {
        let cli = Cli::try_parse_from(["emissary", "list"]).unwrap();
        assert!(matches!(cli.command, Command::List(_)));

        let cli = Cli::try_parse_from(["emissary", "setup"]).unwrap();
        assert!(matches!(cli.command, Command::Setup));
    }
}
