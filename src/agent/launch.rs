//! Sub-agent MCP server launch configuration.
//!
//! Sub-agents are not run in-process: each resolved link is turned into the
//! launch configuration for a separate `mcp-server` process serving that
//! one agent, and handed to the engine as an ordinary MCP server setting.
//! The engine's transport layer starts the process on demand.

use crate::agent::SubAgentLink;
use crate::error::{EmissaryError, Result};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

/// Seconds the engine waits for a sub-agent server to start.
const STARTUP_TIMEOUT_SEC: u64 = 30;

/// Produces per-link launch configs for sub-agent MCP servers.
#[derive(Debug, Clone)]
pub struct SubAgentLauncher {
    /// Executable to launch (normally the current binary).
    program: PathBuf,
    /// Config document path, passed through so the child sees the same
    /// declarations.
    config_path: PathBuf,
    /// Working directory for the child server.
    workdir: PathBuf,
    /// Engine command forwarded to the child.
    engine_path: String,
    /// API key exported to the child's environment, when known.
    api_key: Option<String>,
}

impl SubAgentLauncher {
    /// Create a launcher for the given invocation context.
    pub fn new(
        program: PathBuf,
        config_path: impl AsRef<Path>,
        workdir: impl AsRef<Path>,
        engine_path: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            program,
            config_path: config_path.as_ref().to_path_buf(),
            workdir: workdir.as_ref().to_path_buf(),
            engine_path: engine_path.into(),
            api_key,
        }
    }

    /// Build the MCP server launch config for one sub-agent link.
    ///
    /// Paths are absolutized so the child is insensitive to the engine's
    /// own working directory.
    pub fn server_config(&self, link: &SubAgentLink) -> Result<Value> {
        let config_path = absolute(&self.config_path)?;
        let workdir = absolute(&self.workdir)?;

        let mut config = json!({
            "command": self.program.to_string_lossy(),
            "args": [
                "mcp-server",
                "--config",
                config_path.to_string_lossy(),
                "--workdir",
                workdir.to_string_lossy(),
                "--engine-path",
                self.engine_path,
                link.name,
            ],
            "startup_timeout_sec": STARTUP_TIMEOUT_SEC,
            "tool_timeout_sec": link.timeout_sec,
        });

        if let Some(api_key) = &self.api_key {
            config["env"] = json!({ "OPENAI_API_KEY": api_key });
        }

        Ok(config)
    }
}

/// Absolutize a path against the current directory without requiring it to
/// exist.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path)
        .map_err(|e| EmissaryError::Usage(format!("cannot resolve path '{}': {e}", path.display())))
}
