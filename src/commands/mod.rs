//! Command implementations for emissary.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations.

mod exec;
mod list;
mod mcp_server;
mod setup;

use crate::cli::Command;
use crate::error::Result;

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Exec(args) => exec::cmd_exec(args),
        Command::McpServer(args) => mcp_server::cmd_mcp_server(args),
        Command::List(args) => list::cmd_list(args),
        Command::Setup => setup::cmd_setup(),
    }
}
