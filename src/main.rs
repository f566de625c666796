//! Emissary: schema-driven agents over an AI coding engine.
//!
//! This is the main entry point for the `emissary` CLI. It parses
//! arguments, dispatches to the appropriate command handler, and handles
//! errors with proper exit codes.

mod cli;
mod commands;
pub mod agent;
pub mod coerce;
pub mod config;
pub mod credentials;
pub mod engine;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod format;
pub mod mcp;
pub mod output;
pub mod schema;
pub mod template;

use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match commands::dispatch(cli.command) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
