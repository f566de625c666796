//! Event logging for emissary.
//!
//! Invocation lifecycle events are emitted as NDJSON (one JSON object per
//! line) on stderr, gated by the `--log-level` flag. Stdout stays reserved
//! for the agent's JSON output and the MCP protocol stream.
//!
//! # Event Format
//!
//! - `ts`: RFC3339 timestamp
//! - `level`: error, info, or debug
//! - `action`: the lifecycle step (agent_build, engine_invoke, ...)
//! - `actor`: the invoking user (`user@HOST`)
//! - `agent`: optional agent name
//! - `details`: freeform object with action-specific details

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Verbosity gate for event logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, ValueEnum)]
pub enum LogLevel {
    /// No events at all.
    #[default]
    Off,
    /// Failures only.
    Error,
    /// Lifecycle milestones.
    Info,
    /// Everything, including engine request details.
    Debug,
}

/// Lifecycle steps that can be logged as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// Agent definition resolved from the config document.
    AgentBuild,
    /// Arguments bound against the input schema.
    InputBind,
    /// Execution engine called.
    EngineInvoke,
    /// Raw answer did not conform; repair call issued.
    OutputRepair,
    /// Invocation finished with a conforming value.
    RunComplete,
    /// MCP request handled.
    McpRequest,
    /// Invocation failed.
    RunFailed,
}

/// An event record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// RFC3339 timestamp when the event occurred.
    pub ts: DateTime<Utc>,

    /// Severity this event was logged at.
    pub level: String,

    /// The lifecycle step.
    pub action: EventAction,

    /// The invoking user (e.g. `user@HOST`).
    pub actor: String,

    /// Agent name, when the event concerns one agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,

    /// Freeform details object with action-specific information.
    pub details: Value,
}

impl Event {
    /// Create a new event with the given action.
    pub fn new(action: EventAction) -> Self {
        Self {
            ts: Utc::now(),
            level: String::new(),
            action,
            actor: actor_string(),
            agent: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Set the agent name for this event.
    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    /// Set the details object for this event.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

/// A leveled NDJSON event sink writing to stderr.
#[derive(Debug, Clone, Copy)]
pub struct EventLog {
    level: LogLevel,
}

impl EventLog {
    /// Create a log that emits events at or below `level`.
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }

    /// Log a failure event.
    pub fn error(&self, event: Event) {
        self.emit(LogLevel::Error, "error", event);
    }

    /// Log a lifecycle milestone.
    pub fn info(&self, event: Event) {
        self.emit(LogLevel::Info, "info", event);
    }

    /// Log a detail event.
    pub fn debug(&self, event: Event) {
        self.emit(LogLevel::Debug, "debug", event);
    }

    fn emit(&self, at: LogLevel, label: &str, mut event: Event) {
        if self.level < at {
            return;
        }
        event.level = label.to_string();
        if let Ok(line) = serde_json::to_string(&event) {
            eprintln!("{line}");
        }
    }
}

/// Determine the actor string as `user@HOST`.
fn actor_string() -> String {
    let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    let host = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string());
    format!("{user}@{host}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn log_levels_order_from_off_to_debug() {
        assert!(LogLevel::Off < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Debug);
    }

    #[test]
    fn events_serialize_as_single_json_objects() {
        let event = Event::new(EventAction::EngineInvoke)
            .with_agent("summarize")
            .with_details(json!({"sandbox": "read-only"}));
        let line = serde_json::to_string(&event).unwrap();

        let parsed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["action"], "engine_invoke");
        assert_eq!(parsed["agent"], "summarize");
        assert_eq!(parsed["details"]["sandbox"], "read-only");
        assert!(parsed["actor"].as_str().unwrap().contains('@'));
    }

    #[test]
    fn agentless_events_omit_the_agent_field() {
        let event = Event::new(EventAction::McpRequest);
        let line = serde_json::to_string(&event).unwrap();
        let parsed: Value = serde_json::from_str(&line).unwrap();
        assert!(parsed.get("agent").is_none());
    }
}
