//! Execution engine interface and the Codex CLI implementation.
//!
//! The engine is an opaque collaborator: it accepts a rendered prompt plus
//! an execution policy and returns free text. Nothing in this crate depends
//! on how the text was produced, so the seam is a trait and the default
//! implementation shells out to the `codex` CLI.

use crate::config::EngineConfig;
use crate::error::{EmissaryError, Result};
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Everything the engine needs for one invocation.
#[derive(Debug, Clone)]
pub struct EngineRequest {
    /// The fully rendered prompt, including the output schema directive.
    pub prompt: String,
    /// System-level directive for the engine.
    pub instruction: String,
    /// Whether the engine should keep its built-in base instructions.
    pub use_base_instructions: bool,
    /// Absolute working directory for the run.
    pub workdir: PathBuf,
    /// Approval policy: untrusted, on-failure, on-request, or never.
    pub approval_policy: String,
    /// Sandbox mode: read-only, workspace-write, or danger-full-access.
    pub sandbox: String,
    /// Merged engine settings, including sub-agent MCP server entries.
    pub config: EngineConfig,
}

/// An opaque capability that turns a prompt plus policy into free text.
pub trait ExecutionEngine {
    /// Run the engine synchronously and return the raw textual answer.
    fn invoke(&self, request: &EngineRequest) -> Result<String>;
}

/// Engine implementation that shells out to the Codex CLI.
///
/// The engine command is configurable (`--engine-path`) and may carry its
/// own leading arguments (e.g. `npx codex`); it is split with shell
/// quoting rules.
#[derive(Debug, Clone)]
pub struct CodexCliEngine {
    program: String,
    args: Vec<String>,
}

impl CodexCliEngine {
    /// Create an engine from a command string.
    pub fn new(command: &str) -> Result<Self> {
        let mut parts = shell_words::split(command)
            .map_err(|e| EmissaryError::Usage(format!("invalid engine command '{command}': {e}")))?;
        if parts.is_empty() {
            return Err(EmissaryError::Usage(
                "engine command must not be empty".to_string(),
            ));
        }
        let program = parts.remove(0);
        Ok(Self {
            program,
            args: parts,
        })
    }

    /// Build the full argument list for one request.
    ///
    /// Config values are forwarded as `-c key=<json>` overrides; the final
    /// agent answer is collected through `--output-last-message` so engine
    /// progress chatter on stdout never pollutes the raw answer.
    fn build_args(&self, request: &EngineRequest, last_message_path: &std::path::Path) -> Vec<String> {
        let mut args = self.args.clone();
        args.extend([
            "exec".to_string(),
            "--skip-git-repo-check".to_string(),
            "--cd".to_string(),
            request.workdir.to_string_lossy().into_owned(),
            "--sandbox".to_string(),
            request.sandbox.clone(),
            "--ask-for-approval".to_string(),
            request.approval_policy.clone(),
            "--output-last-message".to_string(),
            last_message_path.to_string_lossy().into_owned(),
        ]);

        if !request.instruction.is_empty() {
            args.push("-c".to_string());
            args.push(format!(
                "developer_instructions={}",
                serde_json::Value::String(request.instruction.clone())
            ));
        }
        if !request.use_base_instructions {
            args.push("-c".to_string());
            args.push("include_base_instructions=false".to_string());
        }

        for (key, value) in &request.config {
            args.push("-c".to_string());
            args.push(format!("{key}={value}"));
        }

        // Prompt read from stdin.
        args.push("-".to_string());
        args
    }
}

impl ExecutionEngine for CodexCliEngine {
    fn invoke(&self, request: &EngineRequest) -> Result<String> {
        let last_message = tempfile::NamedTempFile::new()
            .map_err(|e| EmissaryError::Engine(format!("cannot create answer file: {e}")))?;

        let args = self.build_args(request, last_message.path());

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                EmissaryError::Engine(format!(
                    "failed to start engine '{}': {e}\n\
                     Fix: ensure the engine is installed and in PATH, or pass --engine-path.",
                    self.program
                ))
            })?;

        // Drain stderr on its own thread while the prompt is written. With
        // both pipes serviced from one thread, a prompt and a stderr stream
        // that each exceed the pipe buffer deadlock against each other.
        let stderr_reader = child.stderr.take().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut output = String::new();
                // Best effort; a failed read just leaves the diagnostics empty.
                let _ = stderr.read_to_string(&mut output);
                output
            })
        });

        if let Some(stdin) = child.stdin.take() {
            use std::io::Write;
            let mut stdin = stdin;
            stdin
                .write_all(request.prompt.as_bytes())
                .map_err(|e| EmissaryError::Engine(format!("failed to send prompt: {e}")))?;
        }

        let status = child
            .wait()
            .map_err(|e| EmissaryError::Engine(format!("failed to wait for engine: {e}")))?;

        let stderr_output = stderr_reader
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default();
        if !status.success() {
            let trailer = last_lines(&stderr_output, 5);
            return Err(EmissaryError::Engine(format!(
                "engine exited with {status}: {trailer}"
            )));
        }

        std::fs::read_to_string(last_message.path())
            .map_err(|e| EmissaryError::Engine(format!("cannot read engine answer: {e}")))
    }
}

/// The last `n` non-empty lines of text, joined for a one-line diagnostic.
fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join(" / ")
}
