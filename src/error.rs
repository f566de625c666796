//! Error types for the emissary CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error
//! messages. Every error is value-level and local: the offending path or
//! name is carried in the variant so callers can surface it unchanged.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for emissary operations.
///
/// Each variant maps to a specific exit code. Input binding errors carry
/// the dotted/indexed path of the offending value (e.g. `a.b[2].c`).
#[derive(Error, Debug)]
pub enum EmissaryError {
    /// Bad command-line usage, unreadable files, or missing credentials.
    #[error("{0}")]
    Usage(String),

    /// An agent name was referenced (directly or as a sub-agent) but is not
    /// declared in the config document.
    #[error("no such agent: {0}")]
    NoSuchAgent(String),

    /// A required input property had neither an argument value nor a default.
    #[error("missing required field specified in input_schema: {0}")]
    MissingRequiredField(String),

    /// An argument value was incompatible with the schema node at its path.
    #[error("specified value is incompatible with the input_schema definition: {0}")]
    TypeMismatch(String),

    /// Two argument paths claimed the same point with incompatible shapes.
    #[error("conflicting input values specified in arguments: {0}")]
    ConflictingPath(String),

    /// A build-time config directive had the wrong type.
    #[error("invalid config: {0}")]
    ConfigType(String),

    /// A template failed to compile or render.
    #[error("template error: {0}")]
    Template(String),

    /// Both the direct parse/validate of the answer and the repair call failed.
    #[error("invalid output format: {0}")]
    InvalidOutputFormat(String),

    /// The execution engine or formatter call itself failed.
    #[error("engine error: {0}")]
    Engine(String),
}

impl EmissaryError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            EmissaryError::Usage(_) => exit_codes::USAGE_ERROR,
            EmissaryError::MissingRequiredField(_)
            | EmissaryError::TypeMismatch(_)
            | EmissaryError::ConflictingPath(_) => exit_codes::INPUT_ERROR,
            EmissaryError::NoSuchAgent(_)
            | EmissaryError::ConfigType(_)
            | EmissaryError::Template(_) => exit_codes::BUILD_ERROR,
            EmissaryError::InvalidOutputFormat(_) | EmissaryError::Engine(_) => {
                exit_codes::RUN_ERROR
            }
        }
    }
}

/// Result type alias for emissary operations.
pub type Result<T> = std::result::Result<T, EmissaryError>;
