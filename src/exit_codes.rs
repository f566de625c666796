//! Exit code constants for the emissary CLI.
//!
//! - 0: Success
//! - 1: Usage error (bad args, missing credentials)
//! - 2: Input binding failure (arguments did not satisfy the input schema)
//! - 3: Build failure (unknown agent, bad config, bad template)
//! - 4: Run failure (engine call or output conformance failed)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// Usage error: bad arguments, unreadable files, or missing credentials.
pub const USAGE_ERROR: i32 = 1;

/// Input binding failure: KEY=VALUE arguments did not satisfy the input schema.
pub const INPUT_ERROR: i32 = 2;

/// Build failure: unknown agent, malformed config directive, or template error.
pub const BUILD_ERROR: i32 = 3;

/// Run failure: engine invocation failed or output could not be conformed.
pub const RUN_ERROR: i32 = 4;
