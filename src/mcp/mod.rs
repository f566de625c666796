//! MCP tool server: declared agents exposed as typed tools over stdio.

pub mod protocol;
pub mod server;

#[cfg(test)]
mod tests;
