//! Synchronous stdio MCP server loop.
//!
//! One JSON-RPC message per line on stdin, one response per line on stdout.
//! Tool semantics live behind [`ToolHandler`]; the loop only speaks the
//! protocol. Handler failures become tool-level results (`isError: true`),
//! never protocol errors, so a misbehaving agent cannot wedge the session.

use crate::error::Result;
use crate::events::{Event, EventAction, EventLog};
use crate::mcp::protocol::{
    CallToolParams, CallToolResult, Implementation, IncomingMessage, InitializeResult,
    JsonRpcResponse, ListToolsResult, PROTOCOL_VERSION, RequestId, ServerCapabilities,
    ToolDescriptor, ToolsCapability, INVALID_PARAMS, METHOD_NOT_FOUND, PARSE_ERROR,
};
use serde_json::{Map, Value, json};
use std::io::{BufRead, Write};

/// The tools a server session exposes.
pub trait ToolHandler {
    /// Descriptors for every exposed tool.
    fn list_tools(&self) -> Result<Vec<ToolDescriptor>>;

    /// Invoke one tool with already-typed JSON arguments.
    fn call_tool(&self, name: &str, arguments: &Map<String, Value>) -> Result<Value>;
}

/// A stdio MCP server bound to one tool handler.
pub struct McpServer<H> {
    handler: H,
    log: EventLog,
}

impl<H: ToolHandler> McpServer<H> {
    pub fn new(handler: H, log: EventLog) -> Self {
        Self { handler, log }
    }

    /// Serve until the input stream ends.
    pub fn serve(&self, input: impl BufRead, mut output: impl Write) -> Result<()> {
        for line in input.lines() {
            let line = line.map_err(|e| {
                crate::error::EmissaryError::Usage(format!("cannot read protocol stream: {e}"))
            })?;
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(&line) {
                let encoded = serde_json::to_string(&response).map_err(|e| {
                    crate::error::EmissaryError::Usage(format!("cannot encode response: {e}"))
                })?;
                writeln!(output, "{encoded}").map_err(|e| {
                    crate::error::EmissaryError::Usage(format!("cannot write response: {e}"))
                })?;
                output.flush().ok();
            }
        }
        Ok(())
    }

    /// Handle one raw line; `None` means no response is owed.
    fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let message: IncomingMessage = match serde_json::from_str(line) {
            Ok(message) => message,
            Err(e) => {
                return Some(JsonRpcResponse::failure(
                    RequestId::Null,
                    PARSE_ERROR,
                    format!("invalid JSON-RPC message: {e}"),
                ));
            }
        };

        self.log.debug(
            Event::new(EventAction::McpRequest).with_details(json!({"method": message.method})),
        );

        let Some(id) = message.id else {
            // Notifications (e.g. notifications/initialized) get no reply.
            return None;
        };

        Some(match message.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.initialize_result()),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.list_tools(id),
            "tools/call" => self.call_tool(id, message.params),
            other => JsonRpcResponse::failure(
                id,
                METHOD_NOT_FOUND,
                format!("method not supported: {other}"),
            ),
        })
    }

    fn initialize_result(&self) -> Value {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: None }),
            },
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };
        serde_json::to_value(result).unwrap_or(Value::Null)
    }

    fn list_tools(&self, id: RequestId) -> JsonRpcResponse {
        match self.handler.list_tools() {
            Ok(tools) => match serde_json::to_value(ListToolsResult { tools }) {
                Ok(result) => JsonRpcResponse::success(id, result),
                Err(e) => JsonRpcResponse::failure(id, INVALID_PARAMS, e.to_string()),
            },
            Err(e) => JsonRpcResponse::failure(id, INVALID_PARAMS, e.to_string()),
        }
    }

    fn call_tool(&self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        let params: CallToolParams = match params.map(serde_json::from_value).transpose() {
            Ok(Some(params)) => params,
            Ok(None) => {
                return JsonRpcResponse::failure(id, INVALID_PARAMS, "missing params");
            }
            Err(e) => {
                return JsonRpcResponse::failure(id, INVALID_PARAMS, format!("bad params: {e}"));
            }
        };

        let arguments = match params.arguments {
            None => Map::new(),
            Some(Value::Object(map)) => map.into_iter().collect(),
            Some(_) => {
                return JsonRpcResponse::failure(
                    id,
                    INVALID_PARAMS,
                    "arguments must be an object",
                );
            }
        };

        let result = match self.handler.call_tool(&params.name, &arguments) {
            Ok(value) => CallToolResult::text(value.to_string()),
            Err(e) => {
                self.log.error(
                    Event::new(EventAction::RunFailed)
                        .with_agent(&params.name)
                        .with_details(json!({"error": e.to_string()})),
                );
                CallToolResult::error(e.to_string())
            }
        };

        match serde_json::to_value(result) {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => JsonRpcResponse::failure(id, INVALID_PARAMS, e.to_string()),
        }
    }
}
