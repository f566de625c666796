//! Payload-driven tests for the stdio server loop.

use crate::error::{EmissaryError, Result};
use crate::events::{EventLog, LogLevel};
use crate::mcp::protocol::{METHOD_NOT_FOUND, PARSE_ERROR, ToolDescriptor};
use crate::mcp::server::{McpServer, ToolHandler};
use serde_json::{Map, Value, json};

/// Handler double exposing one echo tool.
struct EchoHandler;

impl ToolHandler for EchoHandler {
    fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        Ok(vec![ToolDescriptor {
            name: "echo".to_string(),
            description: Some("Echo the input back.".to_string()),
            input_schema: json!({"type": "object"}),
        }])
    }

    fn call_tool(&self, name: &str, arguments: &Map<String, Value>) -> Result<Value> {
        match name {
            "echo" => Ok(json!({"echoed": Value::Object(arguments.clone())})),
            other => Err(EmissaryError::NoSuchAgent(other.to_string())),
        }
    }
}

/// Drive the server with raw input lines and collect parsed response lines.
fn drive(input: &str) -> Vec<Value> {
    let server = McpServer::new(EchoHandler, EventLog::new(LogLevel::Off));
    let mut output = Vec::new();
    server.serve(input.as_bytes(), &mut output).unwrap();
    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn initialize_advertises_tools_capability() {
    let responses = drive(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#);

    assert_eq!(responses.len(), 1);
    let result = &responses[0]["result"];
    assert_eq!(result["protocolVersion"], "2024-11-05");
    assert!(result["capabilities"]["tools"].is_object());
    assert_eq!(result["serverInfo"]["name"], env!("CARGO_PKG_NAME"));
}

#[test]
fn initialized_notification_gets_no_response() {
    let responses = drive(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#);
    assert!(responses.is_empty());
}

#[test]
fn ping_answers_with_an_empty_object() {
    let responses = drive(r#"{"jsonrpc":"2.0","id":"p","method":"ping"}"#);
    assert_eq!(responses[0]["id"], "p");
    assert_eq!(responses[0]["result"], json!({}));
}

#[test]
fn tools_list_carries_descriptors() {
    let responses = drive(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#);

    let tools = responses[0]["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["name"], "echo");
    assert_eq!(tools[0]["inputSchema"]["type"], "object");
}

#[test]
fn tools_call_returns_the_value_as_text_content() {
    let responses = drive(
        r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"echo","arguments":{"q":"hi"}}}"#,
    );

    let result = &responses[0]["result"];
    assert_eq!(result["isError"], json!(false));
    let text = result["content"][0]["text"].as_str().unwrap();
    let decoded: Value = serde_json::from_str(text).unwrap();
    assert_eq!(decoded, json!({"echoed": {"q": "hi"}}));
}

#[test]
fn handler_failure_becomes_a_tool_error_not_a_protocol_error() {
    let responses = drive(
        r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"ghost","arguments":{}}}"#,
    );

    let result = &responses[0]["result"];
    assert_eq!(result["isError"], json!(true));
    assert!(
        result["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("ghost")
    );
    assert!(responses[0].get("error").is_none());
}

#[test]
fn missing_arguments_default_to_an_empty_object() {
    let responses = drive(
        r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"echo"}}"#,
    );
    assert_eq!(responses[0]["result"]["isError"], json!(false));
}

#[test]
fn non_object_arguments_are_invalid_params() {
    let responses = drive(
        r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"echo","arguments":[1]}}"#,
    );
    assert_eq!(responses[0]["error"]["code"], json!(-32602));
}

#[test]
fn unknown_methods_fail_with_method_not_found() {
    let responses = drive(r#"{"jsonrpc":"2.0","id":7,"method":"resources/list"}"#);
    assert_eq!(responses[0]["error"]["code"], json!(METHOD_NOT_FOUND));
}

#[test]
fn unparseable_lines_fail_with_a_null_id_parse_error() {
    let responses = drive("this is not json");
    assert_eq!(responses[0]["error"]["code"], json!(PARSE_ERROR));
    assert_eq!(responses[0]["id"], Value::Null);
}

#[test]
fn blank_lines_are_skipped_and_the_session_continues() {
    let responses = drive(
        "\n\n{\"jsonrpc\":\"2.0\",\"id\":8,\"method\":\"ping\"}\n\n{\"jsonrpc\":\"2.0\",\"id\":9,\"method\":\"ping\"}\n",
    );
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["id"], json!(8));
    assert_eq!(responses[1]["id"], json!(9));
}
