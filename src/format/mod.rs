//! Secondary formatting capability: free text to schema-conforming JSON.
//!
//! When the engine's answer is not already valid JSON that satisfies the
//! output contract, the answer is handed to a constrained text-to-data
//! transform: a fast chat-completions model pinned to strict JSON Schema
//! response formatting. This is reformatting, not re-reasoning — the raw
//! answer is the only user content and the schema is the hard contract.

use crate::error::{EmissaryError, Result};
use serde_json::{Value, json};

/// Default Chat Completions endpoint.
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Pinned fast model for repair calls.
const REFORMAT_MODEL: &str = "gpt-5-nano";

/// Fixed sampling temperature; some engines reject 0.
const REFORMAT_TEMPERATURE: f64 = 1.0;

/// Fixed system directive for the repair call.
const SYSTEM_DIRECTIVE: &str =
    "Reformat the user's text as JSON that conforms to the provided JSON Schema.";

/// A constrained text-to-structured-data transform.
pub trait OutputFormatter {
    /// Reinterpret `raw` according to `schema` and return the decoded value.
    fn reformat(&self, schema: &Value, raw: &str) -> Result<Value>;
}

/// Formatter backed by the OpenAI Chat Completions API.
#[derive(Debug, Clone)]
pub struct OpenAiFormatter {
    api_key: Option<String>,
    base_url: String,
}

impl OpenAiFormatter {
    /// Create a formatter; the key may be absent, in which case repair
    /// calls fail with guidance instead of an opaque HTTP error.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the API base URL (tests and proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The request body for one repair call.
    fn request_body(schema: &Value, raw: &str) -> Value {
        json!({
            "model": REFORMAT_MODEL,
            "temperature": REFORMAT_TEMPERATURE,
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "parse",
                    "description": "Reinterpret free text according to the schema.",
                    "schema": schema,
                    "strict": true,
                },
            },
            "messages": [
                { "role": "system", "content": SYSTEM_DIRECTIVE },
                { "role": "user", "content": raw },
            ],
        })
    }
}

impl OutputFormatter for OpenAiFormatter {
    fn reformat(&self, schema: &Value, raw: &str) -> Result<Value> {
        let Some(api_key) = &self.api_key else {
            return Err(EmissaryError::Engine(
                "OpenAI API key is not set. Set OPENAI_API_KEY or run `emissary setup`."
                    .to_string(),
            ));
        };

        let response: Value = ureq::post(&format!("{}/chat/completions", self.base_url))
            .set("Authorization", &format!("Bearer {api_key}"))
            .send_json(Self::request_body(schema, raw))
            .map_err(|e| EmissaryError::Engine(format!("chat completions request failed: {e}")))?
            .into_json()
            .map_err(|e| {
                EmissaryError::InvalidOutputFormat(format!(
                    "chat completions response is not JSON: {e}"
                ))
            })?;

        let content = response["choices"]
            .get(0)
            .and_then(|choice| choice["message"]["content"].as_str())
            .ok_or_else(|| {
                EmissaryError::InvalidOutputFormat(
                    "chat completions response has no choices".to_string(),
                )
            })?;

        serde_json::from_str(content).map_err(|_| {
            EmissaryError::InvalidOutputFormat(
                "chat completions content is not valid JSON".to_string(),
            )
        })
    }
}
