// crates/evidex-providers/src/generate.rs
// ============================================================================
// Module: HTTP Generate Provider
// Description: GenerateTool implementation backed by an HTTP LLM gateway endpoint.
// Purpose: Give the Tool Broker a concrete generate_structured provider.
// Dependencies: evidex-core, reqwest, tokio
// ============================================================================

//! ## Overview
//! Posts a `{prompt, schema, model_id}` envelope to a single configured
//! gateway endpoint, which is expected to enforce `schema` conformance on
//! the provider's side and return the resulting JSON value directly.
//! Budget/degradation handling (spec §4.4) happens in the Policy Engine
//! before this provider is invoked; this provider only represents the raw
//! model call.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use evidex_core::interfaces::GenerateTool;
use evidex_core::interfaces::ToolError;
use serde_json::Value;
use serde_json::json;

use crate::blocking;
use crate::http::BoundedHttpClient;

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Calls an LLM gateway HTTP endpoint for structured generation.
pub struct HttpGenerateTool {
    client: Arc<BoundedHttpClient>,
    endpoint: String,
}

impl HttpGenerateTool {
    /// Builds a provider that posts generation requests to `endpoint`.
    #[must_use]
    pub const fn new(client: Arc<BoundedHttpClient>, endpoint: String) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl GenerateTool for HttpGenerateTool {
    async fn generate_structured(&self, prompt: &str, schema: &Value, model_id: &str) -> Result<Value, ToolError> {
        let endpoint = self.endpoint.clone();
        let body = json!({
            "prompt": prompt,
            "schema": schema,
            "model_id": model_id,
        });
        let response = blocking::run(Arc::clone(&self.client), move |client| client.post_json(&endpoint, &body))
            .await
            .map_err(blocking::to_tool_error)?;

        if response.status == 503 {
            return Err(ToolError::Upstream("model unavailable".to_string()));
        }
        if response.status >= 400 {
            return Err(ToolError::Upstream(format!(
                "generate endpoint returned status {}",
                response.status
            )));
        }

        serde_json::from_slice(&response.bytes)
            .map_err(|err| ToolError::Upstream(format!("malformed generate response: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_request_envelope_carries_model_id() {
        let body = json!({"prompt": "summarize", "schema": {}, "model_id": "gateway-default"});
        assert_eq!(body["model_id"], "gateway-default");
    }
}
