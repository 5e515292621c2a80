// crates/evidex-providers/src/embed.rs
// ============================================================================
// Module: HTTP Embed Provider
// Description: EmbedTool implementation backed by an HTTP embedding endpoint.
// Purpose: Give the Tool Broker a concrete, batch-bounded embed provider.
// Dependencies: evidex-core, reqwest, tokio
// ============================================================================

//! ## Overview
//! Posts a bounded batch of chunk texts to a single configured embedding
//! endpoint and returns one vector per input, in order. Ingestion is
//! responsible for batching (default batch size 32, spec §4.7); this
//! provider simply trusts the batch it is given and fails closed if the
//! response length does not match the request length.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use evidex_core::interfaces::EmbedTool;
use evidex_core::interfaces::ToolError;
use serde::Deserialize;
use serde_json::json;

use crate::blocking;
use crate::http::BoundedHttpClient;

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Calls an embedding HTTP endpoint and validates the response shape.
pub struct HttpEmbedTool {
    client: Arc<BoundedHttpClient>,
    endpoint: String,
}

impl HttpEmbedTool {
    /// Builds a provider that posts batches to `endpoint`.
    #[must_use]
    pub const fn new(client: Arc<BoundedHttpClient>, endpoint: String) -> Self {
        Self { client, endpoint }
    }
}

/// Wire shape returned by the upstream embedding service.
#[derive(Debug, Deserialize)]
struct EmbedResponseBody {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl EmbedTool for HttpEmbedTool {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ToolError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let endpoint = self.endpoint.clone();
        let body = json!({"texts": texts});
        let expected = texts.len();
        let response = blocking::run(Arc::clone(&self.client), move |client| client.post_json(&endpoint, &body))
            .await
            .map_err(blocking::to_tool_error)?;

        if response.status >= 400 {
            return Err(ToolError::Upstream(format!(
                "embed endpoint returned status {}",
                response.status
            )));
        }

        let parsed: EmbedResponseBody = serde_json::from_slice(&response.bytes)
            .map_err(|err| ToolError::Upstream(format!("malformed embed response: {err}")))?;
        if parsed.embeddings.len() != expected {
            return Err(ToolError::Upstream(format!(
                "embed endpoint returned {} vectors for {expected} inputs",
                parsed.embeddings.len()
            )));
        }
        Ok(parsed.embeddings)
    }
}
