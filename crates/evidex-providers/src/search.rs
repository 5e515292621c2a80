// crates/evidex-providers/src/search.rs
// ============================================================================
// Module: HTTP Search Provider
// Description: SearchTool implementation backed by an HTTP meta-search endpoint.
// Purpose: Give the Tool Broker a concrete, normalized meta_search provider.
// Dependencies: evidex-core, reqwest, serde_json, tokio
// ============================================================================

//! ## Overview
//! Calls a single configured search endpoint and normalizes its response
//! into [`SearchResult`], per Design Notes §9's single-normalized-shape
//! resolution. The endpoint is expected to return a JSON array of
//! `{title, url, snippet?}` objects; any other shape surfaces as
//! [`ToolError::Upstream`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use evidex_core::interfaces::SearchResult;
use evidex_core::interfaces::SearchTool;
use evidex_core::interfaces::ToolError;
use serde_json::json;

use crate::blocking;
use crate::http::BoundedHttpClient;

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Calls a meta-search HTTP endpoint and normalizes the response.
pub struct HttpSearchTool {
    client: Arc<BoundedHttpClient>,
    endpoint: String,
}

impl HttpSearchTool {
    /// Builds a provider that posts queries to `endpoint`.
    #[must_use]
    pub const fn new(client: Arc<BoundedHttpClient>, endpoint: String) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl SearchTool for HttpSearchTool {
    async fn meta_search(&self, query: &str, max_results: u32) -> Result<Vec<SearchResult>, ToolError> {
        let endpoint = self.endpoint.clone();
        let body = json!({"query": query, "max_results": max_results});
        let response = blocking::run(Arc::clone(&self.client), move |client| client.post_json(&endpoint, &body))
            .await
            .map_err(blocking::to_tool_error)?;

        if response.status >= 400 {
            return Err(ToolError::Upstream(format!(
                "search endpoint returned status {}",
                response.status
            )));
        }

        let parsed: Vec<SearchResult> = serde_json::from_slice(&response.bytes)
            .map_err(|err| ToolError::Upstream(format!("malformed search response: {err}")))?;
        Ok(parsed)
    }
}
