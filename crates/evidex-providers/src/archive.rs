// crates/evidex-providers/src/archive.rs
// ============================================================================
// Module: HTTP Archive Provider
// Description: ArchiveTool implementation that fetches and durably captures a URL.
// Purpose: Give the Tool Broker a concrete archive_url provider.
// Dependencies: evidex-core, reqwest, tokio
// ============================================================================

//! ## Overview
//! Fetches `url` directly with [`crate::http::BoundedHttpClient`]. The
//! Policy Engine has already evaluated `url`'s scheme/host/rate limits
//! before this is called; this provider only performs the bounded GET and
//! normalizes the transport metadata into [`FetchedArtifact`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use evidex_core::interfaces::ArchiveTool;
use evidex_core::interfaces::FetchedArtifact;
use evidex_core::interfaces::ToolError;

use crate::blocking;
use crate::http::BoundedHttpClient;

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Fetches a URL's bytes over HTTP, bounded by [`crate::http::HttpProviderConfig`].
pub struct HttpArchiveTool {
    client: Arc<BoundedHttpClient>,
}

impl HttpArchiveTool {
    /// Builds a provider using `client` to perform fetches.
    #[must_use]
    pub const fn new(client: Arc<BoundedHttpClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ArchiveTool for HttpArchiveTool {
    async fn archive_url(&self, url: &str) -> Result<FetchedArtifact, ToolError> {
        let target = url.to_string();
        let response = blocking::run(Arc::clone(&self.client), move |client| client.get(&target))
            .await
            .map_err(blocking::to_tool_error)?;

        Ok(FetchedArtifact {
            bytes: response.bytes,
            mime_type: response.mime_type,
            http_status: response.status,
            etag: response.etag,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpProviderConfig;

    #[tokio::test]
    async fn construction_succeeds_with_default_config() {
        let client = Arc::new(BoundedHttpClient::new(HttpProviderConfig::default()).expect("build client"));
        let _tool = HttpArchiveTool::new(client);
    }
}
