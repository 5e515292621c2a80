// crates/evidex-providers/src/blocking.rs
// ============================================================================
// Module: Blocking Bridge
// Description: Runs a BoundedHttpClient closure on tokio's blocking pool.
// Purpose: Let every async ToolProvider call reqwest::blocking without stalling the runtime.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! `reqwest::blocking` is used throughout this crate because the bounded
//! read discipline in [`crate::http`] is simplest to express synchronously.
//! Every call site wraps that client in [`run`] so the blocking I/O happens
//! on `tokio`'s dedicated blocking thread pool rather than an executor
//! worker thread.

use evidex_core::interfaces::ToolError;

use crate::http::BoundedHttpClient;
use crate::http::BoundedResponse;
use crate::http::HttpProviderError;

/// Runs `call` against `client` on the blocking thread pool, mapping join
/// failures onto [`HttpProviderError`] so callers have one error type.
///
/// # Errors
///
/// Returns [`HttpProviderError`] when `call` fails or the blocking task
/// panics/is cancelled.
pub async fn run<F>(client: std::sync::Arc<BoundedHttpClient>, call: F) -> Result<BoundedResponse, HttpProviderError>
where
    F: FnOnce(&BoundedHttpClient) -> Result<BoundedResponse, HttpProviderError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || call(&client))
        .await
        .map_err(|err| HttpProviderError::Request(format!("blocking task failed: {err}")))?
}

/// Maps an [`HttpProviderError`] onto the uniform [`ToolError`] taxonomy.
#[must_use]
pub fn to_tool_error(err: HttpProviderError) -> ToolError {
    match err {
        HttpProviderError::ClientBuild(msg) | HttpProviderError::Request(msg) | HttpProviderError::ReadFailed(msg) => {
            ToolError::Upstream(msg)
        }
        HttpProviderError::ResponseTooLarge(limit) => {
            ToolError::Upstream(format!("response exceeded {limit}-byte limit"))
        }
    }
}
