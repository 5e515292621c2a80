// crates/evidex-providers/src/http.rs
// ============================================================================
// Module: Bounded HTTP Client
// Description: A size- and time-bounded blocking HTTP client shared by every provider.
// Purpose: Give each tool provider one fail-closed way to call an outbound HTTP endpoint.
// Dependencies: reqwest
// ============================================================================

//! ## Overview
//! Every provider in this crate calls an outbound HTTP endpoint (the
//! upstream search/archive/parse/embed/generate service the Tool Broker was
//! admitted to reach). [`BoundedHttpClient`] centralizes the timeout,
//! redirect, user-agent, and response-size-limit policy so none of the five
//! providers has to reimplement its own size-limited-read discipline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::blocking::Response;
use reqwest::redirect::Policy;
use thiserror::Error;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Shared configuration for every HTTP-backed tool provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpProviderConfig {
    /// Request timeout.
    pub timeout_ms: u64,
    /// Maximum response size accepted, in bytes.
    pub max_response_bytes: usize,
    /// `User-Agent` header sent on every request.
    pub user_agent: String,
}

impl Default for HttpProviderConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_response_bytes: 16 * 1024 * 1024,
            user_agent: "evidex-broker/0.1".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while building or using a [`BoundedHttpClient`].
#[derive(Debug, Error)]
pub enum HttpProviderError {
    /// The underlying `reqwest` client could not be constructed.
    #[error("http client build failed: {0}")]
    ClientBuild(String),
    /// The outbound request failed (connection refused, DNS, TLS, …).
    #[error("http request failed: {0}")]
    Request(String),
    /// The response exceeded `max_response_bytes`.
    #[error("http response exceeds the {0}-byte size limit")]
    ResponseTooLarge(usize),
    /// The response body could not be read to completion.
    #[error("http response read failed: {0}")]
    ReadFailed(String),
}

// ============================================================================
// SECTION: Bounded Client
// ============================================================================

/// A blocking HTTP client with a fixed timeout, no automatic redirects, and
/// a hard response-size cap.
///
/// # Invariants
/// - Never follows redirects; the Policy Engine evaluates the requested URL
///   only, so a redirect must not silently move the call to an unvetted host.
pub struct BoundedHttpClient {
    config: HttpProviderConfig,
    client: Client,
}

impl BoundedHttpClient {
    /// Builds a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpProviderError::ClientBuild`] when the underlying
    /// `reqwest` client cannot be constructed.
    pub fn new(config: HttpProviderConfig) -> Result<Self, HttpProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|err| HttpProviderError::ClientBuild(err.to_string()))?;
        Ok(Self { config, client })
    }

    /// Issues a `GET` request and returns the response with its body read
    /// up to the configured size limit.
    ///
    /// # Errors
    ///
    /// Returns [`HttpProviderError`] on connection failure or when the
    /// response exceeds `max_response_bytes`.
    pub fn get(&self, url: &str) -> Result<BoundedResponse, HttpProviderError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|err| HttpProviderError::Request(err.to_string()))?;
        let status = response.status().as_u16();
        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);
        let etag = response
            .headers()
            .get(reqwest::header::ETAG)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);
        let bytes = self.read_limited(&mut response)?;
        Ok(BoundedResponse {
            status,
            mime_type,
            etag,
            bytes,
        })
    }

    /// Issues a `POST` request with a JSON body and returns the response
    /// with its body read up to the configured size limit.
    ///
    /// # Errors
    ///
    /// Returns [`HttpProviderError`] on connection failure or when the
    /// response exceeds `max_response_bytes`.
    pub fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<BoundedResponse, HttpProviderError> {
        let mut response = self
            .client
            .post(url)
            .json(body)
            .send()
            .map_err(|err| HttpProviderError::Request(err.to_string()))?;
        let status = response.status().as_u16();
        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);
        let bytes = self.read_limited(&mut response)?;
        Ok(BoundedResponse {
            status,
            mime_type,
            etag: None,
            bytes,
        })
    }

    /// Reads `response`'s body, rejecting it outright once it is clear the
    /// content will exceed `max_response_bytes`.
    fn read_limited(&self, response: &mut Response) -> Result<Vec<u8>, HttpProviderError> {
        let max_bytes = self.config.max_response_bytes;
        if let Some(expected) = response.content_length()
            && usize::try_from(expected).is_ok_and(|expected| expected > max_bytes)
        {
            return Err(HttpProviderError::ResponseTooLarge(max_bytes));
        }
        let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX).saturating_add(1);
        let mut buf = Vec::new();
        response
            .take(limit)
            .read_to_end(&mut buf)
            .map_err(|err| HttpProviderError::ReadFailed(err.to_string()))?;
        if buf.len() > max_bytes {
            return Err(HttpProviderError::ResponseTooLarge(max_bytes));
        }
        Ok(buf)
    }
}

/// The bounded result of a [`BoundedHttpClient`] call.
#[derive(Debug, Clone)]
pub struct BoundedResponse {
    /// HTTP status code.
    pub status: u16,
    /// `Content-Type` response header, if present.
    pub mime_type: Option<String>,
    /// `ETag` response header, if present.
    pub etag: Option<String>,
    /// Response body bytes, bounded by `max_response_bytes`.
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_disallows_unbounded_responses() {
        let config = HttpProviderConfig::default();
        assert!(config.max_response_bytes > 0);
        assert!(config.timeout_ms > 0);
    }
}
