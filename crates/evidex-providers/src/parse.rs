// crates/evidex-providers/src/parse.rs
// ============================================================================
// Module: HTTP Parse Provider
// Description: ParseTool implementation that delegates to an external parse service.
// Purpose: Give the Tool Broker a concrete doc_parse provider with a plaintext fallback.
// Dependencies: evidex-core, reqwest, tokio
// ============================================================================

//! ## Overview
//! No crate in the dependency stack performs PDF/DOCX/HTML extraction, so
//! `doc_parse` is implemented the same way `meta_search`/`embed`/
//! `generate_structured` already are: a thin HTTP client call to an
//! upstream parse service, which returns `{text, title?}`. When the
//! upstream call fails, this provider falls back to a local manual-strip
//! extraction (drop `<script>`/`<style>` blocks and tags) rather than
//! aborting ingestion, setting [`evidex_core::interfaces::ParsedDocument::parse_error`]
//! per [`evidex_core::interfaces::ParseTool`]'s recoverable-failure contract.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use evidex_core::interfaces::ParseTool;
use evidex_core::interfaces::ParsedDocument;
use evidex_core::interfaces::ToolError;
use serde::Deserialize;
use serde_json::json;

use crate::blocking;
use crate::http::BoundedHttpClient;

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Calls an upstream document-parse endpoint, falling back to a local
/// manual-strip extraction when the call fails.
pub struct HttpParseTool {
    client: Arc<BoundedHttpClient>,
    endpoint: String,
}

impl HttpParseTool {
    /// Builds a provider that posts documents to `endpoint`.
    #[must_use]
    pub const fn new(client: Arc<BoundedHttpClient>, endpoint: String) -> Self {
        Self { client, endpoint }
    }
}

/// Wire shape returned by the upstream parse service.
#[derive(Debug, Deserialize)]
struct ParseResponseBody {
    text: String,
    title: Option<String>,
}

#[async_trait]
impl ParseTool for HttpParseTool {
    async fn doc_parse(&self, bytes: &[u8], mime_type: &str) -> Result<ParsedDocument, ToolError> {
        let endpoint = self.endpoint.clone();
        let body = json!({
            "mime_type": mime_type,
            "content_base64": BASE64.encode(bytes),
        });
        let result = blocking::run(Arc::clone(&self.client), move |client| client.post_json(&endpoint, &body)).await;

        match result {
            Ok(response) if response.status < 400 => {
                let parsed: ParseResponseBody = serde_json::from_slice(&response.bytes)
                    .map_err(|err| ToolError::Upstream(format!("malformed parse response: {err}")))?;
                Ok(ParsedDocument {
                    text: parsed.text,
                    title: parsed.title,
                    parse_error: None,
                })
            }
            Ok(response) => Ok(manual_fallback(
                bytes,
                mime_type,
                &format!("parse endpoint returned status {}", response.status),
            )),
            Err(err) => Ok(manual_fallback(bytes, mime_type, &err.to_string())),
        }
    }
}

/// Strips `<script>`/`<style>` blocks and remaining tags from HTML-ish
/// bytes; for anything else, decodes as lossy UTF-8 verbatim.
fn manual_fallback(bytes: &[u8], mime_type: &str, reason: &str) -> ParsedDocument {
    let raw = String::from_utf8_lossy(bytes);
    let text = if mime_type.contains("html") {
        strip_html(&raw)
    } else {
        raw.into_owned()
    };
    ParsedDocument {
        text,
        title: None,
        parse_error: Some(reason.to_string()),
    }
}

/// Removes `<script>`/`<style>` element contents, then strips all
/// remaining tags, collapsing the result to plain text.
fn strip_html(input: &str) -> String {
    let without_blocks = strip_elements(input, "script");
    let without_blocks = strip_elements(&without_blocks, "style");
    let mut out = String::with_capacity(without_blocks.len());
    let mut in_tag = false;
    for ch in without_blocks.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Removes every `<tag>...</tag>` block (case-insensitive) from `input`.
fn strip_elements(input: &str, tag: &str) -> String {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let lower = input.to_lowercase();
    let mut result = String::with_capacity(input.len());
    let mut cursor = 0usize;
    while let Some(start) = lower[cursor..].find(&open) {
        let abs_start = cursor + start;
        result.push_str(&input[cursor..abs_start]);
        if let Some(end) = lower[abs_start..].find(&close) {
            cursor = abs_start + end + close.len();
        } else {
            cursor = input.len();
            break;
        }
    }
    result.push_str(&input[cursor..]);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_html_drops_script_and_tags() {
        let html = "<html><head><script>evil()</script></head><body><p>Hello <b>world</b></p></body></html>";
        let text = strip_html(html);
        assert_eq!(text, "Hello world");
    }

    #[test]
    fn manual_fallback_sets_parse_error() {
        let doc = manual_fallback(b"<p>plain</p>", "text/html", "upstream unreachable");
        assert_eq!(doc.parse_error.as_deref(), Some("upstream unreachable"));
        assert_eq!(doc.text, "plain");
    }

}
