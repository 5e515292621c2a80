// crates/evidex-providers/src/lib.rs
// ============================================================================
// Module: Evidex Providers
// Description: HTTP-backed implementations of the Tool Broker's five provider traits.
// Purpose: Give evidex-broker concrete search/archive/parse/embed/generate providers.
// Dependencies: evidex-core, reqwest, serde, tokio
// ============================================================================

//! ## Overview
//! Every Tool Broker operation (spec §4.3) is, at the provider level, an
//! outbound HTTP call to a configured upstream endpoint: a meta-search
//! aggregator, an archival fetch, a document-parse service, an embedding
//! service, and an LLM gateway. [`http::BoundedHttpClient`] centralizes
//! the timeout/redirect/size-limit discipline every provider shares; each
//! of [`search`], [`archive`], [`parse`], [`embed`], and [`generate`]
//! wraps it behind the matching `evidex_core::interfaces` trait, bridging
//! the blocking client onto `tokio`'s blocking pool via [`blocking::run`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod archive;
pub mod blocking;
pub mod embed;
pub mod generate;
pub mod http;
pub mod parse;
pub mod search;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use archive::HttpArchiveTool;
pub use embed::HttpEmbedTool;
pub use generate::HttpGenerateTool;
pub use http::BoundedHttpClient;
pub use http::BoundedResponse;
pub use http::HttpProviderConfig;
pub use http::HttpProviderError;
pub use parse::HttpParseTool;
pub use search::HttpSearchTool;
