// crates/evidex-config/src/config.rs
// ============================================================================
// Module: Application Configuration
// Description: Canonical config model for the environment/config surface:
//              allowlisted hosts, rate limits, cache TTL, LLM endpoints,
//              object/vector/graph store endpoints.
// Purpose: Single source of truth for evidex.toml semantics.
// Dependencies: serde, toml, evidex-config::policy
// ============================================================================

//! ## Overview
//! `AppConfig` is the root configuration object loaded from `evidex.toml`
//! (or equivalent environment variables). It is deliberately flat: every
//! field maps onto one line of the "Environment / config" surface.

use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::policy::PolicyConfig;

/// Root application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Tool broker policy: allowlisted hosts, per-tool rate limit.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// LLM provider configuration.
    pub llm: LlmConfig,
    /// Object store (artifact bytes) configuration.
    pub object_store: ObjectStoreConfig,
    /// Vector store (chunk embeddings) configuration.
    pub vector_store: VectorStoreConfig,
    /// Graph store (knowledge graph) configuration.
    pub graph_store: GraphStoreConfig,
    /// Cache time-to-live, in seconds, for tool responses.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

const fn default_cache_ttl_secs() -> u64 {
    3600
}

/// LLM endpoint and model configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Base URL of the LLM provider's API.
    pub base_url: String,
    /// API key, read from the environment at load time rather than
    /// persisted in the file; see [`AppConfig::load`].
    #[serde(skip)]
    pub api_key: Option<String>,
    /// Default model identifier used for structured generation.
    pub default_model: String,
    /// Fallback model identifier used after a primary-model failure.
    pub fallback_model: Option<String>,
}

/// Object store endpoint configuration (artifact bytes).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObjectStoreConfig {
    /// Connection endpoint (e.g. an S3-compatible base URL).
    pub endpoint: String,
    /// Bucket or container name.
    pub bucket: String,
}

/// Vector store endpoint configuration (chunk embeddings).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VectorStoreConfig {
    /// Connection endpoint.
    pub endpoint: String,
    /// Collection or index name.
    pub collection: String,
}

/// Graph store endpoint configuration (knowledge graph).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphStoreConfig {
    /// Connection endpoint.
    pub endpoint: String,
}

/// Errors raised while loading [`AppConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file at {path}: {source}")]
    Read {
        /// The path that could not be read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The config file failed to parse as TOML.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl AppConfig {
    /// Loads configuration from a TOML file at `path`, then overlays the
    /// `EVIDEX_LLM_API_KEY` environment variable onto `llm.api_key` (the
    /// key is never persisted to disk).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if it is not valid TOML matching this shape.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: Self = toml::from_str(&raw)?;
        config.llm.api_key = std::env::var("EVIDEX_LLM_API_KEY").ok();
        Ok(config)
    }
}
