// crates/evidex-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and onboarding.
// Dependencies: std
// ============================================================================

//! ## Overview
//! A canonical example `evidex.toml`, kept in sync with [`crate::schema`]
//! and [`crate::docs`].

/// Returns a canonical example `evidex.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[policy]
allowed_hosts = ["example.com", "news.example.org"]
min_interval_ms = 1000

[llm]
base_url = "https://api.example.com/v1"
default_model = "primary-model"
fallback_model = "fallback-model"

[object_store]
endpoint = "http://127.0.0.1:9000"
bucket = "evidex-artifacts"

[vector_store]
endpoint = "http://127.0.0.1:6333"
collection = "evidex-chunks"

[graph_store]
endpoint = "bolt://127.0.0.1:7687"

cache_ttl_secs = 3600
"#,
    )
}
