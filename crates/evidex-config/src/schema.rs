// crates/evidex-config/src/schema.rs
// ============================================================================
// Module: Config Schema
// Description: A hand-maintained JSON-schema-shaped description of
//              `AppConfig`, used by docs generation and external tooling.
// Purpose: Give operators and editors a machine-readable shape to validate
//          `evidex.toml` against.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! `config_schema` returns a JSON value describing [`crate::AppConfig`]'s
//! top-level sections. It is intentionally a plain description rather than
//! a full JSON-Schema-Draft implementation: the config surface here is
//! small and flat.

use serde_json::json;
use serde_json::Value;

/// Returns a JSON description of the `evidex.toml` configuration shape.
#[must_use]
pub fn config_schema() -> Value {
    json!({
        "type": "object",
        "required": ["llm", "object_store", "vector_store", "graph_store"],
        "properties": {
            "policy": {
                "type": "object",
                "properties": {
                    "allowed_hosts": {"type": "array", "items": {"type": "string"}},
                    "min_interval_ms": {"type": "integer", "minimum": 0},
                },
            },
            "llm": {
                "type": "object",
                "required": ["base_url", "default_model"],
                "properties": {
                    "base_url": {"type": "string"},
                    "default_model": {"type": "string"},
                    "fallback_model": {"type": ["string", "null"]},
                },
            },
            "object_store": {
                "type": "object",
                "required": ["endpoint", "bucket"],
            },
            "vector_store": {
                "type": "object",
                "required": ["endpoint", "collection"],
            },
            "graph_store": {
                "type": "object",
                "required": ["endpoint"],
            },
            "cache_ttl_secs": {"type": "integer", "minimum": 0},
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_names_every_top_level_section() {
        let schema = config_schema();
        let properties = schema["properties"]
            .as_object()
            .expect("properties object");
        for section in ["policy", "llm", "object_store", "vector_store", "graph_store"] {
            assert!(properties.contains_key(section), "missing section {section}");
        }
    }
}
