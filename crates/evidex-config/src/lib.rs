// crates/evidex-config/src/lib.rs
// ============================================================================
// Module: Evidex Config Library
// Description: Canonical config model, the Policy Engine, and deterministic
//              docs/schema/example generation.
// Purpose: Single source of truth for evidex.toml semantics.
// Dependencies: evidex-core, serde, toml
// ============================================================================

//! ## Overview
//! `evidex-config` defines the canonical configuration model for Evidex: the
//! environment surface (allowlisted hosts, rate limits,
//! LLM/object-store/vector-store/graph-store endpoints) plus the Policy
//! Engine that gates every outbound tool call, grounding decision, and LLM
//! budget check.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod docs;
pub mod examples;
pub mod policy;
pub mod schema;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use docs::config_docs_markdown;
pub use docs::verify_config_docs;
pub use docs::write_config_docs;
pub use examples::config_toml_example;
pub use policy::*;
pub use schema::config_schema;
