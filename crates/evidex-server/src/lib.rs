// crates/evidex-server/src/lib.rs
// ============================================================================
// Module: Evidex Server
// Description: HTTP/WebSocket surface over the evidence model, Tool Broker,
//              and pipeline orchestrator.
// Purpose: Provide the case lifecycle, tool, pipeline, analysis, and chat
//          endpoints.
// Dependencies: evidex-broker, evidex-config, evidex-contract, evidex-core,
//               evidex-events, evidex-hypothesis, evidex-ingest,
//               evidex-pipeline, evidex-providers, evidex-store-sqlite, axum
// ============================================================================

//! ## Overview
//! Evidex Server wires every control-plane crate behind one [`state::AppState`]
//! and exposes it as an axum [`router::build_router`] HTTP surface plus a
//! [`chat`] WebSocket. Handlers are grouped by resource under [`handlers`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod chat;
pub mod error;
pub mod fixtures;
pub mod handlers;
pub mod router;
pub mod state;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use error::ApiError;
pub use router::ServeError;
pub use router::build_router;
pub use router::serve;
pub use state::AppState;
pub use state::StateError;

#[cfg(test)]
mod tests;
