// crates/evidex-broker/src/lib.rs
// ============================================================================
// Module: Evidex Broker Library
// Description: The Tool Broker — single choke-point for outbound effects.
// Purpose: Wire the Policy Engine and Audit Ledger around every tool provider.
// Dependencies: evidex-core, evidex-config, tokio, tracing
// ============================================================================

//! ## Overview
//! `evidex-broker` implements the Tool Broker (spec §4.3): the only code
//! path through which Evidex performs search, archival fetch, document
//! parse, embedding, and structured generation. Every call is policy-gated
//! and produces a committed [`evidex_core::core::Action`] +
//! [`evidex_core::core::ToolTrace`] pair, whether admitted, denied, or
//! degraded.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod broker;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

use std::sync::Arc;

pub use broker::BrokerError;
pub use broker::CallContext;
pub use broker::DEFAULT_FETCH_TIMEOUT;
pub use broker::DEFAULT_LLM_TIMEOUT;
pub use broker::ToolBroker;
pub use broker::ToolBrokerBuilder;

/// Shared handle to the audit sink every broker call writes through.
pub type AuditLedgerHandle = Arc<dyn evidex_core::interfaces::AuditLedger>;
