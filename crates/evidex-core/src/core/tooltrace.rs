// crates/evidex-core/src/core/tooltrace.rs
// ============================================================================
// Module: ToolTrace
// Description: One record per outbound tool invocation, bound to an Action.
// Purpose: Record what was asked, what came back, and which policy decision gated it.
// Dependencies: crate::core::{action, identifiers, time}
// ============================================================================

//! ## Overview
//! A [`ToolTrace`] is written for every Tool Broker call, in the same
//! transaction as its parent [`crate::core::action::Action`] when possible,
//! otherwise at-least-once with idempotent upsert keyed by `uid`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::ActionKind;
use crate::core::identifiers::CaseKind;
use crate::core::identifiers::ToolTraceKind;
use crate::core::identifiers::Uid;
use crate::core::time::Timestamp;

/// Outcome of one tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolTraceStatus {
    /// The call was admitted and completed successfully.
    Ok,
    /// The Policy Engine denied the call before it was made.
    Denied,
    /// The call was admitted but failed (upstream error, timeout).
    Error,
    /// The outcome could not be determined (e.g. process crashed mid-call).
    Unknown,
}

/// The policy decision that authorized or rejected a tool invocation,
/// denormalized onto the trace for fast audit review without a join back
/// to the Policy Engine's evaluation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecisionSummary {
    /// Whether the call was allowed.
    pub allowed: bool,
    /// Machine-readable denial/degradation code, e.g. `"rate_limited"`.
    pub error_code: Option<String>,
    /// Human-readable reason.
    pub reason: Option<String>,
}

/// One record per outbound tool invocation.
///
/// # Invariants
/// - Bound to exactly one [`crate::core::action::Action`] via `action_uid`.
/// - Never mutated after insert; upsert is keyed by `uid` for at-least-once
///   delivery from a non-transactional path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolTrace {
    /// Trace uid.
    pub uid: Uid<ToolTraceKind>,
    /// Owning case.
    pub case_uid: Uid<CaseKind>,
    /// Action this trace is bound to.
    pub action_uid: Uid<ActionKind>,
    /// Name of the tool invoked, e.g. `"meta_search"`.
    pub tool_name: String,
    /// Opaque structured request payload.
    pub request: Value,
    /// Opaque structured response payload, if one was received.
    pub response: Option<Value>,
    /// Outcome of the invocation.
    pub status: ToolTraceStatus,
    /// Wall-clock duration of the call, in milliseconds.
    pub duration_ms: u64,
    /// Error message, set when `status == Error`.
    pub error: Option<String>,
    /// The policy decision that authorized or rejected the call.
    pub policy: PolicyDecisionSummary,
    /// Creation timestamp.
    pub created_at: Timestamp,
}
