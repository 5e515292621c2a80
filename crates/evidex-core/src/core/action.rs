// crates/evidex-core/src/core/action.rs
// ============================================================================
// Module: Action
// Description: The audit spine — one append-only record per state-changing operation.
// Purpose: Give every mutation a rationale, inputs/outputs, and a trace/span for replay.
// Dependencies: crate::core::{identifiers, time}
// ============================================================================

//! ## Overview
//! Every state-changing operation in the system writes exactly one
//! [`Action`], in the same transaction as the state change it documents.
//! Actions are never mutated after insert.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::ActionKind;
use crate::core::identifiers::ActorId;
use crate::core::identifiers::CaseKind;
use crate::core::identifiers::SpanId;
use crate::core::identifiers::TraceId;
use crate::core::identifiers::Uid;
use crate::core::time::Timestamp;

/// An append-only audit record documenting one state-changing operation.
///
/// # Invariants
/// - Never mutated after insert.
/// - Written in the same transaction as the state change it documents,
///   when the storage backend supports transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Action uid.
    pub uid: Uid<ActionKind>,
    /// Owning case.
    pub case_uid: Uid<CaseKind>,
    /// Stable label for the kind of operation, e.g. `"hypothesis.generate"`.
    pub action_type: String,
    /// Principal that caused the action.
    pub actor_id: ActorId,
    /// Human-readable justification for the action.
    pub rationale: String,
    /// Opaque structured inputs to the operation.
    pub inputs: Value,
    /// Opaque structured outputs of the operation.
    pub outputs: Value,
    /// Distributed trace this action belongs to.
    pub trace_id: TraceId,
    /// Span within `trace_id` for this action.
    pub span_id: SpanId,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

impl Action {
    /// Returns whether `outputs` carries the conventional `fallback = true`
    /// marker (set by the Hypothesis Engine when it falls back to the
    /// deterministic three-archetype set).
    #[must_use]
    pub fn has_fallback_marker(&self) -> bool {
        self.outputs
            .get("fallback")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Returns whether `outputs` carries the conventional `partial = true`
    /// marker (set by ingestion when an embedding terminally fails).
    #[must_use]
    pub fn has_partial_marker(&self) -> bool {
        self.outputs
            .get("partial")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn action(outputs: Value) -> Action {
        Action {
            uid: Uid::from_seed(b"act"),
            case_uid: Uid::from_seed(b"case"),
            action_type: "hypothesis.generate".to_string(),
            actor_id: ActorId::new("system"),
            rationale: "fallback after empty LLM response".to_string(),
            inputs: json!({}),
            outputs,
            trace_id: TraceId::new("trace-1"),
            span_id: SpanId::new("span-1"),
            created_at: "2026-01-01T00:00:00Z".parse().expect("ts"),
        }
    }

    #[test]
    fn detects_fallback_marker() {
        assert!(action(json!({"fallback": true})).has_fallback_marker());
        assert!(!action(json!({})).has_fallback_marker());
    }

    #[test]
    fn detects_partial_marker() {
        assert!(action(json!({"partial": true})).has_partial_marker());
        assert!(!action(json!({"partial": false})).has_partial_marker());
    }
}
