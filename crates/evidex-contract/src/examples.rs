// crates/evidex-contract/src/examples.rs
// ============================================================================
// Module: Contract Examples
// Description: Canonical example JSON bodies for the documented HTTP surface.
// Purpose: Give docs and client SDKs one source of truth for request/response shape.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! One canonical example per documented request/response pair (spec §6),
//! following the same "generate the canonical form in code, don't hand
//! maintain it in docs" discipline as `evidex_config::examples`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Examples
// ============================================================================

/// Canonical example body for `POST /cases`.
#[must_use]
pub fn create_case_example() -> Value {
    json!({
        "title": "Harborview bridge closure",
        "actor_id": "analyst-1",
        "rationale": "opening an investigation into the reported closure",
    })
}

/// Canonical example body for `POST /cases/{uid}/analysis/chat`'s response.
#[must_use]
pub fn chat_response_example() -> Value {
    json!({
        "answer_text": "",
        "answer_type": "HYPOTHESIS",
        "evidence_citations": [],
        "cannot_answer_reason": "evidence_insufficient",
        "trace_id": "trace-01J9Z0",
    })
}

/// Canonical example body for a `policy_denied` Problem Details response.
#[must_use]
pub fn policy_denied_problem_example() -> Value {
    json!({
        "type": "urn:evidex:error:policy_denied",
        "title": "Policy Denied",
        "status": 403,
        "detail": "host `other.com` is not in the allowlist",
        "error_code": "policy_denied",
        "extensions": {"retryable": false},
    })
}
