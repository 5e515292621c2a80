// crates/evidex-hypothesis/src/multi_perspective.rs
// ============================================================================
// Module: Multi-Perspective Hypothesis Generation
// Description: Generate one hypothesis set per persona, then merge.
// Purpose: Implement the `multiPerspective` operation.
// Dependencies: evidex-broker, evidex-core, crate::generate
// ============================================================================

//! ## Overview
//! [`multi_perspective`] runs [`crate::generate::generate`] once per persona
//! (default three: skeptical analyst, escalation-focused analyst,
//! alternative-framing analyst) and tags every resulting hypothesis with
//! its persona before merging the sets into one flat list. Each persona's
//! generation call independently falls back to the deterministic
//! three-archetype set per [`crate::generate::generate`]'s own contract, so
//! a failure in one persona's generation never loses the others.

// ============================================================================
// SECTION: Imports
// ============================================================================

use evidex_broker::CallContext;
use evidex_broker::ToolBroker;
use evidex_config::BudgetRequest;
use evidex_core::core::Assertion;
use evidex_core::core::CaseKind;
use evidex_core::core::Hypothesis;
use evidex_core::core::SourceClaim;
use evidex_core::core::Timestamp;
use evidex_core::core::Uid;
use evidex_core::interfaces::AuditLedger;

use crate::generate::GenerateError;

/// The three default personas used when a caller does not supply a count
/// (spec §4.8).
pub const DEFAULT_PERSONAS: [&str; 3] =
    ["skeptical_analyst", "escalation_focused_analyst", "alternative_framing_analyst"];

/// Generates one hypothesis set per persona and merges them, tagging every
/// hypothesis with [`evidex_core::core::Hypothesis::persona`].
///
/// `persona_count` selects a prefix of [`DEFAULT_PERSONAS`]; values above
/// `3` repeat the last persona with a numeric suffix rather than inventing
/// unnamed personas.
///
/// # Errors
///
/// Returns [`GenerateError`] only if the audit ledger fails to record one
/// persona's wrapping Action; a persona's own generation failure instead
/// degrades that persona's set to the deterministic fallback.
pub async fn multi_perspective(
    broker: &ToolBroker,
    ledger: &dyn AuditLedger,
    ctx: &CallContext,
    case_uid: Uid<CaseKind>,
    assertions: &[Assertion],
    source_claims: &[SourceClaim],
    budget_request: &BudgetRequest,
    persona_count: usize,
    now: Timestamp,
) -> Result<Vec<Hypothesis>, GenerateError> {
    let personas = persona_labels(persona_count);
    let mut merged = Vec::new();
    for persona in personas {
        let mut set =
            crate::generate::generate(broker, ledger, ctx, case_uid, assertions, source_claims, budget_request, now)
                .await?;
        for hypothesis in &mut set {
            hypothesis.persona = Some(persona.clone());
        }
        merged.extend(set);
    }
    Ok(merged)
}

fn persona_labels(persona_count: usize) -> Vec<String> {
    if persona_count == 0 {
        return Vec::new();
    }
    (0..persona_count)
        .map(|i| {
            DEFAULT_PERSONAS
                .get(i)
                .map(|label| (*label).to_string())
                .unwrap_or_else(|| format!("{}_{}", DEFAULT_PERSONAS[DEFAULT_PERSONAS.len() - 1], i + 1))
        })
        .collect()
}
