// crates/evidex-hypothesis/src/generate.rs
// ============================================================================
// Module: Hypothesis Generation
// Description: Turn assertions + source claims into a candidate hypothesis set.
// Purpose: Never return zero hypotheses; fall back to a deterministic set
//          when structured generation is empty or fails.
// Dependencies: evidex-broker, evidex-core
// ============================================================================

//! ## Overview
//! [`generate`] asks the configured LLM (via [`evidex_broker::ToolBroker::generate_structured`])
//! for a hypothesis set. When the call fails, times out, or returns an
//! empty list, a deterministic three-hypothesis fallback is emitted instead
//! (spec §4.8): `continuation_of_status_quo`, `escalation`, `de_escalation`.
//! The wrapping [`evidex_core::core::Action`] records `outputs.fallback =
//! true` whenever the fallback path was taken, so downstream audit queries
//! can distinguish a model-authored hypothesis set from the deterministic
//! one without re-reading the hypotheses themselves.

// ============================================================================
// SECTION: Imports
// ============================================================================

use evidex_broker::BrokerError;
use evidex_broker::CallContext;
use evidex_broker::ToolBroker;
use evidex_config::BudgetRequest;
use evidex_core::core::Assertion;
use evidex_core::core::CaseKind;
use evidex_core::core::Gap;
use evidex_core::core::Hypothesis;
use evidex_core::core::HypothesisKind;
use evidex_core::core::SourceClaim;
use evidex_core::core::Timestamp;
use evidex_core::core::Uid;
use evidex_core::interfaces::AuditError;
use evidex_core::interfaces::AuditLedger;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by [`generate`]. Broker failures are swallowed into the
/// deterministic fallback rather than propagated (spec §4.8: "never return
/// zero hypotheses"); only an audit-write failure is fatal, per the
/// audit-ledger's "failures abort the business write" rule.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The audit ledger failed to record the wrapping `hypothesis.generate`
    /// Action.
    #[error("audit ledger failure: {0}")]
    Audit(#[from] AuditError),
}

impl GenerateError {
    /// Maps this error onto the shared wire taxonomy.
    #[must_use]
    pub fn kind(&self) -> evidex_core::error::ErrorKind {
        match self {
            Self::Audit(err) => err.kind(),
        }
    }
}

// ============================================================================
// SECTION: Fallback Archetypes
// ============================================================================

/// Stable labels for the three fallback hypothesis archetypes, in emission
/// order.
pub const FALLBACK_ARCHETYPES: [&str; 3] = [
    "continuation_of_status_quo",
    "escalation",
    "de_escalation",
];

fn fallback_hypothesis_set(case_uid: Uid<CaseKind>, now: Timestamp) -> Vec<Hypothesis> {
    let n = FALLBACK_ARCHETYPES.len();
    let prior = evidex_fusion::uniform_prior(n);
    FALLBACK_ARCHETYPES
        .iter()
        .map(|label| Hypothesis {
            uid: Uid::<HypothesisKind>::random(),
            case_uid,
            label: (*label).to_string(),
            supporting_assertion_uids: Vec::new(),
            contradicting_assertion_uids: Vec::new(),
            coverage_score: 0.0,
            confidence: prior,
            gap_list: vec![Gap {
                description: "no assertions available to derive a grounded hypothesis".to_string(),
                priority: 0.1,
            }],
            prior_probability: Some(prior),
            posterior_probability: Some(prior),
            adversarial_result: None,
            persona: None,
            created_at: now,
            updated_at: now,
        })
        .collect()
}

// ============================================================================
// SECTION: Generate
// ============================================================================

/// Generates a hypothesis set from `assertions` and `source_claims`.
///
/// Asks the Tool Broker's `generate_structured` operation for a JSON array
/// of `{label}` candidates; on any broker error, timeout, or an empty
/// response array, falls back to [`fallback_hypothesis_set`] and records
/// `outputs.fallback = true` on the wrapping Action.
///
/// # Errors
///
/// Returns [`GenerateError`] only if the audit ledger itself fails to
/// record the wrapping Action; broker/model failures never propagate here.
#[allow(clippy::too_many_arguments, reason = "every field is required context for the wrapping Action")]
pub async fn generate(
    broker: &ToolBroker,
    ledger: &dyn AuditLedger,
    ctx: &CallContext,
    case_uid: Uid<CaseKind>,
    assertions: &[Assertion],
    source_claims: &[SourceClaim],
    budget_request: &BudgetRequest,
    now: Timestamp,
) -> Result<Vec<Hypothesis>, GenerateError> {
    let prompt = format!(
        "Given {} assertions and {} source claims, propose competing hypotheses as a JSON array of {{label}} objects.",
        assertions.len(),
        source_claims.len()
    );
    let schema = json!({
        "type": "array",
        "items": {"type": "object", "properties": {"label": {"type": "string"}}, "required": ["label"]},
    });

    let (hypotheses, fallback, failure_reason) =
        match broker.generate_structured(ctx, &prompt, &schema, budget_request).await {
            Ok(value) => match parse_llm_hypotheses(&value, case_uid, now) {
                Some(parsed) if !parsed.is_empty() => (parsed, false, None),
                _ => (fallback_hypothesis_set(case_uid, now), true, Some("empty_response".to_string())),
            },
            Err(err) => (fallback_hypothesis_set(case_uid, now), true, Some(broker_failure_reason(&err))),
        };

    let outputs = json!({
        "hypothesis_count": hypotheses.len(),
        "fallback": fallback,
        "fallback_reason": failure_reason,
    });
    ledger
        .record_action(
            case_uid,
            "hypothesis.generate",
            &ctx.actor_id,
            "generate competing hypotheses from case assertions",
            json!({"assertion_count": assertions.len(), "source_claim_count": source_claims.len()}),
            outputs,
            &ctx.trace_id,
            &evidex_core::core::SpanId::new(format!("span-{}", Uid::<evidex_core::core::ActionKind>::random())),
        )
        .await?;

    Ok(hypotheses)
}

fn broker_failure_reason(err: &BrokerError) -> String {
    err.error_code().to_string()
}

fn parse_llm_hypotheses(value: &Value, case_uid: Uid<CaseKind>, now: Timestamp) -> Option<Vec<Hypothesis>> {
    let array = value.as_array()?;
    let n = array.len();
    if n == 0 {
        return Some(Vec::new());
    }
    let prior = evidex_fusion::uniform_prior(n);
    let hypotheses = array
        .iter()
        .filter_map(|item| item.get("label").and_then(Value::as_str))
        .map(|label| Hypothesis {
            uid: Uid::<HypothesisKind>::random(),
            case_uid,
            label: label.to_string(),
            supporting_assertion_uids: Vec::new(),
            contradicting_assertion_uids: Vec::new(),
            coverage_score: 0.0,
            confidence: prior,
            gap_list: Vec::new(),
            prior_probability: Some(prior),
            posterior_probability: Some(prior),
            adversarial_result: None,
            persona: None,
            created_at: now,
            updated_at: now,
        })
        .collect::<Vec<_>>();
    Some(hypotheses)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> Timestamp {
        "2026-01-01T00:00:00Z".parse().expect("ts")
    }

    #[test]
    fn fallback_set_has_three_archetypes() {
        let case_uid = Uid::from_seed(b"case");
        let set = fallback_hypothesis_set(case_uid, ts());
        assert_eq!(set.len(), 3);
        let labels: Vec<&str> = set.iter().map(|h| h.label.as_str()).collect();
        assert_eq!(labels, FALLBACK_ARCHETYPES);
    }

    #[test]
    fn fallback_set_priors_sum_to_one() {
        let set = fallback_hypothesis_set(Uid::from_seed(b"case"), ts());
        let total: f64 = set.iter().filter_map(|h| h.prior_probability).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn parse_llm_hypotheses_empty_array_is_empty_not_none() {
        let case_uid = Uid::from_seed(b"case");
        let parsed = parse_llm_hypotheses(&json!([]), case_uid, ts());
        assert_eq!(parsed, Some(Vec::new()));
    }

    #[test]
    fn parse_llm_hypotheses_skips_malformed_entries() {
        let case_uid = Uid::from_seed(b"case");
        let value = json!([{"label": "alpha"}, {"no_label": true}, {"label": "beta"}]);
        let parsed = parse_llm_hypotheses(&value, case_uid, ts()).expect("parsed");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].label, "alpha");
        assert_eq!(parsed[1].label, "beta");
    }
}
