// crates/evidex-hypothesis/src/analyze.rs
// ============================================================================
// Module: Hypothesis Analysis (ACH)
// Description: Per-evidence relation/strength/likelihood pass over one hypothesis.
// Purpose: Produce coverage, initial confidence, and a gap list for a hypothesis.
// Dependencies: evidex-broker, evidex-core, evidex-fusion
// ============================================================================

//! ## Overview
//! [`analyze`] asks the Tool Broker's `generate_structured` operation to
//! classify how each piece of evidence bears on a hypothesis statement
//! (`support` / `contradict` / `irrelevant` plus a strength in `[0, 1]`),
//! derives each [`evidex_core::core::probability::EvidenceAssessment`]'s
//! likelihood via the fixed mapping in [`evidex_core::core::probability`],
//! and sequentially folds them into a coverage score and an initial
//! confidence via [`evidex_fusion::apply_assessment`]. A failed or
//! malformed LLM response degrades to a low-confidence stub with a gap
//! entry describing the degradation (spec §7), rather than erroring —
//! analysis always returns a well-formed [`AchResult`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use evidex_broker::BrokerError;
use evidex_broker::CallContext;
use evidex_broker::ToolBroker;
use evidex_config::BudgetRequest;
use evidex_core::core::CaseKind;
use evidex_core::core::Evidence;
use evidex_core::core::EvidenceKind;
use evidex_core::core::Gap;
use evidex_core::core::HypothesisKind;
use evidex_core::core::Timestamp;
use evidex_core::core::Uid;
use evidex_core::core::probability::EvidenceAssessment;
use evidex_core::core::probability::ProbabilityUpdate;
use evidex_core::core::probability::Relation;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Result Types
// ============================================================================

/// One evidence item's relation/strength judgment, either model-authored or
/// degraded to `irrelevant` on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceJudgment {
    /// Evidence being judged.
    pub evidence_uid: Uid<EvidenceKind>,
    /// The resulting assessment (relation, strength, derived likelihood).
    pub assessment: EvidenceAssessment,
}

/// Outcome of analyzing one hypothesis against a case's evidence (spec §4.8
/// `analyze`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchResult {
    /// Hypothesis this analysis was run for.
    pub hypothesis_uid: Uid<HypothesisKind>,
    /// Per-evidence relation/strength/likelihood judgments.
    pub judgments: Vec<EvidenceJudgment>,
    /// The sequential Bayesian update trail driven by `judgments`, in order.
    pub probability_updates: Vec<ProbabilityUpdate>,
    /// Fraction of supplied evidence that received a non-`irrelevant`
    /// judgment, in `[0, 1]`.
    pub coverage_score: f64,
    /// Final posterior after folding every judgment, used as the
    /// hypothesis's initial confidence.
    pub initial_confidence: f64,
    /// Evidence gaps: high-value evidence the analysis could not obtain a
    /// judgment for.
    pub gap_list: Vec<Gap>,
    /// Set when the LLM call failed or returned malformed output and this
    /// result degraded to an all-irrelevant stub.
    pub degraded: bool,
}

#[derive(Deserialize)]
struct RawJudgment {
    evidence_uid: String,
    relation: String,
    strength: f64,
}

// ============================================================================
// SECTION: Analyze
// ============================================================================

/// Analyzes `hypothesis_uid` (stated as `hypothesis_text`) against
/// `evidence`, producing per-evidence assessments folded into a coverage
/// score, initial confidence, and gap list.
///
/// Degrades to an all-`irrelevant` [`AchResult`] with `degraded = true` and
/// a single gap entry when the broker call fails or the response cannot be
/// parsed into judgments for every supplied evidence uid — analysis never
/// errors outward (spec §7: LLM failures degrade to a stub plus a gap,
/// never an error).
pub async fn analyze(
    broker: &ToolBroker,
    ctx: &CallContext,
    case_uid: Uid<CaseKind>,
    hypothesis_uid: Uid<HypothesisKind>,
    hypothesis_text: &str,
    evidence: &[Evidence],
    budget_request: &BudgetRequest,
    now: Timestamp,
) -> AchResult {
    if evidence.is_empty() {
        return AchResult {
            hypothesis_uid,
            judgments: Vec::new(),
            probability_updates: Vec::new(),
            coverage_score: 0.0,
            initial_confidence: evidex_fusion::uniform_prior(1),
            gap_list: vec![Gap { description: "no evidence available for this case".to_string(), priority: 0.05 }],
            degraded: false,
        };
    }

    let prompt = format!(
        "Hypothesis: {hypothesis_text}\nClassify how each of the {} evidence items bears on this hypothesis as a JSON array of {{evidence_uid, relation, strength}}, relation in {{support, contradict, irrelevant}}.",
        evidence.len()
    );
    let schema = json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": {
                "evidence_uid": {"type": "string"},
                "relation": {"type": "string", "enum": ["support", "contradict", "irrelevant"]},
                "strength": {"type": "number"},
            },
            "required": ["evidence_uid", "relation", "strength"],
        },
    });

    let response = broker.generate_structured(ctx, &prompt, &schema, budget_request).await;
    build_result(case_uid, hypothesis_uid, evidence, response, now)
}

fn build_result(
    case_uid: Uid<CaseKind>,
    hypothesis_uid: Uid<HypothesisKind>,
    evidence: &[Evidence],
    response: Result<Value, BrokerError>,
    now: Timestamp,
) -> AchResult {
    let raw_judgments = response.ok().and_then(|value| parse_raw_judgments(&value));

    let (judgments, degraded) = match raw_judgments {
        Some(parsed) if !parsed.is_empty() => (to_evidence_judgments(case_uid, hypothesis_uid, evidence, &parsed, now), false),
        _ => (irrelevant_stub(case_uid, hypothesis_uid, evidence, now), true),
    };

    let mut prior = evidex_fusion::uniform_prior(1);
    let mut updates = Vec::with_capacity(judgments.len());
    for judgment in &judgments {
        let update = evidex_fusion::apply_assessment(
            Uid::random(),
            hypothesis_uid,
            prior,
            &judgment.assessment,
            now,
        );
        prior = update.posterior;
        updates.push(update);
    }

    let non_irrelevant =
        judgments.iter().filter(|j| j.assessment.relation != Relation::Irrelevant).count();
    let coverage_score = if evidence.is_empty() { 0.0 } else { non_irrelevant as f64 / evidence.len() as f64 };

    let gap_list = if degraded {
        vec![Gap {
            description: "structured generation degraded; evidence judged irrelevant by default".to_string(),
            priority: 0.2,
        }]
    } else {
        Vec::new()
    };

    AchResult {
        hypothesis_uid,
        judgments,
        probability_updates: updates,
        coverage_score,
        initial_confidence: prior,
        gap_list,
        degraded,
    }
}

fn parse_raw_judgments(value: &Value) -> Option<Vec<RawJudgment>> {
    let array = value.as_array()?;
    let parsed: Vec<RawJudgment> = array
        .iter()
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .collect();
    Some(parsed)
}

fn to_evidence_judgments(
    case_uid: Uid<CaseKind>,
    hypothesis_uid: Uid<HypothesisKind>,
    evidence: &[Evidence],
    raw: &[RawJudgment],
    now: Timestamp,
) -> Vec<EvidenceJudgment> {
    evidence
        .iter()
        .map(|ev| {
            let matched = raw.iter().find(|r| r.evidence_uid == ev.uid.to_wire_string());
            let (relation, strength) = matched
                .map(|r| (parse_relation(&r.relation), r.strength))
                .unwrap_or((Relation::Irrelevant, 0.5));
            EvidenceJudgment {
                evidence_uid: ev.uid,
                assessment: EvidenceAssessment::new(
                    Uid::random(),
                    case_uid,
                    hypothesis_uid,
                    ev.uid,
                    relation,
                    strength,
                    now,
                ),
            }
        })
        .collect()
}

fn irrelevant_stub(
    case_uid: Uid<CaseKind>,
    hypothesis_uid: Uid<HypothesisKind>,
    evidence: &[Evidence],
    now: Timestamp,
) -> Vec<EvidenceJudgment> {
    evidence
        .iter()
        .map(|ev| EvidenceJudgment {
            evidence_uid: ev.uid,
            assessment: EvidenceAssessment::new(
                Uid::random(),
                case_uid,
                hypothesis_uid,
                ev.uid,
                Relation::Irrelevant,
                0.5,
                now,
            ),
        })
        .collect()
}

fn parse_relation(raw: &str) -> Relation {
    match raw {
        "support" => Relation::Support,
        "contradict" => Relation::Contradict,
        _ => Relation::Irrelevant,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evidex_core::core::RetentionPolicy;

    fn ts() -> Timestamp {
        "2026-01-01T00:00:00Z".parse().expect("ts")
    }

    fn one_evidence() -> Evidence {
        Evidence {
            uid: Uid::from_seed(b"ev"),
            case_uid: Uid::from_seed(b"case"),
            chunk_uid: Uid::from_seed(b"chunk"),
            license: None,
            pii_flag: false,
            retention_policy: RetentionPolicy::Indefinite,
            created_at: ts(),
        }
    }

    #[test]
    fn empty_evidence_produces_uniform_confidence_and_a_gap() {
        let result = build_result(
            Uid::from_seed(b"case"),
            Uid::from_seed(b"h"),
            &[],
            Ok(json!([])),
            ts(),
        );
        assert_eq!(result.coverage_score, 0.0);
        assert!(!result.gap_list.is_empty());
        assert!(!result.degraded);
    }

    #[test]
    fn malformed_response_degrades_to_irrelevant_stub() {
        let evidence = vec![one_evidence()];
        let result = build_result(Uid::from_seed(b"case"), Uid::from_seed(b"h"), &evidence, Ok(json!("not an array")), ts());
        assert!(result.degraded);
        assert_eq!(result.judgments.len(), 1);
        assert_eq!(result.judgments[0].assessment.relation, Relation::Irrelevant);
        assert_eq!(result.coverage_score, 0.0);
    }

    #[test]
    fn well_formed_response_raises_coverage_and_confidence() {
        let evidence = vec![one_evidence()];
        let response = json!([{"evidence_uid": evidence[0].uid.to_wire_string(), "relation": "support", "strength": 0.9}]);
        let result = build_result(Uid::from_seed(b"case"), Uid::from_seed(b"h"), &evidence, Ok(response), ts());
        assert!(!result.degraded);
        assert_eq!(result.coverage_score, 1.0);
        assert!(result.initial_confidence > evidex_fusion::uniform_prior(1));
        assert_eq!(result.probability_updates.len(), 1);
    }
}
