// crates/evidex-fusion/src/bayesian.rs
// ============================================================================
// Module: Bayesian Hypothesis-Set Update
// Description: ACH-style sequential posterior updates across a hypothesis set.
// Purpose: Turn one evidence assessment into an audited probability step.
// Dependencies: evidex-core::core::probability
// ============================================================================

//! ## Overview
//! [`evidex_core::core::probability`] already implements the per-update
//! arithmetic (`likelihood_from_relation`, `bayesian_update`,
//! `alternative_likelihood`). This module is the orchestration layer on top
//! of it: applying one [`EvidenceAssessment`] to one hypothesis's running
//! prior to produce an auditable [`ProbabilityUpdate`], and renormalizing a
//! competing hypothesis set so posteriors keep summing to one after every
//! round (the ACH property of using this posterior as prior for the next
//! evidence).

// ============================================================================
// SECTION: Imports
// ============================================================================

use evidex_core::core::identifiers::HypothesisKind;
use evidex_core::core::identifiers::ProbabilityUpdateKind;
use evidex_core::core::identifiers::Uid;
use evidex_core::core::probability::CLAMP_EPSILON;
use evidex_core::core::probability::EvidenceAssessment;
use evidex_core::core::probability::ProbabilityUpdate;
use evidex_core::core::probability::bayesian_update;
use evidex_core::core::time::Timestamp;

/// Applies one [`EvidenceAssessment`] to a hypothesis's current prior,
/// producing the [`ProbabilityUpdate`] audit row this process requires.
///
/// The caller supplies `new_uid` (the ledger assigns the `uid`, not this
/// pure function) and `created_at`. `prior` should be the hypothesis's
/// previous `posterior_probability`, or `1 / N` for the first update over an
/// `N`-hypothesis set.
#[must_use]
pub fn apply_assessment(
    new_uid: Uid<ProbabilityUpdateKind>,
    hypothesis_uid: Uid<HypothesisKind>,
    prior: f64,
    assessment: &EvidenceAssessment,
    created_at: Timestamp,
) -> ProbabilityUpdate {
    let likelihood = assessment.likelihood;
    let posterior = bayesian_update(prior, likelihood);
    let likelihood_ratio = if (1.0 - likelihood).abs() > f64::EPSILON {
        Some(likelihood / (1.0 - likelihood))
    } else {
        None
    };

    ProbabilityUpdate {
        uid: new_uid,
        case_uid: assessment.case_uid,
        hypothesis_uid,
        evidence_assessment_uid: assessment.uid,
        prior: prior.clamp(CLAMP_EPSILON, 1.0 - CLAMP_EPSILON),
        posterior,
        likelihood,
        likelihood_ratio,
        created_at,
    }
}

/// The uniform prior `1 / N` assigned to each hypothesis in an `N`-member
/// hypothesis set at the start of Bayesian scoring. Returns
/// `1.0` for an empty set (there is nothing to divide among).
#[must_use]
pub fn uniform_prior(hypothesis_set_size: usize) -> f64 {
    if hypothesis_set_size == 0 { 1.0 } else { 1.0 / hypothesis_set_size as f64 }
}

/// Renormalizes a competing hypothesis set's posteriors so they sum to
/// `1.0` again after an independent per-hypothesis Bayesian step, preserving
/// each hypothesis's relative weight. A no-op (beyond clamping) when the
/// set already sums to `1.0`.
///
/// Every entry is clamped into `[ε, 1-ε]` before and after renormalization,
/// matching [`evidex_core::core::probability::CLAMP_EPSILON`]'s floor.
#[must_use]
pub fn renormalize(posteriors: &[(Uid<HypothesisKind>, f64)]) -> Vec<(Uid<HypothesisKind>, f64)> {
    if posteriors.is_empty() {
        return Vec::new();
    }

    let clamped: Vec<(Uid<HypothesisKind>, f64)> = posteriors
        .iter()
        .map(|(uid, p)| (*uid, p.clamp(CLAMP_EPSILON, 1.0 - CLAMP_EPSILON)))
        .collect();
    let total: f64 = clamped.iter().map(|(_, p)| p).sum();
    if total <= 0.0 {
        let uniform = uniform_prior(clamped.len());
        return clamped.into_iter().map(|(uid, _)| (uid, uniform)).collect();
    }

    clamped
        .into_iter()
        .map(|(uid, p)| (uid, (p / total).clamp(CLAMP_EPSILON, 1.0 - CLAMP_EPSILON)))
        .collect()
}

#[cfg(test)]
mod tests {
    use evidex_core::core::probability::Relation;

    use super::*;

    fn ts() -> Timestamp {
        "2026-01-01T00:00:00Z".parse().expect("ts")
    }

    fn assessment(relation: Relation, strength: f64) -> EvidenceAssessment {
        EvidenceAssessment::new(
            Uid::from_seed(b"ea"),
            Uid::from_seed(b"case"),
            Uid::from_seed(b"h"),
            Uid::from_seed(b"ev"),
            relation,
            strength,
            ts(),
        )
    }

    #[test]
    fn uniform_prior_divides_evenly() {
        assert!((uniform_prior(4) - 0.25).abs() < 1e-12);
        assert_eq!(uniform_prior(0), 1.0);
    }

    #[test]
    fn apply_assessment_raises_posterior_for_supporting_evidence() {
        let assessment = assessment(Relation::Support, 0.9);
        let update = apply_assessment(
            Uid::from_seed(b"pu"),
            Uid::from_seed(b"h"),
            0.25,
            &assessment,
            ts(),
        );
        assert!(update.posterior > update.prior);
        assert!(update.likelihood_ratio.is_some());
    }

    #[test]
    fn apply_assessment_lowers_posterior_for_contradicting_evidence() {
        let assessment = assessment(Relation::Contradict, 0.9);
        let update = apply_assessment(
            Uid::from_seed(b"pu"),
            Uid::from_seed(b"h"),
            0.5,
            &assessment,
            ts(),
        );
        assert!(update.posterior < update.prior);
    }

    #[test]
    fn irrelevant_evidence_is_a_near_no_op() {
        let assessment = assessment(Relation::Irrelevant, 0.5);
        let update = apply_assessment(
            Uid::from_seed(b"pu"),
            Uid::from_seed(b"h"),
            0.4,
            &assessment,
            ts(),
        );
        assert!((update.posterior - update.prior).abs() < 1e-6);
        assert!(update.likelihood_ratio.is_none());
    }

    #[test]
    fn renormalize_restores_sum_to_one() {
        let posteriors = vec![
            (Uid::from_seed(b"h1"), 0.6),
            (Uid::from_seed(b"h2"), 0.6),
            (Uid::from_seed(b"h3"), 0.1),
        ];
        let normalized = renormalize(&posteriors);
        let total: f64 = normalized.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn renormalize_of_empty_set_is_empty() {
        assert!(renormalize(&[]).is_empty());
    }
}
