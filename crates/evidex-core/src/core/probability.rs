// crates/evidex-core/src/core/probability.rs
// ============================================================================
// Module: EvidenceAssessment, ProbabilityUpdate
// Description: Per-(hypothesis, evidence) relation judgments and the Bayesian steps they drive.
// Purpose: Make every posterior probability traceable to the evidence that moved it.
// Dependencies: crate::core::{identifiers, time}
// ============================================================================

//! ## Overview
//! An [`EvidenceAssessment`] records how one piece of evidence bears on one
//! hypothesis: a `relation` (`support`/`contradict`/`irrelevant`) and a
//! `strength` in `[0, 1]`, from which a `likelihood` in `(0, 1)` is derived
//! via a fixed linear mapping. A [`ProbabilityUpdate`] is the append-only
//! audit row capturing one Bayesian step driven by one assessment.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::CaseKind;
use crate::core::identifiers::EvidenceAssessmentKind;
use crate::core::identifiers::EvidenceKind;
use crate::core::identifiers::HypothesisKind;
use crate::core::identifiers::ProbabilityUpdateKind;
use crate::core::identifiers::Uid;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Relation and Likelihood Mapping
// ============================================================================

/// How a piece of evidence bears on a hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Evidence supports the hypothesis.
    Support,
    /// Evidence contradicts the hypothesis.
    Contradict,
    /// Evidence has no bearing on the hypothesis (no-op update).
    Irrelevant,
}

/// Lower/upper bound of the `support` strength-to-likelihood mapping.
const SUPPORT_RANGE: (f64, f64) = (0.55, 0.95);
/// Lower/upper bound of the `contradict` strength-to-likelihood mapping
/// (inverted: higher strength maps to a lower likelihood).
const CONTRADICT_RANGE: (f64, f64) = (0.45, 0.05);
/// Likelihood assigned to an `irrelevant` relation: a no-op update.
const IRRELEVANT_LIKELIHOOD: f64 = 0.50;

/// Maps a `(relation, strength)` pair to a likelihood in `(0, 1)` via the
/// fixed linear ranges: `support` onto `[0.55, 0.95]`, `contradict` onto
/// `[0.45, 0.05]` (inverted), `irrelevant` always `0.50`.
///
/// `strength` is clamped to `[0, 1]` before mapping.
#[must_use]
pub fn likelihood_from_relation(relation: Relation, strength: f64) -> f64 {
    let clamped = strength.clamp(0.0, 1.0);
    match relation {
        Relation::Support => {
            SUPPORT_RANGE.0 + clamped * (SUPPORT_RANGE.1 - SUPPORT_RANGE.0)
        }
        Relation::Contradict => {
            CONTRADICT_RANGE.0 + clamped * (CONTRADICT_RANGE.1 - CONTRADICT_RANGE.0)
        }
        Relation::Irrelevant => IRRELEVANT_LIKELIHOOD,
    }
}

// ============================================================================
// SECTION: EvidenceAssessment
// ============================================================================

/// How one piece of evidence bears on one hypothesis. Unique per
/// `(hypothesis_uid, evidence_uid)` pair.
///
/// # Invariants
/// - `strength` is in `[0, 1]`.
/// - `likelihood` is derived from `(relation, strength)` via
///   [`likelihood_from_relation`] and lies in `(0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvidenceAssessment {
    /// Assessment uid.
    pub uid: Uid<EvidenceAssessmentKind>,
    /// Owning case.
    pub case_uid: Uid<CaseKind>,
    /// Hypothesis this assessment bears on.
    pub hypothesis_uid: Uid<HypothesisKind>,
    /// Evidence being assessed.
    pub evidence_uid: Uid<EvidenceKind>,
    /// How the evidence bears on the hypothesis.
    pub relation: Relation,
    /// Strength of the relation, in `[0, 1]`.
    pub strength: f64,
    /// Derived likelihood, in `(0, 1)`.
    pub likelihood: f64,
    /// Assessment timestamp.
    pub created_at: Timestamp,
}

impl EvidenceAssessment {
    /// Constructs a new evidence assessment, clamping `strength` into
    /// `[0, 1]` and deriving `likelihood` via [`likelihood_from_relation`].
    #[must_use]
    pub fn new(
        uid: Uid<EvidenceAssessmentKind>,
        case_uid: Uid<CaseKind>,
        hypothesis_uid: Uid<HypothesisKind>,
        evidence_uid: Uid<EvidenceKind>,
        relation: Relation,
        strength: f64,
        created_at: Timestamp,
    ) -> Self {
        let clamped_strength = strength.clamp(0.0, 1.0);
        let likelihood = likelihood_from_relation(relation, clamped_strength);
        Self {
            uid,
            case_uid,
            hypothesis_uid,
            evidence_uid,
            relation,
            strength: clamped_strength,
            likelihood,
            created_at,
        }
    }
}

// ============================================================================
// SECTION: ProbabilityUpdate
// ============================================================================

/// An append-only audit row capturing one Bayesian update step for one
/// hypothesis.
///
/// # Invariants
/// - `prior` and `posterior` are in `[ε, 1-ε]` with `ε` = [`CLAMP_EPSILON`].
/// - Never mutated after insert.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityUpdate {
    /// Update uid.
    pub uid: Uid<ProbabilityUpdateKind>,
    /// Owning case.
    pub case_uid: Uid<CaseKind>,
    /// Hypothesis whose probability was updated.
    pub hypothesis_uid: Uid<HypothesisKind>,
    /// Evidence assessment that drove this update.
    pub evidence_assessment_uid: Uid<EvidenceAssessmentKind>,
    /// Probability before the update.
    pub prior: f64,
    /// Probability after the update.
    pub posterior: f64,
    /// The likelihood used for this step.
    pub likelihood: f64,
    /// Bayes factor `L / (1 - L)`, when defined.
    pub likelihood_ratio: Option<f64>,
    /// Update timestamp.
    pub created_at: Timestamp,
}

/// Clamp bound applied to every posterior/prior to keep probabilities
/// strictly between 0 and 1 across repeated updates.
pub const CLAMP_EPSILON: f64 = 1e-6;

/// Applies one Bayesian update step: `posterior = prior*L / (prior*L +
/// (1-prior)*(1-L))`, clamped into `[ε, 1-ε]`.
#[must_use]
pub fn bayesian_update(prior: f64, likelihood: f64) -> f64 {
    let numerator = prior * likelihood;
    let denominator = numerator + (1.0 - prior) * (1.0 - likelihood);
    let raw = if denominator == 0.0 {
        prior
    } else {
        numerator / denominator
    };
    raw.clamp(CLAMP_EPSILON, 1.0 - CLAMP_EPSILON)
}

/// `P(E|¬H)` for a hypothesis given the per-hypothesis likelihoods of its
/// alternatives in the same hypothesis set: the average likelihood over
/// the alternatives, or a fixed `0.5` when there is exactly one
/// alternative (Design Notes §9).
#[must_use]
pub fn alternative_likelihood(other_likelihoods: &[f64]) -> f64 {
    if other_likelihoods.len() <= 1 {
        0.5
    } else {
        other_likelihoods.iter().sum::<f64>() / other_likelihoods.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn support_maps_onto_fifty_five_to_ninety_five() {
        assert!((likelihood_from_relation(Relation::Support, 0.0) - 0.55).abs() < 1e-9);
        assert!((likelihood_from_relation(Relation::Support, 1.0) - 0.95).abs() < 1e-9);
    }

    #[test]
    fn contradict_maps_onto_inverted_range() {
        assert!((likelihood_from_relation(Relation::Contradict, 0.0) - 0.45).abs() < 1e-9);
        assert!((likelihood_from_relation(Relation::Contradict, 1.0) - 0.05).abs() < 1e-9);
    }

    #[test]
    fn irrelevant_is_always_one_half() {
        assert_eq!(likelihood_from_relation(Relation::Irrelevant, 0.9), 0.5);
    }

    #[test]
    fn strength_out_of_range_is_clamped() {
        let assessment = EvidenceAssessment::new(
            Uid::from_seed(b"ea"),
            Uid::from_seed(b"case"),
            Uid::from_seed(b"h"),
            Uid::from_seed(b"ev"),
            Relation::Support,
            1.7,
            "2026-01-01T00:00:00Z".parse().expect("ts"),
        );
        assert_eq!(assessment.strength, 1.0);
        assert!((assessment.likelihood - 0.95).abs() < 1e-9);
    }

    #[test]
    fn strong_confirming_evidence_raises_posterior() {
        let posterior = bayesian_update(0.5, 0.9);
        assert!(posterior > 0.5);
    }

    #[test]
    fn uninformative_evidence_leaves_prior_essentially_unchanged() {
        let posterior = bayesian_update(0.3, 0.5);
        assert!((posterior - 0.3).abs() < 1e-6);
    }

    #[test]
    fn posterior_is_always_clamped_away_from_extremes() {
        let posterior = bayesian_update(0.999_999_9, 0.95);
        assert!(posterior <= 1.0 - CLAMP_EPSILON);
    }

    #[test]
    fn single_alternative_uses_fixed_one_half() {
        assert_eq!(alternative_likelihood(&[0.8]), 0.5);
        assert_eq!(alternative_likelihood(&[]), 0.5);
    }

    #[test]
    fn multiple_alternatives_average() {
        assert!((alternative_likelihood(&[0.4, 0.6]) - 0.5).abs() < 1e-9);
    }
}
