// crates/evidex-core/src/core/hypothesis.rs
// ============================================================================
// Module: Hypothesis
// Description: A labeled proposition scored against supporting/contradicting assertions.
// Purpose: Carry ACH/Bayesian scoring state and adversarial-test results.
// Dependencies: crate::core::{identifiers, time}
// ============================================================================

//! ## Overview
//! A [`Hypothesis`] is a candidate explanation. `supporting_assertion_uids`
//! and `contradicting_assertion_uids` must be disjoint: an assertion may
//! back or refute a hypothesis, never both.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::AssertionKind;
use crate::core::identifiers::CaseKind;
use crate::core::identifiers::HypothesisKind;
use crate::core::identifiers::Uid;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Gaps and Adversarial Testing
// ============================================================================

/// A gap identified during hypothesis analysis: evidence that would most
/// change the hypothesis's standing but is currently missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gap {
    /// Human-readable description of the missing evidence.
    pub description: String,
    /// Priority in `[0, 1]`; lower values are higher priority (spec's
    /// `gap_priority_threshold` in the Investigation Loop is a ceiling).
    pub priority: f64,
}

/// Outcome of adversarially testing a hypothesis (e.g. steel-manning the
/// strongest counter-argument and checking whether it still holds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdversarialResult {
    /// Whether the hypothesis survived adversarial testing.
    pub survived: bool,
    /// The strongest counter-argument considered.
    pub strongest_counter: String,
    /// Rebuttal to the strongest counter-argument, if the hypothesis survived.
    pub rebuttal: Option<String>,
}

// ============================================================================
// SECTION: Hypothesis
// ============================================================================

/// A labeled candidate explanation evaluated against assertions.
///
/// # Invariants
/// - `set(supporting_assertion_uids) ∩ set(contradicting_assertion_uids) = ∅`.
/// - `coverage_score` and `confidence` are in `[0, 1]`.
/// - `prior_probability`/`posterior_probability` are set only in Bayesian mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    /// Hypothesis uid.
    pub uid: Uid<HypothesisKind>,
    /// Owning case.
    pub case_uid: Uid<CaseKind>,
    /// Human-readable hypothesis label/statement.
    pub label: String,
    /// Assertions supporting this hypothesis.
    pub supporting_assertion_uids: Vec<Uid<AssertionKind>>,
    /// Assertions contradicting this hypothesis.
    pub contradicting_assertion_uids: Vec<Uid<AssertionKind>>,
    /// Fraction of relevant evidence this hypothesis accounts for, `[0, 1]`.
    pub coverage_score: f64,
    /// Overall confidence in `[0, 1]`.
    pub confidence: f64,
    /// Outstanding evidence gaps, most important first.
    pub gap_list: Vec<Gap>,
    /// Bayesian prior probability, set only in Bayesian scoring mode.
    pub prior_probability: Option<f64>,
    /// Bayesian posterior probability, set only in Bayesian scoring mode.
    pub posterior_probability: Option<f64>,
    /// Result of adversarial testing, if performed.
    pub adversarial_result: Option<AdversarialResult>,
    /// Persona that generated this hypothesis, when produced via
    /// `multi_perspective` (spec §4.8).
    pub persona: Option<String>,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Last-mutation timestamp.
    pub updated_at: Timestamp,
}

/// Errors raised when an assertion/hypothesis relationship violates an
/// invariant.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HypothesisError {
    /// An assertion appeared in both the supporting and contradicting sets.
    #[error("assertion {0} appears in both supporting and contradicting sets")]
    AssertionInBothSets(String),
}

impl Hypothesis {
    /// Validates the disjointness invariant between the supporting and
    /// contradicting assertion sets.
    ///
    /// # Errors
    ///
    /// Returns [`HypothesisError::AssertionInBothSets`] when an assertion
    /// uid appears in both lists.
    pub fn check_disjoint_assertions(&self) -> Result<(), HypothesisError> {
        let supporting: BTreeSet<_> = self.supporting_assertion_uids.iter().collect();
        for contradicting in &self.contradicting_assertion_uids {
            if supporting.contains(contradicting) {
                return Err(HypothesisError::AssertionInBothSets(contradicting.to_wire_string()));
            }
        }
        Ok(())
    }
}
