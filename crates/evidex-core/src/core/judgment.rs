// crates/evidex-core/src/core/judgment.rs
// ============================================================================
// Module: Judgment
// Description: A titled answer citing Assertions; the unit exported as "the result".
// Purpose: Pair a conclusion with the epistemic tier its citations actually support.
// Dependencies: crate::core::{identifiers, time}
// ============================================================================

//! ## Overview
//! A [`Judgment`] is the system's exported result. The grounding gate
//! ([`EpistemicTier::from_citation_count`]) statically prevents a judgment
//! from being labeled at a higher epistemic tier than its citations
//! support: no citation means the tier is capped at [`EpistemicTier::Hypothesis`],
//! and an attempted `Fact` label without citations must be rewritten down
//! to an empty answer with `cannot_answer_reason = "evidence_insufficient"`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::AssertionKind;
use crate::core::identifiers::CaseKind;
use crate::core::identifiers::JudgmentKind;
use crate::core::identifiers::Uid;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Epistemic Tier
// ============================================================================

/// The epistemic tier a judgment's answer is labeled at.
///
/// Ordered from strongest to weakest claim strength:
/// `Fact > Inference > Hypothesis`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EpistemicTier {
    /// Weakest claim: a candidate explanation not yet corroborated.
    Hypothesis,
    /// A conclusion reasoned from cited assertions.
    Inference,
    /// The strongest claim: directly supported by cited evidence.
    Fact,
}

impl EpistemicTier {
    /// Applies the grounding gate: the highest tier a judgment may be
    /// labeled at, given it cites `citation_count` assertions.
    ///
    /// No citations caps the tier at [`EpistemicTier::Hypothesis`],
    /// regardless of what tier was requested.
    #[must_use]
    pub const fn from_citation_count(citation_count: usize) -> Self {
        if citation_count == 0 {
            Self::Hypothesis
        } else {
            Self::Fact
        }
    }

    /// Caps a requested tier at the maximum the citation count supports.
    #[must_use]
    pub const fn capped(requested: Self, citation_count: usize) -> Self {
        let ceiling = Self::from_citation_count(citation_count);
        if matches!(
            (requested, ceiling),
            (Self::Fact, Self::Hypothesis) | (Self::Inference, Self::Hypothesis)
        ) {
            ceiling
        } else {
            requested
        }
    }
}

// ============================================================================
// SECTION: Judgment
// ============================================================================

/// A titled answer citing assertions; the unit exported as "the result".
///
/// # Invariants
/// - If `answer_tier == Fact` and `evidence_citations` is empty, the
///   judgment is invalid: the caller must rewrite it per
///   [`Judgment::grounding_gate`] before persisting.
/// - `answer_text` is empty iff `cannot_answer_reason` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgment {
    /// Judgment uid.
    pub uid: Uid<JudgmentKind>,
    /// Owning case.
    pub case_uid: Uid<CaseKind>,
    /// Short title summarizing the judgment.
    pub title: String,
    /// The epistemic tier this judgment is labeled at.
    pub answer_tier: EpistemicTier,
    /// The answer text. Empty iff `cannot_answer_reason` is set.
    pub answer_text: String,
    /// Assertions cited in support of `answer_text`.
    pub evidence_citations: Vec<Uid<AssertionKind>>,
    /// Set when the grounding gate rejected a stronger answer; e.g.
    /// `"evidence_insufficient"`.
    pub cannot_answer_reason: Option<String>,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

impl Judgment {
    /// Applies the grounding gate to a proposed judgment: if `answer_tier`
    /// requests [`EpistemicTier::Fact`] but no citations are present, the
    /// answer is rewritten to empty with `cannot_answer_reason` set.
    /// Otherwise the judgment is returned unchanged.
    #[must_use]
    pub fn grounding_gate(mut self) -> Self {
        if self.answer_tier == EpistemicTier::Fact && self.evidence_citations.is_empty() {
            self.answer_text.clear();
            self.cannot_answer_reason = Some("evidence_insufficient".to_string());
            self.answer_tier = EpistemicTier::Hypothesis;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(tier: EpistemicTier, citations: Vec<Uid<AssertionKind>>) -> Judgment {
        Judgment {
            uid: Uid::from_seed(b"j"),
            case_uid: Uid::from_seed(b"case"),
            title: "what happened".to_string(),
            answer_tier: tier,
            answer_text: "the bridge closed".to_string(),
            evidence_citations: citations,
            cannot_answer_reason: None,
            created_at: "2026-01-01T00:00:00Z".parse().expect("ts"),
        }
    }

    #[test]
    fn fact_without_citations_degrades_to_empty_answer() {
        let gated = base(EpistemicTier::Fact, vec![]).grounding_gate();
        assert_eq!(gated.answer_tier, EpistemicTier::Hypothesis);
        assert_eq!(gated.answer_text, "");
        assert_eq!(gated.cannot_answer_reason.as_deref(), Some("evidence_insufficient"));
    }

    #[test]
    fn fact_with_citations_passes_unchanged() {
        let gated = base(EpistemicTier::Fact, vec![Uid::from_seed(b"a")]).grounding_gate();
        assert_eq!(gated.answer_tier, EpistemicTier::Fact);
        assert_eq!(gated.answer_text, "the bridge closed");
        assert!(gated.cannot_answer_reason.is_none());
    }

    #[test]
    fn from_citation_count_caps_at_hypothesis() {
        assert_eq!(EpistemicTier::from_citation_count(0), EpistemicTier::Hypothesis);
        assert_eq!(EpistemicTier::from_citation_count(3), EpistemicTier::Fact);
    }

    #[test]
    fn tier_ordering_places_fact_above_hypothesis() {
        assert!(EpistemicTier::Fact > EpistemicTier::Inference);
        assert!(EpistemicTier::Inference > EpistemicTier::Hypothesis);
    }
}
