// crates/evidex-hypothesis/src/quality.rs
// ============================================================================
// Module: Judgment Quality Scoring
// Description: Meta-cognitive score over a finished Judgment.
// Purpose: Implement the `scoreQuality` operation.
// Dependencies: evidex-core
// ============================================================================

//! ## Overview
//! [`score_quality`] is a pure function (no broker call: the dimensions are
//! derived directly from already-persisted entities, not re-asked of an
//! LLM) over a [`QualityInput`], producing a [`QualityReportV1`] across four
//! dimensions: `evidence_coverage` (citations vs. available assertions),
//! `source_diversity` (distinct artifacts behind the cited source claims),
//! `confidence_calibration` (how close cited assertions' confidence is to
//! the judgment's own tier), and `narrative_coherence` (fraction of cited
//! assertions' source claims that fall within a built narrative's window).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use evidex_core::core::ArtifactVersionKind;
use evidex_core::core::Assertion;
use evidex_core::core::Judgment;
use evidex_core::core::Narrative;
use evidex_core::core::SourceClaim;
use evidex_core::core::TraceId;
use evidex_core::core::Uid;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Input / Output
// ============================================================================

/// Everything [`score_quality`] needs to evaluate one judgment.
#[derive(Debug, Clone)]
pub struct QualityInput<'a> {
    /// The judgment being scored.
    pub judgment: &'a Judgment,
    /// Every assertion in the case (used to compute coverage against the
    /// full candidate pool, not just the cited subset).
    pub case_assertions: &'a [Assertion],
    /// Source claims underlying the judgment's cited assertions.
    pub source_claims: &'a [SourceClaim],
    /// Artifact version each source claim's chunk ultimately belongs to,
    /// keyed by `source_claims` index — used to compute source diversity
    /// without re-resolving the chunk graph here.
    pub source_claim_artifacts: &'a [Uid<ArtifactVersionKind>],
    /// Narratives built for the case, if the `narrative_build` stage ran.
    pub narratives: &'a [Narrative],
}

/// Meta-cognitive quality dimensions, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityReportV1 {
    /// Fraction of the case's assertions the judgment cites.
    pub evidence_coverage: f64,
    /// Distinct cited artifacts divided by cited source claims (`1.0` when
    /// every cited claim comes from a different artifact).
    pub source_diversity: f64,
    /// `1.0` minus the mean absolute gap between cited assertions'
    /// confidence and the judgment's tier-implied expected confidence.
    pub confidence_calibration: f64,
    /// Fraction of cited assertions' source claims that fall inside at
    /// least one built narrative's window.
    pub narrative_coherence: f64,
}

impl QualityReportV1 {
    /// Unweighted mean of the four dimensions, a single at-a-glance score.
    #[must_use]
    pub fn overall(&self) -> f64 {
        (self.evidence_coverage + self.source_diversity + self.confidence_calibration + self.narrative_coherence)
            / 4.0
    }
}

// ============================================================================
// SECTION: Score Quality
// ============================================================================

/// Scores `input.judgment`'s quality across the four dimensions, returning
/// the report alongside a fresh `trace_id` for audit correlation.
#[must_use]
pub fn score_quality(input: &QualityInput<'_>) -> (QualityReportV1, TraceId) {
    let cited: BTreeSet<_> = input.judgment.evidence_citations.iter().collect();

    let evidence_coverage = if input.case_assertions.is_empty() {
        0.0
    } else {
        cited.len() as f64 / input.case_assertions.len() as f64
    };

    let source_diversity = if input.source_claim_artifacts.is_empty() {
        0.0
    } else {
        let distinct: BTreeSet<_> = input.source_claim_artifacts.iter().collect();
        distinct.len() as f64 / input.source_claim_artifacts.len() as f64
    };

    let confidence_calibration = confidence_calibration(input.judgment, input.case_assertions, &cited);

    let narrative_coherence = narrative_coherence(input.source_claims, input.narratives);

    let report = QualityReportV1 {
        evidence_coverage: evidence_coverage.clamp(0.0, 1.0),
        source_diversity: source_diversity.clamp(0.0, 1.0),
        confidence_calibration: confidence_calibration.clamp(0.0, 1.0),
        narrative_coherence: narrative_coherence.clamp(0.0, 1.0),
    };
    let trace_id = TraceId::new(format!("quality-{}", Uid::<evidex_core::core::JudgmentKind>::random()));
    (report, trace_id)
}

fn confidence_calibration(
    judgment: &Judgment,
    case_assertions: &[Assertion],
    cited: &BTreeSet<&Uid<evidex_core::core::AssertionKind>>,
) -> f64 {
    let expected = match judgment.answer_tier {
        evidex_core::core::EpistemicTier::Fact => 0.85,
        evidex_core::core::EpistemicTier::Inference => 0.6,
        evidex_core::core::EpistemicTier::Hypothesis => 0.3,
    };
    let cited_assertions: Vec<&Assertion> =
        case_assertions.iter().filter(|assertion| cited.contains(&assertion.uid)).collect();
    if cited_assertions.is_empty() {
        return if expected <= 0.3 { 1.0 } else { 0.0 };
    }
    let mean_confidence: f64 =
        cited_assertions.iter().map(|assertion| assertion.confidence).sum::<f64>() / cited_assertions.len() as f64;
    1.0 - (mean_confidence - expected).abs()
}

fn narrative_coherence(source_claims: &[SourceClaim], narratives: &[Narrative]) -> f64 {
    if source_claims.is_empty() {
        return 0.0;
    }
    let covered = source_claims
        .iter()
        .filter(|claim| narratives.iter().any(|narrative| narrative.source_claim_uids.contains(&claim.uid)))
        .count();
    covered as f64 / source_claims.len() as f64
}
