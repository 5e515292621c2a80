// crates/evidex-core/src/core/claim.rs
// ============================================================================
// Module: SourceClaim
// Description: A verbatim quote plus W3C-style selectors identifying its span.
// Purpose: Anchor every downstream inference to an exact source fragment.
// Dependencies: crate::core::{chunk, identifiers, time}
// ============================================================================

//! ## Overview
//! A [`SourceClaim`] is the atomic unit of grounded evidence: a verbatim
//! quote that must be a substring of its referenced chunk's text (for text
//! modality). The case-wide grounding rate across all source claims must be
//! at least 95% (spec §8); this module only carries the data — the
//! substring check lives at the write boundary in the Evidence Model Store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::CaseKind;
use crate::core::identifiers::ChunkKind;
use crate::core::identifiers::EvidenceKind;
use crate::core::identifiers::SourceClaimKind;
use crate::core::identifiers::Uid;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Modality
// ============================================================================

/// Modality of the underlying source span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    /// Plain text.
    Text,
    /// A still image.
    Image,
    /// A video clip.
    Video,
    /// An audio clip.
    Audio,
}

/// A time range within a media artifact, used when `modality != Text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaTimeRange {
    /// Start offset, in milliseconds, within the media artifact.
    pub start_ms: u64,
    /// End offset, in milliseconds, within the media artifact.
    pub end_ms: u64,
}

// ============================================================================
// SECTION: Selectors
// ============================================================================

/// A W3C Web Annotation text-quote selector.
///
/// # Invariants
/// - `exact` is the verbatim quoted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextQuoteSelector {
    /// Exact quoted text.
    pub exact: String,
    /// Text immediately preceding the quote.
    #[serde(default)]
    pub prefix: String,
    /// Text immediately following the quote.
    #[serde(default)]
    pub suffix: String,
}

// ============================================================================
// SECTION: SourceClaim
// ============================================================================

/// A verbatim quote plus selectors identifying its exact source span.
///
/// # Invariants
/// - For `modality == Text`, `quote` is a substring of the text of the
///   chunk referenced transitively through `evidence_uid`.
/// - Case-wide grounding rate (fraction of source claims whose quote check
///   passes) must be ≥95%.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceClaim {
    /// Source claim uid.
    pub uid: Uid<SourceClaimKind>,
    /// Owning case.
    pub case_uid: Uid<CaseKind>,
    /// Evidence this claim is grounded in.
    pub evidence_uid: Uid<EvidenceKind>,
    /// Chunk the quote was extracted from (denormalized for fast substring
    /// re-verification without a join).
    pub chunk_uid: Uid<ChunkKind>,
    /// Verbatim quoted text.
    pub quote: String,
    /// Text-quote selector locating the quote.
    pub selector: TextQuoteSelector,
    /// Modality of the underlying span.
    pub modality: Modality,
    /// Media segment reference, set when `modality != Text`.
    pub segment_ref: Option<String>,
    /// Media time range, set when `modality != Text`.
    pub media_time_range: Option<MediaTimeRange>,
    /// Original-language text, if the source was not authored in the
    /// working language.
    pub original_language_text: Option<String>,
    /// Translation of `original_language_text`, if translated.
    pub translation_text: Option<String>,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

impl SourceClaim {
    /// Checks the grounding invariant for text-modality claims: `quote`
    /// must be a substring of `chunk_text`. Non-text modalities are
    /// trivially grounded by this check (their grounding is enforced via
    /// `segment_ref`/`media_time_range` instead).
    #[must_use]
    pub fn is_grounded_in(&self, chunk_text: &str) -> bool {
        match self.modality {
            Modality::Text => chunk_text.contains(&self.quote),
            Modality::Image | Modality::Video | Modality::Audio => {
                self.segment_ref.is_some() || self.media_time_range.is_some()
            }
        }
    }
}
