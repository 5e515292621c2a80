// crates/evidex-core/src/core/chunk.rs
// ============================================================================
// Module: Chunk
// Description: Ordered text spans within an ArtifactVersion, with relocation anchors.
// Purpose: Let downstream evidence survive re-fetch of the underlying source.
// Dependencies: crate::core::{identifiers, time}
// ============================================================================

//! ## Overview
//! A [`Chunk`] is an ordered span of text within an [`crate::core::artifact::ArtifactVersion`].
//! Each chunk carries an [`AnchorSet`] describing how to relocate the span
//! after a re-fetch, and an [`AnchorHealth`] record of which strategies
//! currently succeed. The offline regression target is an anchor-locate
//! rate of at least 98% across the fixture suite (spec §8).

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ArtifactVersionKind;
use crate::core::identifiers::CaseKind;
use crate::core::identifiers::ChunkKind;
use crate::core::identifiers::Uid;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Anchors
// ============================================================================

/// A single relocation strategy for a chunk.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anchor {
    /// W3C text-quote selector: exact span plus surrounding context.
    TextQuote {
        /// The exact quoted text.
        exact: String,
        /// Text immediately preceding `exact`, for disambiguation.
        prefix: String,
        /// Text immediately following `exact`, for disambiguation.
        suffix: String,
    },
    /// Normalized character-offset range within the chunk's artifact version.
    TextPosition {
        /// Inclusive start offset.
        start: u64,
        /// Exclusive end offset.
        end: u64,
    },
    /// A structural hint (e.g. an HTML element path or a page number).
    Structural {
        /// Opaque structural path, e.g. `"article > p:nth-of-type(4)"`.
        path: String,
    },
}

/// The set of anchors recorded for one chunk.
///
/// # Invariants
/// - Non-empty after successful ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AnchorSet {
    /// Anchors, most to least specific.
    pub anchors: Vec<Anchor>,
}

/// Per-strategy relocation success record.
///
/// # Invariants
/// - `checked_at` reflects the most recent relocation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorHealth {
    /// Whether the text-quote anchor currently relocates the span.
    pub text_quote_ok: bool,
    /// Whether the text-position anchor currently relocates the span.
    pub text_position_ok: bool,
    /// Whether the structural anchor currently relocates the span.
    pub structural_ok: bool,
}

impl AnchorHealth {
    /// An anchor set that has not yet been checked (fail-closed default).
    #[must_use]
    pub const fn unchecked() -> Self {
        Self {
            text_quote_ok: false,
            text_position_ok: false,
            structural_ok: false,
        }
    }

    /// Returns whether at least one strategy currently locates the chunk.
    #[must_use]
    pub const fn locates(&self) -> bool {
        self.text_quote_ok || self.text_position_ok || self.structural_ok
    }
}

// ============================================================================
// SECTION: Chunk
// ============================================================================

/// An ordered span of text within an [`crate::core::artifact::ArtifactVersion`].
///
/// # Invariants
/// - `(artifact_version_uid, ordinal)` is unique.
/// - Anchors suffice to re-locate the chunk with ≥98% success across the
///   fixture suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk uid.
    pub uid: Uid<ChunkKind>,
    /// Owning case.
    pub case_uid: Uid<CaseKind>,
    /// Parent artifact version.
    pub artifact_version_uid: Uid<ArtifactVersionKind>,
    /// Zero-based ordinal position within the artifact version.
    pub ordinal: u32,
    /// Chunk text.
    pub text: String,
    /// Relocation anchors.
    pub anchor_set: AnchorSet,
    /// Current anchor health.
    pub anchor_health: AnchorHealth,
    /// Set to `false` when embedding failed after retries.
    pub embedding_synced: bool,
    /// Creation timestamp.
    pub created_at: Timestamp,
}
