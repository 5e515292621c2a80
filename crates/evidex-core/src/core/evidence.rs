// crates/evidex-core/src/core/evidence.rs
// ============================================================================
// Module: Evidence
// Description: A policy-decorated, first-class reference from a Chunk.
// Purpose: Carry license, PII, and retention metadata downstream of a Chunk.
// Dependencies: crate::core::{identifiers, time}
// ============================================================================

//! ## Overview
//! [`Evidence`] is the handle every downstream claim cites: at least one
//! `Evidence` must back every [`crate::core::claim::SourceClaim`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::CaseKind;
use crate::core::identifiers::ChunkKind;
use crate::core::identifiers::EvidenceKind;
use crate::core::identifiers::Uid;
use crate::core::time::Timestamp;

/// Retention policy applied to an [`Evidence`] record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Retained indefinitely, subject to case deletion cascade.
    Indefinite,
    /// Retained for a fixed number of days from `created_at`.
    FixedDays,
    /// Must be purged as soon as it is no longer cited by any live claim.
    PurgeOnDereference,
}

/// A policy-decorated reference from a [`crate::core::chunk::Chunk`].
///
/// # Invariants
/// - `chunk_uid` refers to a chunk owned by the same `case_uid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    /// Evidence uid.
    pub uid: Uid<EvidenceKind>,
    /// Owning case.
    pub case_uid: Uid<CaseKind>,
    /// Chunk this evidence references.
    pub chunk_uid: Uid<ChunkKind>,
    /// License string for the underlying source, if known.
    pub license: Option<String>,
    /// Whether the evidence is flagged as containing personally
    /// identifiable information.
    pub pii_flag: bool,
    /// Retention policy for this evidence.
    pub retention_policy: RetentionPolicy,
    /// Creation timestamp.
    pub created_at: Timestamp,
}
