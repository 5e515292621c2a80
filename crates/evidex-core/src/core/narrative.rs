// crates/evidex-core/src/core/narrative.rs
// ============================================================================
// Module: Narrative
// Description: A themed grouping of SourceClaims spanning a time window.
// Purpose: Let the narrative_build pipeline stage surface a coherent thread of claims.
// Dependencies: crate::core::{identifiers, time}
// ============================================================================

//! ## Overview
//! A [`Narrative`] groups [`crate::core::claim::SourceClaim`]s under a
//! shared theme and time window, produced by the `narrative_build` pipeline
//! stage. It is a grouping, not generated prose: the analyst-facing prose
//! lives in a [`crate::core::judgment::Judgment`], which cites
//! [`crate::core::assertion::Assertion`]s, not narratives directly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::CaseKind;
use crate::core::identifiers::NarrativeKind;
use crate::core::identifiers::SourceClaimKind;
use crate::core::identifiers::Uid;
use crate::core::time::Timestamp;

/// A themed grouping of source claims spanning a time window.
///
/// # Invariants
/// - `window_start <= window_end` whenever both are set.
/// - `source_claim_uids` is non-empty: an empty narrative carries no thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    /// Narrative uid.
    pub uid: Uid<NarrativeKind>,
    /// Owning case.
    pub case_uid: Uid<CaseKind>,
    /// Short theme label, e.g. `"supply disruption"`.
    pub theme: String,
    /// Source claims grouped under this theme, in chronological order.
    pub source_claim_uids: Vec<Uid<SourceClaimKind>>,
    /// Start of the time window this narrative spans, if known.
    pub window_start: Option<Timestamp>,
    /// End of the time window this narrative spans, if known.
    pub window_end: Option<Timestamp>,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

/// Errors raised when a [`Narrative`] fails one of its invariants.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NarrativeError {
    /// No source claims were supplied.
    #[error("narrative has no source claims")]
    EmptyGrouping,
    /// `window_start` was after `window_end`.
    #[error("narrative window start is after window end")]
    InvertedWindow,
}

impl Narrative {
    /// Validates the non-empty-grouping and window-ordering invariants.
    ///
    /// # Errors
    ///
    /// Returns [`NarrativeError`] when `source_claim_uids` is empty or the
    /// time window is inverted.
    pub fn validate(&self) -> Result<(), NarrativeError> {
        if self.source_claim_uids.is_empty() {
            return Err(NarrativeError::EmptyGrouping);
        }
        if let (Some(start), Some(end)) = (&self.window_start, &self.window_end) {
            if start.as_offset_date_time() > end.as_offset_date_time() {
                return Err(NarrativeError::InvertedWindow);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn narrative(
        claims: Vec<Uid<SourceClaimKind>>,
        window: Option<(&str, &str)>,
    ) -> Narrative {
        let (window_start, window_end) = match window {
            Some((start, end)) => (Some(start.parse().expect("ts")), Some(end.parse().expect("ts"))),
            None => (None, None),
        };
        Narrative {
            uid: Uid::from_seed(b"nar"),
            case_uid: Uid::from_seed(b"case"),
            theme: "supply disruption".to_string(),
            source_claim_uids: claims,
            window_start,
            window_end,
            created_at: "2026-01-01T00:00:00Z".parse().expect("ts"),
        }
    }

    #[test]
    fn empty_grouping_fails() {
        assert!(narrative(vec![], None).validate().is_err());
    }

    #[test]
    fn nonempty_grouping_passes() {
        let n = narrative(vec![Uid::from_seed(b"sc")], None);
        assert!(n.validate().is_ok());
    }

    #[test]
    fn inverted_window_fails() {
        let n = narrative(
            vec![Uid::from_seed(b"sc")],
            Some(("2026-02-01T00:00:00Z", "2026-01-01T00:00:00Z")),
        );
        assert!(n.validate().is_err());
    }

    #[test]
    fn ordered_window_passes() {
        let n = narrative(
            vec![Uid::from_seed(b"sc")],
            Some(("2026-01-01T00:00:00Z", "2026-02-01T00:00:00Z")),
        );
        assert!(n.validate().is_ok());
    }
}
