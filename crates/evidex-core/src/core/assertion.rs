// crates/evidex-core/src/core/assertion.rs
// ============================================================================
// Module: Assertion
// Description: A kind-tagged, confidence-scored value derived from SourceClaims.
// Purpose: Bridge verbatim quotes to structured, fusion-scored facts.
// Dependencies: crate::core::{identifiers, time}
// ============================================================================

//! ## Overview
//! An [`Assertion`] is a structured value derived from one or more
//! [`crate::core::claim::SourceClaim`]s, tagged by [`AssertionValue`] kind.
//! Per Design Notes §9, "ad-hoc dicts become tagged sum types": the assertion
//! payload is a concrete enum, not a free-form JSON blob.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::AssertionKind;
use crate::core::identifiers::CaseKind;
use crate::core::identifiers::SourceClaimKind;
use crate::core::identifiers::Uid;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Assertion Value
// ============================================================================

/// A kind-tagged structured value derived from evidence.
///
/// # Invariants
/// - Variants are stable for serialization and correspond to the data
///   model's `factual` / `relational` / `temporal` assertion kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssertionValue {
    /// A single factual statement about an entity or event.
    Factual {
        /// The subject the fact is about.
        subject: String,
        /// The predicate/claim text.
        predicate: String,
        /// Optional object/value the predicate relates the subject to.
        object: Option<String>,
    },
    /// A relationship between two named entities.
    Relational {
        /// Source entity of the relation.
        source_entity: String,
        /// Relation label (e.g. `"funded_by"`, `"subsidiary_of"`).
        relation: String,
        /// Target entity of the relation.
        target_entity: String,
    },
    /// A temporal fact: something happened within a time window.
    Temporal {
        /// Description of the event.
        description: String,
        /// ISO 8601 start of the window, if known precisely.
        window_start: Option<Timestamp>,
        /// ISO 8601 end of the window, if known precisely.
        window_end: Option<Timestamp>,
    },
}

impl AssertionValue {
    /// Returns the stable kind label for this value.
    #[must_use]
    pub const fn kind_label(&self) -> &'static str {
        match self {
            Self::Factual { .. } => "factual",
            Self::Relational { .. } => "relational",
            Self::Temporal { .. } => "temporal",
        }
    }
}

// ============================================================================
// SECTION: Assertion
// ============================================================================

/// A structured, confidence-scored fact derived from one or more source claims.
///
/// # Invariants
/// - `source_claim_uids` is non-empty.
/// - `confidence` is in `[0, 1]` and reflects Fusion Core output, never an
///   ad-hoc LLM self-report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    /// Assertion uid.
    pub uid: Uid<AssertionKind>,
    /// Owning case.
    pub case_uid: Uid<CaseKind>,
    /// Structured, kind-tagged value.
    pub value: AssertionValue,
    /// Source claims this assertion is derived from. Must be non-empty.
    pub source_claim_uids: Vec<Uid<SourceClaimKind>>,
    /// Fusion-derived confidence in `[0, 1]`.
    pub confidence: f64,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Last-mutation timestamp.
    pub updated_at: Timestamp,
}

/// Errors raised when constructing an [`Assertion`] violates an invariant.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AssertionError {
    /// No source claims were supplied.
    #[error("assertion must cite at least one source claim")]
    NoSourceClaims,
    /// Confidence was outside `[0, 1]`.
    #[error("confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f64),
}

impl Assertion {
    /// Constructs a new assertion, validating the non-empty-citation and
    /// confidence-range invariants.
    ///
    /// # Errors
    ///
    /// Returns [`AssertionError`] when `source_claim_uids` is empty or
    /// `confidence` is outside `[0, 1]`.
    pub fn new(
        uid: Uid<AssertionKind>,
        case_uid: Uid<CaseKind>,
        value: AssertionValue,
        source_claim_uids: Vec<Uid<SourceClaimKind>>,
        confidence: f64,
        created_at: Timestamp,
    ) -> Result<Self, AssertionError> {
        if source_claim_uids.is_empty() {
            return Err(AssertionError::NoSourceClaims);
        }
        if !(0.0..=1.0).contains(&confidence) {
            return Err(AssertionError::ConfidenceOutOfRange(confidence));
        }
        Ok(Self {
            uid,
            case_uid,
            value,
            source_claim_uids,
            confidence,
            created_at,
            updated_at: created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> Timestamp {
        "2026-01-01T00:00:00Z".parse().expect("ts")
    }

    #[test]
    fn rejects_empty_source_claims() {
        let err = Assertion::new(
            Uid::from_seed(b"a"),
            Uid::from_seed(b"case"),
            AssertionValue::Factual {
                subject: "X".to_string(),
                predicate: "did Y".to_string(),
                object: None,
            },
            vec![],
            0.7,
            ts(),
        )
        .expect_err("empty citations");
        assert_eq!(err, AssertionError::NoSourceClaims);
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let err = Assertion::new(
            Uid::from_seed(b"a"),
            Uid::from_seed(b"case"),
            AssertionValue::Factual {
                subject: "X".to_string(),
                predicate: "did Y".to_string(),
                object: None,
            },
            vec![Uid::from_seed(b"sc")],
            1.5,
            ts(),
        )
        .expect_err("out of range");
        assert_eq!(err, AssertionError::ConfidenceOutOfRange(1.5));
    }
}
