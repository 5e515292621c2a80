// crates/evidex-core/src/core/case.rs
// ============================================================================
// Module: Case
// Description: The investigation root entity; owns all child entities.
// Purpose: Scope and cascade-delete every other entity in the data model.
// Dependencies: crate::core::{identifiers, time}
// ============================================================================

//! ## Overview
//! A [`Case`] is a named investigation and the ownership root for every
//! other entity. Deleting a case cascades to everything keyed by its
//! `case_uid`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ActorId;
use crate::core::identifiers::CaseKind;
use crate::core::identifiers::Uid;
use crate::core::time::Timestamp;

/// A named investigation; ownership root for all analysis state.
///
/// # Invariants
/// - `uid` is stable for the lifetime of the case.
/// - Deleting a case cascades to every entity keyed by `uid` as `case_uid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    /// Case identifier.
    pub uid: Uid<CaseKind>,
    /// Human-readable case title.
    pub title: String,
    /// Actor who created the case, if known.
    pub actor_id: Option<ActorId>,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Last-mutation timestamp.
    pub updated_at: Timestamp,
}

impl Case {
    /// Constructs a new case at creation time (`created_at == updated_at`).
    #[must_use]
    pub fn new(
        uid: Uid<CaseKind>,
        title: impl Into<String>,
        actor_id: Option<ActorId>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            uid,
            title: title.into(),
            actor_id,
            created_at,
            updated_at: created_at,
        }
    }
}
