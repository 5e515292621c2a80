// crates/evidex-core/src/core/investigation.rs
// ============================================================================
// Module: Investigation
// Description: An autonomous multi-round gap-filling loop over a case.
// Purpose: Record the observe/orient/gap-fill rounds the Investigation Loop runs.
// Dependencies: crate::core::{identifiers, time}
// ============================================================================

//! ## Overview
//! An [`Investigation`] records one run of the Investigation Loop
//! (observe → orient → gap-fill → terminate), bounded by
//! [`InvestigationConfig::max_rounds`] and terminated early when the gap
//! list empties or an operator cancels.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ActorId;
use crate::core::identifiers::CaseKind;
use crate::core::identifiers::InvestigationKind;
use crate::core::identifiers::Uid;
use crate::core::time::Timestamp;

/// Bounds and thresholds for one Investigation Loop run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InvestigationConfig {
    /// Maximum number of observe/orient/gap-fill rounds before forced
    /// termination.
    pub max_rounds: u32,
    /// Only gaps with priority at or below this threshold are dispatched
    /// for gap-filling (lower priority value means higher importance).
    pub gap_priority_threshold: f64,
    /// Minimum evidence count a gap-fill round must produce to count as
    /// progress.
    pub min_evidence_per_round: u32,
}

/// Current lifecycle status of an investigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestigationStatus {
    /// Currently running a round.
    Running,
    /// Terminated because the gap list emptied or rounds were exhausted.
    Completed,
    /// Terminated by operator cancellation.
    Cancelled,
}

/// A summary of one observe/orient/gap-fill round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestigationRound {
    /// Zero-based round index.
    pub round_index: u32,
    /// Number of gaps dispatched for gap-filling this round.
    pub gaps_dispatched: u32,
    /// Number of new evidence items ingested this round.
    pub evidence_ingested: u32,
    /// Round completion timestamp.
    pub completed_at: Timestamp,
}

/// An autonomous multi-round gap-filling loop run.
///
/// # Invariants
/// - `rounds.len() <= config.max_rounds as usize`.
/// - `status == Cancelled` implies `cancelled_by.is_some()`.
/// - `completed_at` or `cancelled_at` is set only once `status != Running`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investigation {
    /// Investigation uid.
    pub uid: Uid<InvestigationKind>,
    /// Owning case.
    pub case_uid: Uid<CaseKind>,
    /// Stable label for the event that triggered this investigation.
    pub trigger_event: String,
    /// Loop bounds and thresholds.
    pub config: InvestigationConfig,
    /// Completed rounds, in order.
    pub rounds: Vec<InvestigationRound>,
    /// Whether the gap list has emptied.
    pub gap_resolved: bool,
    /// Current lifecycle status.
    pub status: InvestigationStatus,
    /// Principal that cancelled the run, set only when `status == Cancelled`.
    pub cancelled_by: Option<ActorId>,
    /// Start timestamp.
    pub started_at: Timestamp,
    /// Completion timestamp, set once `status != Running`.
    pub completed_at: Option<Timestamp>,
}

impl Investigation {
    /// Returns whether the run should terminate: the gap list has
    /// resolved, or `rounds.len()` has reached `config.max_rounds`.
    #[must_use]
    pub fn should_terminate(&self) -> bool {
        self.gap_resolved || self.rounds.len() as u32 >= self.config.max_rounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn investigation(rounds: u32, gap_resolved: bool, max_rounds: u32) -> Investigation {
        Investigation {
            uid: Uid::from_seed(b"inv"),
            case_uid: Uid::from_seed(b"case"),
            trigger_event: "new_artifact_ingested".to_string(),
            config: InvestigationConfig {
                max_rounds,
                gap_priority_threshold: 0.5,
                min_evidence_per_round: 1,
            },
            rounds: (0..rounds)
                .map(|i| InvestigationRound {
                    round_index: i,
                    gaps_dispatched: 1,
                    evidence_ingested: 2,
                    completed_at: "2026-01-01T00:00:00Z".parse().expect("ts"),
                })
                .collect(),
            gap_resolved,
            status: InvestigationStatus::Running,
            cancelled_by: None,
            started_at: "2026-01-01T00:00:00Z".parse().expect("ts"),
            completed_at: None,
        }
    }

    #[test]
    fn terminates_when_gap_resolved() {
        assert!(investigation(1, true, 5).should_terminate());
    }

    #[test]
    fn terminates_when_max_rounds_reached() {
        assert!(investigation(5, false, 5).should_terminate());
    }

    #[test]
    fn continues_while_gaps_remain_and_rounds_available() {
        assert!(!investigation(2, false, 5).should_terminate());
    }
}
