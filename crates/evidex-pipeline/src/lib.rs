// crates/evidex-pipeline/src/lib.rs
// ============================================================================
// Crate: evidex-pipeline
// Description: Playbook-driven stage orchestration and the autonomous
//              Investigation Loop.
// ============================================================================

//! # evidex-pipeline
//!
//! [`orchestrator`] implements the Pipeline Orchestrator: a [`Playbook`] of
//! named [`Stage`]s run in order against one shared, mutated-in-place
//! [`StageContext`], checkpointed after every successful stage and exposed
//! through a watchable [`RunState`]. [`stages`] supplies the concrete
//! `Stage` implementations for the default playbook and its two named
//! alternates. [`investigation`] implements the Investigation Loop: an
//! autonomous observe/orient/gap-fill/terminate round runner built on top
//! of the Hypothesis Engine and Tool Broker.

#![deny(unsafe_code)]
#![deny(missing_docs)]

pub mod investigation;
pub mod orchestrator;
pub mod stages;

pub use investigation::InvestigationError;
pub use investigation::InvestigationRunner;
pub use orchestrator::DEFAULT_STAGE_ORDER;
pub use orchestrator::Playbook;
pub use orchestrator::PipelineError;
pub use orchestrator::PipelineTracker;
pub use orchestrator::RunState;
pub use orchestrator::RunStatus;
pub use orchestrator::Stage;
pub use orchestrator::StageContext;
pub use orchestrator::StageResult;
pub use orchestrator::StageStatus;
pub use stages::AdversarialEvaluateStage;
pub use stages::AssertionFuseStage;
pub use stages::ForecastGenerateStage;
pub use stages::HypothesisAnalyzeStage;
pub use stages::HypothesisMultiPerspectiveStage;
pub use stages::KgBuildStage;
pub use stages::NarrativeBuildStage;
pub use stages::OsintCollectStage;
pub use stages::QualityScoreStage;
pub use stages::ReportGenerateStage;

/// Builds the full [`Stage`] registry for the default playbook plus the two
/// named alternates, ready to hand to [`PipelineTracker::new`].
#[must_use]
pub fn default_stage_registry(
    broker: std::sync::Arc<evidex_broker::ToolBroker>,
    ledger: std::sync::Arc<dyn evidex_core::interfaces::AuditLedger>,
    ingestion: std::sync::Arc<evidex_ingest::IngestionPipeline>,
    budget_request: evidex_config::BudgetRequest,
    osint_artifact_identity_uid: evidex_core::core::Uid<evidex_core::core::ArtifactIdentityKind>,
) -> Vec<std::sync::Arc<dyn Stage>> {
    vec![
        std::sync::Arc::new(AssertionFuseStage),
        std::sync::Arc::new(HypothesisAnalyzeStage::new(broker.clone(), ledger.clone(), budget_request.clone())),
        std::sync::Arc::new(HypothesisMultiPerspectiveStage::new(broker.clone(), ledger, budget_request.clone(), 3)),
        std::sync::Arc::new(AdversarialEvaluateStage),
        std::sync::Arc::new(NarrativeBuildStage),
        std::sync::Arc::new(KgBuildStage),
        std::sync::Arc::new(ForecastGenerateStage::new(broker.clone(), budget_request)),
        std::sync::Arc::new(QualityScoreStage),
        std::sync::Arc::new(ReportGenerateStage),
        std::sync::Arc::new(OsintCollectStage::new(broker, ingestion, osint_artifact_identity_uid)),
    ]
}
