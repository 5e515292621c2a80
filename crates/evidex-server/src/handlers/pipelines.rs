// crates/evidex-server/src/handlers/pipelines.rs
// ============================================================================
// Module: Pipeline Handlers
// Description: Runs a playbook (or a single stage) against a case's evidence.
// Purpose: Implement `POST /cases/{uid}/pipelines/{full_analysis,run_stage}`.
// Dependencies: axum, evidex-contract, evidex-pipeline
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use evidex_contract::types::FullAnalysisRequest;
use evidex_contract::types::PipelineRunResponse;
use evidex_contract::types::RunStageRequest;
use evidex_core::core::CaseKind;
use evidex_core::core::RunKind;
use evidex_core::core::Timestamp;
use evidex_core::core::Uid;
use evidex_core::error::ErrorKind;
use evidex_pipeline::Playbook;
use evidex_pipeline::PipelineTracker;
use evidex_pipeline::StageContext;
use evidex_pipeline::default_stage_registry;
use time::OffsetDateTime;

use crate::error::ApiError;
use crate::state::AppState;

async fn load_stage_context(state: &AppState, case_uid: Uid<CaseKind>) -> Result<StageContext, ApiError> {
    Ok(StageContext {
        case_uid: Some(case_uid),
        source_claims: state.store.list_source_claims_by_case(case_uid).await?,
        evidence: state.store.list_evidence_by_case(case_uid).await?,
        assertions: state.store.list_assertions_by_case(case_uid).await?,
        hypotheses: state.store.list_hypotheses_by_case(case_uid).await?,
        narratives: state.store.list_narratives_by_case(case_uid).await?,
        judgment: None,
        stage_outputs: std::collections::BTreeMap::new(),
    })
}

async fn persist_stage_context(state: &AppState, ctx: &StageContext) -> Result<(), ApiError> {
    for assertion in &ctx.assertions {
        if state.store.get_assertion(assertion.uid).await?.is_none() {
            state.store.create_assertion(assertion).await?;
        }
    }
    for hypothesis in &ctx.hypotheses {
        if state.store.get_hypothesis(hypothesis.uid).await?.is_none() {
            state.store.create_hypothesis(hypothesis).await?;
        }
    }
    for narrative in &ctx.narratives {
        if state.store.get_narrative(narrative.uid).await?.is_none() {
            state.store.create_narrative(narrative).await?;
        }
    }
    if let Some(judgment) = &ctx.judgment {
        if state.store.get_judgment(judgment.uid).await?.is_none() {
            state.store.create_judgment(judgment).await?;
        }
    }
    Ok(())
}

async fn tracker_for(
    state: &Arc<AppState>,
    case_uid: Uid<CaseKind>,
    now: Timestamp,
) -> Result<PipelineTracker, ApiError> {
    let osint_identity = state.osint_artifact_identity(case_uid, now).await?;
    let stages = default_stage_registry(
        state.broker.clone(),
        state.ledger.clone(),
        state.ingestion.clone(),
        state.budget_request(),
        osint_identity,
    );
    Ok(PipelineTracker::new(stages, state.checkpoints.clone()))
}

/// `POST /cases/{uid}/pipelines/full_analysis`.
///
/// # Errors
///
/// Returns [`ApiError::not_found`] if the case does not exist, or
/// [`ApiError`] if the run fails.
pub async fn full_analysis(
    State(state): State<Arc<AppState>>,
    Path(case_uid): Path<Uid<CaseKind>>,
    Json(request): Json<FullAnalysisRequest>,
) -> Result<Json<PipelineRunResponse>, ApiError> {
    if state.store.get_case(case_uid).await?.is_none() {
        return Err(ApiError::not_found("case", case_uid));
    }
    let now = Timestamp::new(OffsetDateTime::now_utc());
    let playbook = match request.playbook_name.as_deref() {
        Some("hypothesis_multi_perspective") => Playbook::hypothesis_multi_perspective(),
        Some("osint_collect") => Playbook::osint_collect(),
        _ => Playbook::default_playbook(),
    };

    let tracker = tracker_for(&state, case_uid, now).await?;
    let mut ctx = load_stage_context(&state, case_uid).await?;
    let run_id = Uid::<RunKind>::random();
    let results = tracker.run(run_id, case_uid, &playbook, &mut ctx, now).await.map_err(|err| {
        ApiError::new(err.kind(), err.to_string())
    })?;
    persist_stage_context(&state, &ctx).await?;

    let run_state = tracker.run_state(run_id).ok_or_else(|| ApiError::new(ErrorKind::Internal, "run state missing"))?;
    Ok(Json(PipelineRunResponse {
        run_uid: run_id.to_wire_string(),
        status: format!("{:?}", run_state.status).to_lowercase(),
        completed_stages: results.into_iter().map(|result| result.stage).collect(),
    }))
}

/// `POST /cases/{uid}/pipelines/run_stage` — runs a single named stage in
/// isolation, against the case's currently persisted evidence state.
///
/// # Errors
///
/// Returns [`ApiError::not_found`] if the case or stage does not exist, or
/// [`ApiError`] if the run fails.
pub async fn run_stage(
    State(state): State<Arc<AppState>>,
    Path(case_uid): Path<Uid<CaseKind>>,
    Json(request): Json<RunStageRequest>,
) -> Result<Json<PipelineRunResponse>, ApiError> {
    if state.store.get_case(case_uid).await?.is_none() {
        return Err(ApiError::not_found("case", case_uid));
    }
    let now = Timestamp::new(OffsetDateTime::now_utc());
    let playbook = Playbook {
        name: "single_stage".to_string(),
        stages: vec![request.stage_name.clone()],
        stage_config: std::collections::BTreeMap::new(),
    };

    let tracker = tracker_for(&state, case_uid, now).await?;
    let mut ctx = load_stage_context(&state, case_uid).await?;
    let run_id = Uid::<RunKind>::random();
    let results =
        tracker.run(run_id, case_uid, &playbook, &mut ctx, now).await.map_err(|err| ApiError::new(err.kind(), err.to_string()))?;
    persist_stage_context(&state, &ctx).await?;

    let run_state = tracker.run_state(run_id).ok_or_else(|| ApiError::new(ErrorKind::Internal, "run state missing"))?;
    Ok(Json(PipelineRunResponse {
        run_uid: run_id.to_wire_string(),
        status: format!("{:?}", run_state.status).to_lowercase(),
        completed_stages: results.into_iter().map(|result| result.stage).collect(),
    }))
}
