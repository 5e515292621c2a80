// crates/evidex-server/src/handlers/cases.rs
// ============================================================================
// Module: Case Handlers
// Description: Case lifecycle and fixture import endpoints.
// Purpose: Implement `POST /cases`, `GET /cases/{uid}`,
//          `GET /cases/{uid}/artifacts`, `POST /cases/{uid}/fixtures/import`.
// Dependencies: axum, evidex-contract, evidex-core, evidex-pipeline
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use evidex_contract::types::CreateCaseRequest;
use evidex_contract::types::CreateCaseResponse;
use evidex_contract::types::ImportFixtureRequest;
use evidex_contract::types::ImportFixtureResponse;
use evidex_core::core::ActorId;
use evidex_core::core::Case;
use evidex_core::core::CaseKind;
use evidex_core::core::SpanId;
use evidex_core::core::Timestamp;
use evidex_core::core::TraceId;
use evidex_core::core::Uid;
use evidex_pipeline::AssertionFuseStage;
use evidex_pipeline::Stage;
use evidex_pipeline::StageContext;
use serde_json::json;
use time::OffsetDateTime;

use crate::error::ApiError;
use crate::fixtures;
use crate::state::AppState;

// ============================================================================
// SECTION: Case Lifecycle
// ============================================================================

/// `POST /cases` — creates a new investigation root.
///
/// # Errors
///
/// Returns [`ApiError`] if the write fails.
pub async fn create_case(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateCaseRequest>,
) -> Result<Json<CreateCaseResponse>, ApiError> {
    let now = Timestamp::new(OffsetDateTime::now_utc());
    let actor_id = ActorId::new(request.actor_id.clone().unwrap_or_else(|| "system".to_string()));
    let case_uid = Uid::<CaseKind>::random();
    let case = Case::new(case_uid, request.title.clone(), Some(actor_id.clone()), now);
    state.store.create_case(&case).await?;

    let action = state
        .ledger
        .record_action(
            case_uid,
            "case.create",
            &actor_id,
            request.rationale.as_deref().unwrap_or("case created via HTTP API"),
            json!({"title": request.title}),
            json!({"case_uid": case_uid.to_wire_string()}),
            &TraceId::new(format!("case-create-{case_uid}")),
            &SpanId::new("root"),
        )
        .await?;

    Ok(Json(CreateCaseResponse { case_uid, title: case.title, action_uid: action.uid }))
}

/// `GET /cases/{uid}` — loads a case by uid.
///
/// # Errors
///
/// Returns [`ApiError::not_found`] if no case exists with `uid`.
pub async fn get_case(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<Uid<CaseKind>>,
) -> Result<Json<Case>, ApiError> {
    let case = state.store.get_case(uid).await?.ok_or_else(|| ApiError::not_found("case", uid))?;
    Ok(Json(case))
}

/// `GET /cases/{uid}/artifacts` — lists every artifact identity the case owns.
///
/// # Errors
///
/// Returns [`ApiError`] if the read fails.
pub async fn list_case_artifacts(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<Uid<CaseKind>>,
) -> Result<Json<Vec<evidex_core::core::ArtifactIdentity>>, ApiError> {
    let identities = state.store.list_artifact_identities_by_case(uid).await?;
    Ok(Json(identities))
}

// ============================================================================
// SECTION: Fixture Import
// ============================================================================

/// `POST /cases/{uid}/fixtures/import` — ingests a named built-in fixture
/// bundle as the case's source material, then fuses its source claims into
/// assertions via [`AssertionFuseStage`].
///
/// # Errors
///
/// Returns [`ApiError::not_found`] if the case does not exist, or
/// [`ApiError`] if ingestion or persistence fails.
pub async fn import_fixture(
    State(state): State<Arc<AppState>>,
    Path(case_uid): Path<Uid<CaseKind>>,
    Json(request): Json<ImportFixtureRequest>,
) -> Result<Json<ImportFixtureResponse>, ApiError> {
    if state.store.get_case(case_uid).await?.is_none() {
        return Err(ApiError::not_found("case", case_uid));
    }

    let fixture = fixtures::lookup(&request.fixture_name)
        .ok_or_else(|| ApiError::new(evidex_core::error::ErrorKind::NotFound, "unknown fixture name"))?;

    let now = Timestamp::new(OffsetDateTime::now_utc());
    let ctx = evidex_broker::CallContext {
        case_uid,
        actor_id: ActorId::new("fixture-import"),
        trace_id: TraceId::new(format!("fixture-import-{case_uid}")),
    };
    let identity_uid = state.osint_artifact_identity(case_uid, now).await?;

    let outcome = state
        .ingestion
        .ingest_bytes(
            &ctx,
            case_uid,
            identity_uid,
            fixture.bytes,
            "text/plain",
            Some(fixture.name),
            evidex_core::core::SourceMeta::default(),
            now,
        )
        .await?;

    state.store.create_artifact_version(&outcome.artifact_version).await?;
    for chunk in &outcome.chunks {
        state.store.create_chunk(chunk).await?;
    }
    for evidence in &outcome.evidence {
        state.store.create_evidence(evidence).await?;
    }
    for claim in &outcome.source_claims {
        state.store.create_source_claim(claim).await?;
    }

    let mut stage_ctx = StageContext { case_uid: Some(case_uid), ..StageContext::default() };
    stage_ctx.source_claims = outcome.source_claims.clone();
    AssertionFuseStage.run(&mut stage_ctx, &json!({})).await.map_err(|err| {
        ApiError::new(evidex_core::error::ErrorKind::Internal, format!("assertion fuse failed: {err}"))
    })?;
    for assertion in &stage_ctx.assertions {
        state.store.create_assertion(assertion).await?;
    }

    Ok(Json(ImportFixtureResponse {
        ok: true,
        artifact_version_uids: vec![outcome.artifact_version.uid.to_wire_string()],
        evidence_uids: outcome.evidence.iter().map(|e| e.uid).collect(),
        assertion_uids: stage_ctx.assertions.iter().map(|a| a.uid).collect(),
    }))
}
