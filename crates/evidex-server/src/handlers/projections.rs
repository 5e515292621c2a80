// crates/evidex-server/src/handlers/projections.rs
// ============================================================================
// Module: Read Projection Handlers
// Description: Flat GET-by-uid endpoints over the evidence model.
// Purpose: Implement `GET /artifacts/versions/{uid}`, `/evidence/{uid}`,
//          `/source_claims/{uid}`, `/assertions/{uid}`, `/judgments/{uid}`,
//          `/tool_traces/{uid}`.
// Dependencies: axum, evidex-core
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use evidex_core::core::Assertion;
use evidex_core::core::AssertionKind;
use evidex_core::core::ArtifactVersion;
use evidex_core::core::ArtifactVersionKind;
use evidex_core::core::Evidence;
use evidex_core::core::EvidenceKind;
use evidex_core::core::Judgment;
use evidex_core::core::JudgmentKind;
use evidex_core::core::SourceClaim;
use evidex_core::core::SourceClaimKind;
use evidex_core::core::ToolTrace;
use evidex_core::core::ToolTraceKind;
use evidex_core::core::Uid;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /artifacts/versions/{uid}`.
///
/// # Errors
///
/// Returns [`ApiError::not_found`] if no artifact version exists with `uid`.
pub async fn get_artifact_version(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<Uid<ArtifactVersionKind>>,
) -> Result<Json<ArtifactVersion>, ApiError> {
    let version = state.store.get_artifact_version(uid).await?.ok_or_else(|| ApiError::not_found("artifact_version", uid))?;
    Ok(Json(version))
}

/// `GET /evidence/{uid}`.
///
/// # Errors
///
/// Returns [`ApiError::not_found`] if no evidence row exists with `uid`.
pub async fn get_evidence(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<Uid<EvidenceKind>>,
) -> Result<Json<Evidence>, ApiError> {
    let evidence = state.store.get_evidence(uid).await?.ok_or_else(|| ApiError::not_found("evidence", uid))?;
    Ok(Json(evidence))
}

/// `GET /source_claims/{uid}`.
///
/// # Errors
///
/// Returns [`ApiError::not_found`] if no source claim exists with `uid`.
pub async fn get_source_claim(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<Uid<SourceClaimKind>>,
) -> Result<Json<SourceClaim>, ApiError> {
    let claim = state.store.get_source_claim(uid).await?.ok_or_else(|| ApiError::not_found("source_claim", uid))?;
    Ok(Json(claim))
}

/// `GET /assertions/{uid}`.
///
/// # Errors
///
/// Returns [`ApiError::not_found`] if no assertion exists with `uid`.
pub async fn get_assertion(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<Uid<AssertionKind>>,
) -> Result<Json<Assertion>, ApiError> {
    let assertion = state.store.get_assertion(uid).await?.ok_or_else(|| ApiError::not_found("assertion", uid))?;
    Ok(Json(assertion))
}

/// `GET /judgments/{uid}`.
///
/// # Errors
///
/// Returns [`ApiError::not_found`] if no judgment exists with `uid`.
pub async fn get_judgment(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<Uid<JudgmentKind>>,
) -> Result<Json<Judgment>, ApiError> {
    let judgment = state.store.get_judgment(uid).await?.ok_or_else(|| ApiError::not_found("judgment", uid))?;
    Ok(Json(judgment))
}

/// `GET /tool_traces/{uid}`.
///
/// # Errors
///
/// Returns [`ApiError::not_found`] if no tool trace exists with `uid`.
pub async fn get_tool_trace(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<Uid<ToolTraceKind>>,
) -> Result<Json<ToolTrace>, ApiError> {
    let trace = state.store.get_tool_trace(uid).await?.ok_or_else(|| ApiError::not_found("tool_trace", uid))?;
    Ok(Json(trace))
}
