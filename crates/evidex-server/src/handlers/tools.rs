// crates/evidex-server/src/handlers/tools.rs
// ============================================================================
// Module: Tool Broker Handlers
// Description: Case-scoped passthroughs onto the Tool Broker's five operations.
// Purpose: Implement `POST /cases/{uid}/tools/{meta_search,archive_url,doc_parse}`.
// Dependencies: axum, evidex-broker, evidex-contract
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use evidex_broker::CallContext;
use evidex_contract::types::ArchiveUrlRequest;
use evidex_contract::types::DocParseRequest;
use evidex_contract::types::MetaSearchRequest;
use evidex_contract::types::ToolOkEnvelope;
use evidex_core::core::ActorId;
use evidex_core::core::CaseKind;
use evidex_core::core::TraceId;
use evidex_core::core::Uid;
use evidex_core::interfaces::FetchedArtifact;
use evidex_core::interfaces::ParsedDocument;
use evidex_core::interfaces::SearchResult;

use crate::error::ApiError;
use crate::state::AppState;

fn call_context(case_uid: Uid<CaseKind>, operation: &str) -> CallContext {
    CallContext {
        case_uid,
        actor_id: ActorId::new("api"),
        trace_id: TraceId::new(format!("http-{operation}-{case_uid}")),
    }
}

/// `POST /cases/{uid}/tools/meta_search`.
///
/// # Errors
///
/// Returns [`ApiError`] when the Policy Engine denies the call or the
/// provider fails.
pub async fn meta_search(
    State(state): State<Arc<AppState>>,
    Path(case_uid): Path<Uid<CaseKind>>,
    Json(request): Json<MetaSearchRequest>,
) -> Result<Json<ToolOkEnvelope<SearchResultsResponse>>, ApiError> {
    let ctx = call_context(case_uid, "meta_search");
    let results = state.broker.meta_search(&ctx, &request.q, request.max_results).await?;
    Ok(Json(ToolOkEnvelope::ok(SearchResultsResponse { results })))
}

/// Response payload for [`meta_search`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct SearchResultsResponse {
    /// Normalized search results.
    pub results: Vec<SearchResult>,
}

/// `POST /cases/{uid}/tools/archive_url`.
///
/// # Errors
///
/// Returns [`ApiError`] when the Policy Engine denies the URL or the fetch
/// fails.
pub async fn archive_url(
    State(state): State<Arc<AppState>>,
    Path(case_uid): Path<Uid<CaseKind>>,
    Json(request): Json<ArchiveUrlRequest>,
) -> Result<Json<ToolOkEnvelope<FetchedArtifact>>, ApiError> {
    let ctx = call_context(case_uid, "archive_url");
    let fetched = state.broker.archive_url(&ctx, &request.url).await?;
    Ok(Json(ToolOkEnvelope::ok(fetched)))
}

/// `POST /cases/{uid}/tools/doc_parse`.
///
/// # Errors
///
/// Returns [`ApiError::not_found`] if the referenced artifact version does
/// not exist, or [`ApiError`] if the parse call fails.
pub async fn doc_parse(
    State(state): State<Arc<AppState>>,
    Path(case_uid): Path<Uid<CaseKind>>,
    Json(request): Json<DocParseRequest>,
) -> Result<Json<ToolOkEnvelope<ParsedDocument>>, ApiError> {
    let version_uid: Uid<evidex_core::core::ArtifactVersionKind> = request
        .artifact_version_uid
        .parse()
        .map_err(|_err| ApiError::new(evidex_core::error::ErrorKind::ValidationError, "invalid artifact_version_uid"))?;
    let version = state
        .store
        .get_artifact_version(version_uid)
        .await?
        .ok_or_else(|| ApiError::not_found("artifact_version", version_uid))?;
    let bytes = state.artifacts.get(&version.storage_ref).await?;

    let ctx = call_context(case_uid, "doc_parse");
    let parsed = state.broker.doc_parse(&ctx, &bytes, &version.mime_type, Some(&request.file_url)).await?;
    Ok(Json(ToolOkEnvelope::ok(parsed)))
}
