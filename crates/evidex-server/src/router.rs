// crates/evidex-server/src/router.rs
// ============================================================================
// Module: Router
// Description: Wires every handler onto its route and binds the listener.
// Purpose: Assemble the full HTTP/WebSocket surface over one AppState.
// Dependencies: axum, tokio
// ============================================================================

//! ## Overview
//! [`build_router`] is the single place routes are declared; [`serve`]
//! binds a TCP listener and runs the resulting `axum::Router` to
//! completion over plain TCP (no TLS listener here: a control-plane MCP
//! server's TLS path belongs to a different deployment than this
//! analytical platform's HTTP API).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use axum::routing::post;

use crate::chat::chat_ws;
use crate::handlers::analysis::chat_handler;
use crate::handlers::analysis::multi_perspective_handler;
use crate::handlers::analysis::score_judgment_handler;
use crate::handlers::cases::create_case;
use crate::handlers::cases::get_case;
use crate::handlers::cases::import_fixture;
use crate::handlers::cases::list_case_artifacts;
use crate::handlers::pipelines::full_analysis;
use crate::handlers::pipelines::run_stage;
use crate::handlers::projections::get_artifact_version;
use crate::handlers::projections::get_assertion;
use crate::handlers::projections::get_evidence;
use crate::handlers::projections::get_judgment;
use crate::handlers::projections::get_source_claim;
use crate::handlers::projections::get_tool_trace;
use crate::handlers::tools::archive_url;
use crate::handlers::tools::doc_parse;
use crate::handlers::tools::meta_search;
use crate::state::AppState;

/// Errors raised while binding or running the HTTP/WebSocket listener.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// The listen address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that failed to bind.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The server loop itself failed.
    #[error("server loop failed: {0}")]
    Serve(#[source] std::io::Error),
}

/// Builds the full route table over `state`.
#[must_use]
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/cases", post(create_case))
        .route("/cases/{uid}", get(get_case))
        .route("/cases/{uid}/artifacts", get(list_case_artifacts))
        .route("/cases/{uid}/fixtures/import", post(import_fixture))
        .route("/cases/{uid}/tools/meta_search", post(meta_search))
        .route("/cases/{uid}/tools/archive_url", post(archive_url))
        .route("/cases/{uid}/tools/doc_parse", post(doc_parse))
        .route("/cases/{uid}/pipelines/full_analysis", post(full_analysis))
        .route("/cases/{uid}/pipelines/run_stage", post(run_stage))
        .route("/cases/{uid}/analysis/multi_perspective", post(multi_perspective_handler))
        .route("/cases/{uid}/analysis/chat", post(chat_handler))
        .route("/cases/{uid}/quality/score_judgment", post(score_judgment_handler))
        .route("/cases/{uid}/chat/ws", get(chat_ws))
        .route("/artifacts/versions/{uid}", get(get_artifact_version))
        .route("/evidence/{uid}", get(get_evidence))
        .route("/source_claims/{uid}", get(get_source_claim))
        .route("/assertions/{uid}", get(get_assertion))
        .route("/judgments/{uid}", get(get_judgment))
        .route("/tool_traces/{uid}", get(get_tool_trace))
        .with_state(state)
}

/// Binds `addr` and serves `state`'s router until the process is terminated.
///
/// # Errors
///
/// Returns [`ServeError`] if the address cannot be bound or the server loop
/// fails.
pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> Result<(), ServeError> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|source| ServeError::Bind { addr, source })?;
    tracing::info!(%addr, "evidex-server listening");
    axum::serve(listener, app).await.map_err(ServeError::Serve)
}
