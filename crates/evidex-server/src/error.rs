// crates/evidex-server/src/error.rs
// ============================================================================
// Module: API Error
// Description: Maps every crate-local error onto the Problem Details envelope.
// Purpose: Give every handler one `?`-able error type with a uniform HTTP body.
// Dependencies: axum, evidex-contract, evidex-core
// ============================================================================

//! ## Overview
//! [`ApiError`] is the error type every handler returns. It carries an
//! [`evidex_core::error::ErrorKind`] plus an optional human-readable detail
//! and renders as a [`ProblemDetails`] body with the matching HTTP status
//! on [`IntoResponse`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use evidex_contract::problem::ProblemDetails;
use evidex_core::error::ErrorKind;

// ============================================================================
// SECTION: API Error
// ============================================================================

/// The error type every HTTP handler in this crate returns.
#[derive(Debug, Clone)]
pub struct ApiError {
    kind: ErrorKind,
    detail: Option<String>,
    instance: Option<String>,
}

impl ApiError {
    /// Builds an error of `kind` with a human-readable `detail`.
    #[must_use]
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self { kind, detail: Some(detail.into()), instance: None }
    }

    /// Attaches the request path this error occurred on.
    #[must_use]
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Shorthand for a `not_found` error over a missing entity.
    #[must_use]
    pub fn not_found(entity: &str, uid: impl std::fmt::Display) -> Self {
        Self::new(ErrorKind::NotFound, format!("no {entity} with uid {uid}"))
    }

    /// The wire error kind this error renders as.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.code(), self.detail.as_deref().unwrap_or(""))
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let problem = ProblemDetails::from_kind(self.kind, self.detail, self.instance);
        let status = StatusCode::from_u16(problem.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(problem)).into_response()
    }
}

/// Blanket conversion from any crate-local error exposing the shared
/// `kind()`/`Display` convention, so handlers can `?` straight through.
macro_rules! impl_from_kind_error {
    ($error:ty) => {
        impl From<$error> for ApiError {
            fn from(error: $error) -> Self {
                Self::new(error.kind(), error.to_string())
            }
        }
    };
}

impl_from_kind_error!(evidex_store_sqlite::SqliteStoreError);
impl_from_kind_error!(evidex_broker::BrokerError);
impl_from_kind_error!(evidex_ingest::IngestError);
impl_from_kind_error!(evidex_hypothesis::GenerateError);
impl_from_kind_error!(evidex_pipeline::PipelineError);
impl_from_kind_error!(evidex_pipeline::InvestigationError);
impl_from_kind_error!(evidex_core::interfaces::AuditError);
impl_from_kind_error!(evidex_core::interfaces::ArtifactStoreError);
impl_from_kind_error!(evidex_core::interfaces::CheckpointError);

impl From<evidex_config::PolicyError> for ApiError {
    fn from(error: evidex_config::PolicyError) -> Self {
        Self::new(ErrorKind::InvalidUrl, error.to_string())
    }
}
