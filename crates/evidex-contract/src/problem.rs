// crates/evidex-contract/src/problem.rs
// ============================================================================
// Module: Problem Details
// Description: The RFC 9457 error envelope used at every API boundary.
// Purpose: Give every error response one uniform, machine-readable shape.
// Dependencies: evidex-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Every error exits the HTTP surface as a [`ProblemDetails`] body (spec
//! §6/§7). [`ProblemDetails::from_kind`] is the single constructor used at
//! the boundary so the HTTP status, stable `error_code`, and
//! `extensions.retryable` flag are always derived from
//! [`evidex_core::error::ErrorKind`] rather than hand-picked per handler.

// ============================================================================
// SECTION: Imports
// ============================================================================

use evidex_core::error::ErrorKind;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Problem Details
// ============================================================================

/// The RFC 9457 Problem Details error envelope.
///
/// # Invariants
/// - `status` always equals `ErrorKind::http_status()` for the kind that
///   produced this envelope.
/// - `extensions.retryable` always equals `ErrorKind::retryable()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// A URI reference identifying the problem type. Evidex uses a stable
    /// `urn:evidex:error:<code>` form rather than a dereferenceable URL.
    #[serde(rename = "type")]
    pub problem_type: String,
    /// A short, human-readable summary of the problem type.
    pub title: String,
    /// The HTTP status code for this occurrence of the problem.
    pub status: u16,
    /// A human-readable explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// A URI reference identifying the specific occurrence of the problem.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    /// Stable machine-readable error code, matching [`ErrorKind::code`].
    pub error_code: &'static str,
    /// Implementation-defined extension members, per RFC 9457 §3.2.
    /// Always carries `retryable`; callers may merge in further context.
    pub extensions: Value,
}

impl ProblemDetails {
    /// Builds the canonical envelope for `kind`, the Evidex convention used
    /// at every API boundary.
    #[must_use]
    pub fn from_kind(kind: ErrorKind, detail: Option<String>, instance: Option<String>) -> Self {
        Self {
            problem_type: format!("urn:evidex:error:{}", kind.code()),
            title: title_for(kind),
            status: kind.http_status(),
            detail,
            instance,
            error_code: kind.code(),
            extensions: json!({"retryable": kind.retryable()}),
        }
    }

    /// Builds the canonical envelope, merging additional extension fields
    /// (e.g. `policy.reason` on a `policy_denied` response) alongside the
    /// always-present `retryable` flag.
    #[must_use]
    pub fn from_kind_with_extensions(
        kind: ErrorKind,
        detail: Option<String>,
        instance: Option<String>,
        extra: Value,
    ) -> Self {
        let mut problem = Self::from_kind(kind, detail, instance);
        if let (Value::Object(base), Value::Object(extra)) = (&mut problem.extensions, extra) {
            base.extend(extra);
        }
        problem
    }
}

/// Returns the stable RFC 9457 `title` for `kind`.
fn title_for(kind: ErrorKind) -> String {
    match kind {
        ErrorKind::NotFound => "Not Found",
        ErrorKind::ValidationError => "Validation Error",
        ErrorKind::PolicyDenied => "Policy Denied",
        ErrorKind::RateLimited => "Rate Limited",
        ErrorKind::InvalidUrl => "Invalid URL",
        ErrorKind::BudgetExceeded => "Budget Exceeded",
        ErrorKind::ModelUnavailable => "Model Unavailable",
        ErrorKind::GatewayError => "Gateway Error",
        ErrorKind::Timeout => "Timeout",
        ErrorKind::IntegrityConflict => "Integrity Conflict",
        ErrorKind::Internal => "Internal Error",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_denied_envelope_matches_error_kind() {
        let problem = ProblemDetails::from_kind(
            ErrorKind::PolicyDenied,
            Some("host not in allowlist".to_string()),
            Some("/cases/case_1/tools/archive_url".to_string()),
        );
        assert_eq!(problem.status, 403);
        assert_eq!(problem.error_code, "policy_denied");
        assert_eq!(problem.extensions["retryable"], false);
    }

    #[test]
    fn rate_limited_is_retryable() {
        let problem = ProblemDetails::from_kind(ErrorKind::RateLimited, None, None);
        assert_eq!(problem.status, 429);
        assert_eq!(problem.extensions["retryable"], true);
    }

    #[test]
    fn extensions_merge_preserves_retryable() {
        let problem = ProblemDetails::from_kind_with_extensions(
            ErrorKind::PolicyDenied,
            None,
            None,
            json!({"policy": {"reason": "domain_not_allowed"}}),
        );
        assert_eq!(problem.extensions["retryable"], false);
        assert_eq!(problem.extensions["policy"]["reason"], "domain_not_allowed");
    }

    #[test]
    fn serializes_type_field_under_json_keyword() {
        let problem = ProblemDetails::from_kind(ErrorKind::NotFound, None, None);
        let value = serde_json::to_value(&problem).expect("serialize");
        assert_eq!(value["type"], "urn:evidex:error:not_found");
    }
}
