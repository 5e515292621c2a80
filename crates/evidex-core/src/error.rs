// crates/evidex-core/src/error.rs
// ============================================================================
// Module: Evidex Error Taxonomy
// Description: Stable error kinds shared by every crate in the workspace.
// Purpose: Provide one canonical taxonomy that maps onto HTTP status and
// Problem Details without every crate re-deriving its own status mapping.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every fallible operation in Evidex ultimately resolves to one of these
//! [`ErrorKind`] variants, per spec §7. Crate-local error enums (built with
//! `thiserror`) carry richer context but expose a `kind()` accessor that
//! returns one of these variants so the API boundary can render a uniform
//! Problem Details envelope.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Error Kind
// ============================================================================

/// Stable, wire-visible error taxonomy.
///
/// # Invariants
/// - Variants are stable for programmatic handling and HTTP status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Requested entity does not exist.
    NotFound,
    /// Input failed validation.
    ValidationError,
    /// Policy engine denied the operation.
    PolicyDenied,
    /// Rate limit exceeded for a (tool, host) pair.
    RateLimited,
    /// URL is malformed or uses a disallowed scheme.
    InvalidUrl,
    /// Token or cost budget would go negative.
    BudgetExceeded,
    /// No LLM model (primary or fallback) is available.
    ModelUnavailable,
    /// An upstream/backing service returned an error.
    GatewayError,
    /// An operation exceeded its deadline.
    Timeout,
    /// A write conflicted with an existing invariant (e.g. duplicate unique key).
    IntegrityConflict,
    /// An unclassified internal error.
    Internal,
}

impl ErrorKind {
    /// Returns the HTTP status code conventionally associated with this kind.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::ValidationError => 400,
            Self::PolicyDenied => 403,
            Self::RateLimited | Self::BudgetExceeded => 429,
            Self::InvalidUrl => 400,
            Self::ModelUnavailable => 503,
            Self::GatewayError => 502,
            Self::Timeout => 504,
            Self::IntegrityConflict => 422,
            Self::Internal => 500,
        }
    }

    /// Returns whether callers should be told the operation is retryable.
    #[must_use]
    pub const fn retryable(self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::GatewayError | Self::Timeout | Self::ModelUnavailable
        )
    }

    /// Returns the stable snake_case error code string for this kind.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::ValidationError => "validation_error",
            Self::PolicyDenied => "policy_denied",
            Self::RateLimited => "rate_limited",
            Self::InvalidUrl => "invalid_url",
            Self::BudgetExceeded => "budget_exceeded",
            Self::ModelUnavailable => "model_unavailable",
            Self::GatewayError => "gateway_error",
            Self::Timeout => "timeout",
            Self::IntegrityConflict => "integrity_conflict",
            Self::Internal => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_maps_to_429_and_is_retryable() {
        assert_eq!(ErrorKind::RateLimited.http_status(), 429);
        assert!(ErrorKind::RateLimited.retryable());
    }

    #[test]
    fn policy_denied_is_not_retryable() {
        assert_eq!(ErrorKind::PolicyDenied.http_status(), 403);
        assert!(!ErrorKind::PolicyDenied.retryable());
    }
}
