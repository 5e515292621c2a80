// crates/evidex-cli/src/serve_policy.rs
// ============================================================================
// Module: Serve Policy
// Description: Network exposure policy checks for the CLI server launcher.
// Purpose: Enforce safe-by-default bind behavior with explicit opt-in.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Provides safety checks for binding evidex-server to non-loopback
//! addresses. The policy is fail-closed: binding anywhere other than
//! loopback requires an explicit `--allow-non-loopback` flag or the
//! [`ALLOW_NON_LOOPBACK_ENV`] environment variable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::net::SocketAddr;

use crate::t;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable enabling non-loopback server binds.
pub const ALLOW_NON_LOOPBACK_ENV: &str = "EVIDEX_ALLOW_NON_LOOPBACK";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Bind outcome metadata for the `serve` command's startup banner.
///
/// # Invariants
/// - `network_exposed` is `true` only when `addr` is not a loopback address.
#[derive(Debug, Clone, Copy)]
pub struct BindOutcome {
    /// Resolved socket address.
    pub addr: SocketAddr,
    /// True when the server is bound to a non-loopback address.
    pub network_exposed: bool,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Serve policy failures for bind safety.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServePolicyError {
    /// Environment variable was set to an invalid value.
    InvalidEnv {
        /// Raw environment value.
        value: String,
    },
    /// Bind string failed to parse.
    InvalidBind {
        /// Raw bind value.
        bind: String,
        /// Parse error message.
        error: String,
    },
    /// Non-loopback binding requires explicit opt-in.
    NonLoopbackOptInRequired {
        /// Bind address.
        bind: String,
    },
}

impl std::fmt::Display for ServePolicyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            Self::InvalidEnv { value } => {
                t!("serve.bind.allow_env_invalid", env = ALLOW_NON_LOOPBACK_ENV, value = value)
            }
            Self::InvalidBind { bind, error } => t!("serve.bind.parse_failed", bind = bind, error = error),
            Self::NonLoopbackOptInRequired { bind } => {
                t!("serve.bind.non_loopback", bind = bind, env = ALLOW_NON_LOOPBACK_ENV)
            }
        };
        write!(f, "{message}")
    }
}

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Resolves the non-loopback opt-in flag from CLI and environment.
///
/// # Errors
///
/// Returns [`ServePolicyError::InvalidEnv`] when the environment value is
/// set but not a recognized boolean string.
pub fn resolve_allow_non_loopback(flag: bool) -> Result<bool, ServePolicyError> {
    if flag {
        return Ok(true);
    }
    let Some(value) = env::var_os(ALLOW_NON_LOOPBACK_ENV) else {
        return Ok(false);
    };
    let value = value.to_string_lossy().to_string();
    parse_allow_non_loopback_value(&value)
}

/// Parses `bind` and enforces the loopback-only default.
///
/// # Errors
///
/// Returns [`ServePolicyError::InvalidBind`] when `bind` is not a valid
/// socket address, or [`ServePolicyError::NonLoopbackOptInRequired`] when
/// `bind` is non-loopback and `allow_non_loopback` is `false`.
pub fn resolve_bind(bind: &str, allow_non_loopback: bool) -> Result<BindOutcome, ServePolicyError> {
    let addr: SocketAddr = bind
        .parse()
        .map_err(|err: std::net::AddrParseError| ServePolicyError::InvalidBind { bind: bind.to_string(), error: err.to_string() })?;

    if addr.ip().is_loopback() {
        return Ok(BindOutcome { addr, network_exposed: false });
    }
    if !allow_non_loopback {
        return Err(ServePolicyError::NonLoopbackOptInRequired { bind: bind.to_string() });
    }
    Ok(BindOutcome { addr, network_exposed: true })
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a bool-ish string (true/false/1/0/yes/no/on/off).
fn parse_boolish(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Parses an env value for allow-non-loopback.
pub(crate) fn parse_allow_non_loopback_value(value: &str) -> Result<bool, ServePolicyError> {
    parse_boolish(value).map_or_else(|| Err(ServePolicyError::InvalidEnv { value: value.to_string() }), Ok)
}
