// crates/evidex-config/src/policy.rs
// ============================================================================
// Module: Policy Engine
// Description: Deterministic, fail-closed evaluation of outbound calls, the grounding gate, and budget.
// Purpose: Gate every tool call and LLM invocation against versioned policy.
// Dependencies: evidex-core, parking_lot, tracing, url
// ============================================================================

//! ## Overview
//! The Policy Engine is consulted before every outbound tool call
//! ([`PolicyEngine::evaluate_outbound`]), before every judgment is labeled
//! ([`grounding_gate`]), and before every LLM invocation
//! ([`PolicyEngine::budget_check`]). Evaluation is deterministic and fails
//! closed: an empty allowlist is the one documented exception (development
//! mode), and is loudly logged when active.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::time::Duration;
use std::time::Instant;

use evidex_core::core::EpistemicTier;
use parking_lot::Mutex;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Allowlist / Rate Limit Configuration
// ============================================================================

/// Host allowlist and per-`(tool_name, host)` rate limiting configuration.
///
/// # Invariants
/// - An empty `allowed_hosts` means development mode: every host is
///   permitted. [`PolicyEngine::new`] logs a one-time warning when this is
///   the case.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PolicyConfig {
    /// Lowercased hostnames permitted for outbound calls. Empty = allow all
    /// (development mode).
    #[serde(default)]
    pub allowed_hosts: Vec<String>,
    /// Minimum interval between calls to the same `(tool_name, host)` pair.
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            allowed_hosts: Vec::new(),
            min_interval_ms: default_min_interval_ms(),
        }
    }
}

/// Default minimum interval between calls to the same `(tool_name, host)` pair.
const fn default_min_interval_ms() -> u64 {
    1000
}

// ============================================================================
// SECTION: Outbound Decision
// ============================================================================

/// Robots-consultation metadata recorded on every outbound decision, even
/// when robots.txt was not actually consulted, so later fidelity upgrades
/// are observable in the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotsMetadata {
    /// Whether robots.txt was actually fetched and consulted.
    pub checked: bool,
    /// Whether the path was allowed, per the (possibly unconsulted) policy.
    pub allowed: bool,
    /// Explanation, set when `checked` is `false` or the path was denied.
    pub reason: Option<String>,
}

impl RobotsMetadata {
    /// The metadata recorded when robots.txt is not consulted: allowed by
    /// default, with the non-consultation reason surfaced for audit.
    #[must_use]
    pub fn not_consulted() -> Self {
        Self {
            checked: false,
            allowed: true,
            reason: Some("robots.txt consultation not implemented".to_string()),
        }
    }
}

/// The result of [`PolicyEngine::evaluate_outbound`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundDecision {
    /// Whether the call is permitted.
    pub allowed: bool,
    /// Machine-readable denial code, set when `allowed` is `false`.
    pub error_code: Option<String>,
    /// Human-readable reason.
    pub reason: Option<String>,
    /// Lowercased host extracted from the requested URL.
    pub domain: String,
    /// Robots-consultation metadata, recorded unconditionally.
    pub robots_metadata: RobotsMetadata,
}

/// Errors raised while evaluating an outbound request.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PolicyError {
    /// The requested URL could not be parsed or had no host.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

// ============================================================================
// SECTION: Budget
// ============================================================================

/// Budget context carried through an LLM invocation request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetContext {
    /// Tokens remaining before the call; may go negative only in this
    /// check, never after an admitted call.
    pub remaining_tokens: i64,
    /// Cost budget remaining, in the operator's chosen unit.
    pub remaining_cost: f64,
}

/// A request to invoke an LLM model, subject to budget policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetRequest {
    /// Primary model identifier.
    pub model_id: String,
    /// Prompt/template version, for audit.
    pub prompt_version: String,
    /// Budget state to check the request against.
    pub budget_context: BudgetContext,
    /// Fallback model to retry with on upstream failure, if configured.
    pub fallback_model_id: Option<String>,
}

/// Reason an output was degraded rather than executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DegradationReason {
    /// The remaining token or cost budget would go negative.
    BudgetExceeded,
    /// The call exceeded its deadline.
    Timeout,
}

/// Outcome of [`PolicyEngine::budget_check`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetDecision {
    /// The call may proceed.
    Allow,
    /// The call must not execute; degrade instead.
    Degraded {
        /// Why the call was degraded.
        reason: DegradationReason,
        /// Fallback model to retry with, if one was configured.
        fallback_model: Option<String>,
    },
}

// ============================================================================
// SECTION: Grounding Gate
// ============================================================================

/// Applies the grounding gate: an answer with no evidence citation is
/// capped at [`EpistemicTier::Hypothesis`] regardless of what tier the
/// caller requested.
#[must_use]
pub fn grounding_gate(has_citation: bool) -> EpistemicTier {
    if has_citation {
        EpistemicTier::Fact
    } else {
        EpistemicTier::Hypothesis
    }
}

// ============================================================================
// SECTION: Policy Engine
// ============================================================================

/// Evaluates every outbound tool call and every LLM invocation against
/// versioned policy.
///
/// # Invariants
/// - The per-`(tool_name, host)` last-call timestamp is updated only when
///   a request is admitted; a denied or rate-limited request never
///   advances the clock.
pub struct PolicyEngine {
    config: PolicyConfig,
    last_call: Mutex<HashMap<(String, String), Instant>>,
}

impl PolicyEngine {
    /// Constructs a new engine from `config`, logging a one-time warning
    /// if `config.allowed_hosts` is empty (development mode: allow all).
    #[must_use]
    pub fn new(config: PolicyConfig) -> Self {
        if config.allowed_hosts.is_empty() {
            tracing::warn!(
                "policy engine constructed with an empty host allowlist; \
                 running in development mode (all hosts permitted)"
            );
        }
        Self {
            config,
            last_call: Mutex::new(HashMap::new()),
        }
    }

    /// Evaluates an outbound call to `url` for `tool_name`.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidUrl`] when `url` cannot be parsed or
    /// has no host.
    pub fn evaluate_outbound(
        &self,
        tool_name: &str,
        url: &str,
    ) -> Result<OutboundDecision, PolicyError> {
        let parsed = url::Url::parse(url).map_err(|err| PolicyError::InvalidUrl(err.to_string()))?;
        let domain = parsed
            .host_str()
            .ok_or_else(|| PolicyError::InvalidUrl("url has no host".to_string()))?
            .to_ascii_lowercase();

        if !self.config.allowed_hosts.is_empty() && !self.config.allowed_hosts.contains(&domain) {
            return Ok(OutboundDecision {
                allowed: false,
                error_code: Some("policy_denied".to_string()),
                reason: Some(format!("host `{domain}` is not in the allowlist")),
                domain,
                robots_metadata: RobotsMetadata::not_consulted(),
            });
        }

        let key = (tool_name.to_string(), domain.clone());
        let min_interval = Duration::from_millis(self.config.min_interval_ms);
        let now = Instant::now();
        {
            let mut last_call = self.last_call.lock();
            if let Some(previous) = last_call.get(&key) {
                if now.duration_since(*previous) < min_interval {
                    return Ok(OutboundDecision {
                        allowed: false,
                        error_code: Some("rate_limited".to_string()),
                        reason: Some(format!(
                            "minimum interval {min_interval:?} not yet elapsed for tool `{tool_name}` on `{domain}`"
                        )),
                        domain,
                        robots_metadata: RobotsMetadata::not_consulted(),
                    });
                }
            }
            last_call.insert(key, now);
        }

        Ok(OutboundDecision {
            allowed: true,
            error_code: None,
            reason: None,
            domain,
            robots_metadata: RobotsMetadata::not_consulted(),
        })
    }

    /// Evaluates an LLM invocation request against the remaining budget.
    #[must_use]
    pub fn budget_check(&self, request: &BudgetRequest) -> BudgetDecision {
        let ctx = request.budget_context;
        if ctx.remaining_tokens < 0 || ctx.remaining_cost < 0.0 {
            return BudgetDecision::Degraded {
                reason: DegradationReason::BudgetExceeded,
                fallback_model: request.fallback_model_id.clone(),
            };
        }
        BudgetDecision::Allow
    }
}
