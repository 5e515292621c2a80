// crates/evidex-broker/src/broker.rs
// ============================================================================
// Module: Tool Broker
// Description: Single choke-point for every outbound effect (search, archive,
//              parse, embed, generate), policy-gated and fully audited.
// Purpose: Guarantee every external call is allowlisted, rate limited, timed,
//          and recorded as an Action + ToolTrace before its result is used.
// Dependencies: evidex-core, evidex-config, tokio, tracing
// ============================================================================

//! ## Overview
//! Every one of the Tool Broker's five operations follows the same shape
//! (spec §4.3): open an [`Action`], evaluate policy, call the underlying
//! provider under a deadline, then write a [`ToolTrace`] recording the
//! outcome. A denial or rate-limit still produces a committed `Action` with
//! `outputs.error_code` set and a `ToolTrace` with `status = denied`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use evidex_config::BudgetContext;
use evidex_config::BudgetDecision;
use evidex_config::BudgetRequest;
use evidex_config::DegradationReason;
use evidex_config::PolicyEngine;
use evidex_core::core::ActionKind;
use evidex_core::core::ActorId;
use evidex_core::core::CaseKind;
use evidex_core::core::PolicyDecisionSummary;
use evidex_core::core::SpanId;
use evidex_core::core::ToolTraceStatus;
use evidex_core::core::TraceId;
use evidex_core::core::Uid;
use evidex_core::interfaces::ArchiveTool;
use evidex_core::interfaces::AuditError;
use evidex_core::interfaces::EmbedTool;
use evidex_core::interfaces::FetchedArtifact;
use evidex_core::interfaces::GenerateTool;
use evidex_core::interfaces::ParseTool;
use evidex_core::interfaces::ParsedDocument;
use evidex_core::interfaces::SearchResult;
use evidex_core::interfaces::SearchTool;
use evidex_core::interfaces::ToolError;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::AuditLedgerHandle;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors returned by every Tool Broker operation, aligned with spec §4.3's
/// uniform error taxonomy.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The requested URL was malformed or had no host.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// The Policy Engine denied the call.
    #[error("policy denied: {0}")]
    PolicyDenied(String),
    /// The minimum inter-call interval had not yet elapsed.
    #[error("rate limited: {0}")]
    RateLimited(String),
    /// The call would exceed the remaining token/cost budget.
    #[error("budget exceeded")]
    BudgetExceeded,
    /// No model (primary or configured fallback) was available.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    /// The upstream provider returned an error.
    #[error("gateway error: {0}")]
    GatewayError(String),
    /// The call exceeded its deadline.
    #[error("operation timed out")]
    Timeout,
    /// The audit ledger failed to record the action or trace.
    #[error("audit ledger failure: {0}")]
    Audit(#[from] AuditError),
}

impl BrokerError {
    /// Returns the stable wire error code for this error, per spec §4.3/§7.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "invalid_url",
            Self::PolicyDenied(_) => "policy_denied",
            Self::RateLimited(_) => "rate_limited",
            Self::BudgetExceeded => "budget_exceeded",
            Self::ModelUnavailable(_) => "model_unavailable",
            Self::GatewayError(_) => "gateway_error",
            Self::Timeout => "timeout",
            Self::Audit(_) => "internal",
        }
    }

    /// Maps this error onto the shared wire taxonomy, for
    /// `evidex-contract::ProblemDetails::from_kind` at the API boundary.
    #[must_use]
    pub fn kind(&self) -> evidex_core::error::ErrorKind {
        use evidex_core::error::ErrorKind;
        match self {
            Self::InvalidUrl(_) => ErrorKind::InvalidUrl,
            Self::PolicyDenied(_) => ErrorKind::PolicyDenied,
            Self::RateLimited(_) => ErrorKind::RateLimited,
            Self::BudgetExceeded => ErrorKind::BudgetExceeded,
            Self::ModelUnavailable(_) => ErrorKind::ModelUnavailable,
            Self::GatewayError(_) => ErrorKind::GatewayError,
            Self::Timeout => ErrorKind::Timeout,
            Self::Audit(err) => err.kind(),
        }
    }
}

impl From<ToolError> for BrokerError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::InvalidRequest(msg) => Self::InvalidUrl(msg),
            ToolError::Upstream(msg) => Self::GatewayError(msg),
            ToolError::Timeout => Self::Timeout,
        }
    }
}

// ============================================================================
// SECTION: Deadlines
// ============================================================================

/// Default deadline for fetch-style tools (search, archive, parse, embed).
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
/// Default deadline for LLM structured-generation calls.
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(120);

// ============================================================================
// SECTION: Tool Broker
// ============================================================================

/// Request context threaded through every Tool Broker call: which case the
/// call is on behalf of, who asked, and the distributed trace it belongs to.
#[derive(Debug, Clone)]
pub struct CallContext {
    /// Owning case.
    pub case_uid: Uid<CaseKind>,
    /// Principal that caused the call.
    pub actor_id: ActorId,
    /// Distributed trace this call belongs to.
    pub trace_id: TraceId,
}

/// Single choke-point for outbound effects: search, archive, parse, embed,
/// and structured generation. See spec §4.3.
pub struct ToolBroker {
    policy: Arc<PolicyEngine>,
    ledger: AuditLedgerHandle,
    search: Arc<dyn SearchTool>,
    archive: Arc<dyn ArchiveTool>,
    parse: Arc<dyn ParseTool>,
    embed: Arc<dyn EmbedTool>,
    generate: Arc<dyn GenerateTool>,
    search_endpoint: String,
    embed_endpoint: String,
    llm_endpoint: String,
}

/// Builder for [`ToolBroker`].
pub struct ToolBrokerBuilder {
    policy: Arc<PolicyEngine>,
    ledger: AuditLedgerHandle,
    search: Arc<dyn SearchTool>,
    archive: Arc<dyn ArchiveTool>,
    parse: Arc<dyn ParseTool>,
    embed: Arc<dyn EmbedTool>,
    generate: Arc<dyn GenerateTool>,
    search_endpoint: String,
    embed_endpoint: String,
    llm_endpoint: String,
}

impl ToolBrokerBuilder {
    /// Starts a builder with every required collaborator.
    #[must_use]
    #[allow(clippy::too_many_arguments, reason = "every field is mandatory for a usable broker")]
    pub fn new(
        policy: Arc<PolicyEngine>,
        ledger: AuditLedgerHandle,
        search: Arc<dyn SearchTool>,
        archive: Arc<dyn ArchiveTool>,
        parse: Arc<dyn ParseTool>,
        embed: Arc<dyn EmbedTool>,
        generate: Arc<dyn GenerateTool>,
    ) -> Self {
        Self {
            policy,
            ledger,
            search,
            archive,
            parse,
            embed,
            generate,
            search_endpoint: "https://search.internal/query".to_string(),
            embed_endpoint: "https://embed.internal/vectors".to_string(),
            llm_endpoint: "https://llm.internal/generate".to_string(),
        }
    }

    /// Overrides the pseudo-URL used for rate-limiting `meta_search` calls.
    #[must_use]
    pub fn search_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.search_endpoint = endpoint.into();
        self
    }

    /// Overrides the pseudo-URL used for rate-limiting `embed` calls.
    #[must_use]
    pub fn embed_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.embed_endpoint = endpoint.into();
        self
    }

    /// Overrides the pseudo-URL used for rate-limiting `generate_structured` calls.
    #[must_use]
    pub fn llm_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.llm_endpoint = endpoint.into();
        self
    }

    /// Builds the broker.
    #[must_use]
    pub fn build(self) -> ToolBroker {
        ToolBroker {
            policy: self.policy,
            ledger: self.ledger,
            search: self.search,
            archive: self.archive,
            parse: self.parse,
            embed: self.embed,
            generate: self.generate,
            search_endpoint: self.search_endpoint,
            embed_endpoint: self.embed_endpoint,
            llm_endpoint: self.llm_endpoint,
        }
    }
}

impl ToolBroker {
    /// Runs `query` against the search tool, policy-gated on
    /// [`ToolBrokerBuilder::search_endpoint`].
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError`] on policy denial, rate limiting, upstream
    /// failure, timeout, or audit-write failure.
    pub async fn meta_search(
        &self,
        ctx: &CallContext,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<SearchResult>, BrokerError> {
        let request = json!({"query": query, "max_results": max_results});
        self.run(
            ctx,
            "meta_search",
            &self.search_endpoint,
            request,
            DEFAULT_FETCH_TIMEOUT,
            self.search.meta_search(query, max_results),
        )
        .await
    }

    /// Archives (fetches and durably stores) `url`, policy-gated on `url`
    /// itself.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError`] on policy denial, rate limiting, upstream
    /// failure, timeout, or audit-write failure.
    pub async fn archive_url(
        &self,
        ctx: &CallContext,
        url: &str,
    ) -> Result<FetchedArtifact, BrokerError> {
        let request = json!({"url": url});
        self.run(
            ctx,
            "archive_url",
            url,
            request,
            DEFAULT_FETCH_TIMEOUT,
            self.archive.archive_url(url),
        )
        .await
    }

    /// Parses `bytes` of `mime_type`, policy-gated on `source_url` when the
    /// document originated from one.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError`] on policy denial, rate limiting, upstream
    /// failure, timeout, or audit-write failure. Recoverable parser
    /// failures surface as a successful [`ParsedDocument`] with
    /// `parse_error` set, per ingestion's plaintext-fallback policy.
    pub async fn doc_parse(
        &self,
        ctx: &CallContext,
        bytes: &[u8],
        mime_type: &str,
        source_url: Option<&str>,
    ) -> Result<ParsedDocument, BrokerError> {
        let policy_url = source_url.unwrap_or(&self.search_endpoint);
        let request = json!({"mime_type": mime_type, "byte_len": bytes.len(), "source_url": source_url});
        self.run(
            ctx,
            "doc_parse",
            policy_url,
            request,
            DEFAULT_FETCH_TIMEOUT,
            self.parse.doc_parse(bytes, mime_type),
        )
        .await
    }

    /// Embeds a bounded batch of chunk texts, policy-gated on
    /// [`ToolBrokerBuilder::embed_endpoint`].
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError`] on policy denial, rate limiting, upstream
    /// failure, timeout, or audit-write failure.
    pub async fn embed(
        &self,
        ctx: &CallContext,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, BrokerError> {
        let request = json!({"batch_size": texts.len()});
        self.run(
            ctx,
            "embed",
            &self.embed_endpoint,
            request,
            DEFAULT_FETCH_TIMEOUT,
            self.embed.embed(texts),
        )
        .await
    }

    /// Requests a structured LLM completion, gated first by
    /// [`PolicyEngine::budget_check`] (never executing the call if the
    /// budget would go negative) and then by the usual allowlist/rate-limit
    /// check on [`ToolBrokerBuilder::llm_endpoint`].
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::BudgetExceeded`] or
    /// [`BrokerError::ModelUnavailable`] when the budget check degrades the
    /// call instead of executing it; otherwise the same taxonomy as every
    /// other operation.
    pub async fn generate_structured(
        &self,
        ctx: &CallContext,
        prompt: &str,
        schema: &Value,
        budget_request: &BudgetRequest,
    ) -> Result<Value, BrokerError> {
        let request = json!({
            "model_id": budget_request.model_id,
            "prompt_version": budget_request.prompt_version,
            "prompt_len": prompt.len(),
        });

        match self.policy.budget_check(budget_request) {
            BudgetDecision::Allow => {}
            BudgetDecision::Degraded {
                reason: DegradationReason::BudgetExceeded,
                ..
            } => {
                self.record_degraded(ctx, "generate_structured", request, "budget_exceeded")
                    .await?;
                return Err(BrokerError::BudgetExceeded);
            }
            BudgetDecision::Degraded {
                reason: DegradationReason::Timeout,
                fallback_model,
            } => {
                self.record_degraded(ctx, "generate_structured", request, "timeout")
                    .await?;
                return Err(BrokerError::ModelUnavailable(
                    fallback_model.unwrap_or_else(|| budget_request.model_id.clone()),
                ));
            }
        }

        self.run(
            ctx,
            "generate_structured",
            &self.llm_endpoint,
            request,
            DEFAULT_LLM_TIMEOUT,
            self.generate
                .generate_structured(prompt, schema, &budget_request.model_id),
        )
        .await
    }

    /// Records a budget-degraded call as a committed `Action` + denied
    /// `ToolTrace`, without ever invoking the provider.
    async fn record_degraded(
        &self,
        ctx: &CallContext,
        tool_name: &str,
        request: Value,
        code: &'static str,
    ) -> Result<(), BrokerError> {
        let span_id = SpanId::new(format!("span-{}", Uid::<ActionKind>::random()));
        let action = self
            .ledger
            .record_action(
                ctx.case_uid,
                &format!("tool.{tool_name}"),
                &ctx.actor_id,
                "budget check degraded the call before dispatch",
                request.clone(),
                json!({"error_code": code}),
                &ctx.trace_id,
                &span_id,
            )
            .await?;
        self.ledger
            .record_tool_trace(
                action.uid,
                tool_name,
                request,
                None,
                ToolTraceStatus::Denied,
                0,
                Some(code.to_string()),
                PolicyDecisionSummary {
                    allowed: false,
                    error_code: Some(code.to_string()),
                    reason: Some("budget_check".to_string()),
                },
            )
            .await?;
        Ok(())
    }

    /// Shared policy-check → deadline-bound-call → audit-write sequence
    /// every Tool Broker operation follows.
    async fn run<T, F>(
        &self,
        ctx: &CallContext,
        tool_name: &str,
        policy_url: &str,
        request: Value,
        timeout: Duration,
        call: F,
    ) -> Result<T, BrokerError>
    where
        F: std::future::Future<Output = Result<T, ToolError>>,
        T: serde::Serialize,
    {
        let span_id = SpanId::new(format!("span-{}", Uid::<ActionKind>::random()));
        let decision = self
            .policy
            .evaluate_outbound(tool_name, policy_url)
            .map_err(|err| BrokerError::InvalidUrl(err.to_string()))?;

        if !decision.allowed {
            let code = decision.error_code.clone().unwrap_or_default();
            let action = self
                .ledger
                .record_action(
                    ctx.case_uid,
                    &format!("tool.{tool_name}"),
                    &ctx.actor_id,
                    decision.reason.clone().unwrap_or_default().as_str(),
                    request.clone(),
                    json!({"error_code": code}),
                    &ctx.trace_id,
                    &span_id,
                )
                .await?;
            self.ledger
                .record_tool_trace(
                    action.uid,
                    tool_name,
                    request,
                    None,
                    ToolTraceStatus::Denied,
                    0,
                    decision.reason.clone(),
                    PolicyDecisionSummary {
                        allowed: false,
                        error_code: decision.error_code.clone(),
                        reason: decision.reason.clone(),
                    },
                )
                .await?;
            return Err(if code == "rate_limited" {
                BrokerError::RateLimited(decision.reason.unwrap_or_default())
            } else {
                BrokerError::PolicyDenied(decision.reason.unwrap_or_default())
            });
        }

        let started = Instant::now();
        let outcome = tokio::time::timeout(timeout, call).await;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let (status, response, error, result) = match outcome {
            Ok(Ok(value)) => {
                let response = serde_json::to_value(&value).ok();
                (ToolTraceStatus::Ok, response, None, Ok(value))
            }
            Ok(Err(tool_err)) => {
                let broker_err = BrokerError::from(tool_err);
                (
                    ToolTraceStatus::Error,
                    None,
                    Some(broker_err.to_string()),
                    Err(broker_err),
                )
            }
            Err(_elapsed) => (
                ToolTraceStatus::Error,
                None,
                Some("deadline exceeded".to_string()),
                Err(BrokerError::Timeout),
            ),
        };

        let outputs = match &result {
            Ok(_) => json!({"ok": true}),
            Err(err) => json!({"error_code": err.error_code()}),
        };
        let action = self
            .ledger
            .record_action(
                ctx.case_uid,
                &format!("tool.{tool_name}"),
                &ctx.actor_id,
                "tool broker dispatch",
                request.clone(),
                outputs,
                &ctx.trace_id,
                &span_id,
            )
            .await?;
        self.ledger
            .record_tool_trace(
                action.uid,
                tool_name,
                request,
                response,
                status,
                duration_ms,
                error,
                PolicyDecisionSummary {
                    allowed: true,
                    error_code: None,
                    reason: None,
                },
            )
            .await?;

        result
    }
}
