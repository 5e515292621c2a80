// crates/evidex-server/src/handlers/analysis.rs
// ============================================================================
// Module: Analysis Handlers
// Description: Multi-perspective hypothesis generation, chat answers, and
//              judgment quality scoring.
// Purpose: Implement `POST /cases/{uid}/analysis/{multi_perspective,chat}`
//          and `POST /cases/{uid}/quality/score_judgment`.
// Dependencies: axum, evidex-contract, evidex-core, evidex-hypothesis
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use evidex_broker::CallContext;
use evidex_contract::types::ChatRequest;
use evidex_contract::types::ChatResponse;
use evidex_contract::types::MultiPerspectiveRequest;
use evidex_contract::types::ScoreJudgmentRequest;
use evidex_core::core::ActorId;
use evidex_core::core::AssertionKind;
use evidex_core::core::CaseKind;
use evidex_core::core::JudgmentKind;
use evidex_core::core::Timestamp;
use evidex_core::core::TraceId;
use evidex_core::core::Uid;
use evidex_core::error::ErrorKind;
use evidex_hypothesis::QualityReportV1;
use evidex_hypothesis::multi_perspective;
use evidex_hypothesis::quality::QualityInput;
use evidex_hypothesis::score_quality;
use serde_json::Value;
use serde_json::json;
use time::OffsetDateTime;

use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// SECTION: Multi-Perspective Hypothesis Generation
// ============================================================================

/// `POST /cases/{uid}/analysis/multi_perspective`.
///
/// Re-runs hypothesis generation under the three fixed personas (ignoring
/// `request.hypothesis_uid`, which names an existing hypothesis set and is
/// not itself regenerated) and persists every resulting hypothesis.
///
/// # Errors
///
/// Returns [`ApiError::not_found`] if the case does not exist, or
/// [`ApiError`] if generation or persistence fails.
pub async fn multi_perspective_handler(
    State(state): State<Arc<AppState>>,
    Path(case_uid): Path<Uid<CaseKind>>,
    Json(request): Json<MultiPerspectiveRequest>,
) -> Result<Json<Vec<evidex_core::core::Hypothesis>>, ApiError> {
    if state.store.get_case(case_uid).await?.is_none() {
        return Err(ApiError::not_found("case", case_uid));
    }
    let _ = &request.hypothesis_uid;

    let now = Timestamp::new(OffsetDateTime::now_utc());
    let assertions = state.store.list_assertions_by_case(case_uid).await?;
    let source_claims = state.store.list_source_claims_by_case(case_uid).await?;
    let ctx = CallContext {
        case_uid,
        actor_id: ActorId::new("api"),
        trace_id: TraceId::new(format!("multi-perspective-{case_uid}")),
    };

    let hypotheses = multi_perspective(
        &state.broker,
        state.ledger.as_ref(),
        &ctx,
        case_uid,
        &assertions,
        &source_claims,
        &state.budget_request(),
        evidex_hypothesis::DEFAULT_PERSONAS.len(),
        now,
    )
    .await?;

    for hypothesis in &hypotheses {
        state.store.create_hypothesis(hypothesis).await?;
    }

    Ok(Json(hypotheses))
}

// ============================================================================
// SECTION: Chat
// ============================================================================

/// `POST /cases/{uid}/analysis/chat` — the non-streaming counterpart to the
/// WebSocket `chat.send` frame: asks the Tool Broker for a structured answer
/// over the case's cited assertions, then applies the grounding gate before
/// persisting the resulting [`evidex_core::core::Judgment`].
///
/// # Errors
///
/// Returns [`ApiError::not_found`] if the case does not exist, or
/// [`ApiError`] if the broker call or persistence fails.
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Path(case_uid): Path<Uid<CaseKind>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if state.store.get_case(case_uid).await?.is_none() {
        return Err(ApiError::not_found("case", case_uid));
    }
    let now = Timestamp::new(OffsetDateTime::now_utc());
    let trace_id = TraceId::new(format!("chat-{case_uid}"));
    let ctx = CallContext { case_uid, actor_id: ActorId::new("api"), trace_id: trace_id.clone() };

    let judgment = answer_question(&state, &ctx, case_uid, &request.question, now).await?;
    state.store.create_judgment(&judgment).await?;

    Ok(Json(ChatResponse {
        answer_text: judgment.answer_text,
        answer_type: judgment.answer_tier,
        evidence_citations: judgment.evidence_citations,
        cannot_answer_reason: judgment.cannot_answer_reason,
        trace_id,
    }))
}

/// Asks the broker for a structured answer over the case's existing
/// assertions and folds the result through the grounding gate. Shared by
/// [`chat_handler`] and the WebSocket `chat.send` frame handler.
///
/// # Errors
///
/// Returns [`ApiError`] if the broker call fails.
pub async fn answer_question(
    state: &AppState,
    ctx: &CallContext,
    case_uid: Uid<CaseKind>,
    question: &str,
    now: Timestamp,
) -> Result<evidex_core::core::Judgment, ApiError> {
    let assertions = state.store.list_assertions_by_case(case_uid).await?;
    let schema = json!({
        "type": "object",
        "properties": {
            "answer_text": {"type": "string"},
            "cited_assertion_uids": {"type": "array", "items": {"type": "string"}},
        },
        "required": ["answer_text", "cited_assertion_uids"],
    });
    let prompt = format!(
        "Answer the question using only the case's {} cited assertions. Question: {question}",
        assertions.len()
    );

    let raw = state.broker.generate_structured(ctx, &prompt, &schema, &state.budget_request()).await?;
    let (answer_text, citations) = parse_chat_answer(&raw, &assertions);

    let tier = evidex_core::core::EpistemicTier::capped(
        evidex_core::core::EpistemicTier::Fact,
        citations.len(),
    );
    let judgment = evidex_core::core::Judgment {
        uid: Uid::<JudgmentKind>::random(),
        case_uid,
        title: question.to_string(),
        answer_tier: tier,
        answer_text,
        evidence_citations: citations,
        cannot_answer_reason: None,
        created_at: now,
    };
    Ok(judgment.grounding_gate())
}

fn parse_chat_answer(raw: &Value, assertions: &[evidex_core::core::Assertion]) -> (String, Vec<Uid<AssertionKind>>) {
    let answer_text = raw.get("answer_text").and_then(Value::as_str).unwrap_or_default().to_string();
    let cited_uids: Vec<Uid<AssertionKind>> = raw
        .get("cited_assertion_uids")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .filter_map(|wire| wire.parse().ok())
        .filter(|uid| assertions.iter().any(|assertion| assertion.uid == *uid))
        .collect();
    (answer_text, cited_uids)
}

// ============================================================================
// SECTION: Judgment Quality Scoring
// ============================================================================

/// `POST /cases/{uid}/quality/score_judgment`.
///
/// # Errors
///
/// Returns [`ApiError::not_found`] if the case or judgment does not exist,
/// or [`ApiError`] if the read fails.
pub async fn score_judgment_handler(
    State(state): State<Arc<AppState>>,
    Path(case_uid): Path<Uid<CaseKind>>,
    Json(request): Json<ScoreJudgmentRequest>,
) -> Result<Json<QualityReportV1>, ApiError> {
    let judgment_uid: Uid<JudgmentKind> = request
        .judgment_uid
        .parse()
        .map_err(|_err| ApiError::new(ErrorKind::ValidationError, "invalid judgment_uid"))?;
    let judgment =
        state.store.get_judgment(judgment_uid).await?.ok_or_else(|| ApiError::not_found("judgment", judgment_uid))?;
    if judgment.case_uid != case_uid {
        return Err(ApiError::not_found("judgment", judgment_uid));
    }

    let case_assertions = state.store.list_assertions_by_case(case_uid).await?;
    let source_claims = state.store.list_source_claims_by_case(case_uid).await?;
    let narratives = state.store.list_narratives_by_case(case_uid).await?;

    let mut source_claim_artifacts = Vec::with_capacity(source_claims.len());
    for claim in &source_claims {
        let chunk = state.store.get_chunk(claim.chunk_uid).await?;
        let artifact_version_uid =
            chunk.map(|chunk| chunk.artifact_version_uid).unwrap_or_else(Uid::random);
        source_claim_artifacts.push(artifact_version_uid);
    }

    let input = QualityInput {
        judgment: &judgment,
        case_assertions: &case_assertions,
        source_claims: &source_claims,
        source_claim_artifacts: &source_claim_artifacts,
        narratives: &narratives,
    };
    let (report, _trace_id) = score_quality(&input);
    Ok(Json(report))
}
