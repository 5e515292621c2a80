// crates/evidex-contract/src/types.rs
// ============================================================================
// Module: Contract Types
// Description: Request/response DTOs for the representative HTTP surface.
// Purpose: Give evidex-server and evidex-cli one shared, versioned wire shape.
// Dependencies: evidex-core, serde, serde_json
// ============================================================================

//! ## Overview
//! These types cover the representative HTTP surface of spec §6. They are
//! thin: entity bodies returned by the read-projection endpoints
//! (`GET /evidence/{uid}`, `GET /judgments/{uid}`, …) serialize the
//! corresponding `evidex_core::core` type directly rather than duplicating
//! its fields here — only request bodies and composite/derived responses
//! get a dedicated DTO.

// ============================================================================
// SECTION: Imports
// ============================================================================

use evidex_core::core::ActionKind;
use evidex_core::core::AssertionKind;
use evidex_core::core::CaseKind;
use evidex_core::core::EpistemicTier;
use evidex_core::core::EvidenceKind;
use evidex_core::core::TraceId;
use evidex_core::core::Uid;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Case Endpoints
// ============================================================================

/// Request body for `POST /cases`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCaseRequest {
    /// Case title.
    pub title: String,
    /// Acting principal; defaults to a system actor when omitted.
    #[serde(default)]
    pub actor_id: Option<String>,
    /// Rationale recorded on the creating `Action`.
    #[serde(default)]
    pub rationale: Option<String>,
}

/// Response body for a successful `POST /cases`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCaseResponse {
    /// Newly created case uid.
    pub case_uid: Uid<CaseKind>,
    /// Echoed case title.
    pub title: String,
    /// Uid of the `Action` documenting this creation.
    pub action_uid: Uid<ActionKind>,
}

/// Request body for `POST /cases/{uid}/fixtures/import`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportFixtureRequest {
    /// Name of the fixture bundle to import (e.g. `"defgeo-001"`).
    pub fixture_name: String,
}

/// Response body for a successful fixture import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportFixtureResponse {
    /// Whether every fixture record imported without error.
    pub ok: bool,
    /// Artifact versions created by the import.
    pub artifact_version_uids: Vec<String>,
    /// Evidence records created by the import.
    pub evidence_uids: Vec<Uid<EvidenceKind>>,
    /// Assertions created by the import.
    pub assertion_uids: Vec<Uid<AssertionKind>>,
}

// ============================================================================
// SECTION: Tool Broker Endpoints
// ============================================================================

/// Request body for `POST /tools/meta_search` and
/// `POST /cases/{uid}/tools/meta_search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaSearchRequest {
    /// Search query text.
    pub q: String,
    /// Maximum number of results to return.
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

/// Default `max_results` when a `meta_search` request omits it.
const fn default_max_results() -> u32 {
    10
}

/// Request body for `POST /cases/{uid}/tools/archive_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveUrlRequest {
    /// URL to fetch and durably archive.
    pub url: String,
}

/// Request body for `POST /tools/doc_parse`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocParseRequest {
    /// The artifact version whose bytes should be parsed.
    pub artifact_version_uid: String,
    /// Source URL the bytes were retrieved from, for MIME inference.
    pub file_url: String,
}

/// Envelope every tool-broker endpoint returns on success, per spec §6
/// (`{ok: bool, ...}`). Errors instead return a [`crate::ProblemDetails`]
/// body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOkEnvelope<T> {
    /// Always `true`; present for uniformity with the documented shape.
    pub ok: bool,
    /// The tool-specific result payload.
    #[serde(flatten)]
    pub result: T,
}

impl<T> ToolOkEnvelope<T> {
    /// Wraps `result` in the conventional `{ok: true, ...}` success shape.
    pub const fn ok(result: T) -> Self {
        Self { ok: true, result }
    }
}

// ============================================================================
// SECTION: Pipeline Endpoints
// ============================================================================

/// Request body for `POST /cases/{uid}/pipelines/full_analysis`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullAnalysisRequest {
    /// Name of the playbook to run; defaults to the platform default.
    #[serde(default)]
    pub playbook_name: Option<String>,
}

/// Request body for `POST /cases/{uid}/pipelines/run_stage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStageRequest {
    /// Stage name to run in isolation.
    pub stage_name: String,
}

/// Response body shared by `full_analysis` and `run_stage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRunResponse {
    /// Pipeline run identifier, usable to poll or resume.
    pub run_uid: String,
    /// Current run status (`"running"`, `"completed"`, `"failed"`).
    pub status: String,
    /// Stages completed so far, in execution order.
    pub completed_stages: Vec<String>,
}

// ============================================================================
// SECTION: Analysis Endpoints
// ============================================================================

/// Request body for `POST /cases/{uid}/analysis/multi_perspective`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiPerspectiveRequest {
    /// Hypothesis to analyze from each persona's perspective.
    pub hypothesis_uid: String,
}

/// Request body for `POST /cases/{uid}/analysis/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// User's natural-language question.
    pub question: String,
}

/// Response body for `POST /cases/{uid}/analysis/chat`, per spec §6.
///
/// # Invariants
/// - `answer_type == Fact` implies `evidence_citations` is non-empty (the
///   grounding gate, spec §4.2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Rendered answer text; empty when the grounding gate blocks an answer.
    pub answer_text: String,
    /// Epistemic tier the grounding gate assigned this answer.
    pub answer_type: EpistemicTier,
    /// Assertion uids cited in support of `answer_text`, matching
    /// [`evidex_core::core::Judgment::evidence_citations`]'s convention.
    pub evidence_citations: Vec<Uid<AssertionKind>>,
    /// Set when the gate blocked a full answer (e.g. `"evidence_insufficient"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cannot_answer_reason: Option<String>,
    /// Distributed trace this chat turn was recorded under.
    pub trace_id: TraceId,
}

/// Request body for `POST /cases/{uid}/quality/score_judgment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreJudgmentRequest {
    /// Judgment to score.
    pub judgment_uid: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_ok_envelope_flattens_inner_fields() {
        #[derive(Debug, Serialize)]
        struct Inner {
            value: u32,
        }
        let envelope = ToolOkEnvelope::ok(Inner { value: 7 });
        let json = serde_json::to_value(&envelope).expect("serialize");
        assert_eq!(json["ok"], true);
        assert_eq!(json["value"], 7);
    }

    #[test]
    fn chat_response_omits_cannot_answer_reason_when_answered() {
        let response = ChatResponse {
            answer_text: "the port closed on 2026-01-05".to_string(),
            answer_type: EpistemicTier::Fact,
            evidence_citations: vec![Uid::from_seed(b"ev-1")],
            cannot_answer_reason: None,
            trace_id: TraceId::new("trace-1"),
        };
        let json = serde_json::to_value(&response).expect("serialize");
        assert!(json.get("cannot_answer_reason").is_none());
    }
}
