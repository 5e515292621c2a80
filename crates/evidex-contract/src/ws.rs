// crates/evidex-contract/src/ws.rs
// ============================================================================
// Module: WebSocket Frames
// Description: Tagged client/server frame envelopes for the chat WebSocket.
// Purpose: Give evidex-server and evidex-cli one shared, exhaustively matched wire shape.
// Dependencies: evidex-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Spec §6 names the WebSocket frame kinds without a concrete schema: this
//! module supplies one, as internally tagged `serde` enums so a single
//! `match` on the wire `kind` field dispatches both directions.

// ============================================================================
// SECTION: Imports
// ============================================================================

use evidex_core::core::AssertionKind;
use evidex_core::core::EpistemicTier;
use evidex_core::core::TraceId;
use evidex_core::core::Uid;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::problem::ProblemDetails;

// ============================================================================
// SECTION: Client Frames
// ============================================================================

/// A frame sent from the client to the server over the chat WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClientFrame {
    /// `chat.send` — submit a new question.
    #[serde(rename = "chat.send")]
    ChatSend {
        /// User's natural-language question.
        question: String,
    },
    /// `chat.abort` — cancel the in-flight chat turn.
    #[serde(rename = "chat.abort")]
    ChatAbort,
    /// `chat.history` — request prior turns for the current case.
    #[serde(rename = "chat.history")]
    ChatHistory {
        /// Maximum number of prior turns to return.
        #[serde(default = "default_history_limit")]
        limit: u32,
    },
}

/// Default `limit` when a `chat.history` request omits it.
const fn default_history_limit() -> u32 {
    20
}

// ============================================================================
// SECTION: Server Frames
// ============================================================================

/// A single prior chat turn returned by `chat.history.result`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatHistoryEntry {
    /// The question asked.
    pub question: String,
    /// Rendered answer text.
    pub answer_text: String,
    /// Epistemic tier the answer was labeled at.
    pub answer_type: EpistemicTier,
    /// Distributed trace the turn was recorded under.
    pub trace_id: TraceId,
}

/// A frame sent from the server to the client over the chat WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServerFrame {
    /// `chat.delta` — an incremental chunk of the in-progress answer.
    #[serde(rename = "chat.delta")]
    ChatDelta {
        /// Incremental text to append to the rendered answer.
        text: String,
    },
    /// `chat.tool` — a Tool Broker call was made while answering.
    #[serde(rename = "chat.tool")]
    ChatTool {
        /// Name of the tool invoked (e.g. `"meta_search"`).
        tool_name: String,
        /// Whether the call was admitted by the Policy Engine.
        allowed: bool,
    },
    /// `chat.done` — the answer is complete.
    #[serde(rename = "chat.done")]
    ChatDone {
        /// Final rendered answer text.
        answer_text: String,
        /// Epistemic tier the grounding gate assigned this answer.
        answer_type: EpistemicTier,
        /// Assertion uids cited in support of `answer_text`.
        evidence_citations: Vec<Uid<AssertionKind>>,
        /// Set when the gate blocked a full answer.
        #[serde(skip_serializing_if = "Option::is_none")]
        cannot_answer_reason: Option<String>,
        /// Distributed trace this chat turn was recorded under.
        trace_id: TraceId,
    },
    /// `chat.error` — the turn failed; `problem` carries the Problem
    /// Details envelope, matching the HTTP error convention.
    #[serde(rename = "chat.error")]
    ChatError {
        /// The error that ended the turn.
        problem: ProblemDetails,
    },
    /// `notify` — an out-of-band platform notification (spec §4.12).
    #[serde(rename = "notify")]
    Notify {
        /// Notification kind.
        kind: NotificationFrameKind,
        /// Notification-specific payload.
        payload: Value,
    },
    /// `chat.history.result` — response to a `chat.history` request.
    #[serde(rename = "chat.history.result")]
    ChatHistoryResult {
        /// Prior turns, most recent last.
        entries: Vec<ChatHistoryEntry>,
    },
}

/// The five notification kinds named in spec §4.12/§6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationFrameKind {
    /// An operator-facing alert (e.g. degraded budget, policy dev-mode).
    Alert,
    /// A web-crawl/archival job finished.
    CrawlerDone,
    /// A scheduled job finished.
    CronResult,
    /// A pipeline stage or run made progress.
    PipelineProgress,
    /// A fixture/collection import finished.
    CollectionDone,
}

#[cfg(test)]
mod tests {
    use evidex_core::error::ErrorKind;

    use super::*;

    #[test]
    fn client_frame_tags_chat_send_with_dotted_kind() {
        let frame = ClientFrame::ChatSend {
            question: "what happened".to_string(),
        };
        let value = serde_json::to_value(&frame).expect("serialize");
        assert_eq!(value["kind"], "chat.send");
        assert_eq!(value["question"], "what happened");
    }

    #[test]
    fn chat_history_defaults_limit_when_absent() {
        let frame: ClientFrame =
            serde_json::from_value(serde_json::json!({"kind": "chat.history"})).expect("deserialize");
        assert_eq!(frame, ClientFrame::ChatHistory { limit: 20 });
    }

    #[test]
    fn chat_error_frame_carries_problem_details() {
        let frame = ServerFrame::ChatError {
            problem: ProblemDetails::from_kind(ErrorKind::GatewayError, None, None),
        };
        let value = serde_json::to_value(&frame).expect("serialize");
        assert_eq!(value["kind"], "chat.error");
        assert_eq!(value["problem"]["error_code"], "gateway_error");
    }

    #[test]
    fn notify_frame_round_trips_pipeline_progress() {
        let frame = ServerFrame::Notify {
            kind: NotificationFrameKind::PipelineProgress,
            payload: serde_json::json!({"stage": "hypothesis_analyze", "percent": 40}),
        };
        let raw = serde_json::to_string(&frame).expect("serialize");
        let parsed: ServerFrame = serde_json::from_str(&raw).expect("deserialize");
        assert_eq!(frame, parsed);
    }
}
