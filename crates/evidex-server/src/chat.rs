// crates/evidex-server/src/chat.rs
// ============================================================================
// Module: Chat WebSocket
// Description: Upgrades a case-scoped connection into the chat.* frame protocol.
// Purpose: Implement `GET /cases/{uid}/chat/ws` (spec §6).
// Dependencies: axum, evidex-contract, evidex-core, evidex-events
// ============================================================================

//! ## Overview
//! One WebSocket connection serves one case for one actor. `chat.send`
//! drives the same [`crate::handlers::analysis::answer_question`] path the
//! HTTP `POST /cases/{uid}/analysis/chat` endpoint uses, rendered as a
//! single `chat.delta` followed by `chat.done` rather than true token
//! streaming (the Tool Broker's `generate_structured` is not itself
//! streaming). `chat.history` replays prior turns from persisted
//! [`evidex_core::core::Judgment`] rows. While the socket is open, the
//! connection also doubles as a [`evidex_events::notify::Sink`]: any
//! `NotificationHub::notify`/`broadcast` call addressed to the connecting
//! actor is forwarded as a `notify` frame.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::extract::ws::Message;
use axum::extract::ws::WebSocket;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;
use evidex_broker::CallContext;
use evidex_contract::problem::ProblemDetails;
use evidex_contract::ws::ChatHistoryEntry;
use evidex_contract::ws::ClientFrame;
use evidex_contract::ws::NotificationFrameKind;
use evidex_contract::ws::ServerFrame;
use evidex_core::core::ActorId;
use evidex_core::core::CaseKind;
use evidex_core::core::NotificationKind;
use evidex_core::core::Timestamp;
use evidex_core::core::TraceId;
use evidex_core::core::Uid;
use evidex_events::notify::Sink;
use evidex_events::notify::SinkError;
use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::mpsc;

use crate::handlers::analysis::answer_question;
use crate::state::AppState;

/// Query parameters accepted by the chat WebSocket upgrade.
#[derive(Debug, Deserialize)]
pub struct ChatWsParams {
    /// Acting user, used both as the audit actor and the notification
    /// registry key. Defaults to `"anonymous"` when omitted.
    #[serde(default = "default_actor")]
    actor_id: String,
}

fn default_actor() -> String {
    "anonymous".to_string()
}

/// Forwards [`NotificationHub`](evidex_events::notify::NotificationHub)
/// deliveries into the WebSocket's outbound channel as `notify` frames.
struct WsNotifySink(mpsc::UnboundedSender<ServerFrame>);

impl Sink for WsNotifySink {
    fn send(&self, kind: NotificationKind, payload: &Value) -> Result<(), SinkError> {
        let frame = ServerFrame::Notify { kind: map_notification_kind(kind), payload: payload.clone() };
        self.0.send(frame).map_err(|_err| SinkError("chat socket closed".to_string()))
    }
}

const fn map_notification_kind(kind: NotificationKind) -> NotificationFrameKind {
    match kind {
        NotificationKind::Alert => NotificationFrameKind::Alert,
        NotificationKind::CrawlerDone => NotificationFrameKind::CrawlerDone,
        NotificationKind::CronResult => NotificationFrameKind::CronResult,
        NotificationKind::PipelineProgress => NotificationFrameKind::PipelineProgress,
        NotificationKind::CollectionDone => NotificationFrameKind::CollectionDone,
    }
}

/// `GET /cases/{uid}/chat/ws` — upgrades to the chat frame protocol.
pub async fn chat_ws(
    State(state): State<Arc<AppState>>,
    Path(case_uid): Path<Uid<CaseKind>>,
    Query(params): Query<ChatWsParams>,
    upgrade: WebSocketUpgrade,
) -> impl IntoResponse {
    let actor_id = ActorId::new(params.actor_id);
    upgrade.on_upgrade(move |socket| run_chat_socket(socket, state, case_uid, actor_id))
}

async fn run_chat_socket(mut socket: WebSocket, state: Arc<AppState>, case_uid: Uid<CaseKind>, actor_id: ActorId) {
    let (notify_tx, mut notify_rx) = mpsc::unbounded_channel::<ServerFrame>();
    state.notifications.register(actor_id.clone(), Arc::new(WsNotifySink(notify_tx)));

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                let Some(incoming) = incoming else { break };
                let Ok(message) = incoming else { break };
                let Message::Text(text) = message else { continue };
                let Ok(frame) = serde_json::from_str::<ClientFrame>(&text) else {
                    let problem = ProblemDetails::from_kind(
                        evidex_core::error::ErrorKind::ValidationError,
                        Some("malformed client frame".to_string()),
                        None,
                    );
                    if send_frame(&mut socket, &ServerFrame::ChatError { problem }).await.is_err() {
                        break;
                    }
                    continue;
                };
                if !handle_client_frame(&mut socket, &state, case_uid, &actor_id, frame).await {
                    break;
                }
            }
            Some(notify_frame) = notify_rx.recv() => {
                if send_frame(&mut socket, &notify_frame).await.is_err() {
                    break;
                }
            }
        }
    }

    state.notifications.unregister(&actor_id);
}

/// Handles one decoded [`ClientFrame`]. Returns `false` when the socket
/// should close (send failure).
async fn handle_client_frame(
    socket: &mut WebSocket,
    state: &Arc<AppState>,
    case_uid: Uid<CaseKind>,
    actor_id: &ActorId,
    frame: ClientFrame,
) -> bool {
    match frame {
        ClientFrame::ChatSend { question } => handle_chat_send(socket, state, case_uid, actor_id, &question).await,
        ClientFrame::ChatAbort => true,
        ClientFrame::ChatHistory { limit } => handle_chat_history(socket, state, case_uid, limit).await,
    }
}

async fn handle_chat_send(
    socket: &mut WebSocket,
    state: &Arc<AppState>,
    case_uid: Uid<CaseKind>,
    actor_id: &ActorId,
    question: &str,
) -> bool {
    let now = Timestamp::new(OffsetDateTime::now_utc());
    let trace_id = TraceId::new(format!("chat-ws-{case_uid}"));
    let ctx = CallContext { case_uid, actor_id: actor_id.clone(), trace_id: trace_id.clone() };

    let judgment = match answer_question(state, &ctx, case_uid, question, now).await {
        Ok(judgment) => judgment,
        Err(err) => {
            let problem = ProblemDetails::from_kind(err.kind(), Some(err.to_string()), None);
            return send_frame(socket, &ServerFrame::ChatError { problem }).await.is_ok();
        }
    };
    if let Err(err) = state.store.create_judgment(&judgment).await {
        let problem = ProblemDetails::from_kind(err.kind(), Some(err.to_string()), None);
        return send_frame(socket, &ServerFrame::ChatError { problem }).await.is_ok();
    }

    if send_frame(socket, &ServerFrame::ChatDelta { text: judgment.answer_text.clone() }).await.is_err() {
        return false;
    }
    send_frame(
        socket,
        &ServerFrame::ChatDone {
            answer_text: judgment.answer_text,
            answer_type: judgment.answer_tier,
            evidence_citations: judgment.evidence_citations,
            cannot_answer_reason: judgment.cannot_answer_reason,
            trace_id,
        },
    )
    .await
    .is_ok()
}

async fn handle_chat_history(
    socket: &mut WebSocket,
    state: &Arc<AppState>,
    case_uid: Uid<CaseKind>,
    limit: u32,
) -> bool {
    let judgments = match state.store.list_judgments_by_case(case_uid).await {
        Ok(judgments) => judgments,
        Err(err) => {
            let problem = ProblemDetails::from_kind(err.kind(), Some(err.to_string()), None);
            return send_frame(socket, &ServerFrame::ChatError { problem }).await.is_ok();
        }
    };
    let mut judgments = judgments;
    judgments.sort_by_key(|judgment| judgment.created_at.as_offset_date_time());
    let limit = limit as usize;
    let start = judgments.len().saturating_sub(limit);
    let entries: Vec<ChatHistoryEntry> = judgments[start..]
        .iter()
        .map(|judgment| ChatHistoryEntry {
            question: judgment.title.clone(),
            answer_text: judgment.answer_text.clone(),
            answer_type: judgment.answer_tier,
            trace_id: TraceId::new(format!("chat-{}", judgment.uid)),
        })
        .collect();
    send_frame(socket, &ServerFrame::ChatHistoryResult { entries }).await.is_ok()
}

async fn send_frame(socket: &mut WebSocket, frame: &ServerFrame) -> Result<(), axum::Error> {
    let text = serde_json::to_string(frame).unwrap_or_else(|_err| "{}".to_string());
    socket.send(Message::Text(text.into())).await
}
