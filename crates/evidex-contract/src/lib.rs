// crates/evidex-contract/src/lib.rs
// ============================================================================
// Module: Evidex Contract Library
// Description: Wire/API DTOs, Problem Details envelope, WebSocket frame types.
// Purpose: Give evidex-server and evidex-cli one shared HTTP/WS wire contract.
// Dependencies: evidex-core, serde, serde_json
// ============================================================================

//! ## Overview
//! `evidex-contract` is the single source of truth for the shapes crossing
//! the API boundary described in spec §6: request/response DTOs for the
//! representative HTTP surface, the RFC 9457 Problem Details error
//! envelope (spec §7), and the chat WebSocket's client/server frame types.
//! `evidex-server` and `evidex-cli` both depend on this crate rather than
//! on each other.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod examples;
pub mod problem;
pub mod types;
pub mod ws;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use problem::ProblemDetails;
pub use types::ArchiveUrlRequest;
pub use types::ChatRequest;
pub use types::ChatResponse;
pub use types::CreateCaseRequest;
pub use types::CreateCaseResponse;
pub use types::DocParseRequest;
pub use types::FullAnalysisRequest;
pub use types::ImportFixtureRequest;
pub use types::ImportFixtureResponse;
pub use types::MetaSearchRequest;
pub use types::MultiPerspectiveRequest;
pub use types::PipelineRunResponse;
pub use types::RunStageRequest;
pub use types::ScoreJudgmentRequest;
pub use types::ToolOkEnvelope;
pub use ws::ChatHistoryEntry;
pub use ws::ClientFrame;
pub use ws::NotificationFrameKind;
pub use ws::ServerFrame;
