// crates/evidex-core/src/interfaces/mod.rs
// ============================================================================
// Module: Evidex Interfaces
// Description: Backend-agnostic trait seams for storage, tooling, and audit.
// Purpose: Define the contract surfaces implementers (store, broker, providers) satisfy.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Interfaces define how Evidex integrates with storage, outbound tools,
//! and audit sinks without embedding backend-specific details.
//! Implementations must fail closed on missing or invalid data and must
//! never silently drop an [`crate::core::Action`] or [`crate::core::ToolTrace`].
//!
//! Storage and tool-provider seams are `async` because they cross an I/O
//! boundary (database, object store, outbound HTTP) that the pipeline
//! orchestrator and event bus schedule cooperatively; pure evaluation
//! (hashing, invariant checks, Fusion Core math) stays synchronous in
//! [`crate::core`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::core::Action;
use crate::core::ActionKind;
use crate::core::ActorId;
use crate::core::CaseKind;
use crate::core::CheckpointKind;
use crate::core::HashDigest;
use crate::core::PolicyDecisionSummary;
use crate::core::RunKind;
use crate::core::SpanId;
use crate::core::Timestamp;
use crate::core::ToolTrace;
use crate::core::ToolTraceStatus;
use crate::core::TraceId;
use crate::core::Uid;
use crate::error::ErrorKind;

// ============================================================================
// SECTION: Audit Ledger
// ============================================================================

/// Errors raised by an [`AuditLedger`] implementation.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The backing store reported an I/O error.
    #[error("audit ledger io error: {0}")]
    Io(String),
    /// The write would violate append-only semantics (e.g. duplicate uid
    /// with different content on a non-upsert path).
    #[error("audit ledger integrity conflict: {0}")]
    IntegrityConflict(String),
}

impl AuditError {
    /// Maps this error onto the shared wire taxonomy, per
    /// `evidex_core::error`'s crate-local `kind()` convention.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Internal,
            Self::IntegrityConflict(_) => ErrorKind::IntegrityConflict,
        }
    }
}

/// Append-only record of every state-changing operation and every outbound
/// tool invocation.
///
/// # Invariants
/// - `record_action` and `record_tool_trace` never mutate a prior record;
///   implementations reject updates to an existing uid with a different
///   payload.
#[async_trait]
pub trait AuditLedger: Send + Sync {
    /// Appends an [`Action`], ideally in the same transaction as the state
    /// change it documents.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when the write fails or would violate
    /// append-only semantics.
    #[allow(clippy::too_many_arguments)]
    async fn record_action(
        &self,
        case_uid: Uid<CaseKind>,
        action_type: &str,
        actor_id: &ActorId,
        rationale: &str,
        inputs: Value,
        outputs: Value,
        trace_id: &TraceId,
        span_id: &SpanId,
    ) -> Result<Action, AuditError>;

    /// Appends a [`ToolTrace`] bound to `action_uid`. Implementations
    /// should write this in the same transaction as `action_uid` when the
    /// backend supports it; otherwise this is at-least-once with
    /// idempotent upsert keyed by the returned trace uid.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when the write fails.
    #[allow(clippy::too_many_arguments)]
    async fn record_tool_trace(
        &self,
        action_uid: Uid<ActionKind>,
        tool_name: &str,
        request: Value,
        response: Option<Value>,
        status: ToolTraceStatus,
        duration_ms: u64,
        error: Option<String>,
        policy: PolicyDecisionSummary,
    ) -> Result<ToolTrace, AuditError>;
}

/// Optional sink writing every audit record to a date-partitioned
/// append-only file (`traces-YYYY-MM-DD.jsonl`).
#[async_trait]
pub trait JsonlSink: Send + Sync {
    /// Appends one JSON-serializable audit record to the current
    /// date-partitioned file.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when the write fails.
    async fn persist_jsonl(&self, record: Value) -> Result<(), AuditError>;
}

// ============================================================================
// SECTION: Artifact Store Facade
// ============================================================================

/// Errors raised by an [`ArtifactStore`] implementation.
#[derive(Debug, Error)]
pub enum ArtifactStoreError {
    /// The backing store reported an I/O error.
    #[error("artifact store io error: {0}")]
    Io(String),
    /// The stored bytes' hash did not match the requested digest.
    #[error("artifact store content hash mismatch for key {0}")]
    HashMismatch(String),
    /// No bytes are stored under the requested key.
    #[error("artifact store key not found: {0}")]
    NotFound(String),
}

impl ArtifactStoreError {
    /// Maps this error onto the shared wire taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Internal,
            Self::HashMismatch(_) => ErrorKind::IntegrityConflict,
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }
}

/// Content-addressed object storage facade used by ingestion and the
/// Artifact Store component.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Writes `bytes` under the content-addressed key derived from
    /// `digest`, returning the storage key.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactStoreError`] when the write fails.
    async fn put(&self, digest: &HashDigest, bytes: &[u8]) -> Result<String, ArtifactStoreError>;

    /// Reads the bytes stored under `storage_key`.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactStoreError::NotFound`] when no bytes are stored
    /// under `storage_key`, or [`ArtifactStoreError::Io`] on I/O failure.
    async fn get(&self, storage_key: &str) -> Result<Vec<u8>, ArtifactStoreError>;

    /// Returns whether bytes are stored under `storage_key`.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactStoreError::Io`] on I/O failure.
    async fn exists(&self, storage_key: &str) -> Result<bool, ArtifactStoreError>;
}

// ============================================================================
// SECTION: Checkpoint Store
// ============================================================================

/// A single pipeline checkpoint, keyed by `thread_id = run_id`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Checkpoint {
    /// Checkpoint uid.
    pub uid: Uid<CheckpointKind>,
    /// The pipeline run this checkpoint belongs to.
    pub thread_id: Uid<RunKind>,
    /// Opaque serialized `StageContext` snapshot.
    pub state_json: Value,
    /// Name of the stage this checkpoint was taken after.
    pub step: String,
    /// Previous checkpoint in the chain, if any.
    pub parent_checkpoint_id: Option<Uid<CheckpointKind>>,
    /// Implementation-defined metadata (e.g. stage duration, retry count).
    pub metadata: Value,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

/// Errors raised by a [`CheckpointStore`] implementation.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// The backing store reported an I/O error.
    #[error("checkpoint store io error: {0}")]
    Io(String),
}

impl CheckpointError {
    /// Maps this error onto the shared wire taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Internal,
        }
    }
}

/// Persists and resumes pipeline run checkpoints.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Appends a checkpoint for `thread_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError`] when the write fails.
    async fn save(&self, checkpoint: Checkpoint) -> Result<(), CheckpointError>;

    /// Loads the most recent checkpoint for `thread_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError`] when the read fails.
    async fn load_latest(
        &self,
        thread_id: Uid<RunKind>,
    ) -> Result<Option<Checkpoint>, CheckpointError>;
}

// ============================================================================
// SECTION: Tool Provider Seams
// ============================================================================

/// Errors raised by a tool provider implementation. The Tool Broker maps
/// these onto [`crate::error::ErrorKind`] at the policy boundary.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The request was rejected before being sent upstream.
    #[error("tool request invalid: {0}")]
    InvalidRequest(String),
    /// The upstream tool service returned an error.
    #[error("tool upstream error: {0}")]
    Upstream(String),
    /// The call exceeded its deadline.
    #[error("tool call timed out")]
    Timeout,
}

/// A single normalized search result, regardless of which backing search
/// provider produced it (Design Notes §9: one normalized shape).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SearchResult {
    /// Result title.
    pub title: String,
    /// Result URL.
    pub url: String,
    /// Short snippet, if the provider returns one.
    pub snippet: Option<String>,
}

/// Performs web/meta search, one of the Tool Broker's five tool kinds.
#[async_trait]
pub trait SearchTool: Send + Sync {
    /// Runs a search query, returning normalized results.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError`] when the call is invalid, fails upstream, or
    /// times out.
    async fn meta_search(&self, query: &str, max_results: u32) -> Result<Vec<SearchResult>, ToolError>;
}

/// Retrieves and archives a URL's content, returning raw bytes plus
/// transport metadata.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FetchedArtifact {
    /// Raw response bytes.
    pub bytes: Vec<u8>,
    /// Response `Content-Type` header, if present.
    pub mime_type: Option<String>,
    /// HTTP status code.
    pub http_status: u16,
    /// Response `ETag` header, if present.
    pub etag: Option<String>,
}

/// Archives (fetches and durably stores) a URL, one of the Tool Broker's
/// five tool kinds.
#[async_trait]
pub trait ArchiveTool: Send + Sync {
    /// Fetches `url`, subject to the Policy Engine's scheme/host/rate
    /// checks performed by the caller before this is invoked.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError`] when the call is invalid, fails upstream, or
    /// times out.
    async fn archive_url(&self, url: &str) -> Result<FetchedArtifact, ToolError>;
}

/// A single normalized parsed-document shape, regardless of which backing
/// parse service produced it (Design Notes §9).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ParsedDocument {
    /// Extracted plaintext.
    pub text: String,
    /// Document title, if the parser extracted one.
    pub title: Option<String>,
    /// Set when the configured parser failed and a plaintext fallback was
    /// used instead of aborting ingestion.
    pub parse_error: Option<String>,
}

/// Parses raw document bytes into a normalized shape, one of the Tool
/// Broker's five tool kinds.
#[async_trait]
pub trait ParseTool: Send + Sync {
    /// Parses `bytes` of the given `mime_type`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Upstream`] only for unrecoverable failures;
    /// recoverable parser failures are represented as a successful result
    /// with `parse_error` set, per ingestion's plaintext-fallback policy.
    async fn doc_parse(&self, bytes: &[u8], mime_type: &str) -> Result<ParsedDocument, ToolError>;
}

/// Embeds chunk text into a vector representation, one of the Tool
/// Broker's five tool kinds.
#[async_trait]
pub trait EmbedTool: Send + Sync {
    /// Embeds a bounded batch of chunk texts, returning one vector per
    /// input in the same order.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError`] when the call is invalid, fails upstream, or
    /// times out.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ToolError>;
}

/// Generates structured output from an LLM, one of the Tool Broker's five
/// tool kinds. Used by the Hypothesis Engine's `generate`/`analyze`/
/// `multiPerspective` operations.
#[async_trait]
pub trait GenerateTool: Send + Sync {
    /// Requests a structured completion conforming to `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError`] when the call is invalid, fails upstream, or
    /// times out. Budget/degradation handling happens in the Policy
    /// Engine before this is invoked; this trait only represents the raw
    /// provider call.
    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &Value,
        model_id: &str,
    ) -> Result<Value, ToolError>;
}
