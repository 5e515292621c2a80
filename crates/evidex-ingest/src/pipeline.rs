// crates/evidex-ingest/src/pipeline.rs
// ============================================================================
// Module: Ingestion Pipeline
// Description: Document bytes -> parsed text -> chunks + embeddings + SourceClaims.
// Purpose: Implement the ingestion data flow end to end.
// Dependencies: evidex-broker, evidex-core, tokio
// ============================================================================

//! ## Overview
//! [`IngestionPipeline::ingest_bytes`] and [`IngestionPipeline::ingest_url`]
//! are the two entry points: parse via [`evidex_broker::ToolBroker::doc_parse`]
//! (or fetch-then-parse via [`evidex_broker::ToolBroker::archive_url`]),
//! content-address and persist the raw bytes through an
//! [`evidex_core::interfaces::ArtifactStore`], chunk the parsed text
//! ([`crate::chunker`]), embed each bounded batch with retries
//! ([`evidex_broker::ToolBroker::embed`]), and extract
//! [`evidex_core::core::claim::SourceClaim`]s from every chunk
//! ([`crate::claims`]). Parser failures fall back to a plaintext rendering
//! rather than aborting; terminal embedding failure after
//! retries marks the affected chunks `embedding_synced = false` and the
//! overall outcome `partial = true`, never failing the whole ingestion.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use evidex_broker::BrokerError;
use evidex_broker::CallContext;
use evidex_broker::ToolBroker;
use evidex_core::core::ArtifactIdentityKind;
use evidex_core::core::ArtifactVersion;
use evidex_core::core::ArtifactVersionKind;
use evidex_core::core::CaseKind;
use evidex_core::core::Chunk;
use evidex_core::core::Evidence;
use evidex_core::core::RetentionPolicy;
use evidex_core::core::SourceClaim;
use evidex_core::core::SourceMeta;
use evidex_core::core::Timestamp;
use evidex_core::core::Uid;
use evidex_core::core::chunk::AnchorHealth;
use evidex_core::core::hashing::sha256_of;
use evidex_core::interfaces::ArtifactStore;
use evidex_core::interfaces::ArtifactStoreError;
use thiserror::Error;

use crate::chunker;
use crate::claims;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Tunables for one [`IngestionPipeline`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IngestConfig {
    /// Maximum characters per chunk (default 2000).
    pub max_chunk_chars: usize,
    /// Character overlap between consecutive chunks (default 200).
    pub chunk_overlap: usize,
    /// Maximum chunk texts embedded in a single broker call.
    pub embed_batch_size: usize,
    /// Maximum embedding attempts per batch before marking it failed
    /// (default 3 attempts).
    pub embed_max_attempts: u32,
    /// Base delay for the exponential backoff between embedding retries.
    pub embed_backoff_base: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: chunker::DEFAULT_MAX_CHARS,
            chunk_overlap: chunker::DEFAULT_OVERLAP,
            embed_batch_size: 32,
            embed_max_attempts: 3,
            embed_backoff_base: Duration::from_millis(200),
        }
    }
}

// ============================================================================
// SECTION: Outcome and Errors
// ============================================================================

/// The entities produced by one ingestion run.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    /// The immutable retrieval record created for the ingested bytes.
    pub artifact_version: ArtifactVersion,
    /// Chunks produced from the parsed text, in ordinal order.
    pub chunks: Vec<Chunk>,
    /// One [`Evidence`] per chunk.
    pub evidence: Vec<Evidence>,
    /// Source claims extracted from every chunk.
    pub source_claims: Vec<SourceClaim>,
    /// Set when at least one embedding batch terminally failed; the
    /// affected chunks have `embedding_synced = false`.
    pub partial: bool,
}

/// Errors raised while ingesting a document.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The Tool Broker rejected or failed an outbound call.
    #[error("tool broker error during ingestion: {0}")]
    Broker(#[from] BrokerError),
    /// The Artifact Store Facade failed to persist the retrieved bytes.
    #[error("artifact store error during ingestion: {0}")]
    ArtifactStore(#[from] ArtifactStoreError),
}

impl IngestError {
    /// Maps this error onto the shared wire taxonomy.
    #[must_use]
    pub fn kind(&self) -> evidex_core::error::ErrorKind {
        match self {
            Self::Broker(err) => err.kind(),
            Self::ArtifactStore(err) => err.kind(),
        }
    }
}

// ============================================================================
// SECTION: Ingestion Pipeline
// ============================================================================

/// Runs the document -> chunks -> embeddings -> claims ingestion flow.
pub struct IngestionPipeline {
    broker: Arc<ToolBroker>,
    artifact_store: Arc<dyn ArtifactStore>,
    config: IngestConfig,
}

impl IngestionPipeline {
    /// Builds a pipeline over the given broker and artifact store.
    #[must_use]
    pub fn new(broker: Arc<ToolBroker>, artifact_store: Arc<dyn ArtifactStore>, config: IngestConfig) -> Self {
        Self { broker, artifact_store, config }
    }

    /// Ingests raw `bytes` of `mime_type` directly (e.g. an uploaded file).
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] when parsing or artifact storage fails
    /// unrecoverably. Embedding failures degrade the outcome rather than
    /// erroring (`outcome.partial = true`).
    pub async fn ingest_bytes(
        &self,
        ctx: &CallContext,
        case_uid: Uid<CaseKind>,
        artifact_identity_uid: Uid<ArtifactIdentityKind>,
        bytes: &[u8],
        mime_type: &str,
        source_url: Option<&str>,
        source_meta: SourceMeta,
        now: Timestamp,
    ) -> Result<IngestOutcome, IngestError> {
        let parsed = self.broker.doc_parse(ctx, bytes, mime_type, source_url).await?;

        let digest = sha256_of(bytes);
        let storage_ref = self.artifact_store.put(&digest, bytes).await?;

        let mut source_meta = source_meta;
        source_meta.parse_error = parsed.parse_error.clone();

        let artifact_version = ArtifactVersion {
            uid: Uid::<ArtifactVersionKind>::random(),
            case_uid,
            artifact_identity_uid,
            content_sha256: digest,
            storage_ref,
            mime_type: mime_type.to_string(),
            retrieved_at: now,
            source_meta,
            created_at: now,
        };

        let outcome = self.chunk_and_embed(ctx, case_uid, &artifact_version, &parsed.text, now).await?;
        Ok(outcome)
    }

    /// Fetches `url` via the Tool Broker's `archive_url` operation, then
    /// ingests the retrieved bytes as in [`IngestionPipeline::ingest_bytes`].
    ///
    /// # Errors
    ///
    /// See [`IngestionPipeline::ingest_bytes`].
    pub async fn ingest_url(
        &self,
        ctx: &CallContext,
        case_uid: Uid<CaseKind>,
        artifact_identity_uid: Uid<ArtifactIdentityKind>,
        url: &str,
        now: Timestamp,
    ) -> Result<IngestOutcome, IngestError> {
        let fetched = self.broker.archive_url(ctx, url).await?;
        let mime_type = fetched.mime_type.clone().unwrap_or_else(|| "application/octet-stream".to_string());
        let source_meta = SourceMeta {
            http_status: Some(fetched.http_status),
            etag: fetched.etag.clone(),
            parse_error: None,
        };
        self.ingest_bytes(
            ctx,
            case_uid,
            artifact_identity_uid,
            &fetched.bytes,
            &mime_type,
            Some(url),
            source_meta,
            now,
        )
        .await
    }

    async fn chunk_and_embed(
        &self,
        ctx: &CallContext,
        case_uid: Uid<CaseKind>,
        artifact_version: &ArtifactVersion,
        text: &str,
        now: Timestamp,
    ) -> Result<IngestOutcome, IngestError> {
        let spans = chunker::chunk_text(text, self.config.max_chunk_chars, self.config.chunk_overlap);

        let mut chunks: Vec<Chunk> = spans
            .iter()
            .map(|span| Chunk {
                uid: Uid::random(),
                case_uid,
                artifact_version_uid: artifact_version.uid,
                ordinal: span.ordinal,
                text: span.text.clone(),
                anchor_set: chunker::anchor_set_for(text, span),
                anchor_health: AnchorHealth::unchecked(),
                embedding_synced: false,
                created_at: now,
            })
            .collect();

        let mut partial = false;
        for batch in chunks.chunks_mut(self.config.embed_batch_size) {
            let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
            match self.embed_with_retry(ctx, &texts).await {
                Ok(_vectors) => {
                    for chunk in batch.iter_mut() {
                        chunk.embedding_synced = true;
                    }
                }
                Err(error) => {
                    tracing::warn!(error = %error, "embedding batch failed after retries, marking partial");
                    partial = true;
                }
            }
        }

        let mut evidence = Vec::with_capacity(chunks.len());
        let mut source_claims = Vec::new();
        for chunk in &chunks {
            let evidence_record = Evidence {
                uid: Uid::random(),
                case_uid,
                chunk_uid: chunk.uid,
                license: None,
                pii_flag: false,
                retention_policy: RetentionPolicy::Indefinite,
                created_at: now,
            };
            source_claims.extend(claims::extract_source_claims(
                case_uid,
                evidence_record.uid,
                chunk.uid,
                &chunk.text,
                now,
                Uid::random,
            ));
            evidence.push(evidence_record);
        }

        Ok(IngestOutcome { artifact_version: artifact_version.clone(), chunks, evidence, source_claims, partial })
    }

    /// Embeds one bounded batch, retrying up to `embed_max_attempts` times
    /// with exponential backoff before giving up.
    async fn embed_with_retry(
        &self,
        ctx: &CallContext,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, BrokerError> {
        let mut attempt = 0u32;
        loop {
            match self.broker.embed(ctx, texts).await {
                Ok(vectors) => return Ok(vectors),
                Err(error) if attempt + 1 < self.config.embed_max_attempts => {
                    attempt += 1;
                    let backoff = self.config.embed_backoff_base * 2u32.pow(attempt - 1);
                    tracing::warn!(attempt, error = %error, "retrying embed batch");
                    tokio::time::sleep(backoff).await;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
