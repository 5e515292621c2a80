// crates/evidex-ingest/src/lib.rs
// ============================================================================
// Crate: evidex-ingest
// Description: Document -> chunked text -> embedded vectors + SourceClaims.
// ============================================================================

//! Ingestion turns retrieved bytes into the case's evidence graph: parse via
//! the Tool Broker, content-address and persist the bytes, split the parsed
//! text into anchored [`evidex_core::core::Chunk`]s
//! ([`chunker`]), embed each bounded batch with retry, and extract
//! grounded [`evidex_core::core::claim::SourceClaim`]s from every chunk
//! ([`claims`]). [`pipeline::IngestionPipeline`] is the entry point other
//! crates (the Pipeline Orchestrator, the Investigation Loop) call.

#![deny(unsafe_code)]
#![deny(missing_docs)]

pub mod chunker;
pub mod claims;
pub mod pipeline;

pub use chunker::ChunkSpan;
pub use claims::extract_source_claims;
pub use pipeline::IngestConfig;
pub use pipeline::IngestError;
pub use pipeline::IngestOutcome;
pub use pipeline::IngestionPipeline;
