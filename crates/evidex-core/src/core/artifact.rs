// crates/evidex-core/src/core/artifact.rs
// ============================================================================
// Module: Artifact Identity / Version
// Description: Logical source identity and immutable per-retrieval versions.
// Purpose: Content-address and deduplicate retrieved source material.
// Dependencies: crate::core::{hashing, identifiers, time}
// ============================================================================

//! ## Overview
//! An [`ArtifactIdentity`] is the logical identity of a source (canonical
//! URL + kind); an [`ArtifactVersion`] is one immutable retrieval of that
//! source. The governing invariant: `storage_ref` always resolves to bytes
//! whose SHA-256 equals `content_sha256`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::hashing::HashDigest;
use crate::core::identifiers::ArtifactIdentityKind;
use crate::core::identifiers::ArtifactVersionKind;
use crate::core::identifiers::CaseKind;
use crate::core::identifiers::Uid;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Artifact Identity
// ============================================================================

/// Kind of artifact identity, distinguishing retrieval/parse behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// A web page or other HTTP-retrievable document.
    WebPage,
    /// A PDF document.
    Pdf,
    /// A DOCX document.
    Docx,
    /// An uploaded file with no canonical URL.
    Upload,
    /// An image, video, or audio media artifact.
    Media,
}

/// The logical identity of a source: a canonical URL plus its kind.
///
/// # Invariants
/// - `(case_uid, canonical_url)` is unique within a case for cross-case
///   deduplication queries keyed by `canonical_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactIdentity {
    /// Artifact identity uid.
    pub uid: Uid<ArtifactIdentityKind>,
    /// Owning case.
    pub case_uid: Uid<CaseKind>,
    /// Canonical URL for this source, if it has one.
    pub canonical_url: Option<String>,
    /// Artifact kind.
    pub kind: ArtifactKind,
    /// Creation timestamp.
    pub created_at: Timestamp,
}

// ============================================================================
// SECTION: Source Metadata
// ============================================================================

/// Retrieval metadata for one [`ArtifactVersion`].
///
/// # Invariants
/// - `parse_error` is set only when the parser fell back to plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SourceMeta {
    /// HTTP status code of the retrieval, if fetched over HTTP.
    pub http_status: Option<u16>,
    /// HTTP ETag of the retrieval, if present.
    pub etag: Option<String>,
    /// Set when the configured parser failed and ingestion fell back to
    /// a plaintext rendering instead of aborting.
    pub parse_error: Option<String>,
}

// ============================================================================
// SECTION: Artifact Version
// ============================================================================

/// One immutable retrieval of an [`ArtifactIdentity`].
///
/// # Invariants
/// - Immutable once created.
/// - SHA-256 of the bytes at `storage_ref` equals `content_sha256`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactVersion {
    /// Artifact version uid.
    pub uid: Uid<ArtifactVersionKind>,
    /// Owning case (versions are owned by their case for retention).
    pub case_uid: Uid<CaseKind>,
    /// Parent artifact identity, shared across cases for dedup queries.
    pub artifact_identity_uid: Uid<ArtifactIdentityKind>,
    /// Content hash of the retrieved bytes.
    pub content_sha256: HashDigest,
    /// Opaque storage reference resolving to the retrieved bytes.
    pub storage_ref: String,
    /// MIME type of the retrieved content.
    pub mime_type: String,
    /// Retrieval timestamp.
    pub retrieved_at: Timestamp,
    /// Retrieval/parse metadata.
    pub source_meta: SourceMeta,
    /// Creation timestamp (equal to `retrieved_at` at insert time).
    pub created_at: Timestamp,
}

impl ArtifactVersion {
    /// Returns the content-addressed storage key: `"<sha256[:2]>/<sha256>"`.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("{}/{}", self.content_sha256.prefix(2), self.content_sha256.value)
    }
}
