// crates/evidex-store-sqlite/src/object_store.rs
// ============================================================================
// Module: Filesystem Artifact Store
// Description: Content-addressed artifact byte storage on the local filesystem.
// Purpose: Implement evidex-core's ArtifactStore trait using an
//          `artifacts/<sha256[:4]>/<sha256>` key layout.
// Dependencies: evidex-core, tokio
// ============================================================================

//! ## Overview
//! [`FsArtifactStore`] persists artifact bytes under a root directory,
//! sharded by the first four hex characters of the content digest
//! (`artifacts/<sha256[:4]>/<sha256>`). A production deployment would
//! point `root` at a mounted
//! object-store gateway; the sharded, content-addressed key scheme is
//! identical either way, so swapping backends later is a matter of
//! implementing [`evidex_core::interfaces::ArtifactStore`] again, not
//! changing any caller.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use async_trait::async_trait;
use evidex_core::core::HashDigest;
use evidex_core::interfaces::ArtifactStore;
use evidex_core::interfaces::ArtifactStoreError;

// ============================================================================
// SECTION: Filesystem Artifact Store
// ============================================================================

/// A local-filesystem-backed [`ArtifactStore`], sharded by digest prefix.
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Builds a store rooted at `root`. The directory is created lazily on
    /// first write, not at construction time.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn key_for(digest: &HashDigest) -> String {
        let hex = &digest.value;
        let shard = hex.get(..4).unwrap_or(hex);
        format!("artifacts/{shard}/{hex}")
    }

    fn path_for(&self, storage_key: &str) -> PathBuf {
        self.root.join(storage_key)
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put(&self, digest: &HashDigest, bytes: &[u8]) -> Result<String, ArtifactStoreError> {
        let key = Self::key_for(digest);
        let path = self.path_for(&key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|err| ArtifactStoreError::Io(err.to_string()))?;
        }
        tokio::fs::write(&path, bytes).await.map_err(|err| ArtifactStoreError::Io(err.to_string()))?;
        Ok(key)
    }

    async fn get(&self, storage_key: &str) -> Result<Vec<u8>, ArtifactStoreError> {
        let path = self.path_for(storage_key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(ArtifactStoreError::NotFound(storage_key.to_string()))
            }
            Err(err) => Err(ArtifactStoreError::Io(err.to_string())),
        }
    }

    async fn exists(&self, storage_key: &str) -> Result<bool, ArtifactStoreError> {
        match tokio::fs::metadata(self.path_for(storage_key)).await {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(ArtifactStoreError::Io(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use evidex_core::core::hashing::sha256_of;

    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips_bytes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsArtifactStore::new(dir.path());
        let digest = sha256_of(b"hello evidex");

        let key = store.put(&digest, b"hello evidex").await.expect("put");
        assert!(key.starts_with("artifacts/"));
        assert!(key.contains(&digest.value));

        let bytes = store.get(&key).await.expect("get");
        assert_eq!(bytes, b"hello evidex");
    }

    #[tokio::test]
    async fn get_missing_key_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsArtifactStore::new(dir.path());
        let err = store.get("artifacts/dead/deadbeef").await.unwrap_err();
        assert!(matches!(err, ArtifactStoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn exists_reflects_prior_put() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsArtifactStore::new(dir.path());
        let digest = sha256_of(b"payload");

        assert!(!store.exists(&FsArtifactStore::key_for(&digest)).await.expect("exists"));
        let key = store.put(&digest, b"payload").await.expect("put");
        assert!(store.exists(&key).await.expect("exists"));
    }

    #[tokio::test]
    async fn key_is_sharded_by_digest_prefix() {
        let digest = sha256_of(b"shard me");
        let key = FsArtifactStore::key_for(&digest);
        let shard = &digest.value[..4];
        assert_eq!(key, format!("artifacts/{shard}/{}", digest.value));
    }
}
