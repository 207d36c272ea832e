//! In-memory blob store
//!
//! Mirrors the remote store's contract (404 for missing blobs, 409 for a stale
//! digest) and can be told to fail uploads, metadata reads or deletes.

use super::{BlobMetadata, BlobStore, BlobStoreError};
use crate::config::BlobStoreConfig;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct StoredBlob {
    content: String,
    digest: String,
}

/// Blob store that keeps everything in process memory
pub struct MemoryBlobStore {
    config: BlobStoreConfig,
    blobs: RwLock<HashMap<String, StoredBlob>>,
    fail_uploads: AtomicBool,
    fail_metadata: AtomicBool,
    fail_deletes: AtomicBool,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new(BlobStoreConfig {
            repository: "local/blobs".to_string(),
            ..Default::default()
        })
    }
}

impl MemoryBlobStore {
    /// Create an empty store that derives paths and URLs from `config`
    pub fn new(config: BlobStoreConfig) -> Self {
        Self {
            config,
            blobs: RwLock::new(HashMap::new()),
            fail_uploads: AtomicBool::new(false),
            fail_metadata: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }

    /// Make every `put_blob` fail with a 503
    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Make every `get_blob_metadata` fail with a 503
    pub fn set_fail_metadata(&self, fail: bool) {
        self.fail_metadata.store(fail, Ordering::SeqCst);
    }

    /// Make every `delete_blob` fail with a 503
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Whether a blob exists at `path`
    pub async fn contains(&self, path: &str) -> bool {
        self.blobs.read().await.contains_key(path)
    }

    /// Stored base64 content at `path`
    pub async fn content(&self, path: &str) -> Option<String> {
        self.blobs
            .read()
            .await
            .get(path)
            .map(|blob| blob.content.clone())
    }

    /// Number of stored blobs
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    /// Whether the store holds no blobs
    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }

    /// Remove a blob behind the application's back
    pub async fn forget(&self, path: &str) -> bool {
        self.blobs.write().await.remove(path).is_some()
    }

    fn injected_failure(flag: &AtomicBool) -> Result<(), BlobStoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(BlobStoreError::Remote {
                status: 503,
                body: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn not_found(path: &str) -> BlobStoreError {
        BlobStoreError::Remote {
            status: 404,
            body: format!("no blob at {}", path),
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn config(&self) -> &BlobStoreConfig {
        &self.config
    }

    async fn put_blob(
        &self,
        path: &str,
        content_base64: &str,
        _message: &str,
        previous_digest: Option<&str>,
    ) -> Result<BlobMetadata, BlobStoreError> {
        Self::injected_failure(&self.fail_uploads)?;

        let mut blobs = self.blobs.write().await;
        let current = blobs.get(path).map(|blob| blob.digest.as_str());
        if current != previous_digest {
            return Err(BlobStoreError::Remote {
                status: 409,
                body: format!("digest mismatch for {}", path),
            });
        }

        let digest = Uuid::new_v4().simple().to_string();
        blobs.insert(
            path.to_string(),
            StoredBlob {
                content: content_base64.to_string(),
                digest: digest.clone(),
            },
        );

        Ok(BlobMetadata {
            path: path.to_string(),
            digest,
            size: Some(content_base64.len() as u64),
        })
    }

    async fn get_blob_metadata(&self, path: &str) -> Result<BlobMetadata, BlobStoreError> {
        Self::injected_failure(&self.fail_metadata)?;

        let blobs = self.blobs.read().await;
        let blob = blobs.get(path).ok_or_else(|| Self::not_found(path))?;
        Ok(BlobMetadata {
            path: path.to_string(),
            digest: blob.digest.clone(),
            size: Some(blob.content.len() as u64),
        })
    }

    async fn delete_blob(
        &self,
        path: &str,
        digest: &str,
        _message: &str,
    ) -> Result<(), BlobStoreError> {
        Self::injected_failure(&self.fail_deletes)?;

        let mut blobs = self.blobs.write().await;
        let blob = blobs.get(path).ok_or_else(|| Self::not_found(path))?;
        if blob.digest != digest {
            return Err(BlobStoreError::Remote {
                status: 409,
                body: format!("digest mismatch for {}", path),
            });
        }
        blobs.remove(path);
        Ok(())
    }
}
