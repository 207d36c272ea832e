//! Blob store client
//!
//! Path-addressed storage for attachment bytes on a remote content API.
//! Every delete (and overwrite) must present the blob's current digest, so
//! callers fetch metadata first and pass the digest back.

pub mod error;
pub mod github;
pub mod memory;

use crate::config::BlobStoreConfig;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

pub use error::BlobStoreError;
pub use github::GithubBlobStore;
pub use memory::MemoryBlobStore;

/// Current state of a stored blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobMetadata {
    /// Path of the blob inside the repository
    pub path: String,
    /// Opaque version token required to delete or overwrite the blob
    #[serde(rename = "sha")]
    pub digest: String,
    /// Size of the blob in bytes, when the remote reports it
    #[serde(default)]
    pub size: Option<u64>,
}

/// Remote store for attachment bytes
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Target this store writes to
    fn config(&self) -> &BlobStoreConfig;

    /// Create the blob at `path`, or overwrite it when `previous_digest` is given
    async fn put_blob(
        &self,
        path: &str,
        content_base64: &str,
        message: &str,
        previous_digest: Option<&str>,
    ) -> Result<BlobMetadata, BlobStoreError>;

    /// Fetch the current metadata (and digest) of the blob at `path`
    async fn get_blob_metadata(&self, path: &str) -> Result<BlobMetadata, BlobStoreError>;

    /// Delete the blob at `path`, guarded by its current `digest`
    async fn delete_blob(&self, path: &str, digest: &str, message: &str)
        -> Result<(), BlobStoreError>;

    /// Unique path for a new upload of `file_name`
    fn upload_path(&self, file_name: &str) -> String {
        self.config().upload_path(file_name, Utc::now())
    }

    /// Public URL the blob at `path` is served from
    fn public_url(&self, path: &str) -> String {
        self.config().public_url(path)
    }
}
