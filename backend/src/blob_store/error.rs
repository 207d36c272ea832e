//! Blob store error types
//!
//! Errors that can occur while talking to the remote content API.

use thiserror::Error;

/// Errors returned by a [`BlobStore`](super::BlobStore)
#[derive(Error, Debug)]
pub enum BlobStoreError {
    /// The remote answered with a non-2xx status
    #[error("remote store returned {status}: {body}")]
    Remote {
        /// HTTP status code
        status: u16,
        /// Response body as returned by the remote
        body: String,
    },

    /// The request never produced a response (DNS, TLS, connection reset)
    #[error("request to remote store failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote answered 2xx but the body could not be understood
    #[error("unexpected response from remote store: {0}")]
    InvalidResponse(String),

    /// Required settings (credential, repository) are missing
    #[error("remote store is not configured: {0}")]
    NotConfigured(String),
}

impl BlobStoreError {
    /// HTTP status of a remote rejection, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            BlobStoreError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the remote reported the blob as missing
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
