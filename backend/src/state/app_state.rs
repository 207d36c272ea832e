// Application state shared by all request handlers
// Holds handles to the two stores; nothing mutable lives in-process

use crate::blob_store::BlobStore;
use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::services::{AttachmentService, InvoiceService};
use crate::store::InvoiceDb;
use std::sync::Arc;

/// Main application state
///
/// Cheap to clone; every clone points at the same stores.
#[derive(Clone)]
pub struct AppState {
    /// Relational store for invoice and attachment rows
    pub db: Arc<InvoiceDb>,
    /// Remote store for attachment bytes
    pub blobs: Arc<dyn BlobStore>,
    /// Body size limit for requests that carry an attachment
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Create state over the given stores
    pub fn new(db: Arc<InvoiceDb>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            db,
            blobs,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Override the body size limit for attachment uploads
    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    /// Invoice lifecycle manager bound to this state's stores
    pub fn invoices(&self) -> InvoiceService {
        InvoiceService::new(self.db.clone(), self.blobs.clone())
    }

    /// Attachment lifecycle manager bound to this state's stores
    pub fn attachments(&self) -> AttachmentService {
        AttachmentService::new(self.db.clone(), self.blobs.clone())
    }
}
