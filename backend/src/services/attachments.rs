//! Attachment lifecycle
//!
//! Keeps attachment rows and their blobs together. Writes go blob first, so a
//! row always points at a blob that was stored. Removals always delete the
//! row; the blob is removed best-effort and failures are only logged.

use crate::blob_store::{BlobStore, BlobStoreError};
use crate::error::AppError;
use crate::store::{Attachment, AttachmentId, AttachmentUpload, InvoiceDb, InvoiceId, NewAttachment};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of deleting one attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentRemoval {
    /// No row with that ID existed
    Absent,
    /// The row was deleted; `blob_removed` tells whether the blob went too
    Removed {
        /// Whether the blob cleanup succeeded
        blob_removed: bool,
    },
}

/// Result of cleaning up the blobs of one invoice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Blob deletions attempted
    pub attempted: usize,
    /// Blob deletions that failed and left an orphaned blob
    pub failed: usize,
}

/// Attachment lifecycle manager
#[derive(Clone)]
pub struct AttachmentService {
    db: Arc<InvoiceDb>,
    blobs: Arc<dyn BlobStore>,
}

impl AttachmentService {
    /// Create a manager over the given stores
    pub fn new(db: Arc<InvoiceDb>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { db, blobs }
    }

    /// Check an upload payload before anything is written
    ///
    /// # Errors
    /// * `AppError::Validation` if a field is empty or the content is not base64
    pub fn validate_upload(upload: &AttachmentUpload) -> Result<(), AppError> {
        let missing: Vec<&str> = [
            ("content", upload.content.trim().is_empty()),
            ("name", upload.name.trim().is_empty()),
            ("category", upload.category.trim().is_empty()),
        ]
        .into_iter()
        .filter_map(|(field, empty)| empty.then_some(field))
        .collect();
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "Missing required attachment fields: {}",
                missing.join(", ")
            )));
        }

        let compact: String = upload
            .content
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        STANDARD.decode(compact.as_bytes()).map_err(|e| {
            AppError::Validation(format!("Attachment content is not valid base64: {}", e))
        })?;

        Ok(())
    }

    /// Upload a file and record it against `invoice_id`
    ///
    /// The row is inserted only after the upload succeeded. If the insert
    /// fails, the fresh blob is removed again best-effort.
    ///
    /// # Errors
    /// * `AppError::Validation` for an incomplete payload
    /// * `AppError::RemoteStore` if the upload was rejected (nothing is written)
    /// * `AppError::Database` if the row could not be inserted
    pub async fn add(
        &self,
        invoice_id: InvoiceId,
        upload: &AttachmentUpload,
    ) -> Result<Attachment, AppError> {
        Self::validate_upload(upload)?;

        let path = self.blobs.upload_path(&upload.name);
        let message = format!("Upload {} for invoice {}", upload.category, invoice_id);

        let stored = self
            .blobs
            .put_blob(&path, &upload.content, &message, None)
            .await?;
        let file_url = self.blobs.public_url(&path);

        debug!(invoice_id, path = %path, "Uploaded attachment blob");

        let new_attachment = NewAttachment {
            invoice_id,
            category: upload.category.clone(),
            file_name: upload.name.clone(),
            file_path: path.clone(),
            file_url,
        };

        match self.db.insert_attachment(&new_attachment).await {
            Ok(attachment) => {
                info!(
                    attachment_id = attachment.id,
                    invoice_id,
                    file_name = %attachment.file_name,
                    "Attachment added"
                );
                Ok(attachment)
            }
            Err(e) => {
                warn!(
                    invoice_id,
                    path = %path,
                    error = %e,
                    "Attachment row insert failed, removing uploaded blob"
                );
                let message = format!("Roll back upload for invoice {}", invoice_id);
                if let Err(cleanup) = self
                    .blobs
                    .delete_blob(&path, &stored.digest, &message)
                    .await
                {
                    warn!(path = %path, error = %cleanup, "Could not remove orphaned blob");
                }
                Err(e)
            }
        }
    }

    /// Delete one attachment by ID
    ///
    /// Deleting an ID that does not exist succeeds. The row is deleted even
    /// when the blob could not be removed.
    pub async fn delete(&self, attachment_id: AttachmentId) -> Result<AttachmentRemoval, AppError> {
        let Some(attachment) = self.db.get_attachment(attachment_id).await? else {
            debug!(attachment_id, "Attachment already absent");
            return Ok(AttachmentRemoval::Absent);
        };

        let message = format!("Delete attachment ID {}", attachment_id);
        let blob_removed = self.remove_blob_best_effort(&attachment, &message).await;

        self.db.delete_attachment(attachment_id).await?;

        info!(attachment_id, blob_removed, "Attachment deleted");
        Ok(AttachmentRemoval::Removed { blob_removed })
    }

    /// Try to delete the blob of every attachment of `invoice_id`
    ///
    /// Rows are left alone; they disappear with the invoice row through the
    /// foreign key cascade. Failures never stop the loop.
    pub async fn cleanup_invoice_blobs(
        &self,
        invoice_id: InvoiceId,
    ) -> Result<CleanupReport, AppError> {
        let attachments = self.db.attachments_for_invoice(invoice_id).await?;
        let message = format!("Delete attachment for invoice {}", invoice_id);

        let mut report = CleanupReport::default();
        for attachment in &attachments {
            report.attempted += 1;
            if !self.remove_blob_best_effort(attachment, &message).await {
                report.failed += 1;
            }
        }

        Ok(report)
    }

    async fn remove_blob_best_effort(&self, attachment: &Attachment, message: &str) -> bool {
        match self.remove_blob(&attachment.file_path, message).await {
            Ok(()) => true,
            Err(e) if e.is_not_found() => {
                info!(
                    attachment_id = attachment.id,
                    path = %attachment.file_path,
                    "Attachment blob already gone"
                );
                false
            }
            Err(e) => {
                warn!(
                    attachment_id = attachment.id,
                    invoice_id = attachment.invoice_id,
                    path = %attachment.file_path,
                    error = %e,
                    "Could not delete attachment blob, continuing"
                );
                false
            }
        }
    }

    async fn remove_blob(&self, path: &str, message: &str) -> Result<(), BlobStoreError> {
        let metadata = self.blobs.get_blob_metadata(path).await?;
        self.blobs
            .delete_blob(path, &metadata.digest, message)
            .await
    }
}
