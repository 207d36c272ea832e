//! Invoice lifecycle
//!
//! Invoice CRUD on top of the relational store. Attachment uploads and blob
//! cleanup are delegated to [`AttachmentService`].

use crate::blob_store::BlobStore;
use crate::error::AppError;
use crate::services::attachments::{AttachmentService, CleanupReport};
use crate::store::{
    Attachment, CreateInvoiceRequest, Invoice, InvoiceDb, InvoiceId, InvoiceWithAttachments,
    UpdateInvoiceRequest,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Attach to each invoice the attachments whose `invoice_id` matches it
///
/// Invoice order is preserved; invoices without attachments get an empty list.
pub fn group_attachments(
    invoices: Vec<Invoice>,
    attachments: Vec<Attachment>,
) -> Vec<InvoiceWithAttachments> {
    let mut by_invoice: HashMap<InvoiceId, Vec<Attachment>> = HashMap::new();
    for attachment in attachments {
        by_invoice
            .entry(attachment.invoice_id)
            .or_default()
            .push(attachment);
    }

    invoices
        .into_iter()
        .map(|invoice| {
            let attachments = by_invoice.remove(&invoice.id).unwrap_or_default();
            InvoiceWithAttachments {
                invoice,
                attachments,
            }
        })
        .collect()
}

/// Invoice lifecycle manager
#[derive(Clone)]
pub struct InvoiceService {
    db: Arc<InvoiceDb>,
    attachments: AttachmentService,
}

impl InvoiceService {
    /// Create a manager over the given stores
    pub fn new(db: Arc<InvoiceDb>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            attachments: AttachmentService::new(db.clone(), blobs),
            db,
        }
    }

    /// All invoices, newest date first, each with its attachments
    pub async fn list(&self) -> Result<Vec<InvoiceWithAttachments>, AppError> {
        let invoices = self.db.list_invoices().await?;
        let attachments = self.db.list_attachments().await?;
        Ok(group_attachments(invoices, attachments))
    }

    /// Create an invoice from a request body
    ///
    /// # Errors
    /// * `AppError::Validation` if a required field is missing
    pub async fn create(
        &self,
        request: CreateInvoiceRequest,
    ) -> Result<InvoiceWithAttachments, AppError> {
        let new_invoice = request.validate()?;
        let invoice = self.db.insert_invoice(&new_invoice).await?;

        info!(invoice_id = invoice.id, provider = %invoice.provider, "Invoice created");

        Ok(InvoiceWithAttachments {
            invoice,
            attachments: Vec::new(),
        })
    }

    /// Change the status of an invoice and optionally attach a file
    ///
    /// The attachment is stored before the status changes; if the upload
    /// fails the status is left as it was.
    ///
    /// # Errors
    /// * `AppError::InvoiceNotFound` if no invoice has this ID
    /// * `AppError::Validation` for an incomplete attachment payload
    /// * `AppError::RemoteStore` if the attachment upload failed
    pub async fn update(
        &self,
        id: InvoiceId,
        request: UpdateInvoiceRequest,
    ) -> Result<InvoiceWithAttachments, AppError> {
        if let Some(upload) = &request.new_attachment {
            AttachmentService::validate_upload(upload)?;
        }

        self.db
            .get_invoice(id)
            .await?
            .ok_or(AppError::InvoiceNotFound(id))?;

        if let Some(upload) = &request.new_attachment {
            self.attachments.add(id, upload).await?;
        }

        if let Some(status) = &request.status {
            let updated = self.db.update_invoice_status(id, status).await?;
            if updated == 0 {
                return Err(AppError::InvoiceNotFound(id));
            }
        }

        let invoice = self
            .db
            .get_invoice(id)
            .await?
            .ok_or(AppError::InvoiceNotFound(id))?;
        let attachments = self.db.attachments_for_invoice(id).await?;

        info!(
            invoice_id = id,
            status = %invoice.status,
            attachment_count = attachments.len(),
            "Invoice updated"
        );

        Ok(InvoiceWithAttachments {
            invoice,
            attachments,
        })
    }

    /// Delete an invoice and, best-effort, the blobs of its attachments
    ///
    /// Attachment rows go with the invoice row through the cascade. Blob
    /// failures are logged and returned in the report, never raised.
    pub async fn delete(&self, id: InvoiceId) -> Result<CleanupReport, AppError> {
        let report = self.attachments.cleanup_invoice_blobs(id).await?;
        let deleted = self.db.delete_invoice(id).await?;

        if report.failed > 0 {
            warn!(
                invoice_id = id,
                attempted = report.attempted,
                failed = report.failed,
                "Invoice deleted with orphaned attachment blobs"
            );
        } else {
            info!(
                invoice_id = id,
                rows = deleted,
                blobs_removed = report.attempted,
                "Invoice deleted"
            );
        }

        Ok(report)
    }
}
