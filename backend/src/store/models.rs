//! Invoice data models
//!
//! Rows of the `invoices` and `attachments` tables, plus the request payloads
//! that create or change them.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Identifier of an invoice row
pub type InvoiceId = i64;

/// Identifier of an attachment row
pub type AttachmentId = i64;

/// A stored invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    /// Store-assigned identifier
    pub id: InvoiceId,
    /// Who issued the invoice
    pub provider: String,
    /// What the invoice is for
    pub service: String,
    /// Amount due
    pub amount: f64,
    /// Free-text status, e.g. "Outstanding" or "Paid"
    pub status: String,
    /// Invoice date as supplied by the caller
    pub date: String,
    /// Store-assigned creation timestamp
    pub created_at: String,
}

/// A file attached to an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Attachment {
    /// Store-assigned identifier
    pub id: AttachmentId,
    /// Owning invoice
    pub invoice_id: InvoiceId,
    /// Free-text document type, e.g. "receipt"
    pub category: String,
    /// Original name supplied by the uploader
    pub file_name: String,
    /// Blob path inside the repository
    pub file_path: String,
    /// Public URL the blob is served from
    pub file_url: String,
    /// Store-assigned creation timestamp
    pub created_at: String,
}

/// An invoice together with all of its attachments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceWithAttachments {
    /// The invoice row
    #[serde(flatten)]
    pub invoice: Invoice,
    /// Attachments owned by the invoice, empty when there are none
    pub attachments: Vec<Attachment>,
}

/// Validated values for a new invoice row
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct NewInvoice {
    pub provider: String,
    pub service: String,
    pub amount: f64,
    pub status: String,
    pub date: String,
}

/// Values for a new attachment row, written only after its blob exists
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct NewAttachment {
    pub invoice_id: InvoiceId,
    pub category: String,
    pub file_name: String,
    pub file_path: String,
    pub file_url: String,
}

/// Body of `POST /api/invoices`
///
/// Every field is optional here so that absent fields surface as a
/// validation error naming them, rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateInvoiceRequest {
    /// Who issued the invoice
    pub provider: Option<String>,
    /// What the invoice is for
    pub service: Option<String>,
    /// Amount due
    pub amount: Option<f64>,
    /// Initial status
    pub status: Option<String>,
    /// Invoice date
    pub date: Option<String>,
}

impl CreateInvoiceRequest {
    /// Check that every required field is present
    ///
    /// # Errors
    /// * `AppError::Validation` listing the missing fields
    pub fn validate(self) -> Result<NewInvoice, AppError> {
        fn present(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        let provider = present(self.provider);
        let service = present(self.service);
        let status = present(self.status);
        let date = present(self.date);
        let amount = self.amount;

        match (provider, service, amount, status, date) {
            (Some(provider), Some(service), Some(amount), Some(status), Some(date)) => {
                Ok(NewInvoice {
                    provider,
                    service,
                    amount,
                    status,
                    date,
                })
            }
            (provider, service, amount, status, date) => {
                let missing: Vec<&str> = [
                    ("provider", provider.is_none()),
                    ("service", service.is_none()),
                    ("amount", amount.is_none()),
                    ("status", status.is_none()),
                    ("date", date.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();
                Err(AppError::Validation(format!(
                    "Missing required fields: {}",
                    missing.join(", ")
                )))
            }
        }
    }
}

/// File payload carried by an invoice update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttachmentUpload {
    /// Base64-encoded file content
    pub content: String,
    /// Original file name
    pub name: String,
    /// Document type label
    pub category: String,
}

/// Body of `PUT /api/invoices/:id`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateInvoiceRequest {
    /// New status; the stored status is kept when absent
    pub status: Option<String>,
    /// File to attach before the status changes
    #[serde(rename = "newAttachment", alias = "new_attachment")]
    pub new_attachment: Option<AttachmentUpload>,
}
