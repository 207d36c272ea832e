//! Relational store
//!
//! Invoices and attachments in SQLite. Attachment rows reference their
//! invoice with `ON DELETE CASCADE`.

pub mod db;
pub mod models;
pub mod schema;

pub use db::InvoiceDb;
pub use models::{
    Attachment, AttachmentId, AttachmentUpload, CreateInvoiceRequest, Invoice, InvoiceId,
    InvoiceWithAttachments, NewAttachment, NewInvoice, UpdateInvoiceRequest,
};
