//! Service layer for business logic
//!
//! This module contains the invoice and attachment lifecycle managers,
//! separated from HTTP handlers so the consistency rules between the
//! relational store and the blob store can be tested on their own.

pub mod attachments;
pub mod invoices;

pub use attachments::{AttachmentRemoval, AttachmentService, CleanupReport};
pub use invoices::{group_attachments, InvoiceService};
