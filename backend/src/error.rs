//! Error types and error handling for the application
//!
//! This module defines custom error types that can be converted to HTTP responses.
//! All errors implement `IntoResponse` to provide consistent error formatting.

use crate::blob_store::BlobStoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error types
///
/// All errors that can occur while serving a request are represented by this enum.
/// Each variant implements automatic conversion to HTTP responses via `IntoResponse`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request body is missing required data or is malformed
    #[error("{0}")]
    Validation(String),

    /// Request body exceeds the configured size limit
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Invoice with the given ID does not exist
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(i64),

    /// No route matches the request path
    #[error("Not Found")]
    RouteNotFound,

    /// The route exists but does not accept the request method
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    /// The remote blob store rejected or failed a request
    #[error("Blob store error: {0}")]
    RemoteStore(#[from] BlobStoreError),

    /// The relational store failed a statement
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error (catch-all for unexpected errors)
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status this error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::InvoiceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::RouteNotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::RemoteStore(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = self.to_string();

        match self {
            // Routing failures answer with a bare text body.
            AppError::RouteNotFound | AppError::MethodNotAllowed => {
                (status, error_message).into_response()
            }
            _ => {
                if status.is_server_error() {
                    tracing::error!(error = %error_message, "Request failed");
                }
                (status, Json(json!({ "error": error_message }))).into_response()
            }
        }
    }
}
