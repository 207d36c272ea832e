//! Invoice API handlers
//!
//! Contains HTTP request handlers for invoice CRUD operations.

use crate::api::utils::{invalid_body, parse_id};
use crate::error::AppError;
use crate::state::AppState;
use crate::store::{CreateInvoiceRequest, InvoiceWithAttachments, UpdateInvoiceRequest};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};

/// GET /api/invoices - List all invoices with their attachments
pub async fn list_invoices(
    State(state): State<AppState>,
) -> Result<Json<Vec<InvoiceWithAttachments>>, AppError> {
    let invoices = state.invoices().list().await?;
    Ok(Json(invoices))
}

/// POST /api/invoices - Create a new invoice
pub async fn create_invoice(
    State(state): State<AppState>,
    payload: Result<Json<CreateInvoiceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<InvoiceWithAttachments>), AppError> {
    let Json(request) = payload.map_err(invalid_body)?;
    let invoice = state.invoices().create(request).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// PUT /api/invoices/:id - Update status and optionally add an attachment
pub async fn update_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateInvoiceRequest>, JsonRejection>,
) -> Result<Json<InvoiceWithAttachments>, AppError> {
    let id = parse_id(&id)?;
    let Json(request) = payload.map_err(invalid_body)?;
    let invoice = state.invoices().update(id, request).await?;
    Ok(Json(invoice))
}

/// DELETE /api/invoices/:id - Delete an invoice and its attachments
pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    state.invoices().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob_store::MemoryBlobStore;
    use crate::store::{AttachmentUpload, InvoiceDb};
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn create_test_state() -> (AppState, Arc<MemoryBlobStore>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = InvoiceDb::new(db_path.to_str().unwrap())
            .await
            .expect("Failed to create test database");
        let blobs = Arc::new(MemoryBlobStore::default());
        let state = AppState::new(Arc::new(db), blobs.clone());
        (state, blobs, temp_dir)
    }

    fn sample_request() -> CreateInvoiceRequest {
        CreateInvoiceRequest {
            provider: Some("A".to_string()),
            service: Some("S".to_string()),
            amount: Some(100.0),
            status: Some("Outstanding".to_string()),
            date: Some("2024-01-01".to_string()),
        }
    }

    #[tokio::test]
    async fn test_list_invoices_empty() {
        let (state, _, _temp_dir) = create_test_state().await;
        let result = list_invoices(State(state)).await;
        assert!(result.is_ok());
        assert!(result.unwrap().0.is_empty());
    }

    #[tokio::test]
    async fn test_create_invoice() {
        let (state, _, _temp_dir) = create_test_state().await;
        let result = create_invoice(State(state.clone()), Ok(Json(sample_request()))).await;
        assert!(result.is_ok(), "Invoice creation should succeed");
        let (status, Json(created)) = result.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.invoice.provider, "A");
        assert!(created.attachments.is_empty());

        let listed = list_invoices(State(state)).await.unwrap().0;
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_create_invoice_missing_fields() {
        let (state, _, _temp_dir) = create_test_state().await;
        let result = create_invoice(State(state), Ok(Json(CreateInvoiceRequest::default()))).await;
        match result.unwrap_err() {
            AppError::Validation(message) => {
                assert!(message.starts_with("Missing required fields"));
            }
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_invoice_not_found() {
        let (state, blobs, _temp_dir) = create_test_state().await;
        let request = UpdateInvoiceRequest {
            status: Some("Paid".to_string()),
            new_attachment: Some(AttachmentUpload {
                content: "aGk=".to_string(),
                name: "doc.pdf".to_string(),
                category: "receipt".to_string(),
            }),
        };
        let result = update_invoice(State(state), Path("999".to_string()), Ok(Json(request))).await;
        assert!(matches!(result, Err(AppError::InvoiceNotFound(999))));
        assert!(blobs.is_empty().await);
    }

    #[tokio::test]
    async fn test_update_invoice_non_numeric_id() {
        let (state, _, _temp_dir) = create_test_state().await;
        let result = update_invoice(
            State(state),
            Path("abc".to_string()),
            Ok(Json(UpdateInvoiceRequest::default())),
        )
        .await;
        assert!(matches!(result, Err(AppError::RouteNotFound)));
    }

    #[tokio::test]
    async fn test_delete_invoice_returns_no_content() {
        let (state, _, _temp_dir) = create_test_state().await;
        let (_, Json(created)) = create_invoice(State(state.clone()), Ok(Json(sample_request())))
            .await
            .unwrap();

        let status = delete_invoice(State(state.clone()), Path(created.invoice.id.to_string()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        // Deleting again is still a success.
        let status = delete_invoice(State(state), Path(created.invoice.id.to_string()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}
