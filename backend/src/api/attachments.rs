//! Attachment API handlers

use crate::api::utils::parse_id;
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
};

/// DELETE /api/attachments/:id - Delete one attachment and its file
///
/// Answers 204 whether or not the attachment existed, and whether or not
/// its file could be removed from the blob store.
pub async fn delete_attachment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    state.attachments().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob_store::MemoryBlobStore;
    use crate::store::{AttachmentUpload, InvoiceDb, NewInvoice};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_delete_attachment_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(InvoiceDb::new(db_path.to_str().unwrap()).await.unwrap());
        let blobs = Arc::new(MemoryBlobStore::default());
        let state = AppState::new(db.clone(), blobs.clone());

        let invoice = db
            .insert_invoice(&NewInvoice {
                provider: "A".to_string(),
                service: "S".to_string(),
                amount: 1.0,
                status: "Outstanding".to_string(),
                date: "2024-01-01".to_string(),
            })
            .await
            .unwrap();
        let attachment = state
            .attachments()
            .add(
                invoice.id,
                &AttachmentUpload {
                    content: "aGk=".to_string(),
                    name: "doc.pdf".to_string(),
                    category: "receipt".to_string(),
                },
            )
            .await
            .unwrap();

        for _ in 0..2 {
            let status = delete_attachment(State(state.clone()), Path(attachment.id.to_string()))
                .await
                .unwrap();
            assert_eq!(status, StatusCode::NO_CONTENT);
        }
        assert!(blobs.is_empty().await);
        assert!(db.get_attachment(attachment.id).await.unwrap().is_none());
    }
}
