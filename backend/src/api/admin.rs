//! Maintenance endpoints
//!
//! Health probe and the destructive reseed operation.

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, response::Json};
use serde::Serialize;
use serde_json::{json, Value};

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Always "healthy" when the server answers
    pub status: String,
    /// Crate version
    pub version: String,
    /// Human-readable message
    pub message: String,
}

/// GET /api/health - Liveness probe
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        message: "Invoice backend is healthy".to_string(),
    })
}

/// POST /api/reseed - Drop and recreate the schema, then load sample rows
///
/// Stored blobs are not touched.
pub async fn reseed(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    state.db.reseed().await?;
    tracing::warn!("Database was reseeded; all previous invoices were removed");
    Ok(Json(json!({ "success": true })))
}
