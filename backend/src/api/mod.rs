//! API module
//!
//! Contains the router and the HTTP request handlers for invoice endpoints

pub mod admin;
pub mod attachments;
pub mod invoices;
pub mod utils;

use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;

/// Build the application router
///
/// Unknown paths answer 404, known paths with an unsupported method 405.
/// A non-numeric id makes the path unknown whatever the method. CORS
/// preflight requests are answered by the permissive CORS layer before they
/// reach routing. Invoice updates carry base64 attachments, so their body
/// limit comes from `AppState::max_upload_bytes` instead of axum's default.
pub fn router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route(
            "/api/health",
            get(admin::health_check).fallback(utils::method_not_allowed),
        )
        .route(
            "/api/invoices",
            get(invoices::list_invoices)
                .post(invoices::create_invoice)
                .fallback(utils::method_not_allowed),
        )
        .route(
            "/api/invoices/:id",
            put(invoices::update_invoice)
                .delete(invoices::delete_invoice)
                .fallback(utils::id_method_not_allowed)
                .layer(upload_limit),
        )
        .route(
            "/api/attachments/:id",
            delete(attachments::delete_attachment).fallback(utils::id_method_not_allowed),
        )
        .route(
            "/api/reseed",
            post(admin::reseed).fallback(utils::method_not_allowed),
        )
        .fallback(utils::route_not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
