//! End-to-end tests for the invoice HTTP API
//!
//! These tests drive the full router and check:
//! 1. Invoice create / list / update / delete responses
//! 2. Attachment upload against a mocked GitHub contents API
//! 3. Best-effort blob cleanup when the remote cannot find the files
//! 4. Routing fallbacks and CORS preflight

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use invoice_tracker_backend::api;
use invoice_tracker_backend::blob_store::{BlobStore, GithubBlobStore, MemoryBlobStore};
use invoice_tracker_backend::config::{BlobStoreConfig, DEFAULT_MAX_UPLOAD_BYTES};
use invoice_tracker_backend::state::AppState;
use invoice_tracker_backend::store::InvoiceDb;
use mockito::{Matcher, Server};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const PUT_RESPONSE: &str = r#"{
    "content": {"name": "doc.pdf", "path": "uploads/1-doc.pdf", "sha": "abc123", "size": 9},
    "commit": {"sha": "c0ffee"}
}"#;

async fn build_app(blobs: Arc<dyn BlobStore>) -> (Router, TempDir) {
    build_app_with_limit(blobs, DEFAULT_MAX_UPLOAD_BYTES).await
}

async fn build_app_with_limit(
    blobs: Arc<dyn BlobStore>,
    max_upload_bytes: usize,
) -> (Router, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = InvoiceDb::new(db_path.to_str().unwrap())
        .await
        .expect("Failed to create test database");
    let state = AppState::new(Arc::new(db), blobs).with_max_upload_bytes(max_upload_bytes);
    let app = api::router(state);
    (app, temp_dir)
}

fn github_store(server: &Server) -> Arc<dyn BlobStore> {
    Arc::new(
        GithubBlobStore::new(BlobStoreConfig {
            api_base_url: server.url(),
            raw_base_url: "https://raw.example.test".to_string(),
            repository: "acme/invoices".to_string(),
            token: Some("test-token".to_string()),
            ..Default::default()
        })
        .unwrap(),
    )
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, String) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn parse(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("not JSON ({}): {}", e, body))
}

fn sample_invoice() -> Value {
    json!({
        "provider": "A",
        "service": "S",
        "amount": 100,
        "status": "Outstanding",
        "date": "2024-01-01"
    })
}

fn attachment_update(name: &str) -> Value {
    json!({
        "status": "Paid",
        "newAttachment": {"content": "UERGIGJ5dGVz", "name": name, "category": "receipt"}
    })
}

#[tokio::test]
async fn test_create_invoice_returns_201_with_empty_attachments() {
    let (app, _temp_dir) = build_app(Arc::new(MemoryBlobStore::default())).await;

    let (status, body) = send(&app, "POST", "/api/invoices", Some(sample_invoice())).await;

    assert_eq!(status, StatusCode::CREATED);
    let created = parse(&body);
    assert!(created["id"].as_i64().unwrap() > 0);
    assert_eq!(created["provider"], "A");
    assert_eq!(created["amount"], 100.0);
    assert_eq!(created["attachments"], json!([]));
}

#[tokio::test]
async fn test_create_invoice_missing_fields_is_400() {
    let (app, _temp_dir) = build_app(Arc::new(MemoryBlobStore::default())).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/invoices",
        Some(json!({"provider": "A", "status": "Outstanding"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = parse(&body)["error"].as_str().unwrap().to_string();
    assert_eq!(error, "Missing required fields: service, amount, date");
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let (app, _temp_dir) = build_app(Arc::new(MemoryBlobStore::default())).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/invoices")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_uploads_attachment_to_github() {
    let mut server = Server::new_async().await;
    let put_mock = server
        .mock(
            "PUT",
            Matcher::Regex(r"^/repos/acme/invoices/contents/uploads/\d+-doc\.pdf$".to_string()),
        )
        .match_header("authorization", "Bearer test-token")
        .match_body(Matcher::PartialJson(json!({
            "message": "Upload receipt for invoice 1",
            "content": "UERGIGJ5dGVz",
            "branch": "main"
        })))
        .with_status(201)
        .with_body(PUT_RESPONSE)
        .create_async()
        .await;

    let (app, _temp_dir) = build_app(github_store(&server)).await;
    send(&app, "POST", "/api/invoices", Some(sample_invoice())).await;

    let (status, body) = send(&app, "PUT", "/api/invoices/1", Some(attachment_update("doc.pdf"))).await;

    put_mock.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    let updated = parse(&body);
    assert_eq!(updated["status"], "Paid");
    let attachments = updated["attachments"].as_array().unwrap();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0]["file_name"], "doc.pdf");
    assert_eq!(attachments[0]["category"], "receipt");
    assert!(attachments[0]["file_url"]
        .as_str()
        .unwrap()
        .starts_with("https://raw.example.test/acme/invoices/main/uploads/"));
}

#[tokio::test]
async fn test_failed_upload_changes_nothing() {
    let mut server = Server::new_async().await;
    let _put_mock = server
        .mock("PUT", Matcher::Regex(r"^/repos/acme/invoices/contents/".to_string()))
        .with_status(500)
        .with_body(r#"{"message": "Server Error"}"#)
        .create_async()
        .await;

    let (app, _temp_dir) = build_app(github_store(&server)).await;
    send(&app, "POST", "/api/invoices", Some(sample_invoice())).await;

    let (status, body) = send(&app, "PUT", "/api/invoices/1", Some(attachment_update("doc.pdf"))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(parse(&body)["error"].as_str().unwrap().contains("500"));

    let (_, body) = send(&app, "GET", "/api/invoices", None).await;
    let listed = parse(&body);
    assert_eq!(listed[0]["status"], "Outstanding");
    assert_eq!(listed[0]["attachments"], json!([]));
}

#[tokio::test]
async fn test_delete_invoice_with_unreachable_blobs() {
    let mut server = Server::new_async().await;
    let put_mock = server
        .mock("PUT", Matcher::Regex(r"^/repos/acme/invoices/contents/uploads/".to_string()))
        .with_status(201)
        .with_body(PUT_RESPONSE)
        .expect(2)
        .create_async()
        .await;
    let get_mock = server
        .mock("GET", Matcher::Regex(r"^/repos/acme/invoices/contents/uploads/".to_string()))
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(r#"{"message": "Not Found"}"#)
        .expect(2)
        .create_async()
        .await;
    let delete_mock = server
        .mock("DELETE", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let (app, _temp_dir) = build_app(github_store(&server)).await;
    send(&app, "POST", "/api/invoices", Some(sample_invoice())).await;
    send(&app, "PUT", "/api/invoices/1", Some(attachment_update("a.pdf"))).await;
    send(&app, "PUT", "/api/invoices/1", Some(attachment_update("b.pdf"))).await;

    let (status, body) = send(&app, "DELETE", "/api/invoices/1", None).await;

    put_mock.assert_async().await;
    get_mock.assert_async().await;
    delete_mock.assert_async().await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    let (status, body) = send(&app, "GET", "/api/invoices", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), json!([]));
}

#[tokio::test]
async fn test_list_groups_attachments_per_invoice() {
    let blobs = Arc::new(MemoryBlobStore::default());
    let (app, _temp_dir) = build_app(blobs.clone()).await;
    send(&app, "POST", "/api/invoices", Some(sample_invoice())).await;
    let mut second = sample_invoice();
    second["date"] = json!("2024-06-01");
    send(&app, "POST", "/api/invoices", Some(second)).await;
    send(&app, "PUT", "/api/invoices/1", Some(attachment_update("a.pdf"))).await;
    send(&app, "PUT", "/api/invoices/1", Some(attachment_update("b.pdf"))).await;

    let (status, body) = send(&app, "GET", "/api/invoices", None).await;

    assert_eq!(status, StatusCode::OK);
    let listed = parse(&body);
    assert_eq!(listed[0]["id"], 2);
    assert_eq!(listed[0]["attachments"], json!([]));
    assert_eq!(listed[1]["id"], 1);
    assert_eq!(listed[1]["attachments"].as_array().unwrap().len(), 2);
    assert_eq!(blobs.len().await, 2);
}

fn large_attachment_update(encoded_len: usize) -> Value {
    // "AAAA" is valid base64 for three zero bytes.
    json!({
        "status": "Paid",
        "newAttachment": {
            "content": "A".repeat(encoded_len),
            "name": "scan.pdf",
            "category": "invoice"
        }
    })
}

#[tokio::test]
async fn test_attachment_above_two_megabytes_is_accepted() {
    let blobs = Arc::new(MemoryBlobStore::default());
    let (app, _temp_dir) = build_app(blobs.clone()).await;
    send(&app, "POST", "/api/invoices", Some(sample_invoice())).await;

    let (status, body) = send(&app, "PUT", "/api/invoices/1", Some(large_attachment_update(2_200_000))).await;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    let updated = parse(&body);
    assert_eq!(updated["status"], "Paid");
    assert_eq!(updated["attachments"].as_array().unwrap().len(), 1);
    assert_eq!(blobs.len().await, 1);
}

#[tokio::test]
async fn test_attachment_over_limit_is_413() {
    let blobs = Arc::new(MemoryBlobStore::default());
    let (app, _temp_dir) = build_app_with_limit(blobs.clone(), 64 * 1024).await;
    send(&app, "POST", "/api/invoices", Some(sample_invoice())).await;

    let (status, body) = send(&app, "PUT", "/api/invoices/1", Some(large_attachment_update(100_000))).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(parse(&body)["error"]
        .as_str()
        .unwrap()
        .starts_with("Request body too large"));
    assert!(blobs.is_empty().await);

    let (_, body) = send(&app, "GET", "/api/invoices", None).await;
    assert_eq!(parse(&body)[0]["status"], "Outstanding");
}

#[tokio::test]
async fn test_body_without_json_content_type_is_400() {
    let (app, _temp_dir) = build_app(Arc::new(MemoryBlobStore::default())).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/invoices")
        .header("content-type", "text/plain")
        .body(Body::from(sample_invoice().to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, "GET", "/api/invoices", None).await;
    assert_eq!(parse(&body), json!([]));
}

#[tokio::test]
async fn test_update_missing_invoice_is_404() {
    let blobs = Arc::new(MemoryBlobStore::default());
    let (app, _temp_dir) = build_app(blobs.clone()).await;

    let (status, body) = send(&app, "PUT", "/api/invoices/999", Some(attachment_update("doc.pdf"))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(parse(&body)["error"], "Invoice not found: 999");
    assert!(blobs.is_empty().await);
}

#[tokio::test]
async fn test_delete_missing_attachment_is_204() {
    let (app, _temp_dir) = build_app(Arc::new(MemoryBlobStore::default())).await;
    let (status, _) = send(&app, "DELETE", "/api/attachments/12345", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_delete_attachment_keeps_invoice() {
    let blobs = Arc::new(MemoryBlobStore::default());
    let (app, _temp_dir) = build_app(blobs.clone()).await;
    send(&app, "POST", "/api/invoices", Some(sample_invoice())).await;
    let (_, body) = send(&app, "PUT", "/api/invoices/1", Some(attachment_update("doc.pdf"))).await;
    let attachment_id = parse(&body)["attachments"][0]["id"].as_i64().unwrap();

    let (status, _) = send(&app, "DELETE", &format!("/api/attachments/{}", attachment_id), None).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(blobs.is_empty().await);
    let (_, body) = send(&app, "GET", "/api/invoices", None).await;
    let listed = parse(&body);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["attachments"], json!([]));
}

#[tokio::test]
async fn test_reseed_replaces_invoices() {
    let (app, _temp_dir) = build_app(Arc::new(MemoryBlobStore::default())).await;
    send(&app, "POST", "/api/invoices", Some(sample_invoice())).await;

    let (status, body) = send(&app, "POST", "/api/reseed", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), json!({"success": true}));

    let (_, body) = send(&app, "GET", "/api/invoices", None).await;
    let listed = parse(&body);
    assert_eq!(listed.as_array().unwrap().len(), 4);
    assert!(listed
        .as_array()
        .unwrap()
        .iter()
        .all(|invoice| invoice["provider"] != "A"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (app, _temp_dir) = build_app(Arc::new(MemoryBlobStore::default())).await;

    let (status, body) = send(&app, "GET", "/api/unknown", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Not Found");

    let (status, _) = send(&app, "DELETE", "/api/invoices/abc", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unsupported_method_is_405() {
    let (app, _temp_dir) = build_app(Arc::new(MemoryBlobStore::default())).await;

    let (status, body) = send(&app, "PATCH", "/api/invoices", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, "Method Not Allowed");

    let (status, _) = send(&app, "GET", "/api/attachments/1", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = send(&app, "GET", "/api/invoices/1", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_non_numeric_id_is_404_for_every_method() {
    let (app, _temp_dir) = build_app(Arc::new(MemoryBlobStore::default())).await;

    for (method, uri) in [
        ("GET", "/api/invoices/abc"),
        ("PATCH", "/api/invoices/1x"),
        ("POST", "/api/attachments/abc"),
    ] {
        let (status, body) = send(&app, method, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{} {}", method, uri);
        assert_eq!(body, "Not Found");
    }
}

#[tokio::test]
async fn test_cors_preflight_allows_everything() {
    let (app, _temp_dir) = build_app(Arc::new(MemoryBlobStore::default())).await;

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/invoices/1")
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "PUT")
        .header("access-control-request-headers", "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert!(headers.contains_key("access-control-allow-methods"));
    assert!(headers.contains_key("access-control-allow-headers"));
}
