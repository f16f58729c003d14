//! Integration tests for the lease abstraction server

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use kaiva_document::testing::build_pdf;
use kaiva_llm::{LlmError, MockProvider};
use kaiva_server::{
    build_app, build_state,
    config::ServerConfig,
    handlers::{create_router, ErrorResponse, HealthCheckResponse, UploadResponse},
};
use kaiva_store::XLSX_CONTENT_TYPE;
use std::path::Path;
use tempfile::TempDir;
use tower::ServiceExt; // for oneshot

const BOUNDARY: &str = "kaiva-test-boundary";

const LEASE_TEXT: &str = "Lease between Acme Corp and Harbor Properties LLC";

/// Helper to create a test router backed by `provider`
fn create_test_app(dir: &TempDir, provider: MockProvider) -> Router {
    let state = build_state(provider, &test_config(dir)).unwrap();
    create_router(state)
}

fn test_config(dir: &TempDir) -> ServerConfig {
    let mut config = ServerConfig::default_test_config();
    config.artifact_dir = dir.path().to_path_buf();
    config
}

fn multipart_body(field: &str, filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
         Content-Type: application/pdf\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(field: &str, bytes: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(field, "lease.pdf", bytes)))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

fn artifact_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[tokio::test]
async fn test_health_check_endpoint() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir, MockProvider::new("{}"));

    let response = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let health: HealthCheckResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(health.status, "healthy");
}

#[tokio::test]
async fn test_upload_then_download() {
    let dir = TempDir::new().unwrap();
    let provider = MockProvider::new(
        "{'Tenant Legal Name': 'Acme Corp', 'Landlord Legal Name': 'Harbor Properties LLC'}",
    );
    let app = create_test_app(&dir, provider.clone());

    let pdf = build_pdf(&[LEASE_TEXT]);
    let response = app.clone().oneshot(upload_request("file", &pdf)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let upload: UploadResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(upload.download_url.starts_with("/download/abstract_"));
    assert!(upload.download_url.ends_with(".xlsx"));

    // The model saw the document text exactly once
    assert_eq!(provider.call_count(), 1);
    let (_, user) = provider.last_request().unwrap();
    assert!(user.contains("Acme Corp"));

    let response = app.oneshot(get_request(&upload.download_url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        XLSX_CONTENT_TYPE
    );
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment"));

    let bytes = body_bytes(response).await;
    assert_eq!(&bytes[..2], b"PK");
}

#[tokio::test]
async fn test_fenced_json_reply_is_accepted() {
    let dir = TempDir::new().unwrap();
    let provider = MockProvider::new("```json\n{\"Tenant Legal Name\": \"Acme Corp\"}\n```");
    let app = create_test_app(&dir, provider);

    let response = app
        .oneshot(upload_request("file", &build_pdf(&[LEASE_TEXT])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(artifact_count(dir.path()), 1);
}

#[tokio::test]
async fn test_model_failure_returns_bad_gateway() {
    let dir = TempDir::new().unwrap();
    let provider = MockProvider::failing(LlmError::Authentication("invalid key".to_string()));
    let app = create_test_app(&dir, provider);

    let response = app
        .oneshot(upload_request("file", &build_pdf(&[LEASE_TEXT])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let error: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(error.error.contains("invalid key"));
    assert_eq!(error.kind.as_deref(), Some("ModelError"));
    assert_eq!(artifact_count(dir.path()), 0);
}

#[tokio::test]
async fn test_prose_reply_returns_unprocessable() {
    let dir = TempDir::new().unwrap();
    let provider = MockProvider::new("I'm sorry, I cannot read this lease.");
    let app = create_test_app(&dir, provider);

    let response = app
        .oneshot(upload_request("file", &build_pdf(&[LEASE_TEXT])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let error: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(!error.error.is_empty());
    assert_eq!(error.kind.as_deref(), Some("UnparseableReply"));
    assert_eq!(artifact_count(dir.path()), 0);
}

#[tokio::test]
async fn test_list_reply_returns_unprocessable() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir, MockProvider::new("['Acme Corp', 'Harbor']"));

    let response = app
        .oneshot(upload_request("file", &build_pdf(&[LEASE_TEXT])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_missing_file_field() {
    let dir = TempDir::new().unwrap();
    let provider = MockProvider::new("{}");
    let app = create_test_app(&dir, provider.clone());

    let response = app
        .oneshot(upload_request("attachment", &build_pdf(&[LEASE_TEXT])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_non_pdf_upload_is_rejected_before_model_call() {
    let dir = TempDir::new().unwrap();
    let provider = MockProvider::new("{}");
    let app = create_test_app(&dir, provider.clone());

    let response = app
        .oneshot(upload_request("file", b"this is not a pdf"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(error.error.contains("PDF"));
    assert_eq!(error.kind.as_deref(), Some("UpstreamInputError"));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_pdf_without_text_is_rejected() {
    let dir = TempDir::new().unwrap();
    let provider = MockProvider::new("{}");
    let app = create_test_app(&dir, provider.clone());

    let response = app
        .oneshot(upload_request("file", &build_pdf(&[""])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir);
    config.max_upload_bytes = 512;
    let state = build_state(MockProvider::new("{}"), &config).unwrap();
    let app = create_router(state);

    let response = app
        .oneshot(upload_request("file", &vec![b'x'; 4096]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_download_rejects_traversal() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir, MockProvider::new("{}"));

    for uri in ["/download/..%2Fsecret.xlsx", "/download/report.csv"] {
        let response = app.clone().oneshot(get_request(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
    }
}

#[tokio::test]
async fn test_download_unknown_file() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir, MockProvider::new("{}"));

    let response = app
        .oneshot(get_request("/download/abstract_deadbeef.xlsx"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let error: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(error.error.contains("abstract_deadbeef.xlsx"));
    assert!(error.kind.is_none());
}

#[tokio::test]
async fn test_concurrent_uploads_get_distinct_artifacts() {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(&dir, MockProvider::new("{'Tenant Legal Name': 'Acme Corp'}"));
    let pdf = build_pdf(&[LEASE_TEXT]);

    let (a, b) = tokio::join!(
        app.clone().oneshot(upload_request("file", &pdf)),
        app.clone().oneshot(upload_request("file", &pdf)),
    );
    let a: UploadResponse = serde_json::from_slice(&body_bytes(a.unwrap()).await).unwrap();
    let b: UploadResponse = serde_json::from_slice(&body_bytes(b.unwrap()).await).unwrap();

    assert_ne!(a.download_url, b.download_url);
    assert_eq!(artifact_count(dir.path()), 2);
}

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let state = build_state(MockProvider::new("{}"), &config).unwrap();
    let app = build_app(state, &config);

    let preflight = |origin: &str| {
        Request::builder()
            .method("OPTIONS")
            .uri("/upload")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap()
    };

    let response = app
        .clone()
        .oneshot(preflight("http://localhost:3000"))
        .await
        .unwrap();
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "http://localhost:3000"
    );

    let response = app.oneshot(preflight("https://evil.example")).await.unwrap();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
