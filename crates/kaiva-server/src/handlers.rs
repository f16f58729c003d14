//! HTTP request handlers for the abstraction service.
//!
//! Implements upload, download and health endpoints using axum.

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use kaiva_document::{DocumentError, PdfTextExtractor};
use kaiva_domain::traits::{LlmProvider, TableExporter, TextExtractor};
use kaiva_extractor::{Extractor, ExtractorError, FailureKind};
use kaiva_store::{StoreError, XlsxExporter, XLSX_CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Multipart field carrying the uploaded document
pub const FILE_FIELD: &str = "file";

/// Shared application state
pub struct AppState<L>
where
    L: LlmProvider,
{
    /// Field extraction pipeline
    pub extractor: Arc<Extractor<L>>,
    /// PDF reader
    pub documents: PdfTextExtractor,
    /// Spreadsheet writer and artifact lookup
    pub exporter: XlsxExporter,
    /// Largest accepted request body in bytes
    pub max_upload_bytes: usize,
}

impl<L> Clone for AppState<L>
where
    L: LlmProvider,
{
    fn clone(&self) -> Self {
        Self {
            extractor: Arc::clone(&self.extractor),
            documents: self.documents,
            exporter: self.exporter.clone(),
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

/// Successful upload response
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Relative URL of the generated spreadsheet
    pub download_url: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Always "healthy" while the process serves requests
    pub status: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Pipeline failure tag, for failures inside the abstraction flow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Request did not carry a usable file
    BadRequest(String),
    /// Multipart body rejected by axum (malformed or over the size limit)
    Multipart(MultipartError),
    /// Uploaded bytes are not a readable document
    Document(DocumentError),
    /// Extraction pipeline failure
    Extraction(ExtractorError),
    /// Artifact storage failure
    Store(StoreError),
    /// Internal server error
    InternalError(String),
}

impl AppError {
    /// Failure tag for errors raised by the abstraction pipeline
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            AppError::Document(_) => Some(FailureKind::UpstreamInputError),
            AppError::Extraction(e) => Some(e.kind()),
            _ => None,
        }
    }

    fn status(&self) -> StatusCode {
        if let Some(kind) = self.kind() {
            return match kind {
                FailureKind::UpstreamInputError => StatusCode::BAD_REQUEST,
                FailureKind::ModelError => StatusCode::BAD_GATEWAY,
                FailureKind::UnparseableReply => StatusCode::UNPROCESSABLE_ENTITY,
            };
        }

        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Multipart(e) => e.status(),
            AppError::Store(StoreError::InvalidName(_)) => StatusCode::BAD_REQUEST,
            AppError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Store(_)
            | AppError::InternalError(_)
            | AppError::Document(_)
            | AppError::Extraction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind().map(|k| k.to_string());
        let message = match self {
            AppError::BadRequest(msg) | AppError::InternalError(msg) => msg,
            AppError::Multipart(e) => e.body_text(),
            AppError::Document(e) => e.to_string(),
            AppError::Extraction(e) => e.to_string(),
            AppError::Store(e) => e.to_string(),
        };

        let tag = kind.as_deref().unwrap_or("-");
        if status.is_server_error() {
            error!(status = status.as_u16(), kind = tag, "Request failed: {}", message);
        } else {
            warn!(status = status.as_u16(), kind = tag, "Request rejected: {}", message);
        }

        let body = Json(ErrorResponse {
            error: message,
            kind,
        });
        (status, body).into_response()
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::Multipart(e)
    }
}

impl From<DocumentError> for AppError {
    fn from(e: DocumentError) -> Self {
        AppError::Document(e)
    }
}

impl From<ExtractorError> for AppError {
    fn from(e: ExtractorError) -> Self {
        AppError::Extraction(e)
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Store(e)
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::InternalError(format!("Background task failed: {}", e))
    }
}

/// POST /upload - Abstract an uploaded lease PDF
///
/// Reads the document, runs field extraction, writes the spreadsheet and
/// returns its download URL.
async fn upload<L>(
    State(state): State<AppState<L>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError>
where
    L: LlmProvider + 'static,
{
    let (name, bytes) = read_file_field(&mut multipart).await?;
    info!(file = %name, bytes = bytes.len(), "Received upload");

    let documents = state.documents;
    let text = tokio::task::spawn_blocking(move || documents.extract_text(&bytes)).await??;
    debug!(
        chars = text.chars().count(),
        "Lease text extracted: {}...",
        text.chars().take(200).collect::<String>()
    );

    let extraction = state.extractor.extract(&text).await?;

    let exporter = state.exporter.clone();
    let result = extraction.result;
    let path = tokio::task::spawn_blocking(move || exporter.export(&result)).await??;

    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AppError::InternalError("Artifact path has no filename".to_string()))?;

    info!(
        file = %filename,
        not_stated = extraction.metadata.not_stated_fields,
        elapsed_ms = extraction.metadata.processing_time_ms,
        "Abstract ready"
    );

    Ok(Json(UploadResponse {
        download_url: format!("/download/{}", filename),
    }))
}

/// First multipart field named `file`, with its client-side filename
async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Bytes), AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or("upload.pdf").to_string();
        let bytes = field.bytes().await?;
        return Ok((name, bytes));
    }

    Err(AppError::BadRequest(format!(
        "Missing multipart field '{}'",
        FILE_FIELD
    )))
}

/// GET /download/:filename - Serve a generated spreadsheet
async fn download<L>(
    State(state): State<AppState<L>>,
    Path(filename): Path<String>,
) -> Result<Response, AppError>
where
    L: LlmProvider + 'static,
{
    let path = state.exporter.store().resolve(&filename)?;
    let bytes = tokio::fs::read(&path).await.map_err(StoreError::from)?;

    debug!(file = %filename, bytes = bytes.len(), "Serving abstract");

    let headers = [
        (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];
    Ok((headers, bytes).into_response())
}

/// GET /health - Liveness check
async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
    })
}

/// Create the axum router with all routes
pub fn create_router<L>(state: AppState<L>) -> AxumRouter
where
    L: LlmProvider + 'static,
{
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    AxumRouter::new()
        .route("/upload", post(upload::<L>))
        .route("/download/:filename", get(download::<L>))
        .route("/health", get(health_check))
        .layer(body_limit)
        .with_state(state)
}
