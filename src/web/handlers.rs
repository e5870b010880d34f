//! Document handlers for the docshelf Web API.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use tokio_util::io::ReaderStream;

use crate::store::{DocumentStore, IngestFile, ListParams, StreamMode};
use crate::web::dto::{
    BulkDeleteResponse, DeleteResponse, DocIdsRequest, DocumentListResponse, DocumentResponse,
    ListDocumentsQuery, UploadResponse,
};
use crate::web::error::ApiError;

/// Shared application state for the Web API.
pub struct AppState {
    /// The document store.
    pub store: Arc<DocumentStore>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }
}

/// Generate a safe Content-Disposition header value.
///
/// Control characters are stripped (header injection), quotes and
/// backslashes replaced, and non-ASCII titles carried via the RFC 5987
/// `filename*` parameter.
fn content_disposition_header(disposition: &str, filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' => '_',
            '\\' => '_',
            _ => c,
        })
        .collect();

    if filename.is_ascii() && !filename.chars().any(|c| c.is_control() || c == '"' || c == '\\') {
        return format!("{disposition}; filename=\"{filename}\"");
    }

    let encoded = urlencoding::encode(filename);
    format!("{disposition}; filename=\"{sanitized}\"; filename*=UTF-8''{encoded}")
}

/// Build a streaming response for a resolved document.
fn stream_response(
    stream: crate::store::DocumentStream,
    disposition: &str,
) -> Result<Response, ApiError> {
    let body = Body::from_stream(ReaderStream::new(stream.reader));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, stream.content_type)
        .header(header::CONTENT_LENGTH, stream.size.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(disposition, &stream.title),
        )
        .body(body)
        .map_err(|e| ApiError::internal(format!("Failed to build response: {e}")))
}

/// GET /documents - List documents with search, sort, and pagination.
#[utoipa::path(
    get,
    path = "/documents",
    tag = "documents",
    params(ListDocumentsQuery),
    responses(
        (status = 200, description = "Paginated document listing", body = DocumentListResponse)
    )
)]
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListDocumentsQuery>,
) -> Result<Json<DocumentListResponse>, ApiError> {
    let page = query.page;
    let page_size = query.page_size;
    let params: ListParams = query.into();

    let result = state.store.list(&params).await;

    Ok(Json(DocumentListResponse {
        documents: result.documents.into_iter().map(Into::into).collect(),
        total: result.total,
        page,
        page_size,
    }))
}

/// POST /documents - Upload one or more documents.
///
/// Request body: multipart/form-data with one or more `files` fields.
#[utoipa::path(
    post,
    path = "/documents",
    tag = "documents",
    request_body(content = Vec<u8>, content_type = "multipart/form-data", description = "One or more files under the `files` field"),
    responses(
        (status = 201, description = "Documents created", body = UploadResponse),
        (status = 400, description = "No valid files, or a disallowed type/image in the batch")
    )
)]
pub async fn upload_documents(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut files: Vec<IngestFile> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })? {
        if field.name() != Some("files") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| ApiError::bad_request("File field must have a filename"))?;
        let mimetype = field.content_type().map(|s| s.to_string()).unwrap_or_default();

        let content = field
            .bytes()
            .await
            .map_err(|e| {
                tracing::error!("Failed to read file content: {}", e);
                ApiError::bad_request("Failed to read file")
            })?
            .to_vec();

        files.push(IngestFile::new(filename, mimetype, content));
    }

    let records = state.store.ingest(files).await?;

    let response = UploadResponse {
        message: "Upload successful".to_string(),
        documents: records.into_iter().map(DocumentResponse::from).collect(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /documents/:id/view - Stream a document for inline viewing.
#[utoipa::path(
    get,
    path = "/documents/{id}/view",
    tag = "documents",
    params(("id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document content, browser-displayable content type"),
        (status = 404, description = "Unknown id or missing blob")
    )
)]
pub async fn view_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let stream = state.store.open_for_stream(&id, StreamMode::Inline).await?;
    stream_response(stream, "inline")
}

/// GET /documents/:id/download - Stream a document as an attachment.
#[utoipa::path(
    get,
    path = "/documents/{id}/download",
    tag = "documents",
    params(("id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document content, stored content type"),
        (status = 404, description = "Unknown id or missing blob")
    )
)]
pub async fn download_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let stream = state
        .store
        .open_for_stream(&id, StreamMode::Attachment)
        .await?;
    stream_response(stream, "attachment")
}

/// POST /documents/download-zip - Stream a zip archive of documents.
#[utoipa::path(
    post,
    path = "/documents/download-zip",
    tag = "documents",
    request_body = DocIdsRequest,
    responses(
        (status = 200, description = "Zip archive stream", content_type = "application/zip"),
        (status = 400, description = "Empty id list"),
        (status = 404, description = "No id resolved to an existing document")
    )
)]
pub async fn download_zip(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DocIdsRequest>,
) -> Result<Response, ApiError> {
    if request.doc_ids.is_empty() {
        return Err(ApiError::bad_request("No document IDs provided"));
    }

    let archive = state.store.build_archive(&request.doc_ids).await?;
    let body = Body::from_stream(ReaderStream::new(archive));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header("attachment", "documents.zip"),
        )
        .body(body)
        .map_err(|e| ApiError::internal(format!("Failed to build response: {e}")))
}

/// DELETE /documents/:id - Delete a single document.
#[utoipa::path(
    delete,
    path = "/documents/{id}",
    tag = "documents",
    params(("id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document deleted", body = DeleteResponse),
        (status = 404, description = "Unknown id")
    )
)]
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let deleted_id = state.store.delete_one(&id).await?;

    Ok(Json(DeleteResponse {
        message: "Document deleted successfully".to_string(),
        id: deleted_id,
    }))
}

/// POST /documents/delete-bulk - Delete multiple documents.
#[utoipa::path(
    post,
    path = "/documents/delete-bulk",
    tag = "documents",
    request_body = DocIdsRequest,
    responses(
        (status = 200, description = "Bulk delete result with the ids actually removed", body = BulkDeleteResponse),
        (status = 400, description = "Empty id list")
    )
)]
pub async fn delete_bulk(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DocIdsRequest>,
) -> Result<Json<BulkDeleteResponse>, ApiError> {
    if request.doc_ids.is_empty() {
        return Err(ApiError::bad_request("No document IDs provided"));
    }

    let deleted_ids = state.store.delete_many(&request.doc_ids).await?;

    Ok(Json(BulkDeleteResponse {
        message: format!("Deleted {} documents", deleted_ids.len()),
        deleted_ids,
    }))
}
