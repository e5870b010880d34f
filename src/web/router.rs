//! Router configuration for the docshelf Web API.

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::dto;
use super::handlers::{
    delete_bulk, delete_document, download_document, download_zip, list_documents,
    upload_documents, view_document, AppState,
};

/// OpenAPI documentation for the document API.
#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::list_documents,
        super::handlers::upload_documents,
        super::handlers::view_document,
        super::handlers::download_document,
        super::handlers::download_zip,
        super::handlers::delete_document,
        super::handlers::delete_bulk,
    ),
    components(schemas(
        dto::DocIdsRequest,
        dto::DocumentResponse,
        dto::DocumentListResponse,
        dto::UploadResponse,
        dto::DeleteResponse,
        dto::BulkDeleteResponse,
    )),
    tags((name = "documents", description = "Document catalog operations"))
)]
struct ApiDoc;

/// Create the CORS layer.
///
/// Empty origins means permissive development mode; otherwise only the
/// listed origins are allowed.
fn create_cors_layer(origins: &[String]) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];

    let parsed_origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

    if parsed_origins.is_empty() {
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers(Any)
            .allow_origin(Any)
    } else {
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers(Any)
            .allow_origin(parsed_origins)
    }
}

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    cors_origins: &[String],
    max_upload_size: usize,
) -> Router {
    let document_routes = Router::new()
        .route("/documents", get(list_documents).post(upload_documents))
        .route("/documents/download-zip", post(download_zip))
        .route("/documents/delete-bulk", post(delete_bulk))
        .route("/documents/:id", delete(delete_document))
        .route("/documents/:id/view", get(view_document))
        .route("/documents/:id/download", get(download_document));

    Router::new()
        .merge(document_routes)
        .layer(DefaultBodyLimit::max(max_upload_size))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Create the swagger UI router.
pub fn create_swagger_router() -> Router {
    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
