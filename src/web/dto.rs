//! Data Transfer Objects for the docshelf Web API.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::store::{DocumentRecord, ListParams, SortBy, SortOrder};

// ============================================================================
// Requests
// ============================================================================

/// Query parameters for document listing.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsQuery {
    /// Case-insensitive title filter.
    #[serde(default)]
    pub q: String,
    /// Sort key: `date` (default) or `size`.
    #[serde(default)]
    #[param(value_type = String)]
    pub sort_by: SortBy,
    /// Sort direction: `asc` or `desc` (default).
    #[serde(default)]
    #[param(value_type = String)]
    pub sort_order: SortOrder,
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: usize,
    /// Page size.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    10
}

impl From<ListDocumentsQuery> for ListParams {
    fn from(q: ListDocumentsQuery) -> Self {
        ListParams {
            q: q.q,
            sort_by: q.sort_by,
            sort_order: q.sort_order,
            page: q.page,
            page_size: q.page_size,
        }
    }
}

/// Request body carrying a list of document ids (bulk delete, zip export).
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocIdsRequest {
    /// Target document ids.
    pub doc_ids: Vec<String>,
}

// ============================================================================
// Responses
// ============================================================================

/// One document in API responses. The blob store's internal handle is
/// deliberately absent.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    /// Document id.
    pub id: String,
    /// Original filename.
    pub title: String,
    /// Byte size.
    pub size: u64,
    /// Stored content type.
    pub mimetype: String,
    /// Upload timestamp (RFC 3339).
    pub upload_date: String,
}

impl From<DocumentRecord> for DocumentResponse {
    fn from(record: DocumentRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            size: record.size,
            mimetype: record.mimetype,
            upload_date: record.upload_date.to_rfc3339(),
        }
    }
}

/// Paginated document listing.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentListResponse {
    /// Documents on this page.
    pub documents: Vec<DocumentResponse>,
    /// Total documents matching the filter.
    pub total: usize,
    /// Requested page number.
    pub page: usize,
    /// Requested page size.
    pub page_size: usize,
}

/// Upload result.
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    /// Human-readable message.
    pub message: String,
    /// The created documents.
    pub documents: Vec<DocumentResponse>,
}

/// Single delete result.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    /// Human-readable message.
    pub message: String,
    /// Id of the deleted document.
    pub id: String,
}

/// Bulk delete result.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteResponse {
    /// Human-readable message.
    pub message: String,
    /// Ids that had a matching record and were removed.
    pub deleted_ids: Vec<String>,
}
