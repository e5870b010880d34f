//! Document record data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata entry for one stored document.
///
/// Records are immutable after creation: the only lifecycle transitions are
/// insert (via ingest) and remove (via delete). There is no update/rename.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    /// Opaque unique identifier, generated at ingest time.
    pub id: String,
    /// Original client-supplied filename; used for display and for
    /// Content-Disposition on download. Not guaranteed unique.
    pub title: String,
    /// The blob store's internal handle. Owned by the blob store and never
    /// exposed to clients.
    pub storage_key: String,
    /// Byte length at ingest time, authoritative for display.
    pub size: u64,
    /// Client-declared content type; download fallback.
    pub mimetype: String,
    /// Ingest timestamp; the default sort key.
    pub upload_date: DateTime<Utc>,
}

impl DocumentRecord {
    /// Construct a record for a freshly ingested file.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        storage_key: impl Into<String>,
        size: u64,
        mimetype: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            storage_key: storage_key.into(),
            size,
            mimetype: mimetype.into(),
            upload_date: Utc::now(),
        }
    }
}
