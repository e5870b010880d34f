//! Document store for docshelf.
//!
//! Composes the blob store and the metadata index and owns the consistency
//! contract between them: every record visible in the index has a durable
//! blob behind it (blobs are committed before metadata), while blobs without
//! a record are tolerated as reclaimable orphans, never treated as
//! corruption.

pub mod archive;
pub mod blob;
pub mod index;
pub mod query;
pub mod record;

pub use archive::ArchiveEntry;
pub use blob::BlobStore;
pub use index::MetadataIndex;
pub use query::{ListPage, ListParams, SortBy, SortOrder};
pub use record::DocumentRecord;

use std::path::Path;

use tracing::{info, warn};

use crate::{DocshelfError, Result};

/// File extensions accepted for ingest.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "txt", "html", "htm", "xls", "xlsx", "ppt", "pptx", "rtf", "csv", "md",
    "json",
];

/// One file submitted for ingest.
#[derive(Debug, Clone)]
pub struct IngestFile {
    /// Original filename as supplied by the client.
    pub filename: String,
    /// Client-declared content type. May be empty.
    pub mimetype: String,
    /// File content.
    pub content: Vec<u8>,
}

impl IngestFile {
    /// Create a new ingest file.
    pub fn new(filename: impl Into<String>, mimetype: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mimetype: mimetype.into(),
            content,
        }
    }
}

/// How a streamed document will be presented by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// Browser-rendered; the content type is remapped to something the
    /// browser will display rather than download.
    Inline,
    /// Download; the stored content type is used verbatim.
    Attachment,
}

/// An open document ready to be streamed to a client.
///
/// Holds the blob reader plus the transport metadata chosen for the
/// requested mode. The content is never buffered here.
#[derive(Debug)]
pub struct DocumentStream {
    /// Lazily consumed blob reader.
    pub reader: tokio::fs::File,
    /// Content type chosen for the requested mode.
    pub content_type: String,
    /// Display title for the Content-Disposition header.
    pub title: String,
    /// Byte length recorded at ingest.
    pub size: u64,
}

/// The document store: metadata index + blob area, kept mutually consistent.
#[derive(Debug)]
pub struct DocumentStore {
    blobs: BlobStore,
    index: MetadataIndex,
}

impl DocumentStore {
    /// Open the store: blob area at `blobs_dir`, durable index at
    /// `index_path`. Both are created if absent; existing records are
    /// reloaded.
    pub async fn open(
        blobs_dir: impl AsRef<Path>,
        index_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let blobs = BlobStore::open(blobs_dir.as_ref()).await?;
        let index = MetadataIndex::open(index_path.as_ref()).await?;

        info!(
            blobs = %blobs.base_path().display(),
            index = %index.path().display(),
            "Document store opened"
        );

        Ok(Self { blobs, index })
    }

    /// Access the underlying blob store.
    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    /// Access the underlying metadata index.
    pub fn index(&self) -> &MetadataIndex {
        &self.index
    }

    /// Ingest a batch of files.
    ///
    /// The whole batch is validated before anything is written: any file
    /// with an image mimetype, or an extension outside the allow-list,
    /// rejects the entire batch. Accepted files are written to the blob area
    /// first; only after every blob is durable does one index insert make
    /// the batch visible. A failure mid-batch rolls back the blobs already
    /// written for this attempt, leaving neither partial records nor orphan
    /// blobs behind.
    pub async fn ingest(&self, files: Vec<IngestFile>) -> Result<Vec<DocumentRecord>> {
        if files.is_empty() {
            return Err(DocshelfError::InvalidInput("no files provided".to_string()));
        }

        // Whole-batch validation before any write.
        for file in &files {
            validate_ingest_file(file)?;
        }

        // Blob-first: bytes are durable before any record becomes visible.
        let mut records: Vec<DocumentRecord> = Vec::with_capacity(files.len());
        for file in &files {
            let storage_key = match self.blobs.put(&file.content, &file.filename).await {
                Ok(key) => key,
                Err(e) => {
                    self.rollback_blobs(&records).await;
                    return Err(e);
                }
            };

            // The externally visible id is the handle minus its extension;
            // the two diverge only in what they are used for.
            let id = storage_key
                .split_once('.')
                .map(|(stem, _)| stem.to_string())
                .unwrap_or_else(|| storage_key.clone());

            let mimetype = if file.mimetype.is_empty() {
                mime_guess::from_path(&file.filename)
                    .first_or_octet_stream()
                    .to_string()
            } else {
                file.mimetype.clone()
            };

            records.push(DocumentRecord::new(
                id,
                &file.filename,
                storage_key,
                file.content.len() as u64,
                mimetype,
            ));
        }

        // Single atomic index commit for the whole batch.
        if let Err(e) = self.index.insert_many(records.clone()).await {
            self.rollback_blobs(&records).await;
            return Err(e);
        }

        info!(count = records.len(), "Ingested document batch");
        Ok(records)
    }

    /// List documents: filter, sort, paginate over a fresh index snapshot.
    pub async fn list(&self, params: &ListParams) -> ListPage {
        let snapshot = self.index.all().await;
        query::run(snapshot, params)
    }

    /// Open a document for streaming.
    ///
    /// Resolves the record, then the blob; fails `NotFound` if either is
    /// missing. The content type depends on the mode: inline remaps
    /// text-like extensions to browser-displayable types, attachment uses
    /// the stored mimetype verbatim.
    pub async fn open_for_stream(&self, id: &str, mode: StreamMode) -> Result<DocumentStream> {
        let record = self
            .index
            .find_by_id(id)
            .await
            .ok_or_else(|| DocshelfError::NotFound("document".to_string()))?;

        // The storage key never leaves the store, not even in error text.
        let reader = match self.blobs.open_read(&record.storage_key).await {
            Ok(reader) => reader,
            Err(DocshelfError::NotFound(_)) => {
                return Err(DocshelfError::NotFound("document".to_string()))
            }
            Err(e) => return Err(e),
        };

        let content_type = match mode {
            StreamMode::Inline => inline_content_type(&record.title, &record.mimetype),
            StreamMode::Attachment => stored_content_type(&record.mimetype),
        };

        Ok(DocumentStream {
            reader,
            content_type,
            title: record.title,
            size: record.size,
        })
    }

    /// Delete a single document.
    ///
    /// The index removal commits first, so the record disappears from
    /// listings immediately; blob removal is then attempted best-effort. A
    /// blob removal failure is logged, not surfaced, since a retained
    /// orphan blob is a recoverable leak.
    pub async fn delete_one(&self, id: &str) -> Result<String> {
        let removed = self.index.remove_many(&[id.to_string()]).await?;

        let record = removed
            .into_iter()
            .next()
            .ok_or_else(|| DocshelfError::NotFound("document".to_string()))?;

        self.remove_blob_best_effort(&record).await;

        info!(id = %record.id, title = %record.title, "Deleted document");
        Ok(record.id)
    }

    /// Delete multiple documents.
    ///
    /// Unknown ids are ignored; a failed blob removal never aborts the
    /// batch. The index mutation is a single atomic replace. Returns the
    /// ids that had a matching record, the authoritative deleted count.
    pub async fn delete_many(&self, ids: &[String]) -> Result<Vec<String>> {
        let removed = self.index.remove_many(ids).await?;

        for record in &removed {
            self.remove_blob_best_effort(record).await;
        }

        let deleted_ids: Vec<String> = removed.into_iter().map(|r| r.id).collect();
        info!(
            requested = ids.len(),
            deleted = deleted_ids.len(),
            "Bulk-deleted documents"
        );
        Ok(deleted_ids)
    }

    /// Build a zip archive of the given documents.
    ///
    /// Ids with no matching record, and records whose blob is missing on
    /// disk, are silently skipped. Fails `NotFound` only when nothing
    /// resolves. Returns an async reader over the finished archive bytes.
    pub async fn build_archive(&self, ids: &[String]) -> Result<tokio::fs::File> {
        let snapshot = self.index.all().await;

        let mut entries = Vec::new();
        for record in snapshot {
            if !ids.iter().any(|id| *id == record.id) {
                continue;
            }
            if !self.blobs.exists(&record.storage_key).await {
                warn!(id = %record.id, key = %record.storage_key, "Blob missing, skipping archive entry");
                continue;
            }
            entries.push(ArchiveEntry {
                title: record.title,
                path: self.blobs.path_of(&record.storage_key),
            });
        }

        if entries.is_empty() {
            return Err(DocshelfError::NotFound("documents".to_string()));
        }

        info!(count = entries.len(), "Building document archive");
        archive::build(entries).await
    }

    /// Best-effort removal of a record's blob after the index entry is gone.
    async fn remove_blob_best_effort(&self, record: &DocumentRecord) {
        if let Err(e) = self.blobs.remove(&record.storage_key).await {
            warn!(
                id = %record.id,
                key = %record.storage_key,
                error = %e,
                "Failed to remove blob; orphan left for later cleanup"
            );
        }
    }

    /// Remove blobs written during a failed ingest attempt.
    async fn rollback_blobs(&self, records: &[DocumentRecord]) {
        for record in records {
            if let Err(e) = self.blobs.remove(&record.storage_key).await {
                warn!(
                    key = %record.storage_key,
                    error = %e,
                    "Failed to roll back blob after ingest failure"
                );
            }
        }
    }
}

/// Validate one file of an ingest batch.
///
/// Images are categorically disallowed (policy), and the extension must be
/// on the allow-list.
fn validate_ingest_file(file: &IngestFile) -> Result<()> {
    if file.mimetype.to_lowercase().starts_with("image/") {
        return Err(DocshelfError::InvalidInput(
            "images are not allowed".to_string(),
        ));
    }

    let ext = Path::new(&file.filename)
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(DocshelfError::InvalidInput(format!(
            "file type not allowed: {}",
            file.filename
        )));
    }

    Ok(())
}

/// Content type for inline viewing.
///
/// The client-declared upload mimetype is often wrong or absent for
/// text-like formats, so inline viewing remaps by the title's extension to
/// a type the browser will render. Unmapped extensions fall back to the
/// stored mimetype, then to a generic binary type.
fn inline_content_type(title: &str, stored_mimetype: &str) -> String {
    let ext = Path::new(title)
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "md" | "txt" | "csv" | "rtf" => "text/plain; charset=utf-8".to_string(),
        "json" => "application/json; charset=utf-8".to_string(),
        "html" | "htm" => "text/html; charset=utf-8".to_string(),
        "xml" => "text/xml; charset=utf-8".to_string(),
        "pdf" => "application/pdf".to_string(),
        _ => stored_content_type(stored_mimetype),
    }
}

/// Stored mimetype with a generic binary fallback.
fn stored_content_type(stored_mimetype: &str) -> String {
    if stored_mimetype.is_empty() {
        "application/octet-stream".to_string()
    } else {
        stored_mimetype.to_string()
    }
}
