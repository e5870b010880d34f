//! Blob store for docshelf.
//!
//! Owns the physical bytes of each document. Every blob is written once
//! under a freshly generated UUID-based handle and never rewritten, so the
//! blob area is append-only from any single document's perspective.

use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::{DocshelfError, Result};

/// Storage for the raw bytes of uploaded documents.
///
/// Handles are `{uuid}.{ext}` filenames inside a flat base directory. The
/// UUID makes handles collision-free by construction; the extension is kept
/// from the original filename so blobs stay recognizable on disk.
#[derive(Debug, Clone)]
pub struct BlobStore {
    /// Base directory for blob storage.
    base_path: PathBuf,
}

impl BlobStore {
    /// Open a blob store rooted at the given directory.
    ///
    /// The directory is created if it doesn't exist.
    pub async fn open(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).await?;

        Ok(Self { base_path })
    }

    /// Get the base path of this store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Persist content under a freshly generated handle.
    ///
    /// Returns the storage key (`{uuid}.{ext}`). Fails with an I/O error if
    /// the underlying medium rejects the write.
    pub async fn put(&self, content: &[u8], original_name: &str) -> Result<String> {
        let storage_key = Self::generate_storage_key(original_name);
        let path = self.path_of(&storage_key);

        fs::write(&path, content).await?;

        Ok(storage_key)
    }

    /// Open a blob for lazy, forward-only reading.
    ///
    /// Fails with `NotFound` if the handle does not resolve to an existing
    /// blob.
    pub async fn open_read(&self, storage_key: &str) -> Result<fs::File> {
        let path = self.path_of(storage_key);

        match fs::File::open(&path).await {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(DocshelfError::NotFound(format!("blob {storage_key}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a blob.
    ///
    /// Idempotent: returns `true` if the blob was deleted, `false` if it
    /// did not exist. Absence of the target is not an error.
    pub async fn remove(&self, storage_key: &str) -> Result<bool> {
        let path = self.path_of(storage_key);

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Check whether a blob exists.
    pub async fn exists(&self, storage_key: &str) -> bool {
        fs::try_exists(self.path_of(storage_key))
            .await
            .unwrap_or(false)
    }

    /// Full filesystem path of a storage key.
    pub fn path_of(&self, storage_key: &str) -> PathBuf {
        self.base_path.join(storage_key)
    }

    /// Generate a new UUID-based storage key preserving the extension.
    ///
    /// Falls back to `bin` when the original name has no extension.
    pub fn generate_storage_key(original_name: &str) -> String {
        let uuid = Uuid::new_v4();
        let ext = Self::extract_extension(original_name);
        format!("{uuid}.{ext}")
    }

    /// Extract the file extension from a filename, defaulting to `bin`.
    fn extract_extension(filename: &str) -> &str {
        Path::new(filename)
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("bin")
    }
}
