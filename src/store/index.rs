//! Durable metadata index for docshelf.
//!
//! The index is an ordered collection of document records kept in memory and
//! mirrored to a single JSON file. Every mutation rewrites the whole
//! collection to a temporary file and atomically renames it over the durable
//! one, so readers of the file only ever observe a complete pre- or
//! post-mutation state, never a partial write.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::record::DocumentRecord;
use crate::Result;

/// Durable on-disk representation of the index.
#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexFile {
    documents: Vec<DocumentRecord>,
}

/// Ordered collection of document records keyed by unique id.
///
/// Insertion order is preserved and serves as the tiebreak for equal sort
/// keys in listing queries. The in-process `RwLock` serializes writers, so
/// concurrent batch mutations both land and the durable file is never
/// structurally corrupted.
#[derive(Debug)]
pub struct MetadataIndex {
    path: PathBuf,
    records: RwLock<Vec<DocumentRecord>>,
}

impl MetadataIndex {
    /// Open the index at the given path, loading existing records.
    ///
    /// A missing file is treated as an empty index; it is created on the
    /// first mutation. An unreadable or malformed file is an error so that
    /// a damaged index surfaces at startup rather than silently losing data.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let records = match fs::read(&path).await {
            Ok(bytes) => {
                let file: IndexFile = serde_json::from_slice(&bytes)?;
                info!(
                    count = file.documents.len(),
                    path = %path.display(),
                    "Loaded metadata index"
                );
                file.documents
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No metadata index yet, starting empty");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    /// Path of the durable index file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append records, preserving insertion order, and persist atomically.
    pub async fn insert_many(&self, records: Vec<DocumentRecord>) -> Result<()> {
        let mut guard = self.records.write().await;
        guard.extend(records);
        self.persist(&guard).await
    }

    /// Look up a record by id.
    pub async fn find_by_id(&self, id: &str) -> Option<DocumentRecord> {
        let guard = self.records.read().await;
        guard.iter().find(|r| r.id == id).cloned()
    }

    /// Remove the records matching the given ids and persist atomically.
    ///
    /// Unknown ids are ignored. Returns the ids that were actually removed,
    /// in index order, so callers can report accurate bulk-delete counts.
    pub async fn remove_many(&self, ids: &[String]) -> Result<Vec<DocumentRecord>> {
        let mut guard = self.records.write().await;

        let mut removed = Vec::new();
        guard.retain(|r| {
            if ids.iter().any(|id| *id == r.id) {
                removed.push(r.clone());
                false
            } else {
                true
            }
        });

        if !removed.is_empty() {
            self.persist(&guard).await?;
        }

        Ok(removed)
    }

    /// Snapshot of all records.
    ///
    /// The snapshot does not reflect mutations made after it is taken.
    pub async fn all(&self) -> Vec<DocumentRecord> {
        self.records.read().await.clone()
    }

    /// Number of records currently in the index.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the index holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Write the whole collection to `<path>.tmp` and rename it over the
    /// durable file. Called with the write lock held.
    async fn persist(&self, records: &[DocumentRecord]) -> Result<()> {
        let file = IndexFile {
            documents: records.to_vec(),
        };
        let bytes = serde_json::to_vec_pretty(&file)?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, &bytes).await?;
        fs::rename(&tmp_path, &self.path).await?;

        debug!(count = records.len(), "Persisted metadata index");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_record(id: &str, title: &str) -> DocumentRecord {
        DocumentRecord::new(id, title, format!("{id}.txt"), 10, "text/plain")
    }

    async fn setup_index() -> (TempDir, MetadataIndex) {
        let temp_dir = TempDir::new().unwrap();
        let index = MetadataIndex::open(temp_dir.path().join("index.json"))
            .await
            .unwrap();
        (temp_dir, index)
    }

    #[tokio::test]
    async fn test_open_empty() {
        let (_temp_dir, index) = setup_index().await;
        assert!(index.is_empty().await);
        assert_eq!(index.len().await, 0);
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let (_temp_dir, index) = setup_index().await;

        index
            .insert_many(vec![sample_record("a", "a.txt"), sample_record("b", "b.txt")])
            .await
            .unwrap();

        assert_eq!(index.len().await, 2);
        assert_eq!(index.find_by_id("a").await.unwrap().title, "a.txt");
        assert!(index.find_by_id("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_insertion_order_preserved() {
        let (_temp_dir, index) = setup_index().await;

        index
            .insert_many(vec![sample_record("1", "one"), sample_record("2", "two")])
            .await
            .unwrap();
        index
            .insert_many(vec![sample_record("3", "three")])
            .await
            .unwrap();

        let ids: Vec<String> = index.all().await.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_remove_many_reports_removed_subset() {
        let (_temp_dir, index) = setup_index().await;

        index
            .insert_many(vec![sample_record("a", "a"), sample_record("b", "b")])
            .await
            .unwrap();

        let removed = index
            .remove_many(&["a".to_string(), "ghost".to_string()])
            .await
            .unwrap();

        let removed_ids: Vec<&str> = removed.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(removed_ids, vec!["a"]);
        assert_eq!(index.len().await, 1);
        assert!(index.find_by_id("b").await.is_some());
    }

    #[tokio::test]
    async fn test_remove_unknown_ids_leaves_index_unchanged() {
        let (_temp_dir, index) = setup_index().await;

        index.insert_many(vec![sample_record("a", "a")]).await.unwrap();

        let removed = index.remove_many(&["x".to_string()]).await.unwrap();
        assert!(removed.is_empty());
        assert_eq!(index.len().await, 1);
    }

    #[tokio::test]
    async fn test_reload_after_restart() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index.json");

        {
            let index = MetadataIndex::open(&path).await.unwrap();
            index
                .insert_many(vec![sample_record("a", "kept.txt")])
                .await
                .unwrap();
        }

        let reopened = MetadataIndex::open(&path).await.unwrap();
        assert_eq!(reopened.len().await, 1);
        assert_eq!(reopened.find_by_id("a").await.unwrap().title, "kept.txt");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let result = MetadataIndex::open(&path).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_no_tmp_file_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index.json");

        let index = MetadataIndex::open(&path).await.unwrap();
        index.insert_many(vec![sample_record("a", "a")]).await.unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_durable_file_layout() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index.json");

        let index = MetadataIndex::open(&path).await.unwrap();
        index.insert_many(vec![sample_record("a", "a")]).await.unwrap();

        let bytes = tokio::fs::read(&path).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(value["documents"].is_array());
        assert_eq!(value["documents"][0]["id"], "a");
    }
}
