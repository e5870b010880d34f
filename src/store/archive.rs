//! Streaming zip archive builder.
//!
//! Aggregates N blobs into a single deflate-compressed zip. Blobs are copied
//! into the encoder one at a time through a fixed copy buffer and the
//! archive itself is spooled to an unlinked temporary file, so memory use is
//! bounded regardless of how many documents are exported. The caller
//! receives an async reader over the finished spool; dropping it releases
//! the handle and the spool space is reclaimed by the filesystem.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

use crate::{DocshelfError, Result};

/// One document to place in the archive.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// In-archive entry name (the document's display title).
    pub title: String,
    /// Filesystem path of the backing blob.
    pub path: PathBuf,
}

/// Build a zip archive from the given entries and return an async reader
/// over the finished bytes.
///
/// Entries whose blob vanished between resolution and encoding are skipped;
/// archive export is best-effort, not all-or-nothing. Duplicate titles get a
/// numeric suffix so every document lands in the archive under a distinct
/// entry name.
pub async fn build(entries: Vec<ArchiveEntry>) -> Result<File> {
    let spool = std::env::temp_dir().join(format!("docshelf-zip-{}", Uuid::new_v4()));

    let spool_path = spool.clone();
    let write_result = tokio::task::spawn_blocking(move || write_zip(&spool_path, entries))
        .await
        .map_err(|e| DocshelfError::Archive(format!("archive task failed: {e}")))?;

    match write_result {
        Ok(()) => {
            let file = File::open(&spool).await?;
            // Unlink while the handle is open: the stream stays readable and
            // the space is reclaimed as soon as the reader is dropped.
            let _ = tokio::fs::remove_file(&spool).await;
            Ok(file)
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(&spool).await;
            Err(e)
        }
    }
}

/// Encode all entries into a zip file at `spool`, one blob at a time.
fn write_zip(spool: &Path, entries: Vec<ArchiveEntry>) -> Result<()> {
    let file = std::fs::File::create(spool)?;
    let mut writer = zip::ZipWriter::new(std::io::BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut used_names: HashSet<String> = HashSet::new();

    for entry in entries {
        let mut src = match std::fs::File::open(&entry.path) {
            Ok(f) => f,
            // Blob removed since resolution: skip, best-effort.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        };

        let name = unique_entry_name(&entry.title, &mut used_names);
        writer
            .start_file(name, options)
            .map_err(|e| DocshelfError::Archive(e.to_string()))?;
        std::io::copy(&mut src, &mut writer)?;
    }

    let mut inner = writer
        .finish()
        .map_err(|e| DocshelfError::Archive(e.to_string()))?;
    inner.flush()?;

    Ok(())
}

/// Pick an entry name not yet used in this archive.
///
/// First occurrence keeps the title as-is; later duplicates get ` (n)`
/// inserted before the extension.
fn unique_entry_name(title: &str, used: &mut HashSet<String>) -> String {
    if used.insert(title.to_string()) {
        return title.to_string();
    }

    let (stem, ext) = match title.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (title, None),
    };

    for n in 1.. {
        let candidate = match ext {
            Some(ext) => format!("{stem} ({n}).{ext}"),
            None => format!("{stem} ({n})"),
        };
        if used.insert(candidate.clone()) {
            return candidate;
        }
    }
    unreachable!()
}
