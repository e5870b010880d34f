//! Concurrency tests for the document store.
//!
//! Verify that concurrent batch operations never corrupt the durable index:
//! after racing mutations the index file still parses and holds exactly the
//! surviving records.

use std::sync::Arc;

use docshelf::store::{DocumentStore, IngestFile, ListParams};
use tempfile::TempDir;

async fn setup_store() -> (TempDir, Arc<DocumentStore>) {
    let temp_dir = TempDir::new().unwrap();
    let store = DocumentStore::open(
        temp_dir.path().join("blobs"),
        temp_dir.path().join("index.json"),
    )
    .await
    .unwrap();
    (temp_dir, Arc::new(store))
}

fn batch(prefix: &str, count: usize) -> Vec<IngestFile> {
    (0..count)
        .map(|i| {
            IngestFile::new(
                format!("{prefix}-{i}.txt"),
                "text/plain",
                format!("content of {prefix}-{i}").into_bytes(),
            )
        })
        .collect()
}

/// Two disjoint batches ingested concurrently both land; the listing
/// afterwards is exactly their union.
#[tokio::test]
async fn test_concurrent_ingest_yields_union() {
    let (_temp_dir, store) = setup_store().await;

    let store_a = Arc::clone(&store);
    let store_b = Arc::clone(&store);

    let (a, b) = tokio::join!(
        tokio::spawn(async move { store_a.ingest(batch("alpha", 8)).await }),
        tokio::spawn(async move { store_b.ingest(batch("beta", 8)).await }),
    );
    a.unwrap().unwrap();
    b.unwrap().unwrap();

    let params = ListParams {
        page_size: 100,
        ..Default::default()
    };
    let page = store.list(&params).await;
    assert_eq!(page.total, 16);

    let alpha = page
        .documents
        .iter()
        .filter(|r| r.title.starts_with("alpha-"))
        .count();
    let beta = page
        .documents
        .iter()
        .filter(|r| r.title.starts_with("beta-"))
        .count();
    assert_eq!(alpha, 8);
    assert_eq!(beta, 8);
}

/// The durable index file stays parseable and complete after racing
/// ingests from many tasks.
#[tokio::test]
async fn test_concurrent_ingest_never_corrupts_index_file() {
    let temp_dir = TempDir::new().unwrap();
    let index_path = temp_dir.path().join("index.json");
    let store = Arc::new(
        DocumentStore::open(temp_dir.path().join("blobs"), &index_path)
            .await
            .unwrap(),
    );

    const TASKS: usize = 10;
    let handles: Vec<_> = (0..TASKS)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.ingest(batch(&format!("task{i}"), 3)).await })
        })
        .collect();
    for result in futures::future::join_all(handles).await {
        result.unwrap().unwrap();
    }

    // The file must be a complete, parseable snapshot holding every record.
    let bytes = tokio::fs::read(&index_path).await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["documents"].as_array().unwrap().len(), TASKS * 3);

    // Reopening from the file sees the same state.
    drop(store);
    let reopened = DocumentStore::open(temp_dir.path().join("blobs"), &index_path)
        .await
        .unwrap();
    assert_eq!(reopened.index().len().await, TASKS * 3);
}

/// Concurrent deletes of overlapping id sets: every id is removed exactly
/// once across the two reports, and nothing is left behind.
#[tokio::test]
async fn test_concurrent_bulk_delete() {
    let (_temp_dir, store) = setup_store().await;

    let records = store.ingest(batch("doc", 10)).await.unwrap();
    let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();

    let first_half: Vec<String> = ids[..7].to_vec();
    let second_half: Vec<String> = ids[3..].to_vec();

    let store_a = Arc::clone(&store);
    let store_b = Arc::clone(&store);
    let (a, b) = tokio::join!(
        tokio::spawn(async move { store_a.delete_many(&first_half).await }),
        tokio::spawn(async move { store_b.delete_many(&second_half).await }),
    );
    let deleted_a = a.unwrap().unwrap();
    let deleted_b = b.unwrap().unwrap();

    // The overlapping ids were each removed by exactly one call.
    assert_eq!(deleted_a.len() + deleted_b.len(), 10);
    for id in &ids {
        let in_a = deleted_a.contains(id);
        let in_b = deleted_b.contains(id);
        assert!(in_a ^ in_b, "id {id} reported by exactly one call");
    }

    assert!(store.index().is_empty().await);
}

/// Listing concurrently with ingest observes either the pre- or
/// post-mutation index, never a partial state.
#[tokio::test]
async fn test_list_during_ingest_sees_whole_batches() {
    let (_temp_dir, store) = setup_store().await;

    const BATCH: usize = 5;
    let writer = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            for i in 0..6 {
                store.ingest(batch(&format!("wave{i}"), BATCH)).await.unwrap();
            }
        })
    };

    let params = ListParams {
        page_size: 1000,
        ..Default::default()
    };
    for _ in 0..50 {
        let page = store.list(&params).await;
        // Batches commit atomically, so totals only move in whole batches.
        assert_eq!(page.total % BATCH, 0);
        tokio::task::yield_now().await;
    }

    writer.await.unwrap();
    assert_eq!(store.list(&params).await.total, 30);
}
