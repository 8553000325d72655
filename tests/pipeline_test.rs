//! End-to-end pipeline tests
//!
//! Drives whole backup runs over an in-memory blob store and a
//! scripted source that applies the query window the way the real
//! server does: presence of `_meta` always required, timestamp range
//! only when catching up, results ascending by last-modified time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use strata::adapters::blob::{BlobStore, MemoryBlobStore};
use strata::adapters::source::{ChangeCursor, SourceCollection};
use strata::core::backup::{BackupCoordinator, BatchConfig, QueryWindow, RetryPolicy};
use strata::core::index::INDEX_BLOB;
use strata::domain::{ChangeRecord, Result, SourceError, StrataError};

fn ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn record(id: &str, updated: &str) -> ChangeRecord {
    ChangeRecord::new(json!({
        "_id": id,
        "_meta": { "updated": updated },
        "licensed": { "declared": "MIT" }
    }))
}

/// Source over a fixed dataset, filtering by the requested window.
struct ScriptedSource {
    records: Vec<ChangeRecord>,
    seen_windows: Mutex<Vec<QueryWindow>>,
}

impl ScriptedSource {
    fn new(records: Vec<ChangeRecord>) -> Self {
        Self {
            records,
            seen_windows: Mutex::new(Vec::new()),
        }
    }

    fn windows(&self) -> Vec<QueryWindow> {
        self.seen_windows.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceCollection for ScriptedSource {
    async fn open_changes(
        &self,
        window: &QueryWindow,
        batch_size: usize,
    ) -> Result<Box<dyn ChangeCursor>> {
        self.seen_windows.lock().unwrap().push(window.clone());

        let mut matching: Vec<ChangeRecord> = self
            .records
            .iter()
            .filter(|record| {
                if record.body().get("_meta").is_none() {
                    return false;
                }
                match window {
                    QueryWindow::Bootstrap => true,
                    QueryWindow::CatchUp { lower, upper } => match record.updated_at() {
                        Ok(updated) => updated >= *lower && updated < *upper,
                        Err(_) => false,
                    },
                }
            })
            .cloned()
            .collect();

        matching.sort_by_key(|record| record.updated_at().ok());

        let pages: Vec<Vec<ChangeRecord>> = matching
            .chunks(batch_size)
            .map(|chunk| chunk.to_vec())
            .collect();

        Ok(Box::new(PagedCursor { pages }))
    }
}

struct PagedCursor {
    pages: Vec<Vec<ChangeRecord>>,
}

#[async_trait]
impl ChangeCursor for PagedCursor {
    async fn next_page(&mut self) -> Result<Option<Vec<ChangeRecord>>> {
        if self.pages.is_empty() {
            Ok(None)
        } else {
            Ok(Some(self.pages.remove(0)))
        }
    }
}

/// Source whose cursor always raises a transient fault.
struct FailingSource {
    attempts: Arc<AtomicU64>,
}

#[async_trait]
impl SourceCollection for FailingSource {
    async fn open_changes(
        &self,
        _window: &QueryWindow,
        _batch_size: usize,
    ) -> Result<Box<dyn ChangeCursor>> {
        Ok(Box::new(FailingCursor {
            attempts: Arc::clone(&self.attempts),
        }))
    }
}

struct FailingCursor {
    attempts: Arc<AtomicU64>,
}

#[async_trait]
impl ChangeCursor for FailingCursor {
    async fn next_page(&mut self) -> Result<Option<Vec<ChangeRecord>>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StrataError::Source(SourceError::ConnectionFailed(
            "connection reset by peer".to_string(),
        )))
    }
}

fn coordinator(
    source: Arc<dyn SourceCollection>,
    store: Arc<MemoryBlobStore>,
    max_concurrency: usize,
) -> BackupCoordinator {
    BackupCoordinator::with_backends(
        source,
        store,
        1000,
        BatchConfig { max_concurrency },
        RetryPolicy::from_millis(&[1, 1, 1]),
    )
}

async fn store_contents(store: &MemoryBlobStore) -> Vec<(String, Vec<u8>)> {
    let mut contents = Vec::new();
    for key in store.keys() {
        contents.push((key.clone(), store.get(&key).await.unwrap().unwrap()));
    }
    contents
}

#[tokio::test]
async fn test_bootstrap_run_mirrors_everything() {
    let store = Arc::new(MemoryBlobStore::new());
    let source = Arc::new(ScriptedSource::new(vec![
        record("npm/npmjs/-/a/1.0.0", "2023-01-01T10:15:00Z"),
        record("npm/npmjs/-/b/2.0.0", "2023-01-01T11:40:00Z"),
    ]));

    let summary = coordinator(source.clone(), store.clone(), 4)
        .run(ts("2023-02-01T00:00:00Z"))
        .await
        .unwrap();

    // The empty index opens an unbounded presence-only query
    assert_eq!(source.windows(), vec![QueryWindow::Bootstrap]);

    assert_eq!(summary.mirrored, 2);
    assert_eq!(summary.skipped, 0);
    assert!(store.get("npm/npmjs/-/a/1.0.0.json").await.unwrap().is_some());
    assert!(store.get("npm/npmjs/-/b/2.0.0.json").await.unwrap().is_some());

    let index = store.get(INDEX_BLOB).await.unwrap().unwrap();
    assert_eq!(index, b"2023-01-01-10\n2023-01-01-11");
}

#[tokio::test]
async fn test_second_run_resumes_from_index_tail() {
    let store = Arc::new(MemoryBlobStore::new());
    let source = Arc::new(ScriptedSource::new(vec![record(
        "npm/npmjs/-/a/1.0.0",
        "2023-01-01T10:15:00Z",
    )]));

    let coordinator = coordinator(source.clone(), store.clone(), 4);
    coordinator.run(ts("2023-02-01T00:00:00Z")).await.unwrap();
    coordinator.run(ts("2023-02-01T00:30:00Z")).await.unwrap();

    let windows = source.windows();
    assert_eq!(windows[0], QueryWindow::Bootstrap);
    assert_eq!(
        windows[1],
        QueryWindow::CatchUp {
            lower: ts("2023-01-01T10:00:00Z"),
            upper: ts("2023-02-01T00:00:00Z"),
        }
    );
}

#[tokio::test]
async fn test_idempotence_with_no_new_data() {
    let store = Arc::new(MemoryBlobStore::new());
    let source = Arc::new(ScriptedSource::new(vec![
        record("npm/npmjs/-/a/1.0.0", "2023-01-01T10:05:00Z"),
        record("npm/npmjs/-/b/2.0.0", "2023-01-01T10:20:00Z"),
        record("npm/npmjs/-/c/3.0.0", "2023-01-01T11:40:00Z"),
    ]));

    // Serialized processing keeps partition list order deterministic
    let coordinator = coordinator(source, store.clone(), 1);

    coordinator.run(ts("2023-02-01T00:00:00Z")).await.unwrap();
    let after_first = store_contents(&store).await;

    coordinator.run(ts("2023-02-01T01:00:00Z")).await.unwrap();
    let after_second = store_contents(&store).await;

    assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn test_in_progress_hour_is_excluded() {
    let store = Arc::new(MemoryBlobStore::new());
    // Prior progress: the index already covers up to 2022-12-31-23
    store
        .put(INDEX_BLOB, b"2022-12-31-23".to_vec())
        .await
        .unwrap();

    let source = Arc::new(ScriptedSource::new(vec![
        record("npm/npmjs/-/a/1.0.0", "2023-01-01T00:00:00Z"),
        record("npm/npmjs/-/b/2.0.0", "2023-01-01T01:01:00Z"),
    ]));

    let summary = coordinator(source, store.clone(), 4)
        .run(ts("2023-01-01T01:03:00Z"))
        .await
        .unwrap();

    // Only the closed 00 hour is flushed; the in-progress 01 hour waits
    assert_eq!(summary.mirrored, 1);
    assert!(store.get("changes/2023-01-01-00").await.unwrap().is_some());
    assert!(store.get("changes/2023-01-01-01").await.unwrap().is_none());
    assert!(store.get("npm/npmjs/-/b/2.0.0.json").await.unwrap().is_none());

    let index = store.get(INDEX_BLOB).await.unwrap().unwrap();
    assert_eq!(index, b"2022-12-31-23\n2023-01-01-00");
}

#[tokio::test]
async fn test_index_grows_monotonically() {
    let store = Arc::new(MemoryBlobStore::new());
    let source = Arc::new(ScriptedSource::new(vec![
        record("npm/npmjs/-/a/1.0.0", "2023-01-01T10:05:00Z"),
        record("npm/npmjs/-/b/2.0.0", "2023-01-01T11:20:00Z"),
        record("npm/npmjs/-/c/3.0.0", "2023-01-01T12:40:00Z"),
    ]));

    let coordinator = coordinator(source, store.clone(), 4);
    let mut previous: Vec<String> = Vec::new();

    for now in [
        "2023-01-01T11:30:00Z",
        "2023-01-01T12:30:00Z",
        "2023-01-02T00:00:00Z",
    ] {
        coordinator.run(ts(now)).await.unwrap();

        let index = store.get(INDEX_BLOB).await.unwrap().unwrap();
        let entries: Vec<String> = String::from_utf8(index)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();

        let mut sorted = entries.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(entries, sorted, "index must stay sorted and duplicate-free");
        assert!(
            previous.iter().all(|entry| entries.contains(entry)),
            "index must be a superset of its previous value"
        );
        previous = entries;
    }

    assert_eq!(
        previous,
        vec!["2023-01-01-10", "2023-01-01-11", "2023-01-01-12"]
    );
}

#[tokio::test]
async fn test_same_hour_records_share_a_partition() {
    let store = Arc::new(MemoryBlobStore::new());
    let source = Arc::new(ScriptedSource::new(vec![
        record("npm/npmjs/-/a/1.0.0", "2023-01-02T00:05:00Z"),
        record("npm/npmjs/-/b/2.0.0", "2023-01-02T00:00:00Z"),
    ]));

    coordinator(source, store.clone(), 4)
        .run(ts("2023-02-01T00:00:00Z"))
        .await
        .unwrap();

    let list = store.get("changes/2023-01-02-00").await.unwrap().unwrap();
    let mut names: Vec<String> = String::from_utf8(list)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    names.sort();

    assert_eq!(
        names,
        vec!["npm/npmjs/-/a/1.0.0.json", "npm/npmjs/-/b/2.0.0.json"]
    );
}

#[tokio::test]
async fn test_record_without_identifier_is_skipped() {
    let store = Arc::new(MemoryBlobStore::new());
    let source = Arc::new(ScriptedSource::new(vec![
        ChangeRecord::new(json!({
            "_meta": { "updated": "2023-01-02T00:10:00Z" }
        })),
        record("npm/npmjs/-/good/1.0.0", "2023-01-02T00:05:00Z"),
    ]));

    let summary = coordinator(source, store.clone(), 4)
        .run(ts("2023-02-01T00:00:00Z"))
        .await
        .unwrap();

    assert_eq!(summary.mirrored, 1);
    assert_eq!(summary.skipped, 1);

    // The bad record produced no upload and no changeset entry
    let list = store.get("changes/2023-01-02-00").await.unwrap().unwrap();
    assert_eq!(list, b"npm/npmjs/-/good/1.0.0.json");
    assert_eq!(store.keys().len(), 3); // mirror + change list + index
}

#[tokio::test]
async fn test_retry_exhaustion_fails_the_run() {
    let store = Arc::new(MemoryBlobStore::new());
    let attempts = Arc::new(AtomicU64::new(0));
    let source = Arc::new(FailingSource {
        attempts: Arc::clone(&attempts),
    });

    let err = coordinator(source, store.clone(), 4)
        .run(ts("2023-02-01T00:00:00Z"))
        .await
        .unwrap_err();

    assert!(err.is_transient());
    // Three backoff delays allow exactly four attempts
    assert_eq!(attempts.load(Ordering::SeqCst), 4);
    assert!(store.get(INDEX_BLOB).await.unwrap().is_none());
}
