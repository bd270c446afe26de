//! Listing cache behaviour over real backup services.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backup_store_core::storage::{collect_stream, MemoryAdapter, ObjectStorageAdapter};
use backup_store_core::{
    BackupCache, BackupGetter, BackupRecord, BackupService, CachedBackupService,
    ObjectBackupService, Result,
};
use parking_lot::Mutex;
use tokio::sync::{broadcast, Semaphore};

use super::helpers::{archive, log, metadata_json, names, FaultyAdapter, Op};

const BUCKET: &str = "ark-backups";
const RESYNC: Duration = Duration::from_secs(30);

/// Let the refresh task run until it blocks again.
async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

async fn seed(adapter: &Arc<dyn ObjectStorageAdapter>, name: &str) {
    ObjectBackupService::new(adapter.clone())
        .upload_backup(BUCKET, name, metadata_json(name), archive(name), log(name))
        .await
        .unwrap();
}

fn cached(
    adapter: Arc<dyn ObjectStorageAdapter>,
    shutdown: broadcast::Receiver<()>,
) -> CachedBackupService {
    let service: Arc<dyn BackupService> = Arc::new(ObjectBackupService::new(adapter));
    CachedBackupService::new(service, vec![BUCKET.to_string()], RESYNC, shutdown, None)
}

/// Getter whose refreshes each wait for one permit before answering.
struct GatedGetter {
    gate: Semaphore,
    backups: Mutex<Vec<BackupRecord>>,
}

impl GatedGetter {
    fn new(names: &[&str]) -> Self {
        Self {
            gate: Semaphore::new(0),
            backups: Mutex::new(names.iter().map(|n| BackupRecord::new(*n)).collect()),
        }
    }

    fn set(&self, names: &[&str]) {
        *self.backups.lock() = names.iter().map(|n| BackupRecord::new(*n)).collect();
    }
}

#[async_trait]
impl BackupGetter for GatedGetter {
    async fn get_all_backups(&self, _bucket: &str) -> Result<Vec<BackupRecord>> {
        self.gate.acquire().await.unwrap().forget();
        Ok(self.backups.lock().clone())
    }
}

#[tokio::test(start_paused = true)]
async fn test_listing_lags_writes_by_one_period() {
    let adapter: Arc<dyn ObjectStorageAdapter> = Arc::new(MemoryAdapter::new());
    seed(&adapter, "a").await;
    let (_tx, rx) = broadcast::channel(1);
    let service = cached(adapter, rx);

    settle().await;
    assert_eq!(names(&service.get_all_backups(BUCKET).await.unwrap()), vec!["a"]);

    service
        .upload_backup(BUCKET, "b", metadata_json("b"), archive("b"), log("b"))
        .await
        .unwrap();
    assert_eq!(names(&service.get_all_backups(BUCKET).await.unwrap()), vec!["a"]);

    tokio::time::advance(RESYNC).await;
    settle().await;
    assert_eq!(
        names(&service.get_all_backups(BUCKET).await.unwrap()),
        vec!["a", "b"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_reads_see_old_snapshot_during_refresh() {
    let getter = Arc::new(GatedGetter::new(&["a"]));
    let (_tx, rx) = broadcast::channel(1);
    let cache = BackupCache::new(getter.clone(), vec![BUCKET.to_string()], RESYNC, rx, None);

    // First refresh is waiting on the gate
    settle().await;
    assert!(cache.backups(BUCKET).is_empty());

    getter.gate.add_permits(1);
    settle().await;
    let first = cache.snapshot(BUCKET).unwrap();
    assert_eq!(names(&first.backups), vec!["a"]);

    getter.set(&["a", "b"]);
    tokio::time::advance(RESYNC).await;
    settle().await;

    // Second refresh is in flight; readers keep the whole old list
    assert!(Arc::ptr_eq(&first, &cache.snapshot(BUCKET).unwrap()));
    assert_eq!(names(&cache.backups(BUCKET)), vec!["a"]);

    getter.gate.add_permits(1);
    settle().await;
    assert_eq!(names(&cache.backups(BUCKET)), vec!["a", "b"]);
}

#[tokio::test(start_paused = true)]
async fn test_reads_never_fail_when_listing_fails() {
    let faulty = Arc::new(FaultyAdapter::new());
    let adapter: Arc<dyn ObjectStorageAdapter> = faulty.clone();
    seed(&adapter, "a").await;
    faulty.fail(Op::List, BUCKET);

    let (_tx, rx) = broadcast::channel(1);
    let service = cached(adapter, rx);
    settle().await;
    assert!(service.get_all_backups(BUCKET).await.unwrap().is_empty());

    faulty.heal(Op::List, BUCKET);
    tokio::time::advance(RESYNC).await;
    settle().await;
    assert_eq!(names(&service.get_all_backups(BUCKET).await.unwrap()), vec!["a"]);

    // A later failure keeps the last good listing
    faulty.fail(Op::Get, "a/ark-backup.json");
    tokio::time::advance(RESYNC).await;
    settle().await;
    assert_eq!(names(&service.get_all_backups(BUCKET).await.unwrap()), vec!["a"]);
}

#[tokio::test(start_paused = true)]
async fn test_writes_bypass_cache() {
    let adapter: Arc<dyn ObjectStorageAdapter> = Arc::new(MemoryAdapter::new());
    seed(&adapter, "a").await;
    let (_tx, rx) = broadcast::channel(1);
    let service = cached(adapter.clone(), rx);
    settle().await;

    let stream = service.download_backup(BUCKET, "a").await.unwrap();
    assert_eq!(collect_stream(stream).await.unwrap(), archive("a"));

    service.delete_backup(BUCKET, "a").await.unwrap();
    assert!(!adapter.object_exists(BUCKET, "a/a.tar.gz").await.unwrap());
    assert!(!adapter.object_exists(BUCKET, "a/ark-backup.json").await.unwrap());

    // Listing still shows the deleted backup until the next refresh
    assert_eq!(names(&service.get_all_backups(BUCKET).await.unwrap()), vec!["a"]);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_bucket_is_tracked_on_read() {
    let adapter: Arc<dyn ObjectStorageAdapter> = Arc::new(MemoryAdapter::new());
    ObjectBackupService::new(adapter.clone())
        .upload_backup("other", "x", metadata_json("x"), archive("x"), log("x"))
        .await
        .unwrap();
    let (_tx, rx) = broadcast::channel(1);
    let service = cached(adapter, rx);
    settle().await;

    assert!(service.get_all_backups("other").await.unwrap().is_empty());
    assert!(service.cache().buckets().contains(&"other".to_string()));

    tokio::time::advance(RESYNC).await;
    settle().await;
    assert_eq!(names(&service.get_all_backups("other").await.unwrap()), vec!["x"]);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_refresh_task() {
    let adapter: Arc<dyn ObjectStorageAdapter> = Arc::new(MemoryAdapter::new());
    seed(&adapter, "a").await;
    let (tx, rx) = broadcast::channel(1);
    let service = cached(adapter.clone(), rx);
    settle().await;

    tx.send(()).unwrap();
    settle().await;
    assert!(service.cache().is_stopped());

    seed(&adapter, "b").await;
    tokio::time::advance(RESYNC * 3).await;
    settle().await;
    assert_eq!(names(&service.get_all_backups(BUCKET).await.unwrap()), vec!["a"]);
}
