//! Periodically refreshed backup listing.
//!
//! [`BackupCache`] wraps any [`BackupGetter`] and answers
//! `get_all_backups` from an in-memory snapshot per bucket. A single
//! background task refreshes every tracked bucket, sleeps for the resync
//! period, and repeats until the shutdown channel fires.
//!
//! Reads never touch the network and never fail. Before the first successful
//! refresh of a bucket they return an empty list; after a failed refresh they
//! keep returning the previous snapshot.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::service::{BackupGetter, BackupService};
use crate::metrics::StorageMetrics;
use crate::record::BackupRecord;
use crate::storage::{check_bucket, ObjectStream};
use crate::Result;

/// Immutable result of one successful refresh of a bucket.
#[derive(Debug, Clone)]
pub struct BackupSnapshot {
    pub bucket: String,
    pub backups: Vec<BackupRecord>,
    pub refreshed_at: DateTime<Utc>,
}

/// State shared between readers and the refresh task.
///
/// The refresh task is the only writer of `snapshots`; it swaps whole
/// `Arc`s, so a reader sees either the old or the new list, never a mix.
#[derive(Default)]
struct CacheState {
    snapshots: RwLock<HashMap<String, Arc<BackupSnapshot>>>,
    buckets: RwLock<Vec<String>>,
}

impl CacheState {
    /// Add `bucket` to the refresh list. Returns false when it was already
    /// tracked or is not a valid bucket name.
    fn track(&self, bucket: &str) -> bool {
        if let Err(e) = check_bucket(bucket) {
            warn!("Backup cache not tracking bucket: {}", e);
            return false;
        }
        if self.buckets.read().iter().any(|b| b == bucket) {
            return false;
        }
        let mut buckets = self.buckets.write();
        if buckets.iter().any(|b| b == bucket) {
            return false;
        }
        buckets.push(bucket.to_string());
        true
    }

    fn tracked_buckets(&self) -> Vec<String> {
        self.buckets.read().clone()
    }

    fn snapshot(&self, bucket: &str) -> Option<Arc<BackupSnapshot>> {
        self.snapshots.read().get(bucket).cloned()
    }

    fn replace(&self, snapshot: BackupSnapshot) {
        self.snapshots
            .write()
            .insert(snapshot.bucket.clone(), Arc::new(snapshot));
    }
}

/// Caching [`BackupGetter`] with a background refresh task.
///
/// Dropping the cache aborts its refresh task.
pub struct BackupCache {
    state: Arc<CacheState>,
    resync_period: Duration,
    handle: JoinHandle<()>,
}

impl BackupCache {
    /// Start caching `buckets` from `delegate`.
    ///
    /// The first refresh runs as soon as the task is scheduled; later ones
    /// start `resync_period` after the previous one finished. The task stops
    /// when `shutdown` receives a message or all of its senders are dropped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        delegate: Arc<dyn BackupGetter>,
        buckets: impl IntoIterator<Item = String>,
        resync_period: Duration,
        shutdown: broadcast::Receiver<()>,
        metrics: Option<Arc<StorageMetrics>>,
    ) -> Self {
        let state = Arc::new(CacheState::default());
        for bucket in buckets {
            state.track(&bucket);
        }

        let handle = tokio::spawn(refresh_loop(
            delegate,
            Arc::clone(&state),
            resync_period,
            shutdown,
            metrics,
        ));

        Self {
            state,
            resync_period,
            handle,
        }
    }

    /// Current backups in `bucket`, copied out of the snapshot.
    ///
    /// An untracked bucket is tracked from now on and picked up by the next
    /// refresh cycle; until then it reads as empty. Invalid bucket names are
    /// never tracked and always read as empty.
    pub fn backups(&self, bucket: &str) -> Vec<BackupRecord> {
        match self.state.snapshot(bucket) {
            Some(snapshot) => snapshot.backups.clone(),
            None => {
                if self.state.track(bucket) {
                    info!("Backup cache now tracking bucket {}", bucket);
                }
                Vec::new()
            }
        }
    }

    /// The current snapshot for `bucket`, if one has been taken.
    pub fn snapshot(&self, bucket: &str) -> Option<Arc<BackupSnapshot>> {
        self.state.snapshot(bucket)
    }

    /// Buckets refreshed by the background task.
    pub fn buckets(&self) -> Vec<String> {
        self.state.tracked_buckets()
    }

    pub fn resync_period(&self) -> Duration {
        self.resync_period
    }

    /// Whether the refresh task has exited.
    pub fn is_stopped(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for BackupCache {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[async_trait]
impl BackupGetter for BackupCache {
    async fn get_all_backups(&self, bucket: &str) -> Result<Vec<BackupRecord>> {
        Ok(self.backups(bucket))
    }
}

async fn refresh_loop(
    delegate: Arc<dyn BackupGetter>,
    state: Arc<CacheState>,
    resync_period: Duration,
    mut shutdown: broadcast::Receiver<()>,
    metrics: Option<Arc<StorageMetrics>>,
) {
    info!(
        "Backup cache refresh started, resync period {:?}",
        resync_period
    );

    loop {
        for bucket in state.tracked_buckets() {
            tokio::select! {
                result = delegate.get_all_backups(&bucket) => {
                    apply_refresh(&state, &bucket, result, metrics.as_deref());
                }
                _ = shutdown.recv() => {
                    info!("Backup cache refresh stopped");
                    return;
                }
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(resync_period) => {}
            _ = shutdown.recv() => {
                info!("Backup cache refresh stopped");
                return;
            }
        }
    }
}

fn apply_refresh(
    state: &CacheState,
    bucket: &str,
    result: Result<Vec<BackupRecord>>,
    metrics: Option<&StorageMetrics>,
) {
    match result {
        Ok(backups) => {
            debug!(
                "Refreshed backup cache for bucket {}: {} backups",
                bucket,
                backups.len()
            );
            if let Some(metrics) = metrics {
                metrics.record_refresh_success(bucket, backups.len());
            }
            state.replace(BackupSnapshot {
                bucket: bucket.to_string(),
                backups,
                refreshed_at: Utc::now(),
            });
        }
        Err(e) => {
            warn!(
                "Error refreshing backup cache for bucket {}, keeping previous snapshot: {}",
                bucket, e
            );
            if let Some(metrics) = metrics {
                metrics.record_refresh_failure(bucket);
            }
        }
    }
}

/// [`BackupService`] whose listing is served by a [`BackupCache`].
///
/// Uploads, downloads, deletes and signed URLs go straight to the wrapped
/// service.
pub struct CachedBackupService {
    service: Arc<dyn BackupService>,
    cache: BackupCache,
}

impl CachedBackupService {
    /// Wrap `service`, caching the listing of `buckets`.
    pub fn new(
        service: Arc<dyn BackupService>,
        buckets: impl IntoIterator<Item = String>,
        resync_period: Duration,
        shutdown: broadcast::Receiver<()>,
        metrics: Option<Arc<StorageMetrics>>,
    ) -> Self {
        let delegate: Arc<dyn BackupGetter> = Arc::new(ServiceGetter(Arc::clone(&service)));
        let cache = BackupCache::new(delegate, buckets, resync_period, shutdown, metrics);
        Self { service, cache }
    }

    pub fn cache(&self) -> &BackupCache {
        &self.cache
    }
}

/// Exposes only the listing of a shared service to the cache.
struct ServiceGetter(Arc<dyn BackupService>);

#[async_trait]
impl BackupGetter for ServiceGetter {
    async fn get_all_backups(&self, bucket: &str) -> Result<Vec<BackupRecord>> {
        self.0.get_all_backups(bucket).await
    }
}

#[async_trait]
impl BackupGetter for CachedBackupService {
    async fn get_all_backups(&self, bucket: &str) -> Result<Vec<BackupRecord>> {
        self.cache.get_all_backups(bucket).await
    }
}

#[async_trait]
impl BackupService for CachedBackupService {
    async fn upload_backup(
        &self,
        bucket: &str,
        backup_name: &str,
        metadata: bytes::Bytes,
        backup: bytes::Bytes,
        log: bytes::Bytes,
    ) -> Result<()> {
        self.service
            .upload_backup(bucket, backup_name, metadata, backup, log)
            .await
    }

    async fn download_backup(&self, bucket: &str, backup_name: &str) -> Result<ObjectStream> {
        self.service.download_backup(bucket, backup_name).await
    }

    async fn delete_backup(&self, bucket: &str, backup_name: &str) -> Result<()> {
        self.service.delete_backup(bucket, backup_name).await
    }

    async fn create_backup_log_signed_url(
        &self,
        bucket: &str,
        backup_name: &str,
        ttl: Duration,
    ) -> Result<String> {
        self.service
            .create_backup_log_signed_url(bucket, backup_name, ttl)
            .await
    }

    async fn create_backup_signed_url(
        &self,
        bucket: &str,
        backup_name: &str,
        ttl: Duration,
    ) -> Result<String> {
        self.service
            .create_backup_signed_url(bucket, backup_name, ttl)
            .await
    }
}
