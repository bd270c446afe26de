//! Backup artifact storage protocol.
//!
//! A backup is written as three objects (see [`crate::keys`]): metadata
//! first, then the data archive, then the log. Object storage has no
//! transactions, so each step has its own failure rule:
//!
//! - metadata write fails: nothing was written, the error is returned as is;
//! - archive write fails: the metadata object is deleted again and the
//!   returned aggregate holds the write error plus any rollback error;
//! - log write fails: reported through tracing and metrics only.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::error::{aggregate, StorageError};
use crate::keys::{backup_key, log_key, metadata_key, BackupKeys, PREFIX_DELIMITER};
use crate::metrics::StorageMetrics;
use crate::record::{decode_backup, BackupRecord};
use crate::storage::{collect_stream, ObjectStorageAdapter, ObjectStream};
use crate::Result;

/// Lists backups in object storage.
#[async_trait]
pub trait BackupGetter: Send + Sync {
    /// All backups present in `bucket`, ordered by name.
    async fn get_all_backups(&self, bucket: &str) -> Result<Vec<BackupRecord>>;
}

/// Stores, retrieves and removes backup artifacts in object storage.
#[async_trait]
pub trait BackupService: BackupGetter {
    /// Upload the metadata, archive and log objects of a backup.
    async fn upload_backup(
        &self,
        bucket: &str,
        backup_name: &str,
        metadata: Bytes,
        backup: Bytes,
        log: Bytes,
    ) -> Result<()>;

    /// Open the data archive of a backup.
    async fn download_backup(&self, bucket: &str, backup_name: &str) -> Result<ObjectStream>;

    /// Delete the archive and metadata objects of a backup.
    async fn delete_backup(&self, bucket: &str, backup_name: &str) -> Result<()>;

    /// Pre-signed download URL for the backup's log, valid for `ttl`.
    async fn create_backup_log_signed_url(
        &self,
        bucket: &str,
        backup_name: &str,
        ttl: Duration,
    ) -> Result<String>;

    /// Pre-signed download URL for the backup's data archive, valid for `ttl`.
    async fn create_backup_signed_url(
        &self,
        bucket: &str,
        backup_name: &str,
        ttl: Duration,
    ) -> Result<String>;
}

/// [`BackupService`] backed directly by an object storage adapter.
///
/// Holds no state besides the adapter. Concurrent uploads of the same backup
/// name are not coordinated; the last write of each object wins.
pub struct ObjectBackupService {
    adapter: Arc<dyn ObjectStorageAdapter>,
    metrics: Option<Arc<StorageMetrics>>,
}

impl ObjectBackupService {
    /// Create a backup service over the given adapter
    pub fn new(adapter: Arc<dyn ObjectStorageAdapter>) -> Self {
        Self {
            adapter,
            metrics: None,
        }
    }

    /// Report swallowed log upload failures to `metrics`
    pub fn with_metrics(mut self, metrics: Arc<StorageMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn adapter(&self) -> &Arc<dyn ObjectStorageAdapter> {
        &self.adapter
    }

    /// Fetch and decode a single backup's metadata.
    ///
    /// Fails with `StorageError::NotFound` naming the archive key when the
    /// metadata exists without its data archive.
    pub async fn get_backup(&self, bucket: &str, backup_name: &str) -> Result<BackupRecord> {
        let key = metadata_key(backup_name);
        let stream = self.adapter.get_object(bucket, &key).await?;
        let data = collect_stream(stream).await?;
        let record = decode_backup(bucket, &key, &data)?;

        let archive = backup_key(backup_name);
        if !self.adapter.object_exists(bucket, &archive).await? {
            warn!(
                "Backup {} in bucket {} has metadata but no data archive",
                backup_name, bucket
            );
            return Err(StorageError::NotFound(archive).into());
        }

        Ok(record)
    }
}

#[async_trait]
impl BackupGetter for ObjectBackupService {
    async fn get_all_backups(&self, bucket: &str) -> Result<Vec<BackupRecord>> {
        let prefixes = self
            .adapter
            .list_common_prefixes(bucket, PREFIX_DELIMITER)
            .await?;
        if prefixes.is_empty() {
            return Ok(Vec::new());
        }

        // All or nothing: one bad candidate fails the whole listing
        let mut backups = Vec::with_capacity(prefixes.len());
        for backup_name in &prefixes {
            backups.push(self.get_backup(bucket, backup_name).await?);
        }

        debug!("Found {} backups in bucket {}", backups.len(), bucket);
        Ok(backups)
    }
}

#[async_trait]
impl BackupService for ObjectBackupService {
    async fn upload_backup(
        &self,
        bucket: &str,
        backup_name: &str,
        metadata: Bytes,
        backup: Bytes,
        log: Bytes,
    ) -> Result<()> {
        let keys = BackupKeys::for_backup(backup_name);

        // Nothing to roll back if the metadata write fails
        self.adapter
            .put_object(bucket, &keys.metadata, metadata)
            .await?;

        if let Err(put_err) = self.adapter.put_object(bucket, &keys.backup, backup).await {
            warn!(
                "Uploading {}/{} failed, removing {}/{}: {}",
                bucket, keys.backup, bucket, keys.metadata, put_err
            );

            let mut errors = vec![put_err];
            if let Err(delete_err) = self.adapter.delete_object(bucket, &keys.metadata).await {
                error!(
                    "Rollback of {}/{} failed, metadata object may be orphaned: {}",
                    bucket, keys.metadata, delete_err
                );
                errors.push(delete_err);
            }
            return aggregate(errors);
        }

        if let Err(e) = self.adapter.put_object(bucket, &keys.log, log).await {
            error!("Error uploading {}/{}: {}", bucket, keys.log, e);
            if let Some(metrics) = &self.metrics {
                metrics.inc_log_upload_failure(bucket);
            }
        }

        info!("Uploaded backup {} to bucket {}", backup_name, bucket);
        Ok(())
    }

    async fn download_backup(&self, bucket: &str, backup_name: &str) -> Result<ObjectStream> {
        self.adapter
            .get_object(bucket, &backup_key(backup_name))
            .await
    }

    async fn delete_backup(&self, bucket: &str, backup_name: &str) -> Result<()> {
        let mut errors = Vec::new();

        for key in [backup_key(backup_name), metadata_key(backup_name)] {
            debug!("Trying to delete bucket={}, key={}", bucket, key);
            if let Err(e) = self.adapter.delete_object(bucket, &key).await {
                warn!("Error deleting {}/{}: {}", bucket, key, e);
                errors.push(e);
            }
        }

        aggregate(errors)
    }

    async fn create_backup_log_signed_url(
        &self,
        bucket: &str,
        backup_name: &str,
        ttl: Duration,
    ) -> Result<String> {
        self.adapter
            .create_signed_url(bucket, &log_key(backup_name), ttl)
            .await
    }

    async fn create_backup_signed_url(
        &self,
        bucket: &str,
        backup_name: &str,
        ttl: Duration,
    ) -> Result<String> {
        self.adapter
            .create_signed_url(bucket, &backup_key(backup_name), ttl)
            .await
    }
}
