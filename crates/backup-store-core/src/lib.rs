//! Backup Store Core Library
//!
//! Persistence and listing layer for cluster backups kept in object storage:
//! the backup key layout, the multi-object upload protocol with rollback,
//! and a periodically refreshed cache of all backups in a bucket.

pub mod backup;
pub mod config;
pub mod error;
pub mod keys;
pub mod metrics;
pub mod record;
pub mod storage;

pub use backup::{
    BackupCache, BackupGetter, BackupService, BackupSnapshot, CachedBackupService, ItemAction,
    ObjectBackupService,
};
pub use config::{CacheConfig, Config};
pub use error::{AggregateError, Error, Result, StorageError};
pub use keys::BackupKeys;
pub use metrics::StorageMetrics;
pub use record::{BackupPhase, BackupRecord};
pub use storage::{create_adapter, ObjectStorageAdapter, StorageBackendConfig};
