//! Object storage adapters.
//!
//! This module defines the [`ObjectStorageAdapter`] capability the backup
//! service is written against, and its implementations:
//!
//! - **S3**: AWS S3 and S3-compatible services (MinIO, Ceph RGW, etc.)
//! - **Filesystem**: Local directories, one per bucket
//! - **Memory**: In-memory storage (for testing)

mod adapter;
mod config;
mod filesystem;
mod memory;
mod s3;
mod store_ops;

pub(crate) use store_ops::check_bucket;

pub use adapter::{collect_stream, stream_from_bytes, ObjectStorageAdapter, ObjectStream};
pub use config::StorageBackendConfig;
pub use filesystem::FilesystemAdapter;
pub use memory::MemoryAdapter;
pub use s3::{S3Adapter, S3Config};

use crate::Result;
use std::sync::Arc;

/// Create a storage adapter from configuration.
///
/// # Example
///
/// ```rust,ignore
/// use backup_store_core::storage::{create_adapter, StorageBackendConfig};
///
/// let adapter = create_adapter(&StorageBackendConfig::Memory)?;
/// ```
pub fn create_adapter(config: &StorageBackendConfig) -> Result<Arc<dyn ObjectStorageAdapter>> {
    match config {
        StorageBackendConfig::S3 {
            region,
            endpoint,
            access_key,
            secret_key,
            allow_http,
        } => {
            let s3_config = S3Config {
                region: region.clone(),
                endpoint: endpoint.clone(),
                access_key_id: access_key.clone(),
                secret_access_key: secret_key.clone(),
                allow_http: *allow_http,
            };
            Ok(Arc::new(S3Adapter::new(s3_config)))
        }

        StorageBackendConfig::Filesystem { path } => {
            Ok(Arc::new(FilesystemAdapter::new(path.clone())))
        }

        StorageBackendConfig::Memory => Ok(Arc::new(MemoryAdapter::new())),
    }
}
