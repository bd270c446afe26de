//! Filesystem storage adapter implementation.

use async_trait::async_trait;
use bytes::Bytes;
use object_store::local::LocalFileSystem;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;

use super::adapter::{ObjectStorageAdapter, ObjectStream};
use super::store_ops;
use crate::error::StorageError;
use crate::Result;

/// Filesystem-based storage adapter
///
/// Buckets are directories directly under the base path; object keys map to
/// files below them.
pub struct FilesystemAdapter {
    base_path: PathBuf,
    buckets: RwLock<HashMap<String, Arc<LocalFileSystem>>>,
}

impl FilesystemAdapter {
    /// Create a new filesystem adapter with the given base path
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            buckets: RwLock::new(HashMap::new()),
        }
    }

    pub fn base_path(&self) -> &std::path::Path {
        &self.base_path
    }

    async fn store(&self, bucket: &str) -> Result<Arc<LocalFileSystem>> {
        store_ops::check_bucket(bucket)?;

        let cached = self.buckets.read().get(bucket).cloned();
        if let Some(store) = cached {
            return Ok(store);
        }

        let root = self.base_path.join(bucket);
        fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::Backend(format!(
                "Failed to create bucket directory {}: {}",
                root.display(),
                e
            ))
        })?;

        // Empty backup directories would otherwise still list as prefixes
        let store = LocalFileSystem::new_with_prefix(&root)
            .map_err(|e| {
                StorageError::Backend(format!(
                    "Failed to open bucket directory {}: {}",
                    root.display(),
                    e
                ))
            })?
            .with_automatic_cleanup(true);

        let mut buckets = self.buckets.write();
        let store = buckets
            .entry(bucket.to_string())
            .or_insert_with(|| Arc::new(store));
        Ok(Arc::clone(store))
    }
}

#[async_trait]
impl ObjectStorageAdapter for FilesystemAdapter {
    async fn put_object(&self, bucket: &str, key: &str, data: Bytes) -> Result<()> {
        let store = self.store(bucket).await?;
        store_ops::put(store.as_ref(), bucket, key, data).await
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectStream> {
        let store = self.store(bucket).await?;
        store_ops::get(store.as_ref(), bucket, key).await
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let store = self.store(bucket).await?;
        store_ops::delete(store.as_ref(), bucket, key).await
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool> {
        let store = self.store(bucket).await?;
        store_ops::exists(store.as_ref(), bucket, key).await
    }

    async fn list_common_prefixes(&self, bucket: &str, delimiter: &str) -> Result<Vec<String>> {
        let store = self.store(bucket).await?;
        store_ops::list_common_prefixes(store.as_ref(), bucket, delimiter).await
    }

    async fn create_signed_url(&self, bucket: &str, key: &str, _ttl: Duration) -> Result<String> {
        Err(StorageError::Unsupported(format!(
            "signed URLs are not available for filesystem object {}/{}",
            bucket, key
        ))
        .into())
    }
}
