//! In-memory storage adapter for testing.

use async_trait::async_trait;
use bytes::Bytes;
use object_store::memory::InMemory;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::adapter::{ObjectStorageAdapter, ObjectStream};
use super::store_ops;
use crate::error::StorageError;
use crate::Result;

/// In-memory storage adapter using object_store
///
/// Each bucket is a separate `InMemory` store, created on first use. Nothing
/// persists between runs, so this adapter is primarily useful for tests and
/// dry runs.
#[derive(Default)]
pub struct MemoryAdapter {
    buckets: RwLock<HashMap<String, Arc<InMemory>>>,
}

impl MemoryAdapter {
    /// Create a new in-memory storage adapter
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self, bucket: &str) -> Result<Arc<InMemory>> {
        store_ops::check_bucket(bucket)?;

        if let Some(store) = self.buckets.read().get(bucket) {
            return Ok(Arc::clone(store));
        }

        let mut buckets = self.buckets.write();
        let store = buckets
            .entry(bucket.to_string())
            .or_insert_with(|| Arc::new(InMemory::new()));
        Ok(Arc::clone(store))
    }
}

#[async_trait]
impl ObjectStorageAdapter for MemoryAdapter {
    async fn put_object(&self, bucket: &str, key: &str, data: Bytes) -> Result<()> {
        let store = self.store(bucket)?;
        store_ops::put(store.as_ref(), bucket, key, data).await
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectStream> {
        let store = self.store(bucket)?;
        store_ops::get(store.as_ref(), bucket, key).await
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let store = self.store(bucket)?;
        store_ops::delete(store.as_ref(), bucket, key).await
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool> {
        let store = self.store(bucket)?;
        store_ops::exists(store.as_ref(), bucket, key).await
    }

    async fn list_common_prefixes(&self, bucket: &str, delimiter: &str) -> Result<Vec<String>> {
        let store = self.store(bucket)?;
        store_ops::list_common_prefixes(store.as_ref(), bucket, delimiter).await
    }

    async fn create_signed_url(&self, bucket: &str, key: &str, _ttl: Duration) -> Result<String> {
        Err(StorageError::Unsupported(format!(
            "signed URLs are not available for in-memory object {}/{}",
            bucket, key
        ))
        .into())
    }
}
