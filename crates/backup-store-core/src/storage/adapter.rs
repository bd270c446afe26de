//! Object storage adapter trait definition.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use std::time::Duration;

use crate::Result;

/// A readable object body.
pub type ObjectStream = BoxStream<'static, Result<Bytes>>;

/// Wrap an in-memory body as an [`ObjectStream`].
pub fn stream_from_bytes(data: Bytes) -> ObjectStream {
    futures::stream::once(async move { Ok(data) }).boxed()
}

/// Read an [`ObjectStream`] to the end.
pub async fn collect_stream(stream: ObjectStream) -> Result<Bytes> {
    let chunks: Vec<Bytes> = stream.try_collect().await?;
    if chunks.len() == 1 {
        return Ok(chunks.into_iter().next().unwrap_or_default());
    }
    Ok(Bytes::from(chunks.concat()))
}

/// Capability interface for an object-storage service.
///
/// Every call is scoped to one bucket. Implementations must:
/// - report a missing key on `get_object` as `StorageError::NotFound`,
/// - treat deleting a missing key as success,
/// - return common prefixes without the trailing delimiter, sorted ascending.
#[async_trait]
pub trait ObjectStorageAdapter: Send + Sync {
    /// Write an object, replacing any existing one
    async fn put_object(&self, bucket: &str, key: &str, data: Bytes) -> Result<()>;

    /// Open an object for reading
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectStream>;

    /// Delete an object
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;

    /// Check whether an object exists
    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool>;

    /// List the distinct first path segments at the bucket root
    async fn list_common_prefixes(&self, bucket: &str, delimiter: &str) -> Result<Vec<String>>;

    /// Create a time-limited download URL for an object
    async fn create_signed_url(&self, bucket: &str, key: &str, ttl: Duration) -> Result<String>;
}
