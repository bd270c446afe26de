//! Instrumented storage adapter decorator.
//!
//! Wraps any `ObjectStorageAdapter` and records latency and errors for every
//! call. Results, including not-found errors, are returned unchanged.

use async_trait::async_trait;
use bytes::Bytes;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::labels::{AdapterOperation, ErrorType, ObjectRole};
use super::registry::StorageMetrics;
use crate::storage::{ObjectStorageAdapter, ObjectStream, StorageBackendConfig};
use crate::Result;

/// A storage adapter wrapper that records metrics for all operations.
///
/// # Example
///
/// ```rust,ignore
/// let metrics = Arc::new(StorageMetrics::new());
/// let adapter = create_instrumented_adapter(&StorageBackendConfig::Memory, metrics)?;
/// ```
pub struct InstrumentedAdapter {
    /// The wrapped adapter.
    inner: Arc<dyn ObjectStorageAdapter>,

    /// The backend name for metric labels (s3, filesystem, memory).
    backend_name: String,

    metrics: Arc<StorageMetrics>,
}

impl InstrumentedAdapter {
    pub fn new(
        inner: Arc<dyn ObjectStorageAdapter>,
        backend_name: impl Into<String>,
        metrics: Arc<StorageMetrics>,
    ) -> Self {
        Self {
            inner,
            backend_name: backend_name.into(),
            metrics,
        }
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    pub fn inner(&self) -> &Arc<dyn ObjectStorageAdapter> {
        &self.inner
    }

    async fn observe<T>(
        &self,
        operation: AdapterOperation,
        object: ObjectRole,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let start = Instant::now();
        let result = call.await;

        self.metrics.record_adapter_latency(
            &self.backend_name,
            operation,
            object,
            start.elapsed().as_secs_f64(),
        );
        if let Err(e) = &result {
            self.metrics
                .inc_adapter_error(&self.backend_name, operation, ErrorType::from_error(e));
        }

        result
    }
}

#[async_trait]
impl ObjectStorageAdapter for InstrumentedAdapter {
    async fn put_object(&self, bucket: &str, key: &str, data: Bytes) -> Result<()> {
        self.observe(
            AdapterOperation::Put,
            ObjectRole::from_key(key),
            self.inner.put_object(bucket, key, data),
        )
        .await
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectStream> {
        self.observe(
            AdapterOperation::Get,
            ObjectRole::from_key(key),
            self.inner.get_object(bucket, key),
        )
        .await
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.observe(
            AdapterOperation::Delete,
            ObjectRole::from_key(key),
            self.inner.delete_object(bucket, key),
        )
        .await
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool> {
        self.observe(
            AdapterOperation::Exists,
            ObjectRole::from_key(key),
            self.inner.object_exists(bucket, key),
        )
        .await
    }

    async fn list_common_prefixes(&self, bucket: &str, delimiter: &str) -> Result<Vec<String>> {
        self.observe(
            AdapterOperation::List,
            ObjectRole::Other,
            self.inner.list_common_prefixes(bucket, delimiter),
        )
        .await
    }

    async fn create_signed_url(&self, bucket: &str, key: &str, ttl: Duration) -> Result<String> {
        self.observe(
            AdapterOperation::Sign,
            ObjectRole::from_key(key),
            self.inner.create_signed_url(bucket, key, ttl),
        )
        .await
    }
}

/// Create an instrumented storage adapter from configuration.
pub fn create_instrumented_adapter(
    config: &StorageBackendConfig,
    metrics: Arc<StorageMetrics>,
) -> Result<Arc<dyn ObjectStorageAdapter>> {
    let inner = crate::storage::create_adapter(config)?;

    Ok(Arc::new(InstrumentedAdapter::new(
        inner,
        config.backend_name(),
        metrics,
    )))
}
