//! Prometheus metrics registry for the backup store.

use parking_lot::RwLock;
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::Histogram;
use prometheus_client::registry::Registry;

use super::labels::{
    AdapterErrorLabels, AdapterLabels, AdapterOperation, BucketLabels, ErrorType, ObjectRole,
    OperationStatus, RefreshLabels,
};

/// Adapter latency histogram buckets (in seconds).
/// Covers typical cloud storage latencies: 10ms to 10s.
const ADAPTER_LATENCY_BUCKETS: [f64; 9] = [0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Prometheus metrics for adapter calls, best-effort failures and the
/// listing cache.
pub struct StorageMetrics {
    /// Internal prometheus-client registry.
    registry: RwLock<Registry>,

    /// Adapter call latency by backend, operation and object role.
    pub adapter_latency_seconds: Family<AdapterLabels, Histogram>,

    /// Adapter errors by backend, operation and error type.
    pub adapter_errors: Family<AdapterErrorLabels, Counter>,

    /// Log uploads that failed without failing their backup upload.
    pub log_upload_failures: Family<BucketLabels, Counter>,

    /// Cache refresh attempts by outcome.
    pub cache_refreshes: Family<RefreshLabels, Counter>,

    /// Number of backups in the current cache snapshot.
    pub cache_backups: Family<BucketLabels, Gauge>,
}

impl Default for StorageMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageMetrics {
    /// Create a new registry with all metrics registered.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let adapter_latency_seconds =
            Family::<AdapterLabels, Histogram>::new_with_constructor(|| {
                Histogram::new(ADAPTER_LATENCY_BUCKETS.iter().cloned())
            });
        let adapter_errors = Family::<AdapterErrorLabels, Counter>::default();
        let log_upload_failures = Family::<BucketLabels, Counter>::default();
        let cache_refreshes = Family::<RefreshLabels, Counter>::default();
        let cache_backups = Family::<BucketLabels, Gauge>::default();

        registry.register(
            "backup_store_adapter_latency_seconds",
            "Object storage adapter call latency",
            adapter_latency_seconds.clone(),
        );
        registry.register(
            "backup_store_adapter_errors",
            "Object storage adapter errors by type",
            adapter_errors.clone(),
        );
        registry.register(
            "backup_store_log_upload_failures",
            "Backup log uploads that failed without failing the backup",
            log_upload_failures.clone(),
        );
        registry.register(
            "backup_store_cache_refresh",
            "Backup listing cache refresh attempts",
            cache_refreshes.clone(),
        );
        registry.register(
            "backup_store_cache_backups",
            "Backups in the current listing cache snapshot",
            cache_backups.clone(),
        );

        Self {
            registry: RwLock::new(registry),
            adapter_latency_seconds,
            adapter_errors,
            log_upload_failures,
            cache_refreshes,
            cache_backups,
        }
    }

    /// Record adapter call latency.
    pub fn record_adapter_latency(
        &self,
        backend: &str,
        operation: AdapterOperation,
        object: ObjectRole,
        latency_secs: f64,
    ) {
        let labels = AdapterLabels::new(backend, operation, object);
        self.adapter_latency_seconds
            .get_or_create(&labels)
            .observe(latency_secs);
    }

    /// Increment the adapter error counter.
    pub fn inc_adapter_error(&self, backend: &str, operation: AdapterOperation, error_type: ErrorType) {
        let labels = AdapterErrorLabels::new(backend, operation, error_type);
        self.adapter_errors.get_or_create(&labels).inc();
    }

    /// Increment the swallowed log upload failure counter.
    pub fn inc_log_upload_failure(&self, bucket: &str) {
        self.log_upload_failures
            .get_or_create(&BucketLabels::new(bucket))
            .inc();
    }

    /// Record a successful cache refresh and the resulting snapshot size.
    pub fn record_refresh_success(&self, bucket: &str, backups: usize) {
        self.cache_refreshes
            .get_or_create(&RefreshLabels::new(bucket, OperationStatus::Success))
            .inc();
        self.cache_backups
            .get_or_create(&BucketLabels::new(bucket))
            .set(backups as i64);
    }

    /// Record a failed cache refresh.
    pub fn record_refresh_failure(&self, bucket: &str) {
        self.cache_refreshes
            .get_or_create(&RefreshLabels::new(bucket, OperationStatus::Failure))
            .inc();
    }

    /// Encode all metrics in Prometheus text format.
    pub fn encode(&self) -> String {
        let registry = self.registry.read();
        let mut buffer = String::new();
        if encode(&mut buffer, &registry).is_err() {
            return String::new();
        }
        buffer
    }
}
