//! Prometheus metrics for the backup store.
//!
//! - [`labels`] - Label types for metric dimensions
//! - [`registry`] - The [`StorageMetrics`] registry
//! - [`instrumented_adapter`] - Adapter decorator recording latency and errors

pub mod instrumented_adapter;
pub mod labels;
pub mod registry;

pub use instrumented_adapter::{create_instrumented_adapter, InstrumentedAdapter};
pub use labels::{AdapterOperation, ErrorType, ObjectRole, OperationStatus};
pub use registry::StorageMetrics;
