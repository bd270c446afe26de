//! Label types for Prometheus metrics.

use prometheus_client::encoding::EncodeLabelSet;

use crate::keys::METADATA_FILE_NAME;

/// Labels for adapter latency metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct AdapterLabels {
    pub backend: String,
    pub operation: String,
    pub object: String,
}

impl AdapterLabels {
    pub fn new(backend: impl Into<String>, operation: AdapterOperation, object: ObjectRole) -> Self {
        Self {
            backend: backend.into(),
            operation: operation.as_str().to_string(),
            object: object.as_str().to_string(),
        }
    }
}

/// Labels for adapter error metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct AdapterErrorLabels {
    pub backend: String,
    pub operation: String,
    pub error_type: String,
}

impl AdapterErrorLabels {
    pub fn new(backend: impl Into<String>, operation: AdapterOperation, error_type: ErrorType) -> Self {
        Self {
            backend: backend.into(),
            operation: operation.as_str().to_string(),
            error_type: error_type.as_str().to_string(),
        }
    }
}

/// Labels for per-bucket metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct BucketLabels {
    pub bucket: String,
}

impl BucketLabels {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
        }
    }
}

/// Labels for cache refresh outcomes.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RefreshLabels {
    pub bucket: String,
    pub status: String,
}

impl RefreshLabels {
    pub fn new(bucket: impl Into<String>, status: OperationStatus) -> Self {
        Self {
            bucket: bucket.into(),
            status: status.as_str().to_string(),
        }
    }
}

/// Operation status for refresh metrics.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum OperationStatus {
    Success,
    Failure,
}

impl OperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::Success => "success",
            OperationStatus::Failure => "failure",
        }
    }
}

/// Adapter call being measured.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum AdapterOperation {
    Put,
    Get,
    Delete,
    Exists,
    List,
    Sign,
}

impl AdapterOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterOperation::Put => "put",
            AdapterOperation::Get => "get",
            AdapterOperation::Delete => "delete",
            AdapterOperation::Exists => "exists",
            AdapterOperation::List => "list",
            AdapterOperation::Sign => "sign",
        }
    }
}

/// Which backup artifact an object key refers to.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ObjectRole {
    Metadata,
    Archive,
    Log,
    Other,
}

impl ObjectRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectRole::Metadata => "metadata",
            ObjectRole::Archive => "archive",
            ObjectRole::Log => "log",
            ObjectRole::Other => "other",
        }
    }

    /// Classify a key by the backup key layout.
    pub fn from_key(key: &str) -> Self {
        let file_name = key.rsplit('/').next().unwrap_or(key);
        if file_name == METADATA_FILE_NAME {
            ObjectRole::Metadata
        } else if file_name.ends_with(".tar.gz") {
            ObjectRole::Archive
        } else if file_name.ends_with(".log.gz") {
            ObjectRole::Log
        } else {
            ObjectRole::Other
        }
    }
}

/// Error type classification for metrics.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ErrorType {
    NotFound,
    Auth,
    InvalidPath,
    Unsupported,
    StorageIo,
    Deserialization,
    Unknown,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::NotFound => "not_found",
            ErrorType::Auth => "auth",
            ErrorType::InvalidPath => "invalid_path",
            ErrorType::Unsupported => "unsupported",
            ErrorType::StorageIo => "storage_io",
            ErrorType::Deserialization => "deserialization",
            ErrorType::Unknown => "unknown",
        }
    }

    /// Classify an error into an ErrorType.
    pub fn from_error(error: &crate::Error) -> Self {
        use crate::error::StorageError;

        match error {
            crate::Error::Storage(storage_err) => match storage_err {
                StorageError::NotFound(_) => ErrorType::NotFound,
                StorageError::PermissionDenied(_) => ErrorType::Auth,
                StorageError::InvalidPath(_) => ErrorType::InvalidPath,
                StorageError::Unsupported(_) => ErrorType::Unsupported,
                StorageError::Backend(_) => ErrorType::StorageIo,
            },
            crate::Error::Decode { .. } | crate::Error::Serialization(_) => {
                ErrorType::Deserialization
            }
            crate::Error::Io(_) => ErrorType::StorageIo,
            crate::Error::Aggregate(agg) => agg
                .errors()
                .first()
                .map(Self::from_error)
                .unwrap_or(ErrorType::Unknown),
            crate::Error::Config(_) => ErrorType::Unknown,
        }
    }
}
