//! Error types for the backup storage core library.

use std::fmt;

use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the backup storage library.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage adapter error, passed through unchanged
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Metadata payload present but not a valid backup record
    #[error("Decode error for {bucket}/{key}: {message}")]
    Decode {
        bucket: String,
        key: String,
        message: String,
    },

    /// One or more errors collected from a partial-failure path
    #[error("{0}")]
    Aggregate(AggregateError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error is the adapter's not-found classification.
    ///
    /// Aggregates are not-found only when every collected error is.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Storage(StorageError::NotFound(_)) => true,
            Error::Aggregate(agg) => agg.errors().iter().all(Error::is_not_found),
            _ => false,
        }
    }
}

/// Storage-specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Object not found
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Storage backend error
    #[error("Backend error: {0}")]
    Backend(String),

    /// Invalid path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Operation not supported by this adapter
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl StorageError {
    /// Map an `object_store` error, keeping not-found distinguishable.
    pub(crate) fn from_object_store(
        err: object_store::Error,
        op: &str,
        bucket: &str,
        key: &str,
    ) -> Self {
        match err {
            object_store::Error::NotFound { .. } => StorageError::NotFound(key.to_string()),
            object_store::Error::PermissionDenied { .. }
            | object_store::Error::Unauthenticated { .. } => {
                StorageError::PermissionDenied(format!("{} {}/{}: {}", op, bucket, key, err))
            }
            object_store::Error::InvalidPath { .. } => {
                StorageError::InvalidPath(format!("{}/{}: {}", bucket, key, err))
            }
            object_store::Error::NotSupported { .. } | object_store::Error::NotImplemented => {
                StorageError::Unsupported(format!("{} {}/{}: {}", op, bucket, key, err))
            }
            _ => StorageError::Backend(format!("{} {}/{} failed: {}", op, bucket, key, err)),
        }
    }
}

/// An ordered, non-empty collection of errors.
///
/// Produced by the rollback path of an upload and by backup deletion, where
/// several independent operations may each fail. A single error renders as
/// itself; several render as `[first, second]` in the order collected.
#[derive(Debug)]
pub struct AggregateError {
    errors: Vec<Error>,
}

impl AggregateError {
    /// Build an aggregate, returning `None` when there is nothing to report.
    pub fn new(errors: Vec<Error>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    /// The collected errors, in the order they occurred.
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<Error> {
        self.errors
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [only] = self.errors.as_slice() {
            return write!(f, "{}", only);
        }

        write!(f, "[")?;
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", err)?;
        }
        write!(f, "]")
    }
}

impl std::error::Error for AggregateError {}

/// Collapse a list of errors into `Ok(())` or a single aggregate error.
pub fn aggregate(errors: Vec<Error>) -> Result<()> {
    match AggregateError::new(errors) {
        Some(agg) => Err(Error::Aggregate(agg)),
        None => Ok(()),
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
