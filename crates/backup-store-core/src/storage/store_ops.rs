//! Adapter operations shared by the `object_store`-backed adapters.
//!
//! Each adapter resolves a bucket to an [`ObjectStore`] and delegates here,
//! so not-found mapping and prefix listing behave the same on every backend.

use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use tracing::debug;

use super::adapter::ObjectStream;
use crate::error::StorageError;
use crate::keys::PREFIX_DELIMITER;
use crate::{Error, Result};

pub(crate) async fn put(store: &dyn ObjectStore, bucket: &str, key: &str, data: Bytes) -> Result<()> {
    debug!("PUT {}/{} ({} bytes)", bucket, key, data.len());
    store
        .put(&Path::from(key), PutPayload::from_bytes(data))
        .await
        .map_err(|e| StorageError::from_object_store(e, "PUT", bucket, key))?;
    Ok(())
}

pub(crate) async fn get(store: &dyn ObjectStore, bucket: &str, key: &str) -> Result<ObjectStream> {
    debug!("GET {}/{}", bucket, key);
    let result = store
        .get(&Path::from(key))
        .await
        .map_err(|e| StorageError::from_object_store(e, "GET", bucket, key))?;

    let (bucket, key) = (bucket.to_string(), key.to_string());
    Ok(result
        .into_stream()
        .map_err(move |e| Error::Storage(StorageError::from_object_store(e, "GET", &bucket, &key)))
        .boxed())
}

pub(crate) async fn delete(store: &dyn ObjectStore, bucket: &str, key: &str) -> Result<()> {
    debug!("DELETE {}/{}", bucket, key);
    match store.delete(&Path::from(key)).await {
        Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
        Err(e) => Err(StorageError::from_object_store(e, "DELETE", bucket, key).into()),
    }
}

pub(crate) async fn exists(store: &dyn ObjectStore, bucket: &str, key: &str) -> Result<bool> {
    debug!("HEAD {}/{}", bucket, key);
    match store.head(&Path::from(key)).await {
        Ok(_) => Ok(true),
        Err(object_store::Error::NotFound { .. }) => Ok(false),
        Err(e) => Err(StorageError::from_object_store(e, "HEAD", bucket, key).into()),
    }
}

pub(crate) async fn list_common_prefixes(
    store: &dyn ObjectStore,
    bucket: &str,
    delimiter: &str,
) -> Result<Vec<String>> {
    check_delimiter(delimiter)?;
    debug!("LIST {} (delimiter {:?})", bucket, delimiter);

    let listing = store
        .list_with_delimiter(None)
        .await
        .map_err(|e| StorageError::from_object_store(e, "LIST", bucket, ""))?;

    let mut prefixes: Vec<String> = listing
        .common_prefixes
        .iter()
        .map(|p| p.as_ref().trim_end_matches(PREFIX_DELIMITER).to_string())
        .filter(|p| !p.is_empty())
        .collect();
    prefixes.sort();
    prefixes.dedup();
    Ok(prefixes)
}

pub(crate) fn check_delimiter(delimiter: &str) -> Result<()> {
    if delimiter != PREFIX_DELIMITER {
        return Err(StorageError::Unsupported(format!(
            "delimiter {:?} (only {:?} is supported)",
            delimiter, PREFIX_DELIMITER
        ))
        .into());
    }
    Ok(())
}

/// Reject bucket names that cannot map to a single namespace.
pub(crate) fn check_bucket(bucket: &str) -> Result<()> {
    if bucket.is_empty() || bucket.contains('/') || bucket == "." || bucket == ".." {
        return Err(StorageError::InvalidPath(format!("invalid bucket name {:?}", bucket)).into());
    }
    Ok(())
}
