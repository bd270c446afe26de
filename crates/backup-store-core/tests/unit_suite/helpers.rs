//! Test helper utilities.
//!
//! Provides a fault-injecting adapter and backup fixtures used across the
//! unit suite.

use async_trait::async_trait;
use backup_store_core::storage::{MemoryAdapter, ObjectStorageAdapter, ObjectStream};
use backup_store_core::{BackupRecord, Error, Result, StorageError};
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Adapter operations a [`FaultyAdapter`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Put,
    Get,
    Delete,
    List,
}

/// Adapter that fails chosen operations on chosen keys and records every
/// delete it is asked to perform. Backed by memory unless built with
/// [`FaultyAdapter::over`].
pub struct FaultyAdapter {
    inner: Arc<dyn ObjectStorageAdapter>,
    failures: Mutex<HashSet<(Op, String)>>,
    deletes: Mutex<Vec<String>>,
}

impl Default for FaultyAdapter {
    fn default() -> Self {
        Self::over(Arc::new(MemoryAdapter::new()))
    }
}

impl FaultyAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn over(inner: Arc<dyn ObjectStorageAdapter>) -> Self {
        Self {
            inner,
            failures: Mutex::new(HashSet::new()),
            deletes: Mutex::new(Vec::new()),
        }
    }

    /// Make `op` on `key` fail with a backend error. For `Op::List` the key is
    /// the bucket name.
    pub fn fail(&self, op: Op, key: &str) {
        self.failures.lock().insert((op, key.to_string()));
    }

    pub fn heal(&self, op: Op, key: &str) {
        self.failures.lock().remove(&(op, key.to_string()));
    }

    /// Keys passed to `delete_object`, in call order.
    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().clone()
    }

    fn check(&self, op: Op, key: &str) -> Result<()> {
        if self.failures.lock().contains(&(op, key.to_string())) {
            return Err(Error::Storage(StorageError::Backend(format!(
                "injected {:?} failure for {}",
                op, key
            ))));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStorageAdapter for FaultyAdapter {
    async fn put_object(&self, bucket: &str, key: &str, data: Bytes) -> Result<()> {
        self.check(Op::Put, key)?;
        self.inner.put_object(bucket, key, data).await
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectStream> {
        self.check(Op::Get, key)?;
        self.inner.get_object(bucket, key).await
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.deletes.lock().push(key.to_string());
        self.check(Op::Delete, key)?;
        self.inner.delete_object(bucket, key).await
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool> {
        self.inner.object_exists(bucket, key).await
    }

    async fn list_common_prefixes(&self, bucket: &str, delimiter: &str) -> Result<Vec<String>> {
        self.check(Op::List, bucket)?;
        self.inner.list_common_prefixes(bucket, delimiter).await
    }

    async fn create_signed_url(&self, bucket: &str, key: &str, ttl: Duration) -> Result<String> {
        Ok(format!(
            "https://signed.example/{}/{}?expires={}",
            bucket,
            key,
            ttl.as_secs()
        ))
    }
}

/// Serialized metadata object for a backup named `name`.
pub fn metadata_json(name: &str) -> Bytes {
    Bytes::from(
        BackupRecord::new(name)
            .to_json()
            .expect("backup record serializes"),
    )
}

pub fn archive(name: &str) -> Bytes {
    Bytes::from(format!("tarball of {}", name))
}

pub fn log(name: &str) -> Bytes {
    Bytes::from(format!("log of {}", name))
}

pub fn names(backups: &[BackupRecord]) -> Vec<String> {
    backups.iter().map(|b| b.name().to_string()).collect()
}
