//! S3-compatible storage adapter using object_store.

use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::adapter::{ObjectStorageAdapter, ObjectStream};
use super::store_ops;
use crate::error::StorageError;
use crate::Result;

/// S3 storage adapter configuration
#[derive(Debug, Clone)]
pub struct S3Config {
    /// AWS region
    pub region: Option<String>,
    /// Custom endpoint (for S3-compatible services like MinIO)
    pub endpoint: Option<String>,
    /// Access key ID
    pub access_key_id: Option<String>,
    /// Secret access key
    pub secret_access_key: Option<String>,
    /// Allow HTTP (insecure) connections
    pub allow_http: bool,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            region: Some("us-east-1".to_string()),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            allow_http: false,
        }
    }
}

/// S3 storage adapter
///
/// One client is built per bucket on first use and reused afterwards.
pub struct S3Adapter {
    config: S3Config,
    clients: RwLock<HashMap<String, Arc<AmazonS3>>>,
}

impl S3Adapter {
    /// Create a new S3 adapter
    pub fn new(config: S3Config) -> Self {
        info!(
            "Created S3 adapter, region: {:?}, endpoint: {:?}",
            config.region, config.endpoint
        );
        Self {
            config,
            clients: RwLock::new(HashMap::new()),
        }
    }

    fn client(&self, bucket: &str) -> Result<Arc<AmazonS3>> {
        store_ops::check_bucket(bucket)?;

        if let Some(client) = self.clients.read().get(bucket) {
            return Ok(Arc::clone(client));
        }

        let client = Arc::new(self.build_client(bucket)?);
        let mut clients = self.clients.write();
        let client = clients.entry(bucket.to_string()).or_insert(client);
        Ok(Arc::clone(client))
    }

    fn build_client(&self, bucket: &str) -> Result<AmazonS3> {
        let mut builder = AmazonS3Builder::new().with_bucket_name(bucket);

        if let Some(region) = &self.config.region {
            builder = builder.with_region(region);
        }

        if let Some(endpoint) = &self.config.endpoint {
            builder = builder.with_endpoint(endpoint);
            // Custom endpoints are addressed path-style
            builder = builder.with_virtual_hosted_style_request(false);
        }

        if let Some(access_key) = &self.config.access_key_id {
            builder = builder.with_access_key_id(access_key);
        }

        if let Some(secret_key) = &self.config.secret_access_key {
            builder = builder.with_secret_access_key(secret_key);
        }

        if self.config.allow_http {
            builder = builder.with_allow_http(true);
        }

        let client = builder.build().map_err(|e| {
            StorageError::Backend(format!(
                "Failed to create S3 client for bucket {}: {}",
                bucket, e
            ))
        })?;

        debug!("Created S3 client for bucket: {}", bucket);
        Ok(client)
    }
}

#[async_trait]
impl ObjectStorageAdapter for S3Adapter {
    async fn put_object(&self, bucket: &str, key: &str, data: Bytes) -> Result<()> {
        let client = self.client(bucket)?;
        store_ops::put(client.as_ref(), bucket, key, data).await
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectStream> {
        let client = self.client(bucket)?;
        store_ops::get(client.as_ref(), bucket, key).await
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let client = self.client(bucket)?;
        store_ops::delete(client.as_ref(), bucket, key).await
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool> {
        let client = self.client(bucket)?;
        store_ops::exists(client.as_ref(), bucket, key).await
    }

    async fn list_common_prefixes(&self, bucket: &str, delimiter: &str) -> Result<Vec<String>> {
        let client = self.client(bucket)?;
        store_ops::list_common_prefixes(client.as_ref(), bucket, delimiter).await
    }

    async fn create_signed_url(&self, bucket: &str, key: &str, ttl: Duration) -> Result<String> {
        let client = self.client(bucket)?;
        debug!("S3 SIGN: {}/{} (ttl {:?})", bucket, key, ttl);

        let url = client
            .signed_url(Method::GET, &Path::from(key), ttl)
            .await
            .map_err(|e| StorageError::from_object_store(e, "SIGN", bucket, key))?;

        Ok(url.to_string())
    }
}
