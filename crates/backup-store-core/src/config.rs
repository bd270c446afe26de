//! Configuration for the backup store.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Storage configuration (supports S3, Filesystem, Memory)
    pub storage: crate::storage::StorageBackendConfig,

    /// Backup listing cache options
    #[serde(default)]
    pub cache: CacheConfig,

    /// Lifetime of generated download URLs in seconds (default: 600)
    #[serde(default = "default_signed_url_ttl_secs")]
    pub signed_url_ttl_secs: u64,
}

/// Backup listing cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Delay between the end of one refresh and the start of the next (default: 30)
    #[serde(default = "default_resync_period_secs")]
    pub resync_period_secs: u64,

    /// Buckets refreshed from start-up
    #[serde(default)]
    pub buckets: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            resync_period_secs: default_resync_period_secs(),
            buckets: Vec::new(),
        }
    }
}

impl CacheConfig {
    pub fn resync_period(&self) -> Duration {
        Duration::from_secs(self.resync_period_secs)
    }
}

fn default_resync_period_secs() -> u64 {
    30
}

/// Signed URL lifetime used when no configuration sets one
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 600;

fn default_signed_url_ttl_secs() -> u64 {
    DEFAULT_SIGNED_URL_TTL_SECS
}

impl Config {
    /// Parse and validate a YAML configuration
    pub fn from_yaml_str(yaml: &str) -> crate::Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            crate::Error::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.cache.resync_period_secs == 0 {
            return Err(crate::Error::Config(
                "cache.resync_period_secs must be greater than 0".to_string(),
            ));
        }

        if self.signed_url_ttl_secs == 0 {
            return Err(crate::Error::Config(
                "signed_url_ttl_secs must be greater than 0".to_string(),
            ));
        }

        if let Some(bucket) = self.cache.buckets.iter().find(|b| b.trim().is_empty()) {
            return Err(crate::Error::Config(format!(
                "Invalid bucket name in cache.buckets: {:?}",
                bucket
            )));
        }

        Ok(())
    }

    pub fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.signed_url_ttl_secs)
    }
}
