pub mod delete;
pub mod download;
pub mod list;
pub mod url;
pub mod watch;

use anyhow::{Context, Result};
use backup_store_core::{create_adapter, ObjectBackupService, StorageBackendConfig};
use tracing::debug;

/// Build a backup service for a storage URL such as `s3://?region=eu-west-1`
/// or `file:///var/ark-buckets`.
pub(crate) fn open_service(storage: &str) -> Result<ObjectBackupService> {
    let config = StorageBackendConfig::from_url(storage)
        .with_context(|| format!("Invalid storage URL: {}", storage))?;
    debug!("Using {} storage backend", config.backend_name());

    let adapter = create_adapter(&config)?;
    Ok(ObjectBackupService::new(adapter))
}
