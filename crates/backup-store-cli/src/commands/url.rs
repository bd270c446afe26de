use anyhow::{Context, Result};
use backup_store_core::config::DEFAULT_SIGNED_URL_TTL_SECS;
use backup_store_core::{create_adapter, BackupService, Config, ObjectBackupService};
use std::time::Duration;

pub async fn run(
    storage: Option<&str>,
    config_path: Option<&str>,
    bucket: &str,
    name: &str,
    log: bool,
    ttl_secs: Option<u64>,
) -> Result<()> {
    let config = match config_path {
        Some(path) => Some(
            Config::from_file(path).with_context(|| format!("Failed to load {}", path))?,
        ),
        None => None,
    };

    let ttl = resolve_ttl(ttl_secs, config.as_ref())?;
    let service = match (storage, &config) {
        (Some(storage), _) => super::open_service(storage)?,
        (None, Some(config)) => ObjectBackupService::new(create_adapter(&config.storage)?),
        (None, None) => anyhow::bail!("Either --storage or --config is required"),
    };

    let url = if log {
        service.create_backup_log_signed_url(bucket, name, ttl).await?
    } else {
        service.create_backup_signed_url(bucket, name, ttl).await?
    };

    println!("{}", url);
    Ok(())
}

/// `--ttl-secs` wins over the configured `signed_url_ttl_secs`.
fn resolve_ttl(ttl_secs: Option<u64>, config: Option<&Config>) -> Result<Duration> {
    match (ttl_secs, config) {
        (Some(0), _) => anyhow::bail!("--ttl-secs must be greater than 0"),
        (Some(secs), _) => Ok(Duration::from_secs(secs)),
        (None, Some(config)) => Ok(config.signed_url_ttl()),
        (None, None) => Ok(Duration::from_secs(DEFAULT_SIGNED_URL_TTL_SECS)),
    }
}
