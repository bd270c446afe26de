//! Follow the backup listing of one or more buckets through the cache.

use anyhow::{Context, Result};
use backup_store_core::metrics::create_instrumented_adapter;
use backup_store_core::{BackupCache, Config, ObjectBackupService, StorageMetrics};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

pub async fn run(config_path: &str, extra_buckets: &[String]) -> Result<()> {
    info!("Loading configuration from: {}", config_path);
    let config = Config::from_file(config_path)
        .with_context(|| format!("Failed to load {}", config_path))?;

    let mut buckets = config.cache.buckets.clone();
    for bucket in extra_buckets {
        if !buckets.contains(bucket) {
            buckets.push(bucket.clone());
        }
    }
    if buckets.is_empty() {
        anyhow::bail!("No buckets to watch; set cache.buckets or pass --bucket");
    }

    let metrics = Arc::new(StorageMetrics::new());
    let adapter = create_instrumented_adapter(&config.storage, metrics.clone())?;
    let service = ObjectBackupService::new(adapter).with_metrics(metrics.clone());

    let period = config.cache.resync_period();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let cache = BackupCache::new(
        Arc::new(service),
        buckets.clone(),
        period,
        shutdown_rx,
        Some(metrics.clone()),
    );

    info!(
        "Watching {} bucket(s) every {:?}, press Ctrl-C to stop",
        buckets.len(),
        period
    );

    let mut ticker = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for bucket in &buckets {
                    match cache.snapshot(bucket) {
                        Some(snapshot) => {
                            println!(
                                "== {} (refreshed {})",
                                bucket,
                                snapshot.refreshed_at.format("%H:%M:%S")
                            );
                            super::list::print_backups_text(bucket, &snapshot.backups);
                        }
                        None => println!("== {} (not yet refreshed)", bucket),
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                break;
            }
        }
    }

    let _ = shutdown_tx.send(());
    debug!("Final metrics:\n{}", metrics.encode());
    Ok(())
}
