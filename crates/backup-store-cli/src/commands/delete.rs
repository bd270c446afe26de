use anyhow::Result;
use backup_store_core::BackupService;
use tracing::info;

pub async fn run(storage: &str, bucket: &str, name: &str) -> Result<()> {
    let service = super::open_service(storage)?;

    info!("Deleting backup {} from bucket {}", name, bucket);
    service.delete_backup(bucket, name).await?;

    println!("Deleted backup {}", name);
    Ok(())
}
