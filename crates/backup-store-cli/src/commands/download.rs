use anyhow::{Context, Result};
use backup_store_core::BackupService;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::info;

pub async fn run(storage: &str, bucket: &str, name: &str, output: &str) -> Result<()> {
    let service = super::open_service(storage)?;

    info!("Downloading backup {} from bucket {}", name, bucket);
    let mut stream = service.download_backup(bucket, name).await?;

    let mut file = tokio::fs::File::create(output)
        .await
        .with_context(|| format!("Failed to create {}", output))?;

    let mut written = 0usize;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len();
    }
    file.flush().await?;

    println!("Wrote {} bytes to {}", written, output);
    Ok(())
}
