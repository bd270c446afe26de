use anyhow::Result;
use backup_store_core::{BackupGetter, BackupRecord};
use tracing::info;

/// List command output format
pub enum OutputFormat {
    Text,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

pub async fn run(storage: &str, bucket: &str, format: OutputFormat) -> Result<()> {
    let service = super::open_service(storage)?;

    info!("Listing backups in bucket: {}", bucket);
    let backups = service.get_all_backups(bucket).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&backups)?);
        }
        OutputFormat::Text => print_backups_text(bucket, &backups),
    }

    Ok(())
}

pub(crate) fn print_backups_text(bucket: &str, backups: &[BackupRecord]) {
    if backups.is_empty() {
        println!("No backups found in {}", bucket);
        return;
    }

    println!("{:<40} {:<18} CREATED", "NAME", "PHASE");
    for backup in backups {
        let created = backup
            .metadata
            .creation_timestamp
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        let phase = match backup.status.phase.as_str() {
            "" => "<none>",
            phase => phase,
        };
        println!("{:<40} {:<18} {}", backup.name(), phase, created);
    }
}
