use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "backup-store")]
#[command(about = "Inspect and manage cluster backups in object storage", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List backups in a bucket
    List {
        /// Storage URL (s3://, file://, memory://)
        #[arg(short, long)]
        storage: String,

        /// Bucket to list
        #[arg(short, long)]
        bucket: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Download a backup's data archive
    Download {
        /// Storage URL (s3://, file://, memory://)
        #[arg(short, long)]
        storage: String,

        /// Bucket holding the backup
        #[arg(short, long)]
        bucket: String,

        /// Backup name
        #[arg(short, long)]
        name: String,

        /// File to write the archive to
        #[arg(short, long)]
        output: String,
    },

    /// Delete a backup's archive and metadata
    Delete {
        /// Storage URL (s3://, file://, memory://)
        #[arg(short, long)]
        storage: String,

        /// Bucket holding the backup
        #[arg(short, long)]
        bucket: String,

        /// Backup name
        #[arg(short, long)]
        name: String,
    },

    /// Print a pre-signed download URL for a backup
    Url {
        /// Storage URL (s3://, file://, memory://); overrides the config file
        #[arg(short, long)]
        storage: Option<String>,

        /// Configuration file supplying storage and signed_url_ttl_secs
        #[arg(short, long)]
        config: Option<String>,

        /// Bucket holding the backup
        #[arg(short, long)]
        bucket: String,

        /// Backup name
        #[arg(short, long)]
        name: String,

        /// Sign the backup log instead of the data archive
        #[arg(long, default_value = "false")]
        log: bool,

        /// URL lifetime in seconds (default: signed_url_ttl_secs, or 600)
        #[arg(long)]
        ttl_secs: Option<u64>,
    },

    /// Keep a cached listing of buckets and print it every resync period
    Watch {
        /// Path to the configuration file
        #[arg(short, long)]
        config: String,

        /// Additional buckets to watch
        #[arg(short, long)]
        bucket: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match cli.verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::List {
            storage,
            bucket,
            format,
        } => {
            commands::list::run(&storage, &bucket, format.as_str().into()).await?;
        }
        Commands::Download {
            storage,
            bucket,
            name,
            output,
        } => {
            commands::download::run(&storage, &bucket, &name, &output).await?;
        }
        Commands::Delete {
            storage,
            bucket,
            name,
        } => {
            commands::delete::run(&storage, &bucket, &name).await?;
        }
        Commands::Url {
            storage,
            config,
            bucket,
            name,
            log,
            ttl_secs,
        } => {
            commands::url::run(
                storage.as_deref(),
                config.as_deref(),
                &bucket,
                &name,
                log,
                ttl_secs,
            )
            .await?;
        }
        Commands::Watch { config, bucket } => {
            commands::watch::run(&config, &bucket).await?;
        }
    }

    Ok(())
}
