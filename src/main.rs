//! mongodump Backup Tool
//!
//! Provides CLI interface for estimating and running a single mongodump backup job

// mongodumptool/src/main.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mongodumptool::{BackupJob, RawJsonConfig};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "mongodumptool", version, about = "Estimate and run mongodump backups")]
struct Cli {
    /// JSON config file containing a `mongodump` section
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Name of this backup job, used in log output
    #[arg(long, default_value = "mongodump")]
    name: String,

    /// Validate and log the command without running mongodump
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    operation: Operation,
}

#[derive(Debug, Subcommand)]
enum Operation {
    /// Print the estimated backup size in bytes
    Estimate,
    /// Run mongodump into the target directory
    Backup {
        #[arg(long)]
        target_dir: PathBuf,
    },
    /// Describe the backup this tool produces
    Info,
}

/// Main entry point for the mongodump tool
#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run_app(Cli::parse()).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app(cli: Cli) -> Result<()> {
    let raw_config = RawJsonConfig::load_from_json(&cli.config).with_context(|| {
        format!(
            "Failed to load application configuration from {}",
            cli.config.display()
        )
    })?;

    match cli.operation {
        Operation::Estimate => {
            let job = BackupJob::new(&cli.name, &raw_config, ".", cli.dry_run)
                .context("Invalid mongodump configuration")?;
            let size = job
                .estimate_backup_size()
                .await
                .context("Size estimation failed")?;
            println!("{}", size);
        }
        Operation::Backup { target_dir } => {
            let job = BackupJob::new(&cli.name, &raw_config, &target_dir, cli.dry_run)
                .context("Invalid mongodump configuration")?;
            if !job.is_dry_run() {
                let target = job.target_directory();
                fs::create_dir_all(target).with_context(|| {
                    format!("Failed to create target directory: {}", target.display())
                })?;
            }
            job.backup().await.context("Backup process failed")?;
            println!("✅ Backup {} completed.", job.name());
        }
        Operation::Info => {
            let job = BackupJob::new(&cli.name, &raw_config, ".", cli.dry_run)
                .context("Invalid mongodump configuration")?;
            println!("{}", job.info());
        }
    }
    Ok(())
}
