//! CLI Tooling
//!
//! Command-line interface for the sync sidecar: the long-running daemon, a
//! single reconciliation cycle, and a masked dump of the effective
//! configuration.

use crate::config::{ConfigLoader, SyncConfig};
use crate::error::SyncError;
use crate::health::{self, HealthChecker};
use crate::logging::{init_logging, LoggingConfig};
use crate::sync::{CycleOutcome, SyncDaemon};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Dashsync - reconcile git-hosted dashboards into Grafana
#[derive(Debug, Parser)]
#[command(name = "dashsync")]
#[command(about = "Reconciles a git-hosted tree of dashboard definitions against a Grafana folder hierarchy")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Poll the repository and sync until interrupted (default)
    Run,
    /// Run a single sync cycle and exit; non-zero exit when it had failures
    Once,
    /// Print the effective configuration with secrets masked
    Config,
}

impl Cli {
    pub fn effective_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run)
    }

    /// Command-line logging flags win over config and environment.
    pub fn apply_logging_overrides(&self, logging: &mut LoggingConfig) {
        if let Some(level) = &self.log_level {
            logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            logging.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            logging.file = Some(file.clone());
        }
    }
}

/// Execute the selected command. Returns whether it finished cleanly.
pub async fn execute(cli: &Cli) -> Result<bool, SyncError> {
    match cli.effective_command() {
        Commands::Config => {
            let mut config = ConfigLoader::load_unvalidated(cli.config.as_deref())?;
            cli.apply_logging_overrides(&mut config.logging);
            let rendered = serde_json::to_string_pretty(&config.safe_for_log())
                .map_err(|e| SyncError::ConfigError(format!("Failed to render config: {}", e)))?;
            println!("{}", rendered);
            Ok(true)
        }
        Commands::Run => {
            let config = load_and_init(cli)?;
            run_daemon(&config).await
        }
        Commands::Once => {
            let config = load_and_init(cli)?;
            run_once(&config).await
        }
    }
}

fn load_and_init(cli: &Cli) -> Result<SyncConfig, SyncError> {
    let mut config = ConfigLoader::load(cli.config.as_deref())?;
    cli.apply_logging_overrides(&mut config.logging);
    init_logging(Some(&config.logging))?;
    let masked = serde_json::to_string(&config.safe_for_log()).unwrap_or_default();
    info!(config = %masked, "Loaded configuration");
    Ok(config)
}

async fn run_daemon(config: &SyncConfig) -> Result<bool, SyncError> {
    info!("Starting dashboard sync sidecar");
    let checker = Arc::new(HealthChecker::new());
    let (stop_tx, mut stop_rx) = watch::channel(false);
    let (_, server) = health::serve(&config.health_addr, checker.clone(), async move {
        let _ = stop_rx.changed().await;
    })
    .await?;

    let mut daemon = SyncDaemon::start(config, checker).await?;
    daemon
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await;

    let _ = stop_tx.send(true);
    if let Err(e) = server.await {
        warn!(error = %e, "Health server task ended abnormally");
    }
    Ok(true)
}

async fn run_once(config: &SyncConfig) -> Result<bool, SyncError> {
    let checker = Arc::new(HealthChecker::new());
    let mut daemon = SyncDaemon::start(config, checker).await?;
    let outcome = daemon.run_cycle().await?;
    match &outcome {
        CycleOutcome::Unchanged { revision } => info!(revision = %revision, "Nothing to sync"),
        CycleOutcome::Synced { revision, report } => info!(
            revision = %revision,
            uploaded = report.uploaded,
            failed = report.failed_uploads,
            skipped = report.skipped_artifacts,
            folder_failures = report.folder_failures,
            "Sync cycle finished"
        ),
    }
    Ok(outcome.is_clean())
}
