//! Dashsync CLI Binary
//!
//! Entry point for the dashboard sync sidecar.

use anyhow::Context;
use clap::Parser;
use dashsync::cli::{execute, Cli};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let clean = execute(&cli)
        .await
        .with_context(|| format!("dashsync {:?} failed", cli.effective_command()))?;
    Ok(if clean {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
