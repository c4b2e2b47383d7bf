// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Command line entry point for the critique server

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::api::{create_app, serve, AppState};
use crate::config::AppConfig;
use crate::version;

/// ArtMentor AI critique server
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "artmentor")]
#[command(version)]
#[command(about = "Artwork critique service", long_about = None)]
pub struct Cli {
    /// Load variables from a .env file in the working directory (overriding)
    #[arg(long)]
    pub dev: bool,

    /// Debug-level logging unless RUST_LOG is set
    #[arg(long, short)]
    pub verbose: bool,
}

/// Install the global tracing subscriber
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Copy `.env` entries into the process environment, replacing existing values
pub fn load_dotenv() -> Result<usize> {
    let entries = dotenv::dotenv_iter().context("Failed to open .env file")?;
    let mut loaded = 0;
    for entry in entries {
        let (key, value) = entry.context("Failed to parse .env file")?;
        std::env::set_var(key, value);
        loaded += 1;
    }
    Ok(loaded)
}

/// Load configuration, build the services and serve until shutdown
pub async fn run(cli: &Cli) -> Result<()> {
    info!("Starting {}", version::get_version_string());
    debug!("Command line: {:?}", cli);

    let config = AppConfig::from_env().context("Configuration error")?;
    config.setup_all().context("Configuration error")?;
    let config = Arc::new(config);

    let state = AppState::from_config(config.clone()).await?;
    let app = create_app(state);
    serve(app, &config).await
}
