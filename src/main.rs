// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use artmentor::cli::{init_tracing, load_dotenv, run, Cli};
use clap::Parser;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // .env may set RUST_LOG, so it is read before the subscriber exists
    let dotenv = cli.dev.then(load_dotenv);
    init_tracing(cli.verbose);
    match dotenv {
        Some(Ok(count)) => info!("Development mode: loaded {} variable(s) from .env", count),
        Some(Err(e)) => warn!("Development mode: {:#}", e),
        None => {}
    }

    if let Err(e) = run(&cli).await {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
