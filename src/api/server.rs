// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP server lifecycle

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::tls::{load_server_config, serve_tls};
use crate::config::AppConfig;

/// Bind and serve `app` until Ctrl-C (or SIGTERM on unix)
///
/// TLS is terminated in-process when the SSL configuration provides both a
/// certificate and a key that exist on disk.
pub async fn serve(app: Router, config: &AppConfig) -> Result<()> {
    let address = config.server.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    match (&config.ssl.cert, &config.ssl.key) {
        (Some(cert), Some(key)) if config.ssl.tls_enabled() => {
            let tls = load_server_config(cert, key)?;
            info!("{} listening on https://{}", config.app_name, address);
            serve_tls(listener, app, tls, shutdown_signal()).await?;
        }
        _ => {
            info!("{} listening on http://{}", config.app_name, address);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("HTTP server failed")?;
        }
    }

    info!("Server stopped");
    Ok(())
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
