// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! TLS termination for the HTTP server

use anyhow::{anyhow, Context, Result};
use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use hyper_util::service::TowerToHyperService;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use rustls_pemfile::{certs, private_key};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, info, warn};

/// How long in-flight connections may finish after shutdown starts
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

fn load_cert_chain(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let mut reader = std::io::BufReader::new(
        std::fs::File::open(path)
            .with_context(|| format!("Failed to open certificate {}", path.display()))?,
    );
    let chain = certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to parse certificate {}", path.display()))?;
    if chain.is_empty() {
        return Err(anyhow!("No certificates found in {}", path.display()));
    }
    Ok(chain)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    let mut reader = std::io::BufReader::new(
        std::fs::File::open(path)
            .with_context(|| format!("Failed to open private key {}", path.display()))?,
    );
    private_key(&mut reader)
        .with_context(|| format!("Failed to parse private key {}", path.display()))?
        .ok_or_else(|| anyhow!("No private key found in {}", path.display()))
}

/// Server config from PEM files, offering HTTP/2 and HTTP/1.1
pub fn load_server_config(cert: &Path, key: &Path) -> Result<Arc<ServerConfig>> {
    let chain = load_cert_chain(cert)?;
    let key = load_private_key(key)?;

    let mut config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(chain, key)
        .context("Certificate and private key do not form a valid pair")?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
    Ok(Arc::new(config))
}

/// Accept TLS connections until `shutdown` resolves, then drain
pub async fn serve_tls<F>(
    listener: TcpListener,
    app: Router,
    tls: Arc<ServerConfig>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    let acceptor = TlsAcceptor::from(tls);
    let mut connections = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!("Failed to accept connection: {}", e);
                        continue;
                    }
                };
                let acceptor = acceptor.clone();
                let service = TowerToHyperService::new(app.clone());

                connections.spawn(async move {
                    let stream = match acceptor.accept(stream).await {
                        Ok(stream) => stream,
                        Err(e) => {
                            debug!("TLS handshake with {} failed: {}", peer, e);
                            return;
                        }
                    };
                    if let Err(e) = Builder::new(TokioExecutor::new())
                        .serve_connection_with_upgrades(TokioIo::new(stream), service)
                        .await
                    {
                        debug!("Connection with {} ended with error: {}", peer, e);
                    }
                });
            }
        }
    }

    info!("Draining {} open connection(s)", connections.len());
    let drain = async { while connections.join_next().await.is_some() {} };
    if tokio::time::timeout(DRAIN_TIMEOUT, drain).await.is_err() {
        warn!("Connections still open after {:?}, closing them", DRAIN_TIMEOUT);
        connections.abort_all();
    }
    Ok(())
}
