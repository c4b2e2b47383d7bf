// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! TLS material for the HTTP server and extra trust roots for outbound calls

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{ConfigError, ConfigSetup, Source};

#[derive(Debug, Clone, Default)]
pub struct SslConfig {
    /// PEM certificate chain for the server
    pub cert: Option<PathBuf>,
    /// PEM private key for the server
    pub key: Option<PathBuf>,
    /// PEM CA bundle trusted by outbound clients
    pub ca: Option<PathBuf>,
}

impl SslConfig {
    pub fn from_source(source: &Source) -> Self {
        Self {
            cert: source.path("SERVER_SSL_CERT"),
            key: source.path("SERVER_SSL_KEY"),
            ca: source.path("SERVER_SSL_CA"),
        }
    }

    /// Both certificate and key are configured and present on disk
    pub fn tls_enabled(&self) -> bool {
        match (&self.cert, &self.key) {
            (Some(cert), Some(key)) => cert.is_file() && key.is_file(),
            _ => false,
        }
    }

    /// CA bundle, if configured and readable
    pub fn ca_bundle(&self) -> Option<&Path> {
        self.ca.as_deref().filter(|p| p.is_file())
    }

    /// Read the CA bundle as an additional root for reqwest clients
    pub fn extra_root_certificates(&self) -> anyhow::Result<Vec<reqwest::Certificate>> {
        let Some(path) = self.ca_bundle() else {
            return Ok(Vec::new());
        };
        let pem = std::fs::read(path)?;
        let certs = reqwest::Certificate::from_pem_bundle(&pem)?;
        Ok(certs)
    }
}

impl ConfigSetup for SslConfig {
    fn name(&self) -> &'static str {
        "ssl"
    }

    fn setup(&self) -> Result<(), ConfigError> {
        match (&self.cert, &self.key) {
            (Some(_), Some(_)) if self.tls_enabled() => {
                info!("SSL enabled with key and cert files");
            }
            (Some(_), Some(_)) => {
                warn!("SSL key or cert file not found, disabling SSL");
            }
            (None, None) => info!("SSL disabled - no key/cert configured"),
            _ => warn!("SSL needs both SERVER_SSL_CERT and SERVER_SSL_KEY, disabling SSL"),
        }

        match &self.ca {
            Some(_) if self.ca_bundle().is_some() => {
                info!("Custom CA bundle will be trusted by outbound clients");
            }
            Some(ca) => warn!("CA bundle not found: {}", ca.display()),
            None => {}
        }
        Ok(())
    }
}
