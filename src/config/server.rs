// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP server bind configuration

use tracing::info;

use super::{ConfigError, ConfigSetup, Source};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Server host address
    pub host: String,
    /// Server port number
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    pub fn from_source(source: &Source) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            host: source.string_or("SERVER__HOST", &defaults.host),
            port: source.parse_or("SERVER__PORT", defaults.port)?,
        })
    }

    /// `host:port` string suitable for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl ConfigSetup for ServerConfig {
    fn name(&self) -> &'static str {
        "server"
    }

    fn setup(&self) -> Result<(), ConfigError> {
        info!("Server configured: {}:{}", self.host, self.port);
        Ok(())
    }
}
