// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Application configuration
//!
//! All settings come from the process environment (optionally seeded from a
//! `.env` file by the binary). Nested sections use the `SECTION__FIELD`
//! naming convention, e.g. `GEMINI__MODEL_NAME` or `UPLOAD__MAX_FILE_SIZE_MB`.
//!
//! The configuration is loaded and validated once at startup and then shared
//! immutably. Each section implements [`ConfigSetup`]; [`AppConfig::setup_all`]
//! walks every section and runs its setup hook.

pub mod gemini;
pub mod server;
pub mod source;
pub mod ssl;
pub mod upload;
pub mod vector_db;

pub use gemini::GeminiConfig;
pub use server::ServerConfig;
pub use source::Source;
pub use ssl::SslConfig;
pub use upload::UploadConfig;
pub use vector_db::{EmbeddingBackend, EmbeddingConfig, Pooling, VectorDbConfig};

use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while loading or preparing configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting is absent
    #[error("Missing required configuration value: {key}")]
    Missing { key: String },

    /// A setting is present but cannot be used
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },

    /// A setup hook failed
    #[error("Setup of {component} configuration failed: {reason}")]
    Setup {
        component: &'static str,
        reason: String,
    },
}

/// Initialization hook implemented by every configuration section
pub trait ConfigSetup {
    /// Section name used in logs
    fn name(&self) -> &'static str;

    /// Log the section summary and prepare any resources it describes
    fn setup(&self) -> Result<(), ConfigError>;
}

/// Top-level configuration container
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_name: String,
    pub app_version: String,
    pub debug: bool,
    /// development, staging or production
    pub environment: String,
    /// CORS allowed origins
    pub allowed_origins: Vec<String>,
    pub server: ServerConfig,
    pub ssl: SslConfig,
    pub gemini: GeminiConfig,
    pub upload: UploadConfig,
    pub vector_db: VectorDbConfig,
    pub embedding: EmbeddingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = Source::new(&lookup);

        let config = Self {
            app_name: source.string_or("APP_NAME", crate::version::SERVICE_NAME),
            app_version: source.string_or("APP_VERSION", crate::version::VERSION_NUMBER),
            debug: source.bool_or("DEBUG", false)?,
            environment: source.string_or("ENVIRONMENT", "development"),
            allowed_origins: source.list_or(
                "ALLOWED_ORIGINS",
                &["http://localhost:3000", "http://localhost:8000"],
            )?,
            server: ServerConfig::from_source(&source)?,
            ssl: SslConfig::from_source(&source),
            gemini: GeminiConfig::from_source(&source)?,
            upload: UploadConfig::from_source(&source)?,
            vector_db: VectorDbConfig::from_source(&source)?,
            embedding: EmbeddingConfig::from_source(&source)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Configuration with defaults everywhere and a placeholder API key
    pub fn new_for_test() -> Self {
        Self {
            app_name: crate::version::SERVICE_NAME.to_string(),
            app_version: crate::version::VERSION_NUMBER.to_string(),
            debug: false,
            environment: "test".to_string(),
            allowed_origins: vec!["http://localhost:3000".to_string()],
            server: ServerConfig::default(),
            ssl: SslConfig::default(),
            gemini: GeminiConfig::new("test-api-key"),
            upload: UploadConfig::default(),
            vector_db: VectorDbConfig::default(),
            embedding: EmbeddingConfig {
                backend: EmbeddingBackend::Hashing,
                ..EmbeddingConfig::default()
            },
        }
    }

    /// Validate cross-section invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "APP_NAME".to_string(),
                value: self.app_name.clone(),
                reason: "must not be empty".to_string(),
            });
        }
        self.gemini.validate()?;
        self.upload.validate()?;
        self.vector_db.validate()?;
        Ok(())
    }

    /// Every section that carries a setup hook
    pub fn components(&self) -> Vec<&dyn ConfigSetup> {
        vec![
            &self.server,
            &self.ssl,
            &self.gemini,
            &self.upload,
            &self.vector_db,
            &self.embedding,
        ]
    }

    /// Run the setup hook of every section
    pub fn setup_all(&self) -> Result<(), ConfigError> {
        info!("{} v{} initializing...", self.app_name, self.app_version);
        info!("Environment: {}", self.environment);
        info!("Debug mode: {}", self.debug);

        for component in self.components() {
            debug!("Setting up sub-config: {}", component.name());
            component.setup()?;
        }
        Ok(())
    }
}
