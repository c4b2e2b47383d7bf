// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Hosted multimodal model (Google Gemini) configuration

use std::time::Duration;
use tracing::{debug, info};

use super::{ConfigError, ConfigSetup, Source};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Clone)]
pub struct GeminiConfig {
    /// API key (required)
    pub api_key: String,
    /// Model identifier
    pub model_name: String,
    /// Maximum tokens in response
    pub max_tokens: u32,
    /// Sampling temperature (0.0-1.0)
    pub temperature: f32,
    /// Hard deadline for one model call
    pub timeout_seconds: u64,
    /// REST endpoint root
    pub base_url: String,
}

// Keeps the API key out of logs
impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("model_name", &self.model_name)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiConfig {
    /// Defaults for everything except the API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model_name: "gemini-2.5-pro".to_string(),
            max_tokens: 2048,
            temperature: 0.7,
            timeout_seconds: 30,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }

    pub fn from_source(source: &Source) -> Result<Self, ConfigError> {
        let api_key = source
            .first_of(&["GEMINI__API_KEY", "GEMINI_API_KEY"])
            .ok_or_else(|| ConfigError::Missing {
                key: "GEMINI__API_KEY".to_string(),
            })?;

        let defaults = Self::new(api_key);
        Ok(Self {
            model_name: source.string_or("GEMINI__MODEL_NAME", &defaults.model_name),
            max_tokens: source.parse_or("GEMINI__MAX_TOKENS", defaults.max_tokens)?,
            temperature: source.parse_or("GEMINI__TEMPERATURE", defaults.temperature)?,
            timeout_seconds: source.parse_or("GEMINI__TIMEOUT_SECONDS", defaults.timeout_seconds)?,
            base_url: source.string_or("GEMINI__BASE_URL", &defaults.base_url),
            ..defaults
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid {
                key: "GEMINI__TEMPERATURE".to_string(),
                value: self.temperature.to_string(),
                reason: "must be between 0.0 and 1.0".to_string(),
            });
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::Invalid {
                key: "GEMINI__MAX_TOKENS".to_string(),
                value: "0".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                key: "GEMINI__TIMEOUT_SECONDS".to_string(),
                value: "0".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl ConfigSetup for GeminiConfig {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn setup(&self) -> Result<(), ConfigError> {
        info!("Gemini initialized with model: {}", self.model_name);
        debug!(
            "Max tokens: {}, Temperature: {}, Timeout: {}s",
            self.max_tokens, self.temperature, self.timeout_seconds
        );
        Ok(())
    }
}
