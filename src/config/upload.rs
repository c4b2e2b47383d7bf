// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload limits and accepted image types

use std::path::PathBuf;
use tracing::{debug, info};

use super::{ConfigError, ConfigSetup, Source};

const DEFAULT_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp"];
const DEFAULT_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/bmp",
];

#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Maximum upload file size in MB
    pub max_file_size_mb: u64,
    /// Working directory for uploads
    pub upload_dir: PathBuf,
    /// Lowercase extensions including the leading dot
    pub allowed_extensions: Vec<String>,
    /// Lowercase MIME types
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 10,
            upload_dir: PathBuf::from("./uploads"),
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            allowed_mime_types: DEFAULT_MIME_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl UploadConfig {
    pub fn from_source(source: &Source) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            max_file_size_mb: source.parse_or("UPLOAD__MAX_FILE_SIZE_MB", defaults.max_file_size_mb)?,
            upload_dir: source.path("UPLOAD__UPLOAD_DIR").unwrap_or(defaults.upload_dir),
            allowed_extensions: normalize_extensions(
                source.list_or("UPLOAD__ALLOWED_EXTENSIONS", DEFAULT_EXTENSIONS)?,
            ),
            allowed_mime_types: source
                .list_or("UPLOAD__ALLOWED_MIME_TYPES", DEFAULT_MIME_TYPES)?
                .into_iter()
                .map(|m| m.to_lowercase())
                .collect(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_file_size_mb == 0 {
            return Err(ConfigError::Invalid {
                key: "UPLOAD__MAX_FILE_SIZE_MB".to_string(),
                value: "0".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.allowed_extensions.is_empty() {
            return Err(ConfigError::Invalid {
                key: "UPLOAD__ALLOWED_EXTENSIONS".to_string(),
                value: String::new(),
                reason: "at least one extension is required".to_string(),
            });
        }
        if self.allowed_mime_types.is_empty() {
            return Err(ConfigError::Invalid {
                key: "UPLOAD__ALLOWED_MIME_TYPES".to_string(),
                value: String::new(),
                reason: "at least one MIME type is required".to_string(),
            });
        }
        Ok(())
    }

    /// Upload limit in bytes (MB → bytes)
    pub fn max_file_size_bytes(&self) -> usize {
        (self.max_file_size_mb as usize).saturating_mul(1024 * 1024)
    }
}

fn normalize_extensions(raw: Vec<String>) -> Vec<String> {
    raw.into_iter()
        .map(|ext| {
            let ext = ext.to_lowercase();
            if ext.starts_with('.') {
                ext
            } else {
                format!(".{}", ext)
            }
        })
        .collect()
}

impl ConfigSetup for UploadConfig {
    fn name(&self) -> &'static str {
        "upload"
    }

    fn setup(&self) -> Result<(), ConfigError> {
        info!("Upload directory: {}", self.upload_dir.display());
        info!("Max file size: {}MB", self.max_file_size_mb);
        debug!("Allowed extensions: {}", self.allowed_extensions.join(", "));

        std::fs::create_dir_all(&self.upload_dir).map_err(|e| ConfigError::Setup {
            component: "upload",
            reason: format!("cannot create {}: {}", self.upload_dir.display(), e),
        })
    }
}
