// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Uploaded image and its acceptance rules

use std::path::Path;
use thiserror::Error;

use crate::config::UploadConfig;

/// MIME type assumed when the client does not declare one
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// Rejection reasons for an upload, checked in declaration order
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UploadError {
    #[error("No file provided")]
    MissingFile,

    #[error("Extension not allowed. Use: {}", allowed.join(", "))]
    InvalidExtension { allowed: Vec<String> },

    #[error("MIME type not allowed. Use: {}", allowed.join(", "))]
    InvalidMimeType { allowed: Vec<String> },

    #[error("File is empty")]
    Empty,

    #[error("File too large (max {max_mb}MB)")]
    TooLarge { max_mb: u64 },
}

/// Image received from a client
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    /// Declared content type, if any
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
    pub user_comment: Option<String>,
}

/// Upload that passed every check
#[derive(Debug, Clone)]
pub struct ValidatedUpload<'a> {
    pub filename: &'a str,
    pub mime_type: String,
    pub bytes: &'a [u8],
    pub user_comment: Option<&'a str>,
}

impl UploadedImage {
    pub fn new(filename: impl Into<String>, mime_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type,
            bytes,
            user_comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.user_comment = Some(comment.into());
        self
    }

    /// Lowercase extension with its leading dot, empty if the name has none
    pub fn extension(&self) -> String {
        Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_lowercase()))
            .unwrap_or_default()
    }

    /// Declared MIME type without parameters, lowercased
    pub fn effective_mime_type(&self) -> String {
        self.mime_type
            .as_deref()
            .and_then(|m| m.split(';').next())
            .map(|m| m.trim().to_lowercase())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string())
    }

    /// Check extension, then MIME type, then size
    pub fn validate(&self, config: &UploadConfig) -> Result<ValidatedUpload<'_>, UploadError> {
        if !config.allowed_extensions.contains(&self.extension()) {
            return Err(UploadError::InvalidExtension {
                allowed: config.allowed_extensions.clone(),
            });
        }

        let mime_type = self.effective_mime_type();
        if !config.allowed_mime_types.contains(&mime_type) {
            return Err(UploadError::InvalidMimeType {
                allowed: config.allowed_mime_types.clone(),
            });
        }

        if self.bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        if self.bytes.len() > config.max_file_size_bytes() {
            return Err(UploadError::TooLarge {
                max_mb: config.max_file_size_mb,
            });
        }

        Ok(ValidatedUpload {
            filename: &self.filename,
            mime_type,
            bytes: &self.bytes,
            user_comment: self
                .user_comment
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty()),
        })
    }
}
