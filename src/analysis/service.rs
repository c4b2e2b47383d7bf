// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Critique request orchestration

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::critique::{ArtCritique, StructuredCritique};
use super::upload::{UploadError, UploadedImage};
use crate::config::UploadConfig;
use crate::generator::{CritiqueGenerator, GenerationError};
use crate::vector::CritiqueStore;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Error analyzing image: {0}")]
    Generation(#[from] GenerationError),
}

/// What happened to the vector-store side effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOutcome {
    Stored { point_id: String },
    Failed { reason: String },
    /// No store is configured
    Skipped,
}

impl StorageOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageOutcome::Stored { .. } => "stored",
            StorageOutcome::Failed { .. } => "failed",
            StorageOutcome::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CritiqueOutcome {
    pub critique: StructuredCritique,
    pub storage: StorageOutcome,
}

/// Validates uploads, generates critiques and stores them best effort
pub struct AnalysisService {
    upload: UploadConfig,
    generator: Arc<dyn CritiqueGenerator>,
    store: Option<Arc<dyn CritiqueStore>>,
}

impl AnalysisService {
    pub fn new(
        upload: UploadConfig,
        generator: Arc<dyn CritiqueGenerator>,
        store: Option<Arc<dyn CritiqueStore>>,
    ) -> Self {
        Self {
            upload,
            generator,
            store,
        }
    }

    pub fn store(&self) -> Option<&Arc<dyn CritiqueStore>> {
        self.store.as_ref()
    }

    pub fn upload_config(&self) -> &UploadConfig {
        &self.upload
    }

    /// Run one critique request end to end
    ///
    /// Validation and generation errors abort the request. Storage never
    /// does: whatever the store does, including panicking, the critique is
    /// returned and the result is described by [`StorageOutcome`].
    pub async fn handle_critique_request(
        &self,
        image: &UploadedImage,
    ) -> Result<CritiqueOutcome, AnalysisError> {
        let upload = image.validate(&self.upload).map_err(|e| {
            info!("Rejected upload {}: {}", image.filename, e);
            e
        })?;

        info!(
            "Analyzing {} ({} bytes, {})",
            upload.filename,
            upload.bytes.len(),
            upload.mime_type
        );
        let critique = self
            .generator
            .analyze(upload.bytes, &upload.mime_type, upload.user_comment)
            .await?;

        let storage = self.store_best_effort(&critique, upload.filename).await;
        Ok(CritiqueOutcome { critique, storage })
    }

    async fn store_best_effort(&self, critique: &StructuredCritique, filename: &str) -> StorageOutcome {
        let Some(store) = self.store.clone() else {
            return StorageOutcome::Skipped;
        };

        let record = ArtCritique::from_critique(critique);
        let owned_filename = filename.to_string();
        let task = tokio::spawn(async move { store.save_critique(&record, &owned_filename).await });

        let reason = match task.await {
            Ok(Ok(point_id)) => return StorageOutcome::Stored { point_id },
            Ok(Err(e)) => e.to_string(),
            Err(e) => format!("storage task aborted: {}", e),
        };
        warn!(
            "Failed to store critique for {} in vector database: {}. Continuing with analysis response.",
            filename, reason
        );
        StorageOutcome::Failed { reason }
    }
}
