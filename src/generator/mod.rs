// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multimodal critique generation

pub mod gemini;
pub mod prompts;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::analysis::{CritiqueValidationError, StructuredCritique};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request to model failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("model API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("model did not answer within {seconds}s")]
    Timeout { seconds: u64 },

    #[error("model refused to answer: {reason}")]
    Blocked { reason: String },

    #[error("model returned no content")]
    EmptyResponse,

    #[error("model output failed validation: {0}")]
    InvalidOutput(#[from] CritiqueValidationError),
}

/// Produces a structured critique for one image
///
/// Implementations must return either a fully validated critique or an
/// error; partial critiques are never produced.
#[async_trait]
pub trait CritiqueGenerator: Send + Sync {
    async fn analyze(
        &self,
        image: &[u8],
        mime_type: &str,
        user_comment: Option<&str>,
    ) -> Result<StructuredCritique, GenerationError>;

    fn model_name(&self) -> &str;
}
