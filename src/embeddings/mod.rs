// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text embeddings for critique similarity

pub mod onnx_model;

pub use onnx_model::OnnxEmbeddingModel;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::info;

use crate::config::{EmbeddingBackend, EmbeddingConfig};

/// Turns text into a fixed-size vector
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;
}

#[async_trait]
impl TextEmbedder for OnnxEmbeddingModel {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let model = self.clone();
        let text = text.to_string();
        tokio::task::spawn_blocking(move || model.embed_blocking(&text))
            .await
            .map_err(|e| anyhow!("Embedding task failed: {}", e))?
    }

    fn dimension(&self) -> usize {
        OnnxEmbeddingModel::dimension(self)
    }

    fn model_name(&self) -> &str {
        OnnxEmbeddingModel::model_name(self)
    }
}

/// Deterministic embedder based on feature hashing
///
/// Every lowercase word is hashed into a signed bucket, so texts sharing
/// vocabulary land close to each other. Output is L2-normalized. Text with
/// no words falls back to a pseudo-random vector seeded by its hash.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(anyhow!("Embedding dimension must be greater than 0"));
        }
        Ok(Self { dimension })
    }

    pub fn generate(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimension];
        let mut words = 0usize;

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let digest = Sha256::digest(word.to_lowercase().as_bytes());
            let bucket = u64::from_be_bytes(digest_prefix(&digest)) as usize % self.dimension;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            embedding[bucket] += sign;
            words += 1;
        }

        if words == 0 {
            let digest = Sha256::digest(text.as_bytes());
            let mut seed = u64::from_be_bytes(digest_prefix(&digest));
            for (i, value) in embedding.iter_mut().enumerate() {
                // Linear congruential generator
                seed = seed.wrapping_mul(1664525).wrapping_add(1013904223) ^ (i as u64);
                *value = ((seed as f64 / u64::MAX as f64) * 2.0 - 1.0) as f32;
            }
        }

        l2_normalize(&mut embedding);
        embedding
    }
}

#[async_trait]
impl TextEmbedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.generate(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "feature-hashing"
    }
}

fn digest_prefix(digest: &[u8]) -> [u8; 8] {
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    prefix
}

pub(crate) fn l2_normalize(values: &mut [f32]) {
    let norm = values.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in values.iter_mut() {
            *value /= norm;
        }
    }
}

/// Build the embedder selected in configuration
pub async fn load_embedder(config: &EmbeddingConfig, dimension: usize) -> Result<Arc<dyn TextEmbedder>> {
    match config.backend {
        EmbeddingBackend::Onnx => {
            let model = OnnxEmbeddingModel::new(
                config.model_name.clone(),
                &config.model_path,
                &config.tokenizer_path,
                config.pooling,
            )
            .await?;
            if model.dimension() != dimension {
                return Err(anyhow!(
                    "Embedding model produces {}-d vectors, collection expects {}",
                    model.dimension(),
                    dimension
                ));
            }
            Ok(Arc::new(model))
        }
        EmbeddingBackend::Hashing => {
            info!("Using feature-hashing embedder ({}-d)", dimension);
            Ok(Arc::new(HashingEmbedder::new(dimension)?))
        }
    }
}
