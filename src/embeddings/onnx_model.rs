// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX sentence embedding model
//!
//! Runs a BERT-style sentence transformer (bge-small-en-v1.5 by default)
//! through ONNX Runtime on the CPU:
//! - tokenization with truncation to the model's context length
//! - `[CLS]` pooling (BGE) or attention-mask weighted mean pooling (MiniLM)
//! - L2 normalization so cosine and dot product agree
//! - 384-dimensional output vectors

use anyhow::{anyhow, Context, Result};
use ndarray::{Array2, ArrayView2, Axis};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::info;

use super::l2_normalize;
use crate::config::vector_db::{Pooling, EMBEDDING_DIMENSION};

/// Maximum sequence length accepted by BERT-small models
const MAX_SEQUENCE_LENGTH: usize = 512;

/// ONNX-based embedding model
///
/// Cloning is cheap: the session and tokenizer are shared. The session sits
/// behind a mutex because inference needs exclusive access.
#[derive(Clone)]
pub struct OnnxEmbeddingModel {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    model_name: String,
    pooling: Pooling,
    dimension: usize,
}

impl std::fmt::Debug for OnnxEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingModel")
            .field("model_name", &self.model_name)
            .field("pooling", &self.pooling)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl OnnxEmbeddingModel {
    /// Load the model and tokenizer from disk
    ///
    /// Runs one validation inference and fails unless the model yields
    /// token embeddings of [`EMBEDDING_DIMENSION`] width.
    pub async fn new<P: AsRef<Path>>(
        model_name: impl Into<String>,
        model_path: P,
        tokenizer_path: P,
        pooling: Pooling,
    ) -> Result<Self> {
        let model_name = model_name.into();
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("ONNX model file not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }

        info!(
            "Loading ONNX embedding model {} from {} ({:?} pooling)",
            model_name,
            model_path.display(),
            pooling
        );
        let mut session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;
        tokenizer.with_padding(None);

        let probe = run_inference(&mut session, &tokenizer, "validation test", pooling)
            .context("Embedding model validation failed")?;
        if probe.len() != EMBEDDING_DIMENSION {
            anyhow::bail!(
                "Model outputs {}-d embeddings (expected {})",
                probe.len(),
                EMBEDDING_DIMENSION
            );
        }

        info!("ONNX embedding model loaded ({}-d)", EMBEDDING_DIMENSION);
        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model_name,
            pooling,
            dimension: EMBEDDING_DIMENSION,
        })
    }

    /// Embed one text on the current thread
    pub fn embed_blocking(&self, text: &str) -> Result<Vec<f32>> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("ONNX session lock poisoned"))?;
        let mut embedding = run_inference(&mut session, &self.tokenizer, text, self.pooling)?;
        if embedding.len() != self.dimension {
            anyhow::bail!(
                "Unexpected embedding dimension: {} (expected {})",
                embedding.len(),
                self.dimension
            );
        }
        l2_normalize(&mut embedding);
        Ok(embedding)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn pooling(&self) -> Pooling {
        self.pooling
    }
}

/// Tokenize, run the model and pool the token embeddings
fn run_inference(
    session: &mut Session,
    tokenizer: &Tokenizer,
    text: &str,
    pooling: Pooling,
) -> Result<Vec<f32>> {
    let encoding = tokenizer
        .encode(text, true)
        .map_err(|e| anyhow!("Tokenization failed: {}", e))?;

    let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
    let attention_mask: Vec<i64> = encoding
        .get_attention_mask()
        .iter()
        .map(|&m| m as i64)
        .collect();
    let token_type_ids = vec![0i64; input_ids.len()];
    let seq_len = input_ids.len();

    let input_ids_array = Array2::from_shape_vec((1, seq_len), input_ids)
        .context("Failed to create input_ids array")?;
    let attention_mask_array = Array2::from_shape_vec((1, seq_len), attention_mask.clone())
        .context("Failed to create attention_mask array")?;
    let token_type_ids_array = Array2::from_shape_vec((1, seq_len), token_type_ids)
        .context("Failed to create token_type_ids array")?;

    let outputs = session.run(ort::inputs![
        "input_ids" => Value::from_array(input_ids_array)?,
        "attention_mask" => Value::from_array(attention_mask_array)?,
        "token_type_ids" => Value::from_array(token_type_ids_array)?
    ])?;

    // First output holds token embeddings: [batch, seq_len, hidden_dim]
    let output = outputs[0]
        .try_extract_array::<f32>()
        .context("Failed to extract output tensor")?;
    if output.ndim() != 3 {
        anyhow::bail!(
            "Model outputs unexpected shape {:?} (expected [batch, seq_len, hidden])",
            output.shape()
        );
    }

    let tokens = output.index_axis(Axis(0), 0);
    let tokens = tokens
        .into_dimensionality::<ndarray::Ix2>()
        .context("Token embeddings are not two-dimensional")?;
    pool(tokens, &attention_mask, pooling)
}

/// Collapse `[seq_len, hidden]` token embeddings into one vector (not normalized)
pub(crate) fn pool(
    tokens: ArrayView2<'_, f32>,
    attention_mask: &[i64],
    pooling: Pooling,
) -> Result<Vec<f32>> {
    if tokens.nrows() == 0 {
        anyhow::bail!("Model returned no token embeddings");
    }

    match pooling {
        Pooling::Cls => Ok(tokens.row(0).to_vec()),
        Pooling::Mean => {
            let mut pooled = vec![0.0f32; tokens.ncols()];
            let mut sum_mask = 0.0f32;
            for (i, token) in tokens.outer_iter().enumerate() {
                let mask = attention_mask.get(i).copied().unwrap_or(0) as f32;
                sum_mask += mask;
                for (acc, value) in pooled.iter_mut().zip(token.iter()) {
                    *acc += value * mask;
                }
            }
            for value in &mut pooled {
                *value /= sum_mask.max(1e-9);
            }
            Ok(pooled)
        }
    }
}
