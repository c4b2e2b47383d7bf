// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vector database endpoint and embedding model configuration

use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use super::{ConfigError, ConfigSetup, Source};

/// Dimensionality of every stored critique vector
pub const EMBEDDING_DIMENSION: usize = 384;

#[derive(Debug, Clone)]
pub struct VectorDbConfig {
    /// Qdrant host (bare host name or full `http(s)://` origin)
    pub host: String,
    /// Qdrant REST port
    pub port: u16,
    /// Collection holding critique points
    pub collection: String,
    /// Deadline for each database call
    pub timeout_seconds: u64,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6333,
            collection: "art_portfolio".to_string(),
            timeout_seconds: 10,
        }
    }
}

impl VectorDbConfig {
    pub fn from_source(source: &Source) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            host: source.string_or("VECTOR_DB__HOST", &defaults.host),
            port: source.parse_or("VECTOR_DB__PORT", defaults.port)?,
            collection: source.string_or("VECTOR_DB__COLLECTION", &defaults.collection),
            timeout_seconds: source.parse_or("VECTOR_DB__TIMEOUT_SECONDS", defaults.timeout_seconds)?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collection.contains('/') {
            return Err(ConfigError::Invalid {
                key: "VECTOR_DB__COLLECTION".to_string(),
                value: self.collection.clone(),
                reason: "must not contain '/'".to_string(),
            });
        }
        if self.timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                key: "VECTOR_DB__TIMEOUT_SECONDS".to_string(),
                value: "0".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// REST base URL, e.g. `http://localhost:6333`
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}:{}", host, self.port)
        } else {
            format!("http://{}:{}", host, self.port)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl ConfigSetup for VectorDbConfig {
    fn name(&self) -> &'static str {
        "vector_db"
    }

    fn setup(&self) -> Result<(), ConfigError> {
        info!(
            "Vector database: {} (collection: {})",
            self.base_url(),
            self.collection
        );
        Ok(())
    }
}

/// Which embedder turns critiques into vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    /// ONNX sentence transformer loaded from disk
    Onnx,
    /// Deterministic hash-derived vectors (development and tests)
    Hashing,
}

impl std::str::FromStr for EmbeddingBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "onnx" => Ok(Self::Onnx),
            "hashing" | "hash" => Ok(Self::Hashing),
            other => Err(format!("unknown embedding backend '{}', use onnx or hashing", other)),
        }
    }
}

/// How token embeddings collapse into one sentence vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pooling {
    /// Hidden state of the first (`[CLS]`) token, as BGE models are trained
    Cls,
    /// Attention-mask weighted mean over all tokens (all-MiniLM style)
    Mean,
}

impl Pooling {
    /// Pooling the named model was trained with
    pub fn for_model(model_name: &str) -> Self {
        if model_name.to_lowercase().contains("bge") {
            Self::Cls
        } else {
            Self::Mean
        }
    }
}

impl std::str::FromStr for Pooling {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cls" => Ok(Self::Cls),
            "mean" => Ok(Self::Mean),
            other => Err(format!("unknown pooling '{}', use cls or mean", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    pub model_name: String,
    /// Defaults to the model's own pooling, see [`Pooling::for_model`]
    pub pooling: Pooling,
    /// Path to ONNX model file
    pub model_path: PathBuf,
    /// Path to tokenizer JSON file
    pub tokenizer_path: PathBuf,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Onnx,
            model_name: "bge-small-en-v1.5".to_string(),
            pooling: Pooling::Cls,
            model_path: PathBuf::from("./models/bge-small-en-v1.5-onnx/model.onnx"),
            tokenizer_path: PathBuf::from("./models/bge-small-en-v1.5-onnx/tokenizer.json"),
        }
    }
}

impl EmbeddingConfig {
    pub fn from_source(source: &Source) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let model_name = source.string_or("EMBEDDING__MODEL_NAME", &defaults.model_name);
        Ok(Self {
            backend: source.parse_or("EMBEDDING__BACKEND", defaults.backend)?,
            pooling: source.parse_or("EMBEDDING__POOLING", Pooling::for_model(&model_name))?,
            model_name,
            model_path: source.path("EMBEDDING__MODEL_PATH").unwrap_or(defaults.model_path),
            tokenizer_path: source
                .path("EMBEDDING__TOKENIZER_PATH")
                .unwrap_or(defaults.tokenizer_path),
        })
    }
}

impl ConfigSetup for EmbeddingConfig {
    fn name(&self) -> &'static str {
        "embedding"
    }

    fn setup(&self) -> Result<(), ConfigError> {
        match self.backend {
            EmbeddingBackend::Onnx => {
                info!(
                    "Embedding model: {} ({}-d, {:?} pooling)",
                    self.model_name, EMBEDDING_DIMENSION, self.pooling
                );
                if !self.model_path.is_file() {
                    warn!(
                        "Embedding model file not found: {} (vector storage will be disabled)",
                        self.model_path.display()
                    );
                }
            }
            EmbeddingBackend::Hashing => {
                warn!("Using hashing embedder: similarity search is not semantic");
            }
        }
        Ok(())
    }
}
