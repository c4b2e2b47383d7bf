// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Critique persistence and similarity search over a vector database

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::database::VectorDatabase;
use super::types::{CritiquePayload, Distance, PointId, SimilarCritique, VectorDbError, VectorPoint};
use crate::analysis::ArtCritique;
use crate::embeddings::TextEmbedder;

#[derive(Debug, Error)]
pub enum StorageError {
    /// The record handed to the store violates critique invariants
    #[error("Invalid critique: {0}")]
    InvalidCritique(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Vector database error during {operation}: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: VectorDbError,
    },

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Vector database did not respond within {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Unexpected storage error: {0}")]
    Unexpected(String),
}

/// Long-term memory of critiques
#[async_trait]
pub trait CritiqueStore: Send + Sync {
    /// Persist one critique, returning the point id it was stored under
    async fn save_critique(
        &self,
        critique: &ArtCritique,
        filename: &str,
    ) -> Result<String, StorageError>;

    /// Critiques most similar to `query`, best first
    async fn search_similar(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SimilarCritique>, StorageError>;

    /// Whether the database answers a trivial request
    async fn health_check(&self) -> bool;

    /// Product name reported by health checks
    fn database_name(&self) -> &str;
}

/// Point id for a filename: first 8 bytes of its SHA-256, big-endian
///
/// Stable across processes, so re-uploading the same filename replaces the
/// earlier critique.
pub fn point_id_for(filename: &str) -> PointId {
    let digest = Sha256::digest(filename.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

pub struct VectorService {
    db: Arc<dyn VectorDatabase>,
    embedder: Arc<dyn TextEmbedder>,
    collection: String,
    timeout: Duration,
    collection_ready: AtomicBool,
    /// Serializes check-then-create
    collection_setup: Mutex<()>,
}

impl VectorService {
    pub fn new(
        db: Arc<dyn VectorDatabase>,
        embedder: Arc<dyn TextEmbedder>,
        collection: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let collection = collection.into();
        info!(
            "Vector service using {} collection '{}' with {} embeddings ({}-d)",
            db.name(),
            collection,
            embedder.model_name(),
            embedder.dimension()
        );
        Self {
            db,
            embedder,
            collection,
            timeout,
            collection_ready: AtomicBool::new(false),
            collection_setup: Mutex::new(()),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Create the collection unless it exists
    ///
    /// Runs once per process; a failed attempt is retried on the next call,
    /// and so is one after the database reports the collection missing.
    pub async fn ensure_collection(&self) -> Result<(), StorageError> {
        if self.collection_ready.load(Ordering::Acquire) {
            return Ok(());
        }

        let _setup = self.collection_setup.lock().await;
        if self.collection_ready.load(Ordering::Acquire) {
            return Ok(());
        }

        let existing = self
            .db
            .list_collections()
            .await
            .map_err(|source| StorageError::Database {
                operation: "list collections",
                source,
            })?;

        if existing.iter().any(|name| name == &self.collection) {
            debug!("Collection '{}' already exists", self.collection);
        } else {
            match self
                .db
                .create_collection(&self.collection, self.embedder.dimension(), Distance::Cosine)
                .await
            {
                Ok(()) => info!("Created collection '{}'", self.collection),
                // Another writer may have created it in between
                Err(VectorDbError::Http { status: 409, .. }) => {}
                Err(source) => {
                    return Err(StorageError::Database {
                        operation: "create collection",
                        source,
                    })
                }
            }
        }

        self.collection_ready.store(true, Ordering::Release);
        Ok(())
    }

    /// Map a database failure, forgetting the collection if it has gone
    fn database_error(&self, operation: &'static str, source: VectorDbError) -> StorageError {
        if matches!(source, VectorDbError::CollectionNotFound(_)) {
            warn!(
                "Collection '{}' disappeared, it will be recreated on next use",
                self.collection
            );
            self.collection_ready.store(false, Ordering::Release);
        }
        StorageError::Database { operation, source }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, StorageError> {
        let vector = self
            .embedder
            .embed(text)
            .await
            .map_err(|e| StorageError::Embedding(e.to_string()))?;
        if vector.len() != self.embedder.dimension() {
            return Err(StorageError::Unexpected(format!(
                "embedder returned {} dimensions, expected {}",
                vector.len(),
                self.embedder.dimension()
            )));
        }
        Ok(vector)
    }

    async fn with_deadline<T, F>(&self, fut: F) -> Result<T, StorageError>
    where
        F: Future<Output = Result<T, StorageError>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| StorageError::Timeout {
                seconds: self.timeout.as_secs(),
            })?
    }

    async fn save_inner(&self, critique: &ArtCritique, filename: &str) -> Result<String, StorageError> {
        self.ensure_collection().await?;

        let vector = self.embed(&critique.text_for_embedding()).await?;
        let id = point_id_for(filename);
        let point = VectorPoint {
            id,
            vector,
            payload: CritiquePayload {
                filename: filename.to_string(),
                score: critique.score,
                summary: critique.summary.clone(),
                advice: critique.constructive_advice.clone(),
                timestamp: critique.timestamp_iso(),
            },
        };

        self.db
            .upsert(&self.collection, vec![point])
            .await
            .map_err(|source| self.database_error("upsert", source))?;
        Ok(id.to_string())
    }

    async fn search_inner(&self, query: &str, limit: usize) -> Result<Vec<SimilarCritique>, StorageError> {
        self.ensure_collection().await?;

        let vector = self.embed(query).await?;
        let mut hits: Vec<SimilarCritique> = self
            .db
            .search(&self.collection, vector, limit)
            .await
            .map_err(|source| self.database_error("search", source))?
            .into_iter()
            .map(SimilarCritique::from)
            .collect();

        hits.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
        hits.truncate(limit);
        Ok(hits)
    }
}

#[async_trait]
impl CritiqueStore for VectorService {
    async fn save_critique(
        &self,
        critique: &ArtCritique,
        filename: &str,
    ) -> Result<String, StorageError> {
        if let Err(e) = critique.validate() {
            warn!("Validation error saving critique for {}: {}", filename, e);
            return Err(StorageError::InvalidCritique(e.to_string()));
        }

        match self.with_deadline(self.save_inner(critique, filename)).await {
            Ok(id) => {
                info!("Critique saved in vector DB: {} (point {})", filename, id);
                Ok(id)
            }
            Err(e) => {
                warn!("Error saving critique for {}: {}", filename, e);
                Err(e)
            }
        }
    }

    async fn search_similar(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SimilarCritique>, StorageError> {
        if query.trim().is_empty() {
            return Err(StorageError::InvalidQuery("query must not be empty".to_string()));
        }
        if limit == 0 {
            return Err(StorageError::InvalidQuery("limit must be at least 1".to_string()));
        }

        self.with_deadline(self.search_inner(query, limit))
            .await
            .map_err(|e| {
                error!("Error searching similar critiques: {}", e);
                e
            })
    }

    async fn health_check(&self) -> bool {
        match tokio::time::timeout(self.timeout, self.db.list_collections()).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                warn!("Vector database health check failed: {}", e);
                false
            }
            Err(_) => {
                warn!("Vector database health check timed out");
                false
            }
        }
    }

    fn database_name(&self) -> &str {
        self.db.name()
    }
}
