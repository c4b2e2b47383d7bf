// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! In-process vector database

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::database::VectorDatabase;
use super::types::{Distance, ScoredPoint, VectorDbError, VectorPoint};

struct Collection {
    dimension: usize,
    points: HashMap<u64, VectorPoint>,
}

/// Vector database kept in memory, used for tests and local runs
///
/// Search ranks by cosine similarity regardless of the requested distance.
/// [`set_available`](Self::set_available) simulates an unreachable server.
pub struct InMemoryVectorDatabase {
    collections: RwLock<HashMap<String, Collection>>,
    available: AtomicBool,
}

impl Default for InMemoryVectorDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryVectorDatabase {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub async fn point_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|c| c.points.len())
            .unwrap_or(0)
    }

    pub async fn get_point(&self, collection: &str, id: u64) -> Option<VectorPoint> {
        self.collections
            .read()
            .await
            .get(collection)
            .and_then(|c| c.points.get(&id).cloned())
    }

    /// Drop a collection and its points, as an operator deleting it would
    pub async fn remove_collection(&self, collection: &str) -> bool {
        self.collections.write().await.remove(collection).is_some()
    }

    fn check_available(&self) -> Result<(), VectorDbError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(VectorDbError::Connection("in-memory database is offline".to_string()))
        }
    }
}

#[async_trait]
impl VectorDatabase for InMemoryVectorDatabase {
    async fn list_collections(&self) -> Result<Vec<String>, VectorDbError> {
        self.check_available()?;
        Ok(self.collections.read().await.keys().cloned().collect())
    }

    async fn create_collection(
        &self,
        name: &str,
        dimension: usize,
        _distance: Distance,
    ) -> Result<(), VectorDbError> {
        self.check_available()?;
        let mut collections = self.collections.write().await;
        if collections.contains_key(name) {
            return Err(VectorDbError::Http {
                status: 409,
                message: format!("Collection `{}` already exists!", name),
            });
        }
        collections.insert(
            name.to_string(),
            Collection {
                dimension,
                points: HashMap::new(),
            },
        );
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> Result<(), VectorDbError> {
        self.check_available()?;
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| VectorDbError::CollectionNotFound(collection.to_string()))?;

        for point in &points {
            if point.vector.len() != target.dimension {
                return Err(VectorDbError::DimensionMismatch {
                    expected: target.dimension,
                    actual: point.vector.len(),
                });
            }
        }
        for point in points {
            target.points.insert(point.id, point);
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, VectorDbError> {
        self.check_available()?;
        let collections = self.collections.read().await;
        let target = collections
            .get(collection)
            .ok_or_else(|| VectorDbError::CollectionNotFound(collection.to_string()))?;

        if vector.len() != target.dimension {
            return Err(VectorDbError::DimensionMismatch {
                expected: target.dimension,
                actual: vector.len(),
            });
        }

        let mut results: Vec<ScoredPoint> = target
            .points
            .values()
            .map(|point| ScoredPoint {
                id: point.id,
                score: cosine_similarity(&vector, &point.vector),
                payload: point.payload.clone(),
            })
            .collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(limit);
        Ok(results)
    }

    fn name(&self) -> &'static str {
        "in-memory"
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}
