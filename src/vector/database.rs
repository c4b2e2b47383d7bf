// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Storage backend seam for critique vectors

use async_trait::async_trait;

use super::types::{Distance, ScoredPoint, VectorDbError, VectorPoint};

/// Minimal vector database operations used by the service
#[async_trait]
pub trait VectorDatabase: Send + Sync {
    /// Names of existing collections; doubles as the connectivity probe
    async fn list_collections(&self) -> Result<Vec<String>, VectorDbError>;

    async fn create_collection(
        &self,
        name: &str,
        dimension: usize,
        distance: Distance,
    ) -> Result<(), VectorDbError>;

    /// Insert or replace points by id
    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> Result<(), VectorDbError>;

    /// Nearest neighbours, best match first
    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, VectorDbError>;

    /// Product name reported by health checks
    fn name(&self) -> &'static str;
}
