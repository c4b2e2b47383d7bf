// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod database;
pub mod memory;
pub mod qdrant;
pub mod service;
pub mod types;

pub use database::VectorDatabase;
pub use memory::InMemoryVectorDatabase;
pub use qdrant::QdrantClient;
pub use service::{point_id_for, CritiqueStore, StorageError, VectorService};
pub use types::{
    CritiquePayload, Distance, PointId, ScoredPoint, SimilarCritique, VectorDbError, VectorPoint,
};
