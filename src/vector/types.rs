// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Numeric point identifier
pub type PointId = u64;

/// Similarity metric of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Distance {
    Cosine,
    Dot,
    Euclid,
}

/// Stored alongside every critique vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CritiquePayload {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub score: u8,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub advice: String,
    /// UTC ISO-8601 timestamp
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPoint {
    pub id: PointId,
    pub vector: Vec<f32>,
    pub payload: CritiquePayload,
}

/// Search hit as returned by the database
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoredPoint {
    pub id: PointId,
    pub score: f32,
    #[serde(default = "empty_payload")]
    pub payload: CritiquePayload,
}

fn empty_payload() -> CritiquePayload {
    CritiquePayload {
        filename: String::new(),
        score: 0,
        summary: String::new(),
        advice: String::new(),
        timestamp: String::new(),
    }
}

/// Past critique returned by similarity search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarCritique {
    pub similarity_score: f32,
    pub filename: String,
    pub score: u8,
    pub summary: String,
    pub advice: String,
    pub timestamp: String,
}

impl From<ScoredPoint> for SimilarCritique {
    fn from(point: ScoredPoint) -> Self {
        Self {
            similarity_score: point.score,
            filename: point.payload.filename,
            score: point.payload.score,
            summary: point.payload.summary,
            advice: point.payload.advice,
            timestamp: point.payload.timestamp,
        }
    }
}

#[derive(Error, Debug)]
pub enum VectorDbError {
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Database returned {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Unexpected response: {0}")]
    Decode(String),
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),
    #[error("Vector has {actual} dimensions, collection expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl From<reqwest::Error> for VectorDbError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            VectorDbError::Timeout
        } else if err.is_decode() {
            VectorDbError::Decode(err.to_string())
        } else {
            VectorDbError::Connection(err.to_string())
        }
    }
}
