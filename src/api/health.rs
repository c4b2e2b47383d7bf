// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service descriptor and health endpoints

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::http_server::AppState;

pub const ANALYSIS_SERVICE: &str = "ArtMentor AI - Analysis";
pub const VECTOR_DB_SERVICE: &str = "ArtMentor AI - Vector Database";
const DEFAULT_DATABASE_NAME: &str = "Qdrant";

const ENDPOINTS: &[&str] = &[
    "POST /analysis/critique",
    "GET /analysis/similar",
    "GET /analysis/health",
    "GET /analysis/vector-db-health",
    "GET /health",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub environment: String,
    pub status: String,
    pub endpoints: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub app: String,
    pub version: String,
    pub environment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceHealthResponse {
    pub status: String,
    pub service: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDbHealthResponse {
    /// "healthy" or "unavailable"
    pub status: String,
    pub service: String,
    pub database: String,
}

/// GET /
pub async fn root_handler(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        name: state.config.app_name.clone(),
        version: state.config.app_version.clone(),
        environment: state.config.environment.clone(),
        status: "running".to_string(),
        endpoints: ENDPOINTS.iter().map(|e| e.to_string()).collect(),
    })
}

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        app: state.config.app_name.clone(),
        version: state.config.app_version.clone(),
        environment: state.config.environment.clone(),
    })
}

/// GET /analysis/health
pub async fn analysis_health_handler() -> Json<ServiceHealthResponse> {
    Json(ServiceHealthResponse {
        status: "healthy".to_string(),
        service: ANALYSIS_SERVICE.to_string(),
    })
}

/// GET /analysis/vector-db-health - mirrors the store's connectivity probe
pub async fn vector_db_health_handler(
    State(state): State<AppState>,
) -> Json<VectorDbHealthResponse> {
    let (healthy, database) = match state.store() {
        Some(store) => (store.health_check().await, store.database_name().to_string()),
        None => (false, DEFAULT_DATABASE_NAME.to_string()),
    };

    Json(VectorDbHealthResponse {
        status: if healthy { "healthy" } else { "unavailable" }.to_string(),
        service: VECTOR_DB_SERVICE.to_string(),
        database,
    })
}
