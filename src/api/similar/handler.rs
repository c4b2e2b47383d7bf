// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Similar critique search handler

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};

use super::request::SimilarRequest;
use super::response::SimilarResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;

/// GET /analysis/similar?query=<text>&limit=<n>
pub async fn similar_handler(
    State(state): State<AppState>,
    request: Result<Query<SimilarRequest>, QueryRejection>,
) -> Result<Json<SimilarResponse>, ApiError> {
    let Query(request) = request.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    request.validate()?;

    let store = state
        .store()
        .ok_or_else(|| ApiError::ServiceUnavailable("Vector storage is disabled".to_string()))?;

    let results = store
        .search_similar(&request.query, request.effective_limit())
        .await?;

    Ok(Json(SimilarResponse {
        query: request.query,
        count: results.len(),
        results,
    }))
}
