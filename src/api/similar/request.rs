// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Similar critique search request

use serde::Deserialize;

use crate::api::errors::ApiError;

pub const DEFAULT_LIMIT: usize = 5;
pub const MAX_LIMIT: usize = 50;

#[derive(Debug, Clone, Deserialize)]
pub struct SimilarRequest {
    #[serde(default)]
    pub query: String,
    pub limit: Option<usize>,
}

impl SimilarRequest {
    /// Non-empty query text
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.query.trim().is_empty() {
            return Err(ApiError::ValidationError {
                field: "query".to_string(),
                message: "query must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Requested limit, defaulted and clamped to 1..=50
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}
