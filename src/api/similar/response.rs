// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::Serialize;

use crate::vector::SimilarCritique;

#[derive(Debug, Clone, Serialize)]
pub struct SimilarResponse {
    pub query: String,
    pub count: usize,
    /// Best match first
    pub results: Vec<SimilarCritique>,
}
