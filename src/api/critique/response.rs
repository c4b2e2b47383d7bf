// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Critique response types

use serde::{Deserialize, Serialize};

use crate::analysis::StructuredCritique;

/// Body of a successful critique
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CritiqueResponse {
    pub summary: String,
    pub score: u8,
    pub technical_errors: Vec<String>,
    pub constructive_advice: String,
}

impl From<&StructuredCritique> for CritiqueResponse {
    fn from(critique: &StructuredCritique) -> Self {
        Self {
            summary: critique.summary().to_string(),
            score: critique.score(),
            technical_errors: critique.technical_errors().to_vec(),
            constructive_advice: critique.constructive_advice().to_string(),
        }
    }
}
