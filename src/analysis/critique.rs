// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Structured critique model and its persisted form

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SUMMARY_MIN_CHARS: usize = 10;
pub const SUMMARY_MAX_CHARS: usize = 500;
pub const ADVICE_MIN_CHARS: usize = 20;
pub const ADVICE_MAX_CHARS: usize = 500;
pub const SCORE_MIN: u8 = 1;
pub const SCORE_MAX: u8 = 10;
pub const MAX_TECHNICAL_ERRORS: usize = 10;

/// Reasons a critique is not well-formed
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CritiqueValidationError {
    #[error("{field} must be between {min} and {max} characters, got {actual}")]
    FieldLength {
        field: &'static str,
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("score must be between {SCORE_MIN} and {SCORE_MAX}, got {0}")]
    ScoreOutOfRange(i64),

    #[error("technical_errors must have at most {MAX_TECHNICAL_ERRORS} entries, got {0}")]
    TooManyTechnicalErrors(usize),

    #[error("malformed critique JSON: {0}")]
    Malformed(String),
}

/// Unvalidated wire shape of a critique
#[derive(Debug, Clone, Deserialize)]
struct RawCritique {
    summary: String,
    score: i64,
    #[serde(default)]
    technical_errors: Vec<String>,
    constructive_advice: String,
}

/// A validated critique
///
/// Instances only exist after every field has passed validation, whether
/// they were built with [`StructuredCritique::new`] or deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCritique")]
pub struct StructuredCritique {
    summary: String,
    score: u8,
    technical_errors: Vec<String>,
    constructive_advice: String,
}

impl StructuredCritique {
    pub fn new(
        summary: impl Into<String>,
        score: i64,
        technical_errors: Vec<String>,
        constructive_advice: impl Into<String>,
    ) -> Result<Self, CritiqueValidationError> {
        let summary = summary.into();
        let constructive_advice = constructive_advice.into();

        check_length("summary", &summary, SUMMARY_MIN_CHARS, SUMMARY_MAX_CHARS)?;
        let score = u8::try_from(score)
            .ok()
            .filter(|s| (SCORE_MIN..=SCORE_MAX).contains(s))
            .ok_or(CritiqueValidationError::ScoreOutOfRange(score))?;
        if technical_errors.len() > MAX_TECHNICAL_ERRORS {
            return Err(CritiqueValidationError::TooManyTechnicalErrors(
                technical_errors.len(),
            ));
        }
        check_length(
            "constructive_advice",
            &constructive_advice,
            ADVICE_MIN_CHARS,
            ADVICE_MAX_CHARS,
        )?;

        Ok(Self {
            summary,
            score,
            technical_errors,
            constructive_advice,
        })
    }

    /// Parse and validate the model's raw JSON text
    pub fn from_model_output(text: &str) -> Result<Self, CritiqueValidationError> {
        let raw: RawCritique = serde_json::from_str(text.trim())
            .map_err(|e| CritiqueValidationError::Malformed(e.to_string()))?;
        Self::try_from(raw)
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn technical_errors(&self) -> &[String] {
        &self.technical_errors
    }

    pub fn constructive_advice(&self) -> &str {
        &self.constructive_advice
    }
}

impl TryFrom<RawCritique> for StructuredCritique {
    type Error = CritiqueValidationError;

    fn try_from(raw: RawCritique) -> Result<Self, Self::Error> {
        Self::new(
            raw.summary,
            raw.score,
            raw.technical_errors,
            raw.constructive_advice,
        )
    }
}

fn check_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), CritiqueValidationError> {
    let actual = value.chars().count();
    if actual < min || actual > max {
        return Err(CritiqueValidationError::FieldLength {
            field,
            min,
            max,
            actual,
        });
    }
    Ok(())
}

/// Critique as handed to the vector store
///
/// The timestamp is taken when this record is created.
#[derive(Debug, Clone)]
pub struct ArtCritique {
    pub summary: String,
    pub score: u8,
    pub technical_errors: Vec<String>,
    pub constructive_advice: String,
    pub timestamp: DateTime<Utc>,
}

impl ArtCritique {
    pub fn from_critique(critique: &StructuredCritique) -> Self {
        Self {
            summary: critique.summary.clone(),
            score: critique.score,
            technical_errors: critique.technical_errors.clone(),
            constructive_advice: critique.constructive_advice.clone(),
            timestamp: Utc::now(),
        }
    }

    /// Text the embedding is computed from: summary plus space-joined errors
    pub fn text_for_embedding(&self) -> String {
        format!("{} {}", self.summary, self.technical_errors.join(" "))
    }

    /// UTC ISO-8601 timestamp
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, false)
    }

    /// Re-check the critique invariants on a record that may have been built by hand
    pub fn validate(&self) -> Result<(), CritiqueValidationError> {
        StructuredCritique::new(
            self.summary.clone(),
            self.score as i64,
            self.technical_errors.clone(),
            self.constructive_advice.clone(),
        )
        .map(|_| ())
    }
}
