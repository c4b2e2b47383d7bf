// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Artwork analysis pipeline
//!
//! Validates an uploaded image, asks the critique generator for a structured
//! critique and then tries to persist it in the vector store. Storage is best
//! effort: its failure is logged and reported in [`StorageOutcome`], never as
//! an error.

pub mod critique;
pub mod service;
pub mod upload;

pub use critique::{ArtCritique, CritiqueValidationError, StructuredCritique};
pub use service::{AnalysisError, AnalysisService, CritiqueOutcome, StorageOutcome};
pub use upload::{UploadError, UploadedImage, ValidatedUpload};
