// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod analysis;
pub mod api;
pub mod cli;
pub mod config;
pub mod embeddings;
pub mod generator;
pub mod vector;
pub mod version;

// Re-export main types
pub use analysis::{AnalysisService, CritiqueOutcome, StorageOutcome, StructuredCritique};
pub use api::{create_app, AppState};
pub use config::{AppConfig, ConfigError};
pub use generator::{CritiqueGenerator, GeminiClient, GenerationError};
pub use vector::{CritiqueStore, StorageError, VectorService};
