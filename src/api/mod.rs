// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod critique;
pub mod errors;
pub mod health;
pub mod http_server;
pub mod server;
pub mod similar;
pub mod tls;

pub use critique::{critique_handler, CritiqueResponse, STORAGE_HEADER};
pub use errors::{ApiError, ErrorResponse};
pub use health::{HealthResponse, RootResponse, ServiceHealthResponse, VectorDbHealthResponse};
pub use http_server::{create_app, cors_layer, AppState};
pub use server::{serve, shutdown_signal};
pub use similar::{similar_handler, SimilarRequest, SimilarResponse};
