// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Router, shared state and service wiring

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::critique::{critique_handler, STORAGE_HEADER};
use super::health::{
    analysis_health_handler, health_handler, root_handler, vector_db_health_handler,
};
use super::similar::similar_handler;
use crate::analysis::AnalysisService;
use crate::config::vector_db::EMBEDDING_DIMENSION;
use crate::config::AppConfig;
use crate::embeddings::load_embedder;
use crate::generator::{CritiqueGenerator, GeminiClient};
use crate::vector::{CritiqueStore, QdrantClient, VectorService};

/// Room for multipart boundaries and the comment field on top of the file
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub analysis: Arc<AnalysisService>,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        generator: Arc<dyn CritiqueGenerator>,
        store: Option<Arc<dyn CritiqueStore>>,
    ) -> Self {
        let analysis = AnalysisService::new(config.upload.clone(), generator, store);
        Self {
            config,
            analysis: Arc::new(analysis),
        }
    }

    /// Build the production clients described by `config`
    ///
    /// A missing or broken embedding model disables vector storage instead
    /// of failing startup.
    pub async fn from_config(config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let roots = config
            .ssl
            .extra_root_certificates()
            .context("Failed to read CA bundle")?;

        let generator = GeminiClient::with_root_certificates(&config.gemini, roots.clone())
            .context("Failed to build Gemini client")?;

        let store: Option<Arc<dyn CritiqueStore>> =
            match load_embedder(&config.embedding, EMBEDDING_DIMENSION).await {
                Ok(embedder) => {
                    let db = QdrantClient::with_root_certificates(
                        &config.vector_db.base_url(),
                        config.vector_db.timeout(),
                        roots,
                    )
                    .context("Failed to build vector database client")?;
                    Some(Arc::new(VectorService::new(
                        Arc::new(db),
                        embedder,
                        config.vector_db.collection.clone(),
                        config.vector_db.timeout(),
                    )))
                }
                Err(e) => {
                    warn!("Embedding model unavailable, vector storage disabled: {:#}", e);
                    None
                }
            };

        Ok(Self::new(config, Arc::new(generator), store))
    }

    pub fn store(&self) -> Option<&Arc<dyn CritiqueStore>> {
        self.analysis.store()
    }
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state
        .config
        .upload
        .max_file_size_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let cors = cors_layer(&state.config.allowed_origins);

    let analysis = Router::new()
        .route("/critique", post(critique_handler))
        .route("/health", get(analysis_health_handler))
        .route("/vector-db-health", get(vector_db_health_handler))
        .route("/similar", get(similar_handler));

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .nest("/analysis", analysis)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the configured origins; `*` mirrors the caller's origin
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();
        info!("CORS allowed origins: {:?}", origins);
        AllowOrigin::list(values)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .expose_headers([HeaderName::from_static(STORAGE_HEADER)])
}
