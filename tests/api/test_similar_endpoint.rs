// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! GET /analysis/similar backed by the in-memory vector database

use artmentor::analysis::ArtCritique;
use artmentor::api::create_app;
use artmentor::embeddings::HashingEmbedder;
use artmentor::vector::{CritiqueStore, InMemoryVectorDatabase, VectorService};
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use crate::common::{sample_critique, test_state, ScriptedGenerator};

async fn seeded_store() -> Arc<VectorService> {
    let service = Arc::new(VectorService::new(
        Arc::new(InMemoryVectorDatabase::new()),
        Arc::new(HashingEmbedder::new(384).unwrap()),
        "art_portfolio",
        Duration::from_secs(5),
    ));
    let critique = ArtCritique::from_critique(&sample_critique());
    for name in ["one.png", "two.png", "three.png"] {
        service.save_critique(&critique, name).await.unwrap();
    }
    service
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_similar_returns_ranked_results() {
    let store = seeded_store().await;
    let app = create_app(test_state(ScriptedGenerator::succeeding(), Some(store)));

    let (status, body) = get(app, "/analysis/similar?query=hand%20anatomy&limit=2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "hand anatomy");
    assert_eq!(body["count"], 2);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["score"], 7);
    assert!(results[0]["similarity_score"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_similar_default_limit() {
    let store = seeded_store().await;
    let app = create_app(test_state(ScriptedGenerator::succeeding(), Some(store)));

    let (status, body) = get(app, "/analysis/similar?query=perspective").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
}

#[tokio::test]
async fn test_similar_blank_query_rejected() {
    let store = seeded_store().await;
    let app = create_app(test_state(ScriptedGenerator::succeeding(), Some(store)));

    let (status, body) = get(app, "/analysis/similar?query=%20%20").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "validation_error");
}

#[tokio::test]
async fn test_similar_without_store_unavailable() {
    let app = create_app(test_state(ScriptedGenerator::succeeding(), None));

    let (status, body) = get(app, "/analysis/similar?query=hands").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error_type"], "service_unavailable");
}

#[tokio::test]
async fn test_similar_bad_limit_rejected() {
    let app = create_app(test_state(ScriptedGenerator::succeeding(), None));

    let (status, _) = get(app, "/analysis/similar?query=hands&limit=lots").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
