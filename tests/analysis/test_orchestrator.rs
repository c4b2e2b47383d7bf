// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Orchestration tests: generation gating and best-effort storage

use artmentor::analysis::{AnalysisError, AnalysisService, StorageOutcome, UploadError, UploadedImage};
use artmentor::config::UploadConfig;
use artmentor::generator::GenerationError;
use artmentor::vector::CritiqueStore;
use std::sync::Arc;

use crate::common::{sample_critique, GeneratorScript, ScriptedGenerator, ScriptedStore, StoreScript};

fn png(name: &str) -> UploadedImage {
    UploadedImage::new(name, Some("image/png".to_string()), vec![0x89, b'P', b'N', b'G'])
}

fn service(generator: Arc<ScriptedGenerator>, store: Option<Arc<ScriptedStore>>) -> AnalysisService {
    AnalysisService::new(
        UploadConfig::default(),
        generator,
        store.map(|s| s as Arc<dyn CritiqueStore>),
    )
}

#[tokio::test]
async fn test_success_stores_critique() {
    let generator = ScriptedGenerator::succeeding();
    let store = ScriptedStore::new(StoreScript::Succeed);
    let service = service(generator.clone(), Some(store.clone()));

    let outcome = service
        .handle_critique_request(&png("portrait.png"))
        .await
        .unwrap();

    assert_eq!(outcome.critique, sample_critique());
    assert_eq!(
        outcome.storage,
        StorageOutcome::Stored {
            point_id: "42".to_string()
        }
    );
    assert_eq!(generator.call_count(), 1);

    let saved = store.saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].0, "portrait.png");
    assert_eq!(saved[0].1.score, 7);
    assert_eq!(saved[0].1.constructive_advice, sample_critique().constructive_advice());
}

#[tokio::test]
async fn test_generator_failure_never_touches_storage() {
    for script in [GeneratorScript::Timeout, GeneratorScript::InvalidOutput] {
        let generator = ScriptedGenerator::new(script);
        let store = ScriptedStore::new(StoreScript::Succeed);
        let service = service(generator, Some(store.clone()));

        let err = service
            .handle_critique_request(&png("a.png"))
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisError::Generation(_)));
        assert_eq!(store.save_count(), 0);
    }
}

#[tokio::test]
async fn test_invalid_output_keeps_cause() {
    let service = service(ScriptedGenerator::new(GeneratorScript::InvalidOutput), None);
    let err = service
        .handle_critique_request(&png("a.png"))
        .await
        .unwrap_err();
    match err {
        AnalysisError::Generation(GenerationError::InvalidOutput(cause)) => {
            assert!(cause.to_string().contains("score"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_storage_error_is_swallowed() {
    let store = ScriptedStore::new(StoreScript::ConnectionError);
    let service = service(ScriptedGenerator::succeeding(), Some(store.clone()));

    let outcome = service
        .handle_critique_request(&png("a.png"))
        .await
        .unwrap();

    assert_eq!(outcome.critique, sample_critique());
    assert!(matches!(
        outcome.storage,
        StorageOutcome::Failed { ref reason } if reason.contains("connection refused")
    ));
    assert_eq!(store.save_count(), 1);
}

#[tokio::test]
async fn test_storage_panic_is_contained() {
    let store = ScriptedStore::new(StoreScript::Panic);
    let service = service(ScriptedGenerator::succeeding(), Some(store));

    let outcome = service
        .handle_critique_request(&png("a.png"))
        .await
        .unwrap();

    assert_eq!(outcome.critique, sample_critique());
    assert_eq!(outcome.storage.as_str(), "failed");
}

#[tokio::test]
async fn test_without_store_storage_is_skipped() {
    let service = service(ScriptedGenerator::succeeding(), None);
    let outcome = service
        .handle_critique_request(&png("a.png"))
        .await
        .unwrap();
    assert_eq!(outcome.storage, StorageOutcome::Skipped);
}

#[tokio::test]
async fn test_validation_failure_skips_generation() {
    let generator = ScriptedGenerator::succeeding();
    let store = ScriptedStore::new(StoreScript::Succeed);
    let service = service(generator.clone(), Some(store.clone()));

    let err = service
        .handle_critique_request(&UploadedImage::new("a.png", None, vec![]))
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::Upload(UploadError::Empty)));
    assert_eq!(generator.call_count(), 0);
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn test_generator_receives_mime_and_comment() {
    let generator = ScriptedGenerator::succeeding();
    let service = service(generator.clone(), None);

    let image = UploadedImage::new("study.JPG", None, vec![1, 2, 3]).with_comment("  first try at oils ");
    service.handle_critique_request(&image).await.unwrap();

    assert_eq!(generator.last_mime.lock().unwrap().as_deref(), Some("image/jpeg"));
    assert_eq!(
        generator.last_comment.lock().unwrap().as_deref(),
        Some("first try at oils")
    );
}
