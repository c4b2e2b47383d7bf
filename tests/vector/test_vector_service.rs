// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! VectorService persistence tests against the in-memory database

use artmentor::analysis::{ArtCritique, StructuredCritique};
use artmentor::embeddings::HashingEmbedder;
use artmentor::vector::{
    point_id_for, CritiqueStore, Distance, InMemoryVectorDatabase, ScoredPoint, StorageError,
    VectorDatabase, VectorDbError, VectorPoint, VectorService,
};
use async_trait::async_trait;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::common::sample_critique;

const COLLECTION: &str = "art_portfolio";

fn setup() -> (Arc<InMemoryVectorDatabase>, VectorService) {
    let db = Arc::new(InMemoryVectorDatabase::new());
    let service = VectorService::new(
        db.clone(),
        Arc::new(HashingEmbedder::new(384).unwrap()),
        COLLECTION,
        Duration::from_secs(5),
    );
    (db, service)
}

fn record(summary: &str, score: i64) -> ArtCritique {
    let critique = StructuredCritique::new(
        summary,
        score,
        vec!["Muddy shadows".to_string()],
        "Mix shadow colors from complements instead of black.",
    )
    .unwrap();
    ArtCritique::from_critique(&critique)
}

#[tokio::test]
async fn test_save_creates_collection_and_point() {
    let (db, service) = setup();
    assert!(db.list_collections().await.unwrap().is_empty());

    let id = service
        .save_critique(&ArtCritique::from_critique(&sample_critique()), "portrait.png")
        .await
        .unwrap();

    assert_eq!(id, point_id_for("portrait.png").to_string());
    assert_eq!(db.list_collections().await.unwrap(), vec![COLLECTION.to_string()]);

    let point = db.get_point(COLLECTION, point_id_for("portrait.png")).await.unwrap();
    assert_eq!(point.vector.len(), 384);
    assert_eq!(point.payload.filename, "portrait.png");
    assert_eq!(point.payload.score, 7);
    assert_eq!(point.payload.summary, sample_critique().summary());
    assert_eq!(point.payload.advice, sample_critique().constructive_advice());
    assert!(point.payload.timestamp.ends_with("+00:00"));
}

#[tokio::test]
async fn test_same_filename_last_write_wins() {
    let (db, service) = setup();

    service
        .save_critique(&record("First attempt at a still life", 4), "still_life.jpg")
        .await
        .unwrap();
    service
        .save_critique(&record("Second attempt, much improved", 8), "still_life.jpg")
        .await
        .unwrap();

    assert_eq!(db.point_count(COLLECTION).await, 1);
    let point = db
        .get_point(COLLECTION, point_id_for("still_life.jpg"))
        .await
        .unwrap();
    assert_eq!(point.payload.summary, "Second attempt, much improved");
    assert_eq!(point.payload.score, 8);
}

#[tokio::test]
async fn test_different_filenames_are_separate_points() {
    let (db, service) = setup();
    for name in ["a.png", "b.png", "c.png"] {
        service
            .save_critique(&record("Landscape with a river bend", 6), name)
            .await
            .unwrap();
    }
    assert_eq!(db.point_count(COLLECTION).await, 3);
}

#[tokio::test]
async fn test_invalid_record_rejected_before_database() {
    let (db, service) = setup();
    let mut bad = record("A perfectly fine summary", 5);
    bad.score = 0;

    let err = service.save_critique(&bad, "bad.png").await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidCritique(_)));
    // Nothing reached the database, not even collection creation
    assert!(db.list_collections().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_database_outage_is_storage_error() {
    let (db, service) = setup();
    db.set_available(false);

    let err = service
        .save_critique(&record("Portrait in graphite", 6), "p.png")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StorageError::Database {
            source: VectorDbError::Connection(_),
            ..
        }
    ));
}

#[tokio::test]
async fn test_collection_setup_retried_after_failure() {
    let (db, service) = setup();
    db.set_available(false);
    assert!(service.ensure_collection().await.is_err());

    db.set_available(true);
    service.ensure_collection().await.unwrap();
    assert_eq!(db.list_collections().await.unwrap(), vec![COLLECTION.to_string()]);

    // Already initialized: no second create attempt (which would 409)
    service.ensure_collection().await.unwrap();
}

#[tokio::test]
async fn test_existing_collection_reused() {
    let db = Arc::new(InMemoryVectorDatabase::new());
    db.create_collection(COLLECTION, 384, Distance::Cosine)
        .await
        .unwrap();
    let service = VectorService::new(
        db.clone(),
        Arc::new(HashingEmbedder::new(384).unwrap()),
        COLLECTION,
        Duration::from_secs(5),
    );

    service
        .save_critique(&record("Ink drawing of a cat", 7), "cat.png")
        .await
        .unwrap();
    assert_eq!(db.point_count(COLLECTION).await, 1);
}

#[tokio::test]
async fn test_health_check_mirrors_connectivity() {
    let (db, service) = setup();
    assert!(service.health_check().await);
    db.set_available(false);
    assert!(!service.health_check().await);
    db.set_available(true);
    assert!(service.health_check().await);
    assert_eq!(service.database_name(), "in-memory");
}

/// Database that never answers in time
struct StalledDatabase;

#[async_trait]
impl VectorDatabase for StalledDatabase {
    async fn list_collections(&self) -> Result<Vec<String>, VectorDbError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Vec::new())
    }

    async fn create_collection(&self, _: &str, _: usize, _: Distance) -> Result<(), VectorDbError> {
        Ok(())
    }

    async fn upsert(&self, _: &str, _: Vec<VectorPoint>) -> Result<(), VectorDbError> {
        Ok(())
    }

    async fn search(&self, _: &str, _: Vec<f32>, _: usize) -> Result<Vec<ScoredPoint>, VectorDbError> {
        Ok(Vec::new())
    }

    fn name(&self) -> &'static str {
        "stalled"
    }
}

#[tokio::test]
async fn test_deadline_enforced() {
    let service = VectorService::new(
        Arc::new(StalledDatabase),
        Arc::new(HashingEmbedder::new(384).unwrap()),
        COLLECTION,
        Duration::from_millis(50),
    );

    let err = service
        .save_critique(&record("Quick gesture sketches", 5), "g.png")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Timeout { .. }));
    assert!(!service.health_check().await);
}

#[tokio::test]
async fn test_deleted_collection_recreated_on_next_save() {
    let (db, service) = setup();
    service
        .save_critique(&record("Charcoal portrait study", 6), "first.png")
        .await
        .unwrap();

    assert!(db.remove_collection(COLLECTION).await);

    // The save that discovers the deletion fails without retrying
    let err = service
        .save_critique(&record("Charcoal portrait study", 6), "second.png")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StorageError::Database {
            source: VectorDbError::CollectionNotFound(_),
            ..
        }
    ));

    service
        .save_critique(&record("Charcoal portrait study", 6), "third.png")
        .await
        .unwrap();
    assert_eq!(db.list_collections().await.unwrap(), vec![COLLECTION.to_string()]);
    assert_eq!(db.point_count(COLLECTION).await, 1);
}

#[tokio::test]
async fn test_deleted_collection_recreated_after_search() {
    let (db, service) = setup();
    service.ensure_collection().await.unwrap();
    db.remove_collection(COLLECTION).await;

    assert!(service.search_similar("hands", 5).await.is_err());
    assert!(service.search_similar("hands", 5).await.unwrap().is_empty());
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_failed_save_logged_as_warning() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let (db, service) = setup();
    db.set_available(false);
    assert!(service
        .save_critique(&record("Pastel landscape at dusk", 5), "dusk.png")
        .await
        .is_err());

    let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert!(output.contains("WARN"));
    assert!(output.contains("Error saving critique for dusk.png"));
    assert!(!output.contains("ERROR"));
}
