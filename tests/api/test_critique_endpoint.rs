// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /analysis/critique over the full router

use artmentor::api::{create_app, STORAGE_HEADER};
use artmentor::config::AppConfig;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
};
use serde_json::Value;
use tower::ServiceExt; // for `oneshot`

use crate::common::{
    multipart_body, multipart_content_type, test_state, test_state_with_config, FormPart,
    GeneratorScript, ScriptedGenerator, ScriptedStore, StoreScript,
};

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake image data";

fn png(filename: &str) -> FormPart<'_> {
    FormPart::File {
        filename,
        content_type: Some("image/png"),
        bytes: PNG_BYTES,
    }
}

fn critique_request(parts: &[FormPart]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/analysis/critique")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_critique_success_returns_four_fields() {
    let generator = ScriptedGenerator::succeeding();
    let store = ScriptedStore::new(StoreScript::Succeed);
    let app = create_app(test_state(generator.clone(), Some(store.clone())));

    let response = app.oneshot(critique_request(&[png("figure.png")])).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[STORAGE_HEADER], "stored");
    let body = json_body(response).await;
    let object = body.as_object().unwrap();
    assert_eq!(object.len(), 4);
    assert_eq!(body["summary"], "Figure drawing with good proportions");
    assert_eq!(body["score"], 7);
    assert_eq!(body["technical_errors"].as_array().unwrap().len(), 2);
    assert_eq!(
        body["constructive_advice"],
        "Practice head construction with guide lines."
    );

    assert_eq!(generator.call_count(), 1);
    let saved = store.saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].0, "figure.png");
    assert_eq!(saved[0].1.score, 7);
}

#[tokio::test]
async fn test_storage_failure_does_not_fail_request() {
    let store = ScriptedStore::new(StoreScript::ConnectionError);
    let app = create_app(test_state(ScriptedGenerator::succeeding(), Some(store.clone())));

    let response = app.oneshot(critique_request(&[png("figure.png")])).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[STORAGE_HEADER], "failed");
    assert_eq!(store.save_count(), 1);
    let body = json_body(response).await;
    assert_eq!(body["score"], 7);
}

#[tokio::test]
async fn test_without_store_storage_is_skipped() {
    let app = create_app(test_state(ScriptedGenerator::succeeding(), None));

    let response = app.oneshot(critique_request(&[png("figure.png")])).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[STORAGE_HEADER], "skipped");
}

#[tokio::test]
async fn test_generation_failure_is_server_error() {
    let generator = ScriptedGenerator::new(GeneratorScript::Timeout);
    let store = ScriptedStore::new(StoreScript::Succeed);
    let app = create_app(test_state(generator, Some(store.clone())));

    let response = app.oneshot(critique_request(&[png("figure.png")])).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error_type"], "analysis_failed");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Error analyzing image"));
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn test_out_of_range_model_output_is_server_error() {
    let generator = ScriptedGenerator::new(GeneratorScript::InvalidOutput);
    let app = create_app(test_state(generator, None));

    let response = app.oneshot(critique_request(&[png("figure.png")])).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_disallowed_extension_rejected() {
    let generator = ScriptedGenerator::succeeding();
    let app = create_app(test_state(generator.clone(), None));

    let response = app
        .oneshot(critique_request(&[FormPart::File {
            filename: "notes.txt",
            content_type: Some("image/png"),
            bytes: PNG_BYTES,
        }]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error_type"], "invalid_file_type");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Extension not allowed"));
    let allowed = body["details"]["allowed"].as_array().unwrap();
    assert!(allowed.iter().any(|a| a == ".png"));
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn test_disallowed_mime_type_rejected() {
    let generator = ScriptedGenerator::succeeding();
    let app = create_app(test_state(generator.clone(), None));

    let response = app
        .oneshot(critique_request(&[FormPart::File {
            filename: "drawing.png",
            content_type: Some("application/pdf"),
            bytes: PNG_BYTES,
        }]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("MIME type not allowed"));
    assert!(body["details"]["allowed"]
        .as_array()
        .unwrap()
        .iter()
        .any(|a| a == "image/png"));
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn test_missing_content_type_defaults_to_jpeg() {
    let generator = ScriptedGenerator::succeeding();
    let app = create_app(test_state(generator.clone(), None));

    let response = app
        .oneshot(critique_request(&[FormPart::File {
            filename: "photo.JPG",
            content_type: None,
            bytes: PNG_BYTES,
        }]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        generator.last_mime.lock().unwrap().as_deref(),
        Some("image/jpeg")
    );
}

#[tokio::test]
async fn test_empty_file_rejected() {
    let generator = ScriptedGenerator::succeeding();
    let app = create_app(test_state(generator.clone(), None));

    let response = app
        .oneshot(critique_request(&[FormPart::File {
            filename: "blank.png",
            content_type: Some("image/png"),
            bytes: b"",
        }]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["message"], "File is empty");
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn test_oversized_file_rejected() {
    let mut config = AppConfig::new_for_test();
    config.upload.max_file_size_mb = 1;
    let generator = ScriptedGenerator::succeeding();
    let app = create_app(test_state_with_config(config, generator.clone(), None));

    let bytes = vec![0u8; 1024 * 1024 + 1];
    let response = app
        .oneshot(critique_request(&[FormPart::File {
            filename: "huge.png",
            content_type: Some("image/png"),
            bytes: &bytes,
        }]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = json_body(response).await;
    assert_eq!(body["message"], "File too large (max 1MB)");
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn test_file_at_exact_limit_accepted() {
    let mut config = AppConfig::new_for_test();
    config.upload.max_file_size_mb = 1;
    let app = create_app(test_state_with_config(
        config,
        ScriptedGenerator::succeeding(),
        None,
    ));

    let bytes = vec![1u8; 1024 * 1024];
    let response = app
        .oneshot(critique_request(&[FormPart::File {
            filename: "edge.png",
            content_type: Some("image/png"),
            bytes: &bytes,
        }]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_file_field_rejected() {
    let generator = ScriptedGenerator::succeeding();
    let app = create_app(test_state(generator.clone(), None));

    let response = app
        .oneshot(critique_request(&[FormPart::Text {
            name: "user_comments",
            value: "Please look at the hands",
        }]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error_type"], "validation_error");
    assert_eq!(body["details"]["field"], "file");
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn test_non_multipart_body_rejected() {
    let app = create_app(test_state(ScriptedGenerator::succeeding(), None));

    let request = Request::builder()
        .method("POST")
        .uri("/analysis/critique")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"file":"nope"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error_type"], "invalid_request");
}

#[tokio::test]
async fn test_comment_forwarded_and_unknown_fields_ignored() {
    let generator = ScriptedGenerator::succeeding();
    let app = create_app(test_state(generator.clone(), None));

    let response = app
        .oneshot(critique_request(&[
            FormPart::Text {
                name: "title",
                value: "Morning study",
            },
            png("study.png"),
            FormPart::Text {
                name: "user_comments",
                value: "Is the foreshortening believable?",
            },
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        generator.last_comment.lock().unwrap().as_deref(),
        Some("Is the foreshortening believable?")
    );
}

#[tokio::test]
async fn test_blank_comment_not_forwarded() {
    let generator = ScriptedGenerator::succeeding();
    let app = create_app(test_state(generator.clone(), None));

    let response = app
        .oneshot(critique_request(&[
            png("study.png"),
            FormPart::Text {
                name: "user_comments",
                value: "   ",
            },
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(generator.last_comment.lock().unwrap().is_none());
}
