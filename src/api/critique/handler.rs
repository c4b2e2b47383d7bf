// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Critique endpoint handler

use axum::{
    extract::State,
    http::HeaderValue,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::multipart::{Multipart, MultipartRejection};

use super::request::read_critique_form;
use super::response::CritiqueResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;

/// Response header reporting what happened to vector storage
pub const STORAGE_HEADER: &str = "x-vector-storage";

/// POST /analysis/critique - Critique an uploaded artwork
///
/// Multipart form with `file` (required) and `user_comments` (optional).
/// The body is always the critique alone; storage failures only show up in
/// the `x-vector-storage` header and the logs.
pub async fn critique_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let multipart = multipart.map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))?;
    let image = read_critique_form(multipart, state.config.upload.max_file_size_mb).await?;

    let outcome = state.analysis.handle_critique_request(&image).await?;

    let mut response = Json(CritiqueResponse::from(&outcome.critique)).into_response();
    response.headers_mut().insert(
        STORAGE_HEADER,
        HeaderValue::from_static(outcome.storage.as_str()),
    );
    Ok(response)
}
