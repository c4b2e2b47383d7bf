// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multipart form parsing for critique uploads

use axum::http::StatusCode;
use axum_extra::extract::multipart::{Multipart, MultipartError};

use crate::analysis::{UploadError, UploadedImage};
use crate::api::errors::ApiError;

pub const FILE_FIELD: &str = "file";
pub const COMMENT_FIELD: &str = "user_comments";

/// Collect the `file` and optional `user_comments` fields
///
/// Unknown fields are ignored. When `file` appears more than once the last
/// one wins.
pub async fn read_critique_form(
    mut multipart: Multipart,
    max_file_size_mb: u64,
) -> Result<UploadedImage, ApiError> {
    let mut image: Option<UploadedImage> = None;
    let mut comment: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_file_size_mb))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FILE_FIELD => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let mime_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, max_file_size_mb))?;
                image = Some(UploadedImage::new(filename, mime_type, bytes.to_vec()));
            }
            COMMENT_FIELD => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, max_file_size_mb))?;
                comment = Some(text);
            }
            _ => {}
        }
    }

    let mut image = image.ok_or(UploadError::MissingFile)?;
    image.user_comment = comment;
    Ok(image)
}

fn multipart_error(err: MultipartError, max_file_size_mb: u64) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge {
            max_mb: max_file_size_mb,
        }
        .into()
    } else {
        ApiError::InvalidRequest(err.body_text())
    }
}
