// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Similar critique search endpoint module
//!
//! Provides GET /analysis/similar over stored critiques.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::similar_handler;
pub use request::SimilarRequest;
pub use response::SimilarResponse;
