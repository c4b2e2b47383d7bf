// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Critique API endpoint module
//!
//! Provides POST /analysis/critique for artwork critiques.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::{critique_handler, STORAGE_HEADER};
pub use request::read_critique_form;
pub use response::CritiqueResponse;
