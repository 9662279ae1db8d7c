// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Whispers secret-sharing server.
//!
//! This crate provides an HTTP server where OIDC-authenticated users create
//! time-limited, access-restricted secrets and share them via unique links.
//! Content is encrypted at rest; expiry and user/group allow-lists are
//! enforced on every view.

pub mod api;
pub mod api_docs;
pub mod auth_middleware;
pub mod db;
pub mod error;
pub mod jobs;
pub mod oauth_state;
pub mod routes;

pub use api::{create_app_state, create_router, AppState};
pub use api_docs::ApiDoc;
pub use error::{ErrorResponse, ServerError};
pub use whispers_server_config::ServerConfig;
