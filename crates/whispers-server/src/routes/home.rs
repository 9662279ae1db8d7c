// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Service root handler.

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth_middleware::OptionalAuth;
use crate::routes::auth::MeResponse;

/// Service identification plus the caller's identity, if logged in.
#[derive(Debug, Serialize, ToSchema)]
pub struct HomeResponse {
	pub service: String,
	pub version: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user: Option<MeResponse>,
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service info and current identity", body = HomeResponse)
    ),
    tag = "home"
)]
/// GET / - Service info and the current identity, if any.
pub async fn home(OptionalAuth(identity): OptionalAuth) -> Json<HomeResponse> {
	Json(HomeResponse {
		service: "whispers-server".to_string(),
		version: env!("CARGO_PKG_VERSION").to_string(),
		user: identity.map(Into::into),
	})
}
