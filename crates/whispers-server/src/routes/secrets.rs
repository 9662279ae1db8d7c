// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secret creation and view-by-token HTTP handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use whispers_server_secrets::NewSecret;

use crate::api::AppState;
use crate::auth_middleware::RequireAuth;
use crate::error::ServerError;

fn default_expires_in_hours() -> i64 {
	24
}

/// Request body for secret creation.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSecretRequest {
	#[serde(default)]
	pub title: Option<String>,
	/// The secret content; encrypted before persistence.
	pub content: String,
	/// Hours until expiry (default 24).
	#[serde(default = "default_expires_in_hours")]
	pub expires_in_hours: i64,
	/// Usernames/subjects permitted to view. Empty (together with
	/// `allowed_groups`) means any authenticated user.
	#[serde(default)]
	pub allowed_users: Vec<String>,
	/// Groups permitted to view.
	#[serde(default)]
	pub allowed_groups: Vec<String>,
}

/// Response for a created secret.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateSecretResponse {
	pub id: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	/// Link to hand to the intended viewers.
	pub share_url: String,
	pub expires_at: String,
}

/// Response for a revealed secret.
#[derive(Debug, Serialize, ToSchema)]
pub struct SecretViewResponse {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	pub content: String,
	pub owner: String,
	pub created_at: String,
	pub expires_at: String,
}

#[utoipa::path(
    post,
    path = "/api/secrets",
    request_body = CreateSecretRequest,
    responses(
        (status = 201, description = "Secret created", body = CreateSecretResponse),
        (status = 400, description = "Empty content or non-positive TTL", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    ),
    tag = "secrets"
)]
/// POST /api/secrets - Create a secret and return its share link.
#[tracing::instrument(skip(state, body), fields(owner = %identity.username))]
pub async fn create_secret(
	State(state): State<AppState>,
	RequireAuth(identity): RequireAuth,
	Json(body): Json<CreateSecretRequest>,
) -> Result<impl IntoResponse, ServerError> {
	if body.content.is_empty() {
		return Err(ServerError::BadRequest(
			"content must not be empty".to_string(),
		));
	}

	let created = state
		.secrets
		.create(
			NewSecret {
				title: body.title.filter(|t| !t.trim().is_empty()),
				content: body.content,
				ttl_hours: body.expires_in_hours,
				allowed_users: body.allowed_users,
				allowed_groups: body.allowed_groups,
				owner: identity.username.clone(),
			},
			Utc::now(),
		)
		.await?;

	let share_url = format!("{}/s/{}", state.config.http.base_url, created.token);

	Ok((
		StatusCode::CREATED,
		Json(CreateSecretResponse {
			id: created.id.to_string(),
			title: created.title,
			share_url,
			expires_at: created.expires_at.to_rfc3339(),
		}),
	))
}

#[utoipa::path(
    get,
    path = "/s/{token}",
    params(
        ("token" = String, Path, description = "Share token from the secret's link")
    ),
    responses(
        (status = 200, description = "Decrypted secret content", body = SecretViewResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Not on the secret's allow-list", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown token", body = crate::error::ErrorResponse),
        (status = 410, description = "Secret has expired", body = crate::error::ErrorResponse)
    ),
    tag = "secrets"
)]
/// GET /s/{token} - View a shared secret.
#[tracing::instrument(skip(state, token), fields(viewer = %identity.username))]
pub async fn view_secret(
	State(state): State<AppState>,
	RequireAuth(identity): RequireAuth,
	Path(token): Path<String>,
) -> Result<Json<SecretViewResponse>, ServerError> {
	let revealed = state.secrets.fetch(&token, &identity, Utc::now()).await?;

	Ok(Json(SecretViewResponse {
		title: revealed.title,
		content: revealed.content,
		owner: revealed.owner,
		created_at: revealed.created_at.to_rfc3339(),
		expires_at: revealed.expires_at.to_rfc3339(),
	}))
}
