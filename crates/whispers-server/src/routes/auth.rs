// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OIDC login flow HTTP handlers.
//!
//! `/auth/login` sends the browser to the issuer with a single-use CSRF
//! state; `/auth/callback` exchanges the returned code, resolves the
//! identity from the userinfo endpoint, and issues the signed session
//! cookie. There is no local credential handling of any kind.

use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use whispers_server_auth::{
	clear_session_cookie_header, session_cookie_header, Identity, IdentityResolver, SessionData,
};
use whispers_server_auth_oidc::OidcClient;

use crate::api::AppState;
use crate::auth_middleware::RequireAuth;
use crate::error::ServerError;

/// Query parameters for `/auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginParams {
	/// Local path to return to after login.
	pub next: Option<String>,
}

/// Query parameters for `/auth/callback`.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
	pub code: Option<String>,
	pub state: Option<String>,
	pub error: Option<String>,
	pub error_description: Option<String>,
}

/// The authenticated identity, as reported by `/auth/me`.
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
	pub subject: String,
	pub username: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	pub groups: Vec<String>,
}

impl From<Identity> for MeResponse {
	fn from(identity: Identity) -> Self {
		Self {
			subject: identity.subject,
			username: identity.username,
			email: identity.email,
			groups: identity.groups,
		}
	}
}

fn require_oidc(state: &AppState) -> Result<&OidcClient, ServerError> {
	state
		.oidc
		.as_deref()
		.ok_or_else(|| ServerError::Unavailable("OIDC login is not configured".to_string()))
}

/// Only accept local redirect targets; anything else falls back to `/`.
fn sanitize_next(next: Option<String>) -> String {
	match next {
		Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
		_ => "/".to_string(),
	}
}

#[utoipa::path(
    get,
    path = "/auth/login",
    params(
        ("next" = Option<String>, Query, description = "Local path to return to after login")
    ),
    responses(
        (status = 307, description = "Redirect to the identity provider"),
        (status = 503, description = "OIDC is not configured", body = crate::error::ErrorResponse)
    ),
    tag = "auth"
)]
/// GET /auth/login - Start the OIDC authorization code flow.
#[tracing::instrument(skip(state, params))]
pub async fn login(
	State(state): State<AppState>,
	Query(params): Query<LoginParams>,
) -> Result<Redirect, ServerError> {
	let oidc = require_oidc(&state)?;

	let next = sanitize_next(params.next);
	let csrf_state = state.oauth_states.issue(next);

	let url = oidc
		.authorization_url(&csrf_state)
		.await
		.map_err(|e| ServerError::Internal(format!("failed to build authorization URL: {e}")))?;

	tracing::debug!("redirecting to identity provider");
	Ok(Redirect::temporary(&url))
}

#[utoipa::path(
    get,
    path = "/auth/callback",
    params(
        ("code" = Option<String>, Query, description = "Authorization code"),
        ("state" = Option<String>, Query, description = "CSRF state issued at login")
    ),
    responses(
        (status = 303, description = "Session established; redirect to the login target"),
        (status = 400, description = "Missing or invalid code/state", body = crate::error::ErrorResponse),
        (status = 503, description = "OIDC is not configured", body = crate::error::ErrorResponse)
    ),
    tag = "auth"
)]
/// GET /auth/callback - Complete the OIDC flow and issue the session cookie.
#[tracing::instrument(skip(state, params))]
pub async fn callback(
	State(state): State<AppState>,
	Query(params): Query<CallbackParams>,
) -> Result<Response, ServerError> {
	let oidc = require_oidc(&state)?;

	if let Some(error) = params.error {
		let detail = params.error_description.unwrap_or(error);
		tracing::warn!(error = %detail, "identity provider returned an error");
		return Err(ServerError::BadRequest(format!(
			"identity provider error: {detail}"
		)));
	}

	let code = params
		.code
		.ok_or_else(|| ServerError::BadRequest("missing authorization code".to_string()))?;
	let csrf_state = params
		.state
		.ok_or_else(|| ServerError::BadRequest("missing state parameter".to_string()))?;

	let entry = state
		.oauth_states
		.consume(&csrf_state)
		.ok_or_else(|| ServerError::BadRequest("invalid or expired state".to_string()))?;

	let token = oidc
		.exchange_code(&code)
		.await
		.map_err(|e| ServerError::Internal(format!("code exchange failed: {e}")))?;

	let identity = oidc
		.resolve_identity(&token.access_token)
		.await
		.map_err(|e| ServerError::Internal(format!("identity resolution failed: {e}")))?;

	let session = SessionData::new(identity.clone());
	let cookie = state
		.session_codec
		.seal(&session)
		.map_err(|e| ServerError::Internal(format!("failed to seal session: {e}")))?;

	let set_cookie = session_cookie_header(
		&state.config.session.cookie_name,
		&cookie,
		state.config.session.max_age_secs,
	);

	tracing::info!(username = %identity.username, "login completed");
	Ok(([(SET_COOKIE, set_cookie)], Redirect::to(&entry.next)).into_response())
}

#[utoipa::path(
    get,
    path = "/auth/logout",
    responses(
        (status = 303, description = "Session cookie cleared; redirect to /")
    ),
    tag = "auth"
)]
/// GET /auth/logout - Clear the session cookie.
#[tracing::instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
	let clear_cookie = clear_session_cookie_header(&state.config.session.cookie_name);
	([(SET_COOKIE, clear_cookie)], Redirect::to("/"))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "The authenticated identity", body = MeResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    ),
    tag = "auth"
)]
/// GET /auth/me - The resolved identity behind the current session.
#[tracing::instrument(skip_all, fields(username = %identity.username))]
pub async fn me(RequireAuth(identity): RequireAuth) -> Json<MeResponse> {
	Json(identity.into())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sanitize_next_accepts_local_paths() {
		assert_eq!(sanitize_next(Some("/s/abc".to_string())), "/s/abc");
		assert_eq!(sanitize_next(Some("/".to_string())), "/");
	}

	#[test]
	fn sanitize_next_rejects_external_targets() {
		assert_eq!(sanitize_next(Some("https://evil.example".to_string())), "/");
		assert_eq!(sanitize_next(Some("//evil.example".to_string())), "/");
		assert_eq!(sanitize_next(Some("javascript:alert(1)".to_string())), "/");
		assert_eq!(sanitize_next(None), "/");
	}
}
