// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application state and router assembly.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Json, Router};
use sqlx::SqlitePool;
use utoipa::OpenApi;
use whispers_server_auth::SessionCodec;
use whispers_server_auth_oidc::{OidcClient, OidcConfig};
use whispers_server_config::ServerConfig;
use whispers_server_secrets::{SecretCipher, SecretsService, SqliteSecretStore};

use crate::api_docs::ApiDoc;
use crate::oauth_state::OAuthStateStore;
use crate::routes;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
	/// Resolved configuration, constructed once at startup.
	pub config: Arc<ServerConfig>,
	pub secrets: Arc<SecretsService<SqliteSecretStore>>,
	/// OIDC client; `None` disables the login flow (health reports degraded).
	pub oidc: Option<Arc<OidcClient>>,
	pub session_codec: Arc<SessionCodec>,
	pub oauth_states: Arc<OAuthStateStore>,
	pub pool: SqlitePool,
}

/// Creates the application state, initializing optional components.
///
/// Fails fast on an unusable encryption key; a missing or misconfigured
/// OIDC provider only disables login.
pub async fn create_app_state(pool: SqlitePool, config: &ServerConfig) -> anyhow::Result<AppState> {
	let cipher = SecretCipher::from_base64(config.crypto.encryption_key.expose()).map_err(|e| {
		anyhow::anyhow!(
			"{} is unusable: {e}",
			whispers_server_config::ENCRYPTION_KEY_ENV_VAR
		)
	})?;

	let secrets = Arc::new(SecretsService::new(
		SqliteSecretStore::new(pool.clone()),
		cipher,
	));
	let session_codec = Arc::new(SessionCodec::new(config.session.secret.clone()));

	let oidc = match OidcConfig::from_env() {
		Ok(oidc_config) => match oidc_config.validate() {
			Ok(()) => {
				tracing::info!(issuer = %oidc_config.issuer, "OIDC configured, creating client");
				Some(Arc::new(OidcClient::new(oidc_config)))
			}
			Err(e) => {
				tracing::warn!(error = %e, "OIDC misconfigured, login disabled");
				None
			}
		},
		Err(e) => {
			tracing::info!(reason = %e, "OIDC not configured, login disabled");
			None
		}
	};

	Ok(AppState {
		config: Arc::new(config.clone()),
		secrets,
		oidc,
		session_codec,
		oauth_states: Arc::new(OAuthStateStore::new()),
		pool,
	})
}

/// Build the full application router.
pub fn create_router(state: AppState) -> Router {
	Router::new()
		// Service root and health
		.route("/", get(routes::home::home))
		.route("/health", get(routes::health::health_check))
		// OIDC login flow
		.route("/auth/login", get(routes::auth::login))
		.route("/auth/callback", get(routes::auth::callback))
		.route("/auth/logout", get(routes::auth::logout))
		.route("/auth/me", get(routes::auth::me))
		// Secrets
		.route("/api/secrets", post(routes::secrets::create_secret))
		.route("/s/{token}", get(routes::secrets::view_secret))
		// API documentation
		.route("/api-docs/openapi.json", get(openapi_json))
		.with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
	Json(ApiDoc::openapi())
}
