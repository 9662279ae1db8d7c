// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OpenAPI documentation, served at `/api-docs/openapi.json`.

use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::routes::auth::MeResponse;
use crate::routes::health::{ComponentHealth, HealthComponents, HealthResponse, HealthStatus};
use crate::routes::home::HomeResponse;
use crate::routes::secrets::{CreateSecretRequest, CreateSecretResponse, SecretViewResponse};

/// OpenAPI document for the Whispers API.
#[derive(OpenApi)]
#[openapi(
	info(
		title = "Whispers API",
		description = "Share time-limited, access-restricted secrets via unique links."
	),
	paths(
		crate::routes::home::home,
		crate::routes::health::health_check,
		crate::routes::auth::login,
		crate::routes::auth::callback,
		crate::routes::auth::logout,
		crate::routes::auth::me,
		crate::routes::secrets::create_secret,
		crate::routes::secrets::view_secret,
	),
	components(schemas(
		ErrorResponse,
		MeResponse,
		HomeResponse,
		HealthResponse,
		HealthComponents,
		ComponentHealth,
		HealthStatus,
		CreateSecretRequest,
		CreateSecretResponse,
		SecretViewResponse,
	)),
	tags(
		(name = "home", description = "Service info"),
		(name = "health", description = "Health checks"),
		(name = "auth", description = "OIDC login flow and session"),
		(name = "secrets", description = "Secret creation and viewing"),
	)
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn openapi_document_lists_all_routes() {
		let doc = ApiDoc::openapi();
		let paths: Vec<&String> = doc.paths.paths.keys().collect();

		for expected in [
			"/",
			"/health",
			"/auth/login",
			"/auth/callback",
			"/auth/logout",
			"/auth/me",
			"/api/secrets",
			"/s/{token}",
		] {
			assert!(
				paths.iter().any(|p| p.as_str() == expected),
				"missing path {expected}, got {paths:?}"
			);
		}
	}
}
