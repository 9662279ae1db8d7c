// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Server error type and its HTTP mapping.
//!
//! Every user-visible outcome is terminal; there are no retryable errors in
//! this API. Internal details are logged server-side and never leaked into
//! response bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;
use whispers_server_secrets::SecretsError;

/// JSON error body: a stable machine-readable code plus a human message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
	pub code: String,
	pub message: String,
}

/// Errors surfaced by HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	/// No valid session accompanied the request.
	#[error("not authenticated")]
	Unauthenticated,

	/// Authenticated but not permitted.
	#[error("forbidden: {0}")]
	Denied(String),

	/// The resource does not exist.
	#[error("not found: {0}")]
	NotFound(String),

	/// The resource existed but its expiry has passed.
	#[error("expired: {0}")]
	Expired(String),

	/// The request was malformed or failed validation.
	#[error("bad request: {0}")]
	BadRequest(String),

	/// A required subsystem is not configured or reachable.
	#[error("service unavailable: {0}")]
	Unavailable(String),

	/// Anything the caller cannot act on.
	#[error("internal error: {0}")]
	Internal(String),
}

impl ServerError {
	fn status(&self) -> StatusCode {
		match self {
			ServerError::Unauthenticated => StatusCode::UNAUTHORIZED,
			ServerError::Denied(_) => StatusCode::FORBIDDEN,
			ServerError::NotFound(_) => StatusCode::NOT_FOUND,
			ServerError::Expired(_) => StatusCode::GONE,
			ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
			ServerError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
			ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn code(&self) -> &'static str {
		match self {
			ServerError::Unauthenticated => "unauthenticated",
			ServerError::Denied(_) => "forbidden",
			ServerError::NotFound(_) => "not_found",
			ServerError::Expired(_) => "expired",
			ServerError::BadRequest(_) => "bad_request",
			ServerError::Unavailable(_) => "unavailable",
			ServerError::Internal(_) => "internal_error",
		}
	}
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let status = self.status();

		// Internal details stay in the logs.
		let message = match &self {
			ServerError::Internal(detail) => {
				tracing::error!(error = %detail, "internal server error");
				"internal server error".to_string()
			}
			other => other.to_string(),
		};

		(
			status,
			Json(ErrorResponse {
				code: self.code().to_string(),
				message,
			}),
		)
			.into_response()
	}
}

impl From<SecretsError> for ServerError {
	fn from(err: SecretsError) -> Self {
		match err {
			SecretsError::NotFound => ServerError::NotFound("secret not found".to_string()),
			SecretsError::Expired => ServerError::Expired("secret has expired".to_string()),
			SecretsError::Denied => {
				ServerError::Denied("you are not permitted to view this secret".to_string())
			}
			SecretsError::InvalidTtl(hours) => {
				ServerError::BadRequest(format!("expires_in_hours must be positive, got {hours}"))
			}
			other => ServerError::Internal(other.to_string()),
		}
	}
}

impl From<sqlx::Error> for ServerError {
	fn from(err: sqlx::Error) -> Self {
		ServerError::Internal(format!("database error: {err}"))
	}
}
