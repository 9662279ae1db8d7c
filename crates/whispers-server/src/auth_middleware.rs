// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request extractors for the authenticated identity.
//!
//! The session is a signed cookie; opening it is pure computation, so the
//! extractors need no database access. Invalid, tampered, or stale cookies
//! are indistinguishable from absent ones: [`OptionalAuth`] yields `None`
//! and [`RequireAuth`] rejects with 401.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use whispers_server_auth::{extract_session_cookie_with_name, Identity};

use crate::api::AppState;
use crate::error::ServerError;

/// Extractor yielding the authenticated identity, rejecting with 401
/// when no valid session accompanies the request.
pub struct RequireAuth(pub Identity);

/// Extractor yielding the identity when a valid session is present.
pub struct OptionalAuth(pub Option<Identity>);

fn identity_from_parts(parts: &Parts, state: &AppState) -> Option<Identity> {
	let raw = extract_session_cookie_with_name(&parts.headers, &state.config.session.cookie_name)?;

	let session = match state.session_codec.open(&raw) {
		Ok(session) => session,
		Err(e) => {
			tracing::debug!(error = %e, "rejecting invalid session cookie");
			return None;
		}
	};

	// The cookie's Max-Age handles well-behaved clients; enforce the same
	// bound server-side for replayed cookies.
	let max_age = Duration::seconds(state.config.session.max_age_secs as i64);
	if Utc::now() - session.issued_at > max_age {
		tracing::debug!("rejecting stale session cookie");
		return None;
	}

	Some(session.identity)
}

impl FromRequestParts<AppState> for OptionalAuth {
	type Rejection = ServerError;

	async fn from_request_parts(
		parts: &mut Parts,
		state: &AppState,
	) -> Result<Self, Self::Rejection> {
		Ok(OptionalAuth(identity_from_parts(parts, state)))
	}
}

impl FromRequestParts<AppState> for RequireAuth {
	type Rejection = ServerError;

	async fn from_request_parts(
		parts: &mut Parts,
		state: &AppState,
	) -> Result<Self, Self::Rejection> {
		identity_from_parts(parts, state)
			.map(RequireAuth)
			.ok_or(ServerError::Unauthenticated)
	}
}
