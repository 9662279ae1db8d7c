// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resolved identity types.
//!
//! An [`Identity`] is what the rest of the server sees after authentication:
//! the OIDC subject, a human-facing username, an optional email, and the
//! group memberships delivered in the configured groups claim. Identity
//! resolution itself sits behind the [`IdentityResolver`] trait so access
//! decisions can be exercised in tests without a live identity provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use whispers_common_secret::SecretString;

/// Errors that can occur while resolving an identity.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
	/// A claim the service cannot operate without was absent.
	#[error("missing required claim: {0}")]
	MissingClaim(&'static str),

	/// The identity provider failed or returned an unusable response.
	#[error("identity provider error: {0}")]
	Provider(String),
}

/// An authenticated identity as delivered by the identity provider.
///
/// Claims are trusted as delivered; this service performs no validation of
/// its own beyond requiring a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
	/// The OIDC `sub` claim.
	pub subject: String,
	/// Human-facing principal: `preferred_username`, falling back to
	/// `email`, falling back to `sub`.
	pub username: String,
	/// The `email` claim, if present.
	pub email: Option<String>,
	/// Group memberships from the configured groups claim.
	pub groups: Vec<String>,
}

impl Identity {
	/// Build an identity from a set of userinfo claims.
	///
	/// # Arguments
	/// * `claims` - JSON object of claims from the userinfo endpoint
	/// * `groups_claim` - name of the claim carrying group memberships
	///
	/// # Errors
	/// Returns [`IdentityError::MissingClaim`] if `sub` is absent. A missing
	/// or malformed groups claim yields an empty group set rather than an
	/// error; providers omit it for users with no memberships.
	pub fn from_claims(
		claims: &serde_json::Value,
		groups_claim: &str,
	) -> Result<Self, IdentityError> {
		let subject = claims
			.get("sub")
			.and_then(serde_json::Value::as_str)
			.filter(|s| !s.is_empty())
			.ok_or(IdentityError::MissingClaim("sub"))?
			.to_string();

		let email = claims
			.get("email")
			.and_then(serde_json::Value::as_str)
			.filter(|s| !s.is_empty())
			.map(str::to_string);

		let username = claims
			.get("preferred_username")
			.and_then(serde_json::Value::as_str)
			.filter(|s| !s.is_empty())
			.map(str::to_string)
			.or_else(|| email.clone())
			.unwrap_or_else(|| subject.clone());

		let groups = claims
			.get(groups_claim)
			.and_then(serde_json::Value::as_array)
			.map(|values| {
				values
					.iter()
					.filter_map(serde_json::Value::as_str)
					.filter(|g| !g.is_empty())
					.map(str::to_string)
					.collect()
			})
			.unwrap_or_default();

		Ok(Self {
			subject,
			username,
			email,
			groups,
		})
	}

	/// Returns true if this identity belongs to the named group.
	pub fn in_group(&self, group: &str) -> bool {
		self.groups.iter().any(|g| g == group)
	}
}

/// Capability interface for turning a provider access token into an
/// [`Identity`].
///
/// Production wires this to the OIDC userinfo endpoint; tests provide a
/// canned implementation.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
	async fn resolve_identity(&self, access_token: &SecretString)
		-> Result<Identity, IdentityError>;
}
