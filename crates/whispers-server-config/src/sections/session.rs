// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session cookie configuration.
//!
//! The signing secret is never part of a merge layer; it loads exclusively
//! from `WHISPERS_SERVER_SESSION_SECRET` (or its `_FILE` indirection)
//! during finalization.

use serde::Deserialize;
use whispers_common_secret::SecretString;

/// Default session cookie name.
pub const DEFAULT_SESSION_COOKIE_NAME: &str = "whispers_session";

/// Default session lifetime: 12 hours.
pub const DEFAULT_SESSION_MAX_AGE_SECS: u64 = 12 * 60 * 60;

/// Session configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct SessionConfig {
	pub cookie_name: String,
	pub max_age_secs: u64,
	/// HMAC signing key for the session cookie.
	pub secret: SecretString,
}

/// Session configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfigLayer {
	#[serde(default)]
	pub cookie_name: Option<String>,
	#[serde(default)]
	pub max_age_secs: Option<u64>,
}

impl SessionConfigLayer {
	pub fn merge(&mut self, other: SessionConfigLayer) {
		if other.cookie_name.is_some() {
			self.cookie_name = other.cookie_name;
		}
		if other.max_age_secs.is_some() {
			self.max_age_secs = other.max_age_secs;
		}
	}

	pub fn finalize(self, secret: SecretString) -> SessionConfig {
		SessionConfig {
			cookie_name: self
				.cookie_name
				.unwrap_or_else(|| DEFAULT_SESSION_COOKIE_NAME.to_string()),
			max_age_secs: self.max_age_secs.unwrap_or(DEFAULT_SESSION_MAX_AGE_SECS),
			secret,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = SessionConfigLayer::default().finalize(SecretString::from("k"));
		assert_eq!(config.cookie_name, "whispers_session");
		assert_eq!(config.max_age_secs, 43200);
	}

	#[test]
	fn test_custom_cookie_name() {
		let layer = SessionConfigLayer {
			cookie_name: Some("custom_session".to_string()),
			max_age_secs: Some(60),
		};
		let config = layer.finalize(SecretString::from("k"));
		assert_eq!(config.cookie_name, "custom_session");
		assert_eq!(config.max_age_secs, 60);
	}
}
