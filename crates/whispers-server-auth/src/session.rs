// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Stateless signed session cookies.
//!
//! A session is the serialized [`Identity`] plus issue time, URL-safe
//! base64 encoded and signed with HMAC-SHA256 under the configured session
//! secret: `<payload>.<signature>`. There is no server-side session store;
//! possession of a validly signed cookie is the session.
//!
//! # Security Notes
//!
//! - Signature verification is constant-time (via `Mac::verify_slice`)
//! - Tampered, malformed, or wrongly keyed cookies are indistinguishable
//!   from absent ones to callers that treat errors as unauthenticated
//! - Cookies are issued `HttpOnly; SameSite=Lax; Path=/`

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use whispers_common_secret::SecretString;

use crate::identity::Identity;

type HmacSha256 = Hmac<Sha256>;

/// Errors that can occur when sealing or opening a session cookie.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
	/// The cookie value is not `payload.signature` base64.
	#[error("malformed session cookie")]
	Malformed,

	/// The signature does not verify under the configured secret.
	#[error("session cookie signature mismatch")]
	BadSignature,

	/// The payload did not round-trip through JSON.
	#[error("session payload error: {0}")]
	Serialization(#[from] serde_json::Error),
}

/// Contents of a session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
	pub identity: Identity,
	pub issued_at: DateTime<Utc>,
}

impl SessionData {
	/// Create a session for an identity, stamped with the current time.
	pub fn new(identity: Identity) -> Self {
		Self {
			identity,
			issued_at: Utc::now(),
		}
	}
}

/// Seals and opens session cookie values under a process-wide secret.
#[derive(Clone)]
pub struct SessionCodec {
	secret: SecretString,
}

impl SessionCodec {
	pub fn new(secret: SecretString) -> Self {
		Self { secret }
	}

	/// Serialize and sign a session into a cookie value.
	pub fn seal(&self, session: &SessionData) -> Result<String, SessionError> {
		let payload = serde_json::to_vec(session)?;
		let payload_b64 = URL_SAFE_NO_PAD.encode(payload);
		let signature = URL_SAFE_NO_PAD.encode(self.mac(payload_b64.as_bytes()));
		Ok(format!("{payload_b64}.{signature}"))
	}

	/// Verify and deserialize a cookie value back into a session.
	pub fn open(&self, raw: &str) -> Result<SessionData, SessionError> {
		let (payload_b64, signature_b64) = raw.split_once('.').ok_or(SessionError::Malformed)?;
		let signature = URL_SAFE_NO_PAD
			.decode(signature_b64)
			.map_err(|_| SessionError::Malformed)?;

		let mut mac = HmacSha256::new_from_slice(self.secret.expose().as_bytes())
			.expect("HMAC accepts keys of any length");
		mac.update(payload_b64.as_bytes());
		mac
			.verify_slice(&signature)
			.map_err(|_| SessionError::BadSignature)?;

		let payload = URL_SAFE_NO_PAD
			.decode(payload_b64)
			.map_err(|_| SessionError::Malformed)?;
		Ok(serde_json::from_slice(&payload)?)
	}

	fn mac(&self, data: &[u8]) -> Vec<u8> {
		let mut mac = HmacSha256::new_from_slice(self.secret.expose().as_bytes())
			.expect("HMAC accepts keys of any length");
		mac.update(data);
		mac.finalize().into_bytes().to_vec()
	}
}

impl std::fmt::Debug for SessionCodec {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SessionCodec").finish_non_exhaustive()
	}
}

/// Build a `Set-Cookie` value for an issued session.
pub fn session_cookie_header(name: &str, value: &str, max_age_secs: u64) -> String {
	format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}")
}

/// Build a `Set-Cookie` value that clears the session.
pub fn clear_session_cookie_header(name: &str) -> String {
	format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
