// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the secrets domain.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::encryption::{EncryptedData, NONCE_SIZE};

/// Number of random bytes behind a share token (192 bits of entropy).
pub const TOKEN_BYTES: usize = 24;

/// Unique identifier for a secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretId(Uuid);

impl SecretId {
	/// Create a new ID from a UUID.
	pub fn new(id: Uuid) -> Self {
		Self(id)
	}

	/// Generate a new random ID.
	pub fn generate() -> Self {
		Self(Uuid::new_v4())
	}

	/// Get the inner UUID value.
	pub fn into_inner(self) -> Uuid {
		self.0
	}
}

impl fmt::Display for SecretId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<Uuid> for SecretId {
	fn from(id: Uuid) -> Self {
		Self(id)
	}
}

/// Generate an unguessable share token.
///
/// [`TOKEN_BYTES`] bytes from the OS CSPRNG, URL-safe base64 without
/// padding, so it embeds directly in a share link path segment.
pub fn generate_share_token() -> String {
	let mut bytes = [0u8; TOKEN_BYTES];
	OsRng.fill_bytes(&mut bytes);
	URL_SAFE_NO_PAD.encode(bytes)
}

/// A persisted secret row. Immutable once written.
#[derive(Debug, Clone)]
pub struct SecretRecord {
	pub id: SecretId,
	/// Share-link lookup key; unguessable, unique.
	pub token: String,
	pub title: Option<String>,
	/// AES-256-GCM sealed content.
	pub ciphertext: Vec<u8>,
	pub nonce: [u8; NONCE_SIZE],
	/// Resolved principal of the creator.
	pub owner: String,
	/// Usernames/subjects permitted to view; empty means open to any
	/// authenticated identity (together with `allowed_groups`).
	pub allowed_users: Vec<String>,
	/// Groups permitted to view.
	pub allowed_groups: Vec<String>,
	pub created_at: DateTime<Utc>,
	pub expires_at: DateTime<Utc>,
}

impl SecretRecord {
	/// The sealed content as [`EncryptedData`] for the cipher.
	pub fn encrypted(&self) -> EncryptedData {
		EncryptedData {
			ciphertext: self.ciphertext.clone(),
			nonce: self.nonce,
		}
	}
}

/// Input to secret creation.
#[derive(Debug, Clone)]
pub struct NewSecret {
	pub title: Option<String>,
	/// Plaintext content; encrypted before anything is persisted.
	pub content: String,
	/// Hours until expiry, relative to creation time. Must be positive.
	pub ttl_hours: i64,
	pub allowed_users: Vec<String>,
	pub allowed_groups: Vec<String>,
	pub owner: String,
}

/// Result of secret creation.
#[derive(Debug, Clone)]
pub struct CreatedSecret {
	pub id: SecretId,
	pub token: String,
	pub title: Option<String>,
	pub expires_at: DateTime<Utc>,
}

/// A successfully fetched and decrypted secret.
#[derive(Debug, Clone)]
pub struct RevealedSecret {
	pub title: Option<String>,
	pub content: String,
	pub owner: String,
	pub created_at: DateTime<Utc>,
	pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashSet;

	#[test]
	fn secret_id_roundtrips() {
		let uuid = Uuid::new_v4();
		let id = SecretId::new(uuid);
		assert_eq!(id.into_inner(), uuid);
		assert_eq!(id.to_string(), uuid.to_string());
	}

	#[test]
	fn secret_id_generates_unique() {
		assert_ne!(SecretId::generate(), SecretId::generate());
	}

	#[test]
	fn share_tokens_are_url_safe() {
		let token = generate_share_token();
		assert!(token
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_')));
		// 24 bytes -> 32 base64 characters without padding.
		assert_eq!(token.len(), 32);
	}

	#[test]
	fn share_tokens_do_not_collide() {
		let tokens: HashSet<String> = (0..1000).map(|_| generate_share_token()).collect();
		assert_eq!(tokens.len(), 1000);
	}
}
