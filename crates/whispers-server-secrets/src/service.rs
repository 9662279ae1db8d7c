// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secret lifecycle service.
//!
//! Two operations: create and fetch. A secret is never mutated after
//! creation; its only state change is the implicit live -> expired
//! transition driven by wall-clock comparison. Reads are side-effect-free
//! and do not extend or reset expiry.
//!
//! Both operations take `now` explicitly so the expiry properties can be
//! exercised in tests without a clock.

use chrono::{DateTime, Duration, Utc};
use whispers_server_auth::Identity;

use crate::encryption::SecretCipher;
use crate::error::{SecretsError, SecretsResult};
use crate::policy;
use crate::store::SecretStore;
use crate::types::{generate_share_token, CreatedSecret, NewSecret, RevealedSecret, SecretId, SecretRecord};

/// Creates and reveals secrets against a backing store.
#[derive(Debug, Clone)]
pub struct SecretsService<S> {
	store: S,
	cipher: SecretCipher,
}

impl<S: SecretStore> SecretsService<S> {
	pub fn new(store: S, cipher: SecretCipher) -> Self {
		Self { store, cipher }
	}

	/// Create a secret: encrypt, stamp, persist, hand back the share token.
	///
	/// `expires_at = now + ttl_hours`. Allow-list entries are trimmed and
	/// empty entries dropped.
	///
	/// # Errors
	///
	/// [`SecretsError::InvalidTtl`] for a non-positive TTL; storage and
	/// encryption errors pass through.
	#[tracing::instrument(skip(self, secret), fields(owner = %secret.owner, ttl_hours = secret.ttl_hours))]
	pub async fn create(
		&self,
		secret: NewSecret,
		now: DateTime<Utc>,
	) -> SecretsResult<CreatedSecret> {
		if secret.ttl_hours <= 0 {
			return Err(SecretsError::InvalidTtl(secret.ttl_hours));
		}
		let expires_at = Duration::try_hours(secret.ttl_hours)
			.and_then(|ttl| now.checked_add_signed(ttl))
			.ok_or(SecretsError::InvalidTtl(secret.ttl_hours))?;

		let sealed = self.cipher.encrypt(secret.content.as_bytes())?;
		let record = SecretRecord {
			id: SecretId::generate(),
			token: generate_share_token(),
			title: secret.title,
			ciphertext: sealed.ciphertext,
			nonce: sealed.nonce,
			owner: secret.owner,
			allowed_users: normalize_principals(secret.allowed_users),
			allowed_groups: normalize_principals(secret.allowed_groups),
			created_at: now,
			expires_at,
		};

		self.store.insert(&record).await?;

		tracing::info!(secret_id = %record.id, expires_at = %record.expires_at, "secret created");
		Ok(CreatedSecret {
			id: record.id,
			token: record.token,
			title: record.title,
			expires_at: record.expires_at,
		})
	}

	/// Fetch a secret by token on behalf of an identity.
	///
	/// Outcome order: unknown token -> `NotFound`, past expiry -> `Expired`,
	/// allow-list miss -> `Denied`, otherwise the decrypted content.
	#[tracing::instrument(skip(self, token, identity), fields(viewer = %identity.username))]
	pub async fn fetch(
		&self,
		token: &str,
		identity: &Identity,
		now: DateTime<Utc>,
	) -> SecretsResult<RevealedSecret> {
		let record = self
			.store
			.get_by_token(token)
			.await?
			.ok_or(SecretsError::NotFound)?;

		if policy::is_expired(&record, now) {
			tracing::debug!(secret_id = %record.id, "expired secret requested");
			return Err(SecretsError::Expired);
		}

		if !policy::is_allowed(&record, identity) {
			tracing::warn!(
				secret_id = %record.id,
				viewer = %identity.username,
				"viewer not on allow-list"
			);
			return Err(SecretsError::Denied);
		}

		let plaintext = self.cipher.decrypt(&record.encrypted())?;
		let content = String::from_utf8(plaintext.to_vec())
			.map_err(|_| SecretsError::Corrupt("decrypted content is not UTF-8".to_string()))?;

		tracing::info!(secret_id = %record.id, viewer = %identity.username, "secret revealed");
		Ok(RevealedSecret {
			title: record.title,
			content,
			owner: record.owner,
			created_at: record.created_at,
			expires_at: record.expires_at,
		})
	}

	/// Delete expired rows; see [`SecretStore::purge_expired`].
	pub async fn purge_expired(&self, now: DateTime<Utc>) -> SecretsResult<u64> {
		self.store.purge_expired(now).await
	}
}

fn normalize_principals(list: Vec<String>) -> Vec<String> {
	list
		.into_iter()
		.map(|entry| entry.trim().to_string())
		.filter(|entry| !entry.is_empty())
		.collect()
}
