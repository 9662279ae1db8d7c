// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite-backed secret storage.
//!
//! One table, `secrets`, immutable rows. Timestamps are RFC 3339 text,
//! allow-lists are JSON arrays, content is a ciphertext/nonce blob pair.
//! Tokens are stored as written; they are already unguessable lookup keys.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePool, Row};

use crate::encryption::NONCE_SIZE;
use crate::error::{SecretsError, SecretsResult};
use crate::types::{SecretId, SecretRecord};

/// Storage interface for secrets.
///
/// The service is generic over this trait; tests use an in-memory double.
#[async_trait]
pub trait SecretStore: Send + Sync {
	/// Persist a new secret. Fails on token collision.
	async fn insert(&self, record: &SecretRecord) -> SecretsResult<()>;

	/// Look up a secret by its share token.
	async fn get_by_token(&self, token: &str) -> SecretsResult<Option<SecretRecord>>;

	/// Delete all secrets whose expiry is at or before `now`.
	///
	/// Returns the number of rows removed.
	async fn purge_expired(&self, now: DateTime<Utc>) -> SecretsResult<u64>;
}

/// Create the secrets schema if it does not exist.
pub async fn ensure_schema(pool: &SqlitePool) -> SecretsResult<()> {
	sqlx::query(
		r#"
		CREATE TABLE IF NOT EXISTS secrets (
			id TEXT PRIMARY KEY,
			token TEXT NOT NULL UNIQUE,
			title TEXT,
			ciphertext BLOB NOT NULL,
			nonce BLOB NOT NULL,
			owner TEXT NOT NULL,
			allowed_users TEXT NOT NULL,
			allowed_groups TEXT NOT NULL,
			created_at TEXT NOT NULL,
			expires_at TEXT NOT NULL
		)
		"#,
	)
	.execute(pool)
	.await?;

	sqlx::query("CREATE INDEX IF NOT EXISTS idx_secrets_expires_at ON secrets(expires_at)")
		.execute(pool)
		.await?;

	tracing::debug!("secrets schema ensured");
	Ok(())
}

/// Repository for secret database operations.
///
/// Rows are never updated; the only mutations are insert and purge.
#[derive(Clone)]
pub struct SqliteSecretStore {
	pool: SqlitePool,
}

impl SqliteSecretStore {
	/// Create a new store with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, record), fields(secret_id = %record.id, owner = %record.owner))]
	pub async fn insert(&self, record: &SecretRecord) -> SecretsResult<()> {
		let allowed_users = serde_json::to_string(&record.allowed_users)?;
		let allowed_groups = serde_json::to_string(&record.allowed_groups)?;

		sqlx::query(
			r#"
			INSERT INTO secrets (
				id, token, title, ciphertext, nonce, owner,
				allowed_users, allowed_groups, created_at, expires_at
			) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(record.id.to_string())
		.bind(&record.token)
		.bind(&record.title)
		.bind(&record.ciphertext)
		.bind(record.nonce.as_slice())
		.bind(&record.owner)
		.bind(&allowed_users)
		.bind(&allowed_groups)
		.bind(record.created_at)
		.bind(record.expires_at)
		.execute(&self.pool)
		.await?;

		tracing::debug!(secret_id = %record.id, "secret stored");
		Ok(())
	}

	#[tracing::instrument(skip(self, token))]
	pub async fn get_by_token(&self, token: &str) -> SecretsResult<Option<SecretRecord>> {
		let row = sqlx::query(
			r#"
			SELECT id, token, title, ciphertext, nonce, owner,
			       allowed_users, allowed_groups, created_at, expires_at
			FROM secrets
			WHERE token = ?
			"#,
		)
		.bind(token)
		.fetch_optional(&self.pool)
		.await?;

		match row {
			Some(row) => Ok(Some(parse_secret_row(&row)?)),
			None => Ok(None),
		}
	}

	#[tracing::instrument(skip(self))]
	pub async fn purge_expired(&self, now: DateTime<Utc>) -> SecretsResult<u64> {
		let result = sqlx::query("DELETE FROM secrets WHERE expires_at <= ?")
			.bind(now)
			.execute(&self.pool)
			.await?;

		let purged = result.rows_affected();
		if purged > 0 {
			tracing::info!(count = purged, "purged expired secrets");
		}
		Ok(purged)
	}
}

#[async_trait]
impl SecretStore for SqliteSecretStore {
	async fn insert(&self, record: &SecretRecord) -> SecretsResult<()> {
		self.insert(record).await
	}

	async fn get_by_token(&self, token: &str) -> SecretsResult<Option<SecretRecord>> {
		self.get_by_token(token).await
	}

	async fn purge_expired(&self, now: DateTime<Utc>) -> SecretsResult<u64> {
		self.purge_expired(now).await
	}
}

fn parse_secret_row(row: &sqlx::sqlite::SqliteRow) -> SecretsResult<SecretRecord> {
	let id: String = row.try_get("id")?;
	let id = SecretId::new(
		id.parse()
			.map_err(|_| SecretsError::Corrupt("stored secret id is not a UUID".to_string()))?,
	);

	let nonce_bytes: Vec<u8> = row.try_get("nonce")?;
	let nonce: [u8; NONCE_SIZE] = nonce_bytes
		.try_into()
		.map_err(|_| SecretsError::Corrupt("stored nonce has the wrong length".to_string()))?;

	let allowed_users: Vec<String> = serde_json::from_str(&row.try_get::<String, _>("allowed_users")?)?;
	let allowed_groups: Vec<String> =
		serde_json::from_str(&row.try_get::<String, _>("allowed_groups")?)?;

	Ok(SecretRecord {
		id,
		token: row.try_get("token")?,
		title: row.try_get("title")?,
		ciphertext: row.try_get("ciphertext")?,
		nonce,
		owner: row.try_get("owner")?,
		allowed_users,
		allowed_groups,
		created_at: row.try_get("created_at")?,
		expires_at: row.try_get("expires_at")?,
	})
}
