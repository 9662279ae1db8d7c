// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Database pool creation and schema setup.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteSynchronous};
use std::str::FromStr;

use whispers_server_secrets::SecretsResult;

/// Create a SqlitePool with WAL mode and common settings.
///
/// # Arguments
/// * `database_url` - SQLite connection string (e.g., "sqlite:./whispers.db")
#[tracing::instrument(skip(database_url))]
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
	let options = SqliteConnectOptions::from_str(database_url)?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.create_if_missing(true);

	let pool = SqlitePool::connect_with(options).await?;

	tracing::debug!("database pool created");
	Ok(pool)
}

/// Run schema migrations for all subsystems.
pub async fn run_migrations(pool: &SqlitePool) -> SecretsResult<()> {
	whispers_server_secrets::ensure_schema(pool).await?;
	tracing::debug!("database migrations complete");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn in_memory_pool_and_migrations() {
		let pool = create_pool("sqlite::memory:").await.unwrap();
		run_migrations(&pool).await.unwrap();

		// Schema setup is idempotent.
		run_migrations(&pool).await.unwrap();
	}

	#[tokio::test]
	async fn invalid_url_is_rejected() {
		assert!(create_pool("postgres://nope").await.is_err());
	}
}
