// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error taxonomy for the secrets subsystem.
//!
//! `NotFound`, `Expired`, and `Denied` are terminal, user-visible outcomes
//! of a fetch; they carry no retry semantics. The remaining variants are
//! internal failures.

/// Errors that can occur in the secrets subsystem.
#[derive(Debug, thiserror::Error)]
pub enum SecretsError {
	/// No secret exists for the presented token (or it was purged).
	#[error("secret not found")]
	NotFound,

	/// The secret exists but its expiry has passed.
	#[error("secret has expired")]
	Expired,

	/// The identity is authenticated but not on the secret's allow-list.
	#[error("identity is not permitted to view this secret")]
	Denied,

	/// The requested time-to-live is not a positive number of hours.
	#[error("invalid ttl: {0} hours")]
	InvalidTtl(i64),

	/// Encryption failed.
	#[error("encryption error: {0}")]
	Encryption(String),

	/// Decryption failed (wrong key, tampered or truncated ciphertext).
	#[error("decryption error: {0}")]
	Decryption(String),

	/// A key had the wrong length.
	#[error("invalid key size: expected {expected} bytes, got {actual}")]
	InvalidKeySize { expected: usize, actual: usize },

	/// A stored row failed structural validation.
	#[error("corrupt record: {0}")]
	Corrupt(String),

	/// Database error.
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),

	/// Row serialization error.
	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

pub type SecretsResult<T> = std::result::Result<T, SecretsError>;
