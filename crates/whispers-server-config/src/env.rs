// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secret-aware environment variable loading.
//!
//! Secrets are accepted either directly (`NAME`) or through file
//! indirection (`NAME_FILE` pointing at a file whose trimmed contents are
//! the secret). File indirection is how container orchestrators mount
//! secrets without exposing them in the process environment.

use std::path::PathBuf;

use whispers_common_secret::SecretString;

/// Errors raised while loading a secret from the environment.
#[derive(Debug, thiserror::Error)]
pub enum SecretEnvError {
	#[error("both {name} and {name}_FILE are set; use exactly one")]
	Conflicting { name: String },

	#[error("failed to read secret file {path} for {name}: {source}")]
	FileRead {
		name: String,
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

/// Load a secret from `name`, falling back to `{name}_FILE` indirection.
///
/// Returns `Ok(None)` when neither variable is set. Empty direct values are
/// treated as unset; file contents are trimmed of surrounding whitespace.
pub fn load_secret_env(name: &str) -> Result<Option<SecretString>, SecretEnvError> {
	let direct = std::env::var(name).ok().filter(|v| !v.is_empty());
	let file_var = format!("{name}_FILE");
	let indirect = std::env::var(&file_var).ok().filter(|v| !v.is_empty());

	match (direct, indirect) {
		(Some(_), Some(_)) => Err(SecretEnvError::Conflicting {
			name: name.to_string(),
		}),
		(Some(value), None) => Ok(Some(SecretString::new(value))),
		(None, Some(path)) => {
			let path = PathBuf::from(path);
			let contents = std::fs::read_to_string(&path).map_err(|e| SecretEnvError::FileRead {
				name: name.to_string(),
				path: path.clone(),
				source: e,
			})?;
			Ok(Some(SecretString::new(contents.trim().to_string())))
		}
		(None, None) => Ok(None),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	// Each test uses a unique variable name; process env is global state.

	#[test]
	fn unset_returns_none() {
		let loaded = load_secret_env("WHISPERS_TEST_SECRET_UNSET").unwrap();
		assert!(loaded.is_none());
	}

	#[test]
	fn direct_value_is_loaded() {
		std::env::set_var("WHISPERS_TEST_SECRET_DIRECT", "s3cret");
		let loaded = load_secret_env("WHISPERS_TEST_SECRET_DIRECT")
			.unwrap()
			.unwrap();
		assert_eq!(loaded.expose(), "s3cret");
		std::env::remove_var("WHISPERS_TEST_SECRET_DIRECT");
	}

	#[test]
	fn file_indirection_trims_contents() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "  s3cret-from-file  ").unwrap();
		std::env::set_var("WHISPERS_TEST_SECRET_INDIRECT_FILE", file.path());

		let loaded = load_secret_env("WHISPERS_TEST_SECRET_INDIRECT")
			.unwrap()
			.unwrap();
		assert_eq!(loaded.expose(), "s3cret-from-file");
		std::env::remove_var("WHISPERS_TEST_SECRET_INDIRECT_FILE");
	}

	#[test]
	fn conflicting_sources_error() {
		std::env::set_var("WHISPERS_TEST_SECRET_BOTH", "a");
		std::env::set_var("WHISPERS_TEST_SECRET_BOTH_FILE", "/dev/null");
		let result = load_secret_env("WHISPERS_TEST_SECRET_BOTH");
		assert!(matches!(result, Err(SecretEnvError::Conflicting { .. })));
		std::env::remove_var("WHISPERS_TEST_SECRET_BOTH");
		std::env::remove_var("WHISPERS_TEST_SECRET_BOTH_FILE");
	}

	#[test]
	fn missing_file_errors() {
		std::env::set_var(
			"WHISPERS_TEST_SECRET_NOFILE_FILE",
			"/nonexistent/secret.txt",
		);
		let result = load_secret_env("WHISPERS_TEST_SECRET_NOFILE");
		assert!(matches!(result, Err(SecretEnvError::FileRead { .. })));
		std::env::remove_var("WHISPERS_TEST_SECRET_NOFILE_FILE");
	}
}
