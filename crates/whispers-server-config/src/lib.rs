// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for the Whispers server.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`WHISPERS_SERVER_*`)
//! - Secret loading with `*_FILE` indirection, kept out of config files
//!
//! # Usage
//!
//! ```ignore
//! use whispers_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("Server listening on {}:{}", config.http.host, config.http.port);
//! ```

pub mod env;
pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use env::{load_secret_env, SecretEnvError};
pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};
use whispers_common_secret::SecretString;

/// Environment variable holding the session cookie signing secret.
pub const SESSION_SECRET_ENV_VAR: &str = "WHISPERS_SERVER_SESSION_SECRET";

/// Environment variable holding the base64-encoded 32-byte encryption key.
pub const ENCRYPTION_KEY_ENV_VAR: &str = "WHISPERS_SERVER_ENCRYPTION_KEY";

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	pub session: SessionConfig,
	pub crypto: CryptoConfig,
	pub jobs: JobsConfig,
	pub logging: LoggingConfig,
}

impl ServerConfig {
	/// Get the socket address string for binding.
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`WHISPERS_SERVER_*`)
/// 2. Config file (`/etc/whispers/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<ServerConfig, ConfigError> {
	let mut merged = ServerConfigLayer::default();
	merged.merge(EnvSource.load()?);
	finalize(merged)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config, loading secrets from
/// the environment.
fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let session_secret = load_secret_env(SESSION_SECRET_ENV_VAR)
		.map_err(|e| ConfigError::Secret(e.to_string()))?
		.ok_or_else(|| {
			ConfigError::Validation(format!("{SESSION_SECRET_ENV_VAR} must be set"))
		})?;
	let encryption_key = load_secret_env(ENCRYPTION_KEY_ENV_VAR)
		.map_err(|e| ConfigError::Secret(e.to_string()))?
		.ok_or_else(|| {
			ConfigError::Validation(format!("{ENCRYPTION_KEY_ENV_VAR} must be set"))
		})?;

	finalize_with_secrets(layer, session_secret, encryption_key)
}

/// Finalize with explicitly supplied secrets (env-independent; used by tests).
pub fn finalize_with_secrets(
	layer: ServerConfigLayer,
	session_secret: SecretString,
	encryption_key: SecretString,
) -> Result<ServerConfig, ConfigError> {
	validate_secrets(&session_secret)?;

	let http = layer.http.unwrap_or_default().finalize();
	let database = layer.database.unwrap_or_default().finalize();
	let session = layer.session.unwrap_or_default().finalize(session_secret);
	let jobs = layer.jobs.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();
	let crypto = CryptoConfig { encryption_key };

	info!(
		host = %http.host,
		port = http.port,
		database = %database.url,
		base_url = %http.base_url,
		purge_interval_secs = jobs.purge_interval_secs,
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		http,
		database,
		session,
		crypto,
		jobs,
		logging,
	})
}

/// Validate cross-field configuration rules.
fn validate_secrets(session_secret: &SecretString) -> Result<(), ConfigError> {
	if session_secret.expose().len() < 16 {
		return Err(ConfigError::Validation(format!(
			"{SESSION_SECRET_ENV_VAR} must be at least 16 bytes; generate one with \
			 `openssl rand -base64 32`"
		)));
	}
	Ok(())
}
