// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OpenID Connect authorization-code authentication for Whispers.
//!
//! This crate implements the OIDC authorization code flow against any
//! discovery-capable issuer.
//!
//! # Flow
//!
//! 1. **Discovery**: Fetch `{issuer}/.well-known/openid-configuration` to
//!    learn the authorization, token, and userinfo endpoints. The document
//!    is fetched lazily on first use and cached for the process lifetime.
//!
//! 2. **Authorization URL Generation**: Generate a URL with a state
//!    parameter for CSRF protection. The user is redirected to the issuer
//!    to authenticate.
//!
//! 3. **Code Exchange**: The issuer redirects back to the configured
//!    `redirect_uri` with an authorization `code`, which is exchanged for
//!    an access token at the token endpoint.
//!
//! 4. **Identity Resolution**: The access token is presented to the
//!    userinfo endpoint; the returned claims become an
//!    [`Identity`](whispers_server_auth::Identity). Claims are trusted as
//!    delivered — this service performs no JWT validation of its own.
//!
//! # Security Considerations
//!
//! - The `client_secret` and access tokens are wrapped in [`SecretString`]
//!   to prevent accidental logging.
//! - All tracing instrumentation skips sensitive parameters.
//! - Always validate the `state` parameter in callbacks to prevent CSRF
//!   attacks; the server keeps issued states in a TTL-bounded store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::env;
use tokio::sync::OnceCell;
use url::Url;
use whispers_common_secret::SecretString;
use whispers_server_auth::{Identity, IdentityError, IdentityResolver};

const DISCOVERY_PATH: &str = "/.well-known/openid-configuration";

const DEFAULT_SCOPES: &[&str] = &["openid", "profile", "email", "groups"];
const DEFAULT_GROUPS_CLAIM: &str = "groups";

// =============================================================================
// Errors
// =============================================================================

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// A required environment variable was not set.
	#[error("missing environment variable: {0}")]
	MissingEnvVar(String),

	/// A configuration value was empty or invalid.
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),
}

/// Errors that can occur during OIDC operations.
#[derive(Debug, thiserror::Error)]
pub enum OidcError {
	/// The HTTP request to the issuer failed (network error, timeout, etc.).
	#[error("HTTP request failed: {0}")]
	HttpRequest(#[from] reqwest::Error),

	/// The discovery document was missing or unusable.
	#[error("issuer discovery failed: {0}")]
	Discovery(String),

	/// The response from the issuer could not be parsed as expected.
	#[error("failed to parse response: {0}")]
	ParseError(String),

	/// The issuer returned an error response (invalid code, expired token, etc.).
	#[error("identity provider error: {0}")]
	Provider(String),
}

impl From<OidcError> for IdentityError {
	fn from(err: OidcError) -> Self {
		IdentityError::Provider(err.to_string())
	}
}

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the OIDC client.
///
/// The `client_secret` is wrapped in [`SecretString`] to prevent accidental
/// logging or exposure.
#[derive(Debug, Clone)]
pub struct OidcConfig {
	/// Issuer base URL; discovery is fetched relative to it.
	pub issuer: String,
	/// The OAuth application client ID.
	pub client_id: String,
	/// The OAuth application client secret (wrapped to prevent logging).
	pub client_secret: SecretString,
	/// The callback URL where the issuer redirects after authentication.
	pub redirect_uri: String,
	/// OIDC scopes to request.
	pub scopes: Vec<String>,
	/// Name of the userinfo claim carrying group memberships.
	pub groups_claim: String,
}

impl OidcConfig {
	/// Load configuration from environment variables.
	///
	/// # Required Environment Variables
	///
	/// - `WHISPERS_SERVER_OIDC_ISSUER`: The issuer base URL.
	/// - `WHISPERS_SERVER_OIDC_CLIENT_ID`: The OAuth client ID.
	/// - `WHISPERS_SERVER_OIDC_CLIENT_SECRET`: The OAuth client secret.
	/// - `WHISPERS_SERVER_OIDC_REDIRECT_URI`: The callback URL.
	///
	/// # Optional Environment Variables
	///
	/// - `WHISPERS_SERVER_OIDC_SCOPES`: Space or comma separated scope list
	///   (default `openid profile email groups`).
	/// - `WHISPERS_SERVER_OIDC_GROUPS_CLAIM`: Groups claim name
	///   (default `groups`).
	///
	/// # Errors
	///
	/// Returns [`ConfigError::MissingEnvVar`] if any required variable is not set.
	pub fn from_env() -> Result<Self, ConfigError> {
		let issuer = env::var("WHISPERS_SERVER_OIDC_ISSUER")
			.map_err(|_| ConfigError::MissingEnvVar("WHISPERS_SERVER_OIDC_ISSUER".to_string()))?;

		let client_id = env::var("WHISPERS_SERVER_OIDC_CLIENT_ID")
			.map_err(|_| ConfigError::MissingEnvVar("WHISPERS_SERVER_OIDC_CLIENT_ID".to_string()))?;

		let client_secret = env::var("WHISPERS_SERVER_OIDC_CLIENT_SECRET").map_err(|_| {
			ConfigError::MissingEnvVar("WHISPERS_SERVER_OIDC_CLIENT_SECRET".to_string())
		})?;

		let redirect_uri = env::var("WHISPERS_SERVER_OIDC_REDIRECT_URI").map_err(|_| {
			ConfigError::MissingEnvVar("WHISPERS_SERVER_OIDC_REDIRECT_URI".to_string())
		})?;

		let scopes = env::var("WHISPERS_SERVER_OIDC_SCOPES")
			.map(|s| Self::parse_scopes(&s))
			.unwrap_or_else(|_| DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect());

		let groups_claim = env::var("WHISPERS_SERVER_OIDC_GROUPS_CLAIM")
			.unwrap_or_else(|_| DEFAULT_GROUPS_CLAIM.to_string());

		Ok(Self {
			issuer,
			client_id,
			client_secret: SecretString::new(client_secret),
			redirect_uri,
			scopes,
			groups_claim,
		})
	}

	/// Validate that all configuration fields are non-empty.
	///
	/// # Errors
	///
	/// Returns [`ConfigError::InvalidConfig`] if any field is empty.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.issuer.is_empty() {
			return Err(ConfigError::InvalidConfig(
				"issuer cannot be empty".to_string(),
			));
		}
		if self.client_id.is_empty() {
			return Err(ConfigError::InvalidConfig(
				"client_id cannot be empty".to_string(),
			));
		}
		if self.client_secret.expose().is_empty() {
			return Err(ConfigError::InvalidConfig(
				"client_secret cannot be empty".to_string(),
			));
		}
		if self.redirect_uri.is_empty() {
			return Err(ConfigError::InvalidConfig(
				"redirect_uri cannot be empty".to_string(),
			));
		}
		Ok(())
	}

	/// The issuer's discovery document URL.
	pub fn discovery_url(&self) -> String {
		format!("{}{DISCOVERY_PATH}", self.issuer.trim_end_matches('/'))
	}

	/// Join scopes into a space-separated string for the authorization URL.
	pub fn scopes_string(&self) -> String {
		self.scopes.join(" ")
	}

	/// Parse a scope string into a vector of individual scopes.
	pub fn parse_scopes(scope_str: &str) -> Vec<String> {
		scope_str
			.split([' ', ','])
			.map(|s| s.trim().to_string())
			.filter(|s| !s.is_empty())
			.collect()
	}
}

// =============================================================================
// Response types
// =============================================================================

/// The subset of the OIDC discovery document this client uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryDocument {
	/// Issuer identifier as asserted by the document.
	pub issuer: String,
	/// Endpoint users are redirected to for authentication.
	pub authorization_endpoint: String,
	/// Endpoint where authorization codes become tokens.
	pub token_endpoint: String,
	/// Endpoint returning identity claims for an access token.
	pub userinfo_endpoint: String,
}

/// Response from the issuer's token endpoint after exchanging a code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
	/// The access token for the userinfo request (wrapped to prevent logging).
	pub access_token: SecretString,
	/// The token type (always "Bearer" in practice).
	pub token_type: String,
	/// Seconds until the access token expires, if stated.
	pub expires_in: Option<i64>,
	/// Granted scopes (space-separated), if stated.
	pub scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OidcErrorResponse {
	error: String,
	error_description: Option<String>,
}

// =============================================================================
// Client
// =============================================================================

/// OIDC client for authenticating users against a discovery-capable issuer.
///
/// # Example
///
/// ```rust,no_run
/// use whispers_server_auth_oidc::{OidcClient, OidcConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = OidcConfig::from_env()?;
/// let client = OidcClient::new(config);
///
/// let auth_url = client.authorization_url("csrf-state").await?;
/// // Redirect user to auth_url...
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OidcClient {
	config: OidcConfig,
	http_client: reqwest::Client,
	discovery: OnceCell<DiscoveryDocument>,
}

impl OidcClient {
	/// Create a new OIDC client with the given configuration.
	///
	/// No network traffic happens here; the discovery document is fetched
	/// on first use.
	///
	/// # Panics
	///
	/// Panics if the HTTP client cannot be built (should never happen in practice).
	#[tracing::instrument(skip_all, name = "OidcClient::new")]
	pub fn new(config: OidcConfig) -> Self {
		let http_client = reqwest::Client::builder()
			.user_agent(concat!("whispers-server/", env!("CARGO_PKG_VERSION")))
			.timeout(std::time::Duration::from_secs(30))
			.build()
			.expect("failed to build HTTP client");

		Self {
			config,
			http_client,
			discovery: OnceCell::new(),
		}
	}

	/// The configuration this client was built with.
	pub fn config(&self) -> &OidcConfig {
		&self.config
	}

	/// Fetch (or return the cached) discovery document.
	///
	/// # Errors
	///
	/// - [`OidcError::HttpRequest`]: Network error or timeout.
	/// - [`OidcError::Discovery`]: Non-success response or unusable document.
	#[tracing::instrument(skip(self), fields(issuer = %self.config.issuer))]
	pub async fn discovery(&self) -> Result<&DiscoveryDocument, OidcError> {
		self
			.discovery
			.get_or_try_init(|| async {
				let url = self.config.discovery_url();
				tracing::debug!(url = %url, "fetching OIDC discovery document");

				let response = self.http_client.get(&url).send().await?;
				if !response.status().is_success() {
					return Err(OidcError::Discovery(format!(
						"discovery endpoint returned {}",
						response.status()
					)));
				}

				response
					.json::<DiscoveryDocument>()
					.await
					.map_err(|e| OidcError::Discovery(format!("invalid discovery document: {e}")))
			})
			.await
	}

	/// Generate the authorization URL for the OIDC code flow.
	///
	/// # Arguments
	///
	/// - `state`: A random, unguessable string to prevent CSRF attacks.
	///   This value should be stored server-side and verified when the
	///   user is redirected back.
	#[tracing::instrument(skip(self), fields(client_id = %self.config.client_id))]
	pub async fn authorization_url(&self, state: &str) -> Result<String, OidcError> {
		let discovery = self.discovery().await?;
		self.authorization_url_from(discovery, state)
	}

	/// Build the authorization URL from an already-fetched discovery document.
	pub fn authorization_url_from(
		&self,
		discovery: &DiscoveryDocument,
		state: &str,
	) -> Result<String, OidcError> {
		let mut url = Url::parse(&discovery.authorization_endpoint).map_err(|e| {
			OidcError::Discovery(format!(
				"invalid authorization endpoint '{}': {e}",
				discovery.authorization_endpoint
			))
		})?;

		url
			.query_pairs_mut()
			.append_pair("response_type", "code")
			.append_pair("client_id", &self.config.client_id)
			.append_pair("redirect_uri", &self.config.redirect_uri)
			.append_pair("scope", &self.config.scopes_string())
			.append_pair("state", state);

		Ok(url.to_string())
	}

	/// Exchange an authorization code for an access token.
	///
	/// # Arguments
	///
	/// - `code`: The authorization code from the OIDC callback.
	///
	/// # Errors
	///
	/// - [`OidcError::HttpRequest`]: Network error or timeout.
	/// - [`OidcError::Provider`]: The issuer rejected the code (expired, invalid, etc.).
	/// - [`OidcError::ParseError`]: Unexpected response format.
	#[tracing::instrument(skip(self, code), name = "OidcClient::exchange_code")]
	pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, OidcError> {
		let discovery = self.discovery().await?;
		tracing::debug!("exchanging authorization code for access token");

		let response = self
			.http_client
			.post(&discovery.token_endpoint)
			.header("Accept", "application/json")
			.form(&[
				("grant_type", "authorization_code"),
				("code", code),
				("redirect_uri", self.config.redirect_uri.as_str()),
				("client_id", self.config.client_id.as_str()),
				("client_secret", self.config.client_secret.expose().as_str()),
			])
			.send()
			.await?;

		let body = response.text().await?;

		if let Ok(error_response) = serde_json::from_str::<OidcErrorResponse>(&body) {
			if !error_response.error.is_empty() {
				let message = error_response
					.error_description
					.unwrap_or(error_response.error);
				return Err(OidcError::Provider(message));
			}
		}

		serde_json::from_str(&body)
			.map_err(|e| OidcError::ParseError(format!("failed to parse token response: {e}")))
	}

	/// Fetch the authenticated user's claims from the userinfo endpoint.
	///
	/// # Arguments
	///
	/// - `access_token`: The access token from [`exchange_code`](Self::exchange_code).
	///
	/// # Errors
	///
	/// - [`OidcError::HttpRequest`]: Network error or timeout.
	/// - [`OidcError::Provider`]: Token is invalid or expired.
	/// - [`OidcError::ParseError`]: Unexpected response format.
	#[tracing::instrument(skip(self, access_token), name = "OidcClient::userinfo")]
	pub async fn userinfo(&self, access_token: &SecretString) -> Result<serde_json::Value, OidcError> {
		let discovery = self.discovery().await?;
		tracing::debug!("fetching userinfo claims");

		let response = self
			.http_client
			.get(&discovery.userinfo_endpoint)
			.header("Accept", "application/json")
			.header(
				"Authorization",
				format!("Bearer {}", access_token.expose()),
			)
			.send()
			.await?;

		if !response.status().is_success() {
			let status = response.status();
			let body = response.text().await.unwrap_or_default();
			return Err(OidcError::Provider(format!(
				"userinfo returned {status}: {body}"
			)));
		}

		response
			.json()
			.await
			.map_err(|e| OidcError::ParseError(format!("failed to parse userinfo response: {e}")))
	}
}

#[async_trait]
impl IdentityResolver for OidcClient {
	#[tracing::instrument(skip_all, name = "OidcClient::resolve_identity")]
	async fn resolve_identity(
		&self,
		access_token: &SecretString,
	) -> Result<Identity, IdentityError> {
		let claims = self.userinfo(access_token).await?;
		Identity::from_claims(&claims, &self.config.groups_claim)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn config() -> OidcConfig {
		OidcConfig {
			issuer: "https://iam.example.org/".to_string(),
			client_id: "test_client_id".to_string(),
			client_secret: SecretString::from("test_secret"),
			redirect_uri: "https://whispers.example.com/auth/callback".to_string(),
			scopes: OidcConfig::parse_scopes("openid profile email groups"),
			groups_claim: "groups".to_string(),
		}
	}

	fn discovery() -> DiscoveryDocument {
		DiscoveryDocument {
			issuer: "https://iam.example.org".to_string(),
			authorization_endpoint: "https://iam.example.org/authorize".to_string(),
			token_endpoint: "https://iam.example.org/token".to_string(),
			userinfo_endpoint: "https://iam.example.org/userinfo".to_string(),
		}
	}

	#[test]
	fn discovery_url_normalizes_trailing_slash() {
		assert_eq!(
			config().discovery_url(),
			"https://iam.example.org/.well-known/openid-configuration"
		);

		let mut without_slash = config();
		without_slash.issuer = "https://iam.example.org".to_string();
		assert_eq!(
			without_slash.discovery_url(),
			"https://iam.example.org/.well-known/openid-configuration"
		);
	}

	#[test]
	fn parse_scopes_splits_on_space_and_comma() {
		assert_eq!(
			OidcConfig::parse_scopes("openid profile,email ,  groups"),
			vec!["openid", "profile", "email", "groups"]
		);
	}

	#[test]
	fn scopes_string_is_space_separated() {
		assert_eq!(config().scopes_string(), "openid profile email groups");
	}

	#[test]
	fn validate_rejects_empty_fields() {
		let mut c = config();
		c.client_id = String::new();
		assert!(matches!(
			c.validate(),
			Err(ConfigError::InvalidConfig(_))
		));

		let mut c = config();
		c.client_secret = SecretString::from("");
		assert!(c.validate().is_err());

		assert!(config().validate().is_ok());
	}

	#[test]
	fn authorization_url_contains_required_params() {
		let client = OidcClient::new(config());
		let url = client
			.authorization_url_from(&discovery(), "test_state_123")
			.unwrap();

		assert!(url.starts_with("https://iam.example.org/authorize"));
		assert!(url.contains("response_type=code"));
		assert!(url.contains("client_id=test_client_id"));
		assert!(url.contains(
			"redirect_uri=https%3A%2F%2Fwhispers.example.com%2Fauth%2Fcallback"
		));
		assert!(url.contains("state=test_state_123"));
		assert!(url.contains("scope=openid+profile+email+groups"));
	}

	#[test]
	fn authorization_url_rejects_unparseable_endpoint() {
		let client = OidcClient::new(config());
		let mut doc = discovery();
		doc.authorization_endpoint = "not a url".to_string();
		assert!(matches!(
			client.authorization_url_from(&doc, "state"),
			Err(OidcError::Discovery(_))
		));
	}

	#[test]
	fn discovery_document_deserializes() {
		let json = r#"{
			"issuer": "https://iam.example.org",
			"authorization_endpoint": "https://iam.example.org/authorize",
			"token_endpoint": "https://iam.example.org/token",
			"userinfo_endpoint": "https://iam.example.org/userinfo",
			"jwks_uri": "https://iam.example.org/jwks",
			"response_types_supported": ["code"]
		}"#;

		let doc: DiscoveryDocument = serde_json::from_str(json).unwrap();
		assert_eq!(doc.token_endpoint, "https://iam.example.org/token");
	}

	#[test]
	fn token_response_deserializes_and_redacts() {
		let json = r#"{
			"access_token": "at-abc123",
			"token_type": "Bearer",
			"expires_in": 3600,
			"scope": "openid profile"
		}"#;

		let token: TokenResponse = serde_json::from_str(json).unwrap();
		assert_eq!(token.access_token.expose(), "at-abc123");
		assert_eq!(token.token_type, "Bearer");
		assert_eq!(token.expires_in, Some(3600));
		assert!(!format!("{token:?}").contains("at-abc123"));
	}

	#[test]
	fn error_response_takes_precedence() {
		let body = r#"{"error": "invalid_grant", "error_description": "code expired"}"#;
		let parsed: OidcErrorResponse = serde_json::from_str(body).unwrap();
		assert_eq!(parsed.error, "invalid_grant");
		assert_eq!(parsed.error_description.as_deref(), Some("code expired"));
	}
}
