// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! End-to-end tests for the secrets API over an in-memory database.
//!
//! This suite covers:
//! - Authentication boundaries (401 without a valid session cookie)
//! - The create/view round-trip, including at-rest encryption
//! - Allow-list enforcement (403) and the expiry lifecycle (410)
//! - Terminal error bodies (`{code, message}`)

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration as ChronoDuration, Utc};
use http_body_util::BodyExt;
use tower::util::ServiceExt;
use whispers_common_secret::SecretString;
use whispers_server::{create_app_state, create_router, AppState};
use whispers_server_auth::{Identity, SessionData};
use whispers_server_config::{
	CryptoConfig, DatabaseConfig, HttpConfig, JobsConfig, LoggingConfig, ServerConfig,
	SessionConfig,
};
use whispers_server_secrets::NewSecret;

/// Standard base64 of a 32-byte key; the value itself is irrelevant to tests.
const TEST_ENCRYPTION_KEY: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

fn test_config() -> ServerConfig {
	ServerConfig {
		http: HttpConfig {
			base_url: "http://testserver".to_string(),
			..HttpConfig::default()
		},
		database: DatabaseConfig {
			url: "sqlite::memory:".to_string(),
		},
		session: SessionConfig {
			cookie_name: "whispers_session".to_string(),
			max_age_secs: 3600,
			secret: SecretString::from("integration-test-session-secret"),
		},
		crypto: CryptoConfig {
			encryption_key: SecretString::from(TEST_ENCRYPTION_KEY),
		},
		jobs: JobsConfig::default(),
		logging: LoggingConfig::default(),
	}
}

async fn test_state() -> AppState {
	let config = test_config();
	// A single connection: every pool connection to `sqlite::memory:` would
	// otherwise get its own database.
	let pool = sqlx::sqlite::SqlitePoolOptions::new()
		.max_connections(1)
		.connect(&config.database.url)
		.await
		.unwrap();
	whispers_server::db::run_migrations(&pool).await.unwrap();
	create_app_state(pool, &config).await.unwrap()
}

async fn test_app() -> (AppState, Router) {
	let state = test_state().await;
	let app = create_router(state.clone());
	(state, app)
}

fn identity(username: &str, groups: &[&str]) -> Identity {
	Identity {
		subject: format!("sub-{username}"),
		username: username.to_string(),
		email: Some(format!("{username}@example.com")),
		groups: groups.iter().map(|s| s.to_string()).collect(),
	}
}

fn session_cookie(state: &AppState, identity: &Identity) -> String {
	let sealed = state
		.session_codec
		.seal(&SessionData::new(identity.clone()))
		.unwrap();
	format!("whispers_session={sealed}")
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
	let bytes = response.into_body().collect().await.unwrap().to_bytes();
	serde_json::from_slice(&bytes).unwrap()
}

fn create_request(cookie: &str, body: serde_json::Value) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri("/api/secrets")
		.header(header::CONTENT_TYPE, "application/json")
		.header(header::COOKIE, cookie)
		.body(Body::from(body.to_string()))
		.unwrap()
}

fn view_request(cookie: &str, token: &str) -> Request<Body> {
	Request::builder()
		.uri(format!("/s/{token}"))
		.header(header::COOKIE, cookie)
		.body(Body::empty())
		.unwrap()
}

fn token_from_share_url(share_url: &str) -> String {
	share_url
		.rsplit_once("/s/")
		.map(|(_, token)| token.to_string())
		.unwrap()
}

#[tokio::test]
async fn home_reports_service_and_anonymous_caller() {
	let (_state, app) = test_app().await;

	let response = app
		.oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::OK);
	let body = json_body(response).await;
	assert_eq!(body["service"], "whispers-server");
	assert!(body.get("user").is_none());
}

#[tokio::test]
async fn health_is_degraded_without_oidc() {
	let (_state, app) = test_app().await;

	let response = app
		.oneshot(
			Request::builder()
				.uri("/health")
				.body(Body::empty())
				.unwrap(),
		)
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::OK);
	let body = json_body(response).await;
	assert_eq!(body["status"], "degraded");
	assert_eq!(body["components"]["database"]["status"], "healthy");
	assert_eq!(body["components"]["oidc"]["status"], "degraded");
}

#[tokio::test]
async fn create_requires_authentication() {
	let (_state, app) = test_app().await;

	let request = Request::builder()
		.method("POST")
		.uri("/api/secrets")
		.header(header::CONTENT_TYPE, "application/json")
		.body(Body::from(
			serde_json::json!({ "content": "hush" }).to_string(),
		))
		.unwrap();

	let response = app.oneshot(request).await.unwrap();
	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	let body = json_body(response).await;
	assert_eq!(body["code"], "unauthenticated");
}

#[tokio::test]
async fn tampered_session_cookie_is_unauthenticated() {
	let (state, app) = test_app().await;
	let mut cookie = session_cookie(&state, &identity("alice", &[]));
	cookie.push('x');

	let response = app
		.oneshot(create_request(&cookie, serde_json::json!({ "content": "hush" })))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn open_secret_roundtrips_for_any_authenticated_user() {
	let (state, app) = test_app().await;
	let alice = session_cookie(&state, &identity("alice", &[]));
	let bob = session_cookie(&state, &identity("bob", &[]));

	let response = app
		.clone()
		.oneshot(create_request(
			&alice,
			serde_json::json!({
				"title": "deploy token",
				"content": "s3cret-payload",
				"expires_in_hours": 1
			}),
		))
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::CREATED);
	let body = json_body(response).await;
	let share_url = body["share_url"].as_str().unwrap();
	assert!(share_url.starts_with("http://testserver/s/"));
	let token = token_from_share_url(share_url);

	// Plaintext never reaches the database.
	let stored: Vec<u8> = sqlx::query_scalar("SELECT ciphertext FROM secrets LIMIT 1")
		.fetch_one(&state.pool)
		.await
		.unwrap();
	assert_ne!(stored.as_slice(), b"s3cret-payload".as_slice());

	// A different authenticated identity can view an open secret.
	let response = app.oneshot(view_request(&bob, &token)).await.unwrap();
	assert_eq!(response.status(), StatusCode::OK);
	let body = json_body(response).await;
	assert_eq!(body["content"], "s3cret-payload");
	assert_eq!(body["title"], "deploy token");
	assert_eq!(body["owner"], "alice");
}

#[tokio::test]
async fn user_allow_list_is_enforced() {
	let (state, app) = test_app().await;
	let carol = session_cookie(&state, &identity("carol", &[]));
	let alice = session_cookie(&state, &identity("alice", &[]));
	let bob = session_cookie(&state, &identity("bob", &[]));

	let response = app
		.clone()
		.oneshot(create_request(
			&carol,
			serde_json::json!({
				"content": "for alice only",
				"allowed_users": ["alice"]
			}),
		))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::CREATED);
	let token = token_from_share_url(json_body(response).await["share_url"].as_str().unwrap());

	let response = app
		.clone()
		.oneshot(view_request(&bob, &token))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::FORBIDDEN);
	assert_eq!(json_body(response).await["code"], "forbidden");

	let response = app.oneshot(view_request(&alice, &token)).await.unwrap();
	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn group_allow_list_is_enforced() {
	let (state, app) = test_app().await;
	let owner = session_cookie(&state, &identity("owner", &[]));
	let ops = session_cookie(&state, &identity("carol", &["ops"]));
	let dev = session_cookie(&state, &identity("dave", &["dev"]));

	let response = app
		.clone()
		.oneshot(create_request(
			&owner,
			serde_json::json!({
				"content": "ops only",
				"allowed_groups": ["ops"]
			}),
		))
		.await
		.unwrap();
	let token = token_from_share_url(json_body(response).await["share_url"].as_str().unwrap());

	let response = app
		.clone()
		.oneshot(view_request(&ops, &token))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::OK);

	let response = app.oneshot(view_request(&dev, &token)).await.unwrap();
	assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_token_is_not_found() {
	let (state, app) = test_app().await;
	let alice = session_cookie(&state, &identity("alice", &[]));

	let response = app
		.oneshot(view_request(&alice, "does-not-exist"))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::NOT_FOUND);
	assert_eq!(json_body(response).await["code"], "not_found");
}

#[tokio::test]
async fn expired_secret_is_gone() {
	let (state, app) = test_app().await;
	let alice = session_cookie(&state, &identity("alice", &[]));

	// Created two hours ago with a one-hour TTL.
	let created = state
		.secrets
		.create(
			NewSecret {
				title: None,
				content: "stale".to_string(),
				ttl_hours: 1,
				allowed_users: vec![],
				allowed_groups: vec![],
				owner: "alice".to_string(),
			},
			Utc::now() - ChronoDuration::hours(2),
		)
		.await
		.unwrap();

	let response = app
		.oneshot(view_request(&alice, &created.token))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::GONE);
	assert_eq!(json_body(response).await["code"], "expired");
}

#[tokio::test]
async fn non_positive_ttl_is_a_bad_request() {
	let (state, app) = test_app().await;
	let alice = session_cookie(&state, &identity("alice", &[]));

	let response = app
		.oneshot(create_request(
			&alice,
			serde_json::json!({ "content": "x", "expires_in_hours": 0 }),
		))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(json_body(response).await["code"], "bad_request");
}

#[tokio::test]
async fn empty_content_is_a_bad_request() {
	let (state, app) = test_app().await;
	let alice = session_cookie(&state, &identity("alice", &[]));

	let response = app
		.oneshot(create_request(&alice, serde_json::json!({ "content": "" })))
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_is_unavailable_without_oidc() {
	let (_state, app) = test_app().await;

	let response = app
		.oneshot(
			Request::builder()
				.uri("/auth/login")
				.body(Body::empty())
				.unwrap(),
		)
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
	assert_eq!(json_body(response).await["code"], "unavailable");
}

#[tokio::test]
async fn me_reflects_the_session_identity() {
	let (state, app) = test_app().await;
	let cookie = session_cookie(&state, &identity("alice", &["ops"]));

	let response = app
		.clone()
		.oneshot(
			Request::builder()
				.uri("/auth/me")
				.header(header::COOKIE, &cookie)
				.body(Body::empty())
				.unwrap(),
		)
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::OK);
	let body = json_body(response).await;
	assert_eq!(body["username"], "alice");
	assert_eq!(body["groups"], serde_json::json!(["ops"]));

	let response = app
		.oneshot(
			Request::builder()
				.uri("/auth/me")
				.body(Body::empty())
				.unwrap(),
		)
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_clears_the_session_cookie() {
	let (_state, app) = test_app().await;

	let response = app
		.oneshot(
			Request::builder()
				.uri("/auth/logout")
				.body(Body::empty())
				.unwrap(),
		)
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::SEE_OTHER);
	let set_cookie = response
		.headers()
		.get(header::SET_COOKIE)
		.unwrap()
		.to_str()
		.unwrap();
	assert!(set_cookie.starts_with("whispers_session="));
	assert!(set_cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn openapi_document_is_served() {
	let (_state, app) = test_app().await;

	let response = app
		.oneshot(
			Request::builder()
				.uri("/api-docs/openapi.json")
				.body(Body::empty())
				.unwrap(),
		)
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::OK);
	let body = json_body(response).await;
	assert!(body["paths"]["/api/secrets"].is_object());
}
