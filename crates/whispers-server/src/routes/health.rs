// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Health check HTTP handler.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::AppState;

/// Overall or per-component health state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
	Healthy,
	Degraded,
	Unhealthy,
}

/// Health of a single component.
#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentHealth {
	pub status: HealthStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub detail: Option<String>,
}

/// Per-component breakdown.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthComponents {
	pub database: ComponentHealth,
	pub oidc: ComponentHealth,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
	pub status: HealthStatus,
	pub timestamp: String,
	pub duration_ms: u64,
	pub components: HealthComponents,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "System is healthy or degraded", body = HealthResponse),
        (status = 503, description = "System is unhealthy", body = HealthResponse)
    ),
    tag = "health"
)]
/// GET /health - Component health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
	let start = tokio::time::Instant::now();

	let database = match sqlx::query("SELECT 1").execute(&state.pool).await {
		Ok(_) => ComponentHealth {
			status: HealthStatus::Healthy,
			detail: None,
		},
		Err(e) => {
			tracing::error!(error = %e, "database health check failed");
			ComponentHealth {
				status: HealthStatus::Unhealthy,
				detail: Some(e.to_string()),
			}
		}
	};

	// Configuration-only check; no round-trip to the issuer.
	let oidc = if state.oidc.is_some() {
		ComponentHealth {
			status: HealthStatus::Healthy,
			detail: None,
		}
	} else {
		ComponentHealth {
			status: HealthStatus::Degraded,
			detail: Some("OIDC is not configured; login is disabled".to_string()),
		}
	};

	let status = aggregate_status(&database, &oidc);
	let response = HealthResponse {
		status,
		timestamp: chrono::Utc::now().to_rfc3339(),
		duration_ms: start.elapsed().as_millis() as u64,
		components: HealthComponents { database, oidc },
	};

	let http_status = match status {
		HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
		HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
	};

	(http_status, Json(response))
}

fn aggregate_status(database: &ComponentHealth, oidc: &ComponentHealth) -> HealthStatus {
	if database.status == HealthStatus::Unhealthy {
		return HealthStatus::Unhealthy;
	}
	if database.status == HealthStatus::Degraded || oidc.status != HealthStatus::Healthy {
		return HealthStatus::Degraded;
	}
	HealthStatus::Healthy
}

#[cfg(test)]
mod tests {
	use super::*;

	fn component(status: HealthStatus) -> ComponentHealth {
		ComponentHealth {
			status,
			detail: None,
		}
	}

	#[test]
	fn database_failure_is_unhealthy() {
		let status = aggregate_status(
			&component(HealthStatus::Unhealthy),
			&component(HealthStatus::Healthy),
		);
		assert_eq!(status, HealthStatus::Unhealthy);
	}

	#[test]
	fn missing_oidc_degrades_only() {
		let status = aggregate_status(
			&component(HealthStatus::Healthy),
			&component(HealthStatus::Degraded),
		);
		assert_eq!(status, HealthStatus::Degraded);
	}

	#[test]
	fn all_healthy_is_healthy() {
		let status = aggregate_status(
			&component(HealthStatus::Healthy),
			&component(HealthStatus::Healthy),
		);
		assert_eq!(status, HealthStatus::Healthy);
	}
}
