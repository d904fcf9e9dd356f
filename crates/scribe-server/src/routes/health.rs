// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Health HTTP handler.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::api::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
	Healthy,
	Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseHealth {
	pub status: HealthStatus,
	pub latency_ms: u64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
	pub status: HealthStatus,
	pub timestamp: String,
	pub database: DatabaseHealth,
}

/// GET /health - Database reachability check.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
	let start = Instant::now();
	let result = scribe_server_db::ping(&state.pool).await;
	let latency_ms = start.elapsed().as_millis() as u64;

	let database = match result {
		Ok(()) => DatabaseHealth {
			status: HealthStatus::Healthy,
			latency_ms,
			error: None,
		},
		Err(e) => {
			tracing::error!(error = %e, "health: database check failed");
			DatabaseHealth {
				status: HealthStatus::Unhealthy,
				latency_ms,
				error: Some("database unreachable".to_string()),
			}
		}
	};

	let status = database.status;
	let http_status = match status {
		HealthStatus::Healthy => StatusCode::OK,
		HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
	};

	let response = HealthResponse {
		status,
		timestamp: chrono::Utc::now().to_rfc3339(),
		database,
	};

	(http_status, Json(response))
}
