// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Server error types and HTTP response conversions.

use axum::{
	extract::rejection::{JsonRejection, PathRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use scribe_server_configurations::ConfigurationError;
use scribe_server_db::DbError;
use scribe_server_github_app::GithubAppError;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	/// Database error from scribe-server-db.
	#[error("Database error: {0}")]
	DbError(#[from] DbError),

	/// Missing or unknown caller credentials.
	#[error("Unauthorized: {0}")]
	Unauthorized(String),

	/// Webhook signature did not verify.
	#[error("Invalid signature")]
	InvalidSignature,

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Conflict: {0}")]
	Conflict(String),

	/// Invalid request payload.
	#[error("Invalid request: {0}")]
	BadRequest(String),

	/// Route kept for compatibility but switched off.
	#[error("Not implemented")]
	NotImplemented,
}

/// Error response body, `{ "success": false, "message": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
	pub success: bool,
	pub message: String,
}

impl ErrorResponse {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			success: false,
			message: message.into(),
		}
	}
}

impl From<GithubAppError> for ServerError {
	fn from(err: GithubAppError) -> Self {
		match err {
			GithubAppError::InvalidWebhookSignature => ServerError::InvalidSignature,
			GithubAppError::InvalidPayload(_) => ServerError::BadRequest(err.to_string()),
			GithubAppError::Persistence(e) => ServerError::DbError(e),
		}
	}
}

impl From<ConfigurationError> for ServerError {
	fn from(err: ConfigurationError) -> Self {
		match err {
			ConfigurationError::InstallationNotFound
			| ConfigurationError::RepositoryNotInstalled
			| ConfigurationError::ConfigurationNotFound => ServerError::NotFound(err.to_string()),
			ConfigurationError::AlreadyExists => ServerError::Conflict(err.to_string()),
			ConfigurationError::MissingRepository | ConfigurationError::InvalidSchedule(_) => {
				ServerError::BadRequest(err.to_string())
			}
			ConfigurationError::Persistence(e) => ServerError::DbError(e),
		}
	}
}

impl From<JsonRejection> for ServerError {
	fn from(rejection: JsonRejection) -> Self {
		ServerError::BadRequest(rejection.body_text())
	}
}

impl From<PathRejection> for ServerError {
	fn from(rejection: PathRejection) -> Self {
		ServerError::BadRequest(rejection.body_text())
	}
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let (status, message) = match self {
			ServerError::DbError(e) => {
				tracing::error!(error = %e, "database error");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					"A database error occurred".to_string(),
				)
			}
			ServerError::Unauthorized(msg) => {
				tracing::warn!(error = %msg, "unauthorized");
				(StatusCode::UNAUTHORIZED, msg)
			}
			// The webhook sender gets a bare string, not a JSON body.
			ServerError::InvalidSignature => {
				return (StatusCode::FORBIDDEN, "Invalid signature").into_response();
			}
			ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
			ServerError::Conflict(msg) => (StatusCode::CONFLICT, msg),
			ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
			ServerError::NotImplemented => {
				(StatusCode::NOT_IMPLEMENTED, "Not implemented".to_string())
			}
		};

		(status, Json(ErrorResponse::new(message))).into_response()
	}
}
