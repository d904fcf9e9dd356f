// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use axum::{
	extract::{Path, State},
	response::IntoResponse,
	Json,
};

use crate::{api::AppState, error::ServerError};

/// GET /api/internal/repository-configurations/{id} - Configuration with its
/// installation and repository, for service-to-service callers.
pub async fn get_repository_configuration(
	State(state): State<AppState>,
	Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServerError> {
	let details = state
		.configuration_store
		.get_configuration_details(id)
		.await?
		.ok_or_else(|| ServerError::NotFound("Repository configuration not found".to_string()))?;

	tracing::debug!(configuration_id = id, "internal: configuration resolved");

	Ok(Json(details))
}
