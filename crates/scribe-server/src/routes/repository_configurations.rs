// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Repository configuration write handlers.
//!
//! Every write goes through [`ConfigurationGuard`](scribe_server_configurations::ConfigurationGuard),
//! which resolves the caller's installation itself. Ids in the body that name
//! an installation are ignored. Malformed bodies and ids are answered with
//! the usual `{success: false, message}` 400.

use axum::{
	extract::{
		rejection::{JsonRejection, PathRejection},
		Path, State,
	},
	response::IntoResponse,
	Json,
};
use scribe_server_configurations::ConfigurationPayload;

use crate::{
	api::AppState,
	api_response::{self, DataEnvelope},
	auth_middleware::RequireAuth,
	error::ServerError,
};

/// POST /api/repository-configurations - Create a configuration.
pub async fn create_repository_configuration(
	RequireAuth(user): RequireAuth,
	State(state): State<AppState>,
	body: Result<Json<DataEnvelope<ConfigurationPayload>>, JsonRejection>,
) -> Result<impl IntoResponse, ServerError> {
	let Json(body) = body?;
	let configuration = state
		.guard
		.create(&user.username, body.into_inner())
		.await?;

	Ok(api_response::created(configuration))
}

/// PUT /api/repository-configurations/{id} - Update a configuration.
pub async fn update_repository_configuration(
	RequireAuth(user): RequireAuth,
	State(state): State<AppState>,
	id: Result<Path<i64>, PathRejection>,
	body: Result<Json<DataEnvelope<ConfigurationPayload>>, JsonRejection>,
) -> Result<impl IntoResponse, ServerError> {
	let Path(id) = id?;
	let Json(body) = body?;
	let configuration = state
		.guard
		.update(&user.username, id, body.into_inner())
		.await?;

	Ok(api_response::ok(configuration))
}

/// DELETE /api/repository-configurations/{id} - Delete a configuration.
pub async fn delete_repository_configuration(
	RequireAuth(user): RequireAuth,
	State(state): State<AppState>,
	id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ServerError> {
	let Path(id) = id?;
	let configuration = state.guard.delete(&user.username, id).await?;

	Ok(api_response::ok(configuration))
}
