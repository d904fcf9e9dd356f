// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use axum::{extract::State, response::IntoResponse};

use crate::{api::AppState, api_response, auth_middleware::RequireAuth, error::ServerError};

/// GET /api/installations - The caller's installations with their repositories.
pub async fn list_installations(
	RequireAuth(user): RequireAuth,
	State(state): State<AppState>,
) -> Result<impl IntoResponse, ServerError> {
	let installations = state
		.installation_store
		.list_installations_for_user(&user.username)
		.await?;

	tracing::debug!(
		username = %user.username,
		count = installations.len(),
		"installations: listed"
	);

	Ok(api_response::ok(installations))
}
