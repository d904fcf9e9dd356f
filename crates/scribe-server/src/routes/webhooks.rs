// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use axum::{
	body::Bytes,
	extract::State,
	http::{HeaderMap, StatusCode},
	response::IntoResponse,
	Json,
};
use scribe_server_github_app::InstallationEvent;

use crate::{api::AppState, error::ServerError};

/// POST /api/installation - Handle GitHub App installation events.
///
/// The signature is checked over the raw body before anything is parsed.
/// Reconciliation failures are answered with 500 and `success: false`.
pub async fn installation_webhook(
	State(state): State<AppState>,
	headers: HeaderMap,
	body: Bytes,
) -> Result<impl IntoResponse, ServerError> {
	if let Err(e) = state.verifier.verify(&headers, &body) {
		tracing::warn!(error = %e, "installation_webhook: signature verification failed");
		return Err(e.into());
	}

	let event = InstallationEvent::parse(&body).map_err(|e| {
		tracing::warn!(error = %e, "installation_webhook: invalid payload");
		ServerError::from(e)
	})?;

	tracing::debug!(action = %event.action(), "installation_webhook: received event");

	let response = state.reconciler.handle(&event).await;
	let status = if response.success {
		StatusCode::OK
	} else {
		StatusCode::INTERNAL_SERVER_ERROR
	};

	Ok((status, Json(response)))
}
