// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Error types for installation webhook handling.

use scribe_server_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GithubAppError {
	/// Missing, malformed or mismatched signature header.
	#[error("Invalid signature")]
	InvalidWebhookSignature,

	/// The body is not JSON, or a known action lacks a required field.
	#[error("Invalid webhook payload: {0}")]
	InvalidPayload(String),

	#[error("Persistence error: {0}")]
	Persistence(#[from] DbError),
}
