// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Not found: {0}")]
	NotFound(String),

	/// A unique constraint rejected the write (`full_name`,
	/// `installation_id`, or an (installation, repository) configuration pair).
	#[error("Conflict: {0}")]
	Conflict(String),

	#[error("Internal: {0}")]
	Internal(String),

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

impl DbError {
	pub fn is_conflict(&self) -> bool {
		matches!(self, DbError::Conflict(_))
	}

	/// Map a unique-constraint violation to [`DbError::Conflict`], passing any
	/// other sqlx error through.
	pub(crate) fn from_insert(err: sqlx::Error, conflict: impl Into<String>) -> Self {
		match err {
			sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
				DbError::Conflict(conflict.into())
			}
			other => DbError::Sqlx(other),
		}
	}
}
