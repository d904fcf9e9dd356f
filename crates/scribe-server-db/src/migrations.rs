// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::SqlitePool;

use crate::error::DbError;

const MIGRATIONS: &[(&str, &str)] = &[
	(
		"001_installations",
		include_str!("../migrations/001_installations.sql"),
	),
	(
		"002_repository_configurations",
		include_str!("../migrations/002_repository_configurations.sql"),
	),
	(
		"003_api_tokens",
		include_str!("../migrations/003_api_tokens.sql"),
	),
];

/// Apply the embedded schema. Safe to run on every startup.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
	for (name, sql) in MIGRATIONS {
		for stmt in sql.split(';').filter(|s| !s.trim().is_empty()) {
			if let Err(e) = sqlx::query(stmt).execute(pool).await {
				if !e.to_string().contains("already exists") {
					tracing::error!(migration = %name, error = %e, "migration failed");
					return Err(e.into());
				}
			}
		}
		tracing::debug!(migration = %name, "migration applied");
	}

	Ok(())
}
