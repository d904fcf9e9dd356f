// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Repository configuration records.
//!
//! At most one configuration exists per (installation, repository) pair.
//! Ownership checks live in the configuration guard; this layer only enforces
//! the pair uniqueness and scopes lookups by installation where asked.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::DbError;
use crate::installation::row_to_installation;
use crate::repository::row_to_repository;
use crate::types::{parse_timestamp, ConfigurationDetails, ConfigurationInput, RepositoryConfiguration};

const CONFIGURATION_COLUMNS: &str = "id, installation_id, repository_id, private, cron, settings, last_generation, created_at, updated_at";

#[async_trait]
pub trait ConfigurationStore: Send + Sync {
	async fn create_configuration(
		&self,
		input: &ConfigurationInput,
	) -> Result<RepositoryConfiguration, DbError>;
	async fn update_configuration(
		&self,
		id: i64,
		input: &ConfigurationInput,
	) -> Result<RepositoryConfiguration, DbError>;
	async fn delete_configuration(&self, id: i64) -> Result<bool, DbError>;
	async fn get_configuration_for_pair(
		&self,
		installation: i64,
		repository: i64,
	) -> Result<Option<RepositoryConfiguration>, DbError>;
	async fn get_installation_configuration(
		&self,
		installation: i64,
		id: i64,
	) -> Result<Option<RepositoryConfiguration>, DbError>;
	async fn get_configuration_details(
		&self,
		id: i64,
	) -> Result<Option<ConfigurationDetails>, DbError>;
}

#[derive(Clone)]
pub struct ConfigurationRepository {
	pool: SqlitePool,
}

impl ConfigurationRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert a configuration. An existing configuration for the same pair
	/// yields [`DbError::Conflict`].
	#[tracing::instrument(
		skip(self, input),
		fields(installation = input.installation, repository = input.repository)
	)]
	pub async fn create_configuration(
		&self,
		input: &ConfigurationInput,
	) -> Result<RepositoryConfiguration, DbError> {
		let now = chrono::Utc::now().to_rfc3339();
		let settings = serde_json::to_string(&input.settings)?;

		let sql = format!(
			r#"
			INSERT INTO repository_configurations
				(installation_id, repository_id, private, cron, settings, last_generation, created_at, updated_at)
			VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
			RETURNING {CONFIGURATION_COLUMNS}
			"#
		);

		let row = sqlx::query(&sql)
			.bind(input.installation)
			.bind(input.repository)
			.bind(input.private)
			.bind(&input.cron)
			.bind(&settings)
			.bind(&input.last_generation)
			.bind(&now)
			.fetch_one(&self.pool)
			.await
			.map_err(|e| {
				DbError::from_insert(
					e,
					format!(
						"configuration for installation {} and repository {} already exists",
						input.installation, input.repository
					),
				)
			})?;

		let created = row_to_configuration(&row)?;

		tracing::info!(
			id = created.id,
			installation = created.installation,
			repository = created.repository,
			"repository_configuration: created"
		);

		Ok(created)
	}

	/// Overwrite every stored field of configuration `id` with `input`.
	#[tracing::instrument(skip(self, input))]
	pub async fn update_configuration(
		&self,
		id: i64,
		input: &ConfigurationInput,
	) -> Result<RepositoryConfiguration, DbError> {
		let now = chrono::Utc::now().to_rfc3339();
		let settings = serde_json::to_string(&input.settings)?;

		let sql = format!(
			r#"
			UPDATE repository_configurations
			SET installation_id = ?1, repository_id = ?2, private = ?3, cron = ?4,
				settings = ?5, last_generation = ?6, updated_at = ?7
			WHERE id = ?8
			RETURNING {CONFIGURATION_COLUMNS}
			"#
		);

		let row = sqlx::query(&sql)
			.bind(input.installation)
			.bind(input.repository)
			.bind(input.private)
			.bind(&input.cron)
			.bind(&settings)
			.bind(&input.last_generation)
			.bind(&now)
			.bind(id)
			.fetch_optional(&self.pool)
			.await
			.map_err(|e| DbError::from_insert(e, format!("configuration {id} collides with an existing pair")))?
			.ok_or_else(|| DbError::NotFound(format!("configuration {id}")))?;

		let updated = row_to_configuration(&row)?;

		tracing::info!(id = updated.id, "repository_configuration: updated");

		Ok(updated)
	}

	#[tracing::instrument(skip(self))]
	pub async fn delete_configuration(&self, id: i64) -> Result<bool, DbError> {
		let result = sqlx::query("DELETE FROM repository_configurations WHERE id = ?")
			.bind(id)
			.execute(&self.pool)
			.await?;

		let deleted = result.rows_affected() > 0;

		if deleted {
			tracing::info!(id = id, "repository_configuration: deleted");
		}

		Ok(deleted)
	}

	#[tracing::instrument(skip(self))]
	pub async fn get_configuration_for_pair(
		&self,
		installation: i64,
		repository: i64,
	) -> Result<Option<RepositoryConfiguration>, DbError> {
		let sql = format!(
			r#"
			SELECT {CONFIGURATION_COLUMNS}
			FROM repository_configurations
			WHERE installation_id = ?1 AND repository_id = ?2
			"#
		);

		let row = sqlx::query(&sql)
			.bind(installation)
			.bind(repository)
			.fetch_optional(&self.pool)
			.await?;

		row.map(|r| row_to_configuration(&r)).transpose()
	}

	/// Configuration `id`, only if it belongs to `installation`.
	#[tracing::instrument(skip(self))]
	pub async fn get_installation_configuration(
		&self,
		installation: i64,
		id: i64,
	) -> Result<Option<RepositoryConfiguration>, DbError> {
		let sql = format!(
			r#"
			SELECT {CONFIGURATION_COLUMNS}
			FROM repository_configurations
			WHERE installation_id = ?1 AND id = ?2
			"#
		);

		let row = sqlx::query(&sql)
			.bind(installation)
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		row.map(|r| row_to_configuration(&r)).transpose()
	}

	/// Configuration `id` with its installation and repository populated.
	/// Not scoped to any user.
	#[tracing::instrument(skip(self))]
	pub async fn get_configuration_details(
		&self,
		id: i64,
	) -> Result<Option<ConfigurationDetails>, DbError> {
		let sql = format!(
			r#"
			SELECT {CONFIGURATION_COLUMNS}
			FROM repository_configurations
			WHERE id = ?
			"#
		);

		let Some(row) = sqlx::query(&sql)
			.bind(id)
			.fetch_optional(&self.pool)
			.await?
		else {
			return Ok(None);
		};
		let configuration = row_to_configuration(&row)?;

		let installation_row = sqlx::query(
			r#"
			SELECT id, installation_id, username, created_at, updated_at
			FROM installations
			WHERE id = ?
			"#,
		)
		.bind(configuration.installation)
		.fetch_one(&self.pool)
		.await?;

		let repository_row = sqlx::query(
			r#"
			SELECT id, repository_id, full_name, name, private, created_at, updated_at
			FROM repositories
			WHERE id = ?
			"#,
		)
		.bind(configuration.repository)
		.fetch_one(&self.pool)
		.await?;

		Ok(Some(ConfigurationDetails::new(
			configuration,
			row_to_installation(&installation_row)?,
			row_to_repository(&repository_row)?,
		)))
	}
}

#[async_trait]
impl ConfigurationStore for ConfigurationRepository {
	async fn create_configuration(
		&self,
		input: &ConfigurationInput,
	) -> Result<RepositoryConfiguration, DbError> {
		self.create_configuration(input).await
	}

	async fn update_configuration(
		&self,
		id: i64,
		input: &ConfigurationInput,
	) -> Result<RepositoryConfiguration, DbError> {
		self.update_configuration(id, input).await
	}

	async fn delete_configuration(&self, id: i64) -> Result<bool, DbError> {
		self.delete_configuration(id).await
	}

	async fn get_configuration_for_pair(
		&self,
		installation: i64,
		repository: i64,
	) -> Result<Option<RepositoryConfiguration>, DbError> {
		self.get_configuration_for_pair(installation, repository)
			.await
	}

	async fn get_installation_configuration(
		&self,
		installation: i64,
		id: i64,
	) -> Result<Option<RepositoryConfiguration>, DbError> {
		self.get_installation_configuration(installation, id).await
	}

	async fn get_configuration_details(
		&self,
		id: i64,
	) -> Result<Option<ConfigurationDetails>, DbError> {
		self.get_configuration_details(id).await
	}
}

fn row_to_configuration(row: &sqlx::sqlite::SqliteRow) -> Result<RepositoryConfiguration, DbError> {
	let settings: String = row.get("settings");
	let settings: Map<String, Value> = serde_json::from_str(&settings)?;
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");

	Ok(RepositoryConfiguration {
		id: row.get("id"),
		installation: row.get("installation_id"),
		repository: row.get("repository_id"),
		private: row.get("private"),
		cron: row.get("cron"),
		last_generation: row.get("last_generation"),
		settings,
		created_at: parse_timestamp(&created_at)?,
		updated_at: parse_timestamp(&updated_at)?,
	})
}
