// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Repository records, deduplicated by `full_name`.

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::DbError;
use crate::types::{parse_timestamp, NewRepository, Repository};

#[async_trait]
pub trait RepositoryStore: Send + Sync {
	async fn list_repositories_by_full_names(
		&self,
		full_names: &[String],
	) -> Result<Vec<Repository>, DbError>;
	async fn create_repository(&self, repo: &NewRepository) -> Result<Repository, DbError>;
	async fn get_repository_by_full_name(&self, full_name: &str)
		-> Result<Option<Repository>, DbError>;
}

#[derive(Clone)]
pub struct RepositoryRepository {
	pool: SqlitePool,
}

impl RepositoryRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Return the stored repositories among `full_names`. Names with no row
	/// are simply absent from the result.
	#[tracing::instrument(skip(self, full_names), fields(count = full_names.len()))]
	pub async fn list_repositories_by_full_names(
		&self,
		full_names: &[String],
	) -> Result<Vec<Repository>, DbError> {
		if full_names.is_empty() {
			return Ok(Vec::new());
		}

		let placeholders = vec!["?"; full_names.len()].join(", ");
		let sql = format!(
			r#"
			SELECT id, repository_id, full_name, name, private, created_at, updated_at
			FROM repositories
			WHERE full_name IN ({placeholders})
			ORDER BY id
			"#
		);

		let mut query = sqlx::query(&sql);
		for full_name in full_names {
			query = query.bind(full_name);
		}

		let rows = query.fetch_all(&self.pool).await?;
		rows.iter().map(row_to_repository).collect()
	}

	/// Insert a repository. A duplicate `full_name` yields [`DbError::Conflict`].
	#[tracing::instrument(skip(self, repo), fields(full_name = %repo.full_name))]
	pub async fn create_repository(&self, repo: &NewRepository) -> Result<Repository, DbError> {
		let now = chrono::Utc::now().to_rfc3339();

		let row = sqlx::query(
			r#"
			INSERT INTO repositories (repository_id, full_name, name, private, created_at, updated_at)
			VALUES (?1, ?2, ?3, ?4, ?5, ?5)
			RETURNING id, repository_id, full_name, name, private, created_at, updated_at
			"#,
		)
		.bind(&repo.repository_id)
		.bind(&repo.full_name)
		.bind(&repo.name)
		.bind(repo.private)
		.bind(&now)
		.fetch_one(&self.pool)
		.await
		.map_err(|e| DbError::from_insert(e, format!("repository {} already exists", repo.full_name)))?;

		let created = row_to_repository(&row)?;

		tracing::info!(
			id = created.id,
			full_name = %created.full_name,
			"repository: created"
		);

		Ok(created)
	}

	#[tracing::instrument(skip(self), fields(full_name = %full_name))]
	pub async fn get_repository_by_full_name(
		&self,
		full_name: &str,
	) -> Result<Option<Repository>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, repository_id, full_name, name, private, created_at, updated_at
			FROM repositories
			WHERE full_name = ?
			"#,
		)
		.bind(full_name)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_repository(&r)).transpose()
	}
}

#[async_trait]
impl RepositoryStore for RepositoryRepository {
	async fn list_repositories_by_full_names(
		&self,
		full_names: &[String],
	) -> Result<Vec<Repository>, DbError> {
		self.list_repositories_by_full_names(full_names).await
	}

	async fn create_repository(&self, repo: &NewRepository) -> Result<Repository, DbError> {
		self.create_repository(repo).await
	}

	async fn get_repository_by_full_name(
		&self,
		full_name: &str,
	) -> Result<Option<Repository>, DbError> {
		self.get_repository_by_full_name(full_name).await
	}
}

pub(crate) fn row_to_repository(row: &sqlx::sqlite::SqliteRow) -> Result<Repository, DbError> {
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");

	Ok(Repository {
		id: row.get("id"),
		repository_id: row.get("repository_id"),
		full_name: row.get("full_name"),
		name: row.get("name"),
		private: row.get("private"),
		created_at: parse_timestamp(&created_at)?,
		updated_at: parse_timestamp(&updated_at)?,
	})
}
