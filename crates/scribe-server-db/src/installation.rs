// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Installation records and their repository membership.
//!
//! Membership lives in `installation_repositories`; an installation never owns
//! a repository row. Deleting an installation removes its membership rows and
//! configurations through `ON DELETE CASCADE`, leaving repositories in place.

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::DbError;
use crate::repository::row_to_repository;
use crate::types::{
	parse_timestamp, Installation, InstallationWithRepositories, NewInstallation, Repository,
};

#[async_trait]
pub trait InstallationStore: Send + Sync {
	async fn get_installation_by_installation_id(
		&self,
		installation_id: &str,
	) -> Result<Option<InstallationWithRepositories>, DbError>;
	async fn create_installation(
		&self,
		installation: &NewInstallation,
		repository_ids: &[i64],
	) -> Result<InstallationWithRepositories, DbError>;
	async fn add_installation_repositories(
		&self,
		id: i64,
		repository_ids: &[i64],
	) -> Result<u64, DbError>;
	async fn remove_installation_repositories(
		&self,
		id: i64,
		repository_ids: &[i64],
	) -> Result<u64, DbError>;
	async fn update_installation_username(&self, id: i64, username: &str)
		-> Result<bool, DbError>;
	async fn delete_installation(&self, id: i64) -> Result<bool, DbError>;
	async fn list_installations_for_user(
		&self,
		username: &str,
	) -> Result<Vec<InstallationWithRepositories>, DbError>;
	async fn find_installation_for_user(&self, username: &str)
		-> Result<Option<Installation>, DbError>;
	async fn get_installation_repository(
		&self,
		id: i64,
		repository_id: i64,
	) -> Result<Option<Repository>, DbError>;
}

#[derive(Clone)]
pub struct InstallationRepository {
	pool: SqlitePool,
}

impl InstallationRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self), fields(installation_id = %installation_id))]
	pub async fn get_installation_by_installation_id(
		&self,
		installation_id: &str,
	) -> Result<Option<InstallationWithRepositories>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, installation_id, username, created_at, updated_at
			FROM installations
			WHERE installation_id = ?
			"#,
		)
		.bind(installation_id)
		.fetch_optional(&self.pool)
		.await?;

		match row {
			Some(row) => {
				let installation = row_to_installation(&row)?;
				Ok(Some(self.with_repositories(installation).await?))
			}
			None => Ok(None),
		}
	}

	/// Insert an installation together with its initial repository set in one
	/// transaction. A duplicate `installation_id` yields [`DbError::Conflict`].
	#[tracing::instrument(
		skip(self, installation, repository_ids),
		fields(installation_id = %installation.installation_id, repo_count = repository_ids.len())
	)]
	pub async fn create_installation(
		&self,
		installation: &NewInstallation,
		repository_ids: &[i64],
	) -> Result<InstallationWithRepositories, DbError> {
		let now = chrono::Utc::now().to_rfc3339();
		let mut tx = self.pool.begin().await?;

		let row = sqlx::query(
			r#"
			INSERT INTO installations (installation_id, username, created_at, updated_at)
			VALUES (?1, ?2, ?3, ?3)
			RETURNING id, installation_id, username, created_at, updated_at
			"#,
		)
		.bind(&installation.installation_id)
		.bind(&installation.username)
		.bind(&now)
		.fetch_one(&mut *tx)
		.await
		.map_err(|e| {
			DbError::from_insert(
				e,
				format!("installation {} already exists", installation.installation_id),
			)
		})?;
		let created = row_to_installation(&row)?;

		for repository_id in repository_ids {
			sqlx::query(
				r#"
				INSERT OR IGNORE INTO installation_repositories (installation_id, repository_id)
				VALUES (?1, ?2)
				"#,
			)
			.bind(created.id)
			.bind(repository_id)
			.execute(&mut *tx)
			.await?;
		}

		tx.commit().await?;

		tracing::info!(
			id = created.id,
			installation_id = %created.installation_id,
			username = %created.username,
			repo_count = repository_ids.len(),
			"installation: created"
		);

		self.with_repositories(created).await
	}

	/// Attach `repository_ids` to installation `id`. Already attached ids are
	/// left alone, so concurrent calls compose as a set union. Returns how many
	/// rows were newly attached; a missing installation is [`DbError::NotFound`].
	#[tracing::instrument(skip(self, repository_ids), fields(repo_count = repository_ids.len()))]
	pub async fn add_installation_repositories(
		&self,
		id: i64,
		repository_ids: &[i64],
	) -> Result<u64, DbError> {
		let now = chrono::Utc::now().to_rfc3339();
		let mut tx = self.pool.begin().await?;

		let updated = sqlx::query("UPDATE installations SET updated_at = ?1 WHERE id = ?2")
			.bind(&now)
			.bind(id)
			.execute(&mut *tx)
			.await?;
		if updated.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("installation {id}")));
		}

		let mut attached = 0;
		for repository_id in repository_ids {
			let result = sqlx::query(
				r#"
				INSERT OR IGNORE INTO installation_repositories (installation_id, repository_id)
				VALUES (?1, ?2)
				"#,
			)
			.bind(id)
			.bind(repository_id)
			.execute(&mut *tx)
			.await?;
			attached += result.rows_affected();
		}

		tx.commit().await?;

		if attached > 0 {
			tracing::info!(id = id, attached = attached, "installation_repositories: added");
		}

		Ok(attached)
	}

	/// Detach `repository_ids` from installation `id`. Ids that are not
	/// attached, or an installation that no longer exists, are no-ops.
	/// Returns how many rows were detached.
	#[tracing::instrument(skip(self, repository_ids), fields(repo_count = repository_ids.len()))]
	pub async fn remove_installation_repositories(
		&self,
		id: i64,
		repository_ids: &[i64],
	) -> Result<u64, DbError> {
		let now = chrono::Utc::now().to_rfc3339();
		let mut tx = self.pool.begin().await?;

		let mut detached = 0;
		for repository_id in repository_ids {
			let result = sqlx::query(
				"DELETE FROM installation_repositories WHERE installation_id = ?1 AND repository_id = ?2",
			)
			.bind(id)
			.bind(repository_id)
			.execute(&mut *tx)
			.await?;
			detached += result.rows_affected();
		}

		if detached > 0 {
			sqlx::query("UPDATE installations SET updated_at = ?1 WHERE id = ?2")
				.bind(&now)
				.bind(id)
				.execute(&mut *tx)
				.await?;
		}

		tx.commit().await?;

		if detached > 0 {
			tracing::info!(id = id, detached = detached, "installation_repositories: removed");
		}

		Ok(detached)
	}

	#[tracing::instrument(skip(self), fields(username = %username))]
	pub async fn update_installation_username(
		&self,
		id: i64,
		username: &str,
	) -> Result<bool, DbError> {
		let now = chrono::Utc::now().to_rfc3339();

		let result = sqlx::query("UPDATE installations SET username = ?1, updated_at = ?2 WHERE id = ?3")
			.bind(username)
			.bind(&now)
			.bind(id)
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected() > 0)
	}

	/// Delete an installation. Repository rows are untouched.
	#[tracing::instrument(skip(self))]
	pub async fn delete_installation(&self, id: i64) -> Result<bool, DbError> {
		let result = sqlx::query("DELETE FROM installations WHERE id = ?")
			.bind(id)
			.execute(&self.pool)
			.await?;

		let deleted = result.rows_affected() > 0;

		if deleted {
			tracing::info!(id = id, "installation: deleted");
		}

		Ok(deleted)
	}

	#[tracing::instrument(skip(self), fields(username = %username))]
	pub async fn list_installations_for_user(
		&self,
		username: &str,
	) -> Result<Vec<InstallationWithRepositories>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, installation_id, username, created_at, updated_at
			FROM installations
			WHERE username = ?
			ORDER BY id
			"#,
		)
		.bind(username)
		.fetch_all(&self.pool)
		.await?;

		let mut installations = Vec::with_capacity(rows.len());
		for row in &rows {
			let installation = row_to_installation(row)?;
			installations.push(self.with_repositories(installation).await?);
		}

		Ok(installations)
	}

	/// The installation a user acts through: their oldest one.
	#[tracing::instrument(skip(self), fields(username = %username))]
	pub async fn find_installation_for_user(
		&self,
		username: &str,
	) -> Result<Option<Installation>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, installation_id, username, created_at, updated_at
			FROM installations
			WHERE username = ?
			ORDER BY id
			LIMIT 1
			"#,
		)
		.bind(username)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_installation(&r)).transpose()
	}

	/// The repository `repository_id`, only if installation `id` currently lists it.
	#[tracing::instrument(skip(self))]
	pub async fn get_installation_repository(
		&self,
		id: i64,
		repository_id: i64,
	) -> Result<Option<Repository>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT r.id, r.repository_id, r.full_name, r.name, r.private, r.created_at, r.updated_at
			FROM installation_repositories ir
			JOIN repositories r ON r.id = ir.repository_id
			WHERE ir.installation_id = ?1 AND ir.repository_id = ?2
			"#,
		)
		.bind(id)
		.bind(repository_id)
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_repository(&r)).transpose()
	}

	async fn with_repositories(
		&self,
		installation: Installation,
	) -> Result<InstallationWithRepositories, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT r.id, r.repository_id, r.full_name, r.name, r.private, r.created_at, r.updated_at
			FROM installation_repositories ir
			JOIN repositories r ON r.id = ir.repository_id
			WHERE ir.installation_id = ?
			ORDER BY r.id
			"#,
		)
		.bind(installation.id)
		.fetch_all(&self.pool)
		.await?;

		let repositories = rows
			.iter()
			.map(row_to_repository)
			.collect::<Result<Vec<_>, _>>()?;

		Ok(InstallationWithRepositories {
			installation,
			repositories,
		})
	}
}

#[async_trait]
impl InstallationStore for InstallationRepository {
	async fn get_installation_by_installation_id(
		&self,
		installation_id: &str,
	) -> Result<Option<InstallationWithRepositories>, DbError> {
		self.get_installation_by_installation_id(installation_id)
			.await
	}

	async fn create_installation(
		&self,
		installation: &NewInstallation,
		repository_ids: &[i64],
	) -> Result<InstallationWithRepositories, DbError> {
		self.create_installation(installation, repository_ids).await
	}

	async fn add_installation_repositories(
		&self,
		id: i64,
		repository_ids: &[i64],
	) -> Result<u64, DbError> {
		self.add_installation_repositories(id, repository_ids).await
	}

	async fn remove_installation_repositories(
		&self,
		id: i64,
		repository_ids: &[i64],
	) -> Result<u64, DbError> {
		self.remove_installation_repositories(id, repository_ids)
			.await
	}

	async fn update_installation_username(
		&self,
		id: i64,
		username: &str,
	) -> Result<bool, DbError> {
		self.update_installation_username(id, username).await
	}

	async fn delete_installation(&self, id: i64) -> Result<bool, DbError> {
		self.delete_installation(id).await
	}

	async fn list_installations_for_user(
		&self,
		username: &str,
	) -> Result<Vec<InstallationWithRepositories>, DbError> {
		self.list_installations_for_user(username).await
	}

	async fn find_installation_for_user(
		&self,
		username: &str,
	) -> Result<Option<Installation>, DbError> {
		self.find_installation_for_user(username).await
	}

	async fn get_installation_repository(
		&self,
		id: i64,
		repository_id: i64,
	) -> Result<Option<Repository>, DbError> {
		self.get_installation_repository(id, repository_id).await
	}
}

pub(crate) fn row_to_installation(row: &sqlx::sqlite::SqliteRow) -> Result<Installation, DbError> {
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");

	Ok(Installation {
		id: row.get("id"),
		installation_id: row.get("installation_id"),
		username: row.get("username"),
		created_at: parse_timestamp(&created_at)?,
		updated_at: parse_timestamp(&updated_at)?,
	})
}
