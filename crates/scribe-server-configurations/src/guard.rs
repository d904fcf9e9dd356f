// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Ownership checks in front of configuration create, update and delete.

use std::sync::Arc;

use scribe_server_db::{
	ConfigurationInput, ConfigurationStore, DbError, Installation, InstallationStore,
	RepositoryConfiguration,
};
use tracing::{debug, info};

use crate::error::ConfigurationError;
use crate::payload::ConfigurationPayload;
use crate::schedule::Schedule;

pub struct ConfigurationGuard {
	installations: Arc<dyn InstallationStore>,
	configurations: Arc<dyn ConfigurationStore>,
}

impl ConfigurationGuard {
	pub fn new(
		installations: Arc<dyn InstallationStore>,
		configurations: Arc<dyn ConfigurationStore>,
	) -> Self {
		Self {
			installations,
			configurations,
		}
	}

	/// Create a configuration for a repository in the caller's installation.
	///
	/// The installation id comes from the caller's installation and
	/// `last_generation` starts empty, whatever the payload says.
	#[tracing::instrument(skip(self, payload), fields(username = %username, repository = ?payload.repository))]
	pub async fn create(
		&self,
		username: &str,
		payload: ConfigurationPayload,
	) -> Result<RepositoryConfiguration, ConfigurationError> {
		let installation = self.installation_for(username).await?;

		let repository_id = payload
			.repository
			.ok_or(ConfigurationError::MissingRepository)?;

		let repository = self
			.installations
			.get_installation_repository(installation.id, repository_id)
			.await?
			.ok_or_else(|| {
				debug!(
					installation = installation.id,
					repository = repository_id,
					"repository_configuration: repository not in caller's installation"
				);
				ConfigurationError::RepositoryNotInstalled
			})?;

		if self
			.configurations
			.get_configuration_for_pair(installation.id, repository.id)
			.await?
			.is_some()
		{
			return Err(ConfigurationError::AlreadyExists);
		}

		validate_schedule(payload.cron.as_deref())?;

		let input = ConfigurationInput {
			installation: installation.id,
			repository: repository.id,
			private: payload.private.unwrap_or(false),
			cron: payload.cron.clone(),
			last_generation: None,
			settings: payload.caller_settings(),
		};

		let created = self
			.configurations
			.create_configuration(&input)
			.await
			.map_err(|e| match e {
				DbError::Conflict(_) => ConfigurationError::AlreadyExists,
				other => ConfigurationError::Persistence(other),
			})?;

		info!(
			configuration_id = created.id,
			username = %username,
			full_name = %repository.full_name,
			"repository_configuration: created"
		);

		Ok(created)
	}

	/// Update a configuration reachable through the caller's installation.
	///
	/// Linkage and `last_generation` are carried over from the stored record.
	/// Omitted typed fields keep their stored values; settings keys in the
	/// payload replace stored keys of the same name.
	#[tracing::instrument(skip(self, payload), fields(username = %username, configuration_id = id))]
	pub async fn update(
		&self,
		username: &str,
		id: i64,
		payload: ConfigurationPayload,
	) -> Result<RepositoryConfiguration, ConfigurationError> {
		let existing = self.owned_configuration(username, id).await?;

		if payload.cron.is_some() {
			validate_schedule(payload.cron.as_deref())?;
		}

		let mut settings = existing.settings.clone();
		settings.extend(payload.caller_settings());

		let input = ConfigurationInput {
			installation: existing.installation,
			repository: existing.repository,
			private: payload.private.unwrap_or(existing.private),
			cron: payload.cron.or(existing.cron),
			last_generation: existing.last_generation,
			settings,
		};

		let updated = self
			.configurations
			.update_configuration(existing.id, &input)
			.await
			.map_err(|e| match e {
				DbError::NotFound(_) => ConfigurationError::ConfigurationNotFound,
				other => ConfigurationError::Persistence(other),
			})?;

		info!(configuration_id = updated.id, username = %username, "repository_configuration: updated");

		Ok(updated)
	}

	/// Delete a configuration reachable through the caller's installation.
	///
	/// The row removed is the one resolved through the installation, never
	/// the raw id alone. Returns the deleted record.
	#[tracing::instrument(skip(self), fields(username = %username, configuration_id = id))]
	pub async fn delete(
		&self,
		username: &str,
		id: i64,
	) -> Result<RepositoryConfiguration, ConfigurationError> {
		let existing = self.owned_configuration(username, id).await?;

		if !self.configurations.delete_configuration(existing.id).await? {
			return Err(ConfigurationError::ConfigurationNotFound);
		}

		info!(configuration_id = existing.id, username = %username, "repository_configuration: deleted");

		Ok(existing)
	}

	async fn installation_for(&self, username: &str) -> Result<Installation, ConfigurationError> {
		self.installations
			.find_installation_for_user(username)
			.await?
			.ok_or_else(|| {
				debug!(username = %username, "repository_configuration: caller has no installation");
				ConfigurationError::InstallationNotFound
			})
	}

	/// The configuration `id`, if it belongs to the caller's installation and
	/// that installation still lists its repository.
	async fn owned_configuration(
		&self,
		username: &str,
		id: i64,
	) -> Result<RepositoryConfiguration, ConfigurationError> {
		let installation = self.installation_for(username).await?;

		let configuration = self
			.configurations
			.get_installation_configuration(installation.id, id)
			.await?
			.ok_or(ConfigurationError::ConfigurationNotFound)?;

		self.installations
			.get_installation_repository(installation.id, configuration.repository)
			.await?
			.ok_or(ConfigurationError::ConfigurationNotFound)?;

		Ok(configuration)
	}
}

fn validate_schedule(cron: Option<&str>) -> Result<(), ConfigurationError> {
	if let Some(cron) = cron {
		cron.parse::<Schedule>()
			.map_err(ConfigurationError::InvalidSchedule)?;
	}
	Ok(())
}
