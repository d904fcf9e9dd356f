// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Persisted records for installations, repositories and their configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DbError;

/// A source-control repository known to Scribe, unique by `full_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
	pub id: i64,
	/// External identifier assigned by the hosting platform.
	pub repository_id: String,
	pub full_name: String,
	pub name: String,
	pub private: bool,
	#[serde(rename = "createdAt")]
	pub created_at: DateTime<Utc>,
	#[serde(rename = "updatedAt")]
	pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRepository {
	pub repository_id: String,
	pub full_name: String,
	pub name: String,
	pub private: bool,
}

/// One App installation, owned by the account `username`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installation {
	pub id: i64,
	/// External installation identifier, unique.
	pub installation_id: String,
	pub username: String,
	#[serde(rename = "createdAt")]
	pub created_at: DateTime<Utc>,
	#[serde(rename = "updatedAt")]
	pub updated_at: DateTime<Utc>,
}

/// An installation with its repository set populated, ordered by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationWithRepositories {
	#[serde(flatten)]
	pub installation: Installation,
	pub repositories: Vec<Repository>,
}

impl InstallationWithRepositories {
	pub fn repository_ids(&self) -> Vec<i64> {
		self.repositories.iter().map(|r| r.id).collect()
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInstallation {
	pub installation_id: String,
	pub username: String,
}

/// Per-repository settings scoped to one (installation, repository) pair.
///
/// `installation` and `repository` are internal ids. Keys other than the
/// typed fields are kept verbatim in `settings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryConfiguration {
	pub id: i64,
	pub installation: i64,
	pub repository: i64,
	pub private: bool,
	pub cron: Option<String>,
	pub last_generation: Option<String>,
	#[serde(flatten)]
	pub settings: Map<String, Value>,
	#[serde(rename = "createdAt")]
	pub created_at: DateTime<Utc>,
	#[serde(rename = "updatedAt")]
	pub updated_at: DateTime<Utc>,
}

/// Field values written by configuration create and update.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigurationInput {
	pub installation: i64,
	pub repository: i64,
	pub private: bool,
	pub cron: Option<String>,
	pub last_generation: Option<String>,
	pub settings: Map<String, Value>,
}

/// A configuration with its installation and repository populated, as
/// returned by the internal lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationDetails {
	pub id: i64,
	pub private: bool,
	pub cron: Option<String>,
	pub last_generation: Option<String>,
	#[serde(flatten)]
	pub settings: Map<String, Value>,
	#[serde(rename = "createdAt")]
	pub created_at: DateTime<Utc>,
	#[serde(rename = "updatedAt")]
	pub updated_at: DateTime<Utc>,
	pub installation: Installation,
	pub repository: Repository,
}

impl ConfigurationDetails {
	pub fn new(
		configuration: RepositoryConfiguration,
		installation: Installation,
		repository: Repository,
	) -> Self {
		Self {
			id: configuration.id,
			private: configuration.private,
			cron: configuration.cron,
			last_generation: configuration.last_generation,
			settings: configuration.settings,
			created_at: configuration.created_at,
			updated_at: configuration.updated_at,
			installation,
			repository,
		}
	}
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DbError> {
	DateTime::parse_from_rfc3339(value)
		.map(|d| d.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("invalid timestamp '{value}': {e}")))
}
