// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use scribe_server_db::DbError;
use thiserror::Error;

/// Guard rejections. Display strings are returned to callers verbatim.
#[derive(Debug, Error)]
pub enum ConfigurationError {
	#[error("Installation not found")]
	InstallationNotFound,

	#[error("Repository not found as part of this installation")]
	RepositoryNotInstalled,

	#[error("Repository configuration not found as part of this installation")]
	ConfigurationNotFound,

	#[error("Repository configuration already exists")]
	AlreadyExists,

	#[error("Repository is required")]
	MissingRepository,

	#[error("Invalid schedule: {0}")]
	InvalidSchedule(String),

	#[error("Persistence error: {0}")]
	Persistence(#[from] DbError),
}

impl ConfigurationError {
	pub fn is_not_found(&self) -> bool {
		matches!(
			self,
			ConfigurationError::InstallationNotFound
				| ConfigurationError::RepositoryNotInstalled
				| ConfigurationError::ConfigurationNotFound
		)
	}
}
