// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Typed installation event payloads.
//!
//! Only `action` decides the variant. Unknown or missing actions parse to
//! [`InstallationEvent::Ignored`] so the sender still gets a success reply.

use serde::Deserialize;
use serde_json::Value;

use crate::error::GithubAppError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebhookAccount {
	pub login: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebhookInstallation {
	pub id: i64,
	pub account: WebhookAccount,
}

impl WebhookInstallation {
	/// The external installation id in its stored (string) form.
	pub fn installation_id(&self) -> String {
		self.id.to_string()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebhookRepository {
	pub id: i64,
	pub full_name: String,
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub private: bool,
}

impl WebhookRepository {
	/// `name`, falling back to the part of `full_name` after the owner.
	pub fn short_name(&self) -> &str {
		if !self.name.is_empty() {
			return &self.name;
		}
		self.full_name
			.split_once('/')
			.map_or(self.full_name.as_str(), |(_, name)| name)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallationEvent {
	Created {
		installation: WebhookInstallation,
		repositories: Vec<WebhookRepository>,
	},
	Deleted {
		installation: WebhookInstallation,
	},
	Added {
		installation: WebhookInstallation,
		repositories: Vec<WebhookRepository>,
	},
	Removed {
		installation: WebhookInstallation,
		repositories: Vec<WebhookRepository>,
	},
	Ignored {
		action: Option<String>,
	},
}

#[derive(Deserialize)]
struct RawEvent {
	installation: WebhookInstallation,
	#[serde(default)]
	repositories: Vec<WebhookRepository>,
	#[serde(default)]
	repositories_added: Vec<WebhookRepository>,
	#[serde(default)]
	repositories_removed: Vec<WebhookRepository>,
}

impl InstallationEvent {
	/// Parse the raw request body.
	///
	/// Known actions require an `installation` object; repository lists
	/// default to empty.
	pub fn parse(body: &[u8]) -> Result<Self, GithubAppError> {
		let value: Value = serde_json::from_slice(body)
			.map_err(|e| GithubAppError::InvalidPayload(e.to_string()))?;

		let action = value
			.get("action")
			.and_then(Value::as_str)
			.map(str::to_string);

		let known = matches!(
			action.as_deref(),
			Some("created" | "deleted" | "added" | "removed")
		);
		if !known {
			return Ok(InstallationEvent::Ignored { action });
		}

		let raw: RawEvent = serde_json::from_value(value)
			.map_err(|e| GithubAppError::InvalidPayload(e.to_string()))?;

		Ok(match action.as_deref() {
			Some("created") => InstallationEvent::Created {
				installation: raw.installation,
				repositories: raw.repositories,
			},
			Some("deleted") => InstallationEvent::Deleted {
				installation: raw.installation,
			},
			Some("added") => InstallationEvent::Added {
				installation: raw.installation,
				repositories: raw.repositories_added,
			},
			Some("removed") => InstallationEvent::Removed {
				installation: raw.installation,
				repositories: raw.repositories_removed,
			},
			_ => InstallationEvent::Ignored { action },
		})
	}

	pub fn action(&self) -> &str {
		match self {
			InstallationEvent::Created { .. } => "created",
			InstallationEvent::Deleted { .. } => "deleted",
			InstallationEvent::Added { .. } => "added",
			InstallationEvent::Removed { .. } => "removed",
			InstallationEvent::Ignored { action } => action.as_deref().unwrap_or(""),
		}
	}

	pub fn installation(&self) -> Option<&WebhookInstallation> {
		match self {
			InstallationEvent::Created { installation, .. }
			| InstallationEvent::Deleted { installation }
			| InstallationEvent::Added { installation, .. }
			| InstallationEvent::Removed { installation, .. } => Some(installation),
			InstallationEvent::Ignored { .. } => None,
		}
	}
}
