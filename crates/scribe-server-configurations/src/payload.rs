// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use serde::Deserialize;
use serde_json::{Map, Value};

/// Keys the server owns. Dropped from caller input before it reaches `settings`.
const SERVER_OWNED_KEYS: &[&str] = &["id", "installation", "last_generation", "createdAt", "updatedAt"];

/// Caller-supplied configuration fields, the `data` of a create or update body.
///
/// `repository` is the internal repository id and is only read on create.
/// Unknown keys are kept as opaque settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConfigurationPayload {
	#[serde(default)]
	pub repository: Option<i64>,
	#[serde(default)]
	pub private: Option<bool>,
	#[serde(default)]
	pub cron: Option<String>,
	#[serde(flatten)]
	pub settings: Map<String, Value>,
}

impl ConfigurationPayload {
	/// `settings` without any server-owned keys.
	pub fn caller_settings(&self) -> Map<String, Value> {
		self.settings
			.iter()
			.filter(|(k, _)| !SERVER_OWNED_KEYS.contains(&k.as_str()))
			.map(|(k, v)| (k.clone(), v.clone()))
			.collect()
	}
}
