// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Caller authentication configuration.

use scribe_common_config::SecretString;
use serde::Deserialize;

/// Auth configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct AuthConfig {
	/// Bearer key for the internal lookup routes. Unset disables them.
	pub internal_api_key: Option<SecretString>,
	/// Deployment environment name, e.g. `development` or `production`.
	pub environment: String,
}

impl Default for AuthConfig {
	fn default() -> Self {
		AuthConfigLayer::default().finalize()
	}
}

impl AuthConfig {
	pub fn is_production(&self) -> bool {
		self.environment.eq_ignore_ascii_case("production")
	}
}

/// Auth configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfigLayer {
	#[serde(default)]
	pub internal_api_key: Option<SecretString>,
	#[serde(default)]
	pub environment: Option<String>,
}

impl AuthConfigLayer {
	pub fn merge(&mut self, other: AuthConfigLayer) {
		if other.internal_api_key.is_some() {
			self.internal_api_key = other.internal_api_key;
		}
		if other.environment.is_some() {
			self.environment = other.environment;
		}
	}

	pub fn finalize(self) -> AuthConfig {
		AuthConfig {
			internal_api_key: self.internal_api_key.filter(|k| !k.expose().is_empty()),
			environment: self
				.environment
				.unwrap_or_else(|| "development".to_string()),
		}
	}
}
