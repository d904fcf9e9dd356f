// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Installation webhook configuration.

use scribe_common_config::SecretString;
use scribe_common_webhook::SignatureAlgorithm;
use serde::Deserialize;

/// Webhook configuration (runtime, fully resolved).
#[derive(Debug, Clone, Default)]
pub struct WebhookConfig {
	/// Shared HMAC secret. Without it every webhook is rejected.
	pub secret: Option<SecretString>,
	pub algorithm: SignatureAlgorithm,
	pub skip_verification: bool,
}

/// Webhook configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookConfigLayer {
	#[serde(default)]
	pub secret: Option<SecretString>,
	#[serde(default)]
	pub algorithm: Option<SignatureAlgorithm>,
	#[serde(default)]
	pub skip_verification: Option<bool>,
}

impl WebhookConfigLayer {
	pub fn merge(&mut self, other: WebhookConfigLayer) {
		if other.secret.is_some() {
			self.secret = other.secret;
		}
		if other.algorithm.is_some() {
			self.algorithm = other.algorithm;
		}
		if other.skip_verification.is_some() {
			self.skip_verification = other.skip_verification;
		}
	}

	pub fn finalize(self) -> WebhookConfig {
		WebhookConfig {
			secret: self.secret.filter(|s| !s.expose().is_empty()),
			algorithm: self.algorithm.unwrap_or_default(),
			skip_verification: self.skip_verification.unwrap_or(false),
		}
	}
}
