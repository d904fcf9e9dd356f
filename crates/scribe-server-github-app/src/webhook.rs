// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Webhook signature verification for installation events.

use http::HeaderMap;
use scribe_common_config::SecretString;
use scribe_common_webhook::{constant_time_eq, SignatureAlgorithm};
use tracing::{debug, warn};

use crate::error::GithubAppError;

/// Verifies `<algorithm>=<hex>` signature headers against a shared secret.
///
/// Verification always runs over the raw request bytes. Without a configured
/// secret every request is rejected.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
	secret: Option<SecretString>,
	algorithm: SignatureAlgorithm,
	skip_verification: bool,
}

impl SignatureVerifier {
	pub fn new(secret: Option<SecretString>, algorithm: SignatureAlgorithm) -> Self {
		Self {
			secret,
			algorithm,
			skip_verification: false,
		}
	}

	/// Request the verification bypass.
	///
	/// Only builds with the `insecure-skip-verification` feature honour it;
	/// other builds log a warning and keep verifying.
	pub fn with_skip_verification(mut self, skip: bool) -> Self {
		if !skip {
			return self;
		}

		if cfg!(feature = "insecure-skip-verification") {
			warn!("Webhook signature verification is DISABLED");
			self.skip_verification = true;
		} else {
			warn!("skip_verification requested but not compiled in; webhook signatures will be verified");
		}

		self
	}

	pub fn algorithm(&self) -> SignatureAlgorithm {
		self.algorithm
	}

	pub fn has_secret(&self) -> bool {
		self
			.secret
			.as_ref()
			.is_some_and(|s| !s.expose().is_empty())
	}

	pub fn skips_verification(&self) -> bool {
		cfg!(feature = "insecure-skip-verification") && self.skip_verification
	}

	/// Check the signature header in `headers` against `body`.
	///
	/// A missing header counts as an empty value and fails.
	pub fn verify(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), GithubAppError> {
		if self.skips_verification() {
			debug!("Webhook signature verification skipped");
			return Ok(());
		}

		let provided = headers
			.get(self.algorithm.header_name())
			.and_then(|v| v.to_str().ok())
			.unwrap_or("");

		let Some(secret) = self.secret.as_ref().filter(|s| !s.expose().is_empty()) else {
			warn!("Webhook received but no webhook secret is configured");
			return Err(GithubAppError::InvalidWebhookSignature);
		};

		let expected = self.algorithm.sign(secret.expose().as_bytes(), body);

		if constant_time_eq(expected.as_bytes(), provided.as_bytes()) {
			debug!("Webhook signature verified successfully");
			Ok(())
		} else {
			debug!(
				algorithm = %self.algorithm,
				expected_len = expected.len(),
				provided_len = provided.len(),
				body_len = body.len(),
				"Webhook signature mismatch"
			);
			Err(GithubAppError::InvalidWebhookSignature)
		}
	}
}
