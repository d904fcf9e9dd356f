// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared HMAC webhook signature utilities.
//!
//! Installation events are signed as `<algorithm>=<hex(HMAC(secret, body))>`
//! and carried in a `x-hub-signature*` header. SHA-1 is the default scheme;
//! SHA-256 is available for senders that emit `x-hub-signature-256`.

use std::fmt;
use std::str::FromStr;

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

/// Compute an HMAC-SHA1 signature for a payload, hex-encoded without prefix.
pub fn compute_hmac_sha1(secret: &[u8], payload: &[u8]) -> String {
	let mut mac = HmacSha1::new_from_slice(secret).expect("HMAC can take key of any size");
	mac.update(payload);
	hex::encode(mac.finalize().into_bytes())
}

/// Compute an HMAC-SHA256 signature for a payload, hex-encoded without prefix.
pub fn compute_hmac_sha256(secret: &[u8], payload: &[u8]) -> String {
	let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
	mac.update(payload);
	hex::encode(mac.finalize().into_bytes())
}

/// Compare two byte strings in constant time.
///
/// Unequal lengths return `false` immediately; only the length is revealed.
pub fn constant_time_eq(expected: &[u8], provided: &[u8]) -> bool {
	if expected.len() != provided.len() {
		return false;
	}
	expected.ct_eq(provided).into()
}

/// Signature scheme used for a webhook header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureAlgorithm {
	#[default]
	Sha1,
	Sha256,
}

impl SignatureAlgorithm {
	/// Header carrying the signature for this scheme (lowercase).
	pub fn header_name(self) -> &'static str {
		match self {
			SignatureAlgorithm::Sha1 => "x-hub-signature",
			SignatureAlgorithm::Sha256 => "x-hub-signature-256",
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			SignatureAlgorithm::Sha1 => "sha1",
			SignatureAlgorithm::Sha256 => "sha256",
		}
	}

	/// Full header value, `<algorithm>=<hexdigest>`, for `payload`.
	pub fn sign(self, secret: &[u8], payload: &[u8]) -> String {
		let digest = match self {
			SignatureAlgorithm::Sha1 => compute_hmac_sha1(secret, payload),
			SignatureAlgorithm::Sha256 => compute_hmac_sha256(secret, payload),
		};
		format!("{}={}", self.as_str(), digest)
	}
}

impl fmt::Display for SignatureAlgorithm {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for SignatureAlgorithm {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"sha1" => Ok(SignatureAlgorithm::Sha1),
			"sha256" => Ok(SignatureAlgorithm::Sha256),
			other => Err(format!("unsupported signature algorithm '{other}'")),
		}
	}
}
