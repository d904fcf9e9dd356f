// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! GitHub App installation webhooks for Scribe.
//!
//! Inbound installation events are verified against the shared secret,
//! parsed into [`InstallationEvent`] and reconciled into the installation
//! and repository tables. Every handler is idempotent under redelivery.

pub mod error;
pub mod events;
pub mod reconcile;
pub mod webhook;

pub use error::GithubAppError;
pub use events::{InstallationEvent, WebhookAccount, WebhookInstallation, WebhookRepository};
pub use reconcile::{InstallationReconciler, WebhookResponse};
pub use scribe_common_webhook::SignatureAlgorithm;
pub use webhook::SignatureVerifier;
