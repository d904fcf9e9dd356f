// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for Scribe server.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`SCRIBE_SERVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use scribe_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("Server listening on {}", config.socket_addr());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info, warn};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	pub logging: LoggingConfig,
	pub webhook: WebhookConfig,
	pub auth: AuthConfig,
}

impl ServerConfig {
	/// Get the socket address string for binding.
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`SCRIBE_SERVER_*`)
/// 2. Config file (`/etc/scribe/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let http = layer.http.unwrap_or_default().finalize();
	let database = layer.database.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();
	let webhook = layer.webhook.unwrap_or_default().finalize();
	let auth = layer.auth.unwrap_or_default().finalize();

	validate_config(&webhook, &auth)?;

	if webhook.secret.is_none() && !webhook.skip_verification {
		warn!("No webhook secret configured; all installation webhooks will be rejected");
	}

	info!(
		host = %http.host,
		port = http.port,
		database = %database.url,
		environment = %auth.environment,
		webhook_algorithm = %webhook.algorithm,
		webhook_secret_configured = webhook.secret.is_some(),
		internal_api_configured = auth.internal_api_key.is_some(),
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		http,
		database,
		logging,
		webhook,
		auth,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(webhook: &WebhookConfig, auth: &AuthConfig) -> Result<(), ConfigError> {
	if webhook.skip_verification && auth.is_production() {
		return Err(ConfigError::Validation(
			"SCRIBE_SERVER_WEBHOOK_SKIP_VERIFICATION=1 is set while SCRIBE_SERVER_ENV=production. \
			 This is a security risk. Remove SCRIBE_SERVER_WEBHOOK_SKIP_VERIFICATION or set \
			 SCRIBE_SERVER_ENV to a non-production value."
				.to_string(),
		));
	}

	Ok(())
}
