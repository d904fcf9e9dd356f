// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use scribe_common_config::load_secret_env;
use scribe_common_webhook::SignatureAlgorithm;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	AuthConfigLayer, DatabaseConfigLayer, HttpConfigLayer, LoggingConfigLayer, WebhookConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file contributes nothing.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/scribe/server.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: SCRIBE_SERVER_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			http: Some(load_http_from_env()?),
			database: Some(load_database_from_env()?),
			logging: Some(load_logging_from_env()?),
			webhook: Some(load_webhook_from_env()?),
			auth: Some(load_auth_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_u16(name: &str) -> Result<Option<u16>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid u16 value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn load_http_from_env() -> Result<HttpConfigLayer, ConfigError> {
	Ok(HttpConfigLayer {
		host: env_var("SCRIBE_SERVER_HOST"),
		port: env_u16("SCRIBE_SERVER_PORT")?,
	})
}

fn load_database_from_env() -> Result<DatabaseConfigLayer, ConfigError> {
	Ok(DatabaseConfigLayer {
		url: env_var("SCRIBE_SERVER_DATABASE_URL"),
	})
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	Ok(LoggingConfigLayer {
		level: env_var("SCRIBE_SERVER_LOG_LEVEL"),
	})
}

fn load_webhook_from_env() -> Result<WebhookConfigLayer, ConfigError> {
	let algorithm = match env_var("SCRIBE_SERVER_WEBHOOK_ALGORITHM") {
		Some(v) => Some(v.parse::<SignatureAlgorithm>().map_err(|message| {
			ConfigError::InvalidValue {
				key: "SCRIBE_SERVER_WEBHOOK_ALGORITHM".to_string(),
				message,
			}
		})?),
		None => None,
	};

	Ok(WebhookConfigLayer {
		secret: load_secret_env("SCRIBE_SERVER_WEBHOOK_SECRET")
			.map_err(|e| ConfigError::Secret(e.to_string()))?,
		algorithm,
		skip_verification: env_bool("SCRIBE_SERVER_WEBHOOK_SKIP_VERIFICATION"),
	})
}

fn load_auth_from_env() -> Result<AuthConfigLayer, ConfigError> {
	Ok(AuthConfigLayer {
		internal_api_key: load_secret_env("SCRIBE_SERVER_INTERNAL_API_KEY")
			.map_err(|e| ConfigError::Secret(e.to_string()))?,
		environment: env_var("SCRIBE_SERVER_ENV"),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::NamedTempFile;

	#[test]
	fn test_precedence_ordering() {
		assert!(Precedence::Environment > Precedence::ConfigFile);
		assert!(Precedence::ConfigFile > Precedence::Defaults);
	}

	#[test]
	fn test_defaults_source_returns_empty_layer() {
		let layer = DefaultsSource.load().unwrap();
		assert!(layer.http.is_none());
		assert!(layer.webhook.is_none());
	}

	#[test]
	fn test_toml_source_missing_file_returns_empty() {
		let layer = TomlSource::new("/nonexistent/config.toml").load().unwrap();
		assert!(layer.http.is_none());
	}

	#[test]
	fn test_toml_source_reads_sections() {
		let mut file = NamedTempFile::new().unwrap();
		writeln!(
			file,
			"[database]\nurl = \"sqlite:/tmp/scribe-test.db\"\n\n[auth]\nenvironment = \"staging\""
		)
		.unwrap();

		let layer = TomlSource::new(file.path()).load().unwrap();
		assert_eq!(
			layer.database.unwrap().url.as_deref(),
			Some("sqlite:/tmp/scribe-test.db")
		);
		assert_eq!(layer.auth.unwrap().environment.as_deref(), Some("staging"));
	}

	#[test]
	fn test_toml_source_reports_parse_errors() {
		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "[http\nport = ").unwrap();

		let err = TomlSource::new(file.path()).load().unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
	}

	#[test]
	fn test_env_bool_accepts_one_and_true() {
		std::env::set_var("SCRIBE_TEST_BOOL_ONE", "1");
		std::env::set_var("SCRIBE_TEST_BOOL_TRUE", "TRUE");
		std::env::set_var("SCRIBE_TEST_BOOL_NO", "no");
		assert_eq!(env_bool("SCRIBE_TEST_BOOL_ONE"), Some(true));
		assert_eq!(env_bool("SCRIBE_TEST_BOOL_TRUE"), Some(true));
		assert_eq!(env_bool("SCRIBE_TEST_BOOL_NO"), Some(false));
		assert_eq!(env_bool("SCRIBE_TEST_BOOL_UNSET"), None);
	}

	#[test]
	fn test_env_u16_rejects_garbage() {
		std::env::set_var("SCRIBE_TEST_PORT_GARBAGE", "eighty");
		let err = env_u16("SCRIBE_TEST_PORT_GARBAGE").unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { .. }));
	}
}
