// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use cairn_common_secret::env::load_secret_env;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	CipherConfigLayer, DatabaseConfigLayer, HttpConfigLayer, LedgerConfigLayer,
	LifecycleConfigLayer, LoggingConfigLayer,
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

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/cairn/server.toml")
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
/// Convention: CAIRN_SERVER_<SECTION>_<FIELD>
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
			cipher: Some(load_cipher_from_env()?),
			ledger: Some(load_ledger_from_env()?),
			lifecycle: Some(load_lifecycle_from_env()?),
			logging: Some(load_logging_from_env()?),
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

fn env_u32(name: &str) -> Result<Option<u32>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid u32 value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn env_u64(name: &str) -> Result<Option<u64>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid u64 value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn load_http_from_env() -> Result<HttpConfigLayer, ConfigError> {
	Ok(HttpConfigLayer {
		host: env_var("CAIRN_SERVER_HOST"),
		port: env_u16("CAIRN_SERVER_PORT")?,
	})
}

fn load_database_from_env() -> Result<DatabaseConfigLayer, ConfigError> {
	Ok(DatabaseConfigLayer {
		url: env_var("CAIRN_SERVER_DATABASE_URL"),
		busy_timeout_secs: env_u64("CAIRN_SERVER_DATABASE_BUSY_TIMEOUT_SECS")?,
		max_connections: env_u32("CAIRN_SERVER_DATABASE_MAX_CONNECTIONS")?,
	})
}

fn load_cipher_from_env() -> Result<CipherConfigLayer, ConfigError> {
	Ok(CipherConfigLayer {
		master_secret: load_secret_env("CAIRN_SERVER_MASTER_SECRET")
			.map_err(|e| ConfigError::Secret(e.to_string()))?,
	})
}

fn load_ledger_from_env() -> Result<LedgerConfigLayer, ConfigError> {
	Ok(LedgerConfigLayer {
		max_retries: env_u32("CAIRN_SERVER_LEDGER_MAX_RETRIES")?,
		backup_before_restore: env_bool("CAIRN_SERVER_LEDGER_BACKUP_BEFORE_RESTORE"),
		initial_version_on_create: env_bool("CAIRN_SERVER_LEDGER_INITIAL_VERSION_ON_CREATE"),
	})
}

fn load_lifecycle_from_env() -> Result<LifecycleConfigLayer, ConfigError> {
	Ok(LifecycleConfigLayer {
		purge_versions_on_hard_delete: env_bool(
			"CAIRN_SERVER_LIFECYCLE_PURGE_VERSIONS_ON_HARD_DELETE",
		),
	})
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	Ok(LoggingConfigLayer {
		level: env_var("CAIRN_SERVER_LOG_LEVEL"),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_precedence_ordering() {
		assert!(Precedence::Environment > Precedence::ConfigFile);
		assert!(Precedence::ConfigFile > Precedence::Defaults);
	}

	#[test]
	fn test_defaults_source_returns_empty_layer() {
		let layer = DefaultsSource.load().unwrap();
		assert!(layer.http.is_none());
		assert!(layer.cipher.is_none());
	}

	#[test]
	fn test_toml_source_missing_file_returns_empty() {
		let source = TomlSource::new("/nonexistent/config.toml");
		let layer = source.load().unwrap();
		assert!(layer.http.is_none());
	}

	#[test]
	fn test_toml_source_parses_sections() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			r#"
[http]
port = 9100

[database]
busy_timeout_secs = 12

[ledger]
max_retries = 7

[lifecycle]
purge_versions_on_hard_delete = true
"#
		)
		.unwrap();

		let layer = TomlSource::new(file.path()).load().unwrap();
		assert_eq!(layer.http.unwrap().port, Some(9100));
		assert_eq!(layer.database.unwrap().busy_timeout_secs, Some(12));
		assert_eq!(layer.ledger.unwrap().max_retries, Some(7));
		assert_eq!(
			layer.lifecycle.unwrap().purge_versions_on_hard_delete,
			Some(true)
		);
	}

	#[test]
	fn test_toml_source_reports_parse_errors() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[http\nport = ").unwrap();
		let result = TomlSource::new(file.path()).load();
		assert!(matches!(result, Err(ConfigError::TomlParse { .. })));
	}

	#[test]
	fn test_env_helpers_parse_and_reject() {
		std::env::set_var("CAIRN_CONFIG_TEST_U16_OK", "8443");
		std::env::set_var("CAIRN_CONFIG_TEST_U16_BAD", "eighty");
		std::env::set_var("CAIRN_CONFIG_TEST_BOOL", "TRUE");

		assert_eq!(env_u16("CAIRN_CONFIG_TEST_U16_OK").unwrap(), Some(8443));
		assert!(matches!(
			env_u16("CAIRN_CONFIG_TEST_U16_BAD"),
			Err(ConfigError::InvalidValue { .. })
		));
		assert_eq!(env_bool("CAIRN_CONFIG_TEST_BOOL"), Some(true));
		assert_eq!(env_var("CAIRN_CONFIG_TEST_UNSET"), None);
	}
}
