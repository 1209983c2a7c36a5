// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for Cairn server.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`CAIRN_SERVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use cairn_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("Server listening on {}:{}", config.http.host, config.http.port);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	pub cipher: CipherConfig,
	pub ledger: LedgerConfig,
	pub lifecycle: LifecycleConfig,
	pub logging: LoggingConfig,
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
/// 1. Environment variables (`CAIRN_SERVER_*`)
/// 2. Config file (`/etc/cairn/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![Box::new(EnvSource)])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
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
	let database = layer.database.unwrap_or_default().finalize()?;
	let cipher = layer.cipher.unwrap_or_default().finalize()?;
	let ledger = layer.ledger.unwrap_or_default().finalize();
	let lifecycle = layer.lifecycle.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	info!(
		host = %http.host,
		port = http.port,
		database = %database.url,
		db_max_connections = database.max_connections,
		db_busy_timeout_secs = database.busy_timeout_secs,
		ledger_max_retries = ledger.max_retries,
		backup_before_restore = ledger.backup_before_restore,
		initial_version_on_create = ledger.initial_version_on_create,
		purge_versions_on_hard_delete = lifecycle.purge_versions_on_hard_delete,
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		http,
		database,
		cipher,
		ledger,
		lifecycle,
		logging,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use cairn_common_secret::SecretString;

	fn layer_with_secret() -> ServerConfigLayer {
		ServerConfigLayer {
			cipher: Some(CipherConfigLayer {
				master_secret: Some(SecretString::new("test-secret".to_string())),
			}),
			..Default::default()
		}
	}

	#[test]
	fn test_finalize_applies_defaults() {
		let config = finalize(layer_with_secret()).unwrap();
		assert_eq!(config.socket_addr(), "0.0.0.0:8080");
		assert_eq!(config.database.url, "sqlite:./cairn.db");
		assert_eq!(config.ledger.max_retries, 3);
		assert!(!config.lifecycle.purge_versions_on_hard_delete);
		assert_eq!(config.logging.level, "info");
	}

	#[test]
	fn test_missing_master_secret_fails_validation() {
		let result = finalize(ServerConfigLayer::default());
		assert!(matches!(result, Err(ConfigError::Validation(_))));
	}

	#[test]
	fn test_non_sqlite_url_fails_validation() {
		let mut layer = layer_with_secret();
		layer.database = Some(DatabaseConfigLayer {
			url: Some("postgres://localhost/cairn".to_string()),
			..Default::default()
		});
		assert!(matches!(finalize(layer), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn test_later_layers_override_earlier() {
		let mut merged = layer_with_secret();
		merged.merge(ServerConfigLayer {
			ledger: Some(LedgerConfigLayer {
				backup_before_restore: Some(false),
				..Default::default()
			}),
			..Default::default()
		});
		let config = finalize(merged).unwrap();
		assert!(!config.ledger.backup_before_restore);
		assert_eq!(config.cipher.master_secret.expose(), "test-secret");
	}
}
