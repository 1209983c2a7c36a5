// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SQLite store settings.
//!
//! Every ledger write takes SQLite's single write lock, so `busy_timeout_secs`
//! bounds how long a writer queues behind another before the ledger sees a
//! busy error and retries.

use serde::Deserialize;
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
	/// `sqlite:` connection string.
	pub url: String,
	pub busy_timeout_secs: u64,
	pub max_connections: u32,
}

impl DatabaseConfig {
	pub fn busy_timeout(&self) -> Duration {
		Duration::from_secs(self.busy_timeout_secs)
	}
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			url: "sqlite:./cairn.db".to_string(),
			busy_timeout_secs: 5,
			max_connections: 10,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfigLayer {
	#[serde(default)]
	pub url: Option<String>,
	#[serde(default)]
	pub busy_timeout_secs: Option<u64>,
	#[serde(default)]
	pub max_connections: Option<u32>,
}

impl DatabaseConfigLayer {
	pub fn merge(&mut self, other: DatabaseConfigLayer) {
		if other.url.is_some() {
			self.url = other.url;
		}
		if other.busy_timeout_secs.is_some() {
			self.busy_timeout_secs = other.busy_timeout_secs;
		}
		if other.max_connections.is_some() {
			self.max_connections = other.max_connections;
		}
	}

	/// Resolve against defaults. Only `sqlite:` URLs and a non-empty pool pass.
	pub fn finalize(self) -> Result<DatabaseConfig, ConfigError> {
		let defaults = DatabaseConfig::default();
		let config = DatabaseConfig {
			url: self.url.unwrap_or(defaults.url),
			busy_timeout_secs: self.busy_timeout_secs.unwrap_or(defaults.busy_timeout_secs),
			max_connections: self.max_connections.unwrap_or(defaults.max_connections),
		};

		if !config.url.starts_with("sqlite:") {
			return Err(ConfigError::Validation(format!(
				"CAIRN_SERVER_DATABASE_URL must be a sqlite: URL, got '{}'",
				config.url
			)));
		}
		if config.max_connections == 0 {
			return Err(ConfigError::Validation(
				"CAIRN_SERVER_DATABASE_MAX_CONNECTIONS must be at least 1".to_string(),
			));
		}
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults_point_at_local_file() {
		let config = DatabaseConfigLayer::default().finalize().unwrap();
		assert_eq!(config, DatabaseConfig::default());
		assert_eq!(config.busy_timeout(), Duration::from_secs(5));
	}

	#[test]
	fn test_later_layer_wins_per_field() {
		let mut layer = DatabaseConfigLayer {
			url: Some("sqlite:/var/lib/cairn/data.db".to_string()),
			busy_timeout_secs: Some(30),
			..Default::default()
		};
		layer.merge(DatabaseConfigLayer {
			max_connections: Some(2),
			..Default::default()
		});
		let config = layer.finalize().unwrap();
		assert_eq!(config.url, "sqlite:/var/lib/cairn/data.db");
		assert_eq!(config.busy_timeout_secs, 30);
		assert_eq!(config.max_connections, 2);
	}

	#[test]
	fn test_non_sqlite_url_is_rejected() {
		let layer = DatabaseConfigLayer {
			url: Some("postgres://localhost/cairn".to_string()),
			..Default::default()
		};
		assert!(matches!(layer.finalize(), Err(ConfigError::Validation(_))));
	}

	#[test]
	fn test_empty_pool_is_rejected() {
		let layer = DatabaseConfigLayer {
			max_connections: Some(0),
			..Default::default()
		};
		assert!(matches!(layer.finalize(), Err(ConfigError::Validation(_))));
	}
}
