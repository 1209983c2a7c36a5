// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Version ledger configuration.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
	/// Attempts at appending a version before giving up with a conflict.
	pub max_retries: u32,
	/// Default for `backup_current` when restoring a version.
	pub backup_before_restore: bool,
	/// Write an "Initial version" record in the same transaction as a create.
	pub initial_version_on_create: bool,
}

impl Default for LedgerConfig {
	fn default() -> Self {
		Self {
			max_retries: 3,
			backup_before_restore: true,
			initial_version_on_create: false,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerConfigLayer {
	#[serde(default)]
	pub max_retries: Option<u32>,
	#[serde(default)]
	pub backup_before_restore: Option<bool>,
	#[serde(default)]
	pub initial_version_on_create: Option<bool>,
}

impl LedgerConfigLayer {
	pub fn merge(&mut self, other: LedgerConfigLayer) {
		if other.max_retries.is_some() {
			self.max_retries = other.max_retries;
		}
		if other.backup_before_restore.is_some() {
			self.backup_before_restore = other.backup_before_restore;
		}
		if other.initial_version_on_create.is_some() {
			self.initial_version_on_create = other.initial_version_on_create;
		}
	}

	pub fn finalize(self) -> LedgerConfig {
		let defaults = LedgerConfig::default();
		LedgerConfig {
			max_retries: self.max_retries.unwrap_or(defaults.max_retries).max(1),
			backup_before_restore: self
				.backup_before_restore
				.unwrap_or(defaults.backup_before_restore),
			initial_version_on_create: self
				.initial_version_on_create
				.unwrap_or(defaults.initial_version_on_create),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = LedgerConfigLayer::default().finalize();
		assert_eq!(config, LedgerConfig::default());
		assert_eq!(config.max_retries, 3);
		assert!(config.backup_before_restore);
		assert!(!config.initial_version_on_create);
	}

	#[test]
	fn test_zero_retries_is_clamped_to_one_attempt() {
		let layer = LedgerConfigLayer {
			max_retries: Some(0),
			..Default::default()
		};
		assert_eq!(layer.finalize().max_retries, 1);
	}

	#[test]
	fn test_deserialize_partial() {
		let layer: LedgerConfigLayer = toml::from_str("initial_version_on_create = true").unwrap();
		assert_eq!(layer.initial_version_on_create, Some(true));
		assert!(layer.max_retries.is_none());
	}
}
