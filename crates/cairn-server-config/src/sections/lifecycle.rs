// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Soft-delete lifecycle configuration.

use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleConfig {
	/// Delete version history together with the row on hard delete.
	pub purge_versions_on_hard_delete: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LifecycleConfigLayer {
	#[serde(default)]
	pub purge_versions_on_hard_delete: Option<bool>,
}

impl LifecycleConfigLayer {
	pub fn merge(&mut self, other: LifecycleConfigLayer) {
		if other.purge_versions_on_hard_delete.is_some() {
			self.purge_versions_on_hard_delete = other.purge_versions_on_hard_delete;
		}
	}

	pub fn finalize(self) -> LifecycleConfig {
		LifecycleConfig {
			purge_versions_on_hard_delete: self.purge_versions_on_hard_delete.unwrap_or(false),
		}
	}
}
