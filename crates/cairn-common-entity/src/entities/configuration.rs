// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::entity_type::EntityType;
use crate::ids::{EntityId, UserId};
use crate::meta::RecordMeta;
use crate::snapshot::{assign, SkipReason, SkippedField, Snapshot, Versionable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigurationKind {
	NetworkDevice,
	Server,
	Workstation,
	#[default]
	Other,
}

impl ConfigurationKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			ConfigurationKind::NetworkDevice => "network_device",
			ConfigurationKind::Server => "server",
			ConfigurationKind::Workstation => "workstation",
			ConfigurationKind::Other => "other",
		}
	}
}

impl fmt::Display for ConfigurationKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ConfigurationKind {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"network_device" => Ok(ConfigurationKind::NetworkDevice),
			"server" => Ok(ConfigurationKind::Server),
			"workstation" => Ok(ConfigurationKind::Workstation),
			"other" => Ok(ConfigurationKind::Other),
			_ => Err(format!("unknown configuration kind: {s}")),
		}
	}
}

/// A managed configuration item: network device, server or workstation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
	#[serde(flatten)]
	pub meta: RecordMeta,
	pub organization_id: EntityId,
	pub location_id: Option<EntityId>,
	pub name: String,
	pub kind: ConfigurationKind,
	pub hostname: Option<String>,
	pub ip_address: Option<String>,
	pub os: Option<String>,
	pub notes: Option<String>,
}

impl Configuration {
	pub fn new(
		organization_id: EntityId,
		name: impl Into<String>,
		kind: ConfigurationKind,
		created_by: Option<UserId>,
	) -> Self {
		Self {
			meta: RecordMeta::new(created_by),
			organization_id,
			location_id: None,
			name: name.into(),
			kind,
			hostname: None,
			ip_address: None,
			os: None,
			notes: None,
		}
	}
}

impl Versionable for Configuration {
	const ENTITY_TYPE: EntityType = EntityType::Configuration;

	fn meta(&self) -> &RecordMeta {
		&self.meta
	}

	fn meta_mut(&mut self) -> &mut RecordMeta {
		&mut self.meta
	}

	fn apply_snapshot(&mut self, snapshot: &Snapshot) -> Vec<SkippedField> {
		snapshot.apply_fields(Self::READ_ONLY_FIELDS, |field, value| match field {
			"organization_id" => assign(&mut self.organization_id, value),
			"location_id" => assign(&mut self.location_id, value),
			"name" => assign(&mut self.name, value),
			"kind" => assign(&mut self.kind, value),
			"hostname" => assign(&mut self.hostname, value),
			"ip_address" => assign(&mut self.ip_address, value),
			"os" => assign(&mut self.os, value),
			"notes" => assign(&mut self.notes, value),
			_ => Err(SkipReason::UnknownField),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn kind_round_trips_through_str() {
		for kind in [
			ConfigurationKind::NetworkDevice,
			ConfigurationKind::Server,
			ConfigurationKind::Workstation,
			ConfigurationKind::Other,
		] {
			assert_eq!(kind.as_str().parse::<ConfigurationKind>().unwrap(), kind);
		}
		assert!("router".parse::<ConfigurationKind>().is_err());
	}

	#[test]
	fn retired_kind_in_snapshot_is_a_type_mismatch() {
		let mut config = Configuration::new(
			EntityId::generate(),
			"core-sw-01",
			ConfigurationKind::NetworkDevice,
			None,
		);
		let snapshot = Snapshot::from_value(serde_json::json!({
			"kind": "mainframe",
			"hostname": "core-sw-01.lan",
		}))
		.unwrap();

		let skipped = config.apply_snapshot(&snapshot);
		assert_eq!(config.kind, ConfigurationKind::NetworkDevice);
		assert_eq!(config.hostname.as_deref(), Some("core-sw-01.lan"));
		assert!(matches!(skipped[0].reason, SkipReason::TypeMismatch(_)));
	}
}
