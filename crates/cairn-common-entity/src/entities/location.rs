// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

use crate::entity_type::EntityType;
use crate::ids::{EntityId, UserId};
use crate::meta::RecordMeta;
use crate::snapshot::{assign, SkipReason, SkippedField, Snapshot, Versionable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
	#[serde(flatten)]
	pub meta: RecordMeta,
	pub organization_id: EntityId,
	pub name: String,
	pub address: Option<String>,
	pub city: Option<String>,
	pub country: Option<String>,
	pub notes: Option<String>,
}

impl Location {
	pub fn new(
		organization_id: EntityId,
		name: impl Into<String>,
		created_by: Option<UserId>,
	) -> Self {
		Self {
			meta: RecordMeta::new(created_by),
			organization_id,
			name: name.into(),
			address: None,
			city: None,
			country: None,
			notes: None,
		}
	}
}

impl Versionable for Location {
	const ENTITY_TYPE: EntityType = EntityType::Location;

	fn meta(&self) -> &RecordMeta {
		&self.meta
	}

	fn meta_mut(&mut self) -> &mut RecordMeta {
		&mut self.meta
	}

	fn apply_snapshot(&mut self, snapshot: &Snapshot) -> Vec<SkippedField> {
		snapshot.apply_fields(Self::READ_ONLY_FIELDS, |field, value| match field {
			"organization_id" => assign(&mut self.organization_id, value),
			"name" => assign(&mut self.name, value),
			"address" => assign(&mut self.address, value),
			"city" => assign(&mut self.city, value),
			"country" => assign(&mut self.country, value),
			"notes" => assign(&mut self.notes, value),
			_ => Err(SkipReason::UnknownField),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn malformed_organization_id_is_skipped() {
		let mut location = Location::new(EntityId::generate(), "HQ", None);
		let org = location.organization_id;
		let snapshot = Snapshot::from_value(serde_json::json!({
			"organization_id": "not-a-uuid",
			"city": "Sydney",
		}))
		.unwrap();

		let skipped = location.apply_snapshot(&snapshot);
		assert_eq!(location.organization_id, org);
		assert_eq!(location.city.as_deref(), Some("Sydney"));
		assert_eq!(skipped.len(), 1);
		assert_eq!(skipped[0].field, "organization_id");
	}
}
