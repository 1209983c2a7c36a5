// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Record metadata shared by every entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{EntityId, UserId};

/// Fields owned by persistence and the lifecycle, never by a snapshot restore.
pub const MANAGED_FIELDS: &[&str] = &[
	"id",
	"created_by",
	"created_at",
	"updated_at",
	"deleted_at",
	"deleted_by",
];

/// Soft-deletion marker.
///
/// `deleted_by` is `None` only for rows tombstoned by legacy bulk operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tombstone {
	pub deleted_at: DateTime<Utc>,
	pub deleted_by: Option<UserId>,
}

/// Identity, audit and tombstone columns.
///
/// Serialized flat as `id`, `created_by`, `created_at`, `updated_at`,
/// `deleted_at`, `deleted_by`. A `deleted_by` without `deleted_at` cannot be
/// represented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RecordMetaRepr", into = "RecordMetaRepr")]
pub struct RecordMeta {
	pub id: EntityId,
	pub created_by: Option<UserId>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	tombstone: Option<Tombstone>,
}

impl RecordMeta {
	/// Metadata for a record created now by `created_by`.
	pub fn new(created_by: Option<UserId>) -> Self {
		let now = Utc::now();
		Self {
			id: EntityId::generate(),
			created_by,
			created_at: now,
			updated_at: now,
			tombstone: None,
		}
	}

	/// Rebuild metadata from stored columns.
	pub fn from_parts(
		id: EntityId,
		created_by: Option<UserId>,
		created_at: DateTime<Utc>,
		updated_at: DateTime<Utc>,
		tombstone: Option<Tombstone>,
	) -> Self {
		Self {
			id,
			created_by,
			created_at,
			updated_at,
			tombstone,
		}
	}

	pub fn tombstone(&self) -> Option<&Tombstone> {
		self.tombstone.as_ref()
	}

	pub fn is_deleted(&self) -> bool {
		self.tombstone.is_some()
	}

	pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
		self.tombstone.map(|t| t.deleted_at)
	}

	pub fn deleted_by(&self) -> Option<UserId> {
		self.tombstone.and_then(|t| t.deleted_by)
	}

	pub fn set_tombstone(&mut self, deleted_at: DateTime<Utc>, deleted_by: Option<UserId>) {
		self.tombstone = Some(Tombstone {
			deleted_at,
			deleted_by,
		});
		self.updated_at = deleted_at;
	}

	pub fn clear_tombstone(&mut self, at: DateTime<Utc>) {
		self.tombstone = None;
		self.updated_at = at;
	}

	pub fn touch(&mut self) {
		self.updated_at = Utc::now();
	}
}

#[derive(Serialize, Deserialize)]
struct RecordMetaRepr {
	id: EntityId,
	#[serde(default)]
	created_by: Option<UserId>,
	created_at: DateTime<Utc>,
	updated_at: DateTime<Utc>,
	#[serde(default)]
	deleted_at: Option<DateTime<Utc>>,
	#[serde(default)]
	deleted_by: Option<UserId>,
}

impl From<RecordMetaRepr> for RecordMeta {
	fn from(repr: RecordMetaRepr) -> Self {
		let tombstone = repr.deleted_at.map(|deleted_at| Tombstone {
			deleted_at,
			deleted_by: repr.deleted_by,
		});
		Self {
			id: repr.id,
			created_by: repr.created_by,
			created_at: repr.created_at,
			updated_at: repr.updated_at,
			tombstone,
		}
	}
}

impl From<RecordMeta> for RecordMetaRepr {
	fn from(meta: RecordMeta) -> Self {
		Self {
			id: meta.id,
			created_by: meta.created_by,
			created_at: meta.created_at,
			updated_at: meta.updated_at,
			deleted_at: meta.deleted_at(),
			deleted_by: meta.deleted_by(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn new_record_is_active() {
		let meta = RecordMeta::new(Some(UserId::generate()));
		assert!(!meta.is_deleted());
		assert_eq!(meta.created_at, meta.updated_at);
	}

	#[test]
	fn tombstone_pair_is_set_and_cleared_together() {
		let actor = UserId::generate();
		let mut meta = RecordMeta::new(None);
		let now = Utc::now();

		meta.set_tombstone(now, Some(actor));
		assert_eq!(meta.deleted_at(), Some(now));
		assert_eq!(meta.deleted_by(), Some(actor));

		meta.clear_tombstone(Utc::now());
		assert_eq!(meta.deleted_at(), None);
		assert_eq!(meta.deleted_by(), None);
	}

	#[test]
	fn deleted_by_without_deleted_at_is_dropped() {
		let json = serde_json::json!({
			"id": EntityId::generate(),
			"created_at": "2024-01-01T00:00:00Z",
			"updated_at": "2024-01-01T00:00:00Z",
			"deleted_by": UserId::generate(),
		});
		let meta: RecordMeta = serde_json::from_value(json).unwrap();
		assert!(!meta.is_deleted());
		assert_eq!(meta.deleted_by(), None);
	}

	#[test]
	fn serializes_flat_with_iso_timestamps() {
		let meta = RecordMeta::new(None);
		let value = serde_json::to_value(&meta).unwrap();
		let object = value.as_object().unwrap();
		for field in MANAGED_FIELDS {
			assert!(object.contains_key(*field), "missing {field}");
		}
		let created_at = object["created_at"].as_str().unwrap();
		assert!(DateTime::parse_from_rfc3339(created_at).is_ok());
	}
}
