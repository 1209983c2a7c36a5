// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Full-field snapshots and the versioning capability.
//!
//! A [`Snapshot`] is a JSON object mapping field names to values, with ids as
//! text and timestamps as RFC 3339 strings. Entities opt into versioning by
//! implementing [`Versionable`]: the default projection serializes every
//! field, and [`Versionable::apply_snapshot`] copies a snapshot back field by
//! field, reporting what it could not apply instead of failing.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::entity_type::EntityType;
use crate::ids::EntityId;
use crate::meta::{RecordMeta, MANAGED_FIELDS};

/// Replacement shown for credential fields outside of an explicit reveal.
pub const MASKED_VALUE: &str = "********";

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
	#[error("snapshot must be a JSON object, got {0}")]
	NotAnObject(&'static str),

	#[error("failed to serialize snapshot: {0}")]
	Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(Map<String, Value>);

impl Snapshot {
	/// Project every serialized field of `value`.
	pub fn capture<T: Serialize + ?Sized>(value: &T) -> Result<Self, SnapshotError> {
		Self::from_value(serde_json::to_value(value)?)
	}

	pub fn from_value(value: Value) -> Result<Self, SnapshotError> {
		match value {
			Value::Object(map) => Ok(Self(map)),
			Value::Null => Err(SnapshotError::NotAnObject("null")),
			Value::Bool(_) => Err(SnapshotError::NotAnObject("bool")),
			Value::Number(_) => Err(SnapshotError::NotAnObject("number")),
			Value::String(_) => Err(SnapshotError::NotAnObject("string")),
			Value::Array(_) => Err(SnapshotError::NotAnObject("array")),
		}
	}

	pub fn get(&self, field: &str) -> Option<&Value> {
		self.0.get(field)
	}

	pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
		self.0.iter()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn into_value(self) -> Value {
		Value::Object(self.0)
	}

	/// Copy of this snapshot with every non-null field in `fields` replaced by
	/// [`MASKED_VALUE`].
	pub fn masked(&self, fields: &[&str]) -> Snapshot {
		let mut map = self.0.clone();
		for field in fields {
			if let Some(value) = map.get_mut(*field) {
				if !value.is_null() {
					*value = Value::String(MASKED_VALUE.to_string());
				}
			}
		}
		Snapshot(map)
	}

	/// Replace each string value among `fields` with `seal(value)`.
	///
	/// Missing, null and non-string fields are left as they are.
	pub fn seal_fields<E, F>(&mut self, fields: &[&str], mut seal: F) -> Result<(), E>
	where
		F: FnMut(&str) -> Result<String, E>,
	{
		for field in fields {
			if let Some(Value::String(value)) = self.0.get_mut(*field) {
				*value = seal(value)?;
			}
		}
		Ok(())
	}

	/// Walk every field and hand the settable ones to `apply`.
	///
	/// Managed fields are passed over silently; `read_only` fields are
	/// reported as [`SkipReason::ReadOnly`]; errors from `apply` are reported
	/// with the field name. Nothing here aborts early.
	pub fn apply_fields<F>(&self, read_only: &[&str], mut apply: F) -> Vec<SkippedField>
	where
		F: FnMut(&str, &Value) -> Result<(), SkipReason>,
	{
		let mut skipped = Vec::new();
		for (field, value) in &self.0 {
			if MANAGED_FIELDS.contains(&field.as_str()) {
				continue;
			}
			let outcome = if read_only.contains(&field.as_str()) {
				Err(SkipReason::ReadOnly)
			} else {
				apply(field, value)
			};
			if let Err(reason) = outcome {
				skipped.push(SkippedField {
					field: field.clone(),
					reason,
				});
			}
		}
		skipped
	}
}

/// Why a snapshot field was not written back during a restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
	/// The entity no longer has this field.
	UnknownField,
	/// The field is computed or otherwise not settable.
	ReadOnly,
	/// The stored value does not fit the field's current type.
	TypeMismatch(String),
}

impl fmt::Display for SkipReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SkipReason::UnknownField => f.write_str("unknown field"),
			SkipReason::ReadOnly => f.write_str("read-only field"),
			SkipReason::TypeMismatch(detail) => write!(f, "type mismatch: {detail}"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedField {
	pub field: String,
	pub reason: SkipReason,
}

/// Deserialize `value` into `slot`, leaving `slot` untouched on failure.
pub fn assign<T: DeserializeOwned>(slot: &mut T, value: &Value) -> Result<(), SkipReason> {
	let parsed = T::deserialize(value).map_err(|e| SkipReason::TypeMismatch(e.to_string()))?;
	*slot = parsed;
	Ok(())
}

/// Capability the version ledger and lifecycle manager are generic over.
pub trait Versionable: Serialize + Send + Sync {
	const ENTITY_TYPE: EntityType;

	/// Fields that appear in snapshots but cannot be written back.
	const READ_ONLY_FIELDS: &'static [&'static str] = &[];

	/// Credential fields masked in every outward-facing view.
	const SENSITIVE_FIELDS: &'static [&'static str] = &[];

	fn meta(&self) -> &RecordMeta;

	fn meta_mut(&mut self) -> &mut RecordMeta;

	fn id(&self) -> EntityId {
		self.meta().id
	}

	fn snapshot(&self) -> Result<Snapshot, SnapshotError> {
		Snapshot::capture(self)
	}

	/// Copy every settable field of `snapshot` onto `self`.
	///
	/// Managed fields are never touched. Returns the fields that were skipped.
	fn apply_snapshot(&mut self, snapshot: &Snapshot) -> Vec<SkippedField>;
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ids::UserId;
	use proptest::prelude::*;

	#[derive(Debug, Clone, Serialize, Deserialize)]
	struct Widget {
		#[serde(flatten)]
		meta: RecordMeta,
		label: String,
		count: i64,
		checksum: String,
	}

	impl Versionable for Widget {
		const ENTITY_TYPE: EntityType = EntityType::Documentation;
		const READ_ONLY_FIELDS: &'static [&'static str] = &["checksum"];

		fn meta(&self) -> &RecordMeta {
			&self.meta
		}

		fn meta_mut(&mut self) -> &mut RecordMeta {
			&mut self.meta
		}

		fn apply_snapshot(&mut self, snapshot: &Snapshot) -> Vec<SkippedField> {
			snapshot.apply_fields(Self::READ_ONLY_FIELDS, |field, value| match field {
				"label" => assign(&mut self.label, value),
				"count" => assign(&mut self.count, value),
				_ => Err(SkipReason::UnknownField),
			})
		}
	}

	fn widget(label: &str, count: i64) -> Widget {
		Widget {
			meta: RecordMeta::new(Some(UserId::generate())),
			label: label.to_string(),
			count,
			checksum: "abc".to_string(),
		}
	}

	#[test]
	fn capture_includes_meta_and_domain_fields() {
		let w = widget("a", 1);
		let snapshot = w.snapshot().unwrap();
		assert_eq!(snapshot.get("label"), Some(&Value::from("a")));
		assert_eq!(snapshot.get("id"), Some(&Value::from(w.meta.id.to_string())));
		assert!(snapshot.get("deleted_at").unwrap().is_null());
	}

	#[test]
	fn capture_rejects_non_objects() {
		assert!(matches!(
			Snapshot::capture(&42),
			Err(SnapshotError::NotAnObject("number"))
		));
	}

	#[test]
	fn apply_restores_settable_fields_and_keeps_identity() {
		let original = widget("before", 1);
		let snapshot = original.snapshot().unwrap();

		let mut other = widget("after", 9);
		let other_id = other.meta.id;
		let other_creator = other.meta.created_by;
		let skipped = other.apply_snapshot(&snapshot);

		assert_eq!(other.label, "before");
		assert_eq!(other.count, 1);
		assert_eq!(other.meta.id, other_id);
		assert_eq!(other.meta.created_by, other_creator);
		assert_eq!(
			skipped,
			vec![SkippedField {
				field: "checksum".to_string(),
				reason: SkipReason::ReadOnly,
			}]
		);
	}

	#[test]
	fn apply_reports_unknown_and_mismatched_fields() {
		let snapshot = Snapshot::from_value(serde_json::json!({
			"label": "kept",
			"count": "not a number",
			"retired_field": true,
		}))
		.unwrap();

		let mut w = widget("x", 5);
		let skipped = w.apply_snapshot(&snapshot);

		assert_eq!(w.label, "kept");
		assert_eq!(w.count, 5);
		assert_eq!(skipped.len(), 2);
		assert!(skipped
			.iter()
			.any(|s| s.field == "retired_field" && s.reason == SkipReason::UnknownField));
		assert!(skipped
			.iter()
			.any(|s| s.field == "count" && matches!(s.reason, SkipReason::TypeMismatch(_))));
	}

	#[test]
	fn masked_hides_only_set_fields() {
		let snapshot = Snapshot::from_value(serde_json::json!({
			"password": "cairn:enc:v1:abc",
			"pin": null,
			"name": "router",
		}))
		.unwrap();
		let masked = snapshot.masked(&["password", "pin"]);
		assert_eq!(masked.get("password"), Some(&Value::from(MASKED_VALUE)));
		assert_eq!(masked.get("pin"), Some(&Value::Null));
		assert_eq!(masked.get("name"), Some(&Value::from("router")));
		assert_eq!(snapshot.get("password"), Some(&Value::from("cairn:enc:v1:abc")));
	}

	#[test]
	fn seal_fields_rewrites_only_string_values() {
		let mut snapshot = Snapshot::from_value(serde_json::json!({
			"password": "hunter2",
			"pin": null,
			"name": "router",
		}))
		.unwrap();
		snapshot
			.seal_fields(&["password", "pin", "absent"], |v| {
				Ok::<_, String>(format!("sealed:{v}"))
			})
			.unwrap();
		assert_eq!(snapshot.get("password"), Some(&Value::from("sealed:hunter2")));
		assert_eq!(snapshot.get("pin"), Some(&Value::Null));
		assert_eq!(snapshot.get("name"), Some(&Value::from("router")));
		assert!(snapshot.get("absent").is_none());

		let err = snapshot.seal_fields(&["password"], |_| Err("no key")).unwrap_err();
		assert_eq!(err, "no key");
	}

	proptest! {
		#[test]
		fn snapshot_apply_round_trips(label in ".{0,64}", count in any::<i64>()) {
			let source = widget(&label, count);
			let snapshot = source.snapshot().unwrap();
			let mut target = widget("other", 0);
			target.apply_snapshot(&snapshot);
			prop_assert_eq!(target.label, label);
			prop_assert_eq!(target.count, count);
		}
	}
}
