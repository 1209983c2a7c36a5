// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

use crate::entity_type::EntityType;
use crate::ids::UserId;
use crate::meta::RecordMeta;
use crate::snapshot::{assign, SkipReason, SkippedField, Snapshot, Versionable};

/// A client organization. Every other record is scoped to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
	#[serde(flatten)]
	pub meta: RecordMeta,
	pub name: String,
	pub description: Option<String>,
	pub is_active: bool,
}

impl Organization {
	pub fn new(name: impl Into<String>, created_by: Option<UserId>) -> Self {
		Self {
			meta: RecordMeta::new(created_by),
			name: name.into(),
			description: None,
			is_active: true,
		}
	}
}

impl Versionable for Organization {
	const ENTITY_TYPE: EntityType = EntityType::Organization;

	fn meta(&self) -> &RecordMeta {
		&self.meta
	}

	fn meta_mut(&mut self) -> &mut RecordMeta {
		&mut self.meta
	}

	fn apply_snapshot(&mut self, snapshot: &Snapshot) -> Vec<SkippedField> {
		snapshot.apply_fields(Self::READ_ONLY_FIELDS, |field, value| match field {
			"name" => assign(&mut self.name, value),
			"description" => assign(&mut self.description, value),
			"is_active" => assign(&mut self.is_active, value),
			_ => Err(SkipReason::UnknownField),
		})
	}
}
