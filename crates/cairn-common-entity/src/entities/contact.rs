// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

use crate::entity_type::EntityType;
use crate::ids::{EntityId, UserId};
use crate::meta::RecordMeta;
use crate::snapshot::{assign, SkipReason, SkippedField, Snapshot, Versionable};

/// A person at a client organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
	#[serde(flatten)]
	pub meta: RecordMeta,
	pub organization_id: EntityId,
	pub first_name: String,
	pub last_name: String,
	pub email: Option<String>,
	pub phone: Option<String>,
	pub title: Option<String>,
	pub notes: Option<String>,
}

impl Contact {
	pub fn new(
		organization_id: EntityId,
		first_name: impl Into<String>,
		last_name: impl Into<String>,
		created_by: Option<UserId>,
	) -> Self {
		Self {
			meta: RecordMeta::new(created_by),
			organization_id,
			first_name: first_name.into(),
			last_name: last_name.into(),
			email: None,
			phone: None,
			title: None,
			notes: None,
		}
	}

	pub fn full_name(&self) -> String {
		format!("{} {}", self.first_name, self.last_name)
	}
}

impl Versionable for Contact {
	const ENTITY_TYPE: EntityType = EntityType::Contact;

	fn meta(&self) -> &RecordMeta {
		&self.meta
	}

	fn meta_mut(&mut self) -> &mut RecordMeta {
		&mut self.meta
	}

	fn apply_snapshot(&mut self, snapshot: &Snapshot) -> Vec<SkippedField> {
		snapshot.apply_fields(Self::READ_ONLY_FIELDS, |field, value| match field {
			"organization_id" => assign(&mut self.organization_id, value),
			"first_name" => assign(&mut self.first_name, value),
			"last_name" => assign(&mut self.last_name, value),
			"email" => assign(&mut self.email, value),
			"phone" => assign(&mut self.phone, value),
			"title" => assign(&mut self.title, value),
			"notes" => assign(&mut self.notes, value),
			_ => Err(SkipReason::UnknownField),
		})
	}
}
