// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

use crate::entity_type::EntityType;
use crate::ids::{EntityId, UserId};
use crate::meta::RecordMeta;
use crate::snapshot::{assign, SkipReason, SkippedField, Snapshot, Versionable};

/// Free-form documentation page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Documentation {
	#[serde(flatten)]
	pub meta: RecordMeta,
	pub organization_id: EntityId,
	pub title: String,
	pub body: String,
	pub category: Option<String>,
}

impl Documentation {
	pub fn new(
		organization_id: EntityId,
		title: impl Into<String>,
		body: impl Into<String>,
		created_by: Option<UserId>,
	) -> Self {
		Self {
			meta: RecordMeta::new(created_by),
			organization_id,
			title: title.into(),
			body: body.into(),
			category: None,
		}
	}
}

impl Versionable for Documentation {
	const ENTITY_TYPE: EntityType = EntityType::Documentation;

	fn meta(&self) -> &RecordMeta {
		&self.meta
	}

	fn meta_mut(&mut self) -> &mut RecordMeta {
		&mut self.meta
	}

	fn apply_snapshot(&mut self, snapshot: &Snapshot) -> Vec<SkippedField> {
		snapshot.apply_fields(Self::READ_ONLY_FIELDS, |field, value| match field {
			"organization_id" => assign(&mut self.organization_id, value),
			"title" => assign(&mut self.title, value),
			"body" => assign(&mut self.body, value),
			"category" => assign(&mut self.category, value),
			_ => Err(SkipReason::UnknownField),
		})
	}
}
