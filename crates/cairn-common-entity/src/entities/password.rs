// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

use crate::entity_type::EntityType;
use crate::ids::{EntityId, UserId};
use crate::meta::RecordMeta;
use crate::snapshot::{assign, SkipReason, SkippedField, Snapshot, Versionable};

/// A stored credential.
///
/// `password` holds tagged ciphertext once sealed. Rows written before
/// encryption was introduced may still carry plaintext until the credential
/// migration runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordEntry {
	#[serde(flatten)]
	pub meta: RecordMeta,
	pub organization_id: EntityId,
	pub name: String,
	pub username: Option<String>,
	pub password: Option<String>,
	pub url: Option<String>,
	pub notes: Option<String>,
}

impl PasswordEntry {
	pub fn new(
		organization_id: EntityId,
		name: impl Into<String>,
		created_by: Option<UserId>,
	) -> Self {
		Self {
			meta: RecordMeta::new(created_by),
			organization_id,
			name: name.into(),
			username: None,
			password: None,
			url: None,
			notes: None,
		}
	}

	pub fn has_password(&self) -> bool {
		self.password.as_deref().is_some_and(|p| !p.is_empty())
	}
}

impl Versionable for PasswordEntry {
	const ENTITY_TYPE: EntityType = EntityType::PasswordEntry;
	const SENSITIVE_FIELDS: &'static [&'static str] = &["password"];

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
			"username" => assign(&mut self.username, value),
			"password" => assign(&mut self.password, value),
			"url" => assign(&mut self.url, value),
			"notes" => assign(&mut self.notes, value),
			_ => Err(SkipReason::UnknownField),
		})
	}
}
