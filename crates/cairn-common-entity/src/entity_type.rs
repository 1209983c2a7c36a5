// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discriminator stored next to every version record and audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
	Organization,
	Location,
	Contact,
	Configuration,
	PasswordEntry,
	Documentation,
}

impl EntityType {
	pub fn all() -> &'static [EntityType] {
		&[
			EntityType::Organization,
			EntityType::Location,
			EntityType::Contact,
			EntityType::Configuration,
			EntityType::PasswordEntry,
			EntityType::Documentation,
		]
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			EntityType::Organization => "organization",
			EntityType::Location => "location",
			EntityType::Contact => "contact",
			EntityType::Configuration => "configuration",
			EntityType::PasswordEntry => "password_entry",
			EntityType::Documentation => "documentation",
		}
	}
}

impl fmt::Display for EntityType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown entity type: {0}")]
pub struct ParseEntityTypeError(pub String);

impl FromStr for EntityType {
	type Err = ParseEntityTypeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		EntityType::all()
			.iter()
			.copied()
			.find(|t| t.as_str() == s)
			.ok_or_else(|| ParseEntityTypeError(s.to_string()))
	}
}
