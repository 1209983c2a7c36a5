// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Type-safe UUID wrappers.
//!
//! All ID types serialize transparently as UUID strings and convert to and
//! from [`uuid::Uuid`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			/// Create a new ID from a UUID.
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			/// Generate a new random ID.
			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			/// Get the inner UUID value.
			pub fn into_inner(self) -> Uuid {
				self.0
			}

			/// Get a reference to the inner UUID.
			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl FromStr for $name {
			type Err = uuid::Error;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Uuid::parse_str(s).map(Self)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}
	};
}

define_id_type!(EntityId, "Unique identifier of any documented record.");
define_id_type!(UserId, "Unique identifier of an acting user.");
define_id_type!(VersionId, "Unique identifier of a version record.");
define_id_type!(AuditEventId, "Unique identifier of an audit event.");

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use std::collections::HashSet;

	#[test]
	fn display_and_parse_agree() {
		let id = EntityId::generate();
		let parsed: EntityId = id.to_string().parse().unwrap();
		assert_eq!(id, parsed);
	}

	#[test]
	fn serializes_as_plain_string() {
		let id = UserId::generate();
		let json = serde_json::to_string(&id).unwrap();
		assert_eq!(json, format!("\"{id}\""));
	}

	#[test]
	fn invalid_string_is_rejected() {
		assert!("not-a-uuid".parse::<EntityId>().is_err());
	}

	proptest! {
		#[test]
		fn entity_id_generation_is_unique(count in 1..500usize) {
			let mut ids = HashSet::new();
			for _ in 0..count {
				prop_assert!(ids.insert(EntityId::generate()), "Generated duplicate EntityId");
			}
		}
	}
}
