// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sealing of sensitive snapshot fields before they reach the history table.

use cairn_common_entity::{Snapshot, Versionable};

/// Turns a plaintext field value into its stored form.
///
/// Implementations must pass already-sealed values through unchanged.
pub trait SnapshotSealer: Send + Sync {
	fn seal_value(&self, value: &str) -> Result<String, String>;
}

/// Seal the [`Versionable::SENSITIVE_FIELDS`] of `T` in place.
pub fn seal_snapshot<T: Versionable>(
	sealer: &dyn SnapshotSealer,
	snapshot: &mut Snapshot,
) -> Result<(), String> {
	snapshot.seal_fields(T::SENSITIVE_FIELDS, |value| sealer.seal_value(value))
}
