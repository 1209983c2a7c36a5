// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Version ledger for Cairn entities.
//!
//! One shared history table keyed by `(entity_type, entity_id, version_number)`.
//! The ledger snapshots an entity before every versioned update, supports
//! point-in-time restore, and never rewrites or removes a single version.
//! Sensitive fields pass through an optional [`SnapshotSealer`] on the way in.

pub mod error;
pub mod ledger;
pub mod sealer;

pub use error::{LedgerError, LedgerResult};
pub use ledger::{
	backup_note, restored_note, RestoreOptions, RestoreOutcome, UpdateOutcome, VersionLedger,
	INITIAL_VERSION_NOTE,
};
pub use sealer::{seal_snapshot, SnapshotSealer};
