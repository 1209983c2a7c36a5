// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Entity base contract for Cairn.
//!
//! Every documented record (organizations, contacts, credentials, ...) shares
//! the same base: an immutable id, creator and timestamps, and an optional
//! tombstone. This crate defines that base, the domain records built on it,
//! and the [`Versionable`] capability the version ledger is generic over.
//!
//! - [`ids`]: UUID newtypes ([`EntityId`], [`UserId`], [`VersionId`])
//! - [`meta`]: [`RecordMeta`] and [`Tombstone`]
//! - [`snapshot`]: [`Snapshot`], [`SkippedField`] and the [`Versionable`] trait
//! - [`entities`]: the domain records

pub mod entities;
pub mod entity_type;
pub mod ids;
pub mod meta;
pub mod snapshot;

pub use entities::{
	Configuration, ConfigurationKind, Contact, Documentation, Location, Organization,
	PasswordEntry,
};
pub use entity_type::{EntityType, ParseEntityTypeError};
pub use ids::{AuditEventId, EntityId, UserId, VersionId};
pub use meta::{RecordMeta, Tombstone, MANAGED_FIELDS};
pub use snapshot::{
	assign, SkipReason, SkippedField, Snapshot, SnapshotError, Versionable, MASKED_VALUE,
};
