// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use cairn_common_entity::{EntityId, EntityType, SnapshotError};
use cairn_server_db::DbError;
use thiserror::Error;

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Error, Debug)]
pub enum LedgerError {
	#[error("{entity_type} {entity_id} not found")]
	EntityNotFound {
		entity_type: EntityType,
		entity_id: EntityId,
	},

	#[error("version {version_number} of {entity_type} {entity_id} not found")]
	VersionNotFound {
		entity_type: EntityType,
		entity_id: EntityId,
		version_number: i64,
	},

	#[error("version conflict on {entity_type} {entity_id} after {attempts} attempts")]
	Conflict {
		entity_type: EntityType,
		entity_id: EntityId,
		attempts: u32,
	},

	#[error("snapshot error: {0}")]
	Snapshot(#[from] SnapshotError),

	#[error("seal failed: {0}")]
	Seal(String),

	#[error(transparent)]
	Db(#[from] DbError),
}

impl From<sqlx::Error> for LedgerError {
	fn from(err: sqlx::Error) -> Self {
		LedgerError::Db(DbError::from(err))
	}
}

impl LedgerError {
	pub(crate) fn not_found(entity_type: EntityType, entity_id: EntityId) -> Self {
		LedgerError::EntityNotFound {
			entity_type,
			entity_id,
		}
	}

	pub(crate) fn is_transient(&self) -> bool {
		matches!(self, LedgerError::Db(err) if err.is_transient())
	}
}
