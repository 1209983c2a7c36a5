// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use cairn_common_entity::{EntityId, EntityType};
use cairn_server_db::DbError;
use thiserror::Error;

pub type LifecycleResult<T> = Result<T, LifecycleError>;

#[derive(Error, Debug)]
pub enum LifecycleError {
	#[error("{entity_type} {entity_id} not found")]
	NotFound {
		entity_type: EntityType,
		entity_id: EntityId,
	},

	#[error("{entity_type} {entity_id} is not deleted")]
	NotDeleted {
		entity_type: EntityType,
		entity_id: EntityId,
	},

	#[error(transparent)]
	Db(#[from] DbError),
}

impl From<sqlx::Error> for LifecycleError {
	fn from(err: sqlx::Error) -> Self {
		LifecycleError::Db(DbError::from(err))
	}
}
