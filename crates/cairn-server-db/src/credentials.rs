// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Raw access to stored credential values for bulk sealing.
//!
//! Reads go through the all view so tombstoned entries are sealed too.
//! Writes touch only the `password` column: sealing is not a user edit, so
//! it neither bumps `updated_at` nor creates a version.

use cairn_common_entity::EntityId;
use sqlx::sqlite::SqlitePool;

use crate::codec::parse_id;
use crate::error::DbError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredential {
	pub id: EntityId,
	pub value: String,
}

#[derive(Clone)]
pub struct CredentialRepository {
	pool: SqlitePool,
}

impl CredentialRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Every non-empty stored credential, tombstoned or not.
	#[tracing::instrument(skip(self))]
	pub async fn list_stored(&self) -> Result<Vec<StoredCredential>, DbError> {
		let rows: Vec<(String, String)> = sqlx::query_as(
			r#"
			SELECT id, password
			FROM password_entries
			WHERE password IS NOT NULL AND password != ''
			ORDER BY created_at, id
			"#,
		)
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter()
			.map(|(id, value)| {
				Ok(StoredCredential {
					id: parse_id(&id, "id")?,
					value,
				})
			})
			.collect()
	}

	/// Replace a stored value only if it still equals `expected`.
	///
	/// Returns `false` when the row changed underneath the caller.
	#[tracing::instrument(skip(self, expected, replacement), fields(entity_id = %id))]
	pub async fn replace(
		&self,
		id: EntityId,
		expected: &str,
		replacement: &str,
	) -> Result<bool, DbError> {
		let result =
			sqlx::query("UPDATE password_entries SET password = ? WHERE id = ? AND password = ?")
				.bind(replacement)
				.bind(id.to_string())
				.bind(expected)
				.execute(&self.pool)
				.await?;
		Ok(result.rows_affected() == 1)
	}
}
