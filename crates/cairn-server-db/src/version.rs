// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Append-only version records.
//!
//! The table is shared by every entity type and keyed by
//! `(entity_type, entity_id, version_number)`. Numbers, notes and authors are
//! never rewritten. [`VersionRepository::reseal`] swaps a snapshot for its
//! sealed form and [`VersionRepository::purge_in`] removes a whole history for
//! configured hard deletes.

use cairn_common_entity::{EntityId, EntityType, Snapshot, UserId, VersionId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{
	sqlite::{SqliteConnection, SqlitePool, SqliteRow},
	Row,
};

use crate::codec::{format_timestamp, parse_id, parse_optional_id, parse_timestamp};
use crate::error::DbError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionRecord {
	pub id: VersionId,
	pub entity_type: EntityType,
	pub entity_id: EntityId,
	pub version_number: i64,
	pub snapshot: Snapshot,
	pub change_note: Option<String>,
	pub created_by: Option<UserId>,
	pub created_at: DateTime<Utc>,
}

/// Input for [`VersionRepository::append_in`]. The number is assigned there.
#[derive(Debug, Clone)]
pub struct NewVersion {
	pub entity_type: EntityType,
	pub entity_id: EntityId,
	pub snapshot: Snapshot,
	pub change_note: Option<String>,
	pub created_by: Option<UserId>,
}

const SELECT_COLUMNS: &str = "id, entity_type, entity_id, version_number, snapshot, change_note, \
	created_by, created_at";

#[derive(Clone)]
pub struct VersionRepository {
	pool: SqlitePool,
}

impl VersionRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Append the next version for an entity.
	///
	/// The number is `MAX(version_number) + 1` computed inside the insert. A
	/// concurrent append for the same entity surfaces as a unique violation,
	/// which [`DbError::is_transient`] reports as retryable.
	pub async fn append_in(
		conn: &mut SqliteConnection,
		version: NewVersion,
	) -> Result<VersionRecord, DbError> {
		let id = VersionId::generate();
		let created_at = Utc::now();
		let snapshot_json = serde_json::to_string(&version.snapshot)?;

		let row = sqlx::query(
			r#"
			INSERT INTO entity_versions
				(id, entity_type, entity_id, version_number, snapshot, change_note, created_by, created_at)
			SELECT ?, ?, ?, COALESCE(MAX(version_number), 0) + 1, ?, ?, ?, ?
			FROM entity_versions
			WHERE entity_type = ? AND entity_id = ?
			RETURNING version_number
			"#,
		)
		.bind(id.to_string())
		.bind(version.entity_type.as_str())
		.bind(version.entity_id.to_string())
		.bind(snapshot_json)
		.bind(version.change_note.clone())
		.bind(version.created_by.map(|u| u.to_string()))
		.bind(format_timestamp(created_at))
		.bind(version.entity_type.as_str())
		.bind(version.entity_id.to_string())
		.fetch_one(&mut *conn)
		.await?;

		let version_number: i64 = row.try_get("version_number")?;
		tracing::debug!(
			entity_type = %version.entity_type,
			entity_id = %version.entity_id,
			version_number,
			"version appended"
		);

		Ok(VersionRecord {
			id,
			entity_type: version.entity_type,
			entity_id: version.entity_id,
			version_number,
			snapshot: version.snapshot,
			change_note: version.change_note,
			created_by: version.created_by,
			created_at,
		})
	}

	/// Every version of an entity, newest first.
	#[tracing::instrument(skip(self), fields(entity_type = %entity_type, entity_id = %entity_id))]
	pub async fn list(
		&self,
		entity_type: EntityType,
		entity_id: EntityId,
	) -> Result<Vec<VersionRecord>, DbError> {
		let sql = format!(
			"SELECT {SELECT_COLUMNS} FROM entity_versions \
			 WHERE entity_type = ? AND entity_id = ? ORDER BY version_number DESC"
		);
		let rows = sqlx::query(&sql)
			.bind(entity_type.as_str())
			.bind(entity_id.to_string())
			.fetch_all(&self.pool)
			.await?;
		rows.iter().map(row_to_version).collect()
	}

	#[tracing::instrument(skip(self), fields(entity_type = %entity_type, entity_id = %entity_id))]
	pub async fn get(
		&self,
		entity_type: EntityType,
		entity_id: EntityId,
		version_number: i64,
	) -> Result<Option<VersionRecord>, DbError> {
		let mut conn = self.pool.acquire().await?;
		Self::get_in(&mut conn, entity_type, entity_id, version_number).await
	}

	pub async fn get_in(
		conn: &mut SqliteConnection,
		entity_type: EntityType,
		entity_id: EntityId,
		version_number: i64,
	) -> Result<Option<VersionRecord>, DbError> {
		let sql = format!(
			"SELECT {SELECT_COLUMNS} FROM entity_versions \
			 WHERE entity_type = ? AND entity_id = ? AND version_number = ?"
		);
		let row = sqlx::query(&sql)
			.bind(entity_type.as_str())
			.bind(entity_id.to_string())
			.bind(version_number)
			.fetch_optional(&mut *conn)
			.await?;
		row.as_ref().map(row_to_version).transpose()
	}

	pub async fn count_in(
		conn: &mut SqliteConnection,
		entity_type: EntityType,
		entity_id: EntityId,
	) -> Result<i64, DbError> {
		let (count,): (i64,) = sqlx::query_as(
			"SELECT COUNT(*) FROM entity_versions WHERE entity_type = ? AND entity_id = ?",
		)
		.bind(entity_type.as_str())
		.bind(entity_id.to_string())
		.fetch_one(&mut *conn)
		.await?;
		Ok(count)
	}

	/// Every version of one entity type, oldest first.
	#[tracing::instrument(skip(self), fields(entity_type = %entity_type))]
	pub async fn list_for_type(&self, entity_type: EntityType) -> Result<Vec<VersionRecord>, DbError> {
		let sql = format!(
			"SELECT {SELECT_COLUMNS} FROM entity_versions \
			 WHERE entity_type = ? ORDER BY entity_id, version_number"
		);
		let rows = sqlx::query(&sql)
			.bind(entity_type.as_str())
			.fetch_all(&self.pool)
			.await?;
		rows.iter().map(row_to_version).collect()
	}

	/// Replace a snapshot with `sealed` only while it still equals `expected`.
	///
	/// Returns `false` when the stored snapshot no longer matches.
	#[tracing::instrument(skip(self, expected, sealed), fields(version_id = %id))]
	pub async fn reseal(
		&self,
		id: VersionId,
		expected: &Snapshot,
		sealed: &Snapshot,
	) -> Result<bool, DbError> {
		let result =
			sqlx::query("UPDATE entity_versions SET snapshot = ? WHERE id = ? AND snapshot = ?")
				.bind(serde_json::to_string(sealed)?)
				.bind(id.to_string())
				.bind(serde_json::to_string(expected)?)
				.execute(&self.pool)
				.await?;
		Ok(result.rows_affected() > 0)
	}

	/// Remove an entity's whole history. Returns rows removed.
	pub async fn purge_in(
		conn: &mut SqliteConnection,
		entity_type: EntityType,
		entity_id: EntityId,
	) -> Result<u64, DbError> {
		let result =
			sqlx::query("DELETE FROM entity_versions WHERE entity_type = ? AND entity_id = ?")
				.bind(entity_type.as_str())
				.bind(entity_id.to_string())
				.execute(&mut *conn)
				.await?;
		Ok(result.rows_affected())
	}
}

fn row_to_version(row: &SqliteRow) -> Result<VersionRecord, DbError> {
	let id: String = row.try_get("id")?;
	let entity_type: String = row.try_get("entity_type")?;
	let entity_id: String = row.try_get("entity_id")?;
	let snapshot: String = row.try_get("snapshot")?;
	let created_by: Option<String> = row.try_get("created_by")?;
	let created_at: String = row.try_get("created_at")?;

	Ok(VersionRecord {
		id: parse_id(&id, "version id")?,
		entity_type: entity_type
			.parse()
			.map_err(|e| DbError::Internal(format!("Invalid entity_type: {e}")))?,
		entity_id: parse_id(&entity_id, "entity_id")?,
		version_number: row.try_get("version_number")?,
		snapshot: serde_json::from_str(&snapshot)?,
		change_note: row.try_get("change_note")?,
		created_by: parse_optional_id(created_by, "created_by")?,
		created_at: parse_timestamp(&created_at, "created_at")?,
	})
}
