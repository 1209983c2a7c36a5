// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Column conversions. Ids are stored as UUID text, timestamps as RFC 3339.

use cairn_common_entity::{EntityId, RecordMeta, Tombstone, UserId};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{sqlite::SqliteRow, Row};
use std::str::FromStr;

use crate::error::DbError;

/// Metadata columns shared by every entity table, in select order.
pub const META_COLUMNS: &[&str] = &[
	"id",
	"created_by",
	"created_at",
	"updated_at",
	"deleted_at",
	"deleted_by",
];

pub fn parse_id<T>(value: &str, column: &str) -> Result<T, DbError>
where
	T: FromStr<Err = uuid::Error>,
{
	value
		.parse()
		.map_err(|e| DbError::Internal(format!("Invalid {column}: {e}")))
}

pub fn parse_optional_id<T>(value: Option<String>, column: &str) -> Result<Option<T>, DbError>
where
	T: FromStr<Err = uuid::Error>,
{
	value.map(|v| parse_id(&v, column)).transpose()
}

pub fn parse_timestamp(value: &str, column: &str) -> Result<DateTime<Utc>, DbError> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("Invalid {column}: {e}")))
}

/// Fixed-width so text ordering matches time ordering.
pub fn format_timestamp(value: DateTime<Utc>) -> String {
	value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Read the metadata columns of an entity row.
pub fn read_meta(row: &SqliteRow) -> Result<RecordMeta, DbError> {
	let id: String = row.try_get("id")?;
	let created_by: Option<String> = row.try_get("created_by")?;
	let created_at: String = row.try_get("created_at")?;
	let updated_at: String = row.try_get("updated_at")?;
	let deleted_at: Option<String> = row.try_get("deleted_at")?;
	let deleted_by: Option<String> = row.try_get("deleted_by")?;

	let tombstone = match deleted_at {
		Some(at) => Some(Tombstone {
			deleted_at: parse_timestamp(&at, "deleted_at")?,
			deleted_by: parse_optional_id::<UserId>(deleted_by, "deleted_by")?,
		}),
		None => None,
	};

	Ok(RecordMeta::from_parts(
		parse_id::<EntityId>(&id, "id")?,
		parse_optional_id(created_by, "created_by")?,
		parse_timestamp(&created_at, "created_at")?,
		parse_timestamp(&updated_at, "updated_at")?,
		tombstone,
	))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn timestamps_round_trip_through_text() {
		let now = Utc::now();
		let parsed = parse_timestamp(&format_timestamp(now), "created_at").unwrap();
		assert_eq!(parsed, now);
	}

	#[test]
	fn bad_values_name_the_column() {
		let err = parse_id::<EntityId>("nope", "organization_id").unwrap_err();
		assert!(err.to_string().contains("organization_id"));
		let err = parse_timestamp("yesterday", "deleted_at").unwrap_err();
		assert!(err.to_string().contains("deleted_at"));
	}
}
