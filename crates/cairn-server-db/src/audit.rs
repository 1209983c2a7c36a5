// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit trail for lifecycle transitions, restores and credential access.

use cairn_common_entity::{AuditEventId, EntityId, EntityType, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{
	sqlite::{SqliteConnection, SqlitePool, SqliteRow},
	Row,
};
use std::fmt;
use std::str::FromStr;

use crate::codec::{format_timestamp, parse_id, parse_optional_id, parse_timestamp};
use crate::error::DbError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
	EntityCreated,
	EntityUpdated,
	EntitySoftDeleted,
	EntityRestored,
	EntityHardDeleted,
	VersionRestored,
	CredentialRevealed,
	CredentialRevealFailed,
	CredentialsMigrated,
}

impl AuditEventType {
	pub fn as_str(&self) -> &'static str {
		match self {
			AuditEventType::EntityCreated => "entity_created",
			AuditEventType::EntityUpdated => "entity_updated",
			AuditEventType::EntitySoftDeleted => "entity_soft_deleted",
			AuditEventType::EntityRestored => "entity_restored",
			AuditEventType::EntityHardDeleted => "entity_hard_deleted",
			AuditEventType::VersionRestored => "version_restored",
			AuditEventType::CredentialRevealed => "credential_revealed",
			AuditEventType::CredentialRevealFailed => "credential_reveal_failed",
			AuditEventType::CredentialsMigrated => "credentials_migrated",
		}
	}
}

impl fmt::Display for AuditEventType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for AuditEventType {
	type Err = DbError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(match s {
			"entity_created" => AuditEventType::EntityCreated,
			"entity_updated" => AuditEventType::EntityUpdated,
			"entity_soft_deleted" => AuditEventType::EntitySoftDeleted,
			"entity_restored" => AuditEventType::EntityRestored,
			"entity_hard_deleted" => AuditEventType::EntityHardDeleted,
			"version_restored" => AuditEventType::VersionRestored,
			"credential_revealed" => AuditEventType::CredentialRevealed,
			"credential_reveal_failed" => AuditEventType::CredentialRevealFailed,
			"credentials_migrated" => AuditEventType::CredentialsMigrated,
			other => return Err(DbError::Internal(format!("Invalid event_type: {other}"))),
		})
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
	pub id: AuditEventId,
	pub timestamp: DateTime<Utc>,
	pub event_type: AuditEventType,
	pub actor_user_id: Option<UserId>,
	pub entity_type: Option<EntityType>,
	pub entity_id: Option<EntityId>,
	pub details: serde_json::Value,
}

impl AuditEvent {
	pub fn new(event_type: AuditEventType) -> Self {
		Self {
			id: AuditEventId::generate(),
			timestamp: Utc::now(),
			event_type,
			actor_user_id: None,
			entity_type: None,
			entity_id: None,
			details: serde_json::Value::Object(Default::default()),
		}
	}

	pub fn actor(mut self, actor: Option<UserId>) -> Self {
		self.actor_user_id = actor;
		self
	}

	pub fn entity(mut self, entity_type: EntityType, entity_id: EntityId) -> Self {
		self.entity_type = Some(entity_type);
		self.entity_id = Some(entity_id);
		self
	}

	pub fn details(mut self, details: serde_json::Value) -> Self {
		self.details = details;
		self
	}
}

#[derive(Clone)]
pub struct AuditRepository {
	pool: SqlitePool,
}

impl AuditRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, event), fields(event_type = %event.event_type))]
	pub async fn record(&self, event: &AuditEvent) -> Result<(), DbError> {
		let mut conn = self.pool.acquire().await?;
		Self::record_in(&mut conn, event).await
	}

	pub async fn record_in(conn: &mut SqliteConnection, event: &AuditEvent) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO audit_events (id, timestamp, event_type, actor_user_id, entity_type, entity_id, details)
			VALUES (?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(event.id.to_string())
		.bind(format_timestamp(event.timestamp))
		.bind(event.event_type.as_str())
		.bind(event.actor_user_id.map(|u| u.to_string()))
		.bind(event.entity_type.map(|t| t.as_str()))
		.bind(event.entity_id.map(|id| id.to_string()))
		.bind(serde_json::to_string(&event.details)?)
		.execute(&mut *conn)
		.await?;

		tracing::debug!(
			event_type = %event.event_type,
			entity_id = ?event.entity_id,
			"audit event recorded"
		);
		Ok(())
	}

	/// Events for one entity, oldest first.
	#[tracing::instrument(skip(self), fields(entity_type = %entity_type, entity_id = %entity_id))]
	pub async fn list_for_entity(
		&self,
		entity_type: EntityType,
		entity_id: EntityId,
	) -> Result<Vec<AuditEvent>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, timestamp, event_type, actor_user_id, entity_type, entity_id, details
			FROM audit_events
			WHERE entity_type = ? AND entity_id = ?
			ORDER BY timestamp, rowid
			"#,
		)
		.bind(entity_type.as_str())
		.bind(entity_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_event).collect()
	}

	/// Events of one type across all entities, newest first.
	#[tracing::instrument(skip(self), fields(event_type = %event_type))]
	pub async fn list_by_type(
		&self,
		event_type: AuditEventType,
		limit: i64,
	) -> Result<Vec<AuditEvent>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, timestamp, event_type, actor_user_id, entity_type, entity_id, details
			FROM audit_events
			WHERE event_type = ?
			ORDER BY timestamp DESC, rowid DESC
			LIMIT ?
			"#,
		)
		.bind(event_type.as_str())
		.bind(limit.clamp(1, 1000))
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_event).collect()
	}
}

fn row_to_event(row: &SqliteRow) -> Result<AuditEvent, DbError> {
	let id: String = row.try_get("id")?;
	let timestamp: String = row.try_get("timestamp")?;
	let event_type: String = row.try_get("event_type")?;
	let actor: Option<String> = row.try_get("actor_user_id")?;
	let entity_type: Option<String> = row.try_get("entity_type")?;
	let entity_id: Option<String> = row.try_get("entity_id")?;
	let details: String = row.try_get("details")?;

	Ok(AuditEvent {
		id: parse_id(&id, "audit event id")?,
		timestamp: parse_timestamp(&timestamp, "timestamp")?,
		event_type: event_type.parse()?,
		actor_user_id: parse_optional_id(actor, "actor_user_id")?,
		entity_type: entity_type
			.map(|t| t.parse::<EntityType>())
			.transpose()
			.map_err(|e| DbError::Internal(format!("Invalid entity_type: {e}")))?,
		entity_id: parse_optional_id(entity_id, "entity_id")?,
		details: serde_json::from_str(&details)?,
	})
}
