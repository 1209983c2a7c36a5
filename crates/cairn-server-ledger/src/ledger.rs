// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Snapshot-before-mutate versioning over every [`EntityRecord`].
//!
//! Every write runs in one transaction that starts by touching the parent
//! row, which takes SQLite's write lock before the next version number is
//! computed. Residual races surface as unique violations or busy errors and
//! are retried up to `ledger.max_retries` times.

use cairn_common_entity::{EntityId, EntityType, SkippedField, Snapshot, SnapshotError, UserId};
use cairn_server_config::LedgerConfig;
use cairn_server_db::{
	AuditEvent, AuditEventType, AuditRepository, EntityRecord, EntityRepository, NewVersion,
	VersionRecord, VersionRepository,
};
use serde_json::json;
use sqlx::sqlite::{SqliteConnection, SqlitePool};
use std::future::Future;
use std::sync::Arc;

use crate::error::{LedgerError, LedgerResult};
use crate::sealer::{seal_snapshot, SnapshotSealer};

pub const INITIAL_VERSION_NOTE: &str = "Initial version";

pub fn backup_note(version_number: i64) -> String {
	format!("Backup before restoring version {version_number}")
}

pub fn restored_note(version_number: i64) -> String {
	format!("Restored from version {version_number}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreOptions {
	/// Append a version of the current state before overwriting it.
	pub backup_current: bool,
}

impl Default for RestoreOptions {
	fn default() -> Self {
		Self {
			backup_current: true,
		}
	}
}

#[derive(Debug, Clone)]
pub struct RestoreOutcome<T> {
	pub entity: T,
	pub backup_version: Option<i64>,
	pub restore_version: i64,
	pub skipped_fields: Vec<SkippedField>,
}

#[derive(Debug, Clone)]
pub struct UpdateOutcome<T> {
	pub entity: T,
	/// Snapshot of the state before the update.
	pub version: VersionRecord,
}

#[derive(Clone)]
pub struct VersionLedger {
	pool: SqlitePool,
	config: LedgerConfig,
	versions: VersionRepository,
	sealer: Option<Arc<dyn SnapshotSealer>>,
}

impl VersionLedger {
	pub fn new(pool: SqlitePool, config: LedgerConfig) -> Self {
		Self {
			versions: VersionRepository::new(pool.clone()),
			pool,
			config,
			sealer: None,
		}
	}

	/// Seal sensitive fields of every snapshot this ledger writes.
	pub fn with_sealer(mut self, sealer: Arc<dyn SnapshotSealer>) -> Self {
		self.sealer = Some(sealer);
		self
	}

	pub fn config(&self) -> &LedgerConfig {
		&self.config
	}

	/// Restore options with the configured backup default.
	pub fn restore_options(&self) -> RestoreOptions {
		RestoreOptions {
			backup_current: self.config.backup_before_restore,
		}
	}

	fn stored_snapshot<T: EntityRecord>(&self, mut snapshot: Snapshot) -> LedgerResult<Snapshot> {
		if let Some(sealer) = &self.sealer {
			seal_snapshot::<T>(sealer.as_ref(), &mut snapshot).map_err(LedgerError::Seal)?;
		}
		Ok(snapshot)
	}

	async fn with_retries<R, F, Fut>(
		&self,
		entity_type: EntityType,
		entity_id: EntityId,
		mut attempt_fn: F,
	) -> LedgerResult<R>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = LedgerResult<R>>,
	{
		let max_attempts = self.config.max_retries.max(1);
		let mut attempt = 1;
		loop {
			match attempt_fn().await {
				Err(err) if err.is_transient() => {
					if attempt >= max_attempts {
						tracing::error!(
							entity_type = %entity_type,
							entity_id = %entity_id,
							attempts = attempt,
							error = %err,
							"version append kept conflicting"
						);
						return Err(LedgerError::Conflict {
							entity_type,
							entity_id,
							attempts: attempt,
						});
					}
					tracing::warn!(
						entity_type = %entity_type,
						entity_id = %entity_id,
						attempt,
						error = %err,
						"retrying after version conflict"
					);
					attempt += 1;
				}
				result => return result,
			}
		}
	}

	// =========================================================================
	// Version creation
	// =========================================================================

	/// Append a version holding the full snapshot of `entity`.
	#[tracing::instrument(skip(self, entity, note), fields(entity_type = %T::ENTITY_TYPE, entity_id = %entity.id()))]
	pub async fn create_version<T: EntityRecord>(
		&self,
		entity: &T,
		actor: Option<UserId>,
		note: Option<&str>,
	) -> LedgerResult<VersionRecord> {
		self.create_version_with(entity, actor, note, |e: &T| e.snapshot())
			.await
	}

	/// Append a version whose snapshot is produced by `snapshot_fn`.
	pub async fn create_version_with<T, F>(
		&self,
		entity: &T,
		actor: Option<UserId>,
		note: Option<&str>,
		snapshot_fn: F,
	) -> LedgerResult<VersionRecord>
	where
		T: EntityRecord,
		F: Fn(&T) -> Result<Snapshot, SnapshotError>,
	{
		let snapshot = self.stored_snapshot::<T>(snapshot_fn(entity)?)?;
		let id = entity.id();
		self.with_retries(T::ENTITY_TYPE, id, || {
			self.try_append::<T>(id, &snapshot, actor, note)
		})
		.await
	}

	async fn try_append<T: EntityRecord>(
		&self,
		id: EntityId,
		snapshot: &Snapshot,
		actor: Option<UserId>,
		note: Option<&str>,
	) -> LedgerResult<VersionRecord> {
		let mut tx = self.pool.begin().await?;
		lock_existing::<T>(&mut tx, id).await?;
		let record = append(&mut tx, T::ENTITY_TYPE, id, snapshot.clone(), actor, note).await?;
		tx.commit().await?;
		Ok(record)
	}

	/// Insert a new entity, with an "Initial version" in the same transaction
	/// when `initial_version_on_create` is enabled.
	#[tracing::instrument(skip(self, entity), fields(entity_type = %T::ENTITY_TYPE, entity_id = %entity.id()))]
	pub async fn create_tracked<T: EntityRecord>(
		&self,
		entity: T,
		actor: Option<UserId>,
	) -> LedgerResult<T> {
		let id = entity.id();
		self.with_retries(T::ENTITY_TYPE, id, || self.try_create(&entity, actor))
			.await?;
		tracing::info!(entity_type = %T::ENTITY_TYPE, entity_id = %id, "entity created");
		Ok(entity)
	}

	async fn try_create<T: EntityRecord>(&self, entity: &T, actor: Option<UserId>) -> LedgerResult<()> {
		let id = entity.id();
		let mut tx = self.pool.begin().await?;
		EntityRepository::<T>::insert_in(&mut tx, entity).await?;

		let mut details = json!({});
		if self.config.initial_version_on_create {
			let record = append(
				&mut tx,
				T::ENTITY_TYPE,
				id,
				self.stored_snapshot::<T>(entity.snapshot()?)?,
				actor,
				Some(INITIAL_VERSION_NOTE),
			)
			.await?;
			details = json!({ "version_number": record.version_number });
		}

		let event = AuditEvent::new(AuditEventType::EntityCreated)
			.actor(actor)
			.entity(T::ENTITY_TYPE, id)
			.details(details);
		AuditRepository::record_in(&mut tx, &event).await?;
		tx.commit().await?;
		Ok(())
	}

	/// Write "Initial version" for an entity that has no history yet.
	///
	/// Returns `None` when a version already exists.
	#[tracing::instrument(skip(self, entity), fields(entity_type = %T::ENTITY_TYPE, entity_id = %entity.id()))]
	pub async fn create_initial_version<T: EntityRecord>(
		&self,
		entity: &T,
		actor: Option<UserId>,
	) -> LedgerResult<Option<VersionRecord>> {
		let snapshot = self.stored_snapshot::<T>(entity.snapshot()?)?;
		let id = entity.id();
		self.with_retries(T::ENTITY_TYPE, id, || {
			self.try_initial::<T>(id, &snapshot, actor)
		})
		.await
	}

	async fn try_initial<T: EntityRecord>(
		&self,
		id: EntityId,
		snapshot: &Snapshot,
		actor: Option<UserId>,
	) -> LedgerResult<Option<VersionRecord>> {
		let mut tx = self.pool.begin().await?;
		lock_existing::<T>(&mut tx, id).await?;
		if VersionRepository::count_in(&mut tx, T::ENTITY_TYPE, id).await? > 0 {
			return Ok(None);
		}
		let record = append(
			&mut tx,
			T::ENTITY_TYPE,
			id,
			snapshot.clone(),
			actor,
			Some(INITIAL_VERSION_NOTE),
		)
		.await?;
		tx.commit().await?;
		Ok(Some(record))
	}

	// =========================================================================
	// Versioned update
	// =========================================================================

	/// Snapshot the active entity, apply `mutate`, persist. One transaction.
	///
	/// Tombstoned entities are reported as not found.
	#[tracing::instrument(skip(self, note, mutate), fields(entity_type = %T::ENTITY_TYPE, entity_id = %id))]
	pub async fn update_tracked<T, F>(
		&self,
		id: EntityId,
		actor: Option<UserId>,
		note: Option<&str>,
		mutate: F,
	) -> LedgerResult<UpdateOutcome<T>>
	where
		T: EntityRecord,
		F: Fn(&mut T),
	{
		let outcome = self
			.with_retries(T::ENTITY_TYPE, id, || {
				self.try_update(id, actor, note, &mutate)
			})
			.await?;
		tracing::info!(
			entity_type = %T::ENTITY_TYPE,
			entity_id = %id,
			version_number = outcome.version.version_number,
			"entity updated"
		);
		Ok(outcome)
	}

	async fn try_update<T, F>(
		&self,
		id: EntityId,
		actor: Option<UserId>,
		note: Option<&str>,
		mutate: &F,
	) -> LedgerResult<UpdateOutcome<T>>
	where
		T: EntityRecord,
		F: Fn(&mut T),
	{
		let mut tx = self.pool.begin().await?;
		lock_existing::<T>(&mut tx, id).await?;
		let current = EntityRepository::<T>::find_active_in(&mut tx, id)
			.await?
			.ok_or_else(|| LedgerError::not_found(T::ENTITY_TYPE, id))?;

		let snapshot = self.stored_snapshot::<T>(current.snapshot()?)?;
		let version = append(&mut tx, T::ENTITY_TYPE, id, snapshot, actor, note).await?;

		let mut entity = current;
		mutate(&mut entity);
		entity.meta_mut().touch();
		EntityRepository::<T>::update_in(&mut tx, &entity).await?;

		let event = AuditEvent::new(AuditEventType::EntityUpdated)
			.actor(actor)
			.entity(T::ENTITY_TYPE, id)
			.details(json!({
				"version_number": version.version_number,
				"change_note": note,
			}));
		AuditRepository::record_in(&mut tx, &event).await?;
		tx.commit().await?;

		Ok(UpdateOutcome { entity, version })
	}

	// =========================================================================
	// History
	// =========================================================================

	/// Every version of an entity, newest first.
	pub async fn get_versions(
		&self,
		entity_type: EntityType,
		entity_id: EntityId,
	) -> LedgerResult<Vec<VersionRecord>> {
		Ok(self.versions.list(entity_type, entity_id).await?)
	}

	pub async fn get_version(
		&self,
		entity_type: EntityType,
		entity_id: EntityId,
		version_number: i64,
	) -> LedgerResult<VersionRecord> {
		self.versions
			.get(entity_type, entity_id, version_number)
			.await?
			.ok_or(LedgerError::VersionNotFound {
				entity_type,
				entity_id,
				version_number,
			})
	}

	// =========================================================================
	// Restore
	// =========================================================================

	/// Roll an entity back to version `version_number`.
	///
	/// Managed fields are kept. Fields the entity can no longer take are
	/// skipped and returned. `seal` runs on the restored state before it is
	/// persisted. The counter never rewinds: a backup (optional) and a
	/// "Restored from version N" marker are appended.
	#[tracing::instrument(skip(self, options, seal), fields(entity_type = %T::ENTITY_TYPE, entity_id = %id))]
	pub async fn restore_version<T, S>(
		&self,
		id: EntityId,
		version_number: i64,
		actor: Option<UserId>,
		options: RestoreOptions,
		seal: S,
	) -> LedgerResult<RestoreOutcome<T>>
	where
		T: EntityRecord,
		S: Fn(&mut T) -> Result<(), String>,
	{
		let outcome = self
			.with_retries(T::ENTITY_TYPE, id, || {
				self.try_restore(id, version_number, actor, options, &seal)
			})
			.await?;
		tracing::info!(
			entity_type = %T::ENTITY_TYPE,
			entity_id = %id,
			version_number,
			restore_version = outcome.restore_version,
			skipped = outcome.skipped_fields.len(),
			"version restored"
		);
		Ok(outcome)
	}

	async fn try_restore<T, S>(
		&self,
		id: EntityId,
		version_number: i64,
		actor: Option<UserId>,
		options: RestoreOptions,
		seal: &S,
	) -> LedgerResult<RestoreOutcome<T>>
	where
		T: EntityRecord,
		S: Fn(&mut T) -> Result<(), String>,
	{
		let mut tx = self.pool.begin().await?;
		lock_existing::<T>(&mut tx, id).await?;
		let current = EntityRepository::<T>::find_all_in(&mut tx, id)
			.await?
			.ok_or_else(|| LedgerError::not_found(T::ENTITY_TYPE, id))?;
		let target = VersionRepository::get_in(&mut tx, T::ENTITY_TYPE, id, version_number)
			.await?
			.ok_or(LedgerError::VersionNotFound {
				entity_type: T::ENTITY_TYPE,
				entity_id: id,
				version_number,
			})?;

		let backup_version = if options.backup_current {
			let backup = append(
				&mut tx,
				T::ENTITY_TYPE,
				id,
				self.stored_snapshot::<T>(current.snapshot()?)?,
				actor,
				Some(&backup_note(version_number)),
			)
			.await?;
			Some(backup.version_number)
		} else {
			None
		};

		let mut entity = current;
		let skipped_fields = entity.apply_snapshot(&target.snapshot);
		for skipped in &skipped_fields {
			tracing::warn!(
				entity_type = %T::ENTITY_TYPE,
				entity_id = %id,
				version_number,
				field = %skipped.field,
				reason = %skipped.reason,
				"snapshot field not restored"
			);
		}
		seal(&mut entity).map_err(LedgerError::Seal)?;
		entity.meta_mut().touch();
		EntityRepository::<T>::update_in(&mut tx, &entity).await?;

		let marker = append(
			&mut tx,
			T::ENTITY_TYPE,
			id,
			self.stored_snapshot::<T>(entity.snapshot()?)?,
			actor,
			Some(&restored_note(version_number)),
		)
		.await?;

		let event = AuditEvent::new(AuditEventType::VersionRestored)
			.actor(actor)
			.entity(T::ENTITY_TYPE, id)
			.details(json!({
				"from_version": version_number,
				"backup_version": backup_version,
				"restore_version": marker.version_number,
				"skipped_fields": skipped_fields,
			}));
		AuditRepository::record_in(&mut tx, &event).await?;
		tx.commit().await?;

		Ok(RestoreOutcome {
			entity,
			backup_version,
			restore_version: marker.version_number,
			skipped_fields,
		})
	}
}

async fn lock_existing<T: EntityRecord>(
	conn: &mut SqliteConnection,
	id: EntityId,
) -> LedgerResult<()> {
	if EntityRepository::<T>::lock_in(conn, id).await? {
		Ok(())
	} else {
		Err(LedgerError::not_found(T::ENTITY_TYPE, id))
	}
}

async fn append(
	conn: &mut SqliteConnection,
	entity_type: EntityType,
	entity_id: EntityId,
	snapshot: Snapshot,
	actor: Option<UserId>,
	note: Option<&str>,
) -> LedgerResult<VersionRecord> {
	let record = VersionRepository::append_in(
		conn,
		NewVersion {
			entity_type,
			entity_id,
			snapshot,
			change_note: note.map(str::to_string),
			created_by: actor,
		},
	)
	.await?;
	Ok(record)
}
