// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Offline maintenance commands run by the binary instead of serving.

use cairn_common_entity::{
	Configuration, Contact, Documentation, EntityId, Location, Organization, PasswordEntry,
	Versionable,
};
use cairn_server_cipher::SecretCipher;
use cairn_server_db::{
	AuditEvent, AuditEventType, AuditRepository, CredentialRepository, DbError, EntityRecord,
	EntityRepository, VersionRepository,
};
use cairn_server_ledger::{LedgerError, VersionLedger};
use serde_json::json;
use sqlx::SqlitePool;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
	#[error("database error: {0}")]
	Db(#[from] DbError),

	#[error("ledger error: {0}")]
	Ledger(#[from] LedgerError),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationReport {
	/// Plaintext values sealed by this run.
	pub encrypted: usize,
	/// Tagged values that decrypted successfully.
	pub verified: usize,
	/// History snapshots whose plaintext credential was sealed.
	pub sealed_versions: usize,
	/// Entries that could not be sealed or do not decrypt.
	pub failed: Vec<EntityId>,
	/// Entries changed by someone else mid-run.
	pub skipped: usize,
}

impl MigrationReport {
	pub fn is_success(&self) -> bool {
		self.failed.is_empty()
	}
}

/// Seal every plaintext credential and verify every sealed one, then seal
/// plaintext credentials left in password entry history.
///
/// Tombstoned entries are included. A failure on one entry is logged and the
/// run continues; the caller decides what a non-empty `failed` list means.
#[tracing::instrument(skip_all)]
pub async fn migrate_credentials(
	pool: &SqlitePool,
	cipher: &SecretCipher,
) -> Result<MigrationReport, CommandError> {
	let credentials = CredentialRepository::new(pool.clone());
	let mut report = MigrationReport::default();

	for stored in credentials.list_stored().await? {
		if cipher.is_encrypted(&stored.value) {
			match cipher.decrypt(&stored.value) {
				Ok(_) => report.verified += 1,
				Err(e) => {
					tracing::error!(entity_id = %stored.id, error = %e, "stored credential does not decrypt");
					report.failed.push(stored.id);
				}
			}
			continue;
		}

		let sealed = match cipher.encrypt(&stored.value) {
			Ok(sealed) => sealed,
			Err(e) => {
				tracing::error!(entity_id = %stored.id, error = %e, "credential could not be sealed");
				report.failed.push(stored.id);
				continue;
			}
		};
		if credentials.replace(stored.id, &stored.value, &sealed).await? {
			report.encrypted += 1;
		} else {
			tracing::warn!(entity_id = %stored.id, "credential changed during migration, skipped");
			report.skipped += 1;
		}
	}

	seal_history(pool, cipher, &mut report).await?;

	let event = AuditEvent::new(AuditEventType::CredentialsMigrated).details(json!({
		"encrypted": report.encrypted,
		"verified": report.verified,
		"sealed_versions": report.sealed_versions,
		"failed": report.failed,
		"skipped": report.skipped,
	}));
	AuditRepository::new(pool.clone()).record(&event).await?;

	tracing::info!(
		encrypted = report.encrypted,
		verified = report.verified,
		sealed_versions = report.sealed_versions,
		failed = report.failed.len(),
		skipped = report.skipped,
		"credential migration finished"
	);
	Ok(report)
}

/// Only the sensitive fields change; numbers, notes and authors stay put.
async fn seal_history(
	pool: &SqlitePool,
	cipher: &SecretCipher,
	report: &mut MigrationReport,
) -> Result<(), CommandError> {
	let versions = VersionRepository::new(pool.clone());
	for record in versions.list_for_type(PasswordEntry::ENTITY_TYPE).await? {
		let mut sealed = record.snapshot.clone();
		let outcome = sealed.seal_fields(PasswordEntry::SENSITIVE_FIELDS, |value| {
			if cipher.is_encrypted(value) {
				Ok(value.to_string())
			} else {
				cipher.encrypt(value)
			}
		});
		if let Err(e) = outcome {
			tracing::error!(
				entity_id = %record.entity_id,
				version_number = record.version_number,
				error = %e,
				"version snapshot could not be sealed"
			);
			report.failed.push(record.entity_id);
			continue;
		}
		if sealed == record.snapshot {
			continue;
		}
		if versions.reseal(record.id, &record.snapshot, &sealed).await? {
			report.sealed_versions += 1;
		} else {
			tracing::warn!(
				entity_id = %record.entity_id,
				version_number = record.version_number,
				"version snapshot changed during migration, skipped"
			);
			report.skipped += 1;
		}
	}
	Ok(())
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BackfillReport {
	pub created: usize,
	pub already_versioned: usize,
}

/// Write "Initial version" for every record, tombstoned or not, that has no
/// history yet.
#[tracing::instrument(skip_all)]
pub async fn backfill_versions(
	pool: &SqlitePool,
	ledger: &VersionLedger,
) -> Result<BackfillReport, CommandError> {
	let mut report = BackfillReport::default();
	backfill_kind::<Organization>(pool, ledger, &mut report).await?;
	backfill_kind::<Location>(pool, ledger, &mut report).await?;
	backfill_kind::<Contact>(pool, ledger, &mut report).await?;
	backfill_kind::<Configuration>(pool, ledger, &mut report).await?;
	backfill_kind::<PasswordEntry>(pool, ledger, &mut report).await?;
	backfill_kind::<Documentation>(pool, ledger, &mut report).await?;

	tracing::info!(
		created = report.created,
		already_versioned = report.already_versioned,
		"version backfill finished"
	);
	Ok(report)
}

async fn backfill_kind<T: EntityRecord>(
	pool: &SqlitePool,
	ledger: &VersionLedger,
	report: &mut BackfillReport,
) -> Result<(), CommandError> {
	let repo = EntityRepository::<T>::new(pool.clone());
	let ids = repo.all_ids().await?;
	let mut created = 0;
	for id in &ids {
		let Some(record) = repo.find_all(*id).await? else {
			tracing::debug!(entity_type = %T::ENTITY_TYPE, entity_id = %id, "record removed during backfill");
			continue;
		};
		match ledger.create_initial_version(&record, None).await? {
			Some(_) => created += 1,
			None => report.already_versioned += 1,
		}
	}
	report.created += created;
	tracing::debug!(entity_type = %T::ENTITY_TYPE, scanned = ids.len(), created, "backfilled");
	Ok(())
}
