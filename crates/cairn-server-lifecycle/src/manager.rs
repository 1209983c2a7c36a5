// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Reversible tombstones with actor attribution.
//!
//! Soft delete writes only the tombstone pair and `updated_at`. Restore
//! clears the pair. Hard delete removes the row and, when configured, the
//! entity's version history. Version records are otherwise left alone.

use cairn_common_entity::{EntityId, UserId};
use cairn_server_config::LifecycleConfig;
use cairn_server_db::{
	AuditEvent, AuditEventType, AuditRepository, EntityRecord, EntityRepository,
	VersionRepository,
};
use chrono::Utc;
use serde_json::json;
use sqlx::sqlite::SqlitePool;

use crate::error::{LifecycleError, LifecycleResult};

/// Narrows [`LifecycleManager::list_deleted`] to one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeFilter {
	pub organization_id: EntityId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardDeleteOutcome {
	pub purged_versions: u64,
}

#[derive(Clone)]
pub struct LifecycleManager {
	pool: SqlitePool,
	config: LifecycleConfig,
}

impl LifecycleManager {
	pub fn new(pool: SqlitePool, config: LifecycleConfig) -> Self {
		Self { pool, config }
	}

	pub fn config(&self) -> &LifecycleConfig {
		&self.config
	}

	/// Tombstone a record. Deleting again overwrites the tombstone.
	#[tracing::instrument(skip(self), fields(entity_type = %T::ENTITY_TYPE, entity_id = %id))]
	pub async fn soft_delete<T: EntityRecord>(
		&self,
		id: EntityId,
		actor: Option<UserId>,
	) -> LifecycleResult<T> {
		let now = Utc::now();
		let mut tx = self.pool.begin().await?;

		if !EntityRepository::<T>::lock_in(&mut tx, id).await? {
			return Err(LifecycleError::NotFound {
				entity_type: T::ENTITY_TYPE,
				entity_id: id,
			});
		}
		let previous = EntityRepository::<T>::find_all_in(&mut tx, id)
			.await?
			.ok_or(LifecycleError::NotFound {
				entity_type: T::ENTITY_TYPE,
				entity_id: id,
			})?;
		EntityRepository::<T>::set_tombstone_in(&mut tx, id, now, actor).await?;

		let event = AuditEvent::new(AuditEventType::EntitySoftDeleted)
			.actor(actor)
			.entity(T::ENTITY_TYPE, id)
			.details(json!({
				"previous_deleted_at": previous.meta().deleted_at(),
				"previous_deleted_by": previous.meta().deleted_by(),
			}));
		AuditRepository::record_in(&mut tx, &event).await?;
		tx.commit().await?;

		let mut entity = previous;
		entity.meta_mut().set_tombstone(now, actor);
		tracing::info!(
			entity_type = %T::ENTITY_TYPE,
			entity_id = %id,
			actor = ?actor,
			"entity soft deleted"
		);
		Ok(entity)
	}

	/// Clear a record's tombstone.
	#[tracing::instrument(skip(self), fields(entity_type = %T::ENTITY_TYPE, entity_id = %id))]
	pub async fn restore<T: EntityRecord>(
		&self,
		id: EntityId,
		actor: Option<UserId>,
	) -> LifecycleResult<T> {
		let now = Utc::now();
		let mut tx = self.pool.begin().await?;

		if !EntityRepository::<T>::lock_in(&mut tx, id).await? {
			return Err(LifecycleError::NotFound {
				entity_type: T::ENTITY_TYPE,
				entity_id: id,
			});
		}
		let mut entity = EntityRepository::<T>::find_all_in(&mut tx, id)
			.await?
			.ok_or(LifecycleError::NotFound {
				entity_type: T::ENTITY_TYPE,
				entity_id: id,
			})?;
		let Some(tombstone) = entity.meta().tombstone().copied() else {
			return Err(LifecycleError::NotDeleted {
				entity_type: T::ENTITY_TYPE,
				entity_id: id,
			});
		};

		EntityRepository::<T>::clear_tombstone_in(&mut tx, id, now).await?;
		let event = AuditEvent::new(AuditEventType::EntityRestored)
			.actor(actor)
			.entity(T::ENTITY_TYPE, id)
			.details(json!({
				"deleted_at": tombstone.deleted_at,
				"deleted_by": tombstone.deleted_by,
			}));
		AuditRepository::record_in(&mut tx, &event).await?;
		tx.commit().await?;

		entity.meta_mut().clear_tombstone(now);
		tracing::info!(
			entity_type = %T::ENTITY_TYPE,
			entity_id = %id,
			actor = ?actor,
			"entity restored"
		);
		Ok(entity)
	}

	/// Remove a record physically. Performs no authorization.
	#[tracing::instrument(skip(self), fields(entity_type = %T::ENTITY_TYPE, entity_id = %id))]
	pub async fn hard_delete<T: EntityRecord>(
		&self,
		id: EntityId,
		actor: Option<UserId>,
	) -> LifecycleResult<HardDeleteOutcome> {
		let mut tx = self.pool.begin().await?;

		if EntityRepository::<T>::delete_in(&mut tx, id).await? == 0 {
			return Err(LifecycleError::NotFound {
				entity_type: T::ENTITY_TYPE,
				entity_id: id,
			});
		}
		let purged_versions = if self.config.purge_versions_on_hard_delete {
			VersionRepository::purge_in(&mut tx, T::ENTITY_TYPE, id).await?
		} else {
			0
		};

		let event = AuditEvent::new(AuditEventType::EntityHardDeleted)
			.actor(actor)
			.entity(T::ENTITY_TYPE, id)
			.details(json!({ "purged_versions": purged_versions }));
		AuditRepository::record_in(&mut tx, &event).await?;
		tx.commit().await?;

		tracing::info!(
			entity_type = %T::ENTITY_TYPE,
			entity_id = %id,
			actor = ?actor,
			purged_versions,
			"entity hard deleted"
		);
		Ok(HardDeleteOutcome { purged_versions })
	}

	/// Every tombstoned record, most recently deleted first.
	#[tracing::instrument(skip(self), fields(entity_type = %T::ENTITY_TYPE))]
	pub async fn list_deleted<T: EntityRecord>(
		&self,
		scope: Option<ScopeFilter>,
	) -> LifecycleResult<Vec<T>> {
		let repo = EntityRepository::<T>::new(self.pool.clone());
		Ok(repo
			.list_deleted(scope.map(|s| s.organization_id))
			.await?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use cairn_common_entity::{Contact, EntityType, Organization, Versionable};
	use cairn_server_db::testing::create_test_pool;
	use cairn_server_db::{ListFilter, NewVersion};

	async fn setup(config: LifecycleConfig) -> (LifecycleManager, EntityRepository<Organization>) {
		let pool = create_test_pool().await.unwrap();
		(
			LifecycleManager::new(pool.clone(), config),
			EntityRepository::new(pool),
		)
	}

	async fn add_version(pool: &SqlitePool, org: &Organization) {
		let mut conn = pool.acquire().await.unwrap();
		VersionRepository::append_in(
			&mut conn,
			NewVersion {
				entity_type: EntityType::Organization,
				entity_id: org.id(),
				snapshot: org.snapshot().unwrap(),
				change_note: None,
				created_by: None,
			},
		)
		.await
		.unwrap();
	}

	#[tokio::test]
	async fn soft_delete_then_restore_round_trips() {
		let (manager, repo) = setup(LifecycleConfig::default()).await;
		let actor = UserId::generate();
		let org = Organization::new("Acme", None);
		repo.insert(&org).await.unwrap();

		let deleted: Organization = manager.soft_delete(org.id(), Some(actor)).await.unwrap();
		assert!(deleted.meta.is_deleted());
		assert_eq!(deleted.meta.deleted_by(), Some(actor));
		let stored = repo.find_all(org.id()).await.unwrap().unwrap();
		assert_eq!(stored.meta.deleted_by(), Some(actor));
		assert!(repo.find_active(org.id()).await.unwrap().is_none());

		let restored: Organization = manager.restore(org.id(), Some(actor)).await.unwrap();
		assert!(!restored.meta.is_deleted());
		let stored = repo.find_active(org.id()).await.unwrap().unwrap();
		assert_eq!(stored.name, org.name);
		assert_eq!(stored.meta.deleted_at(), None);
		assert_eq!(stored.meta.deleted_by(), None);
	}

	#[tokio::test]
	async fn soft_delete_writes_only_tombstone_columns() {
		let (manager, repo) = setup(LifecycleConfig::default()).await;
		let org = Organization::new("Acme", Some(UserId::generate()));
		repo.insert(&org).await.unwrap();

		manager
			.soft_delete::<Organization>(org.id(), None)
			.await
			.unwrap();

		let stored = repo.find_all(org.id()).await.unwrap().unwrap();
		assert_eq!(stored.name, org.name);
		assert_eq!(stored.meta.created_by, org.meta.created_by);
		assert_eq!(stored.meta.created_at, org.meta.created_at);
		assert!(stored.meta.updated_at >= org.meta.updated_at);
		assert_eq!(stored.meta.deleted_by(), None);
		assert!(stored.meta.is_deleted());
	}

	#[tokio::test]
	async fn deleting_twice_keeps_the_newest_tombstone() {
		let (manager, repo) = setup(LifecycleConfig::default()).await;
		let first_actor = UserId::generate();
		let second_actor = UserId::generate();
		let org = Organization::new("Acme", None);
		repo.insert(&org).await.unwrap();

		let first: Organization = manager
			.soft_delete(org.id(), Some(first_actor))
			.await
			.unwrap();
		let second: Organization = manager
			.soft_delete(org.id(), Some(second_actor))
			.await
			.unwrap();

		assert!(second.meta.deleted_at() >= first.meta.deleted_at());
		let stored = repo.find_all(org.id()).await.unwrap().unwrap();
		assert_eq!(stored.meta.deleted_by(), Some(second_actor));
	}

	#[tokio::test]
	async fn restore_of_live_record_is_not_deleted() {
		let (manager, repo) = setup(LifecycleConfig::default()).await;
		let org = Organization::new("Acme", None);
		repo.insert(&org).await.unwrap();

		let result = manager.restore::<Organization>(org.id(), None).await;
		assert!(matches!(result, Err(LifecycleError::NotDeleted { .. })));
	}

	#[tokio::test]
	async fn missing_rows_are_not_found() {
		let (manager, _) = setup(LifecycleConfig::default()).await;
		let id = EntityId::generate();
		assert!(matches!(
			manager.soft_delete::<Contact>(id, None).await,
			Err(LifecycleError::NotFound { .. })
		));
		assert!(matches!(
			manager.restore::<Contact>(id, None).await,
			Err(LifecycleError::NotFound { .. })
		));
		assert!(matches!(
			manager.hard_delete::<Contact>(id, None).await,
			Err(LifecycleError::NotFound { .. })
		));
	}

	#[tokio::test]
	async fn hard_delete_is_irreversible_and_keeps_history_by_default() {
		let (manager, repo) = setup(LifecycleConfig::default()).await;
		let org = Organization::new("Acme", None);
		repo.insert(&org).await.unwrap();
		add_version(repo.pool(), &org).await;

		let outcome = manager
			.hard_delete::<Organization>(org.id(), None)
			.await
			.unwrap();
		assert_eq!(outcome.purged_versions, 0);

		assert!(repo.find_all(org.id()).await.unwrap().is_none());
		assert!(matches!(
			manager.restore::<Organization>(org.id(), None).await,
			Err(LifecycleError::NotFound { .. })
		));
		let mut conn = repo.pool().acquire().await.unwrap();
		let remaining = VersionRepository::count_in(&mut conn, EntityType::Organization, org.id())
			.await
			.unwrap();
		assert_eq!(remaining, 1);
	}

	#[tokio::test]
	async fn hard_delete_purges_history_when_configured() {
		let (manager, repo) = setup(LifecycleConfig {
			purge_versions_on_hard_delete: true,
		})
		.await;
		let org = Organization::new("Acme", None);
		repo.insert(&org).await.unwrap();
		add_version(repo.pool(), &org).await;
		add_version(repo.pool(), &org).await;

		let outcome = manager
			.hard_delete::<Organization>(org.id(), None)
			.await
			.unwrap();
		assert_eq!(outcome.purged_versions, 2);
	}

	#[tokio::test]
	async fn active_view_hides_deleted_records() {
		let (manager, repo) = setup(LifecycleConfig::default()).await;
		let orgs: Vec<Organization> = ["a", "b", "c"]
			.iter()
			.map(|n| Organization::new(*n, None))
			.collect();
		for org in &orgs {
			repo.insert(org).await.unwrap();
		}
		manager
			.soft_delete::<Organization>(orgs[0].id(), None)
			.await
			.unwrap();

		assert_eq!(repo.list_active(ListFilter::default()).await.unwrap().len(), 2);
		assert_eq!(repo.list_all(ListFilter::default()).await.unwrap().len(), 3);
	}

	#[tokio::test]
	async fn list_deleted_is_scoped_and_newest_first() {
		let pool = create_test_pool().await.unwrap();
		let manager = LifecycleManager::new(pool.clone(), LifecycleConfig::default());
		let contacts = EntityRepository::<Contact>::new(pool);
		let acme = EntityId::generate();
		let globex = EntityId::generate();

		let older = Contact::new(acme, "Ada", "Lovelace", None);
		let newer = Contact::new(acme, "Grace", "Hopper", None);
		let other = Contact::new(globex, "Alan", "Turing", None);
		for contact in [&older, &newer, &other] {
			contacts.insert(contact).await.unwrap();
		}
		for contact in [&older, &newer, &other] {
			manager
				.soft_delete::<Contact>(contact.id(), None)
				.await
				.unwrap();
		}

		let scoped: Vec<Contact> = manager
			.list_deleted(Some(ScopeFilter {
				organization_id: acme,
			}))
			.await
			.unwrap();
		let names: Vec<&str> = scoped.iter().map(|c| c.first_name.as_str()).collect();
		assert_eq!(names, vec!["Grace", "Ada"]);

		let all: Vec<Contact> = manager.list_deleted(None).await.unwrap();
		assert_eq!(all.len(), 3);
	}

	#[tokio::test]
	async fn list_deleted_reaches_past_a_thousand_tombstones() {
		let (manager, repo) = setup(LifecycleConfig::default()).await;
		let mut tx = repo.pool().begin().await.unwrap();
		let mut ids = Vec::new();
		for n in 0..1005 {
			let org = Organization::new(format!("org-{n}"), None);
			EntityRepository::<Organization>::insert_in(&mut tx, &org)
				.await
				.unwrap();
			ids.push(org.id());
		}
		tx.commit().await.unwrap();
		for id in &ids {
			manager.soft_delete::<Organization>(*id, None).await.unwrap();
		}

		let deleted: Vec<Organization> = manager.list_deleted(None).await.unwrap();
		assert_eq!(deleted.len(), 1005);

		let oldest = deleted.last().unwrap().id();
		manager.restore::<Organization>(oldest, None).await.unwrap();
		let remaining: Vec<Organization> = manager.list_deleted(None).await.unwrap();
		assert_eq!(remaining.len(), 1004);
	}

	#[tokio::test]
	async fn transitions_are_audited() {
		let (manager, repo) = setup(LifecycleConfig::default()).await;
		let actor = UserId::generate();
		let org = Organization::new("Acme", None);
		repo.insert(&org).await.unwrap();

		manager
			.soft_delete::<Organization>(org.id(), Some(actor))
			.await
			.unwrap();
		manager
			.restore::<Organization>(org.id(), Some(actor))
			.await
			.unwrap();
		manager
			.hard_delete::<Organization>(org.id(), Some(actor))
			.await
			.unwrap();

		let events = AuditRepository::new(repo.pool().clone())
			.list_for_entity(EntityType::Organization, org.id())
			.await
			.unwrap();
		let kinds: Vec<AuditEventType> = events.iter().map(|e| e.event_type).collect();
		assert_eq!(
			kinds,
			vec![
				AuditEventType::EntitySoftDeleted,
				AuditEventType::EntityRestored,
				AuditEventType::EntityHardDeleted,
			]
		);
		assert!(events.iter().all(|e| e.actor_user_id == Some(actor)));
		assert_eq!(events[1].details["deleted_by"], json!(actor));
	}
}
