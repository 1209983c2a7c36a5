// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Generic repository over every [`EntityRecord`] table.
//!
//! Two views are exposed as distinct methods and nothing filters implicitly:
//! - the **active** view (`find_active`, `list_active`) skips tombstoned rows
//! - the **all** view (`find_all`, `list_all`) includes them
//!
//! Each operation has a pool variant and an `_in` variant that runs on a
//! caller-supplied connection, so the ledger and lifecycle manager can group
//! several writes into one transaction.

use cairn_common_entity::{EntityId, UserId, Versionable};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqliteRow};
use std::marker::PhantomData;

use crate::codec::{format_timestamp, read_meta, META_COLUMNS};
use crate::error::DbError;
use crate::record::EntityRecord;

/// Narrowing applied to list queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListFilter {
	pub organization_id: Option<EntityId>,
	pub limit: Option<i64>,
	pub offset: Option<i64>,
}

impl ListFilter {
	pub fn for_organization(organization_id: EntityId) -> Self {
		Self {
			organization_id: Some(organization_id),
			..Default::default()
		}
	}
}

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;

pub struct EntityRepository<T> {
	pool: SqlitePool,
	_record: PhantomData<fn() -> T>,
}

impl<T> Clone for EntityRepository<T> {
	fn clone(&self) -> Self {
		Self {
			pool: self.pool.clone(),
			_record: PhantomData,
		}
	}
}

fn select_sql<T: EntityRecord>(tail: &str) -> String {
	format!(
		"SELECT {}, {} FROM {} {tail}",
		META_COLUMNS.join(", "),
		T::COLUMNS.join(", "),
		T::TABLE
	)
}

fn decode<T: EntityRecord>(row: &SqliteRow) -> Result<T, DbError> {
	let meta = read_meta(row)?;
	T::from_row(row, meta)
}

impl<T: EntityRecord> EntityRepository<T> {
	pub fn new(pool: SqlitePool) -> Self {
		Self {
			pool,
			_record: PhantomData,
		}
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	// =========================================================================
	// Reads
	// =========================================================================

	/// Get a record by id. `None` if missing or tombstoned.
	#[tracing::instrument(skip(self), fields(entity_type = %T::ENTITY_TYPE, entity_id = %id))]
	pub async fn find_active(&self, id: EntityId) -> Result<Option<T>, DbError> {
		let mut conn = self.pool.acquire().await?;
		Self::find_active_in(&mut conn, id).await
	}

	/// Get a record by id, including tombstoned ones.
	#[tracing::instrument(skip(self), fields(entity_type = %T::ENTITY_TYPE, entity_id = %id))]
	pub async fn find_all(&self, id: EntityId) -> Result<Option<T>, DbError> {
		let mut conn = self.pool.acquire().await?;
		Self::find_all_in(&mut conn, id).await
	}

	pub async fn find_active_in(
		conn: &mut SqliteConnection,
		id: EntityId,
	) -> Result<Option<T>, DbError> {
		let sql = select_sql::<T>("WHERE id = ? AND deleted_at IS NULL");
		let row = sqlx::query(&sql)
			.bind(id.to_string())
			.fetch_optional(&mut *conn)
			.await?;
		row.map(|r| decode::<T>(&r)).transpose()
	}

	pub async fn find_all_in(conn: &mut SqliteConnection, id: EntityId) -> Result<Option<T>, DbError> {
		let sql = select_sql::<T>("WHERE id = ?");
		let row = sqlx::query(&sql)
			.bind(id.to_string())
			.fetch_optional(&mut *conn)
			.await?;
		row.map(|r| decode::<T>(&r)).transpose()
	}

	/// List non-tombstoned records, oldest first.
	#[tracing::instrument(skip(self), fields(entity_type = %T::ENTITY_TYPE))]
	pub async fn list_active(&self, filter: ListFilter) -> Result<Vec<T>, DbError> {
		self.list(filter, Some("deleted_at IS NULL"), "created_at, id").await
	}

	/// List every record, tombstoned or not, oldest first.
	#[tracing::instrument(skip(self), fields(entity_type = %T::ENTITY_TYPE))]
	pub async fn list_all(&self, filter: ListFilter) -> Result<Vec<T>, DbError> {
		self.list(filter, None, "created_at, id").await
	}

	/// List every tombstoned record, most recently deleted first. Unpaged.
	#[tracing::instrument(skip(self), fields(entity_type = %T::ENTITY_TYPE))]
	pub async fn list_deleted(&self, organization_id: Option<EntityId>) -> Result<Vec<T>, DbError> {
		self.select(
			organization_id,
			Some("deleted_at IS NOT NULL"),
			"deleted_at DESC, id",
			None,
		)
		.await
	}

	async fn list(
		&self,
		filter: ListFilter,
		view: Option<&str>,
		order_by: &str,
	) -> Result<Vec<T>, DbError> {
		let limit = filter.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
		let offset = filter.offset.unwrap_or(0).max(0);
		self.select(filter.organization_id, view, order_by, Some((limit, offset)))
			.await
	}

	async fn select(
		&self,
		organization_id: Option<EntityId>,
		view: Option<&str>,
		order_by: &str,
		page: Option<(i64, i64)>,
	) -> Result<Vec<T>, DbError> {
		let mut conditions = vec!["1=1".to_string()];
		if let Some(view) = view {
			conditions.push(view.to_string());
		}
		if organization_id.is_some() {
			conditions.push(format!("{} = ?", T::ORG_SCOPE_COLUMN));
		}

		let mut clause = format!("WHERE {} ORDER BY {order_by}", conditions.join(" AND "));
		if page.is_some() {
			clause.push_str(" LIMIT ? OFFSET ?");
		}
		let sql = select_sql::<T>(&clause);
		let mut query = sqlx::query(&sql);
		if let Some(org) = organization_id {
			query = query.bind(org.to_string());
		}
		if let Some((limit, offset)) = page {
			query = query.bind(limit).bind(offset);
		}
		let rows = query.fetch_all(&self.pool).await?;

		let records = rows
			.iter()
			.map(decode::<T>)
			.collect::<Result<Vec<_>, _>>()?;
		tracing::debug!(count = records.len(), "records listed");
		Ok(records)
	}

	#[tracing::instrument(skip(self), fields(entity_type = %T::ENTITY_TYPE))]
	pub async fn count_active(&self) -> Result<i64, DbError> {
		let sql = format!(
			"SELECT COUNT(*) FROM {} WHERE deleted_at IS NULL",
			T::TABLE
		);
		let (count,): (i64,) = sqlx::query_as(&sql).fetch_one(&self.pool).await?;
		Ok(count)
	}

	#[tracing::instrument(skip(self), fields(entity_type = %T::ENTITY_TYPE))]
	pub async fn count_all(&self) -> Result<i64, DbError> {
		let sql = format!("SELECT COUNT(*) FROM {}", T::TABLE);
		let (count,): (i64,) = sqlx::query_as(&sql).fetch_one(&self.pool).await?;
		Ok(count)
	}

	/// Ids of every record, tombstoned or not, in creation order.
	pub async fn all_ids(&self) -> Result<Vec<EntityId>, DbError> {
		let sql = format!("SELECT id FROM {} ORDER BY created_at, id", T::TABLE);
		let rows: Vec<(String,)> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
		rows.iter()
			.map(|(id,)| crate::codec::parse_id(id, "id"))
			.collect()
	}

	// =========================================================================
	// Writes
	// =========================================================================

	#[tracing::instrument(skip(self, record), fields(entity_type = %T::ENTITY_TYPE, entity_id = %record.id()))]
	pub async fn insert(&self, record: &T) -> Result<(), DbError> {
		let mut conn = self.pool.acquire().await?;
		Self::insert_in(&mut conn, record).await
	}

	pub async fn insert_in(conn: &mut SqliteConnection, record: &T) -> Result<(), DbError> {
		let columns: Vec<&str> = META_COLUMNS.iter().chain(T::COLUMNS).copied().collect();
		let placeholders = vec!["?"; columns.len()].join(", ");
		let sql = format!(
			"INSERT INTO {} ({}) VALUES ({placeholders})",
			T::TABLE,
			columns.join(", ")
		);

		let meta = record.meta();
		let query = sqlx::query(&sql)
			.bind(meta.id.to_string())
			.bind(meta.created_by.map(|u| u.to_string()))
			.bind(format_timestamp(meta.created_at))
			.bind(format_timestamp(meta.updated_at))
			.bind(meta.deleted_at().map(format_timestamp))
			.bind(meta.deleted_by().map(|u| u.to_string()));
		record.bind_columns(query).execute(&mut *conn).await?;

		tracing::debug!(entity_type = %T::ENTITY_TYPE, entity_id = %meta.id, "record inserted");
		Ok(())
	}

	/// Persist the domain columns and `updated_at` of an existing row.
	///
	/// Identity and tombstone columns are never written here.
	pub async fn update_in(conn: &mut SqliteConnection, record: &T) -> Result<(), DbError> {
		let assignments: Vec<String> = T::COLUMNS.iter().map(|c| format!("{c} = ?")).collect();
		let sql = format!(
			"UPDATE {} SET updated_at = ?, {} WHERE id = ?",
			T::TABLE,
			assignments.join(", ")
		);

		let meta = record.meta();
		let query = sqlx::query(&sql).bind(format_timestamp(meta.updated_at));
		let result = record
			.bind_columns(query)
			.bind(meta.id.to_string())
			.execute(&mut *conn)
			.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("{} {}", T::ENTITY_TYPE, meta.id)));
		}
		tracing::debug!(entity_type = %T::ENTITY_TYPE, entity_id = %meta.id, "record updated");
		Ok(())
	}

	/// Take SQLite's write lock for the rest of the transaction by touching
	/// the row. Returns whether the row exists.
	pub async fn lock_in(conn: &mut SqliteConnection, id: EntityId) -> Result<bool, DbError> {
		let sql = format!(
			"UPDATE {} SET updated_at = updated_at WHERE id = ?",
			T::TABLE
		);
		let result = sqlx::query(&sql)
			.bind(id.to_string())
			.execute(&mut *conn)
			.await?;
		Ok(result.rows_affected() > 0)
	}

	/// Write both tombstone columns and `updated_at`. Returns rows affected.
	pub async fn set_tombstone_in(
		conn: &mut SqliteConnection,
		id: EntityId,
		deleted_at: DateTime<Utc>,
		deleted_by: Option<UserId>,
	) -> Result<u64, DbError> {
		let sql = format!(
			"UPDATE {} SET deleted_at = ?, deleted_by = ?, updated_at = ? WHERE id = ?",
			T::TABLE
		);
		let at = format_timestamp(deleted_at);
		let result = sqlx::query(&sql)
			.bind(&at)
			.bind(deleted_by.map(|u| u.to_string()))
			.bind(&at)
			.bind(id.to_string())
			.execute(&mut *conn)
			.await?;
		Ok(result.rows_affected())
	}

	/// Clear both tombstone columns and bump `updated_at`. Returns rows affected.
	pub async fn clear_tombstone_in(
		conn: &mut SqliteConnection,
		id: EntityId,
		at: DateTime<Utc>,
	) -> Result<u64, DbError> {
		let sql = format!(
			"UPDATE {} SET deleted_at = NULL, deleted_by = NULL, updated_at = ? WHERE id = ?",
			T::TABLE
		);
		let result = sqlx::query(&sql)
			.bind(format_timestamp(at))
			.bind(id.to_string())
			.execute(&mut *conn)
			.await?;
		Ok(result.rows_affected())
	}

	/// Physically remove the row. Returns rows affected.
	pub async fn delete_in(conn: &mut SqliteConnection, id: EntityId) -> Result<u64, DbError> {
		let sql = format!("DELETE FROM {} WHERE id = ?", T::TABLE);
		let result = sqlx::query(&sql)
			.bind(id.to_string())
			.execute(&mut *conn)
			.await?;
		Ok(result.rows_affected())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::create_test_pool;
	use cairn_common_entity::{
		Configuration, ConfigurationKind, Organization, PasswordEntry,
	};

	async fn org_repo() -> EntityRepository<Organization> {
		EntityRepository::new(create_test_pool().await.unwrap())
	}

	#[tokio::test]
	async fn insert_then_find_round_trips() {
		let repo = org_repo().await;
		let mut org = Organization::new("Acme", Some(UserId::generate()));
		org.description = Some("Managed since 2019".to_string());
		repo.insert(&org).await.unwrap();

		let found = repo.find_active(org.id()).await.unwrap().unwrap();
		assert_eq!(found, org);
	}

	#[tokio::test]
	async fn active_view_excludes_tombstoned_rows() {
		let repo = org_repo().await;
		let orgs: Vec<Organization> = ["a", "b", "c"]
			.iter()
			.map(|n| Organization::new(*n, None))
			.collect();
		for org in &orgs {
			repo.insert(org).await.unwrap();
		}

		let mut conn = repo.pool().acquire().await.unwrap();
		let affected = EntityRepository::<Organization>::set_tombstone_in(
			&mut conn,
			orgs[1].id(),
			Utc::now(),
			Some(UserId::generate()),
		)
		.await
		.unwrap();
		drop(conn);
		assert_eq!(affected, 1);

		assert_eq!(repo.list_active(ListFilter::default()).await.unwrap().len(), 2);
		assert_eq!(repo.list_all(ListFilter::default()).await.unwrap().len(), 3);
		assert_eq!(repo.count_active().await.unwrap(), 2);
		assert_eq!(repo.count_all().await.unwrap(), 3);
		assert!(repo.find_active(orgs[1].id()).await.unwrap().is_none());
		assert!(repo.find_all(orgs[1].id()).await.unwrap().unwrap().meta.is_deleted());
	}

	#[tokio::test]
	async fn update_writes_domain_columns_only() {
		let repo = org_repo().await;
		let org = Organization::new("Acme", None);
		repo.insert(&org).await.unwrap();

		let mut conn = repo.pool().acquire().await.unwrap();
		EntityRepository::<Organization>::set_tombstone_in(&mut conn, org.id(), Utc::now(), None)
			.await
			.unwrap();

		let mut stale = org.clone();
		stale.name = "Acme Corp".to_string();
		stale.meta.touch();
		EntityRepository::<Organization>::update_in(&mut conn, &stale)
			.await
			.unwrap();
		drop(conn);

		let stored = repo.find_all(org.id()).await.unwrap().unwrap();
		assert_eq!(stored.name, "Acme Corp");
		assert!(stored.meta.is_deleted());
	}

	#[tokio::test]
	async fn update_of_missing_row_is_not_found() {
		let repo = org_repo().await;
		let org = Organization::new("Ghost", None);
		let mut conn = repo.pool().acquire().await.unwrap();
		let result = EntityRepository::<Organization>::update_in(&mut conn, &org).await;
		assert!(matches!(result, Err(DbError::NotFound(_))));
	}

	#[tokio::test]
	async fn list_filters_by_organization_scope() {
		let pool = create_test_pool().await.unwrap();
		let repo = EntityRepository::<PasswordEntry>::new(pool);
		let acme = EntityId::generate();
		let globex = EntityId::generate();
		for org in [acme, acme, globex] {
			repo.insert(&PasswordEntry::new(org, "admin", None))
				.await
				.unwrap();
		}

		let scoped = repo
			.list_active(ListFilter::for_organization(acme))
			.await
			.unwrap();
		assert_eq!(scoped.len(), 2);
		assert!(scoped.iter().all(|e| e.organization_id == acme));
	}

	#[tokio::test]
	async fn list_deleted_is_newest_deletion_first() {
		let repo = org_repo().await;
		let first = Organization::new("first", None);
		let second = Organization::new("second", None);
		repo.insert(&first).await.unwrap();
		repo.insert(&second).await.unwrap();

		let mut conn = repo.pool().acquire().await.unwrap();
		let earlier = Utc::now() - chrono::Duration::minutes(5);
		EntityRepository::<Organization>::set_tombstone_in(&mut conn, first.id(), earlier, None)
			.await
			.unwrap();
		EntityRepository::<Organization>::set_tombstone_in(&mut conn, second.id(), Utc::now(), None)
			.await
			.unwrap();
		drop(conn);

		let deleted = repo.list_deleted(None).await.unwrap();
		let names: Vec<&str> = deleted.iter().map(|o| o.name.as_str()).collect();
		assert_eq!(names, vec!["second", "first"]);
	}

	#[tokio::test]
	async fn list_deleted_returns_more_than_one_page() {
		let repo = org_repo().await;
		let total = MAX_LIMIT as usize + 5;
		let mut tx = repo.pool().begin().await.unwrap();
		for n in 0..total {
			let org = Organization::new(format!("org-{n}"), None);
			EntityRepository::<Organization>::insert_in(&mut tx, &org)
				.await
				.unwrap();
			EntityRepository::<Organization>::set_tombstone_in(&mut tx, org.id(), Utc::now(), None)
				.await
				.unwrap();
		}
		tx.commit().await.unwrap();

		let deleted = repo.list_deleted(None).await.unwrap();
		assert_eq!(deleted.len(), total);
		let first_page = repo.list_all(ListFilter::default()).await.unwrap();
		assert_eq!(first_page.len(), DEFAULT_LIMIT as usize);
	}

	#[tokio::test]
	async fn configuration_kind_and_location_survive_storage() {
		let pool = create_test_pool().await.unwrap();
		let repo = EntityRepository::<Configuration>::new(pool);
		let mut config = Configuration::new(
			EntityId::generate(),
			"fw-01",
			ConfigurationKind::NetworkDevice,
			None,
		);
		config.location_id = Some(EntityId::generate());
		repo.insert(&config).await.unwrap();

		let stored = repo.find_active(config.id()).await.unwrap().unwrap();
		assert_eq!(stored.kind, ConfigurationKind::NetworkDevice);
		assert_eq!(stored.location_id, config.location_id);
	}

	#[tokio::test]
	async fn delete_removes_row_from_both_views() {
		let repo = org_repo().await;
		let org = Organization::new("Acme", None);
		repo.insert(&org).await.unwrap();

		let mut conn = repo.pool().acquire().await.unwrap();
		let affected = EntityRepository::<Organization>::delete_in(&mut conn, org.id())
			.await
			.unwrap();
		let again = EntityRepository::<Organization>::delete_in(&mut conn, org.id())
			.await
			.unwrap();
		drop(conn);

		assert_eq!((affected, again), (1, 0));
		assert!(repo.find_all(org.id()).await.unwrap().is_none());
	}
}
