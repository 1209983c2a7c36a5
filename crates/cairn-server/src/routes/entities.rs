// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! CRUD, lifecycle and history handlers shared by every entity kind.
//!
//! Each handler is generic over [`ApiEntity`] and mounted once per kind by
//! [`crate::api::create_router`].

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	Json,
};
use cairn_common_entity::EntityId;
use cairn_server_api::{
	DeletedQuery, EntityListResponse, HardDeleteResponse, ListQuery, RestoreVersionQuery,
	RestoreVersionResponse, SkippedFieldResponse, VersionListResponse, VersionResponse,
};
use cairn_server_db::{EntityRepository, ListFilter, VersionRecord};
use cairn_server_lifecycle::ScopeFilter;
use serde_json::Value;
use std::sync::Arc;

use crate::actor::RequireActor;
use crate::api::AppState;
use crate::entity_api::ApiEntity;
use crate::error::ServerError;

pub(crate) fn parse_entity_id(raw: &str) -> Result<EntityId, ServerError> {
	raw.trim()
		.parse()
		.map_err(|_| ServerError::BadRequest(format!("Invalid id: {raw}")))
}

fn parse_version_number(raw: &str) -> Result<i64, ServerError> {
	match raw.trim().parse::<i64>() {
		Ok(n) if n >= 1 => Ok(n),
		_ => Err(ServerError::BadRequest(format!(
			"Invalid version number: {raw}"
		))),
	}
}

fn parse_organization_filter(raw: Option<&str>) -> Result<Option<EntityId>, ServerError> {
	raw.filter(|v| !v.trim().is_empty())
		.map(parse_entity_id)
		.transpose()
}

fn not_found<T: ApiEntity>(id: EntityId) -> ServerError {
	ServerError::NotFound(format!("{} {id} not found", T::ENTITY_TYPE))
}

fn list_response<T: ApiEntity>(records: &[T]) -> Result<EntityListResponse, ServerError> {
	let items = records
		.iter()
		.map(T::to_response)
		.collect::<Result<Vec<Value>, _>>()?;
	Ok(EntityListResponse {
		count: items.len(),
		items,
	})
}

fn version_response<T: ApiEntity>(record: VersionRecord) -> VersionResponse {
	VersionResponse {
		id: record.id.to_string(),
		entity_type: record.entity_type.to_string(),
		entity_id: record.entity_id.to_string(),
		version_number: record.version_number,
		snapshot: record.snapshot.masked(T::SENSITIVE_FIELDS).into_value(),
		change_note: record.change_note,
		created_by: record.created_by.map(|u| u.to_string()),
		created_at: record.created_at,
	}
}

// =============================================================================
// CRUD
// =============================================================================

#[tracing::instrument(skip_all, fields(entity_type = %T::ENTITY_TYPE, actor = %actor.user_id))]
pub async fn list_entities<T: ApiEntity>(
	State(state): State<AppState>,
	RequireActor(actor): RequireActor,
	Query(query): Query<ListQuery>,
) -> Result<Json<EntityListResponse>, ServerError> {
	let filter = ListFilter {
		organization_id: parse_organization_filter(query.organization_id.as_deref())?,
		limit: query.limit,
		offset: query.offset,
	};
	let records = EntityRepository::<T>::new(state.pool.clone())
		.list_active(filter)
		.await?;
	Ok(Json(list_response(&records)?))
}

#[tracing::instrument(skip_all, fields(entity_type = %T::ENTITY_TYPE, actor = %actor.user_id))]
pub async fn create_entity<T: ApiEntity>(
	State(state): State<AppState>,
	RequireActor(actor): RequireActor,
	Json(body): Json<T::Create>,
) -> Result<(StatusCode, Json<Value>), ServerError> {
	let entity = T::from_create(body, actor.user_id, &state.cipher)?;
	let entity = state.ledger.create_tracked(entity, Some(actor.user_id)).await?;
	Ok((StatusCode::CREATED, Json(entity.to_response()?)))
}

#[tracing::instrument(skip_all, fields(entity_type = %T::ENTITY_TYPE, entity_id = %id, actor = %actor.user_id))]
pub async fn get_entity<T: ApiEntity>(
	State(state): State<AppState>,
	RequireActor(actor): RequireActor,
	Path(id): Path<String>,
) -> Result<Json<Value>, ServerError> {
	let id = parse_entity_id(&id)?;
	let entity = EntityRepository::<T>::new(state.pool.clone())
		.find_active(id)
		.await?
		.ok_or_else(|| not_found::<T>(id))?;
	Ok(Json(entity.to_response()?))
}

#[tracing::instrument(skip_all, fields(entity_type = %T::ENTITY_TYPE, entity_id = %id, actor = %actor.user_id))]
pub async fn update_entity<T: ApiEntity>(
	State(state): State<AppState>,
	RequireActor(actor): RequireActor,
	Path(id): Path<String>,
	Json(body): Json<T::Update>,
) -> Result<Json<Value>, ServerError> {
	let id = parse_entity_id(&id)?;
	let update = T::prepare_update(body, &state.cipher)?;
	let note = T::change_note(&update).map(str::to_string);
	let outcome = state
		.ledger
		.update_tracked::<T, _>(id, Some(actor.user_id), note.as_deref(), |entity: &mut T| {
			entity.apply_update(&update)
		})
		.await?;
	Ok(Json(outcome.entity.to_response()?))
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tracing::instrument(skip_all, fields(entity_type = %T::ENTITY_TYPE, entity_id = %id, actor = %actor.user_id))]
pub async fn soft_delete_entity<T: ApiEntity>(
	State(state): State<AppState>,
	RequireActor(actor): RequireActor,
	Path(id): Path<String>,
) -> Result<Json<Value>, ServerError> {
	let id = parse_entity_id(&id)?;
	let entity: T = state.lifecycle.soft_delete(id, Some(actor.user_id)).await?;
	Ok(Json(entity.to_response()?))
}

#[tracing::instrument(skip_all, fields(entity_type = %T::ENTITY_TYPE, entity_id = %id, actor = %actor.user_id))]
pub async fn restore_entity<T: ApiEntity>(
	State(state): State<AppState>,
	RequireActor(actor): RequireActor,
	Path(id): Path<String>,
) -> Result<Json<Value>, ServerError> {
	let id = parse_entity_id(&id)?;
	let entity: T = state.lifecycle.restore(id, Some(actor.user_id)).await?;
	Ok(Json(entity.to_response()?))
}

#[tracing::instrument(skip_all, fields(entity_type = %T::ENTITY_TYPE, entity_id = %id, actor = %actor.user_id))]
pub async fn hard_delete_entity<T: ApiEntity>(
	State(state): State<AppState>,
	RequireActor(actor): RequireActor,
	Path(id): Path<String>,
) -> Result<Json<HardDeleteResponse>, ServerError> {
	let id = parse_entity_id(&id)?;
	actor.require_admin()?;
	let outcome = state
		.lifecycle
		.hard_delete::<T>(id, Some(actor.user_id))
		.await?;
	Ok(Json(HardDeleteResponse {
		id: id.to_string(),
		deleted: true,
		purged_versions: outcome.purged_versions,
	}))
}

#[tracing::instrument(skip_all, fields(entity_type = %T::ENTITY_TYPE, actor = %actor.user_id))]
pub async fn list_deleted_entities<T: ApiEntity>(
	State(state): State<AppState>,
	RequireActor(actor): RequireActor,
	Query(query): Query<DeletedQuery>,
) -> Result<Json<EntityListResponse>, ServerError> {
	let scope = parse_organization_filter(query.organization_id.as_deref())?
		.map(|organization_id| ScopeFilter { organization_id });
	let records: Vec<T> = state.lifecycle.list_deleted(scope).await?;
	Ok(Json(list_response(&records)?))
}

// =============================================================================
// History
// =============================================================================

#[tracing::instrument(skip_all, fields(entity_type = %T::ENTITY_TYPE, entity_id = %id, actor = %actor.user_id))]
pub async fn list_versions<T: ApiEntity>(
	State(state): State<AppState>,
	RequireActor(actor): RequireActor,
	Path(id): Path<String>,
) -> Result<Json<VersionListResponse>, ServerError> {
	let id = parse_entity_id(&id)?;
	let versions: Vec<VersionResponse> = state
		.ledger
		.get_versions(T::ENTITY_TYPE, id)
		.await?
		.into_iter()
		.map(version_response::<T>)
		.collect();
	Ok(Json(VersionListResponse {
		count: versions.len(),
		versions,
	}))
}

#[tracing::instrument(skip_all, fields(entity_type = %T::ENTITY_TYPE, entity_id = %id, actor = %actor.user_id))]
pub async fn get_version<T: ApiEntity>(
	State(state): State<AppState>,
	RequireActor(actor): RequireActor,
	Path((id, number)): Path<(String, String)>,
) -> Result<Json<VersionResponse>, ServerError> {
	let id = parse_entity_id(&id)?;
	let number = parse_version_number(&number)?;
	let record = state.ledger.get_version(T::ENTITY_TYPE, id, number).await?;
	Ok(Json(version_response::<T>(record)))
}

#[tracing::instrument(skip_all, fields(entity_type = %T::ENTITY_TYPE, entity_id = %id, actor = %actor.user_id))]
pub async fn restore_version<T: ApiEntity>(
	State(state): State<AppState>,
	RequireActor(actor): RequireActor,
	Path((id, number)): Path<(String, String)>,
	Query(query): Query<RestoreVersionQuery>,
) -> Result<Json<RestoreVersionResponse>, ServerError> {
	let id = parse_entity_id(&id)?;
	let number = parse_version_number(&number)?;

	let mut options = state.ledger.restore_options();
	if let Some(backup_current) = query.backup_current {
		options.backup_current = backup_current;
	}

	let cipher = Arc::clone(&state.cipher);
	let outcome = state
		.ledger
		.restore_version::<T, _>(id, number, Some(actor.user_id), options, move |entity: &mut T| {
			entity.seal(&cipher).map_err(|e| e.to_string())
		})
		.await?;

	Ok(Json(RestoreVersionResponse {
		entity: outcome.entity.to_response()?,
		backup_version: outcome.backup_version,
		restore_version: outcome.restore_version,
		skipped_fields: outcome
			.skipped_fields
			.into_iter()
			.map(|s| SkippedFieldResponse {
				field: s.field,
				reason: s.reason.to_string(),
			})
			.collect(),
	}))
}
