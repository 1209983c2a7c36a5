// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{
	extract::{Path, State},
	Json,
};
use cairn_common_entity::{PasswordEntry, Versionable};
use cairn_server_api::{ErrorResponse, RevealPasswordResponse};
use cairn_server_db::{AuditEvent, AuditEventType, EntityRepository};
use serde_json::json;

use crate::actor::RequireActor;
use crate::api::AppState;
use crate::error::ServerError;
use crate::routes::entities::parse_entity_id;

#[utoipa::path(
	post,
	path = "/api/passwords/{id}/reveal",
	params(
		("id" = String, Path, description = "Password entry ID")
	),
	responses(
		(status = 200, description = "Decrypted credential", body = RevealPasswordResponse),
		(status = 400, description = "Invalid ID", body = ErrorResponse),
		(status = 401, description = "Missing actor", body = ErrorResponse),
		(status = 404, description = "Password entry not found", body = ErrorResponse),
		(status = 500, description = "Stored credential cannot be decrypted", body = ErrorResponse)
	),
	tag = "passwords"
)]
/// Reveal the plaintext credential of an active password entry.
///
/// Every attempt is audited, including ones where the stored value cannot
/// be decrypted. A failed decryption never returns the stored value.
#[tracing::instrument(skip_all, fields(entity_id = %id, actor = %actor.user_id))]
pub async fn reveal_password(
	State(state): State<AppState>,
	RequireActor(actor): RequireActor,
	Path(id): Path<String>,
) -> Result<Json<RevealPasswordResponse>, ServerError> {
	let id = parse_entity_id(&id)?;
	let entry = EntityRepository::<PasswordEntry>::new(state.pool.clone())
		.find_active(id)
		.await?
		.ok_or_else(|| ServerError::NotFound(format!("password entry {id} not found")))?;

	match state.cipher.decrypt_opt(entry.password.as_deref()) {
		Ok(password) => {
			let event = AuditEvent::new(AuditEventType::CredentialRevealed)
				.actor(Some(actor.user_id))
				.entity(PasswordEntry::ENTITY_TYPE, id);
			state.audit.record(&event).await?;
			tracing::info!(entity_id = %id, "credential revealed");
			Ok(Json(RevealPasswordResponse {
				id: id.to_string(),
				password,
			}))
		}
		Err(e) => {
			tracing::error!(entity_id = %id, error = %e, "credential could not be decrypted");
			let event = AuditEvent::new(AuditEventType::CredentialRevealFailed)
				.actor(Some(actor.user_id))
				.entity(PasswordEntry::ENTITY_TYPE, id)
				.details(json!({ "reason": e.to_string() }));
			state.audit.record(&event).await?;
			Err(ServerError::CredentialUnavailable)
		}
	}
}
