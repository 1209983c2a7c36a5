// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Router construction and shared application state.

use axum::{
	middleware::from_fn,
	routing::{delete, get, post},
	Json, Router,
};
use cairn_common_entity::{
	Configuration, Contact, Documentation, Location, Organization, PasswordEntry,
};
use cairn_server_cipher::SecretCipher;
use cairn_server_config::{LedgerConfig, LifecycleConfig, ServerConfig};
use cairn_server_db::AuditRepository;
use cairn_server_ledger::{SnapshotSealer, VersionLedger};
use cairn_server_lifecycle::LifecycleManager;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::actor::actor_layer;
use crate::api_docs::ApiDoc;
use crate::entity_api::ApiEntity;
use crate::routes;

/// Seals credential fields of ledger snapshots with the vault cipher.
pub struct CipherSealer(pub Arc<SecretCipher>);

impl SnapshotSealer for CipherSealer {
	fn seal_value(&self, value: &str) -> Result<String, String> {
		if self.0.is_encrypted(value) {
			return Ok(value.to_string());
		}
		self.0.encrypt(value).map_err(|e| e.to_string())
	}
}

/// Ledger whose snapshots never carry a plaintext credential.
pub fn create_ledger(
	pool: SqlitePool,
	config: LedgerConfig,
	cipher: Arc<SecretCipher>,
) -> VersionLedger {
	VersionLedger::new(pool, config).with_sealer(Arc::new(CipherSealer(cipher)))
}

#[derive(Clone)]
pub struct AppState {
	pub pool: SqlitePool,
	pub cipher: Arc<SecretCipher>,
	pub ledger: VersionLedger,
	pub lifecycle: LifecycleManager,
	pub audit: AuditRepository,
}

impl AppState {
	pub fn new(
		pool: SqlitePool,
		cipher: Arc<SecretCipher>,
		ledger_config: LedgerConfig,
		lifecycle_config: LifecycleConfig,
	) -> Self {
		Self {
			ledger: create_ledger(pool.clone(), ledger_config, cipher.clone()),
			lifecycle: LifecycleManager::new(pool.clone(), lifecycle_config),
			audit: AuditRepository::new(pool.clone()),
			cipher,
			pool,
		}
	}
}

pub fn create_app_state(
	pool: SqlitePool,
	cipher: Arc<SecretCipher>,
	config: &ServerConfig,
) -> AppState {
	AppState::new(
		pool,
		cipher,
		config.ledger.clone(),
		config.lifecycle.clone(),
	)
}

/// Mount the CRUD, lifecycle and history routes for one entity kind.
fn entity_routes<T: ApiEntity>(router: Router<AppState>) -> Router<AppState> {
	let base = format!("/api/{}", T::KIND);
	router
		.route(
			&base,
			get(routes::entities::list_entities::<T>).post(routes::entities::create_entity::<T>),
		)
		.route(
			&format!("{base}/deleted"),
			get(routes::entities::list_deleted_entities::<T>),
		)
		.route(
			&format!("{base}/{{id}}"),
			get(routes::entities::get_entity::<T>)
				.patch(routes::entities::update_entity::<T>)
				.delete(routes::entities::soft_delete_entity::<T>),
		)
		.route(
			&format!("{base}/{{id}}/restore"),
			post(routes::entities::restore_entity::<T>),
		)
		.route(
			&format!("{base}/{{id}}/hard_delete"),
			delete(routes::entities::hard_delete_entity::<T>),
		)
		.route(
			&format!("{base}/{{id}}/versions"),
			get(routes::entities::list_versions::<T>),
		)
		.route(
			&format!("{base}/{{id}}/versions/{{number}}"),
			get(routes::entities::get_version::<T>),
		)
		.route(
			&format!("{base}/{{id}}/restore-version/{{number}}"),
			post(routes::entities::restore_version::<T>),
		)
}

pub fn create_router(state: AppState) -> Router {
	let mut router = Router::new()
		.route("/health", get(routes::health::health_check))
		.route(
			"/api/openapi.json",
			get(|| async { Json(ApiDoc::openapi()) }),
		)
		.route(
			"/api/passwords/{id}/reveal",
			post(routes::passwords::reveal_password),
		);

	router = entity_routes::<Organization>(router);
	router = entity_routes::<Location>(router);
	router = entity_routes::<Contact>(router);
	router = entity_routes::<Configuration>(router);
	router = entity_routes::<PasswordEntry>(router);
	router = entity_routes::<Documentation>(router);

	router
		.layer(from_fn(actor_layer))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}
