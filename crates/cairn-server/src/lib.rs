// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP server for the Cairn IT documentation and credential vault.

pub mod actor;
pub mod api;
pub mod api_docs;
pub mod commands;
pub mod entity_api;
pub mod error;
pub mod routes;
pub mod version;

pub use actor::{Actor, ActorContext, RequireActor, ADMIN_HEADER, USER_ID_HEADER};
pub use api::{create_app_state, create_ledger, create_router, AppState, CipherSealer};
pub use commands::{
	backfill_versions, migrate_credentials, BackfillReport, CommandError, MigrationReport,
};
pub use entity_api::ApiEntity;
pub use error::ServerError;
