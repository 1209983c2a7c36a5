// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Database layer for Cairn server.
//!
//! SQLite via sqlx. Ids are stored as UUID text and timestamps as RFC 3339
//! text. Repositories hold a pool; the `_in` associated functions take a
//! connection so callers can compose them inside one transaction.

pub mod audit;
pub mod codec;
pub mod credentials;
pub mod entity;
pub mod error;
pub mod pool;
pub mod record;
pub mod schema;
pub mod testing;
pub mod version;

pub use audit::{AuditEvent, AuditEventType, AuditRepository};
pub use credentials::{CredentialRepository, StoredCredential};
pub use entity::{EntityRepository, ListFilter};
pub use error::DbError;
pub use pool::{create_pool, create_pool_with, ping};
pub use record::{EntityRecord, SqliteQuery};
pub use schema::run_migrations;
pub use version::{NewVersion, VersionRecord, VersionRepository};
