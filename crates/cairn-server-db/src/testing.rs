// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pools for tests in this and downstream crates.

use std::path::Path;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::error::DbError;
use crate::pool::create_pool;
use crate::schema::run_migrations;

/// Migrated in-memory database on a single connection.
pub async fn create_test_pool() -> Result<SqlitePool, DbError> {
	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.connect("sqlite::memory:")
		.await?;
	run_migrations(&pool).await?;
	Ok(pool)
}

/// Migrated file database under `dir`, for tests that need several
/// connections writing at once.
pub async fn create_file_pool(dir: &Path) -> Result<SqlitePool, DbError> {
	let url = format!("sqlite:{}?mode=rwc", dir.join("cairn-test.db").display());
	let pool = create_pool(&url).await?;
	run_migrations(&pool).await?;
	Ok(pool)
}
