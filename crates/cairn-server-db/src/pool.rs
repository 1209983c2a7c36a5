// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::{
	SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::str::FromStr;
use std::time::Duration;

use crate::error::DbError;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Create a SqlitePool with WAL mode and the default busy timeout.
///
/// # Arguments
/// * `database_url` - SQLite connection string (e.g., "sqlite:./cairn.db")
///
/// # Errors
/// Returns `DbError::Internal` if the URL is invalid or connection fails.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, DbError> {
	create_pool_with(database_url, DEFAULT_BUSY_TIMEOUT, DEFAULT_MAX_CONNECTIONS).await
}

/// Create a SqlitePool in WAL mode where each connection waits up to
/// `busy_timeout` on the write lock before reporting busy.
#[tracing::instrument(skip(database_url))]
pub async fn create_pool_with(
	database_url: &str,
	busy_timeout: Duration,
	max_connections: u32,
) -> Result<SqlitePool, DbError> {
	let options = SqliteConnectOptions::from_str(database_url)
		.map_err(|e| DbError::Internal(format!("Invalid database URL: {e}")))?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.busy_timeout(busy_timeout)
		.create_if_missing(true);

	let pool = SqlitePoolOptions::new()
		.max_connections(max_connections.max(1))
		.connect_with(options)
		.await?;

	tracing::debug!(max_connections, "database pool created");
	Ok(pool)
}

/// Cheap round trip used by the health endpoint.
pub async fn ping(pool: &SqlitePool) -> Result<(), DbError> {
	sqlx::query("SELECT 1").execute(pool).await?;
	Ok(())
}
