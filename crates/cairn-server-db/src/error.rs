// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Conflict: {0}")]
	Conflict(String),

	#[error("Internal: {0}")]
	Internal(String),

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// SQLITE_BUSY, SQLITE_LOCKED, SQLITE_BUSY_RECOVERY and SQLITE_BUSY_SNAPSHOT.
const SQLITE_CONTENTION_CODES: &[&str] = &["5", "6", "261", "517"];

impl DbError {
	pub fn is_unique_violation(&self) -> bool {
		match self {
			DbError::Sqlx(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
			_ => false,
		}
	}

	/// Whether retrying the whole transaction may succeed.
	pub fn is_transient(&self) -> bool {
		match self {
			DbError::Sqlx(sqlx::Error::Database(db_err)) => {
				db_err.is_unique_violation()
					|| db_err
						.code()
						.is_some_and(|code| SQLITE_CONTENTION_CODES.contains(&code.as_ref()))
			}
			_ => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn non_database_errors_are_not_transient() {
		assert!(!DbError::NotFound("x".to_string()).is_transient());
		assert!(!DbError::Sqlx(sqlx::Error::RowNotFound).is_transient());
		assert!(!DbError::Conflict("x".to_string()).is_unique_violation());
	}
}
