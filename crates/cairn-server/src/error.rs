// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Server error types and HTTP response conversions.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use cairn_common_entity::SnapshotError;
use cairn_server_api::ErrorResponse;
use cairn_server_cipher::CipherError;
use cairn_server_db::DbError;
use cairn_server_ledger::LedgerError;
use cairn_server_lifecycle::LifecycleError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Version not found: {0}")]
	VersionNotFound(String),

	#[error("Not deleted: {0}")]
	NotDeleted(String),

	#[error("Invalid request: {0}")]
	BadRequest(String),

	#[error("Unauthorized: {0}")]
	Unauthorized(String),

	#[error("Forbidden: {0}")]
	Forbidden(String),

	#[error("Conflict: {0}")]
	Conflict(String),

	/// A stored credential could not be decrypted. Details stay in the log.
	#[error("Credential unavailable")]
	CredentialUnavailable,

	#[error("Database error: {0}")]
	Db(DbError),

	#[error("Internal error: {0}")]
	Internal(String),
}

impl From<DbError> for ServerError {
	fn from(err: DbError) -> Self {
		match err {
			DbError::NotFound(what) => ServerError::NotFound(what),
			other => {
				tracing::error!(error = %other, "persistence failure");
				ServerError::Db(other)
			}
		}
	}
}

impl From<LedgerError> for ServerError {
	fn from(err: LedgerError) -> Self {
		match err {
			LedgerError::EntityNotFound { .. } => ServerError::NotFound(err.to_string()),
			LedgerError::VersionNotFound { .. } => ServerError::VersionNotFound(err.to_string()),
			LedgerError::Conflict { .. } => {
				tracing::warn!(error = %err, "ledger conflict");
				ServerError::Conflict(err.to_string())
			}
			LedgerError::Db(db) => ServerError::from(db),
			LedgerError::Snapshot(_) | LedgerError::Seal(_) => {
				tracing::error!(error = %err, "ledger failure");
				ServerError::Internal(err.to_string())
			}
		}
	}
}

impl From<LifecycleError> for ServerError {
	fn from(err: LifecycleError) -> Self {
		match err {
			LifecycleError::NotFound { .. } => ServerError::NotFound(err.to_string()),
			LifecycleError::NotDeleted { .. } => ServerError::NotDeleted(err.to_string()),
			LifecycleError::Db(db) => ServerError::from(db),
		}
	}
}

impl From<SnapshotError> for ServerError {
	fn from(err: SnapshotError) -> Self {
		tracing::error!(error = %err, "snapshot failure");
		ServerError::Internal(err.to_string())
	}
}

impl From<CipherError> for ServerError {
	fn from(err: CipherError) -> Self {
		tracing::error!(error = %err, "cipher failure");
		ServerError::Internal("credential encryption failed".to_string())
	}
}

impl ServerError {
	pub fn status(&self) -> StatusCode {
		match self {
			ServerError::NotFound(_) | ServerError::VersionNotFound(_) => StatusCode::NOT_FOUND,
			ServerError::NotDeleted(_) | ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
			ServerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
			ServerError::Forbidden(_) => StatusCode::FORBIDDEN,
			ServerError::Conflict(_) => StatusCode::CONFLICT,
			ServerError::CredentialUnavailable | ServerError::Db(_) | ServerError::Internal(_) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}

	pub fn code(&self) -> &'static str {
		match self {
			ServerError::NotFound(_) => "not_found",
			ServerError::VersionNotFound(_) => "version_not_found",
			ServerError::NotDeleted(_) => "not_deleted",
			ServerError::BadRequest(_) => "bad_request",
			ServerError::Unauthorized(_) => "unauthorized",
			ServerError::Forbidden(_) => "forbidden",
			ServerError::Conflict(_) => "conflict",
			ServerError::CredentialUnavailable => "credential_unavailable",
			ServerError::Db(_) | ServerError::Internal(_) => "internal_error",
		}
	}
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let message = match &self {
			ServerError::NotFound(msg)
			| ServerError::VersionNotFound(msg)
			| ServerError::NotDeleted(msg)
			| ServerError::BadRequest(msg)
			| ServerError::Unauthorized(msg)
			| ServerError::Forbidden(msg)
			| ServerError::Conflict(msg) => msg.clone(),
			ServerError::CredentialUnavailable => {
				"The stored credential could not be decrypted".to_string()
			}
			ServerError::Db(_) | ServerError::Internal(_) => "An internal error occurred".to_string(),
		};
		(
			self.status(),
			Json(ErrorResponse::new(self.code(), message)),
		)
			.into_response()
	}
}
