// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{extract::State, http::StatusCode, Json};
use cairn_server_api::HealthResponse;

use crate::api::AppState;

#[utoipa::path(
	get,
	path = "/health",
	responses(
		(status = 200, description = "Server and database are reachable", body = HealthResponse),
		(status = 503, description = "Database is unreachable", body = HealthResponse)
	),
	tag = "health"
)]
/// Liveness probe. Needs no actor.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
	let (status, code, database) = match cairn_server_db::ping(&state.pool).await {
		Ok(()) => ("healthy", StatusCode::OK, "ok".to_string()),
		Err(e) => {
			tracing::warn!(error = %e, "health check: database ping failed");
			("unhealthy", StatusCode::SERVICE_UNAVAILABLE, "unreachable".to_string())
		}
	};

	(
		code,
		Json(HealthResponse {
			status: status.to_string(),
			database,
			version: env!("CARGO_PKG_VERSION").to_string(),
		}),
	)
}
