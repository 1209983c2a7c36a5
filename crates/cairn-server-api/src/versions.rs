// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct VersionResponse {
	pub id: String,
	pub entity_type: String,
	pub entity_id: String,
	pub version_number: i64,
	/// Snapshot with credential fields masked.
	#[cfg_attr(feature = "openapi", schema(value_type = Object))]
	pub snapshot: serde_json::Value,
	pub change_note: Option<String>,
	pub created_by: Option<String>,
	pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct VersionListResponse {
	pub versions: Vec<VersionResponse>,
	pub count: usize,
}

#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
pub struct RestoreVersionQuery {
	/// Overrides the configured backup default.
	pub backup_current: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct SkippedFieldResponse {
	pub field: String,
	pub reason: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct RestoreVersionResponse {
	#[cfg_attr(feature = "openapi", schema(value_type = Object))]
	pub entity: serde_json::Value,
	pub backup_version: Option<i64>,
	pub restore_version: i64,
	pub skipped_fields: Vec<SkippedFieldResponse>,
}
