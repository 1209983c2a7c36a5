// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Create and update bodies for each entity kind.
//!
//! Update bodies are patches: a field left out is not changed. Every update
//! body carries an optional `change_note` stored on the version it produces.

use serde::Deserialize;
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CreateOrganizationRequest {
	pub name: String,
	pub description: Option<String>,
	pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct UpdateOrganizationRequest {
	pub name: Option<String>,
	pub description: Option<String>,
	pub is_active: Option<bool>,
	pub change_note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CreateLocationRequest {
	pub organization_id: Uuid,
	pub name: String,
	pub address: Option<String>,
	pub city: Option<String>,
	pub country: Option<String>,
	pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct UpdateLocationRequest {
	pub name: Option<String>,
	pub address: Option<String>,
	pub city: Option<String>,
	pub country: Option<String>,
	pub notes: Option<String>,
	pub change_note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CreateContactRequest {
	pub organization_id: Uuid,
	pub first_name: String,
	pub last_name: String,
	pub email: Option<String>,
	pub phone: Option<String>,
	pub title: Option<String>,
	pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct UpdateContactRequest {
	pub first_name: Option<String>,
	pub last_name: Option<String>,
	pub email: Option<String>,
	pub phone: Option<String>,
	pub title: Option<String>,
	pub notes: Option<String>,
	pub change_note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CreateConfigurationRequest {
	pub organization_id: Uuid,
	pub location_id: Option<Uuid>,
	pub name: String,
	/// One of `network_device`, `server`, `workstation`, `other`.
	pub kind: Option<String>,
	pub hostname: Option<String>,
	pub ip_address: Option<String>,
	pub os: Option<String>,
	pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct UpdateConfigurationRequest {
	pub location_id: Option<Uuid>,
	pub name: Option<String>,
	pub kind: Option<String>,
	pub hostname: Option<String>,
	pub ip_address: Option<String>,
	pub os: Option<String>,
	pub notes: Option<String>,
	pub change_note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CreatePasswordRequest {
	pub organization_id: Uuid,
	pub name: String,
	pub username: Option<String>,
	pub password: Option<String>,
	pub url: Option<String>,
	pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct UpdatePasswordRequest {
	pub name: Option<String>,
	pub username: Option<String>,
	pub password: Option<String>,
	pub url: Option<String>,
	pub notes: Option<String>,
	pub change_note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CreateDocumentationRequest {
	pub organization_id: Uuid,
	pub title: String,
	#[serde(default)]
	pub body: String,
	pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct UpdateDocumentationRequest {
	pub title: Option<String>,
	pub body: Option<String>,
	pub category: Option<String>,
	pub change_note: Option<String>,
}
