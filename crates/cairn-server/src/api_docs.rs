// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OpenAPI documentation for cairn-server, served at `/api/openapi.json`.
//!
//! The per-kind entity routes are mounted generically, so they are described
//! through their request and response schemas rather than individual paths.

use cairn_server_api::{
	CreateConfigurationRequest, CreateContactRequest, CreateDocumentationRequest,
	CreateLocationRequest, CreateOrganizationRequest, CreatePasswordRequest, EntityListResponse,
	ErrorResponse, HardDeleteResponse, HealthResponse, RestoreVersionResponse,
	RevealPasswordResponse, SkippedFieldResponse, UpdateConfigurationRequest,
	UpdateContactRequest, UpdateDocumentationRequest, UpdateLocationRequest,
	UpdateOrganizationRequest, UpdatePasswordRequest, VersionListResponse, VersionResponse,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
	info(
		title = "Cairn Server API",
		version = "1.0.0",
		description = "IT documentation and credential vault for managed service providers.",
		license(name = "Proprietary")
	),
	servers(
		(url = "/", description = "Local server")
	),
	tags(
		(name = "health", description = "Health checks"),
		(name = "passwords", description = "Credential reveal")
	),
	paths(
		crate::routes::health::health_check,
		crate::routes::passwords::reveal_password,
	),
	components(schemas(
		ErrorResponse,
		HealthResponse,
		EntityListResponse,
		HardDeleteResponse,
		VersionResponse,
		VersionListResponse,
		SkippedFieldResponse,
		RestoreVersionResponse,
		RevealPasswordResponse,
		CreateOrganizationRequest,
		UpdateOrganizationRequest,
		CreateLocationRequest,
		UpdateLocationRequest,
		CreateContactRequest,
		UpdateContactRequest,
		CreateConfigurationRequest,
		UpdateConfigurationRequest,
		CreatePasswordRequest,
		UpdatePasswordRequest,
		CreateDocumentationRequest,
		UpdateDocumentationRequest,
	))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn openapi_lists_documented_paths() {
		let doc = ApiDoc::openapi();
		assert!(doc.paths.paths.contains_key("/health"));
		assert!(doc.paths.paths.contains_key("/api/passwords/{id}/reveal"));
	}
}
