// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub mod common;
pub mod entities;
pub mod passwords;
pub mod versions;

pub use common::{
	DeletedQuery, EntityListResponse, ErrorResponse, HardDeleteResponse, HealthResponse,
	ListQuery,
};
pub use entities::{
	CreateConfigurationRequest, CreateContactRequest, CreateDocumentationRequest,
	CreateLocationRequest, CreateOrganizationRequest, CreatePasswordRequest,
	UpdateConfigurationRequest, UpdateContactRequest, UpdateDocumentationRequest,
	UpdateLocationRequest, UpdateOrganizationRequest, UpdatePasswordRequest,
};
pub use passwords::RevealPasswordResponse;
pub use versions::{
	RestoreVersionQuery, RestoreVersionResponse, SkippedFieldResponse, VersionListResponse,
	VersionResponse,
};
