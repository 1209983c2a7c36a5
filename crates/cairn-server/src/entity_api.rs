// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Binding between HTTP request bodies and domain records.
//!
//! [`ApiEntity`] is what the generic handlers in [`crate::routes::entities`]
//! are written against. It is also where credential fields are sealed: on
//! create, on update and after a version restore.

use cairn_common_entity::{
	Configuration, ConfigurationKind, Contact, Documentation, EntityId, Location, Organization,
	PasswordEntry, UserId, Versionable,
};
use cairn_server_api::{
	CreateConfigurationRequest, CreateContactRequest, CreateDocumentationRequest,
	CreateLocationRequest, CreateOrganizationRequest, CreatePasswordRequest,
	UpdateConfigurationRequest, UpdateContactRequest, UpdateDocumentationRequest,
	UpdateLocationRequest, UpdateOrganizationRequest, UpdatePasswordRequest,
};
use cairn_server_cipher::{CipherError, SecretCipher};
use cairn_server_db::EntityRecord;
use serde::de::DeserializeOwned;

use crate::error::ServerError;

pub trait ApiEntity: EntityRecord {
	/// Path segment under `/api`.
	const KIND: &'static str;

	type Create: DeserializeOwned + Send + 'static;
	type Update: DeserializeOwned + Send + Sync + 'static;

	fn from_create(
		req: Self::Create,
		actor: UserId,
		cipher: &SecretCipher,
	) -> Result<Self, ServerError>;

	fn change_note(update: &Self::Update) -> Option<&str>;

	/// Validate a patch and seal any credential it carries.
	fn prepare_update(
		update: Self::Update,
		_cipher: &SecretCipher,
	) -> Result<Self::Update, ServerError> {
		Ok(update)
	}

	fn apply_update(&mut self, update: &Self::Update);

	/// Encrypt every credential field that is not already sealed.
	fn seal(&mut self, _cipher: &SecretCipher) -> Result<(), CipherError> {
		Ok(())
	}

	/// Outward representation: the snapshot with credentials masked.
	fn to_response(&self) -> Result<serde_json::Value, ServerError> {
		Ok(self
			.snapshot()?
			.masked(Self::SENSITIVE_FIELDS)
			.into_value())
	}
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ServerError> {
	if value.trim().is_empty() {
		return Err(ServerError::BadRequest(format!("{field} must not be empty")));
	}
	Ok(())
}

fn require_non_empty_opt(field: &str, value: Option<&str>) -> Result<(), ServerError> {
	match value {
		Some(v) => require_non_empty(field, v),
		None => Ok(()),
	}
}

fn patch<T: Clone>(slot: &mut T, value: &Option<T>) {
	if let Some(v) = value {
		*slot = v.clone();
	}
}

fn patch_opt<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
	if let Some(v) = value {
		*slot = Some(v.clone());
	}
}

fn parse_kind(kind: &str) -> Result<ConfigurationKind, ServerError> {
	kind.parse().map_err(ServerError::BadRequest)
}

impl ApiEntity for Organization {
	const KIND: &'static str = "organizations";
	type Create = CreateOrganizationRequest;
	type Update = UpdateOrganizationRequest;

	fn from_create(req: Self::Create, actor: UserId, _: &SecretCipher) -> Result<Self, ServerError> {
		require_non_empty("name", &req.name)?;
		let mut org = Organization::new(req.name, Some(actor));
		org.description = req.description;
		org.is_active = req.is_active.unwrap_or(true);
		Ok(org)
	}

	fn change_note(update: &Self::Update) -> Option<&str> {
		update.change_note.as_deref()
	}

	fn prepare_update(update: Self::Update, _: &SecretCipher) -> Result<Self::Update, ServerError> {
		require_non_empty_opt("name", update.name.as_deref())?;
		Ok(update)
	}

	fn apply_update(&mut self, update: &Self::Update) {
		patch(&mut self.name, &update.name);
		patch_opt(&mut self.description, &update.description);
		patch(&mut self.is_active, &update.is_active);
	}
}

impl ApiEntity for Location {
	const KIND: &'static str = "locations";
	type Create = CreateLocationRequest;
	type Update = UpdateLocationRequest;

	fn from_create(req: Self::Create, actor: UserId, _: &SecretCipher) -> Result<Self, ServerError> {
		require_non_empty("name", &req.name)?;
		let mut location = Location::new(EntityId::new(req.organization_id), req.name, Some(actor));
		location.address = req.address;
		location.city = req.city;
		location.country = req.country;
		location.notes = req.notes;
		Ok(location)
	}

	fn change_note(update: &Self::Update) -> Option<&str> {
		update.change_note.as_deref()
	}

	fn prepare_update(update: Self::Update, _: &SecretCipher) -> Result<Self::Update, ServerError> {
		require_non_empty_opt("name", update.name.as_deref())?;
		Ok(update)
	}

	fn apply_update(&mut self, update: &Self::Update) {
		patch(&mut self.name, &update.name);
		patch_opt(&mut self.address, &update.address);
		patch_opt(&mut self.city, &update.city);
		patch_opt(&mut self.country, &update.country);
		patch_opt(&mut self.notes, &update.notes);
	}
}

impl ApiEntity for Contact {
	const KIND: &'static str = "contacts";
	type Create = CreateContactRequest;
	type Update = UpdateContactRequest;

	fn from_create(req: Self::Create, actor: UserId, _: &SecretCipher) -> Result<Self, ServerError> {
		require_non_empty("first_name", &req.first_name)?;
		let mut contact = Contact::new(
			EntityId::new(req.organization_id),
			req.first_name,
			req.last_name,
			Some(actor),
		);
		contact.email = req.email;
		contact.phone = req.phone;
		contact.title = req.title;
		contact.notes = req.notes;
		Ok(contact)
	}

	fn change_note(update: &Self::Update) -> Option<&str> {
		update.change_note.as_deref()
	}

	fn prepare_update(update: Self::Update, _: &SecretCipher) -> Result<Self::Update, ServerError> {
		require_non_empty_opt("first_name", update.first_name.as_deref())?;
		Ok(update)
	}

	fn apply_update(&mut self, update: &Self::Update) {
		patch(&mut self.first_name, &update.first_name);
		patch(&mut self.last_name, &update.last_name);
		patch_opt(&mut self.email, &update.email);
		patch_opt(&mut self.phone, &update.phone);
		patch_opt(&mut self.title, &update.title);
		patch_opt(&mut self.notes, &update.notes);
	}
}

impl ApiEntity for Configuration {
	const KIND: &'static str = "configurations";
	type Create = CreateConfigurationRequest;
	type Update = UpdateConfigurationRequest;

	fn from_create(req: Self::Create, actor: UserId, _: &SecretCipher) -> Result<Self, ServerError> {
		require_non_empty("name", &req.name)?;
		let kind = match req.kind.as_deref() {
			Some(kind) => parse_kind(kind)?,
			None => ConfigurationKind::default(),
		};
		let mut config =
			Configuration::new(EntityId::new(req.organization_id), req.name, kind, Some(actor));
		config.location_id = req.location_id.map(EntityId::new);
		config.hostname = req.hostname;
		config.ip_address = req.ip_address;
		config.os = req.os;
		config.notes = req.notes;
		Ok(config)
	}

	fn change_note(update: &Self::Update) -> Option<&str> {
		update.change_note.as_deref()
	}

	fn prepare_update(update: Self::Update, _: &SecretCipher) -> Result<Self::Update, ServerError> {
		require_non_empty_opt("name", update.name.as_deref())?;
		if let Some(kind) = update.kind.as_deref() {
			parse_kind(kind)?;
		}
		Ok(update)
	}

	fn apply_update(&mut self, update: &Self::Update) {
		if let Some(location_id) = update.location_id {
			self.location_id = Some(EntityId::new(location_id));
		}
		patch(&mut self.name, &update.name);
		if let Some(Ok(kind)) = update.kind.as_deref().map(str::parse::<ConfigurationKind>) {
			self.kind = kind;
		}
		patch_opt(&mut self.hostname, &update.hostname);
		patch_opt(&mut self.ip_address, &update.ip_address);
		patch_opt(&mut self.os, &update.os);
		patch_opt(&mut self.notes, &update.notes);
	}
}

impl ApiEntity for PasswordEntry {
	const KIND: &'static str = "passwords";
	type Create = CreatePasswordRequest;
	type Update = UpdatePasswordRequest;

	fn from_create(
		req: Self::Create,
		actor: UserId,
		cipher: &SecretCipher,
	) -> Result<Self, ServerError> {
		require_non_empty("name", &req.name)?;
		let mut entry = PasswordEntry::new(EntityId::new(req.organization_id), req.name, Some(actor));
		entry.username = req.username;
		entry.password = cipher.encrypt_opt(req.password.as_deref())?;
		entry.url = req.url;
		entry.notes = req.notes;
		Ok(entry)
	}

	fn change_note(update: &Self::Update) -> Option<&str> {
		update.change_note.as_deref()
	}

	fn prepare_update(
		mut update: Self::Update,
		cipher: &SecretCipher,
	) -> Result<Self::Update, ServerError> {
		require_non_empty_opt("name", update.name.as_deref())?;
		update.password = cipher.encrypt_opt(update.password.as_deref())?;
		Ok(update)
	}

	fn apply_update(&mut self, update: &Self::Update) {
		patch(&mut self.name, &update.name);
		patch_opt(&mut self.username, &update.username);
		patch_opt(&mut self.password, &update.password);
		patch_opt(&mut self.url, &update.url);
		patch_opt(&mut self.notes, &update.notes);
	}

	fn seal(&mut self, cipher: &SecretCipher) -> Result<(), CipherError> {
		self.password = cipher.encrypt_opt(self.password.as_deref())?;
		Ok(())
	}
}

impl ApiEntity for Documentation {
	const KIND: &'static str = "documentation";
	type Create = CreateDocumentationRequest;
	type Update = UpdateDocumentationRequest;

	fn from_create(req: Self::Create, actor: UserId, _: &SecretCipher) -> Result<Self, ServerError> {
		require_non_empty("title", &req.title)?;
		let mut doc = Documentation::new(
			EntityId::new(req.organization_id),
			req.title,
			req.body,
			Some(actor),
		);
		doc.category = req.category;
		Ok(doc)
	}

	fn change_note(update: &Self::Update) -> Option<&str> {
		update.change_note.as_deref()
	}

	fn prepare_update(update: Self::Update, _: &SecretCipher) -> Result<Self::Update, ServerError> {
		require_non_empty_opt("title", update.title.as_deref())?;
		Ok(update)
	}

	fn apply_update(&mut self, update: &Self::Update) {
		patch(&mut self.title, &update.title);
		patch(&mut self.body, &update.body);
		patch_opt(&mut self.category, &update.category);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use cairn_common_entity::MASKED_VALUE;
	use cairn_common_secret::SecretString;
	use cairn_server_cipher::is_encrypted;
	use std::sync::OnceLock;
	use uuid::Uuid;

	fn cipher() -> &'static SecretCipher {
		static CIPHER: OnceLock<SecretCipher> = OnceLock::new();
		CIPHER.get_or_init(|| SecretCipher::new(&SecretString::from("entity-api-tests")).unwrap())
	}

	fn password_request(password: Option<&str>) -> CreatePasswordRequest {
		CreatePasswordRequest {
			organization_id: Uuid::new_v4(),
			name: "core switch".to_string(),
			username: Some("admin".to_string()),
			password: password.map(str::to_string),
			url: None,
			notes: None,
		}
	}

	#[test]
	fn password_is_sealed_on_create_and_masked_in_response() {
		let entry =
			PasswordEntry::from_create(password_request(Some("hunter2")), UserId::generate(), cipher())
				.unwrap();
		let stored = entry.password.as_deref().unwrap();
		assert!(is_encrypted(stored));
		assert_eq!(cipher().decrypt(stored).unwrap(), "hunter2");

		let response = entry.to_response().unwrap();
		assert_eq!(response["password"], MASKED_VALUE);
		assert_eq!(response["username"], "admin");
	}

	#[test]
	fn unset_password_stays_null() {
		let entry =
			PasswordEntry::from_create(password_request(None), UserId::generate(), cipher()).unwrap();
		assert!(entry.password.is_none());
		assert!(entry.to_response().unwrap()["password"].is_null());
	}

	#[test]
	fn password_patch_is_sealed_before_it_is_applied() {
		let update = UpdatePasswordRequest {
			password: Some("rotated".to_string()),
			..Default::default()
		};
		let update = PasswordEntry::prepare_update(update, cipher()).unwrap();
		assert!(is_encrypted(update.password.as_deref().unwrap()));
	}

	#[test]
	fn seal_leaves_sealed_values_alone() {
		let mut entry =
			PasswordEntry::from_create(password_request(Some("hunter2")), UserId::generate(), cipher())
				.unwrap();
		let sealed = entry.password.clone();
		entry.seal(cipher()).unwrap();
		assert_eq!(entry.password, sealed);

		entry.password = Some("restored-plaintext".to_string());
		entry.seal(cipher()).unwrap();
		assert!(is_encrypted(entry.password.as_deref().unwrap()));
	}

	#[test]
	fn empty_names_are_rejected() {
		let req = CreateOrganizationRequest {
			name: "  ".to_string(),
			description: None,
			is_active: None,
		};
		let result = Organization::from_create(req, UserId::generate(), cipher());
		assert!(matches!(result, Err(ServerError::BadRequest(_))));
	}

	#[test]
	fn unknown_configuration_kind_is_rejected() {
		let update = UpdateConfigurationRequest {
			kind: Some("mainframe".to_string()),
			..Default::default()
		};
		assert!(matches!(
			Configuration::prepare_update(update, cipher()),
			Err(ServerError::BadRequest(_))
		));
	}

	#[test]
	fn patch_changes_only_given_fields() {
		let mut org = Organization::new("Acme", None);
		org.description = Some("keep".to_string());
		org.apply_update(&UpdateOrganizationRequest {
			name: Some("Acme Corp".to_string()),
			..Default::default()
		});
		assert_eq!(org.name, "Acme Corp");
		assert_eq!(org.description.as_deref(), Some("keep"));
		assert!(org.is_active);
	}
}
