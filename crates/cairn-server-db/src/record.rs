// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Column mapping between domain records and their tables.

use cairn_common_entity::{
	Configuration, ConfigurationKind, Contact, Documentation, EntityId, Location, Organization,
	PasswordEntry, RecordMeta, Versionable,
};
use sqlx::{
	sqlite::{SqliteArguments, SqliteRow},
	Row, Sqlite,
};

use crate::codec::{parse_id, parse_optional_id};
use crate::error::DbError;

pub type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// A [`Versionable`] record stored in its own table.
///
/// The metadata columns are handled by the repository; implementors only
/// describe their domain columns.
pub trait EntityRecord: Versionable + Clone + Send + Sync + Unpin + 'static {
	const TABLE: &'static str;

	/// Domain columns, in the order [`EntityRecord::bind_columns`] binds them.
	const COLUMNS: &'static [&'static str];

	/// Column holding the owning organization's id.
	const ORG_SCOPE_COLUMN: &'static str = "organization_id";

	fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q>;

	fn from_row(row: &SqliteRow, meta: RecordMeta) -> Result<Self, DbError>;
}

impl EntityRecord for Organization {
	const TABLE: &'static str = "organizations";
	const COLUMNS: &'static [&'static str] = &["name", "description", "is_active"];
	const ORG_SCOPE_COLUMN: &'static str = "id";

	fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
		query
			.bind(self.name.clone())
			.bind(self.description.clone())
			.bind(self.is_active)
	}

	fn from_row(row: &SqliteRow, meta: RecordMeta) -> Result<Self, DbError> {
		Ok(Organization {
			meta,
			name: row.try_get("name")?,
			description: row.try_get("description")?,
			is_active: row.try_get("is_active")?,
		})
	}
}

impl EntityRecord for Location {
	const TABLE: &'static str = "locations";
	const COLUMNS: &'static [&'static str] = &[
		"organization_id",
		"name",
		"address",
		"city",
		"country",
		"notes",
	];

	fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
		query
			.bind(self.organization_id.to_string())
			.bind(self.name.clone())
			.bind(self.address.clone())
			.bind(self.city.clone())
			.bind(self.country.clone())
			.bind(self.notes.clone())
	}

	fn from_row(row: &SqliteRow, meta: RecordMeta) -> Result<Self, DbError> {
		let organization_id: String = row.try_get("organization_id")?;
		Ok(Location {
			meta,
			organization_id: parse_id::<EntityId>(&organization_id, "organization_id")?,
			name: row.try_get("name")?,
			address: row.try_get("address")?,
			city: row.try_get("city")?,
			country: row.try_get("country")?,
			notes: row.try_get("notes")?,
		})
	}
}

impl EntityRecord for Contact {
	const TABLE: &'static str = "contacts";
	const COLUMNS: &'static [&'static str] = &[
		"organization_id",
		"first_name",
		"last_name",
		"email",
		"phone",
		"title",
		"notes",
	];

	fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
		query
			.bind(self.organization_id.to_string())
			.bind(self.first_name.clone())
			.bind(self.last_name.clone())
			.bind(self.email.clone())
			.bind(self.phone.clone())
			.bind(self.title.clone())
			.bind(self.notes.clone())
	}

	fn from_row(row: &SqliteRow, meta: RecordMeta) -> Result<Self, DbError> {
		let organization_id: String = row.try_get("organization_id")?;
		Ok(Contact {
			meta,
			organization_id: parse_id::<EntityId>(&organization_id, "organization_id")?,
			first_name: row.try_get("first_name")?,
			last_name: row.try_get("last_name")?,
			email: row.try_get("email")?,
			phone: row.try_get("phone")?,
			title: row.try_get("title")?,
			notes: row.try_get("notes")?,
		})
	}
}

impl EntityRecord for Configuration {
	const TABLE: &'static str = "configurations";
	const COLUMNS: &'static [&'static str] = &[
		"organization_id",
		"location_id",
		"name",
		"kind",
		"hostname",
		"ip_address",
		"os",
		"notes",
	];

	fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
		query
			.bind(self.organization_id.to_string())
			.bind(self.location_id.map(|id| id.to_string()))
			.bind(self.name.clone())
			.bind(self.kind.as_str())
			.bind(self.hostname.clone())
			.bind(self.ip_address.clone())
			.bind(self.os.clone())
			.bind(self.notes.clone())
	}

	fn from_row(row: &SqliteRow, meta: RecordMeta) -> Result<Self, DbError> {
		let organization_id: String = row.try_get("organization_id")?;
		let location_id: Option<String> = row.try_get("location_id")?;
		let kind: String = row.try_get("kind")?;
		Ok(Configuration {
			meta,
			organization_id: parse_id::<EntityId>(&organization_id, "organization_id")?,
			location_id: parse_optional_id(location_id, "location_id")?,
			name: row.try_get("name")?,
			kind: kind.parse::<ConfigurationKind>().map_err(DbError::Internal)?,
			hostname: row.try_get("hostname")?,
			ip_address: row.try_get("ip_address")?,
			os: row.try_get("os")?,
			notes: row.try_get("notes")?,
		})
	}
}

impl EntityRecord for PasswordEntry {
	const TABLE: &'static str = "password_entries";
	const COLUMNS: &'static [&'static str] = &[
		"organization_id",
		"name",
		"username",
		"password",
		"url",
		"notes",
	];

	fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
		query
			.bind(self.organization_id.to_string())
			.bind(self.name.clone())
			.bind(self.username.clone())
			.bind(self.password.clone())
			.bind(self.url.clone())
			.bind(self.notes.clone())
	}

	fn from_row(row: &SqliteRow, meta: RecordMeta) -> Result<Self, DbError> {
		let organization_id: String = row.try_get("organization_id")?;
		Ok(PasswordEntry {
			meta,
			organization_id: parse_id::<EntityId>(&organization_id, "organization_id")?,
			name: row.try_get("name")?,
			username: row.try_get("username")?,
			password: row.try_get("password")?,
			url: row.try_get("url")?,
			notes: row.try_get("notes")?,
		})
	}
}

impl EntityRecord for Documentation {
	const TABLE: &'static str = "documentation";
	const COLUMNS: &'static [&'static str] = &["organization_id", "title", "body", "category"];

	fn bind_columns<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
		query
			.bind(self.organization_id.to_string())
			.bind(self.title.clone())
			.bind(self.body.clone())
			.bind(self.category.clone())
	}

	fn from_row(row: &SqliteRow, meta: RecordMeta) -> Result<Self, DbError> {
		let organization_id: String = row.try_get("organization_id")?;
		Ok(Documentation {
			meta,
			organization_id: parse_id::<EntityId>(&organization_id, "organization_id")?,
			title: row.try_get("title")?,
			body: row.try_get("body")?,
			category: row.try_get("category")?,
		})
	}
}
