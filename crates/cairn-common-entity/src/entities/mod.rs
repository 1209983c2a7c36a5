// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Domain records.
//!
//! Each record flattens a [`RecordMeta`](crate::RecordMeta) into its own
//! fields and implements [`Versionable`](crate::Versionable) with an explicit
//! field match, so a field that is renamed or dropped later shows up as a
//! skipped field on restore rather than a silent write.

mod configuration;
mod contact;
mod documentation;
mod location;
mod organization;
mod password;

pub use configuration::{Configuration, ConfigurationKind};
pub use contact::Contact;
pub use documentation::Documentation;
pub use location::Location;
pub use organization::Organization;
pub use password::PasswordEntry;
