// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod cipher;
mod database;
mod http;
mod ledger;
mod lifecycle;
mod logging;

pub use cipher::{CipherConfig, CipherConfigLayer};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use ledger::{LedgerConfig, LedgerConfigLayer};
pub use lifecycle::{LifecycleConfig, LifecycleConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
