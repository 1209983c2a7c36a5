// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential cipher configuration.
//!
//! The master secret normally comes from `CAIRN_SERVER_MASTER_SECRET` or the
//! file named by `CAIRN_SERVER_MASTER_SECRET_FILE`. A `[cipher]` table in the
//! config file is accepted but the environment wins.

use cairn_common_secret::SecretString;
use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct CipherConfig {
	pub master_secret: SecretString,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CipherConfigLayer {
	#[serde(default)]
	pub master_secret: Option<SecretString>,
}

impl CipherConfigLayer {
	pub fn merge(&mut self, other: CipherConfigLayer) {
		if other.master_secret.is_some() {
			self.master_secret = other.master_secret;
		}
	}

	pub fn finalize(self) -> Result<CipherConfig, ConfigError> {
		match self.master_secret {
			Some(secret) if !secret.is_empty() => Ok(CipherConfig {
				master_secret: secret,
			}),
			_ => Err(ConfigError::Validation(
				"a master secret is required: set CAIRN_SERVER_MASTER_SECRET or \
				 CAIRN_SERVER_MASTER_SECRET_FILE"
					.to_string(),
			)),
		}
	}
}
