// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Loading secrets from the environment.
//!
//! `NAME` holds the value directly; `NAME_FILE` names a file whose trimmed
//! contents are the value (Docker/Kubernetes secret mounts). Setting both is
//! an error.

use std::path::PathBuf;

use crate::SecretString;

#[derive(Debug, thiserror::Error)]
pub enum SecretEnvError {
	#[error("both {name} and {name}_FILE are set; use only one")]
	Ambiguous { name: String },

	#[error("failed to read secret file {path} (from {name}_FILE): {source}")]
	FileRead {
		name: String,
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

/// Load a secret from `name` or `name_FILE`.
///
/// Returns `Ok(None)` when neither variable is set or the value is empty.
pub fn load_secret_env(name: &str) -> Result<Option<SecretString>, SecretEnvError> {
	let file_var = format!("{name}_FILE");
	let direct = std::env::var(name).ok().filter(|v| !v.is_empty());
	let file = std::env::var(&file_var).ok().filter(|v| !v.is_empty());

	match (direct, file) {
		(Some(_), Some(_)) => Err(SecretEnvError::Ambiguous {
			name: name.to_string(),
		}),
		(Some(value), None) => Ok(Some(SecretString::new(value))),
		(None, Some(path)) => {
			let path = PathBuf::from(path);
			let content =
				std::fs::read_to_string(&path).map_err(|source| SecretEnvError::FileRead {
					name: name.to_string(),
					path: path.clone(),
					source,
				})?;
			tracing::debug!(var = %file_var, path = %path.display(), "loaded secret from file");
			let trimmed = content.trim();
			if trimmed.is_empty() {
				Ok(None)
			} else {
				Ok(Some(SecretString::new(trimmed.to_string())))
			}
		}
		(None, None) => Ok(None),
	}
}
