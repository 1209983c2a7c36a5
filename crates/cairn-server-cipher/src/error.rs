// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

pub type CipherResult<T> = Result<T, CipherError>;

#[derive(Debug, Error)]
pub enum CipherError {
	#[error("master secret must not be empty")]
	EmptyMasterSecret,

	#[error("encryption failed")]
	Encryption,

	#[error("decryption failed: {0}")]
	Decryption(#[from] DecryptFailure),
}

/// Why a tagged value could not be opened.
///
/// None of the variants carry key material or plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecryptFailure {
	#[error("unsupported key version: {0}")]
	UnsupportedKeyVersion(String),

	#[error("payload is not valid base64url")]
	InvalidEncoding,

	#[error("payload is shorter than nonce and tag")]
	Truncated,

	#[error("authentication failed (wrong key or tampered value)")]
	Authentication,

	#[error("plaintext is not valid UTF-8")]
	InvalidUtf8,
}
