// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use cairn_common_secret::SecretString;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{CipherError, CipherResult};

/// Size of the derived key in bytes (256 bits for AES-256).
pub const KEY_SIZE: usize = 32;

/// PBKDF2-HMAC-SHA256 rounds. Changing this changes every derived key.
pub const KDF_ITERATIONS: u32 = 100_000;

/// Fixed application salt. Changing this changes every derived key.
pub const KDF_SALT: &[u8] = b"cairn-credential-cipher.v1";

/// Derive the credential key from the master secret.
///
/// Deterministic: the same secret always yields the same key.
pub fn derive_key(master_secret: &SecretString) -> CipherResult<Zeroizing<[u8; KEY_SIZE]>> {
	if master_secret.is_empty() {
		return Err(CipherError::EmptyMasterSecret);
	}

	let mut key = Zeroizing::new([0u8; KEY_SIZE]);
	pbkdf2::pbkdf2_hmac::<Sha256>(
		master_secret.expose().as_bytes(),
		KDF_SALT,
		KDF_ITERATIONS,
		key.as_mut(),
	);
	Ok(key)
}
