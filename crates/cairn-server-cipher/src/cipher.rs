// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use aes_gcm::{
	aead::{Aead, KeyInit, OsRng},
	Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use cairn_common_secret::SecretString;
use rand::RngCore;
use std::fmt;
use zeroize::Zeroizing;

use crate::error::{CipherError, CipherResult, DecryptFailure};
use crate::kdf::{derive_key, KDF_ITERATIONS, KEY_SIZE};

/// Prefix identifying tagged ciphertext.
pub const MARKER: &str = "cairn:enc:";

/// The only key version this build can open.
pub const KEY_VERSION: &str = "v1";

/// Size of AES-GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Whether `value` carries the ciphertext marker. No cryptographic check.
pub fn is_encrypted(value: &str) -> bool {
	value.starts_with(MARKER)
}

/// Encrypts and decrypts credential strings under a key derived once from
/// the master secret.
///
/// Built by the composition root and shared behind an `Arc`; it holds no
/// mutable state.
#[derive(Clone)]
pub struct SecretCipher {
	cipher: Aes256Gcm,
}

impl fmt::Debug for SecretCipher {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SecretCipher")
			.field("key_version", &KEY_VERSION)
			.finish_non_exhaustive()
	}
}

impl SecretCipher {
	pub fn new(master_secret: &SecretString) -> CipherResult<Self> {
		let key = derive_key(master_secret)?;
		tracing::debug!(
			iterations = KDF_ITERATIONS,
			key_version = KEY_VERSION,
			"derived credential key"
		);
		Ok(Self::from_key(&key))
	}

	fn from_key(key: &Zeroizing<[u8; KEY_SIZE]>) -> Self {
		let key = Key::<Aes256Gcm>::from_slice(key.as_slice());
		Self {
			cipher: Aes256Gcm::new(key),
		}
	}

	pub fn is_encrypted(&self, value: &str) -> bool {
		is_encrypted(value)
	}

	/// Seal `plaintext`. Empty and already tagged values come back unchanged.
	pub fn encrypt(&self, plaintext: &str) -> CipherResult<String> {
		if plaintext.is_empty() || is_encrypted(plaintext) {
			return Ok(plaintext.to_string());
		}

		let mut nonce_bytes = [0u8; NONCE_SIZE];
		OsRng.fill_bytes(&mut nonce_bytes);
		let nonce = Nonce::from_slice(&nonce_bytes);

		let ciphertext = self
			.cipher
			.encrypt(nonce, plaintext.as_bytes())
			.map_err(|_| CipherError::Encryption)?;

		let mut payload = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
		payload.extend_from_slice(&nonce_bytes);
		payload.extend_from_slice(&ciphertext);

		Ok(format!(
			"{MARKER}{KEY_VERSION}:{}",
			URL_SAFE_NO_PAD.encode(payload)
		))
	}

	/// Open a tagged value. Empty and untagged values come back unchanged.
	pub fn decrypt(&self, value: &str) -> CipherResult<String> {
		let Some(rest) = value.strip_prefix(MARKER) else {
			return Ok(value.to_string());
		};

		let (version, encoded) = rest
			.split_once(':')
			.ok_or(DecryptFailure::InvalidEncoding)?;
		if version != KEY_VERSION {
			return Err(DecryptFailure::UnsupportedKeyVersion(version.to_string()).into());
		}

		let payload = URL_SAFE_NO_PAD
			.decode(encoded)
			.map_err(|_| DecryptFailure::InvalidEncoding)?;
		if payload.len() < NONCE_SIZE + TAG_SIZE {
			return Err(DecryptFailure::Truncated.into());
		}

		let (nonce_bytes, ciphertext) = payload.split_at(NONCE_SIZE);
		let plaintext = Zeroizing::new(
			self.cipher
				.decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
				.map_err(|_| DecryptFailure::Authentication)?,
		);

		String::from_utf8(plaintext.to_vec()).map_err(|_| DecryptFailure::InvalidUtf8.into())
	}

	pub fn encrypt_opt(&self, value: Option<&str>) -> CipherResult<Option<String>> {
		value.map(|v| self.encrypt(v)).transpose()
	}

	pub fn decrypt_opt(&self, value: Option<&str>) -> CipherResult<Option<String>> {
		value.map(|v| self.decrypt(v)).transpose()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use std::sync::OnceLock;

	fn cipher() -> &'static SecretCipher {
		static CIPHER: OnceLock<SecretCipher> = OnceLock::new();
		CIPHER.get_or_init(|| SecretCipher::new(&SecretString::from("test-master-secret")).unwrap())
	}

	fn other_cipher() -> &'static SecretCipher {
		static CIPHER: OnceLock<SecretCipher> = OnceLock::new();
		CIPHER.get_or_init(|| SecretCipher::new(&SecretString::from("another-master-secret")).unwrap())
	}

	fn tamper(value: &str, index: usize) -> String {
		let encoded = value
			.strip_prefix(MARKER)
			.and_then(|rest| rest.split_once(':'))
			.map(|(_, encoded)| encoded)
			.unwrap();
		let mut payload = URL_SAFE_NO_PAD.decode(encoded).unwrap();
		let i = index % payload.len();
		payload[i] ^= 0x01;
		format!("{MARKER}{KEY_VERSION}:{}", URL_SAFE_NO_PAD.encode(payload))
	}

	#[test]
	fn encrypt_produces_tagged_value() {
		let sealed = cipher().encrypt("hunter2").unwrap();
		assert!(sealed.starts_with("cairn:enc:v1:"));
		assert!(is_encrypted(&sealed));
		assert_ne!(sealed, "hunter2");
	}

	#[test]
	fn nonces_are_fresh() {
		let a = cipher().encrypt("same").unwrap();
		let b = cipher().encrypt("same").unwrap();
		assert_ne!(a, b);
	}

	#[test]
	fn empty_value_passes_through_both_ways() {
		assert_eq!(cipher().encrypt("").unwrap(), "");
		assert_eq!(cipher().decrypt("").unwrap(), "");
	}

	#[test]
	fn untagged_value_is_returned_unchanged() {
		assert_eq!(
			cipher().decrypt("legacy-plaintext").unwrap(),
			"legacy-plaintext"
		);
	}

	#[test]
	fn wrong_key_fails_authentication() {
		let sealed = cipher().encrypt("hunter2").unwrap();
		let err = other_cipher().decrypt(&sealed).unwrap_err();
		assert!(matches!(
			err,
			CipherError::Decryption(DecryptFailure::Authentication)
		));
	}

	#[test]
	fn unknown_key_version_is_reported() {
		let sealed = cipher().encrypt("hunter2").unwrap();
		let rotated = sealed.replacen(":v1:", ":v2:", 1);
		let err = cipher().decrypt(&rotated).unwrap_err();
		assert!(matches!(
			err,
			CipherError::Decryption(DecryptFailure::UnsupportedKeyVersion(ref v)) if v == "v2"
		));
	}

	#[test]
	fn malformed_payloads_are_classified() {
		let err = cipher().decrypt("cairn:enc:v1:!!!").unwrap_err();
		assert!(matches!(
			err,
			CipherError::Decryption(DecryptFailure::InvalidEncoding)
		));

		let short = format!("{MARKER}{KEY_VERSION}:{}", URL_SAFE_NO_PAD.encode([0u8; 8]));
		let err = cipher().decrypt(&short).unwrap_err();
		assert!(matches!(err, CipherError::Decryption(DecryptFailure::Truncated)));

		let err = cipher().decrypt("cairn:enc:").unwrap_err();
		assert!(matches!(
			err,
			CipherError::Decryption(DecryptFailure::InvalidEncoding)
		));
	}

	#[test]
	fn optional_helpers_keep_none() {
		assert_eq!(cipher().encrypt_opt(None).unwrap(), None);
		assert_eq!(cipher().decrypt_opt(None).unwrap(), None);
		let sealed = cipher().encrypt_opt(Some("pw")).unwrap().unwrap();
		assert_eq!(cipher().decrypt_opt(Some(&sealed)).unwrap().as_deref(), Some("pw"));
	}

	#[test]
	fn debug_does_not_leak_key() {
		let rendered = format!("{:?}", cipher());
		assert!(rendered.contains("SecretCipher"));
		assert!(rendered.contains("v1"));
	}

	proptest! {
		#[test]
		fn round_trip(plaintext in "\\PC{1,128}") {
			let sealed = cipher().encrypt(&plaintext).unwrap();
			prop_assert_eq!(cipher().decrypt(&sealed).unwrap(), plaintext);
		}

		#[test]
		fn encrypt_is_idempotent(plaintext in "\\PC{1,64}") {
			let sealed = cipher().encrypt(&plaintext).unwrap();
			prop_assert_eq!(cipher().encrypt(&sealed).unwrap(), sealed);
		}

		#[test]
		fn untagged_decrypt_is_identity(value in "[a-zA-Z0-9 !@#$%^&*()_+=-]{0,64}") {
			prop_assume!(!value.starts_with(MARKER));
			prop_assert_eq!(cipher().decrypt(&value).unwrap(), value);
		}

		#[test]
		fn tampering_is_detected(plaintext in "\\PC{1,64}", index in any::<usize>()) {
			let sealed = cipher().encrypt(&plaintext).unwrap();
			let tampered = tamper(&sealed, index);
			let result = cipher().decrypt(&tampered);
			prop_assert!(matches!(
				result,
				Err(CipherError::Decryption(DecryptFailure::Authentication))
			));
		}
	}
}
