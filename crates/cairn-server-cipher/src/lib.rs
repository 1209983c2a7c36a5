// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential-at-rest protection for Cairn.
//!
//! A [`SecretCipher`] derives an AES-256 key from the server master secret
//! once, then seals credential strings into self-identifying tagged
//! ciphertext:
//!
//! ```text
//! cairn:enc:v1:<base64url(nonce || ciphertext || tag)>
//! ```
//!
//! Untagged values pass through [`SecretCipher::decrypt`] unchanged so rows
//! written before encryption was introduced stay readable, and tagged values
//! pass through [`SecretCipher::encrypt`] unchanged so sealing is idempotent.

mod cipher;
mod error;
mod kdf;

pub use cipher::{is_encrypted, SecretCipher, KEY_VERSION, MARKER, NONCE_SIZE, TAG_SIZE};
pub use error::{CipherError, CipherResult, DecryptFailure};
pub use kdf::{derive_key, KDF_ITERATIONS, KDF_SALT, KEY_SIZE};
