// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secret wrapper types for Cairn.
//!
//! - [`Secret<T>`]: wraps a sensitive value so that `Debug` and `Display`
//!   print [`REDACTED`] and the value is zeroized on drop
//! - [`load_secret_env`]: loads a secret from `NAME` or from the file named
//!   by `NAME_FILE`

pub mod env;

use std::fmt;

use zeroize::Zeroize;

pub use env::{load_secret_env, SecretEnvError};

/// Placeholder printed instead of a secret value.
pub const REDACTED: &str = "[REDACTED]";

/// A value that must never be logged.
///
/// The only way to read the inner value is [`Secret::expose`], which keeps
/// every access greppable.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret<T: Zeroize>(T);

/// The common case: a secret string.
pub type SecretString = Secret<String>;

impl<T: Zeroize> Secret<T> {
	pub fn new(value: T) -> Self {
		Self(value)
	}

	/// Borrow the wrapped value.
	pub fn expose(&self) -> &T {
		&self.0
	}
}

impl SecretString {
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl<T: Zeroize> Drop for Secret<T> {
	fn drop(&mut self) {
		self.0.zeroize();
	}
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Secret({REDACTED})")
	}
}

impl<T: Zeroize> fmt::Display for Secret<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Self(value)
	}
}

impl From<&str> for SecretString {
	fn from(value: &str) -> Self {
		Self(value.to_string())
	}
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for Secret<T>
where
	T: Zeroize + serde::Deserialize<'de>,
{
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		T::deserialize(deserializer).map(Secret)
	}
}

/// Secrets serialize as [`REDACTED`]; they are never written back out.
#[cfg(feature = "serde")]
impl<T: Zeroize> serde::Serialize for Secret<T> {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_str(REDACTED)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn debug_and_display_are_redacted() {
		let secret = SecretString::from("hunter2");
		assert_eq!(format!("{secret}"), REDACTED);
		assert!(!format!("{secret:?}").contains("hunter2"));
	}

	#[test]
	fn expose_returns_inner_value() {
		let secret = SecretString::new("hunter2".to_string());
		assert_eq!(secret.expose(), "hunter2");
	}

	#[test]
	fn serializes_as_redacted() {
		let secret = SecretString::from("hunter2");
		let json = serde_json::to_string(&secret).unwrap();
		assert_eq!(json, format!("\"{REDACTED}\""));
	}

	#[test]
	fn deserializes_transparently() {
		let secret: SecretString = serde_json::from_str("\"hunter2\"").unwrap();
		assert_eq!(secret.expose(), "hunter2");
	}

	proptest! {
		#[test]
		fn formatting_never_leaks(value in "[a-zA-Z0-9]{8,64}") {
			let secret = SecretString::from(value.clone());
			let displayed = format!("{}", secret);
			let debugged = format!("{:?}", secret);
			prop_assert!(!displayed.contains(&value));
			prop_assert!(!debugged.contains(&value));
		}
	}
}
