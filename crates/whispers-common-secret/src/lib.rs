// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secret wrapper types that prevent accidental logging of sensitive values.
//!
//! Configuration values such as OIDC client secrets, session signing keys,
//! and encryption keys must never reach logs, error messages, or serialized
//! API responses. [`Secret<T>`] wraps such a value so that `Debug`,
//! `Display`, and `Serialize` all produce [`REDACTED`]; the underlying value
//! is only reachable through an explicit [`Secret::expose`] call, and is
//! zeroized when the wrapper is dropped.
//!
//! [`SecretString`] is the common case of a wrapped `String`.

use std::fmt;

use zeroize::Zeroize;

/// Placeholder emitted wherever a secret would otherwise appear.
pub const REDACTED: &str = "[REDACTED]";

/// A sensitive value that refuses to display itself.
///
/// The inner value is zeroized on drop. Access requires an explicit
/// [`expose`](Secret::expose) call, which keeps accidental uses (format
/// strings, tracing fields, serialization) from leaking the value.
pub struct Secret<T: Zeroize> {
	inner: T,
}

/// A sensitive string value. See [`Secret`].
pub type SecretString = Secret<String>;

impl<T: Zeroize> Secret<T> {
	/// Wrap a sensitive value.
	pub fn new(value: T) -> Self {
		Self { inner: value }
	}

	/// Get a reference to the wrapped value.
	///
	/// Call sites should be easy to audit; never pass the result to a
	/// format string or tracing field.
	pub fn expose(&self) -> &T {
		&self.inner
	}
}

impl SecretString {
	/// Returns true if the wrapped string is empty.
	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}
}

impl<T: Zeroize> Drop for Secret<T> {
	fn drop(&mut self) {
		self.inner.zeroize();
	}
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T: Zeroize + PartialEq> PartialEq for Secret<T> {
	fn eq(&self, other: &Self) -> bool {
		self.inner == other.inner
	}
}

impl<T: Zeroize + Eq> Eq for Secret<T> {}

impl<T: Zeroize> fmt::Debug for Secret<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<T: Zeroize> fmt::Display for Secret<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<T: Zeroize> From<T> for Secret<T> {
	fn from(value: T) -> Self {
		Self::new(value)
	}
}

impl From<&str> for SecretString {
	fn from(value: &str) -> Self {
		Self::new(value.to_string())
	}
}

#[cfg(feature = "serde")]
impl<T: Zeroize> serde::Serialize for Secret<T> {
	/// Serializes as [`REDACTED`]. Secrets never leave the process through
	/// serialization; deserialize-only round-trips are intentional.
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_str(REDACTED)
	}
}

#[cfg(feature = "serde")]
impl<'de, T: Zeroize + serde::Deserialize<'de>> serde::Deserialize<'de> for Secret<T> {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		T::deserialize(deserializer).map(Self::new)
	}
}
