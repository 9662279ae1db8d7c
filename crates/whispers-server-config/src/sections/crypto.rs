// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! At-rest encryption configuration.

use whispers_common_secret::SecretString;

/// Encryption configuration (runtime, fully resolved).
///
/// The key is the standard base64 encoding of 32 random bytes and loads
/// exclusively from `WHISPERS_SERVER_ENCRYPTION_KEY` (or its `_FILE`
/// indirection); it never appears in a config file. Decoding and length
/// validation happen when the cipher is constructed at startup.
#[derive(Debug, Clone)]
pub struct CryptoConfig {
	pub encryption_key: SecretString,
}
