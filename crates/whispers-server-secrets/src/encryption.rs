// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! At-rest encryption for secret content.
//!
//! Uses AES-256-GCM under a single process-wide key supplied through
//! configuration as standard base64 of 32 random bytes. Plaintext is never
//! persisted; each row stores its ciphertext and the nonce it was sealed
//! with.

use aes_gcm::{
	aead::{Aead, KeyInit, OsRng},
	Aes256Gcm, Key, Nonce,
};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

use crate::error::{SecretsError, SecretsResult};

/// Size of encryption keys in bytes (256 bits for AES-256).
pub const KEY_SIZE: usize = 32;

/// Size of AES-GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// Encrypted data with nonce.
#[derive(Debug, Clone)]
pub struct EncryptedData {
	pub ciphertext: Vec<u8>,
	pub nonce: [u8; NONCE_SIZE],
}

/// Generate a random encryption key.
pub fn generate_key() -> Zeroizing<[u8; KEY_SIZE]> {
	let mut key = Zeroizing::new([0u8; KEY_SIZE]);
	OsRng.fill_bytes(key.as_mut());
	key
}

/// Generate a random nonce.
///
/// Uses 96-bit random nonces from OsRng. The same (key, nonce) pair must
/// never be reused; AES-GCM has a 2^-32 collision probability after
/// approximately 2^32 encryptions with the same key - well beyond expected
/// volumes for short-lived shared secrets. If encryption volumes grow very
/// large under a single key, consider a counter-based nonce scheme.
pub fn generate_nonce() -> [u8; NONCE_SIZE] {
	let mut nonce = [0u8; NONCE_SIZE];
	OsRng.fill_bytes(&mut nonce);
	nonce
}

/// The process-wide cipher used to seal and open secret content.
#[derive(Clone)]
pub struct SecretCipher {
	cipher: Aes256Gcm,
}

impl SecretCipher {
	/// Create a cipher from a raw 32-byte key.
	pub fn new(key: &[u8; KEY_SIZE]) -> Self {
		let key = Key::<Aes256Gcm>::from_slice(key);
		Self {
			cipher: Aes256Gcm::new(key),
		}
	}

	/// Create a cipher from the standard base64 encoding of a 32-byte key.
	///
	/// # Errors
	///
	/// Returns [`SecretsError::Encryption`] on undecodable input and
	/// [`SecretsError::InvalidKeySize`] when the decoded key is not exactly
	/// [`KEY_SIZE`] bytes.
	pub fn from_base64(encoded: &str) -> SecretsResult<Self> {
		let mut decoded: Zeroizing<Vec<u8>> = Zeroizing::new(
			BASE64_STANDARD
				.decode(encoded.trim())
				.map_err(|e| SecretsError::Encryption(format!("key is not valid base64: {e}")))?,
		);

		if decoded.len() != KEY_SIZE {
			let actual = decoded.len();
			decoded.zeroize();
			return Err(SecretsError::InvalidKeySize {
				expected: KEY_SIZE,
				actual,
			});
		}

		let mut key = Zeroizing::new([0u8; KEY_SIZE]);
		key.copy_from_slice(&decoded);
		Ok(Self::new(&key))
	}

	/// Encrypt plaintext under a freshly generated nonce.
	pub fn encrypt(&self, plaintext: &[u8]) -> SecretsResult<EncryptedData> {
		let nonce_bytes = generate_nonce();
		let nonce = Nonce::from_slice(&nonce_bytes);

		let ciphertext = self
			.cipher
			.encrypt(nonce, plaintext)
			.map_err(|e| SecretsError::Encryption(format!("secret encryption failed: {e}")))?;

		Ok(EncryptedData {
			ciphertext,
			nonce: nonce_bytes,
		})
	}

	/// Decrypt previously sealed data.
	pub fn decrypt(&self, encrypted: &EncryptedData) -> SecretsResult<Zeroizing<Vec<u8>>> {
		let nonce = Nonce::from_slice(&encrypted.nonce);

		let plaintext = self
			.cipher
			.decrypt(nonce, encrypted.ciphertext.as_slice())
			.map_err(|e| SecretsError::Decryption(format!("secret decryption failed: {e}")))?;

		Ok(Zeroizing::new(plaintext))
	}
}

impl std::fmt::Debug for SecretCipher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SecretCipher").finish_non_exhaustive()
	}
}
