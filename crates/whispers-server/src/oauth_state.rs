// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory CSRF state for the OIDC login flow.
//!
//! `/auth/login` issues a random state and remembers the post-login
//! redirect target; `/auth/callback` consumes it exactly once. States are
//! single-use and expire after [`STATE_TTL`]; a periodic job sweeps the
//! leftovers from abandoned logins.

use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// How long an issued state stays valid.
pub const STATE_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone)]
pub struct StateEntry {
	/// Where to send the user after a successful callback.
	pub next: String,
	issued_at: Instant,
}

/// TTL-bounded store of outstanding OAuth states.
#[derive(Debug, Default)]
pub struct OAuthStateStore {
	entries: Mutex<HashMap<String, StateEntry>>,
}

impl OAuthStateStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Issue a fresh unguessable state bound to a redirect target.
	pub fn issue(&self, next: String) -> String {
		let mut bytes = [0u8; 16];
		OsRng.fill_bytes(&mut bytes);
		let state = hex::encode(bytes);

		self.entries.lock().expect("oauth state lock poisoned").insert(
			state.clone(),
			StateEntry {
				next,
				issued_at: Instant::now(),
			},
		);
		state
	}

	/// Consume a state, returning its entry if it exists and is fresh.
	///
	/// Consumption is destructive; replaying a state fails.
	pub fn consume(&self, state: &str) -> Option<StateEntry> {
		let entry = self
			.entries
			.lock()
			.expect("oauth state lock poisoned")
			.remove(state)?;

		if entry.issued_at.elapsed() > STATE_TTL {
			return None;
		}
		Some(entry)
	}

	/// Drop states older than [`STATE_TTL`]. Returns the number removed.
	pub fn purge_expired(&self) -> usize {
		let mut entries = self.entries.lock().expect("oauth state lock poisoned");
		let before = entries.len();
		entries.retain(|_, entry| entry.issued_at.elapsed() <= STATE_TTL);
		before - entries.len()
	}

	/// Number of outstanding states.
	pub fn len(&self) -> usize {
		self.entries.lock().expect("oauth state lock poisoned").len()
	}

	/// Returns true when no states are outstanding.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
