// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access policy for viewing secrets.
//!
//! Pure functions over a secret, an identity, and a point in time; no side
//! effects, no clock access. A secret is viewable by identity I at time T
//! iff T is before `expires_at` AND (both allow-lists are empty, OR I is in
//! `allowed_users`, OR I shares a group with `allowed_groups`).
//!
//! Empty allow-lists mean open to any authenticated identity. That is an
//! explicit design choice, surfaced in user-facing documentation, not a
//! fallback.

use chrono::{DateTime, Utc};
use whispers_server_auth::Identity;

use crate::types::SecretRecord;

/// Returns true if the identity may view the secret at time `now`.
///
/// Expired secrets are unviewable unconditionally, independent of
/// allow-list membership.
pub fn can_view(secret: &SecretRecord, identity: &Identity, now: DateTime<Utc>) -> bool {
	!is_expired(secret, now) && is_allowed(secret, identity)
}

/// Returns true once the secret's expiry has been reached.
///
/// Expiry is inclusive: at exactly `expires_at` the secret is gone.
pub fn is_expired(secret: &SecretRecord, now: DateTime<Utc>) -> bool {
	now >= secret.expires_at
}

/// Allow-list evaluation, ignoring expiry.
///
/// An entry in `allowed_users` matches either the identity's resolved
/// username or its raw OIDC subject.
pub fn is_allowed(secret: &SecretRecord, identity: &Identity) -> bool {
	if secret.allowed_users.is_empty() && secret.allowed_groups.is_empty() {
		return true;
	}

	if secret
		.allowed_users
		.iter()
		.any(|u| u == &identity.username || u == &identity.subject)
	{
		return true;
	}

	identity
		.groups
		.iter()
		.any(|g| secret.allowed_groups.contains(g))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::{generate_share_token, SecretId};
	use chrono::Duration;

	fn secret(allowed_users: &[&str], allowed_groups: &[&str]) -> SecretRecord {
		let now = Utc::now();
		SecretRecord {
			id: SecretId::generate(),
			token: generate_share_token(),
			title: None,
			ciphertext: vec![0u8; 16],
			nonce: [0u8; 12],
			owner: "owner".to_string(),
			allowed_users: allowed_users.iter().map(|s| s.to_string()).collect(),
			allowed_groups: allowed_groups.iter().map(|s| s.to_string()).collect(),
			created_at: now,
			expires_at: now + Duration::hours(1),
		}
	}

	fn identity(username: &str, groups: &[&str]) -> Identity {
		Identity {
			subject: format!("sub-{username}"),
			username: username.to_string(),
			email: None,
			groups: groups.iter().map(|s| s.to_string()).collect(),
		}
	}

	#[test]
	fn empty_allow_lists_admit_any_identity_before_expiry() {
		let secret = secret(&[], &[]);
		let now = Utc::now();
		assert!(can_view(&secret, &identity("anyone", &[]), now));
		assert!(can_view(&secret, &identity("else", &["g1"]), now));
	}

	#[test]
	fn nobody_views_at_or_after_expiry() {
		let secret = secret(&[], &[]);
		let viewer = identity("anyone", &[]);

		assert!(!can_view(&secret, &viewer, secret.expires_at));
		assert!(!can_view(
			&secret,
			&viewer,
			secret.expires_at + Duration::seconds(1)
		));
	}

	#[test]
	fn expiry_beats_allow_list_membership() {
		let secret = secret(&["alice"], &[]);
		let late = secret.expires_at + Duration::minutes(1);
		assert!(!can_view(&secret, &identity("alice", &[]), late));
	}

	#[test]
	fn listed_user_is_admitted() {
		let secret = secret(&["alice"], &[]);
		let now = Utc::now();
		assert!(can_view(&secret, &identity("alice", &[]), now));
		assert!(!can_view(&secret, &identity("bob", &[]), now));
	}

	#[test]
	fn subject_also_matches_user_allow_list() {
		let secret = secret(&["sub-alice"], &[]);
		assert!(can_view(&secret, &identity("alice", &[]), Utc::now()));
	}

	#[test]
	fn group_intersection_is_admitted() {
		let secret = secret(&[], &["ops", "sre"]);
		let now = Utc::now();
		assert!(can_view(&secret, &identity("carol", &["dev", "ops"]), now));
		assert!(!can_view(&secret, &identity("dave", &["dev"]), now));
	}

	#[test]
	fn user_list_miss_still_checks_groups() {
		let secret = secret(&["alice"], &["ops"]);
		let now = Utc::now();
		assert!(can_view(&secret, &identity("bob", &["ops"]), now));
		assert!(!can_view(&secret, &identity("bob", &["dev"]), now));
	}

	#[test]
	fn non_empty_lists_exclude_unlisted_identities() {
		let secret = secret(&["alice"], &["ops"]);
		assert!(!can_view(&secret, &identity("mallory", &[]), Utc::now()));
	}

	#[test]
	fn is_expired_boundary() {
		let secret = secret(&[], &[]);
		assert!(!is_expired(&secret, secret.expires_at - Duration::seconds(1)));
		assert!(is_expired(&secret, secret.expires_at));
	}
}
