// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authentication primitives for the Whispers server.
//!
//! This crate defines:
//!
//! - [`Identity`] - the resolved view of an authenticated user (subject,
//!   username, email, groups), built from identity-provider claims
//! - [`IdentityResolver`] - capability trait separating access decisions
//!   from the live OIDC dependency
//! - [`SessionCodec`] - HMAC-signed stateless session cookies
//! - Cookie header extraction helpers shared by the server's extractors

pub mod identity;
pub mod middleware;
pub mod session;

pub use identity::{Identity, IdentityError, IdentityResolver};
pub use middleware::{
	extract_session_cookie, extract_session_cookie_with_name, SESSION_COOKIE_NAME,
};
pub use session::{
	clear_session_cookie_header, session_cookie_header, SessionCodec, SessionData, SessionError,
};
