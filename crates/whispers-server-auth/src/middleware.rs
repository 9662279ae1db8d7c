// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request-side helpers for extracting the session cookie.
//!
//! The axum extractors live in the server crate; this module holds the
//! framework-independent pieces so they can be tested against plain
//! [`http::HeaderMap`] values.

use http::header::COOKIE;
use http::HeaderMap;

/// Default name for the session cookie.
pub const SESSION_COOKIE_NAME: &str = "whispers_session";

/// Extract the session cookie value from the Cookie header.
///
/// Uses the default cookie name ([`SESSION_COOKIE_NAME`]).
pub fn extract_session_cookie(headers: &HeaderMap) -> Option<String> {
	extract_session_cookie_with_name(headers, SESSION_COOKIE_NAME)
}

/// Extract the session cookie value from the Cookie header with a custom
/// cookie name.
///
/// # Returns
///
/// The cookie value if found, or `None` if the cookie is not present.
pub fn extract_session_cookie_with_name(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
	headers
		.get(COOKIE)?
		.to_str()
		.ok()?
		.split(';')
		.find_map(|cookie| {
			let cookie = cookie.trim();
			let (name, value) = cookie.split_once('=')?;

			if name == cookie_name {
				Some(value.to_string())
			} else {
				None
			}
		})
}

#[cfg(test)]
mod tests {
	use super::*;
	use http::HeaderValue;

	fn headers_with_cookie(value: &str) -> HeaderMap {
		let mut headers = HeaderMap::new();
		headers.insert(COOKIE, HeaderValue::from_str(value).unwrap());
		headers
	}

	#[test]
	fn extracts_lone_cookie() {
		let headers = headers_with_cookie("whispers_session=abc123");
		assert_eq!(extract_session_cookie(&headers).as_deref(), Some("abc123"));
	}

	#[test]
	fn extracts_among_multiple_cookies() {
		let headers = headers_with_cookie("other=1; whispers_session=abc123; theme=dark");
		assert_eq!(extract_session_cookie(&headers).as_deref(), Some("abc123"));
	}

	#[test]
	fn missing_cookie_returns_none() {
		let headers = headers_with_cookie("other=1; theme=dark");
		assert!(extract_session_cookie(&headers).is_none());
	}

	#[test]
	fn no_cookie_header_returns_none() {
		assert!(extract_session_cookie(&HeaderMap::new()).is_none());
	}

	#[test]
	fn custom_cookie_name_is_honored() {
		let headers = headers_with_cookie("my_session=xyz");
		assert_eq!(
			extract_session_cookie_with_name(&headers, "my_session").as_deref(),
			Some("xyz")
		);
		assert!(extract_session_cookie(&headers).is_none());
	}

	#[test]
	fn name_must_match_exactly() {
		let headers = headers_with_cookie("whispers_session2=abc");
		assert!(extract_session_cookie(&headers).is_none());
	}
}
