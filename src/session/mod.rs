//! Request session state
//!
//! Derives the two facts the route guard cares about — is an access
//! credential present, and has the email behind it been verified — from the
//! request's `Cookie` header. Absent or malformed cookies are a valid
//! "logged out" state, never an error.

use axum::http::{header, HeaderMap};

/// Cookie carrying the access credential.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Cookie carrying the email-verified flag.
pub const EMAIL_VERIFIED_COOKIE: &str = "emailVerified";

/// Per-request authentication facts.
///
/// Derived fresh for every request and dropped with it; nothing here is
/// retained or persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    /// An access credential cookie is present and non-empty.
    pub has_access_credential: bool,
    /// The email-verified cookie parsed to true.
    pub email_verified: bool,
}

impl SessionState {
    /// A fully anonymous state (no credential, not verified).
    pub fn anonymous() -> Self {
        SessionState {
            has_access_credential: false,
            email_verified: false,
        }
    }

    /// Read the session state from request headers.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let has_access_credential = extract_cookie_value(headers, ACCESS_TOKEN_COOKIE).is_some();
        let email_verified = extract_cookie_value(headers, EMAIL_VERIFIED_COOKIE)
            .map(|v| parse_verified_flag(&v))
            .unwrap_or(false);
        SessionState {
            has_access_credential,
            email_verified,
        }
    }
}

/// Parse a stringly-typed verification flag into a strict boolean.
///
/// Only `"true"` (any case) and `"1"` count; everything else — including
/// truthy-looking strings like `"yes"` — is false.
pub fn parse_verified_flag(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.eq_ignore_ascii_case("true") || trimmed == "1"
}

/// Extract a single cookie value from the `Cookie` header.
fn extract_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie = headers.get(header::COOKIE)?;
    let cookie_str = cookie.to_str().ok()?;
    let prefix = format!("{}=", name);

    cookie_str
        .split(';')
        .map(|part| part.trim())
        .find_map(|part| part.strip_prefix(&prefix).map(|value| value.to_string()))
        .filter(|value| !value.is_empty())
}
