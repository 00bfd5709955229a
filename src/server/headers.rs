//! Security headers middleware
//!
//! Adds security-related HTTP headers to responses. Two profiles matter
//! here: dashboard pages must never be framed, while the public chat
//! surface exists specifically to be framed by arbitrary third-party
//! origins — its profile allows any frame ancestor and drops
//! `X-Frame-Options` entirely.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, Response},
    middleware::Next,
};

/// Security headers configuration
#[derive(Debug, Clone)]
pub struct SecurityHeadersConfig {
    /// Content-Security-Policy header value
    pub csp: String,
    /// X-Frame-Options header value; `None` omits the header (embeddable
    /// responses)
    pub frame_options: Option<String>,
    /// X-Content-Type-Options header value
    pub content_type_options: String,
    /// Referrer-Policy header value
    pub referrer_policy: String,
}

impl Default for SecurityHeadersConfig {
    fn default() -> Self {
        Self::for_dashboard()
    }
}

impl SecurityHeadersConfig {
    /// Profile for dashboard and auth pages: same-origin everything, no
    /// framing.
    pub fn for_dashboard() -> Self {
        SecurityHeadersConfig {
            csp: concat!(
                "default-src 'self'; ",
                "script-src 'self'; ",
                "style-src 'self' 'unsafe-inline'; ",
                "img-src 'self' data:; ",
                "frame-ancestors 'none'; ",
                "base-uri 'self'; ",
                "form-action 'self'"
            )
            .to_string(),
            frame_options: Some("DENY".to_string()),
            content_type_options: "nosniff".to_string(),
            referrer_policy: "strict-origin-when-cross-origin".to_string(),
        }
    }

    /// Profile for the public chat surface: framed by any host page. The
    /// page carries its script and styles inline (it is itself generated),
    /// and talks back only to this gateway.
    pub fn for_embed() -> Self {
        SecurityHeadersConfig {
            csp: concat!(
                "default-src 'self'; ",
                "script-src 'self' 'unsafe-inline'; ",
                "style-src 'self' 'unsafe-inline'; ",
                "img-src 'self' data:; ",
                "connect-src 'self'; ",
                "frame-ancestors *; ",
                "base-uri 'self'; ",
                "form-action 'self'"
            )
            .to_string(),
            frame_options: None,
            content_type_options: "nosniff".to_string(),
            referrer_policy: "no-referrer".to_string(),
        }
    }
}

/// Security headers middleware function
///
/// Use with `axum::middleware::from_fn_with_state`.
pub async fn security_headers_middleware(
    config: axum::extract::State<Arc<SecurityHeadersConfig>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    if !config.csp.is_empty() {
        if let Ok(value) = config.csp.parse() {
            headers.insert(header::CONTENT_SECURITY_POLICY, value);
        }
    }

    if let Some(ref frame_options) = config.frame_options {
        if let Ok(value) = frame_options.parse() {
            headers.insert(header::X_FRAME_OPTIONS, value);
        }
    }

    if let Ok(value) = config.content_type_options.parse() {
        headers.insert(header::X_CONTENT_TYPE_OPTIONS, value);
    }

    if let Ok(value) = config.referrer_policy.parse() {
        headers.insert(header::REFERRER_POLICY, value);
    }

    response
}
