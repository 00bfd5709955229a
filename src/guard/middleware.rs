//! Axum middleware applying route-guard decisions.
//!
//! Reads the session cookies, evaluates the [`RoutePolicy`](super::RoutePolicy)
//! for matched paths, and turns `Redirect` decisions into 307 responses with
//! the continuation path in the `next` query parameter. Unmatched paths pass
//! straight through without touching the rule set.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::{Decision, RoutePolicy};
use crate::session::SessionState;

/// Route-guard middleware. Use with `middleware::from_fn_with_state`.
pub async fn route_guard_middleware(
    policy: axum::extract::State<Arc<RoutePolicy>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if !policy.applies_to(&path) {
        return next.run(request).await;
    }

    let state = SessionState::from_headers(request.headers());
    match policy.decide(&path, &state) {
        Decision::Allow => next.run(request).await,
        decision @ Decision::Redirect { .. } => {
            // location() is Some for every Redirect decision.
            let location = decision.location().unwrap_or_default();
            debug!(target: "guard", path = %path, location = %location, "redirecting");
            redirect_response(&location)
        }
    }
}

/// Build a 307 redirect response. The target is always a gateway-local path
/// assembled from configured values, so an unparseable header is unreachable;
/// fall back to an empty 500 rather than panic if it ever happens.
fn redirect_response(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => Response::builder()
            .status(StatusCode::TEMPORARY_REDIRECT)
            .header(header::LOCATION, value)
            .body(Body::empty())
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}
