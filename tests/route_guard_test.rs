//! Route guard integration tests
//!
//! Covers the guard's decision table end to end: the pure rule set over
//! path/session combinations, and the middleware behavior through the full
//! router (redirect status, Location header, continuation parameter).

use gatehouse::guard::{Decision, RoutePolicy};
use gatehouse::session::SessionState;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use gatehouse::embed::relay::{ChatBackend, ChatReply, ChatRequest, RelayError};
use gatehouse::server::http::{create_router, AppState, HttpConfig};
use std::sync::Arc;
use tower::ServiceExt;

struct NullBackend;

#[async_trait]
impl ChatBackend for NullBackend {
    async fn send(&self, _request: &ChatRequest) -> Result<ChatReply, RelayError> {
        Err(RelayError::Network("unused".to_string()))
    }
}

fn state(cred: bool, verified: bool) -> SessionState {
    SessionState {
        has_access_credential: cred,
        email_verified: verified,
    }
}

// ============================================================================
// Decision table
// ============================================================================

#[test]
fn test_protected_paths_without_credential_redirect_to_login() {
    let policy = RoutePolicy::default();

    for path in [
        "/dashboard",
        "/dashboard/agents",
        "/dashboard/agents/42/settings",
    ] {
        for verified in [false, true] {
            let decision = policy.decide(path, &state(false, verified));
            assert_eq!(
                decision,
                Decision::Redirect {
                    target: "/login".to_string(),
                    continuation: Some(path.to_string()),
                },
                "path={} verified={}",
                path,
                verified
            );
        }
    }
}

#[test]
fn test_protected_paths_with_unverified_credential_redirect_to_verify() {
    let policy = RoutePolicy::default();

    for path in ["/dashboard", "/dashboard/settings"] {
        let decision = policy.decide(path, &state(true, false));
        assert_eq!(
            decision,
            Decision::Redirect {
                target: "/verify-email".to_string(),
                continuation: Some(path.to_string()),
            }
        );
    }
}

#[test]
fn test_protected_paths_with_verified_session_allow() {
    let policy = RoutePolicy::default();
    assert_eq!(
        policy.decide("/dashboard/agents", &state(true, true)),
        Decision::Allow
    );
}

#[test]
fn test_auth_entry_pages_with_verified_session_redirect_to_dashboard() {
    let policy = RoutePolicy::default();

    for path in ["/login", "/register"] {
        let decision = policy.decide(path, &state(true, true));
        assert_eq!(
            decision,
            Decision::Redirect {
                target: "/dashboard".to_string(),
                continuation: None,
            }
        );
    }
}

#[test]
fn test_auth_entry_pages_with_unverified_credential_allow() {
    // The user may still switch accounts or sign out.
    let policy = RoutePolicy::default();
    assert_eq!(policy.decide("/login", &state(true, false)), Decision::Allow);
    assert_eq!(
        policy.decide("/register", &state(true, false)),
        Decision::Allow
    );
}

#[test]
fn test_verify_email_page_decisions() {
    let policy = RoutePolicy::default();

    assert_eq!(
        policy.decide("/verify-email", &state(true, true)),
        Decision::Redirect {
            target: "/dashboard".to_string(),
            continuation: None,
        }
    );
    assert_eq!(
        policy.decide("/verify-email", &state(true, false)),
        Decision::Allow
    );
    assert_eq!(
        policy.decide("/verify-email", &state(false, false)),
        Decision::Allow
    );
}

#[test]
fn test_paths_outside_matcher_set_bypass_rules() {
    let policy = RoutePolicy::default();

    for path in ["/", "/pricing", "/agent/a.js", "/public/agent/a", "/health"] {
        assert!(!policy.applies_to(path));
        for (cred, verified) in [(false, false), (true, false), (true, true)] {
            assert_eq!(
                policy.decide(path, &state(cred, verified)),
                Decision::Allow,
                "path={}",
                path
            );
        }
    }
}

// ============================================================================
// Middleware through the full router
// ============================================================================

fn test_router() -> axum::Router {
    create_router(AppState::new(HttpConfig::default(), Arc::new(NullBackend)))
}

fn get_request(path: &str, cookies: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(cookies) = cookies {
        builder = builder.header(header::COOKIE, cookies);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_redirect_carries_encoded_continuation() {
    let router = test_router();
    let response = router
        .oneshot(get_request("/dashboard/agents", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/login?next=%2Fdashboard%2Fagents"
    );
}

#[tokio::test]
async fn test_unverified_session_sent_to_verify_email() {
    let router = test_router();
    let response = router
        .oneshot(get_request("/dashboard", Some("accessToken=tok")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/verify-email?next=%2Fdashboard"
    );
}

#[tokio::test]
async fn test_verified_session_reaches_dashboard() {
    let router = test_router();
    let response = router
        .oneshot(get_request(
            "/dashboard",
            Some("accessToken=tok; emailVerified=true"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_verified_cookie_treated_as_unverified() {
    let router = test_router();
    let response = router
        .oneshot(get_request(
            "/dashboard",
            Some("accessToken=tok; emailVerified=yes"),
        ))
        .await
        .unwrap();

    // "yes" is not a strict true: still redirected to verification.
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/verify-email?next=%2Fdashboard"
    );
}

#[tokio::test]
async fn test_verified_session_bounced_from_login() {
    let router = test_router();
    let response = router
        .oneshot(get_request(
            "/login",
            Some("accessToken=tok; emailVerified=1"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/dashboard"
    );
}

#[tokio::test]
async fn test_widget_delivery_not_guarded() {
    // No cookies at all: widget delivery must still work.
    let router = test_router();
    let response = router
        .oneshot(get_request("/agent/demo.js", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
