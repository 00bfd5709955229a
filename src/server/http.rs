//! HTTP server implementation
//!
//! Implements:
//! - Widget delivery (GET /agent/{agentId}.js)
//! - Public chat surface (GET /public/agent/{agentId}, POST /public/chat)
//! - Guarded dashboard/auth pages (route-guard middleware + placeholders)
//! - Health endpoint (GET /health)
//! - Security headers middleware (dashboard vs. embeddable profiles)
//!
//! The dashboard pages themselves are out of scope — the guarded routes
//! serve minimal markup so the guard has something to protect.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::defaults::DEFAULT_BACKEND_BASE_URL;
use crate::embed::page::{render_chat_page, PageQuery};
use crate::embed::relay::{perform_send, ChatBackend, SendOutcome, DEFAULT_TIMEOUT};
use crate::embed::session::SessionRegistry;
use crate::guard::middleware::route_guard_middleware;
use crate::guard::RoutePolicy;
use crate::server::bind;
use crate::server::headers::{security_headers_middleware, SecurityHeadersConfig};
use crate::server::health;
use crate::widget::script::{is_safe_agent_id, synthesize};

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Deployment base URL embedded into synthesized scripts
    pub public_base_url: String,
    /// Chat backend base URL
    pub backend_base_url: String,
    /// Backend request timeout
    pub backend_timeout: Duration,
    /// Route guard policy
    pub policy: RoutePolicy,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            public_base_url: format!("http://127.0.0.1:{}", bind::DEFAULT_PORT),
            backend_base_url: DEFAULT_BACKEND_BASE_URL.to_string(),
            backend_timeout: DEFAULT_TIMEOUT,
            policy: RoutePolicy::default(),
        }
    }
}

/// Build an `HttpConfig` from the loaded JSON configuration.
///
/// When `gateway.publicBaseUrl` is absent, the base URL is derived from the
/// configured port on loopback.
pub fn build_http_config(cfg: &Value) -> HttpConfig {
    let gateway = cfg.get("gateway").and_then(|v| v.as_object());
    let chat = cfg.get("chat").and_then(|v| v.as_object());

    let port = gateway
        .and_then(|g| g.get("port"))
        .and_then(|v| v.as_u64())
        .map(|p| p as u16)
        .unwrap_or(bind::DEFAULT_PORT);

    let public_base_url = gateway
        .and_then(|g| g.get("publicBaseUrl"))
        .and_then(|v| v.as_str())
        .map(|s| s.trim_end_matches('/').to_string())
        .unwrap_or_else(|| format!("http://127.0.0.1:{}", port));

    let backend_base_url = chat
        .and_then(|c| c.get("backendBaseUrl"))
        .and_then(|v| v.as_str())
        .unwrap_or(DEFAULT_BACKEND_BASE_URL)
        .trim_end_matches('/')
        .to_string();

    let backend_timeout = chat
        .and_then(|c| c.get("timeoutMs"))
        .and_then(|v| v.as_u64())
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_TIMEOUT);

    HttpConfig {
        public_base_url,
        backend_base_url,
        backend_timeout,
        policy: RoutePolicy::from_config(cfg),
    }
}

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub http_config: Arc<HttpConfig>,
    pub sessions: Arc<SessionRegistry>,
    pub backend: Arc<dyn ChatBackend>,
    pub version: String,
    pub start_time: i64,
}

impl AppState {
    pub fn new(http_config: HttpConfig, backend: Arc<dyn ChatBackend>) -> Self {
        AppState {
            http_config: Arc::new(http_config),
            sessions: Arc::new(SessionRegistry::new()),
            backend,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: chrono::Utc::now().timestamp(),
        }
    }
}

/// Assemble the full router: guarded pages, public widget/embed surface,
/// and system endpoints.
pub fn create_router(state: AppState) -> Router {
    let policy = Arc::new(state.http_config.policy.clone());
    let dashboard_headers = Arc::new(SecurityHeadersConfig::for_dashboard());
    let embed_headers = Arc::new(SecurityHeadersConfig::for_embed());

    // Widget delivery and the chat surface: reachable from third-party
    // origins, frameable, never guarded.
    let public = Router::new()
        .route("/agent/:file", get(widget_script_handler))
        .route("/public/agent/:agent_id", get(embed_page_handler))
        .route("/public/chat", post(chat_relay_handler))
        .layer(middleware::from_fn_with_state(
            embed_headers,
            security_headers_middleware,
        ))
        .with_state(state.clone());

    // Dashboard and auth pages behind the route guard.
    let pages = Router::new()
        .route("/", get(landing_page))
        .route("/dashboard", get(dashboard_page))
        .route("/dashboard/*rest", get(dashboard_page))
        .route("/login", get(login_page))
        .route("/register", get(register_page))
        .route("/verify-email", get(verify_email_page))
        .layer(middleware::from_fn_with_state(
            policy,
            route_guard_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            dashboard_headers,
            security_headers_middleware,
        ))
        .with_state(state.clone());

    let system = Router::new()
        .route("/health", get(health::health_handler))
        .with_state(state);

    pages.merge(public).merge(system)
}

/// GET /agent/{agentId}.js — synthesized widget bootstrap.
async fn widget_script_handler(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Response {
    let Some(agent_id) = file.strip_suffix(".js").filter(|id| is_safe_agent_id(id)) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    debug!(target: "widget", agent = %agent_id, "serving widget script");
    let script = synthesize(agent_id, &state.http_config.public_base_url);

    (
        [
            (
                header::CONTENT_TYPE,
                "application/javascript; charset=utf-8",
            ),
            (header::CACHE_CONTROL, "public, max-age=300"),
        ],
        script,
    )
        .into_response()
}

/// GET /public/agent/{agentId} — chat surface page.
async fn embed_page_handler(
    Path(agent_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    if !is_safe_agent_id(&agent_id) {
        return StatusCode::NOT_FOUND.into_response();
    }
    Html(render_chat_page(&agent_id, &query)).into_response()
}

/// Body of POST /public/chat.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSendBody {
    pub agent_id: String,
    pub message: String,
    pub session_id: String,
}

/// POST /public/chat — relay one send through the embed session.
async fn chat_relay_handler(
    State(state): State<AppState>,
    Json(body): Json<ChatSendBody>,
) -> Response {
    if body.agent_id.trim().is_empty() || body.session_id.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "agentId and sessionId are required" })),
        )
            .into_response();
    }

    let outcome = perform_send(
        &state.sessions,
        state.backend.as_ref(),
        &body.agent_id,
        &body.session_id,
        &body.message,
    )
    .await;

    match outcome {
        SendOutcome::Ignored => StatusCode::NO_CONTENT.into_response(),
        SendOutcome::Replied(turn) => (StatusCode::OK, Json(turn)).into_response(),
    }
}

// Placeholder pages for the guarded area. The real dashboard UI is an
// external collaborator; these give the guard something to protect.

fn placeholder_page(title: &str) -> Html<String> {
    Html(format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
         <body><h1>{title}</h1></body></html>"
    ))
}

async fn landing_page() -> Html<String> {
    placeholder_page("Gatehouse")
}

async fn dashboard_page() -> Html<String> {
    placeholder_page("Dashboard")
}

async fn login_page() -> Html<String> {
    placeholder_page("Sign in")
}

async fn register_page() -> Html<String> {
    placeholder_page("Create account")
}

async fn verify_email_page() -> Html<String> {
    placeholder_page("Verify your email")
}
