//! Route guard
//!
//! Pure per-request routing decisions: given the requested path and the
//! session state, decide whether to render the page or redirect the user to
//! login, email verification, or the dashboard. The guard produces a
//! [`Decision`]; applying it (issuing the actual redirect response) is the
//! serving layer's job — see [`middleware`].
//!
//! Only paths matched by the configured policy are evaluated at all; every
//! other path bypasses the rule set and is allowed without inspection.

pub mod middleware;

use serde_json::Value;

use crate::session::SessionState;

/// Default protected-area prefix.
pub const DEFAULT_PROTECTED_PREFIX: &str = "/dashboard";

/// Default login page path.
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Default registration page path.
pub const DEFAULT_REGISTER_PATH: &str = "/register";

/// Default email-verification page path.
pub const DEFAULT_VERIFY_EMAIL_PATH: &str = "/verify-email";

/// Query parameter carrying the continuation path on redirects.
pub const CONTINUATION_PARAM: &str = "next";

/// Routing decision for a single request.
///
/// Produced once per request and immediately consumed; never retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Proceed to render the requested page.
    Allow,
    /// Redirect to `target`, optionally preserving the original path so
    /// navigation can resume once the guard is satisfied.
    Redirect {
        target: String,
        continuation: Option<String>,
    },
}

impl Decision {
    fn redirect(target: &str) -> Self {
        Decision::Redirect {
            target: target.to_string(),
            continuation: None,
        }
    }

    fn redirect_with_continuation(target: &str, continuation: &str) -> Self {
        Decision::Redirect {
            target: target.to_string(),
            continuation: Some(continuation.to_string()),
        }
    }

    /// The `Location` header value for a redirect decision: the target path
    /// with the continuation attached as a percent-encoded `next` parameter.
    /// Returns `None` for [`Decision::Allow`].
    pub fn location(&self) -> Option<String> {
        match self {
            Decision::Allow => None,
            Decision::Redirect {
                target,
                continuation,
            } => Some(match continuation {
                Some(path) => format!(
                    "{}?{}={}",
                    target,
                    CONTINUATION_PARAM,
                    urlencoding::encode(path)
                ),
                None => target.clone(),
            }),
        }
    }
}

/// Path sets and redirect targets the guard evaluates against.
///
/// Built once from config at startup and shared read-only across requests.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    /// Prefixes requiring an authenticated, verified session.
    pub protected_prefixes: Vec<String>,
    /// Auth-entry pages (login/register).
    pub auth_entry_paths: Vec<String>,
    /// The email-verification page.
    pub verify_email_path: String,
    /// Redirect target for unauthenticated access to the protected area.
    pub login_path: String,
    /// Redirect target once the guard is fully satisfied.
    pub dashboard_path: String,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        RoutePolicy {
            protected_prefixes: vec![DEFAULT_PROTECTED_PREFIX.to_string()],
            auth_entry_paths: vec![
                DEFAULT_LOGIN_PATH.to_string(),
                DEFAULT_REGISTER_PATH.to_string(),
            ],
            verify_email_path: DEFAULT_VERIFY_EMAIL_PATH.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            dashboard_path: DEFAULT_PROTECTED_PREFIX.to_string(),
        }
    }
}

impl RoutePolicy {
    /// Build a policy from the `routes` section of the loaded config.
    /// Missing fields keep their defaults.
    pub fn from_config(cfg: &Value) -> Self {
        let mut policy = RoutePolicy::default();
        let Some(routes) = cfg.get("routes").and_then(|v| v.as_object()) else {
            return policy;
        };

        if let Some(prefixes) = routes.get("protectedPrefixes").and_then(|v| v.as_array()) {
            let parsed: Vec<String> = prefixes
                .iter()
                .filter_map(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect();
            if !parsed.is_empty() {
                policy.protected_prefixes = parsed;
            }
        }
        if let Some(path) = routes.get("loginPath").and_then(|v| v.as_str()) {
            policy.login_path = path.to_string();
        }
        if let Some(path) = routes.get("verifyEmailPath").and_then(|v| v.as_str()) {
            policy.verify_email_path = path.to_string();
        }
        if let Some(path) = routes.get("dashboardPath").and_then(|v| v.as_str()) {
            policy.dashboard_path = path.to_string();
        }

        let register = routes
            .get("registerPath")
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_REGISTER_PATH);
        policy.auth_entry_paths = vec![policy.login_path.clone(), register.to_string()];

        policy
    }

    /// Whether the guard evaluates this path at all. Paths outside the
    /// matcher set bypass the rule set entirely.
    pub fn applies_to(&self, path: &str) -> bool {
        self.is_protected(path)
            || self.is_auth_entry(path)
            || path == self.verify_email_path
    }

    /// Map a request to a routing decision. Rules are evaluated in order;
    /// the first match wins. Pure: no I/O, no side effects, no errors —
    /// absent or malformed credentials arrive here already folded into
    /// `state` as "not present"/"not verified".
    pub fn decide(&self, path: &str, state: &SessionState) -> Decision {
        if self.is_protected(path) {
            if !state.has_access_credential {
                return Decision::redirect_with_continuation(&self.login_path, path);
            }
            if !state.email_verified {
                return Decision::redirect_with_continuation(&self.verify_email_path, path);
            }
            return Decision::Allow;
        }

        if self.is_auth_entry(path) {
            if state.has_access_credential && state.email_verified {
                return Decision::redirect(&self.dashboard_path);
            }
            // Credential present but unverified: the user may still switch
            // accounts or sign out from here.
            return Decision::Allow;
        }

        if path == self.verify_email_path
            && state.has_access_credential
            && state.email_verified
        {
            return Decision::redirect(&self.dashboard_path);
        }

        Decision::Allow
    }

    fn is_protected(&self, path: &str) -> bool {
        self.protected_prefixes.iter().any(|p| path.starts_with(p))
    }

    fn is_auth_entry(&self, path: &str) -> bool {
        self.auth_entry_paths.iter().any(|p| p == path)
    }
}
