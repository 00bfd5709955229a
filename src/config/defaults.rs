//! Config defaults application
//!
//! Merges user-provided config with sane defaults so that partial configs
//! work correctly. The entry point is [`apply_defaults`], which takes the
//! JSON5-parsed `serde_json::Value` and fills in missing sections/fields.
//!
//! Typed structs with `#[serde(default)]` do the filling during
//! deserialization; the result is merged back into the raw value so code
//! that reads raw JSON keeps working and unknown sections pass through
//! unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Default gateway port (matches bind.rs).
pub const DEFAULT_GATEWAY_PORT: u16 = 18650;

/// Default bind mode.
pub const DEFAULT_BIND_MODE: &str = "loopback";

/// Default chat backend base URL.
pub const DEFAULT_BACKEND_BASE_URL: &str = "http://127.0.0.1:18651";

/// Default backend request timeout (ms).
pub const DEFAULT_BACKEND_TIMEOUT_MS: u64 = 30_000;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Top-level config with all sections that receive defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigWithDefaults {
    #[serde(default)]
    gateway: GatewayDefaults,

    #[serde(default)]
    routes: RoutesDefaults,

    #[serde(default)]
    chat: ChatDefaults,

    #[serde(default)]
    logging: LoggingDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GatewayDefaults {
    #[serde(default = "default_gateway_port")]
    port: u16,

    #[serde(default = "default_bind_mode")]
    bind: String,

    /// Deployment base URL embedded into synthesized scripts. When absent
    /// it is derived from the resolved bind address at startup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    public_base_url: Option<String>,
}

impl Default for GatewayDefaults {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_bind_mode(),
            public_base_url: None,
        }
    }
}

fn default_gateway_port() -> u16 {
    DEFAULT_GATEWAY_PORT
}
fn default_bind_mode() -> String {
    DEFAULT_BIND_MODE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoutesDefaults {
    #[serde(default = "default_protected_prefixes")]
    protected_prefixes: Vec<String>,

    #[serde(default = "default_login_path")]
    login_path: String,

    #[serde(default = "default_register_path")]
    register_path: String,

    #[serde(default = "default_verify_email_path")]
    verify_email_path: String,

    #[serde(default = "default_dashboard_path")]
    dashboard_path: String,
}

impl Default for RoutesDefaults {
    fn default() -> Self {
        Self {
            protected_prefixes: default_protected_prefixes(),
            login_path: default_login_path(),
            register_path: default_register_path(),
            verify_email_path: default_verify_email_path(),
            dashboard_path: default_dashboard_path(),
        }
    }
}

fn default_protected_prefixes() -> Vec<String> {
    vec![crate::guard::DEFAULT_PROTECTED_PREFIX.to_string()]
}
fn default_login_path() -> String {
    crate::guard::DEFAULT_LOGIN_PATH.to_string()
}
fn default_register_path() -> String {
    crate::guard::DEFAULT_REGISTER_PATH.to_string()
}
fn default_verify_email_path() -> String {
    crate::guard::DEFAULT_VERIFY_EMAIL_PATH.to_string()
}
fn default_dashboard_path() -> String {
    crate::guard::DEFAULT_PROTECTED_PREFIX.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatDefaults {
    #[serde(default = "default_backend_base_url")]
    backend_base_url: String,

    #[serde(default = "default_backend_timeout_ms")]
    timeout_ms: u64,
}

impl Default for ChatDefaults {
    fn default() -> Self {
        Self {
            backend_base_url: default_backend_base_url(),
            timeout_ms: default_backend_timeout_ms(),
        }
    }
}

fn default_backend_base_url() -> String {
    DEFAULT_BACKEND_BASE_URL.to_string()
}
fn default_backend_timeout_ms() -> u64 {
    DEFAULT_BACKEND_TIMEOUT_MS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoggingDefaults {
    #[serde(default = "default_log_level")]
    level: String,
}

impl Default for LoggingDefaults {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Fill in missing sections/fields of `value` with defaults.
///
/// Unknown sections and extra fields are preserved as-is.
pub fn apply_defaults(value: &mut Value) {
    let typed: ConfigWithDefaults = match serde_json::from_value(value.clone()) {
        Ok(typed) => typed,
        Err(e) => {
            // A section with an unexpected shape keeps the raw value; the
            // schema validator reports it properly.
            debug!(target: "config", "defaults skipped: {}", e);
            return;
        }
    };

    let defaults = match serde_json::to_value(&typed) {
        Ok(Value::Object(map)) => map,
        _ => return,
    };

    let Value::Object(target) = value else {
        return;
    };

    for (key, default_section) in defaults {
        match target.get_mut(&key) {
            Some(existing) => merge_missing(existing, default_section),
            None => {
                target.insert(key, default_section);
            }
        }
    }
}

/// Recursively fill keys absent from `target` with `defaults`. Existing
/// values always win; arrays and primitives are never merged.
fn merge_missing(target: &mut Value, defaults: Value) {
    if let (Value::Object(target_obj), Value::Object(default_obj)) = (target, defaults) {
        for (key, default_value) in default_obj {
            match target_obj.get_mut(&key) {
                Some(existing) => merge_missing(existing, default_value),
                None => {
                    target_obj.insert(key, default_value);
                }
            }
        }
    }
}
