//! Config schema validation with typed checks.

use serde_json::Value;

/// Severity of a schema validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Hard error — startup must abort.
    Error,
    /// Advisory — logged but does not prevent startup.
    Warning,
}

/// A single schema validation finding.
#[derive(Debug, Clone)]
pub struct SchemaIssue {
    pub severity: Severity,
    pub path: String,
    pub message: String,
}

impl SchemaIssue {
    fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        SchemaIssue {
            severity: Severity::Error,
            path: path.into(),
            message: message.into(),
        }
    }

    fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        SchemaIssue {
            severity: Severity::Warning,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Known top-level configuration keys.
const KNOWN_TOP_LEVEL_KEYS: &[&str] = &["meta", "env", "gateway", "routes", "chat", "logging"];

/// Accepted log levels.
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a config value against the schema.
///
/// Returns a (possibly empty) list of issues. Callers inspect each issue's
/// `severity` to decide whether to abort or merely warn.
pub fn validate_schema(config: &Value) -> Vec<SchemaIssue> {
    let mut issues = Vec::new();

    let Value::Object(obj) = config else {
        issues.push(SchemaIssue::error(".", "Config root must be an object"));
        return issues;
    };

    for key in obj.keys() {
        if !KNOWN_TOP_LEVEL_KEYS.contains(&key.as_str()) {
            issues.push(SchemaIssue::warning(
                format!(".{}", key),
                format!("Unknown configuration key: {}", key),
            ));
        }
    }

    if let Some(gateway) = obj.get("gateway") {
        validate_gateway(gateway, &mut issues);
    }
    if let Some(routes) = obj.get("routes") {
        validate_routes(routes, &mut issues);
    }
    if let Some(chat) = obj.get("chat") {
        validate_chat(chat, &mut issues);
    }
    if let Some(logging) = obj.get("logging") {
        validate_logging(logging, &mut issues);
    }

    issues
}

fn validate_gateway(gateway: &Value, issues: &mut Vec<SchemaIssue>) {
    let Value::Object(obj) = gateway else {
        issues.push(SchemaIssue::error(".gateway", "gateway must be an object"));
        return;
    };

    if let Some(port) = obj.get("port") {
        match port.as_u64() {
            Some(p) if (1..=65535).contains(&p) => {}
            _ => issues.push(SchemaIssue::error(
                ".gateway.port",
                "port must be a number between 1 and 65535",
            )),
        }
    }
    if let Some(bind) = obj.get("bind") {
        if !bind.is_string() {
            issues.push(SchemaIssue::error(".gateway.bind", "bind must be a string"));
        }
    }
    if let Some(url) = obj.get("publicBaseUrl") {
        match url.as_str() {
            Some(s) if s.starts_with("http://") || s.starts_with("https://") => {}
            _ => issues.push(SchemaIssue::error(
                ".gateway.publicBaseUrl",
                "publicBaseUrl must be an http(s) URL",
            )),
        }
    }
}

fn validate_routes(routes: &Value, issues: &mut Vec<SchemaIssue>) {
    let Value::Object(obj) = routes else {
        issues.push(SchemaIssue::error(".routes", "routes must be an object"));
        return;
    };

    if let Some(prefixes) = obj.get("protectedPrefixes") {
        match prefixes.as_array() {
            Some(arr) => {
                for (i, prefix) in arr.iter().enumerate() {
                    if !path_value_ok(prefix) {
                        issues.push(SchemaIssue::error(
                            format!(".routes.protectedPrefixes[{}]", i),
                            "prefixes must be non-empty strings starting with '/'",
                        ));
                    }
                }
            }
            None => issues.push(SchemaIssue::error(
                ".routes.protectedPrefixes",
                "protectedPrefixes must be an array of strings",
            )),
        }
    }

    for key in [
        "loginPath",
        "registerPath",
        "verifyEmailPath",
        "dashboardPath",
    ] {
        if let Some(path) = obj.get(key) {
            if !path_value_ok(path) {
                issues.push(SchemaIssue::error(
                    format!(".routes.{}", key),
                    format!("{} must be a non-empty string starting with '/'", key),
                ));
            }
        }
    }
}

fn validate_chat(chat: &Value, issues: &mut Vec<SchemaIssue>) {
    let Value::Object(obj) = chat else {
        issues.push(SchemaIssue::error(".chat", "chat must be an object"));
        return;
    };

    if let Some(url) = obj.get("backendBaseUrl") {
        match url.as_str() {
            Some(s) if s.starts_with("http://") || s.starts_with("https://") => {}
            _ => issues.push(SchemaIssue::error(
                ".chat.backendBaseUrl",
                "backendBaseUrl must be an http(s) URL",
            )),
        }
    }
    if let Some(timeout) = obj.get("timeoutMs") {
        match timeout.as_u64() {
            Some(t) if t > 0 => {}
            _ => issues.push(SchemaIssue::error(
                ".chat.timeoutMs",
                "timeoutMs must be a positive number",
            )),
        }
    }
}

fn validate_logging(logging: &Value, issues: &mut Vec<SchemaIssue>) {
    let Value::Object(obj) = logging else {
        issues.push(SchemaIssue::error(".logging", "logging must be an object"));
        return;
    };

    if let Some(level) = obj.get("level") {
        match level.as_str() {
            Some(s) if LOG_LEVELS.contains(&s) => {}
            _ => issues.push(SchemaIssue::warning(
                ".logging.level",
                format!("level should be one of {}", LOG_LEVELS.join(", ")),
            )),
        }
    }
}

fn path_value_ok(value: &Value) -> bool {
    value
        .as_str()
        .map(|s| s.starts_with('/'))
        .unwrap_or(false)
}
