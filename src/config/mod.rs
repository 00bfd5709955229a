//! Configuration parsing module
//!
//! JSON5 configuration with environment variable substitution and applied
//! defaults. The file is loaded once at startup; there is no reload path.
//!
//! Location priority: `GATEHOUSE_CONFIG_PATH` >
//! `GATEHOUSE_STATE_DIR/gatehouse.json5` > `~/.gatehouse/gatehouse.json5`,
//! falling back to the `.json` extension when the `.json5` file does not
//! exist.

pub mod defaults;
pub mod schema;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse JSON5 at {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Failed to read config file {path}: {message}")]
    ReadError { path: String, message: String },

    #[error("Missing environment variable: {var}")]
    MissingEnvVar { var: String },
}

/// Get the config file path.
pub fn get_config_path() -> PathBuf {
    if let Ok(path) = env::var("GATEHOUSE_CONFIG_PATH") {
        return PathBuf::from(path);
    }

    if let Ok(state_dir) = env::var("GATEHOUSE_STATE_DIR") {
        let dir = PathBuf::from(state_dir);
        let json5 = dir.join("gatehouse.json5");
        if json5.exists() {
            return json5;
        }
        return dir.join("gatehouse.json");
    }

    let base = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".gatehouse");
    let json5 = base.join("gatehouse.json5");
    if json5.exists() {
        return json5;
    }
    base.join("gatehouse.json")
}

/// Load and parse the configuration file.
///
/// A missing file is not an error: the result is the full default config.
/// The returned value always has defaults applied, so missing sections and
/// fields carry production-ready values.
pub fn load_config() -> Result<Value, ConfigError> {
    load_config_from(&get_config_path())
}

/// Load config from an explicit path (see [`load_config`]).
pub fn load_config_from(path: &Path) -> Result<Value, ConfigError> {
    if !path.exists() {
        let mut empty = Value::Object(serde_json::Map::new());
        defaults::apply_defaults(&mut empty);
        return Ok(empty);
    }

    let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let mut value = parse_json5(&content, path)?;
    substitute_env_vars(&mut value)?;
    defaults::apply_defaults(&mut value);

    Ok(value)
}

/// Parse JSON5 content
fn parse_json5(content: &str, path: &Path) -> Result<Value, ConfigError> {
    json5::from_str(content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Substitute environment variables in string values.
/// Pattern: ${VAR} where VAR matches [A-Z_][A-Z0-9_]*
/// Escape with $${VAR} to get literal ${VAR}
fn substitute_env_vars(value: &mut Value) -> Result<(), ConfigError> {
    match value {
        Value::String(s) => {
            *s = substitute_env_in_string(s)?;
        }
        Value::Object(obj) => {
            for (_, v) in obj.iter_mut() {
                substitute_env_vars(v)?;
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                substitute_env_vars(item)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Substitute environment variables in a single string
fn substitute_env_in_string(s: &str) -> Result<String, ConfigError> {
    static ENV_VAR_PATTERN: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\$\$?\{([A-Z_][A-Z0-9_]*)\}").unwrap());

    let mut result = String::with_capacity(s.len());
    let mut last_end = 0;

    for caps in ENV_VAR_PATTERN.captures_iter(s) {
        let full_match = caps.get(0).unwrap();
        let var_name = caps.get(1).unwrap().as_str();

        result.push_str(&s[last_end..full_match.start()]);

        if full_match.as_str().starts_with("$$") {
            // Escaped - output literal ${VAR}
            result.push_str(&format!("${{{}}}", var_name));
        } else {
            let value = env::var(var_name).map_err(|_| ConfigError::MissingEnvVar {
                var: var_name.to_string(),
            })?;
            result.push_str(&value);
        }

        last_end = full_match.end();
    }

    result.push_str(&s[last_end..]);

    Ok(result)
}

/// Navigate a dot-separated key path into a config value (`gateway.port`).
pub fn lookup_path<'a>(config: &'a Value, key_path: &str) -> Option<&'a Value> {
    let mut current = config;
    for segment in key_path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn create_temp_config(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_parse_json5_basic() {
        let content = r#"{
            // This is a comment
            "gateway": { port: 9000 },
            trailing: "comma",
        }"#;

        let result = parse_json5(content, Path::new("test.json5")).unwrap();

        assert_eq!(result["gateway"]["port"], 9000);
        assert_eq!(result["trailing"], "comma");
    }

    #[test]
    fn test_parse_json5_error() {
        let result = parse_json5("{ invalid json }", Path::new("test.json5"));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_env_var_substitution() {
        let _lock = ENV_LOCK.lock().unwrap();
        env::set_var("GATEHOUSE_TEST_VAR", "hello");

        let result = substitute_env_in_string("${GATEHOUSE_TEST_VAR} world").unwrap();
        assert_eq!(result, "hello world");

        env::remove_var("GATEHOUSE_TEST_VAR");
    }

    #[test]
    fn test_env_var_escaped() {
        let result = substitute_env_in_string("$${ESCAPED_VAR}").unwrap();
        assert_eq!(result, "${ESCAPED_VAR}");
    }

    #[test]
    fn test_env_var_missing() {
        let _lock = ENV_LOCK.lock().unwrap();
        env::remove_var("GATEHOUSE_NONEXISTENT_VAR");
        let result = substitute_env_in_string("${GATEHOUSE_NONEXISTENT_VAR}");

        assert!(matches!(
            result,
            Err(ConfigError::MissingEnvVar { var }) if var == "GATEHOUSE_NONEXISTENT_VAR"
        ));
    }

    #[test]
    fn test_env_substitution_in_nested_config() {
        let _lock = ENV_LOCK.lock().unwrap();
        env::set_var("GATEHOUSE_TEST_BACKEND", "https://chat.internal");

        let dir = TempDir::new().unwrap();
        let path = create_temp_config(
            &dir,
            "config.json5",
            r#"{ "chat": { "backendBaseUrl": "${GATEHOUSE_TEST_BACKEND}" } }"#,
        );

        let config = load_config_from(&path).unwrap();
        assert_eq!(config["chat"]["backendBaseUrl"], "https://chat.internal");

        env::remove_var("GATEHOUSE_TEST_BACKEND");
    }

    #[test]
    fn test_missing_file_returns_defaults() {
        let config = load_config_from(Path::new("/nonexistent/gatehouse.json")).unwrap();

        let obj = config.as_object().unwrap();
        assert!(obj.contains_key("gateway"), "should have gateway defaults");
        assert_eq!(config["gateway"]["bind"], "loopback");
        assert!(obj.contains_key("routes"), "should have route defaults");
        assert_eq!(config["routes"]["loginPath"], "/login");
        assert!(obj.contains_key("logging"), "should have logging defaults");
        assert_eq!(config["logging"]["level"], "info");
    }

    #[test]
    fn test_user_values_survive_defaults() {
        let dir = TempDir::new().unwrap();
        let path = create_temp_config(
            &dir,
            "config.json5",
            r#"{ gateway: { port: 9000 }, routes: { loginPath: "/signin" } }"#,
        );

        let config = load_config_from(&path).unwrap();
        assert_eq!(config["gateway"]["port"], 9000);
        assert_eq!(config["gateway"]["bind"], "loopback"); // default kept
        assert_eq!(config["routes"]["loginPath"], "/signin");
        assert_eq!(config["routes"]["verifyEmailPath"], "/verify-email");
    }

    #[test]
    fn test_get_config_path_override() {
        let _lock = ENV_LOCK.lock().unwrap();
        env::remove_var("GATEHOUSE_STATE_DIR");
        env::set_var("GATEHOUSE_CONFIG_PATH", "/custom/path/config.json");

        assert_eq!(get_config_path(), PathBuf::from("/custom/path/config.json"));

        env::remove_var("GATEHOUSE_CONFIG_PATH");
    }

    #[test]
    fn test_get_config_path_state_dir() {
        let _lock = ENV_LOCK.lock().unwrap();
        env::remove_var("GATEHOUSE_CONFIG_PATH");
        env::set_var("GATEHOUSE_STATE_DIR", "/custom/state");

        // Falls back to .json when .json5 doesn't exist on disk
        assert_eq!(
            get_config_path(),
            PathBuf::from("/custom/state/gatehouse.json")
        );

        env::remove_var("GATEHOUSE_STATE_DIR");
    }

    #[test]
    fn test_lookup_path() {
        let config = serde_json::json!({
            "gateway": { "port": 18650 },
            "routes": { "protectedPrefixes": ["/dashboard"] }
        });

        assert_eq!(
            lookup_path(&config, "gateway.port"),
            Some(&serde_json::json!(18650))
        );
        assert_eq!(lookup_path(&config, "gateway.missing"), None);
        assert_eq!(lookup_path(&config, "nope"), None);
    }
}
