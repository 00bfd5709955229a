//! Command-line interface
//!
//! `gatehouse` with no subcommand starts the server; the remaining
//! subcommands are small operational helpers (config inspection, a status
//! probe against a running gateway, version).

use clap::{Parser, Subcommand};
use serde_json::Value;

use crate::config;
use crate::server::bind::DEFAULT_PORT;

/// Edge delivery and access gateway for embeddable chat agents.
#[derive(Parser, Debug)]
#[command(name = "gatehouse", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the gateway server (default when no subcommand is given)
    Start,

    /// Inspect the configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Probe a running gateway's health endpoint
    Status {
        /// Host to probe
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to probe
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },

    /// Print the version
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the fully resolved configuration (defaults applied)
    Show,
    /// Print a single value by dot-separated key path (e.g. gateway.port)
    Get { key: String },
    /// Print the config file path
    Path,
}

/// `config show`
pub fn handle_config_show() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::load_config()?;
    println!("{}", serde_json::to_string_pretty(&cfg)?);
    Ok(())
}

/// `config get <key>`
pub fn handle_config_get(key: &str) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::load_config()?;
    match config::lookup_path(&cfg, key) {
        Some(Value::String(s)) => println!("{}", s),
        Some(value) => println!("{}", serde_json::to_string_pretty(value)?),
        None => {
            eprintln!("Key not found: {}", key);
            std::process::exit(1);
        }
    }
    Ok(())
}

/// `config path`
pub fn handle_config_path() {
    println!("{}", config::get_config_path().display());
}

/// `status`
pub async fn handle_status(host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let url = format!("http://{}:{}/health", host, port);
    let response = reqwest::get(&url).await?;
    let status = response.status();
    let body: Value = response.json().await?;

    if status.is_success() && body.get("ok").and_then(|v| v.as_bool()) == Some(true) {
        let version = body
            .get("version")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        let uptime = body
            .get("uptimeSeconds")
            .and_then(|v| v.as_i64())
            .unwrap_or(0);
        println!("Gateway running: v{} (up {}s)", version, uptime);
        Ok(())
    } else {
        Err(format!("Gateway at {} is unhealthy ({})", url, status).into())
    }
}

/// `version`
pub fn handle_version() {
    println!("gatehouse v{}", env!("CARGO_PKG_VERSION"));
}
