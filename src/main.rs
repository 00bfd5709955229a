use clap::Parser;
use tracing::{error, info, warn};

use gatehouse::cli::{Cli, Command, ConfigCommand};
use gatehouse::config;
use gatehouse::logging;
use gatehouse::server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        // No subcommand or explicit `start` both launch the server.
        None | Some(Command::Start) => run_server().await,

        Some(Command::Config(sub)) => {
            match sub {
                ConfigCommand::Show => gatehouse::cli::handle_config_show()?,
                ConfigCommand::Get { key } => gatehouse::cli::handle_config_get(&key)?,
                ConfigCommand::Path => gatehouse::cli::handle_config_path(),
            }
            Ok(())
        }

        Some(Command::Status { host, port }) => gatehouse::cli::handle_status(&host, port).await,

        Some(Command::Version) => {
            gatehouse::cli::handle_version();
            Ok(())
        }
    }
}

/// Run the gateway server.
async fn run_server() -> Result<(), Box<dyn std::error::Error>> {
    init_logging_from_env()?;
    let cfg = load_and_validate_config()?;

    let resolved = resolve_bind_config(&cfg)?;
    let http_config = server::http::build_http_config(&cfg);

    log_startup_banner(&resolved, &http_config);

    let server_config = server::startup::ServerConfig {
        http_config,
        bind_address: resolved.address,
        backend: None,
    };
    let handle = server::startup::run_server_with_config(server_config).await?;

    let reason = await_shutdown_trigger().await;
    info!("Shutdown signal received ({})", reason);
    handle.shutdown().await;

    info!("Gateway shut down");
    Ok(())
}

/// Initialize logging based on the GATEHOUSE_DEV environment variable.
fn init_logging_from_env() -> Result<(), Box<dyn std::error::Error>> {
    let log_config = if std::env::var("GATEHOUSE_DEV")
        .map(|v| !v.is_empty() && v != "0" && v.to_lowercase() != "false")
        .unwrap_or(false)
    {
        logging::LogConfig::development()
    } else {
        logging::LogConfig::production()
    };
    logging::init_logging(log_config)?;
    Ok(())
}

/// Load configuration from disk and validate it against the schema.
/// Returns the config on success, or an error if schema validation finds
/// errors.
fn load_and_validate_config() -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let cfg = config::load_config().unwrap_or_else(|e| {
        warn!("Failed to load config: {}, using defaults", e);
        let mut empty = serde_json::Value::Object(serde_json::Map::new());
        config::defaults::apply_defaults(&mut empty);
        empty
    });

    let schema_issues = config::schema::validate_schema(&cfg);
    let mut has_errors = false;
    for issue in &schema_issues {
        match issue.severity {
            config::schema::Severity::Error => {
                error!("Config error at {}: {}", issue.path, issue.message);
                has_errors = true;
            }
            config::schema::Severity::Warning => {
                warn!("Config warning at {}: {}", issue.path, issue.message);
            }
        }
    }
    if has_errors {
        return Err("Configuration contains errors - aborting startup".into());
    }

    Ok(cfg)
}

/// Parse the bind address and port from the gateway configuration section.
fn resolve_bind_config(
    cfg: &serde_json::Value,
) -> Result<server::bind::ResolvedBind, Box<dyn std::error::Error>> {
    let gateway = cfg.get("gateway").and_then(|v| v.as_object());
    let bind_str = gateway
        .and_then(|g| g.get("bind"))
        .and_then(|v| v.as_str())
        .unwrap_or("loopback");
    let port = gateway
        .and_then(|g| g.get("port"))
        .and_then(|v| v.as_u64())
        .map(|p| p as u16)
        .unwrap_or(server::bind::DEFAULT_PORT);

    let bind_mode = server::bind::parse_bind_mode(bind_str);
    Ok(server::bind::resolve_bind_with_metadata(&bind_mode, port)?)
}

/// Log the startup banner with version, bind info, and endpoint summary.
fn log_startup_banner(resolved: &server::bind::ResolvedBind, http: &server::http::HttpConfig) {
    info!("Gatehouse gateway v{}", env!("CARGO_PKG_VERSION"));
    info!("Listening on {}", resolved.description);
    info!("Public base URL: {}", http.public_base_url);
    info!("Chat backend: {}", http.backend_base_url);
    if resolved.externally_accessible {
        info!("Widget delivery reachable from external origins");
    } else {
        warn!("Bound to loopback — third-party pages cannot load the widget script");
    }
}

/// Wait for either Ctrl+C or SIGTERM (Unix only) and return a label for
/// logging.
#[cfg(unix)]
async fn await_shutdown_trigger() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => "ctrl-c",
                _ = sigterm.recv() => "SIGTERM",
            }
        }
        Err(e) => {
            warn!(
                "Failed to install SIGTERM handler: {}; falling back to Ctrl+C only",
                e
            );
            match tokio::signal::ctrl_c().await {
                Ok(()) => "ctrl-c",
                Err(e) => {
                    panic!("Failed to install Ctrl+C handler: {}", e);
                }
            }
        }
    }
}

/// On non-Unix platforms, only Ctrl+C is available.
#[cfg(not(unix))]
async fn await_shutdown_trigger() -> &'static str {
    match tokio::signal::ctrl_c().await {
        Ok(()) => "ctrl-c",
        Err(e) => {
            panic!("Failed to install Ctrl+C handler: {}", e);
        }
    }
}
