//! Bind mode resolution
//!
//! Parses `gateway.bind` config values and resolves them to socket
//! addresses:
//! - `loopback` -> 127.0.0.1 (default, safest — local access only)
//! - `all` -> 0.0.0.0 (all interfaces; required when third-party pages
//!   must reach the widget delivery endpoint directly)
//! - Any explicit IP address or `host:port` -> use as-is

use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs};

use thiserror::Error;

/// Default gateway port
pub const DEFAULT_PORT: u16 = 18650;

/// Bind mode specifying how to resolve the listen address
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BindMode {
    /// Bind to loopback only (127.0.0.1)
    #[default]
    Loopback,
    /// Bind to all interfaces (0.0.0.0)
    All,
    /// Custom IP address or hostname
    Custom(String),
}

/// Errors that can occur during bind address resolution
#[derive(Error, Debug)]
pub enum BindError {
    #[error("Invalid IP address or hostname: {0}")]
    InvalidAddress(String),

    #[error("Failed to resolve hostname {host}: {message}")]
    ResolutionFailed { host: String, message: String },
}

/// Parse a bind mode string from config
pub fn parse_bind_mode(value: &str) -> BindMode {
    match value.trim().to_lowercase().as_str() {
        "loopback" | "localhost" | "local" => BindMode::Loopback,
        "all" | "auto" | "0.0.0.0" => BindMode::All,
        other => BindMode::Custom(other.to_string()),
    }
}

/// Resolve a bind mode to a socket address.
///
/// For `Custom` mode with a `host:port` string, the embedded port
/// overrides the `port` parameter.
pub fn resolve_bind_address(mode: &BindMode, port: u16) -> Result<SocketAddr, BindError> {
    match mode {
        BindMode::Loopback => Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)),
        BindMode::All => Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)),
        BindMode::Custom(addr) => resolve_custom_address(addr, port),
    }
}

/// Resolve a custom IP address, hostname, or `host:port` string.
fn resolve_custom_address(addr: &str, default_port: u16) -> Result<SocketAddr, BindError> {
    if let Ok(sock) = addr.parse::<SocketAddr>() {
        return Ok(sock);
    }

    if let Ok(ip) = addr.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, default_port));
    }

    if let Some((host, port_str)) = split_host_port(addr) {
        if let Ok(port) = port_str.parse::<u16>() {
            let ip = resolve_hostname(host)?;
            return Ok(SocketAddr::new(ip, port));
        }
    }

    let ip = resolve_hostname(addr)?;
    Ok(SocketAddr::new(ip, default_port))
}

/// Split a `host:port` string. Returns `None` if there is no port component.
/// For IPv6 addresses in brackets (e.g. `[::1]:8080`), handles the bracket
/// syntax.
fn split_host_port(addr: &str) -> Option<(&str, &str)> {
    if addr.starts_with('[') {
        if let Some(bracket_end) = addr.find(']') {
            if addr.as_bytes().get(bracket_end + 1) == Some(&b':') {
                let host = &addr[1..bracket_end];
                let port = &addr[bracket_end + 2..];
                if !port.is_empty() {
                    return Some((host, port));
                }
            }
        }
        return None;
    }

    // Only split on a single colon; multiple colons indicate a bare IPv6
    // address.
    let colon_count = addr.chars().filter(|&c| c == ':').count();
    if colon_count == 1 {
        let idx = addr.rfind(':')?;
        let host = &addr[..idx];
        let port = &addr[idx + 1..];
        if !host.is_empty() && !port.is_empty() {
            return Some((host, port));
        }
    }

    None
}

/// Resolve a hostname to an IP address, preferring IPv4.
fn resolve_hostname(host: &str) -> Result<IpAddr, BindError> {
    let socket_addr = format!("{}:0", host);
    match socket_addr.to_socket_addrs() {
        Ok(addrs) => {
            let mut ipv6 = None;
            for addr in addrs {
                match addr.ip() {
                    IpAddr::V4(_) => return Ok(addr.ip()),
                    IpAddr::V6(_) => {
                        if ipv6.is_none() {
                            ipv6 = Some(addr.ip());
                        }
                    }
                }
            }

            ipv6.ok_or_else(|| BindError::ResolutionFailed {
                host: host.to_string(),
                message: "No addresses found".to_string(),
            })
        }
        Err(e) => Err(BindError::ResolutionFailed {
            host: host.to_string(),
            message: e.to_string(),
        }),
    }
}

/// Result of bind address resolution with additional metadata
#[derive(Debug)]
pub struct ResolvedBind {
    /// The resolved socket address
    pub address: SocketAddr,
    /// The bind mode that was used
    pub mode: BindMode,
    /// Human-readable description
    pub description: String,
    /// Whether this address is accessible from other machines
    pub externally_accessible: bool,
}

/// Resolve bind address with full metadata
pub fn resolve_bind_with_metadata(mode: &BindMode, port: u16) -> Result<ResolvedBind, BindError> {
    let address = resolve_bind_address(mode, port)?;

    let (description, externally_accessible) = match mode {
        BindMode::Loopback => (format!("localhost only ({})", address), false),
        BindMode::All => (format!("all interfaces ({})", address), true),
        BindMode::Custom(addr) => (
            format!("custom ({} -> {})", addr, address),
            !address.ip().is_loopback(),
        ),
    };

    Ok(ResolvedBind {
        address,
        mode: mode.clone(),
        description,
        externally_accessible,
    })
}
