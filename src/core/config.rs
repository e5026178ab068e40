/// Server Configuration
///
/// All runtime settings come from environment variables and are read once at
/// startup. Loading goes through a lookup function so the parsing can be
/// exercised without touching the process environment.
///
/// Environment Variables:
/// - SERVER_NAME: Name reported to MCP clients (default: "IP Calculator")
/// - SERVER_VERSION: Version reported to MCP clients (default: crate version)
/// - MCP_TRANSPORT_MODE: "stdio", "http", or "both" (default: "stdio")
/// - HOST: Bind address for HTTP mode (default: "0.0.0.0")
/// - PORT: Port number for HTTP mode (default: 3000)
/// - WORKER_THREADS: HTTP worker count (default: CPU count, capped at 16)
/// - LOG_FORMAT: "text" or "json" (default: "text")

use std::env;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_SERVER_NAME: &str = "IP Calculator";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
const MAX_WORKERS: usize = 16;

/// Which transports the server runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Line-delimited JSON-RPC on stdin/stdout
    Stdio,
    /// JSON-RPC over HTTP with Actix Web
    Http,
    /// STDIO and HTTP concurrently
    Both,
}

impl FromStr for TransportMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stdio" => Ok(TransportMode::Stdio),
            "http" => Ok(TransportMode::Http),
            "both" => Ok(TransportMode::Both),
            other => Err(ConfigError::InvalidTransport(other.to_string())),
        }
    }
}

/// Log line format on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid transport mode '{0}'. Must be 'stdio', 'http', or 'both'")]
    InvalidTransport(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    pub transport: TransportMode,
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Unparseable PORT, WORKER_THREADS and LOG_FORMAT values fall back to
    /// their defaults; an unknown transport mode is an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let name = lookup("SERVER_NAME").unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string());
        let version =
            lookup("SERVER_VERSION").unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

        let transport = match lookup("MCP_TRANSPORT_MODE") {
            Some(mode) => mode.parse()?,
            None => TransportMode::Stdio,
        };

        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = lookup("PORT")
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        // Defaults to CPU count but capped at 16 to avoid excessive context switching
        let workers = lookup("WORKER_THREADS")
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or_else(|| num_cpus::get().clamp(1, MAX_WORKERS));

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            name,
            version,
            transport,
            host,
            port,
            workers,
            log_format,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
