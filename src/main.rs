/// IP Calculator MCP Server Entry Point
///
/// Initializes logging, loads `ServerConfig` from the environment and starts
/// the configured transport(s). See `core::config` for the variables read.
///
/// Logs always go to stderr; stdout is reserved for the STDIO protocol stream.

use ipcalc_mcp::core::config::{LogFormat, ServerConfig, TransportMode};
use ipcalc_mcp::core::server::{self, AppState};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(config.log_format);

    match config.transport {
        TransportMode::Stdio => server::run_server_stdio(AppState::from_config(&config)).await,
        TransportMode::Http => server::run_server_http(&config).await,
        TransportMode::Both => {
            // STDIO runs in the background while HTTP holds the foreground
            let state = AppState::from_config(&config);
            let stdio_handle = tokio::spawn(async move {
                if let Err(e) = server::run_server_stdio(state).await {
                    error!(error = %e, "STDIO server error");
                }
            });

            let http_result = server::run_server_http(&config).await;

            // If HTTP server exits, abort STDIO task
            stdio_handle.abort();
            info!("HTTP server stopped");

            http_result
        }
    }
}
