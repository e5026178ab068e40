/// MCP Server Implementation
///
/// This module contains the core MCP server implementation including:
/// - JSON-RPC 2.0 request/response structures
/// - Tool registry for managing available tools
/// - Transport-independent request dispatch
/// - HTTP server setup with Actix Web
/// - STDIO server implementation for line-based communication

use actix_web::{
    web, App, HttpServer, HttpResponse, Result,
    middleware::{Compress, Logger, DefaultHeaders},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::core::config::ServerConfig;
use crate::tools;

/// MCP protocol revision implemented by this server.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

// JSON-RPC 2.0 error codes
pub const PARSE_ERROR: i32 = -32700;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;

/// Application state shared across all worker threads in HTTP mode.
///
/// Contains server metadata that is used in MCP protocol responses.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server name as reported in MCP initialize responses
    pub server_name: String,
    /// Server version string as reported in MCP initialize responses
    pub server_version: String,
}

impl AppState {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            server_name: config.name.clone(),
            server_version: config.version.clone(),
        }
    }
}

/// JSON-RPC 2.0 request structure for MCP protocol.
///
/// The jsonrpc field must be "2.0", id is optional (None for notifications),
/// method specifies the MCP method to call, and params contains
/// method-specific parameters.
#[derive(Deserialize, Debug)]
pub struct MCPRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    /// None indicates a notification.
    id: Option<Value>,
    /// MCP method name (e.g., "initialize", "tools/list", "tools/call")
    method: String,
    params: Option<Value>,
}

/// JSON-RPC 2.0 response structure for MCP protocol.
///
/// Carries either a result or an error, never both.
#[derive(Serialize, Debug)]
pub struct MCPResponse {
    jsonrpc: String,
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<MCPError>,
}

/// JSON-RPC 2.0 error structure.
#[derive(Serialize, Debug)]
pub struct MCPError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl MCPResponse {
    fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Option<Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(MCPError {
                code,
                message,
                data: None,
            }),
        }
    }
}

/// MCP tool definition structure.
///
/// Each tool must have a unique name, description, and JSON schema defining
/// its input parameters. This structure is serialized when listing tools.
#[derive(Serialize, Debug, Clone)]
pub struct MCPTool {
    /// Unique tool identifier (e.g., "ipcalc")
    pub name: String,
    /// Human-readable description of what the tool does
    pub description: String,
    /// JSON Schema defining the tool's input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Tool handler function type definition.
///
/// Tool handlers are boxed closures that take JSON arguments and
/// return either a JSON result or an error string. A string result is sent
/// to the client as-is; any other value is sent as serialized JSON. The
/// handler must be Send + Sync to work across threads in the HTTP server.
pub type ToolHandler = Box<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;

/// Registry of available MCP tools.
///
/// The registry maintains a list of tool definitions for discovery and a
/// HashMap of tool names to their handler functions for execution.
#[derive(Default)]
pub struct ToolRegistry {
    /// List of all registered tools (for tools/list method)
    pub tools: Vec<MCPTool>,
    /// Map of tool names to their handler functions (for tools/call method)
    pub handlers: HashMap<String, ToolHandler>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool with the registry.
    ///
    /// # Arguments
    /// * `tool` - Tool definition with name, description, and input schema
    /// * `handler` - Function that executes the tool when called
    pub fn register(&mut self, tool: MCPTool, handler: ToolHandler) {
        let name = tool.name.clone();
        self.tools.push(tool);
        self.handlers.insert(name, handler);
    }

    /// Run a registered tool. Returns None when no tool has that name.
    pub fn call(&self, name: &str, arguments: Value) -> Option<Result<Value, String>> {
        self.handlers.get(name).map(|handler| handler(arguments))
    }
}

/// Initialize and register all tools.
///
/// Add new tool registrations here when implementing additional tools.
pub fn initialize_tools() -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();

    tools::ipcalc::register(&mut registry);

    Arc::new(registry)
}

/// Route one JSON-RPC request to its MCP method handler.
///
/// Returns None for notifications (requests without an id), which never get
/// a response.
pub fn dispatch(state: &AppState, registry: &ToolRegistry, req: MCPRequest) -> Option<MCPResponse> {
    let Some(id) = req.id else {
        debug!(method = %req.method, "notification received");
        return None;
    };
    debug!(method = %req.method, "request received");

    let response = match req.method.as_str() {
        "initialize" => handle_initialize(state, Some(id)),
        "tools/list" => handle_tools_list(registry, Some(id)),
        "tools/call" => handle_tools_call(registry, Some(id), req.params),
        "ping" => MCPResponse::success(Some(id), serde_json::json!({})),
        _ => MCPResponse::failure(
            Some(id),
            METHOD_NOT_FOUND,
            format!("Method not found: {}", req.method),
        ),
    };
    Some(response)
}

/// Handle one raw JSON-RPC message: a STDIO line or an HTTP request body.
///
/// Messages that are not a valid request get a parse error response if an
/// id can still be recovered from them, and are dropped otherwise.
pub fn handle_line(state: &AppState, registry: &ToolRegistry, line: &str) -> Option<MCPResponse> {
    match serde_json::from_str::<MCPRequest>(line) {
        Ok(req) => dispatch(state, registry, req),
        Err(e) => {
            warn!(error = %e, "invalid JSON-RPC request");
            let partial: Value = serde_json::from_str(line).ok()?;
            let id = partial.get("id")?.clone();
            Some(MCPResponse::failure(
                Some(id),
                PARSE_ERROR,
                format!("Parse error: {}", e),
            ))
        }
    }
}

/// Handle MCP initialize method.
///
/// Returns the protocol version, server capabilities, and server information.
fn handle_initialize(state: &AppState, id: Option<Value>) -> MCPResponse {
    MCPResponse::success(
        id,
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": state.server_name,
                "version": state.server_version
            }
        }),
    )
}

/// Handle MCP tools/list method.
fn handle_tools_list(registry: &ToolRegistry, id: Option<Value>) -> MCPResponse {
    MCPResponse::success(
        id,
        serde_json::json!({
            "tools": registry.tools
        }),
    )
}

/// Handle MCP tools/call method.
///
/// Tool failures are reported inside the result with `isError: true`, as the
/// MCP protocol requires; only a missing tool or missing params become
/// JSON-RPC errors.
fn handle_tools_call(registry: &ToolRegistry, id: Option<Value>, params: Option<Value>) -> MCPResponse {
    let Some(tool_params) = params else {
        return MCPResponse::failure(id, INVALID_PARAMS, "Invalid params".to_string());
    };

    let tool_name = tool_params.get("name")
        .and_then(|v| v.as_str())
        .unwrap_or("");

    // Extract tool arguments, defaulting to empty object if not provided
    let arguments = tool_params.get("arguments")
        .cloned()
        .unwrap_or(serde_json::json!({}));

    match registry.call(tool_name, arguments) {
        Some(Ok(result)) => {
            let text = match result {
                Value::String(text) => text,
                other => serde_json::to_string(&other).unwrap_or_default(),
            };
            MCPResponse::success(id, tool_content(text, false))
        }
        Some(Err(e)) => MCPResponse::success(id, tool_content(format!("Error: {}", e), true)),
        None => MCPResponse::failure(
            id,
            METHOD_NOT_FOUND,
            format!("Unknown tool: {}", tool_name),
        ),
    }
}

fn tool_content(text: String, is_error: bool) -> Value {
    serde_json::json!({
        "content": [
            {
                "type": "text",
                "text": text
            }
        ],
        "isError": is_error
    })
}

/// Health check endpoint handler.
async fn health(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": state.server_name
    })))
}

/// MCP JSON-RPC request handler for HTTP mode.
///
/// The body goes through `handle_line` like a STDIO line, so malformed
/// requests get the same JSON-RPC parse error on both transports. Counts
/// every request for the metrics endpoint. Notifications, and bodies with no
/// recoverable id, are acknowledged with 202 and an empty body.
async fn mcp_handler(
    state: web::Data<AppState>,
    registry: web::Data<ToolRegistry>,
    counter: web::Data<AtomicU64>,
    body: String,
) -> Result<HttpResponse> {
    // only atomicity is needed, not ordering with other memory
    counter.fetch_add(1, Ordering::Relaxed);

    match handle_line(&state, &registry, &body) {
        Some(response) => Ok(HttpResponse::Ok().json(response)),
        None => Ok(HttpResponse::Accepted().finish()),
    }
}

/// Metrics endpoint handler.
///
/// Returns the total number of MCP requests processed since server start.
async fn metrics_handler(counter: web::Data<AtomicU64>) -> Result<HttpResponse> {
    let count = counter.load(Ordering::Relaxed);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "requests_total": count,
        "status": "ok"
    })))
}

/// Server-Sent Events endpoint for tools discovery.
///
/// Returns one SSE event listing all registered tools and their count.
async fn sse_tools_discovery(registry: web::Data<ToolRegistry>) -> Result<HttpResponse> {
    use actix_web::http::header;

    let tools_data = serde_json::json!({
        "tools": registry.tools,
        "count": registry.tools.len()
    });

    let sse_data = format!(
        "data: {}\n\n",
        serde_json::to_string(&tools_data).unwrap_or_else(|_| "{}".to_string())
    );

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(header::CacheControl(vec![
            header::CacheDirective::NoCache,
            header::CacheDirective::NoStore,
            header::CacheDirective::MustRevalidate,
        ]))
        // Disable nginx buffering for real-time streaming
        .insert_header(("x-accel-buffering", "no"))
        .body(sse_data))
}

/// Register HTTP routes.
///
/// Expects `web::Data<AppState>`, `web::Data<ToolRegistry>` and
/// `web::Data<AtomicU64>` to be present as app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/metrics", web::get().to(metrics_handler))
        .route("/sse", web::get().to(sse_tools_discovery))
        .route("/mcp", web::post().to(mcp_handler))
        .route("/", web::post().to(mcp_handler))
        .route("/", web::get().to(health));
}

/// Run the MCP server in HTTP mode.
///
/// # Configuration
/// - Worker threads: from `ServerConfig::workers`
/// - Max connections: 10,000 concurrent connections
/// - Connection rate limit: 1,000 connections per second
/// - Keep-alive: 30 seconds
/// - Request timeout: 30 seconds
/// - Disconnect timeout: 2 seconds
/// - Shutdown timeout: 10 seconds
pub async fn run_server_http(config: &ServerConfig) -> std::io::Result<()> {
    use std::time::Duration;

    let bind_addr = config.bind_addr();

    let app_state = web::Data::new(AppState::from_config(config));
    let tool_registry = web::Data::from(initialize_tools());
    let request_count = web::Data::new(AtomicU64::new(0));

    info!(
        name = %config.name,
        version = %config.version,
        bind = %bind_addr,
        workers = config.workers,
        "MCP server starting (HTTP mode)"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(tool_registry.clone())
            .app_data(request_count.clone())
            // Enable compression for JSON responses (gzip/brotli)
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("X-XSS-Protection", "1; mode=block"))
            )
            // %r = request line, %s = status, %Dms = duration in milliseconds
            .wrap(Logger::new("%r %s %Dms"))
            .configure(configure)
    })
    .workers(config.workers)
    .max_connections(10000)
    .max_connection_rate(1000)
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_secs(30))
    .client_disconnect_timeout(Duration::from_secs(2))
    .shutdown_timeout(10)
    .bind(&bind_addr)?
    .run()
    .await
}

/// Run the MCP server in STDIO mode.
///
/// Reads JSON-RPC requests line-by-line from stdin and writes one response
/// line per request to stdout. Logging goes to stderr so the protocol stream
/// stays clean.
pub async fn run_server_stdio(state: AppState) -> std::io::Result<()> {
    use tokio::io::{BufReader, BufWriter};

    info!(
        name = %state.server_name,
        version = %state.server_version,
        "MCP server starting (STDIO mode)"
    );

    let tool_registry = initialize_tools();

    let stdin = BufReader::with_capacity(8192, tokio::io::stdin());
    let mut stdout = BufWriter::with_capacity(8192, tokio::io::stdout());

    serve_lines(&state, &tool_registry, stdin, &mut stdout).await?;

    info!("stdin closed, STDIO server stopping");
    Ok(())
}

/// Serve line-delimited JSON-RPC until `reader` reaches end of input.
///
/// Blank lines are skipped. Every response is written as one line and
/// flushed immediately.
pub async fn serve_lines<R, W>(
    state: &AppState,
    registry: &ToolRegistry,
    reader: R,
    writer: &mut W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let Some(response) = handle_line(state, registry, &line) else {
            continue;
        };

        let response_json = match serde_json::to_string(&response) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to serialize response");
                continue;
            }
        };

        writer.write_all(response_json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }

    Ok(())
}
