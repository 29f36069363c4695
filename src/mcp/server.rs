//! MCP server loop.
//!
//! Stdio transport: newline-delimited JSON-RPC on stdin/stdout, logging
//! to stderr. HTTP transport: `POST /mcp` for the protocol plus an
//! unauthenticated `GET /health` that reports upstream-API
//! reachability.

use std::io::{BufRead, Write};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};

use super::client::ApiClient;
use super::handlers::ToolHandlers;
use super::protocol::*;
use super::tools::get_tools;

pub struct McpServer {
    client: ApiClient,
    handlers: ToolHandlers,
}

impl McpServer {
    pub fn new(client: ApiClient) -> Self {
        Self {
            handlers: ToolHandlers::new(client.clone()),
            client,
        }
    }

    /// Run over stdio: one request in flight at a time, responses in
    /// request order.
    pub async fn run_stdio(&self) -> anyhow::Result<()> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();

        eprintln!("[catalog_mcp] Server started, waiting for messages...");

        for line in stdin.lock().lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }

            let response = self.handle(&line).await;
            let out = serde_json::to_string(&response)?;

            writeln!(stdout, "{}", out)?;
            stdout.flush()?;
        }

        eprintln!("[catalog_mcp] Server shutting down");
        Ok(())
    }

    /// Run over HTTP on the given port.
    pub async fn run_http(self, port: u16) -> anyhow::Result<()> {
        let state = Arc::new(self);
        let app = Router::new()
            .route("/mcp", post(handle_mcp))
            .route("/health", get(handle_health))
            .with_state(state);

        let addr = format!("0.0.0.0:{port}");
        tracing::info!(%addr, "starting MCP server (HTTP mode)");
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }

    /// Handle a single JSON-RPC message.
    pub async fn handle(&self, msg: &str) -> JsonRpcResponse {
        let req: JsonRpcRequest = match serde_json::from_str(msg) {
            Ok(r) => r,
            Err(e) => return JsonRpcResponse::error(None, PARSE_ERROR, e.to_string()),
        };

        let id = req.id.clone();

        match req.method.as_str() {
            "initialize" => {
                let result = InitializeResult {
                    protocol_version: "2024-11-05".into(),
                    capabilities: ServerCapabilities {
                        tools: ToolsCapability {
                            list_changed: false,
                        },
                    },
                    server_info: ServerInfo {
                        name: "terras-catalog-mcp".into(),
                        version: env!("CARGO_PKG_VERSION").into(),
                    },
                };
                serialize_result(id, result)
            }

            "notifications/initialized" => JsonRpcResponse::success(id, Value::Null),

            "tools/list" => serialize_result(id, ToolsListResult { tools: get_tools() }),

            "tools/call" => {
                let params: ToolCallParams = match serde_json::from_value(req.params) {
                    Ok(p) => p,
                    Err(e) => return JsonRpcResponse::error(id, INVALID_PARAMS, e.to_string()),
                };

                tracing::debug!(tool = %params.name, "calling tool");
                let result = self.handlers.handle(&params.name, params.arguments).await;
                serialize_result(id, result)
            }

            _ => JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Unknown method: {}", req.method),
            ),
        }
    }
}

fn serialize_result<T: serde::Serialize>(id: Option<Value>, result: T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(v) => JsonRpcResponse::success(id, v),
        Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, format!("Serialization error: {e}")),
    }
}

/// POST /mcp — one JSON-RPC exchange per request body.
async fn handle_mcp(
    State(server): State<Arc<McpServer>>,
    body: String,
) -> Json<JsonRpcResponse> {
    Json(server.handle(&body).await)
}

/// GET /health — unauthenticated; reports upstream-API reachability.
async fn handle_health(State(server): State<Arc<McpServer>>) -> (StatusCode, Json<Value>) {
    match server.client.probe().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "mcp_server": "running",
                "catalog_api": "connected",
                "api_url": server.client.base_url(),
            })),
        ),
        Err(reason) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "degraded",
                "mcp_server": "running",
                "catalog_api": "disconnected",
                "api_url": server.client.base_url(),
                "api_error": reason,
            })),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn server() -> McpServer {
        let client = ApiClient::new("http://localhost:8000", Duration::from_secs(1)).unwrap();
        McpServer::new(client)
    }

    #[tokio::test]
    async fn test_initialize_reports_tools_capability() {
        let resp = server()
            .handle(r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#)
            .await;
        let result = resp.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], "terras-catalog-mcp");
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
    }

    #[tokio::test]
    async fn test_tools_list_has_five_tools() {
        let resp = server()
            .handle(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#)
            .await;
        let tools = resp.result.unwrap()["tools"].as_array().unwrap().len();
        assert_eq!(tools, 5);
    }

    #[tokio::test]
    async fn test_unknown_method_is_method_not_found() {
        let resp = server()
            .handle(r#"{"jsonrpc":"2.0","id":3,"method":"bogus"}"#)
            .await;
        assert_eq!(resp.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_json_is_parse_error() {
        let resp = server().handle("{not json").await;
        assert_eq!(resp.error.unwrap().code, PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_a_tool_error() {
        let resp = server()
            .handle(
                r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"bogus_tool"}}"#,
            )
            .await;
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], true);
    }
}
