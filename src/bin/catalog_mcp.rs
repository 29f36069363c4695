//! MCP server binary for assistant integration.
//!
//! ## Usage
//!
//! ```bash
//! # stdio transport (Claude Desktop, local development)
//! CATALOG_API_URL=http://localhost:8000 catalog_mcp
//!
//! # HTTP transport (production deployments)
//! CATALOG_API_URL=http://localhost:8000 catalog_mcp --transport http
//! ```
//!
//! ## Environment Variables
//!
//! - `CATALOG_API_URL` (default http://localhost:8000): upstream REST API
//! - `MCP_PORT` (default 8001): HTTP transport bind port
//! - `UPSTREAM_TIMEOUT_SECS` (default 30): upstream request timeout

use anyhow::Result;
use clap::{Parser, ValueEnum};

use terras_catalog::mcp::{ApiClient, McpServer};

#[derive(Parser)]
#[command(name = "catalog_mcp")]
#[command(about = "MCP server exposing the lands catalog API as assistant tools")]
struct Cli {
    /// Transport mode
    #[arg(long, value_enum, default_value = "stdio", env = "MCP_TRANSPORT")]
    transport: Transport,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    Stdio,
    Http,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the protocol in stdio mode; all logging goes to
    // stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "terras_catalog=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let api_base_url = std::env::var("CATALOG_API_URL")
        .unwrap_or_else(|_| "http://localhost:8000".to_string());
    let mcp_port: u16 = std::env::var("MCP_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8001);
    let timeout_secs: u64 = std::env::var("UPSTREAM_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(30);

    eprintln!("[catalog_mcp] Upstream API: {api_base_url}");

    let client = ApiClient::new(api_base_url, std::time::Duration::from_secs(timeout_secs))?;
    let server = McpServer::new(client);

    match cli.transport {
        Transport::Stdio => server.run_stdio().await,
        Transport::Http => server.run_http(mcp_port).await,
    }
}
