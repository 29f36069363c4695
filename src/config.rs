//! Application configuration.
//!
//! All settings come from the environment (with `.env` support via
//! dotenvy) and are collected once at startup into an explicit struct
//! that gets passed by reference into each component. No ambient
//! singletons.

use std::time::Duration;

/// Default ISA open-data feed for the importer.
pub const ISA_DATA_URL: &str = "https://mapa.eco.br/data/sisarp/v1/tis.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// PostgreSQL connection string (DATABASE_URL)
    pub database_url: String,
    /// REST API bind port (PORT, default 8000)
    pub api_port: u16,
    /// Base URL the MCP adapter calls (CATALOG_API_URL)
    pub api_base_url: String,
    /// MCP HTTP transport bind port (MCP_PORT, default 8001)
    pub mcp_port: u16,
    /// Timeout for upstream API calls from the MCP adapter
    pub upstream_timeout: Duration,
    /// TTL for the list-response cache (CACHE_TTL_SECS, default 60)
    pub cache_ttl: Duration,
    /// Delimiter used when an import record carries communities as a
    /// single delimited string (IMPORT_COMMUNITY_DELIMITER, default ",")
    pub community_delimiter: String,
}

impl AppConfig {
    /// Build configuration from the environment. `DATABASE_URL` is the
    /// only required variable; everything else has a sensible default.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable required"))?;

        Ok(Self {
            database_url,
            api_port: env_parse("PORT", 8000),
            api_base_url: std::env::var("CATALOG_API_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            mcp_port: env_parse("MCP_PORT", 8001),
            upstream_timeout: Duration::from_secs(env_parse("UPSTREAM_TIMEOUT_SECS", 30)),
            cache_ttl: Duration::from_secs(env_parse("CACHE_TTL_SECS", 60)),
            community_delimiter: std::env::var("IMPORT_COMMUNITY_DELIMITER")
                .unwrap_or_else(|_| ",".to_string()),
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
