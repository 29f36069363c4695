//! REST API server binary.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/terras ./target/debug/catalog_api
//! ```
//!
//! ## Environment Variables
//!
//! - `DATABASE_URL` (required): PostgreSQL connection string
//! - `PORT` (optional, default 8000): bind port
//! - `CACHE_TTL_SECS` (optional, default 60): list-response cache TTL

use anyhow::Result;
use tracing::info;

use terras_catalog::api::{create_router, AppState};
use terras_catalog::{database, AppConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "terras_catalog=info,tower_http=debug".into()),
        )
        .init();

    let config = AppConfig::from_env()?;

    info!("Connecting to database");
    let pool = database::connect(&config.database_url).await?;

    let state = AppState::new(pool, &config);
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
