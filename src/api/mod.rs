//! REST API: routers, shared state, health check.
//!
//! Read-only endpoints under `/api/v1`; the importer is the only writer.

pub mod community_routes;
pub mod land_routes;
pub mod registry_routes;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::cache::ResponseCache;
use crate::config::AppConfig;
use crate::database::{CommunityRepository, LandRepository, RegistryRepository};

/// Shared application state, constructed once at startup.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub registry: RegistryRepository,
    pub communities: CommunityRepository,
    pub lands: LandRepository,
    pub cache: Arc<ResponseCache>,
}

impl AppState {
    pub fn new(pool: PgPool, config: &AppConfig) -> Self {
        Self {
            registry: RegistryRepository::new(pool.clone()),
            communities: CommunityRepository::new(pool.clone()),
            lands: LandRepository::new(pool.clone()),
            cache: Arc::new(ResponseCache::new(config.cache_ttl)),
            pool,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest(
            "/api/v1",
            Router::new()
                .merge(registry_routes::router())
                .merge(land_routes::router())
                .merge(community_routes::router()),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

/// GET /health — checks database and cache connectivity.
/// 200 when everything answers, 503 otherwise, with per-check detail.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let database = match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.pool)
        .await
    {
        Ok(_) => json!({"status": "healthy"}),
        Err(e) => json!({"status": "unhealthy", "error": e.to_string()}),
    };

    let cache = match state.cache.check() {
        Ok(()) => json!({"status": "healthy"}),
        Err(e) => json!({"status": "unhealthy", "error": e}),
    };

    let all_healthy = database["status"] == "healthy" && cache["status"] == "healthy";
    let status = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if all_healthy { "healthy" } else { "unhealthy" },
            "checks": { "database": database, "cache": cache },
        })),
    )
}
