//! Database access layer.
//!
//! One repository per domain area, each holding a `PgPool`. Import-time
//! writes go through `find_or_create_*` operations that take an explicit
//! transaction, so the reconciler controls the per-record transaction
//! boundary. All queries are runtime-checked (`query_as`), keeping the
//! crate buildable without a live database.

pub mod community_repository;
pub mod land_repository;
pub mod registry_repository;

pub use community_repository::CommunityRepository;
pub use land_repository::{LandListRow, LandRepository, LandSourceFields};
pub use registry_repository::RegistryRepository;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Connect a bounded pool and run the embedded migrations.
pub async fn connect(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    Ok(pool)
}
