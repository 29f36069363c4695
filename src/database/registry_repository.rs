//! Geographic registry repository: countries, states, municipalities,
//! biomes.
//!
//! The registry is created lazily by the importer (find-or-create by
//! natural key) and read-only from the API's perspective.

use anyhow::{Context, Result};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::{Biome, Country, Municipality, State};

#[derive(Clone)]
pub struct RegistryRepository {
    pool: PgPool,
}

impl RegistryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ============================================
    // Find-or-create (import path, transactional)
    // ============================================

    /// Resolve a country by its 2-letter code, creating it if absent.
    /// Returns the entity and whether it was created.
    pub async fn find_or_create_country(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
        name: &str,
    ) -> Result<(Country, bool)> {
        let existing = sqlx::query_as::<_, Country>("SELECT * FROM countries WHERE code = $1")
            .bind(code)
            .fetch_optional(&mut **tx)
            .await?;

        if let Some(country) = existing {
            return Ok((country, false));
        }

        let country = sqlx::query_as::<_, Country>(
            "INSERT INTO countries (id, name, code) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(code)
        .fetch_one(&mut **tx)
        .await
        .context("Failed to create country")?;

        Ok((country, true))
    }

    /// Resolve a state by code within a country. A state first seen
    /// through the import carries its code as a placeholder name.
    pub async fn find_or_create_state(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
        country_id: Uuid,
    ) -> Result<(State, bool)> {
        let existing = sqlx::query_as::<_, State>(
            "SELECT * FROM states WHERE code = $1 AND country_id = $2",
        )
        .bind(code)
        .bind(country_id)
        .fetch_optional(&mut **tx)
        .await?;

        if let Some(state) = existing {
            return Ok((state, false));
        }

        let state = sqlx::query_as::<_, State>(
            "INSERT INTO states (id, name, code, country_id) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(code)
        .bind(code)
        .bind(country_id)
        .fetch_one(&mut **tx)
        .await
        .context("Failed to create state")?;

        Ok((state, true))
    }

    /// Resolve a municipality by name within a state.
    pub async fn find_or_create_municipality(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
        state_id: Uuid,
        code: Option<&str>,
    ) -> Result<(Municipality, bool)> {
        let existing = sqlx::query_as::<_, Municipality>(
            "SELECT * FROM municipalities WHERE name = $1 AND state_id = $2",
        )
        .bind(name)
        .bind(state_id)
        .fetch_optional(&mut **tx)
        .await?;

        if let Some(municipality) = existing {
            return Ok((municipality, false));
        }

        let municipality = sqlx::query_as::<_, Municipality>(
            "INSERT INTO municipalities (id, name, code, state_id) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(code)
        .bind(state_id)
        .fetch_one(&mut **tx)
        .await
        .context("Failed to create municipality")?;

        Ok((municipality, true))
    }

    /// Resolve a biome by name within a country.
    pub async fn find_or_create_biome(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
        country_id: Uuid,
    ) -> Result<(Biome, bool)> {
        let existing = sqlx::query_as::<_, Biome>(
            "SELECT * FROM biomes WHERE name = $1 AND country_id = $2",
        )
        .bind(name)
        .bind(country_id)
        .fetch_optional(&mut **tx)
        .await?;

        if let Some(biome) = existing {
            return Ok((biome, false));
        }

        let biome = sqlx::query_as::<_, Biome>(
            "INSERT INTO biomes (id, name, country_id) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(country_id)
        .fetch_one(&mut **tx)
        .await
        .context("Failed to create biome")?;

        Ok((biome, true))
    }

    // ============================================
    // Read path (API)
    // ============================================

    pub async fn list_countries(&self) -> Result<Vec<Country>> {
        let countries = sqlx::query_as::<_, Country>("SELECT * FROM countries ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(countries)
    }

    pub async fn get_country(&self, id: Uuid) -> Result<Option<Country>> {
        let country = sqlx::query_as::<_, Country>("SELECT * FROM countries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(country)
    }

    pub async fn list_states(&self, country_id: Option<Uuid>) -> Result<Vec<State>> {
        let states = match country_id {
            Some(country_id) => {
                sqlx::query_as::<_, State>(
                    "SELECT * FROM states WHERE country_id = $1 ORDER BY name",
                )
                .bind(country_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, State>("SELECT * FROM states ORDER BY name")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(states)
    }

    pub async fn get_state(&self, id: Uuid) -> Result<Option<State>> {
        let state = sqlx::query_as::<_, State>("SELECT * FROM states WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(state)
    }

    pub async fn list_municipalities(&self, state_id: Option<Uuid>) -> Result<Vec<Municipality>> {
        let municipalities = match state_id {
            Some(state_id) => {
                sqlx::query_as::<_, Municipality>(
                    "SELECT * FROM municipalities WHERE state_id = $1 ORDER BY name",
                )
                .bind(state_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Municipality>("SELECT * FROM municipalities ORDER BY name")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(municipalities)
    }

    pub async fn get_municipality(&self, id: Uuid) -> Result<Option<Municipality>> {
        let municipality =
            sqlx::query_as::<_, Municipality>("SELECT * FROM municipalities WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(municipality)
    }

    pub async fn list_biomes(&self) -> Result<Vec<Biome>> {
        let biomes = sqlx::query_as::<_, Biome>("SELECT * FROM biomes ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(biomes)
    }

    pub async fn get_biome(&self, id: Uuid) -> Result<Option<Biome>> {
        let biome = sqlx::query_as::<_, Biome>("SELECT * FROM biomes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(biome)
    }
}
