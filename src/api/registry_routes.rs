//! Geographic registry endpoints: countries, states, municipalities,
//! biomes. All read-only; the importer is the only writer.

use axum::extract::{Path, Query, State};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use super::land_routes::internal;
use super::AppState;
use crate::error::{CatalogError, CatalogResult};
use crate::models::{Biome, Country, Municipality, State as StateModel};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/countries/", get(list_countries))
        .route("/countries/:id/", get(get_country))
        .route("/states/", get(list_states))
        .route("/states/:id/", get(get_state))
        .route("/municipalities/", get(list_municipalities))
        .route("/municipalities/:id/", get(get_municipality))
        .route("/biomes/", get(list_biomes))
        .route("/biomes/:id/", get(get_biome))
}

async fn list_countries(State(state): State<AppState>) -> CatalogResult<Json<Vec<Country>>> {
    Ok(Json(state.registry.list_countries().await.map_err(internal)?))
}

async fn get_country(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> CatalogResult<Json<Country>> {
    state
        .registry
        .get_country(id)
        .await
        .map_err(internal)?
        .map(Json)
        .ok_or_else(|| CatalogError::not_found("country", id))
}

#[derive(Debug, Default, Deserialize)]
struct StateListQuery {
    country_id: Option<Uuid>,
}

async fn list_states(
    State(state): State<AppState>,
    Query(query): Query<StateListQuery>,
) -> CatalogResult<Json<Vec<StateModel>>> {
    Ok(Json(
        state
            .registry
            .list_states(query.country_id)
            .await
            .map_err(internal)?,
    ))
}

async fn get_state(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> CatalogResult<Json<StateModel>> {
    state
        .registry
        .get_state(id)
        .await
        .map_err(internal)?
        .map(Json)
        .ok_or_else(|| CatalogError::not_found("state", id))
}

#[derive(Debug, Default, Deserialize)]
struct MunicipalityListQuery {
    state_id: Option<Uuid>,
}

async fn list_municipalities(
    State(state): State<AppState>,
    Query(query): Query<MunicipalityListQuery>,
) -> CatalogResult<Json<Vec<Municipality>>> {
    Ok(Json(
        state
            .registry
            .list_municipalities(query.state_id)
            .await
            .map_err(internal)?,
    ))
}

async fn get_municipality(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> CatalogResult<Json<Municipality>> {
    state
        .registry
        .get_municipality(id)
        .await
        .map_err(internal)?
        .map(Json)
        .ok_or_else(|| CatalogError::not_found("municipality", id))
}

async fn list_biomes(State(state): State<AppState>) -> CatalogResult<Json<Vec<Biome>>> {
    Ok(Json(state.registry.list_biomes().await.map_err(internal)?))
}

async fn get_biome(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> CatalogResult<Json<Biome>> {
    state
        .registry
        .get_biome(id)
        .await
        .map_err(internal)?
        .map(Json)
        .ok_or_else(|| CatalogError::not_found("biome", id))
}
