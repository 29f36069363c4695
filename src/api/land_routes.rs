//! Land endpoints.
//!
//! - `GET /api/v1/lands/` — filtered, paginated listing
//! - `GET /api/v1/lands/:id/` — single land

use axum::extract::{Path, Query, RawQuery, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use super::AppState;
use crate::error::{CatalogError, CatalogResult};
use crate::models::LandCategory;
use crate::query::{LandFilter, OrderBy, PageParams, LAND_ORDERING};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/lands/", get(list_lands))
        .route("/lands/:id/", get(get_land))
}

/// Flat query-parameter struct: filter fields plus pagination and
/// ordering. Kept flat because nested/flattened serde structs do not
/// deserialize cleanly from query strings.
#[derive(Debug, Default, Deserialize)]
pub struct LandListQuery {
    pub name: Option<String>,
    pub category: Option<LandCategory>,
    pub municipality_id: Option<Uuid>,
    pub state_id: Option<Uuid>,
    pub country_id: Option<Uuid>,
    pub biome_id: Option<Uuid>,
    pub community_id: Option<Uuid>,
    pub municipality: Option<String>,
    pub state: Option<String>,
    pub state_code: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub biome: Option<String>,
    pub community: Option<String>,
    pub communities_count: Option<i64>,
    pub communities_count_min: Option<i64>,
    pub communities_count_max: Option<i64>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub ordering: Option<String>,
}

impl LandListQuery {
    fn into_parts(self) -> CatalogResult<(LandFilter, PageParams, OrderBy)> {
        let mut page = PageParams::default();
        if let Some(p) = self.page {
            page.page = p;
        }
        if let Some(s) = self.page_size {
            page.page_size = s;
        }
        let page = page.validated()?;

        let filter = LandFilter {
            name: self.name,
            category: self.category,
            municipality_id: self.municipality_id,
            state_id: self.state_id,
            country_id: self.country_id,
            biome_id: self.biome_id,
            community_id: self.community_id,
            municipality: self.municipality,
            state: self.state,
            state_code: self.state_code,
            country: self.country,
            country_code: self.country_code,
            biome: self.biome,
            community: self.community,
            communities_count: self.communities_count,
            communities_count_min: self.communities_count_min,
            communities_count_max: self.communities_count_max,
        };

        let order = OrderBy::parse(self.ordering.as_deref(), LAND_ORDERING, "l.name")?;

        Ok((filter, page, order))
    }
}

async fn list_lands(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
    Query(query): Query<LandListQuery>,
) -> CatalogResult<Response> {
    let cache_key = format!("lands?{}", raw_query.as_deref().unwrap_or(""));
    if let Some(body) = state.cache.get(&cache_key) {
        return Ok(cached_json(body));
    }

    let (filter, page, order) = query.into_parts()?;
    let listing = state
        .lands
        .list(&filter, &page, order)
        .await
        .map_err(internal)?;

    if let Ok(body) = serde_json::to_string(&listing) {
        state.cache.put(&cache_key, body);
    }
    Ok(Json(listing).into_response())
}

async fn get_land(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> CatalogResult<Response> {
    let land = state
        .lands
        .get(id)
        .await
        .map_err(internal)?
        .ok_or_else(|| CatalogError::not_found("land", id))?;
    Ok(Json(land).into_response())
}

/// Serve a cached serialized body without re-serializing.
pub(super) fn cached_json(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// Repository errors are internal: callers get a 500 with no detail.
pub(super) fn internal(e: anyhow::Error) -> CatalogError {
    CatalogError::Internal(e)
}
