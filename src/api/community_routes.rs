//! Community endpoints.
//!
//! - `GET /api/v1/communities/` — filtered, paginated listing with the
//!   `lands_count` annotation
//! - `GET /api/v1/communities/:id/` — single community

use axum::extract::{Path, Query, RawQuery, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use super::land_routes::{cached_json, internal};
use super::AppState;
use crate::error::{CatalogError, CatalogResult};
use crate::query::{CommunityFilter, OrderBy, PageParams, COMMUNITY_ORDERING};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/communities/", get(list_communities))
        .route("/communities/:id/", get(get_community))
}

#[derive(Debug, Default, Deserialize)]
pub struct CommunityListQuery {
    pub name: Option<String>,
    pub lands_count: Option<i64>,
    pub lands_count_min: Option<i64>,
    pub lands_count_max: Option<i64>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub ordering: Option<String>,
}

impl CommunityListQuery {
    fn into_parts(self) -> CatalogResult<(CommunityFilter, PageParams, OrderBy)> {
        let mut page = PageParams::default();
        if let Some(p) = self.page {
            page.page = p;
        }
        if let Some(s) = self.page_size {
            page.page_size = s;
        }
        let page = page.validated()?;

        let filter = CommunityFilter {
            name: self.name,
            lands_count: self.lands_count,
            lands_count_min: self.lands_count_min,
            lands_count_max: self.lands_count_max,
        };

        let order = OrderBy::parse(self.ordering.as_deref(), COMMUNITY_ORDERING, "c.name")?;

        Ok((filter, page, order))
    }
}

async fn list_communities(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
    Query(query): Query<CommunityListQuery>,
) -> CatalogResult<Response> {
    let cache_key = format!("communities?{}", raw_query.as_deref().unwrap_or(""));
    if let Some(body) = state.cache.get(&cache_key) {
        return Ok(cached_json(body));
    }

    let (filter, page, order) = query.into_parts()?;
    let listing = state
        .communities
        .list(&filter, &page, order)
        .await
        .map_err(internal)?;

    if let Ok(body) = serde_json::to_string(&listing) {
        state.cache.put(&cache_key, body);
    }
    Ok(Json(listing).into_response())
}

async fn get_community(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> CatalogResult<Response> {
    let community = state
        .communities
        .get(id)
        .await
        .map_err(internal)?
        .ok_or_else(|| CatalogError::not_found("community", id))?;
    Ok(Json(community).into_response())
}
