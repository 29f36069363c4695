//! Land catalog repository.
//!
//! Import-time writes resolve lands by the (source_name, source_id)
//! natural key inside the caller's transaction. The read path returns
//! fully-assembled views in a constant number of round-trips per page:
//! one COUNT, one joined+aggregated page SELECT, and one batched
//! community prefetch — never O(N) follow-up queries.

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::models::{Land, LandCategory};
use crate::query::{LandFilter, OrderBy, PageParams, Paginated};
use crate::views::{self, BiomeView, CommunityView, LandView};

/// Fields written from an external source record, both on create and on
/// `--update` overwrite.
#[derive(Debug, Clone)]
pub struct LandSourceFields {
    pub name: String,
    pub category: LandCategory,
    pub municipality_id: Option<Uuid>,
    pub biome_id: Option<Uuid>,
    pub source_id: String,
    pub source_name: String,
    pub source_updated_at: Option<DateTime<Utc>>,
    pub source_raw_data: serde_json::Value,
}

#[derive(Clone)]
pub struct LandRepository {
    pool: PgPool,
}

impl LandRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ============================================
    // Import path (transactional)
    // ============================================

    /// Resolve a land by its import natural key.
    pub async fn find_by_natural_key(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        source_name: &str,
        source_id: &str,
    ) -> Result<Option<Land>> {
        let land = sqlx::query_as::<_, Land>(
            "SELECT * FROM lands WHERE source_name = $1 AND source_id = $2",
        )
        .bind(source_name)
        .bind(source_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(land)
    }

    /// Create a land from an imported record.
    pub async fn create_from_source(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        fields: &LandSourceFields,
        synced_at: DateTime<Utc>,
    ) -> Result<Land> {
        let land = sqlx::query_as::<_, Land>(
            "INSERT INTO lands \
             (id, name, category, municipality_id, biome_id, \
              source_id, source_name, source_updated_at, source_last_synced_at, source_raw_data) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&fields.name)
        .bind(fields.category.as_str())
        .bind(fields.municipality_id)
        .bind(fields.biome_id)
        .bind(&fields.source_id)
        .bind(&fields.source_name)
        .bind(fields.source_updated_at)
        .bind(synced_at)
        .bind(&fields.source_raw_data)
        .fetch_one(&mut **tx)
        .await
        .with_context(|| format!("Failed to create land '{}'", fields.name))?;

        Ok(land)
    }

    /// Overwrite an existing land from an imported record (update mode).
    pub async fn update_from_source(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        fields: &LandSourceFields,
        synced_at: DateTime<Utc>,
    ) -> Result<Land> {
        let land = sqlx::query_as::<_, Land>(
            "UPDATE lands SET \
             name = $2, category = $3, municipality_id = $4, biome_id = $5, \
             source_updated_at = $6, source_last_synced_at = $7, source_raw_data = $8 \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&fields.name)
        .bind(fields.category.as_str())
        .bind(fields.municipality_id)
        .bind(fields.biome_id)
        .bind(fields.source_updated_at)
        .bind(synced_at)
        .bind(&fields.source_raw_data)
        .fetch_one(&mut **tx)
        .await
        .with_context(|| format!("Failed to update land '{}'", fields.name))?;

        Ok(land)
    }

    /// Default mode leaves an existing land untouched except for the
    /// sync timestamp.
    pub async fn touch_last_synced(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        synced_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("UPDATE lands SET source_last_synced_at = $2 WHERE id = $1")
            .bind(id)
            .bind(synced_at)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Replace the land's community set.
    pub async fn set_communities(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        land_id: Uuid,
        community_ids: &[Uuid],
    ) -> Result<()> {
        sqlx::query("DELETE FROM land_communities WHERE land_id = $1")
            .bind(land_id)
            .execute(&mut **tx)
            .await?;

        for community_id in community_ids {
            sqlx::query(
                "INSERT INTO land_communities (land_id, community_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(land_id)
            .bind(community_id)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    // ============================================
    // Read path (API)
    // ============================================

    /// Filtered, paginated land listing.
    pub async fn list(
        &self,
        filter: &LandFilter,
        page: &PageParams,
        order: OrderBy,
    ) -> Result<Paginated<LandView>> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM (SELECT l.id");
        push_land_core(&mut count_qb, filter);
        count_qb.push(") AS filtered");
        let count: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .context("Failed to count lands")?;

        let mut qb = QueryBuilder::<Postgres>::new(LAND_SELECT);
        push_land_core(&mut qb, filter);
        qb.push(order.to_sql());
        qb.push(" LIMIT ");
        qb.push_bind(page.limit());
        qb.push(" OFFSET ");
        qb.push_bind(page.offset());

        let rows = qb
            .build_query_as::<LandListRow>()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list lands")?;

        let mut communities = self
            .communities_for(&rows.iter().map(|r| r.id).collect::<Vec<_>>())
            .await?;

        let results = rows
            .into_iter()
            .map(|row| {
                let id = row.id;
                row.into_view(communities.remove(&id).unwrap_or_default())
            })
            .collect();

        Ok(Paginated::new(count, page, results))
    }

    /// Single land view, or `None`.
    pub async fn get(&self, id: Uuid) -> Result<Option<LandView>> {
        let mut qb = QueryBuilder::<Postgres>::new(LAND_SELECT);
        qb.push(LAND_FROM);
        qb.push(" WHERE l.id = ");
        qb.push_bind(id);
        qb.push(LAND_GROUP_BY);

        let row = qb
            .build_query_as::<LandListRow>()
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let mut communities = self.communities_for(&[row.id]).await?;
                let id = row.id;
                Ok(Some(row.into_view(communities.remove(&id).unwrap_or_default())))
            }
            None => Ok(None),
        }
    }

    pub async fn total_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lands")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Batched community prefetch for a page of lands: one query
    /// regardless of page size.
    async fn communities_for(
        &self,
        land_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<CommunityView>>> {
        if land_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, LandCommunityRow>(
            "SELECT lc.land_id, c.id, c.name, c.slug \
             FROM land_communities lc \
             JOIN communities c ON c.id = lc.community_id \
             WHERE lc.land_id = ANY($1) \
             ORDER BY c.name",
        )
        .bind(land_ids)
        .fetch_all(&self.pool)
        .await
        .context("Failed to prefetch communities")?;

        let mut map: HashMap<Uuid, Vec<CommunityView>> = HashMap::new();
        for row in rows {
            map.entry(row.land_id).or_default().push(CommunityView {
                id: row.id,
                name: row.name,
                slug: row.slug,
                lands_count: None,
            });
        }
        Ok(map)
    }
}

const LAND_SELECT: &str = "SELECT l.id, l.name, l.category, l.total_area, l.preserved_area, \
     l.source_id, l.source_name, \
     m.name AS municipality_name, s.name AS state_name, s.code AS state_code, \
     co.name AS country_name, co.code AS country_code, \
     b.id AS biome_id, b.name AS biome_name, b.name_local AS biome_name_local, \
     b.description AS biome_description, b.description_local AS biome_description_local, \
     COUNT(DISTINCT lc.community_id) AS communities_count";

const LAND_FROM: &str = " FROM lands l \
     LEFT JOIN municipalities m ON m.id = l.municipality_id \
     LEFT JOIN states s ON s.id = m.state_id \
     LEFT JOIN countries co ON co.id = s.country_id \
     LEFT JOIN biomes b ON b.id = l.biome_id \
     LEFT JOIN land_communities lc ON lc.land_id = l.id \
     LEFT JOIN communities cm ON cm.id = lc.community_id";

const LAND_GROUP_BY: &str = " GROUP BY l.id, m.id, s.id, co.id, b.id";

/// Shared FROM/WHERE/GROUP BY/HAVING core used by both the page query
/// and the COUNT query so their filters can never drift apart.
fn push_land_core(qb: &mut QueryBuilder<'_, Postgres>, filter: &LandFilter) {
    qb.push(LAND_FROM);
    qb.push(" WHERE 1=1");
    filter.apply_where(qb);
    qb.push(LAND_GROUP_BY);
    filter.apply_having(qb);
}

/// One row of the batched community prefetch join.
#[derive(Debug, sqlx::FromRow)]
struct LandCommunityRow {
    land_id: Uuid,
    id: Uuid,
    name: String,
    slug: String,
}

/// One row of the joined land listing, with the precomputed location
/// columns and the community-count aggregate.
#[derive(Debug, sqlx::FromRow)]
pub struct LandListRow {
    pub id: Uuid,
    pub name: String,
    pub category: LandCategory,
    pub total_area: Option<Decimal>,
    pub preserved_area: Option<Decimal>,
    pub source_id: Option<String>,
    pub source_name: Option<String>,
    pub municipality_name: Option<String>,
    pub state_name: Option<String>,
    pub state_code: Option<String>,
    pub country_name: Option<String>,
    pub country_code: Option<String>,
    pub biome_id: Option<Uuid>,
    pub biome_name: Option<String>,
    pub biome_name_local: Option<String>,
    pub biome_description: Option<String>,
    pub biome_description_local: Option<String>,
    pub communities_count: i64,
}

impl LandListRow {
    pub fn into_view(self, communities: Vec<CommunityView>) -> LandView {
        let biome = match (self.biome_id, self.biome_name) {
            (Some(id), Some(name)) => Some(BiomeView {
                id,
                name,
                name_local: self.biome_name_local,
                description: self.biome_description,
                description_local: self.biome_description_local,
            }),
            _ => None,
        };

        LandView {
            id: self.id,
            name: self.name,
            category: self.category,
            category_display: self.category.label().to_string(),
            location: views::location_view(
                self.municipality_name,
                self.state_name,
                self.state_code,
                self.country_name,
                self.country_code,
            ),
            biome,
            communities,
            communities_count: self.communities_count,
            total_area: self.total_area,
            preserved_area: self.preserved_area,
            source_link: views::source_link(self.source_name.as_deref(), self.source_id.as_deref()),
        }
    }
}
