//! Community registry repository.
//!
//! Communities are deduplicated by name on import; slugs are derived
//! from the name with a numeric suffix on collision. Listings carry a
//! `lands_count` aggregate computed in the same query.

use anyhow::{Context, Result};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::models::Community;
use crate::query::{CommunityFilter, OrderBy, PageParams, Paginated};
use crate::slug;
use crate::views::CommunityView;

#[derive(Clone)]
pub struct CommunityRepository {
    pool: PgPool,
}

impl CommunityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ============================================
    // Find-or-create (import path, transactional)
    // ============================================

    /// Resolve a community by name, creating it with a derived slug if
    /// absent. Different names that slugify identically get a numeric
    /// suffix: `guarani`, `guarani-2`, `guarani-3`, …
    pub async fn find_or_create(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
    ) -> Result<(Community, bool)> {
        let existing = sqlx::query_as::<_, Community>("SELECT * FROM communities WHERE name = $1")
            .bind(name)
            .fetch_optional(&mut **tx)
            .await?;

        if let Some(community) = existing {
            return Ok((community, false));
        }

        let base = slug::slugify(name);
        let unique_slug = self.first_free_slug(tx, &base).await?;

        let community = sqlx::query_as::<_, Community>(
            "INSERT INTO communities (id, name, slug) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(&unique_slug)
        .fetch_one(&mut **tx)
        .await
        .with_context(|| format!("Failed to create community '{name}'"))?;

        Ok((community, true))
    }

    async fn first_free_slug(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        base: &str,
    ) -> Result<String> {
        for candidate in slug::candidates(base) {
            let taken =
                sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM communities WHERE slug = $1)")
                    .bind(&candidate)
                    .fetch_one(&mut **tx)
                    .await?;
            if !taken {
                return Ok(candidate);
            }
        }
        unreachable!("slug candidate sequence is infinite")
    }

    // ============================================
    // Read path (API)
    // ============================================

    /// Filtered, paginated community listing with the `lands_count`
    /// aggregate. Two round-trips per page: one COUNT, one page SELECT.
    pub async fn list(
        &self,
        filter: &CommunityFilter,
        page: &PageParams,
        order: OrderBy,
    ) -> Result<Paginated<CommunityView>> {
        let mut count_qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM (SELECT c.id FROM communities c \
             LEFT JOIN land_communities lc ON lc.community_id = c.id WHERE 1=1",
        );
        filter.apply_where(&mut count_qb);
        count_qb.push(" GROUP BY c.id");
        filter.apply_having(&mut count_qb);
        count_qb.push(") AS filtered");
        let count: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .context("Failed to count communities")?;

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT c.id, c.name, c.slug, COUNT(DISTINCT lc.land_id) AS lands_count \
             FROM communities c \
             LEFT JOIN land_communities lc ON lc.community_id = c.id WHERE 1=1",
        );
        filter.apply_where(&mut qb);
        qb.push(" GROUP BY c.id");
        filter.apply_having(&mut qb);
        qb.push(order.to_sql());
        qb.push(" LIMIT ");
        qb.push_bind(page.limit());
        qb.push(" OFFSET ");
        qb.push_bind(page.offset());

        let rows = qb
            .build_query_as::<CommunityRow>()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list communities")?;

        let results = rows.into_iter().map(CommunityRow::into_view).collect();
        Ok(Paginated::new(count, page, results))
    }

    /// Single community with its `lands_count`, or `None`.
    pub async fn get(&self, id: Uuid) -> Result<Option<CommunityView>> {
        let row = sqlx::query_as::<_, CommunityRow>(
            "SELECT c.id, c.name, c.slug, COUNT(DISTINCT lc.land_id) AS lands_count \
             FROM communities c \
             LEFT JOIN land_communities lc ON lc.community_id = c.id \
             WHERE c.id = $1 GROUP BY c.id",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CommunityRow::into_view))
    }

    pub async fn total_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM communities")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[derive(sqlx::FromRow)]
struct CommunityRow {
    id: Uuid,
    name: String,
    slug: String,
    lands_count: i64,
}

impl CommunityRow {
    fn into_view(self) -> CommunityView {
        CommunityView {
            id: self.id,
            name: self.name,
            slug: self.slug,
            lands_count: Some(self.lands_count),
        }
    }
}
