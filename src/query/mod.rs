//! Read-side query building: filters, ordering, pagination.
//!
//! Filters are translated into bound WHERE/HAVING fragments with
//! `sqlx::QueryBuilder`; ordering goes through an allow-list so callers
//! can never inject arbitrary SQL through the `ordering` parameter.

use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};

use crate::error::{CatalogError, CatalogResult};
use crate::models::LandCategory;

/// Filter parameters for `/lands/` listings.
///
/// Id filters are exact; name filters are case-insensitive substring
/// matches; `*_code` filters are case-insensitive exact matches.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LandFilter {
    pub name: Option<String>,
    pub category: Option<LandCategory>,
    pub municipality_id: Option<uuid::Uuid>,
    pub state_id: Option<uuid::Uuid>,
    pub country_id: Option<uuid::Uuid>,
    pub biome_id: Option<uuid::Uuid>,
    pub community_id: Option<uuid::Uuid>,
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
}

impl LandFilter {
    /// Append the WHERE fragment for this filter. The builder must
    /// already contain a clause to extend (the callers use `WHERE 1=1`).
    pub fn apply_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if let Some(name) = &self.name {
            qb.push(" AND l.name ILIKE ");
            qb.push_bind(format!("%{name}%"));
        }
        if let Some(category) = self.category {
            qb.push(" AND l.category = ");
            qb.push_bind(category.as_str());
        }
        if let Some(id) = self.municipality_id {
            qb.push(" AND l.municipality_id = ");
            qb.push_bind(id);
        }
        if let Some(id) = self.state_id {
            qb.push(" AND s.id = ");
            qb.push_bind(id);
        }
        if let Some(id) = self.country_id {
            qb.push(" AND co.id = ");
            qb.push_bind(id);
        }
        if let Some(id) = self.biome_id {
            qb.push(" AND l.biome_id = ");
            qb.push_bind(id);
        }
        if let Some(id) = self.community_id {
            qb.push(" AND lc.community_id = ");
            qb.push_bind(id);
        }
        if let Some(name) = &self.municipality {
            qb.push(" AND m.name ILIKE ");
            qb.push_bind(format!("%{name}%"));
        }
        if let Some(name) = &self.state {
            qb.push(" AND s.name ILIKE ");
            qb.push_bind(format!("%{name}%"));
        }
        if let Some(code) = &self.state_code {
            qb.push(" AND s.code ILIKE ");
            qb.push_bind(code.clone());
        }
        if let Some(name) = &self.country {
            qb.push(" AND co.name ILIKE ");
            qb.push_bind(format!("%{name}%"));
        }
        if let Some(code) = &self.country_code {
            qb.push(" AND co.code ILIKE ");
            qb.push_bind(code.clone());
        }
        if let Some(name) = &self.biome {
            qb.push(" AND b.name ILIKE ");
            qb.push_bind(format!("%{name}%"));
        }
        if let Some(name) = &self.community {
            qb.push(" AND cm.name ILIKE ");
            qb.push_bind(format!("%{name}%"));
        }
    }

    /// Append the HAVING fragment (aggregate bounds), if any.
    pub fn apply_having(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut first = true;
        let mut push_clause = |qb: &mut QueryBuilder<'_, Postgres>| {
            if first {
                qb.push(" HAVING ");
                first = false;
            } else {
                qb.push(" AND ");
            }
        };
        if let Some(exact) = self.communities_count {
            push_clause(qb);
            qb.push("COUNT(DISTINCT lc.community_id) = ");
            qb.push_bind(exact);
        }
        if let Some(min) = self.communities_count_min {
            push_clause(qb);
            qb.push("COUNT(DISTINCT lc.community_id) >= ");
            qb.push_bind(min);
        }
        if let Some(max) = self.communities_count_max {
            push_clause(qb);
            qb.push("COUNT(DISTINCT lc.community_id) <= ");
            qb.push_bind(max);
        }
    }
}

/// Filter parameters for `/communities/` listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommunityFilter {
    pub name: Option<String>,
    pub lands_count: Option<i64>,
    pub lands_count_min: Option<i64>,
    pub lands_count_max: Option<i64>,
}

impl CommunityFilter {
    pub fn apply_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if let Some(name) = &self.name {
            qb.push(" AND c.name ILIKE ");
            qb.push_bind(format!("%{name}%"));
        }
    }

    pub fn apply_having(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        let mut first = true;
        let mut push_clause = |qb: &mut QueryBuilder<'_, Postgres>| {
            if first {
                qb.push(" HAVING ");
                first = false;
            } else {
                qb.push(" AND ");
            }
        };
        if let Some(exact) = self.lands_count {
            push_clause(qb);
            qb.push("COUNT(DISTINCT lc.land_id) = ");
            qb.push_bind(exact);
        }
        if let Some(min) = self.lands_count_min {
            push_clause(qb);
            qb.push("COUNT(DISTINCT lc.land_id) >= ");
            qb.push_bind(min);
        }
        if let Some(max) = self.lands_count_max {
            push_clause(qb);
            qb.push("COUNT(DISTINCT lc.land_id) <= ");
            qb.push_bind(max);
        }
    }
}

/// Page selection, bounded so a single request can never ask for an
/// unbounded result set.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

pub const MAX_PAGE_SIZE: u32 = 100;

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl PageParams {
    pub fn validated(self) -> CatalogResult<Self> {
        if self.page == 0 {
            return Err(CatalogError::BadRequest("page must be >= 1".into()));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(CatalogError::BadRequest(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(self)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }
}

/// Paginated listing envelope.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Paginated<T> {
    pub count: i64,
    pub next: Option<u32>,
    pub previous: Option<u32>,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(count: i64, page: &PageParams, results: Vec<T>) -> Self {
        let has_next = page.offset() + (results.len() as i64) < count;
        Self {
            count,
            next: has_next.then(|| page.page + 1),
            previous: (page.page > 1).then(|| page.page - 1),
            results,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

/// A validated ORDER BY clause built from an allow-list of sort keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    column: &'static str,
    descending: bool,
}

impl OrderBy {
    /// Parse a client ordering key (`-` prefix for descending) against
    /// an allow-list of `(key, column-expression)` pairs.
    pub fn parse(
        raw: Option<&str>,
        allowed: &[(&'static str, &'static str)],
        default: &'static str,
    ) -> CatalogResult<Self> {
        let raw = match raw {
            Some(r) if !r.is_empty() => r,
            _ => {
                return Ok(Self {
                    column: default,
                    descending: false,
                })
            }
        };

        let (key, descending) = match raw.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (raw, false),
        };

        match allowed.iter().find(|(k, _)| *k == key) {
            Some((_, column)) => Ok(Self { column, descending }),
            None => Err(CatalogError::BadRequest(format!(
                "unknown ordering key: {key}"
            ))),
        }
    }

    pub fn to_sql(self) -> String {
        format!(
            " ORDER BY {}{}",
            self.column,
            if self.descending { " DESC" } else { "" }
        )
    }
}

/// Sort keys accepted on `/lands/`.
pub const LAND_ORDERING: &[(&str, &str)] = &[
    ("name", "l.name"),
    ("category", "l.category"),
    ("state_code", "state_code"),
    ("communities_count", "communities_count"),
];

/// Sort keys accepted on `/communities/`.
pub const COMMUNITY_ORDERING: &[(&str, &str)] =
    &[("name", "c.name"), ("lands_count", "lands_count")];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_land_filter_builds_bound_clauses() {
        let filter = LandFilter {
            category: Some(LandCategory::TI),
            state: Some("Acre".into()),
            communities_count_min: Some(2),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("WHERE 1=1");
        filter.apply_where(&mut qb);
        filter.apply_having(&mut qb);
        let sql = qb.into_sql();
        assert!(sql.contains("l.category = $1"));
        assert!(sql.contains("s.name ILIKE $2"));
        assert!(sql.contains("HAVING COUNT(DISTINCT lc.community_id) >= $3"));
    }

    #[test]
    fn test_empty_filter_adds_nothing() {
        let mut qb = QueryBuilder::<Postgres>::new("WHERE 1=1");
        LandFilter::default().apply_where(&mut qb);
        LandFilter::default().apply_having(&mut qb);
        assert_eq!(qb.into_sql(), "WHERE 1=1");
    }

    #[test]
    fn test_exact_count_filters() {
        let filter = LandFilter {
            communities_count: Some(3),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("");
        filter.apply_having(&mut qb);
        assert!(qb.into_sql().contains("HAVING COUNT(DISTINCT lc.community_id) = $1"));

        let filter = CommunityFilter {
            lands_count: Some(2),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("");
        filter.apply_having(&mut qb);
        assert!(qb.into_sql().contains("HAVING COUNT(DISTINCT lc.land_id) = $1"));
    }

    #[test]
    fn test_community_count_bounds_combine_with_and() {
        let filter = CommunityFilter {
            lands_count_min: Some(1),
            lands_count_max: Some(5),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("");
        filter.apply_having(&mut qb);
        let sql = qb.into_sql();
        assert!(sql.contains("HAVING COUNT(DISTINCT lc.land_id) >= $1"));
        assert!(sql.contains("AND COUNT(DISTINCT lc.land_id) <= $2"));
    }

    #[test]
    fn test_ordering_allow_list() {
        let ord = OrderBy::parse(Some("-communities_count"), LAND_ORDERING, "l.name").unwrap();
        assert_eq!(ord.to_sql(), " ORDER BY communities_count DESC");

        let ord = OrderBy::parse(None, LAND_ORDERING, "l.name").unwrap();
        assert_eq!(ord.to_sql(), " ORDER BY l.name");

        assert!(OrderBy::parse(Some("source_raw_data"), LAND_ORDERING, "l.name").is_err());
        assert!(OrderBy::parse(Some("name; DROP TABLE lands"), LAND_ORDERING, "l.name").is_err());
    }

    #[test]
    fn test_page_params_validation() {
        assert!(PageParams { page: 0, page_size: 20 }.validated().is_err());
        assert!(PageParams { page: 1, page_size: 0 }.validated().is_err());
        assert!(PageParams { page: 1, page_size: 101 }.validated().is_err());
        let ok = PageParams { page: 3, page_size: 25 }.validated().unwrap();
        assert_eq!(ok.offset(), 50);
        assert_eq!(ok.limit(), 25);
    }

    #[test]
    fn test_pagination_envelope_math() {
        let page = PageParams { page: 2, page_size: 10 };
        let p = Paginated::new(25, &page, vec![0u8; 10]);
        assert_eq!(p.next, Some(3));
        assert_eq!(p.previous, Some(1));

        let page = PageParams { page: 3, page_size: 10 };
        let p = Paginated::new(25, &page, vec![0u8; 5]);
        assert_eq!(p.next, None);
        assert_eq!(p.previous, Some(2));

        let page = PageParams::default();
        let p = Paginated::new(5, &page, vec![0u8; 5]);
        assert_eq!(p.next, None);
        assert_eq!(p.previous, None);
    }
}
