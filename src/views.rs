//! Read-only response shapes and their computed fields.
//!
//! The flattened `location`, the `category_display` label, and the
//! external `source_link` are pure functions over the queried row, kept
//! independent of the query layer so they can be unit-tested directly.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::LandCategory;

/// External source that carries a public per-record page we can link to.
pub const ISA_SOURCE_NAME: &str = "ISA";

/// Flattened location block on a land response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocationView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub municipality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}

/// Nested biome object on a land response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiomeView {
    pub id: Uuid,
    pub name: String,
    pub name_local: Option<String>,
    pub description: Option<String>,
    pub description_local: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityView {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    /// Number of lands associated with this community (annotation).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lands_count: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandView {
    pub id: Uuid,
    pub name: String,
    pub category: LandCategory,
    pub category_display: String,
    pub location: Option<LocationView>,
    pub biome: Option<BiomeView>,
    pub communities: Vec<CommunityView>,
    pub communities_count: i64,
    pub total_area: Option<Decimal>,
    pub preserved_area: Option<Decimal>,
    pub source_link: Option<String>,
}

/// Build the flattened location from the precomputed join columns.
/// Returns `None` when the land has no municipality at all.
pub fn location_view(
    municipality: Option<String>,
    state: Option<String>,
    state_code: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
) -> Option<LocationView> {
    if municipality.is_none()
        && state.is_none()
        && state_code.is_none()
        && country.is_none()
        && country_code.is_none()
    {
        return None;
    }
    Some(LocationView {
        municipality,
        state,
        state_code,
        country,
        country_code,
    })
}

/// Construct the external link for ISA-sourced records:
/// `https://terrasindigenas.org.br/en/terras-indigenas/{source_id}`.
/// Absent for any other source, or when the source id is missing.
pub fn source_link(source_name: Option<&str>, source_id: Option<&str>) -> Option<String> {
    match (source_name, source_id) {
        (Some(ISA_SOURCE_NAME), Some(id)) if !id.is_empty() => Some(format!(
            "https://terrasindigenas.org.br/en/terras-indigenas/{id}"
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_link_for_isa_records() {
        assert_eq!(
            source_link(Some("ISA"), Some("123")).as_deref(),
            Some("https://terrasindigenas.org.br/en/terras-indigenas/123")
        );
    }

    #[test]
    fn test_source_link_absent_otherwise() {
        assert_eq!(source_link(Some("FUNAI"), Some("123")), None);
        assert_eq!(source_link(Some("ISA"), None), None);
        assert_eq!(source_link(Some("ISA"), Some("")), None);
        assert_eq!(source_link(None, Some("123")), None);
    }

    #[test]
    fn test_location_none_without_any_component() {
        assert_eq!(location_view(None, None, None, None, None), None);
    }

    #[test]
    fn test_location_flattens_join_columns() {
        let loc = location_view(
            Some("Rio Branco".into()),
            Some("Acre".into()),
            Some("AC".into()),
            Some("Brazil".into()),
            Some("BR".into()),
        )
        .unwrap();
        assert_eq!(loc.municipality.as_deref(), Some("Rio Branco"));
        assert_eq!(loc.state.as_deref(), Some("Acre"));
        assert_eq!(loc.country_code.as_deref(), Some("BR"));
    }
}
