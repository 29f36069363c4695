//! Domain entities.
//!
//! The geographic registry (Country, State, Municipality, Biome), the
//! community registry, and the central Land catalog entity. All rows are
//! keyed by UUID; provenance fields on Land track the external source
//! record each row was imported from.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Country {
    pub id: Uuid,
    pub name: String,
    pub name_local: Option<String>,
    /// ISO 3166-1 alpha-2, unique
    pub code: String,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct State {
    pub id: Uuid,
    pub name: String,
    pub name_local: Option<String>,
    pub code: String,
    pub country_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Municipality {
    pub id: Uuid,
    pub name: String,
    pub name_local: Option<String>,
    pub code: Option<String>,
    pub state_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Biome {
    pub id: Uuid,
    pub name: String,
    pub name_local: Option<String>,
    pub description: Option<String>,
    pub description_local: Option<String>,
    pub total_area: Option<Decimal>,
    pub preserved_area: Option<Decimal>,
    pub country_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Community {
    pub id: Uuid,
    pub name: String,
    /// URL-safe slug derived from the name, unique
    pub slug: String,
}

/// Land category codes used by the ISA feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum LandCategory {
    /// Dominial Indígena
    DI,
    /// Parque Indígena
    PI,
    /// Reserva Indígena
    RI,
    /// Terra Indígena
    TI,
}

impl LandCategory {
    pub fn label(&self) -> &'static str {
        match self {
            LandCategory::DI => "Dominial Indígena",
            LandCategory::PI => "Parque Indígena",
            LandCategory::RI => "Reserva Indígena",
            LandCategory::TI => "Terra Indígena",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LandCategory::DI => "DI",
            LandCategory::PI => "PI",
            LandCategory::RI => "RI",
            LandCategory::TI => "TI",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "DI" => Some(LandCategory::DI),
            "PI" => Some(LandCategory::PI),
            "RI" => Some(LandCategory::RI),
            "TI" => Some(LandCategory::TI),
            _ => None,
        }
    }
}

impl std::fmt::Display for LandCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The central catalog entity: an indigenous territory.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Land {
    pub id: Uuid,
    pub name: String,
    pub category: LandCategory,
    pub municipality_id: Option<Uuid>,
    pub biome_id: Option<Uuid>,
    pub total_area: Option<Decimal>,
    pub preserved_area: Option<Decimal>,
    /// Provenance: natural key is (source_name, source_id) when both set
    pub source_id: Option<String>,
    pub source_name: Option<String>,
    pub source_updated_at: Option<DateTime<Utc>>,
    pub source_last_synced_at: Option<DateTime<Utc>>,
    /// Latest fetched source record, stored verbatim for debugging
    pub source_raw_data: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_roundtrip() {
        for code in ["DI", "PI", "RI", "TI"] {
            let cat = LandCategory::parse(code).unwrap();
            assert_eq!(cat.as_str(), code);
        }
        assert!(LandCategory::parse("XX").is_none());
        assert!(LandCategory::parse("ti").is_none());
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(LandCategory::TI.label(), "Terra Indígena");
        assert_eq!(LandCategory::RI.label(), "Reserva Indígena");
    }
}
