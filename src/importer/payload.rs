//! Import payload handling: fetch, shape extraction, record mapping.
//!
//! The feed is JSON in one of three shapes: a bare array,
//! `{"content": [...]}`, or `{"content": {"info_geral": [...]}}`.
//! A failure to fetch or parse the payload itself is fatal; a malformed
//! individual record is mapped to [`CatalogError::RecordSkip`] so the
//! batch can continue.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::error::{CatalogError, CatalogResult};
use crate::models::LandCategory;

/// Load the payload from a local file or an HTTP(S) URL.
/// Any failure here aborts the import before a single write.
pub async fn fetch_payload(path_or_url: &str) -> CatalogResult<Value> {
    if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
        let response = reqwest::get(path_or_url)
            .await
            .map_err(|e| CatalogError::FatalFetch(format!("download failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CatalogError::FatalFetch(format!(
                "download failed: HTTP {}",
                response.status()
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| CatalogError::FatalFetch(format!("invalid JSON payload: {e}")))
    } else {
        let raw = tokio::fs::read_to_string(path_or_url)
            .await
            .map_err(|e| CatalogError::FatalFetch(format!("cannot read {path_or_url}: {e}")))?;

        serde_json::from_str(&raw)
            .map_err(|e| CatalogError::FatalFetch(format!("invalid JSON file: {e}")))
    }
}

/// Pull the record array out of whichever wrapper shape the payload
/// uses.
pub fn extract_records(payload: &Value) -> CatalogResult<&[Value]> {
    match payload {
        Value::Array(records) => Ok(records),
        Value::Object(map) => match map.get("content") {
            Some(Value::Array(records)) => Ok(records),
            Some(Value::Object(content)) => match content.get("info_geral") {
                Some(Value::Array(records)) => Ok(records),
                _ => Err(CatalogError::FatalFetch(
                    "unexpected JSON structure: 'content' object has no 'info_geral' array".into(),
                )),
            },
            _ => Err(CatalogError::FatalFetch(
                "unexpected JSON structure: expected 'content' array or a bare list".into(),
            )),
        },
        _ => Err(CatalogError::FatalFetch(
            "unexpected JSON structure: expected an array or an object".into(),
        )),
    }
}

/// One feed record mapped onto the domain, before any database
/// resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandRecord {
    pub source_id: String,
    pub name: String,
    pub category: LandCategory,
    /// (municipality name, state code) of the first listed municipality
    pub municipality: Option<(String, String)>,
    pub biome: Option<String>,
    pub communities: Vec<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl LandRecord {
    /// Map a raw feed record. `delimiter` applies when the community
    /// field is a single delimited string rather than a list.
    pub fn from_value(value: &Value, delimiter: &str) -> CatalogResult<Self> {
        let source_id = match value.get("id") {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => return Err(CatalogError::RecordSkip("missing record id".into())),
        };

        let name = match value.get("nome_ti").and_then(Value::as_str) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => {
                return Err(CatalogError::RecordSkip(format!(
                    "record {source_id}: missing name"
                )))
            }
        };

        // Missing category defaults to TI; an unknown code is malformed.
        let category = match value.get("categoria").and_then(Value::as_str) {
            None => LandCategory::TI,
            Some(code) => LandCategory::parse(code).ok_or_else(|| {
                CatalogError::RecordSkip(format!("record {source_id}: unknown category '{code}'"))
            })?,
        };

        let municipality = value
            .get("municipio")
            .and_then(Value::as_array)
            .and_then(|list| list.first())
            .and_then(|m| {
                let name = m.get("nome_municipio").and_then(Value::as_str)?;
                let uf = m.get("uf").and_then(Value::as_str)?;
                (!name.is_empty() && !uf.is_empty())
                    .then(|| (name.to_string(), uf.to_string()))
            });

        let biome = value
            .get("bioma")
            .and_then(Value::as_str)
            .filter(|b| !b.is_empty())
            .map(str::to_string);

        let communities = value
            .get("povo")
            .map(|povo| split_communities(povo, delimiter))
            .unwrap_or_default();

        let updated_at = value
            .get("data_alteracao")
            .and_then(Value::as_str)
            .and_then(parse_source_datetime);

        Ok(Self {
            source_id,
            name,
            category,
            municipality,
            biome,
            communities,
            updated_at,
        })
    }
}

/// Split the community field into individual names. Accepts the feed's
/// `{"data": [{"povo": "..."}]}` shape, a plain list, or a delimited
/// string.
fn split_communities(value: &Value, delimiter: &str) -> Vec<String> {
    let mut names = Vec::new();

    let mut push = |name: &str| {
        let name = name.trim();
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    };

    match value {
        Value::Object(map) => {
            if let Some(Value::Array(items)) = map.get("data") {
                for item in items {
                    match item {
                        Value::Object(entry) => {
                            if let Some(name) = entry.get("povo").and_then(Value::as_str) {
                                push(name);
                            }
                        }
                        Value::String(name) => push(name),
                        _ => {}
                    }
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::String(name) => push(name),
                    Value::Object(entry) => {
                        if let Some(name) = entry.get("povo").and_then(Value::as_str) {
                            push(name);
                        }
                    }
                    _ => {}
                }
            }
        }
        Value::String(joined) => {
            for name in joined.split(delimiter) {
                push(name);
            }
        }
        _ => {}
    }

    names
}

/// Parse the feed's timestamp formats: RFC 3339, or the bare
/// `"2025-10-20 19:23:06"` form, taken as UTC.
fn parse_source_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> CatalogResult<LandRecord> {
        LandRecord::from_value(&value, ",")
    }

    #[test]
    fn test_extracts_bare_array() {
        let payload = json!([{"id": 1}, {"id": 2}]);
        assert_eq!(extract_records(&payload).unwrap().len(), 2);
    }

    #[test]
    fn test_extracts_content_wrapper() {
        let payload = json!({"content": [{"id": 1}]});
        assert_eq!(extract_records(&payload).unwrap().len(), 1);
    }

    #[test]
    fn test_extracts_info_geral_wrapper() {
        let payload = json!({"content": {"info_geral": [{"id": 1}, {"id": 2}, {"id": 3}]}});
        assert_eq!(extract_records(&payload).unwrap().len(), 3);
    }

    #[test]
    fn test_rejects_unexpected_shapes() {
        assert!(matches!(
            extract_records(&json!({"items": []})),
            Err(CatalogError::FatalFetch(_))
        ));
        assert!(matches!(
            extract_records(&json!({"content": {"other": []}})),
            Err(CatalogError::FatalFetch(_))
        ));
        assert!(matches!(
            extract_records(&json!("nope")),
            Err(CatalogError::FatalFetch(_))
        ));
    }

    #[test]
    fn test_maps_full_record() {
        let rec = record(json!({
            "id": 4184,
            "nome_ti": "Terra Exemplo",
            "categoria": "TI",
            "data_alteracao": "2025-10-20 19:23:06",
            "municipio": [{"nome_municipio": "Rio Branco", "uf": "AC"}],
            "bioma": "Amazônia",
            "povo": {"data": [{"povo": "Povo X"}]}
        }))
        .unwrap();

        assert_eq!(rec.source_id, "4184");
        assert_eq!(rec.name, "Terra Exemplo");
        assert_eq!(rec.category, LandCategory::TI);
        assert_eq!(
            rec.municipality,
            Some(("Rio Branco".to_string(), "AC".to_string()))
        );
        assert_eq!(rec.biome.as_deref(), Some("Amazônia"));
        assert_eq!(rec.communities, vec!["Povo X"]);
        assert_eq!(
            rec.updated_at.unwrap().to_rfc3339(),
            "2025-10-20T19:23:06+00:00"
        );
    }

    #[test]
    fn test_missing_id_or_name_is_a_record_skip() {
        assert!(matches!(
            record(json!({"nome_ti": "X"})),
            Err(CatalogError::RecordSkip(_))
        ));
        assert!(matches!(
            record(json!({"id": 7})),
            Err(CatalogError::RecordSkip(_))
        ));
    }

    #[test]
    fn test_missing_category_defaults_unknown_category_skips() {
        let rec = record(json!({"id": 1, "nome_ti": "X"})).unwrap();
        assert_eq!(rec.category, LandCategory::TI);

        assert!(matches!(
            record(json!({"id": 1, "nome_ti": "X", "categoria": "ZZ"})),
            Err(CatalogError::RecordSkip(_))
        ));
    }

    #[test]
    fn test_community_splitting_shapes() {
        let rec = record(json!({
            "id": 1, "nome_ti": "X",
            "povo": {"data": [{"povo": "Guarani"}, {"povo": "Yanomami"}, {"povo": "Guarani"}]}
        }))
        .unwrap();
        assert_eq!(rec.communities, vec!["Guarani", "Yanomami"]);

        let rec = record(json!({"id": 1, "nome_ti": "X", "povo": ["A", "B"]})).unwrap();
        assert_eq!(rec.communities, vec!["A", "B"]);

        let rec = record(json!({"id": 1, "nome_ti": "X", "povo": " Povo X , Povo Y ,"})).unwrap();
        assert_eq!(rec.communities, vec!["Povo X", "Povo Y"]);
    }

    #[test]
    fn test_custom_delimiter() {
        let value = json!({"id": 1, "nome_ti": "X", "povo": "Povo X; Povo Y"});
        let rec = LandRecord::from_value(&value, ";").unwrap();
        assert_eq!(rec.communities, vec!["Povo X", "Povo Y"]);
    }

    #[test]
    fn test_datetime_formats() {
        let rec = record(json!({
            "id": 1, "nome_ti": "X", "data_alteracao": "2024-05-01T12:00:00-03:00"
        }))
        .unwrap();
        assert_eq!(
            rec.updated_at.unwrap().to_rfc3339(),
            "2024-05-01T15:00:00+00:00"
        );

        let rec = record(json!({"id": 1, "nome_ti": "X", "data_alteracao": "not a date"})).unwrap();
        assert!(rec.updated_at.is_none());
    }

    #[test]
    fn test_numeric_and_string_ids() {
        assert_eq!(record(json!({"id": 42, "nome_ti": "X"})).unwrap().source_id, "42");
        assert_eq!(
            record(json!({"id": "42a", "nome_ti": "X"})).unwrap().source_id,
            "42a"
        );
    }
}
