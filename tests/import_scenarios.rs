//! End-to-end mapping scenarios for the importer and the read views,
//! exercised without a database: feed record → domain mapping → response
//! shaping.

use serde_json::json;

use terras_catalog::error::CatalogError;
use terras_catalog::importer::{extract_records, fetch_payload, LandRecord};
use terras_catalog::models::LandCategory;
use terras_catalog::slug::slugify;
use terras_catalog::views::{location_view, source_link};

fn isa_record() -> serde_json::Value {
    json!({
        "id": 123,
        "nome_ti": "Terra Exemplo",
        "categoria": "TI",
        "data_alteracao": "2025-10-20 19:23:06",
        "municipio": [{"nome_municipio": "Rio Branco", "uf": "AC"}],
        "bioma": "Amazônia",
        "povo": {"data": [{"povo": "Povo X"}]}
    })
}

#[test]
fn isa_record_maps_to_the_full_hierarchy() {
    let record = LandRecord::from_value(&isa_record(), ",").unwrap();

    assert_eq!(record.source_id, "123");
    assert_eq!(record.category, LandCategory::TI);
    assert_eq!(
        record.municipality,
        Some(("Rio Branco".to_string(), "AC".to_string()))
    );
    assert_eq!(record.biome.as_deref(), Some("Amazônia"));
    assert_eq!(record.communities, vec!["Povo X"]);

    // The community slug and external link the API will expose.
    assert_eq!(slugify(&record.communities[0]), "povo-x");
    assert_eq!(
        source_link(Some("ISA"), Some(&record.source_id)).as_deref(),
        Some("https://terrasindigenas.org.br/en/terras-indigenas/123")
    );
}

#[test]
fn location_is_flattened_from_the_hierarchy() {
    let location = location_view(
        Some("Rio Branco".into()),
        Some("Acre".into()),
        Some("AC".into()),
        Some("Brazil".into()),
        Some("BR".into()),
    )
    .unwrap();

    assert_eq!(location.municipality.as_deref(), Some("Rio Branco"));
    assert_eq!(location.state.as_deref(), Some("Acre"));
    assert_eq!(location.country.as_deref(), Some("Brazil"));
}

#[test]
fn wrapped_and_bare_payloads_extract_identically() {
    let bare = json!([isa_record()]);
    let wrapped = json!({"content": {"info_geral": [isa_record()]}});

    let from_bare = extract_records(&bare).unwrap();
    let from_wrapped = extract_records(&wrapped).unwrap();

    assert_eq!(from_bare.len(), 1);
    assert_eq!(from_bare, from_wrapped);
}

#[test]
fn slug_collisions_get_numeric_suffixes() {
    // Two distinct names that slugify identically would collide; the
    // candidate sequence resolves them deterministically.
    let base = slugify("Guaraní");
    assert_eq!(base, "guarani");
    let mut candidates = terras_catalog::slug::candidates(&base);
    assert_eq!(candidates.next().unwrap(), "guarani");
    assert_eq!(candidates.next().unwrap(), "guarani-2");
}

#[tokio::test]
async fn file_payloads_load_and_malformed_files_are_fatal() {
    use std::io::Write;

    let mut good = tempfile::NamedTempFile::new().unwrap();
    write!(good, "{}", json!([isa_record()])).unwrap();
    let payload = fetch_payload(good.path().to_str().unwrap()).await.unwrap();
    assert_eq!(extract_records(&payload).unwrap().len(), 1);

    let mut bad = tempfile::NamedTempFile::new().unwrap();
    write!(bad, "not json at all").unwrap();
    let err = fetch_payload(bad.path().to_str().unwrap()).await.unwrap_err();
    assert!(matches!(err, CatalogError::FatalFetch(_)));

    let err = fetch_payload("/no/such/file.json").await.unwrap_err();
    assert!(matches!(err, CatalogError::FatalFetch(_)));
}
