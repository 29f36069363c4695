//! Data catalog for Brazilian indigenous territories.
//!
//! Stores the geographic reference hierarchy (country → state →
//! municipality, plus biomes and communities) and the central `Land`
//! entity, serves it over a filtered REST API, imports records from the
//! ISA open-data feed, and re-exposes the read API as MCP tools.
//!
//! Binaries:
//! - `catalog_api` — REST API server
//! - `catalog_import` — ISA feed importer
//! - `catalog_mcp` — assistant-tool (MCP) server

pub mod api;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod importer;
pub mod mcp;
pub mod models;
pub mod query;
pub mod slug;
pub mod views;

pub use config::AppConfig;
pub use error::{CatalogError, CatalogResult};
