//! External-data import: fetches the ISA feed (or a local file), maps
//! each record onto the registries and the land catalog, and reconciles
//! with create/update/skip semantics.

pub mod payload;
pub mod reconciler;

pub use payload::{extract_records, fetch_payload, LandRecord};
pub use reconciler::{ImportOptions, ImportStats, Reconciler};
