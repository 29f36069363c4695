//! The import reconciler: maps feed records onto the registries and the
//! land catalog with create/update/skip semantics.
//!
//! Each record runs in its own all-or-nothing transaction, so a failure
//! on one record (say, a uniqueness violation) cannot leave half-written
//! relations behind while the batch continues. Dry-run mode runs the
//! whole batch inside one outer transaction (records as savepoints) and
//! rolls everything back at the end.

use anyhow::Result;
use chrono::Utc;
use sqlx::{Acquire, PgPool, Postgres, Transaction};
use tracing::{info, warn};

use crate::database::{CommunityRepository, LandRepository, LandSourceFields, RegistryRepository};
use crate::importer::payload::LandRecord;
use crate::views::ISA_SOURCE_NAME;

/// Importer run modes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Perform all resolution and report counts, persist nothing.
    pub dry_run: bool,
    /// Overwrite existing lands instead of skipping them.
    pub update_existing: bool,
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub lands_created: u32,
    pub lands_updated: u32,
    pub lands_skipped: u32,
    pub records_failed: u32,
    pub municipalities_created: u32,
    pub communities_created: u32,
}

/// What a record run does to its land, decided up front from whether
/// the land already exists and the run mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncAction {
    Create,
    Overwrite,
    /// Leave the land untouched except for `source_last_synced_at`.
    TouchOnly,
}

fn sync_action(exists: bool, update_existing: bool) -> SyncAction {
    match (exists, update_existing) {
        (false, _) => SyncAction::Create,
        (true, true) => SyncAction::Overwrite,
        (true, false) => SyncAction::TouchOnly,
    }
}

#[derive(Debug, Default)]
struct RecordOutcome {
    created: bool,
    updated: bool,
    skipped: bool,
    municipalities_created: u32,
    communities_created: u32,
}

pub struct Reconciler {
    pool: PgPool,
    registry: RegistryRepository,
    communities: CommunityRepository,
    lands: LandRepository,
    community_delimiter: String,
}

impl Reconciler {
    pub fn new(pool: PgPool, community_delimiter: impl Into<String>) -> Self {
        Self {
            registry: RegistryRepository::new(pool.clone()),
            communities: CommunityRepository::new(pool.clone()),
            lands: LandRepository::new(pool.clone()),
            pool,
            community_delimiter: community_delimiter.into(),
        }
    }

    /// Run the batch. Record-level failures are logged and counted; only
    /// infrastructure failures (connection loss) abort the run.
    pub async fn run(
        &self,
        records: &[serde_json::Value],
        options: ImportOptions,
    ) -> Result<ImportStats> {
        info!(
            records = records.len(),
            dry_run = options.dry_run,
            update = options.update_existing,
            "starting import"
        );

        if options.dry_run {
            let mut outer = self.pool.begin().await?;
            let stats = self.run_records(&mut outer, records, options).await?;
            outer.rollback().await?;
            Ok(stats)
        } else {
            let mut stats = ImportStats::default();
            for record in records {
                let mut tx = self.pool.begin().await?;
                match self.process_record(&mut tx, record, options).await {
                    Ok(outcome) => {
                        tx.commit().await?;
                        stats.absorb(&outcome);
                    }
                    Err(e) => {
                        tx.rollback().await?;
                        warn!(error = %e, "record failed, continuing batch");
                        stats.records_failed += 1;
                    }
                }
            }
            Ok(stats)
        }
    }

    /// Dry-run path: every record inside a savepoint of `outer`.
    async fn run_records(
        &self,
        outer: &mut Transaction<'_, Postgres>,
        records: &[serde_json::Value],
        options: ImportOptions,
    ) -> Result<ImportStats> {
        let mut stats = ImportStats::default();
        for record in records {
            let mut inner = (&mut **outer).begin().await?;
            match self.process_record(&mut inner, record, options).await {
                Ok(outcome) => {
                    inner.commit().await?;
                    stats.absorb(&outcome);
                }
                Err(e) => {
                    inner.rollback().await?;
                    warn!(error = %e, "record failed, continuing batch");
                    stats.records_failed += 1;
                }
            }
        }
        Ok(stats)
    }

    /// Resolve one record end to end inside the given transaction.
    async fn process_record(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        raw: &serde_json::Value,
        options: ImportOptions,
    ) -> Result<RecordOutcome> {
        let record = LandRecord::from_value(raw, &self.community_delimiter)?;
        let mut outcome = RecordOutcome::default();
        let synced_at = Utc::now();

        // Single-tenant assumption: everything hangs off Brazil.
        let (brazil, _) = self
            .registry
            .find_or_create_country(tx, "BR", "Brazil")
            .await?;

        let existing = self
            .lands
            .find_by_natural_key(tx, ISA_SOURCE_NAME, &record.source_id)
            .await?;

        let action = sync_action(existing.is_some(), options.update_existing);

        if let (SyncAction::TouchOnly, Some(ref land)) = (action, &existing) {
            self.lands.touch_last_synced(tx, land.id, synced_at).await?;
            info!(name = %record.name, source_id = %record.source_id, "skipping existing land");
            outcome.skipped = true;
            return Ok(outcome);
        }

        let municipality_id = match &record.municipality {
            Some((name, uf)) => {
                let (state, _) = self.registry.find_or_create_state(tx, uf, brazil.id).await?;
                let (municipality, created) = self
                    .registry
                    .find_or_create_municipality(tx, name, state.id, Some(uf))
                    .await?;
                if created {
                    outcome.municipalities_created += 1;
                }
                Some(municipality.id)
            }
            None => None,
        };

        let biome_id = match &record.biome {
            Some(name) => {
                let (biome, _) = self.registry.find_or_create_biome(tx, name, brazil.id).await?;
                Some(biome.id)
            }
            None => None,
        };

        let mut community_ids = Vec::with_capacity(record.communities.len());
        for name in &record.communities {
            let (community, created) = self.communities.find_or_create(tx, name).await?;
            if created {
                outcome.communities_created += 1;
            }
            community_ids.push(community.id);
        }

        let fields = LandSourceFields {
            name: record.name.clone(),
            category: record.category,
            municipality_id,
            biome_id,
            source_id: record.source_id.clone(),
            source_name: ISA_SOURCE_NAME.to_string(),
            source_updated_at: record.updated_at,
            source_raw_data: raw.clone(),
        };

        let land = match (action, existing) {
            (SyncAction::Overwrite, Some(land)) => {
                let land = self
                    .lands
                    .update_from_source(tx, land.id, &fields, synced_at)
                    .await?;
                info!(name = %record.name, source_id = %record.source_id, "updated land");
                outcome.updated = true;
                land
            }
            _ => {
                let land = self.lands.create_from_source(tx, &fields, synced_at).await?;
                info!(name = %record.name, source_id = %record.source_id, "created land");
                outcome.created = true;
                land
            }
        };

        self.lands.set_communities(tx, land.id, &community_ids).await?;

        Ok(outcome)
    }
}

impl ImportStats {
    fn absorb(&mut self, outcome: &RecordOutcome) {
        self.lands_created += u32::from(outcome.created);
        self.lands_updated += u32::from(outcome.updated);
        self.lands_skipped += u32::from(outcome.skipped);
        self.municipalities_created += outcome.municipalities_created;
        self.communities_created += outcome.communities_created;
    }

    pub fn total_processed(&self) -> u32 {
        self.lands_created + self.lands_updated + self.lands_skipped + self.records_failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_rerun_only_touches_existing_lands() {
        // Idempotence: a second run over the same payload never creates
        // or rewrites anything.
        assert_eq!(sync_action(true, false), SyncAction::TouchOnly);
        assert_eq!(sync_action(false, false), SyncAction::Create);
    }

    #[test]
    fn test_update_mode_overwrites_existing_lands() {
        assert_eq!(sync_action(true, true), SyncAction::Overwrite);
        assert_eq!(sync_action(false, true), SyncAction::Create);
    }

    #[test]
    fn test_stats_absorb_outcomes() {
        let mut stats = ImportStats::default();
        stats.absorb(&RecordOutcome {
            created: true,
            municipalities_created: 1,
            communities_created: 2,
            ..Default::default()
        });
        stats.absorb(&RecordOutcome {
            skipped: true,
            ..Default::default()
        });
        stats.records_failed += 1;

        assert_eq!(stats.lands_created, 1);
        assert_eq!(stats.lands_skipped, 1);
        assert_eq!(stats.records_failed, 1);
        assert_eq!(stats.municipalities_created, 1);
        assert_eq!(stats.communities_created, 2);
        assert_eq!(stats.total_processed(), 3);
    }
}
