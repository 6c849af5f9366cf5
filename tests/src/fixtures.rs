//! Builders shared by the integration tests and benchmarks.

use std::sync::Arc;

use change_tracking::adapters::catalog::PG_PUBLIC_NAMESPACE;
use change_tracking::{
    ChangeTrackingService, ClusterCoordinator, InMemoryCatalog, InMemorySettingsStore,
    TrackingConfig, TrackingConfigBuilder, TrackingSharedState,
};
use shared_types::{Oid, RelationEntry, SegmentIndex};

pub type Segment = ChangeTrackingService<InMemoryCatalog, InMemorySettingsStore>;

/// Tracked database used throughout the suite.
pub const DB: Oid = 7;
/// A second database.
pub const OTHER_DB: Oid = 9;

/// First relation id; relation `i` has relfilenode `FIRST_RELFILENODE + i`.
pub const FIRST_RELID: Oid = 16_384;
pub const FIRST_RELFILENODE: Oid = 40_000;

pub fn small_config(segment_index: SegmentIndex) -> TrackingConfig {
    TrackingConfigBuilder::new()
        .bloom_size(4096)
        .db_track_count(4)
        .drops_count(64)
        .segment_index(segment_index)
        .build()
        .expect("valid test config")
}

/// Catalog with `DB` and `OTHER_DB`, each holding `tables` heap tables.
pub fn catalog_with_tables(tables: u32) -> Arc<InMemoryCatalog> {
    let catalog = Arc::new(InMemoryCatalog::new());
    for dbid in [DB, OTHER_DB] {
        catalog.add_database(dbid);
        for i in 0..tables {
            catalog.add_relation(
                dbid,
                RelationEntry::heap_table(
                    FIRST_RELID + i,
                    format!("t{i}"),
                    FIRST_RELFILENODE + i,
                    PG_PUBLIC_NAMESPACE,
                ),
            );
            catalog.set_relation_size(dbid, FIRST_RELID + i, 8192 * u64::from(i + 1));
        }
    }
    catalog
}

/// One initialized segment over its own shared state.
pub fn segment(config: TrackingConfig, tables: u32, store: Arc<InMemorySettingsStore>) -> Segment {
    let shared = Arc::new(TrackingSharedState::new(config));
    shared.mark_initialized();
    ChangeTrackingService::new(shared, catalog_with_tables(tables), store)
}

/// Coordinator plus `segments` storage segments sharing one settings store.
pub fn cluster(segments: i32, tables: u32) -> ClusterCoordinator<InMemoryCatalog, InMemorySettingsStore> {
    let store = Arc::new(InMemorySettingsStore::new());
    let services = (-1..segments)
        .map(|index| Arc::new(segment(small_config(index), tables, Arc::clone(&store))))
        .collect();
    ClusterCoordinator::new(services)
}
