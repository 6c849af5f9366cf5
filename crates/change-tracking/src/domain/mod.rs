//! Domain Layer - Pure data structures
//!
//! This layer contains:
//! - Fixed-size bit filter and its hash
//! - Filter directory (per-database slots)
//! - Drop ring
//! - Configuration
//! - Per-database settings and relation filters
//! - Result rows
//!
//! RULES:
//! - No I/O operations (config file loading aside)
//! - No async code

pub mod bloom;
pub mod bloom_set;
pub mod config;
pub mod drops_track;
pub mod filters;
pub mod hash_functions;
pub mod rows;

pub use bloom::BloomFilter;
pub use bloom_set::BloomSet;
pub use config::{split_list, TrackingConfig, TrackingConfigBuilder};
pub use drops_track::{DropRecord, DropsTrack};
pub use filters::{
    add_or_remove_schema, normalize_rel_kinds, normalize_rel_storages, DatabaseTrackingSettings,
    TrackingFilters,
};
pub use hash_functions::relfilenode_hash;
pub use rows::{SegmentStatus, TrackRow, TrackState};
