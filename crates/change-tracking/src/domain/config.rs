//! Change-tracking configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use change_tracking::domain::TrackingConfigBuilder;
//!
//! let config = TrackingConfigBuilder::new()
//!     .bloom_size(4096)
//!     .db_track_count(16)
//!     .build()
//!     .expect("Valid config");
//! ```
//!
//! # Config File Format
//!
//! ```toml
//! [tracking]
//! bloom_size = 1000000
//! db_track_count = 5
//! drops_count = 100000
//! tracked_schemas = "public,pg_catalog,pg_toast,pg_aoseg,information_schema"
//! tracked_rel_storages = "h,a,c"
//! tracked_rel_kinds = "r,i,t,m,o,b,M"
//! snapshot_on_recovery = true
//! worker_naptime_secs = 60
//! segment_index = -1
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use shared_types::{SegmentIndex, COORDINATOR_SEGMENT};

pub const MIN_BLOOM_SIZE: usize = 1;
pub const MAX_BLOOM_SIZE: usize = 128_000_000;
pub const MIN_DB_TRACK_COUNT: usize = 1;
pub const MAX_DB_TRACK_COUNT: usize = 1000;
pub const MIN_DROPS_COUNT: usize = 1;
pub const MAX_DROPS_COUNT: usize = 1_000_000;
pub const MIN_NAPTIME_SECS: u64 = 1;
pub const MAX_NAPTIME_SECS: u64 = i32::MAX as u64;

pub const DEFAULT_TRACKED_SCHEMAS: &str = "public,pg_catalog,pg_toast,pg_aoseg,information_schema";
pub const DEFAULT_TRACKED_REL_STORAGES: &str = "h,a,c";
pub const DEFAULT_TRACKED_REL_KINDS: &str = "r,i,t,m,o,b,M";

/// Split a comma list, trimming whitespace and dropping empty tokens.
pub fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Process-wide tracking configuration, read once at boot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Bytes per database filter
    pub bloom_size: usize,
    /// Maximum number of tracked databases (directory slots)
    pub db_track_count: usize,
    /// Drop ring capacity
    pub drops_count: usize,
    /// Default schema allow-list
    pub tracked_schemas: String,
    /// Default storage-kind allow-list
    pub tracked_rel_storages: String,
    /// Default relation-kind allow-list
    pub tracked_rel_kinds: String,
    /// Start every tracked database with a full snapshot after boot
    pub snapshot_on_recovery: bool,
    /// Seconds between registration sweeps
    pub worker_naptime_secs: u64,
    /// Index of this segment, `-1` on the coordinator
    pub segment_index: SegmentIndex,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            bloom_size: 1_000_000,
            db_track_count: 5,
            drops_count: 100_000,
            tracked_schemas: DEFAULT_TRACKED_SCHEMAS.to_string(),
            tracked_rel_storages: DEFAULT_TRACKED_REL_STORAGES.to_string(),
            tracked_rel_kinds: DEFAULT_TRACKED_REL_KINDS.to_string(),
            snapshot_on_recovery: true,
            worker_naptime_secs: 60,
            segment_index: COORDINATOR_SEGMENT,
        }
    }
}

fn check_range(field: &'static str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    tracking: TrackingConfig,
}

impl TrackingConfig {
    /// Validate every numeric setting against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range(
            "bloom_size",
            self.bloom_size as u64,
            MIN_BLOOM_SIZE as u64,
            MAX_BLOOM_SIZE as u64,
        )?;
        check_range(
            "db_track_count",
            self.db_track_count as u64,
            MIN_DB_TRACK_COUNT as u64,
            MAX_DB_TRACK_COUNT as u64,
        )?;
        check_range(
            "drops_count",
            self.drops_count as u64,
            MIN_DROPS_COUNT as u64,
            MAX_DROPS_COUNT as u64,
        )?;
        check_range(
            "worker_naptime_secs",
            self.worker_naptime_secs,
            MIN_NAPTIME_SECS,
            MAX_NAPTIME_SECS,
        )?;
        Ok(())
    }

    /// Parse and validate a `[tracking]` TOML document. Missing keys take
    /// their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        file.tracking.validate()?;
        Ok(file.tracking)
    }

    /// Load and validate a TOML config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_toml_str(&content)
    }

    /// Default schema names.
    pub fn schema_list(&self) -> Vec<String> {
        split_list(&self.tracked_schemas)
    }

    /// Default relation-kind codes.
    pub fn rel_kind_list(&self) -> Vec<String> {
        split_list(&self.tracked_rel_kinds)
    }

    /// Default storage-kind codes.
    pub fn rel_storage_list(&self) -> Vec<String> {
        split_list(&self.tracked_rel_storages)
    }
}

/// Builder for TrackingConfig with validation
#[derive(Default)]
pub struct TrackingConfigBuilder {
    bloom_size: Option<usize>,
    db_track_count: Option<usize>,
    drops_count: Option<usize>,
    tracked_schemas: Option<String>,
    tracked_rel_storages: Option<String>,
    tracked_rel_kinds: Option<String>,
    snapshot_on_recovery: Option<bool>,
    worker_naptime_secs: Option<u64>,
    segment_index: Option<SegmentIndex>,
}

impl TrackingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes per database filter (1..=128 000 000)
    pub fn bloom_size(mut self, bytes: usize) -> Self {
        self.bloom_size = Some(bytes);
        self
    }

    /// Directory slots (1..=1000)
    pub fn db_track_count(mut self, count: usize) -> Self {
        self.db_track_count = Some(count);
        self
    }

    /// Drop ring capacity (1..=1 000 000)
    pub fn drops_count(mut self, count: usize) -> Self {
        self.drops_count = Some(count);
        self
    }

    pub fn tracked_schemas(mut self, list: impl Into<String>) -> Self {
        self.tracked_schemas = Some(list.into());
        self
    }

    pub fn tracked_rel_storages(mut self, list: impl Into<String>) -> Self {
        self.tracked_rel_storages = Some(list.into());
        self
    }

    pub fn tracked_rel_kinds(mut self, list: impl Into<String>) -> Self {
        self.tracked_rel_kinds = Some(list.into());
        self
    }

    pub fn snapshot_on_recovery(mut self, on: bool) -> Self {
        self.snapshot_on_recovery = Some(on);
        self
    }

    pub fn worker_naptime_secs(mut self, secs: u64) -> Self {
        self.worker_naptime_secs = Some(secs);
        self
    }

    pub fn segment_index(mut self, index: SegmentIndex) -> Self {
        self.segment_index = Some(index);
        self
    }

    /// Build the TrackingConfig, validating all parameters
    pub fn build(self) -> Result<TrackingConfig, ConfigError> {
        let config = self.build_unchecked();
        config.validate()?;
        Ok(config)
    }

    /// Build without validation (for tests and internal use)
    pub fn build_unchecked(self) -> TrackingConfig {
        let defaults = TrackingConfig::default();

        TrackingConfig {
            bloom_size: self.bloom_size.unwrap_or(defaults.bloom_size),
            db_track_count: self.db_track_count.unwrap_or(defaults.db_track_count),
            drops_count: self.drops_count.unwrap_or(defaults.drops_count),
            tracked_schemas: self.tracked_schemas.unwrap_or(defaults.tracked_schemas),
            tracked_rel_storages: self
                .tracked_rel_storages
                .unwrap_or(defaults.tracked_rel_storages),
            tracked_rel_kinds: self.tracked_rel_kinds.unwrap_or(defaults.tracked_rel_kinds),
            snapshot_on_recovery: self
                .snapshot_on_recovery
                .unwrap_or(defaults.snapshot_on_recovery),
            worker_naptime_secs: self
                .worker_naptime_secs
                .unwrap_or(defaults.worker_naptime_secs),
            segment_index: self.segment_index.unwrap_or(defaults.segment_index),
        }
    }
}
