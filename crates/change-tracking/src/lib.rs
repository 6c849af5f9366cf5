//! # Change Tracking
//!
//! Records, per database, which storage files were modified or dropped since
//! a monitoring tool last read the change set, without scanning storage.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure data structures, no I/O
//!   - `BloomFilter`: fixed-size bit filter with an all-set mode
//!   - `BloomSet`: fixed directory of per-database filters
//!   - `DropsTrack`: bounded ring of dropped storage files
//!   - `TrackingConfig` / `TrackingConfigBuilder`: validated configuration
//!
//! - **State** (`state.rs`): `TrackingSharedState` and its init-once
//!   `SharedRegion`
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `ChangeTrackingApi`: Driving port (inbound API)
//!   - `CatalogProvider`, `TrackingSettingsStore`: Driven ports
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `ChangeTrackingService`: Implements `ChangeTrackingApi`
//!   - `ReadTransaction`: take / merge-back / rollback read protocol
//!
//! - **Adapters Layer** (`adapters/`): in-memory catalog, settings stores,
//!   registration worker, cluster coordinator
//!
//! ## Guarantees
//!
//! - No false negatives: a modified file is reported by the next committed
//!   read (false positives are accepted).
//! - An aborted read is invisible: its taken bits and drained drops return.
//! - Capacity is fixed at boot; binding beyond it is an error, never an
//!   eviction.
//!
//! ## Usage Example
//!
//! ```ignore
//! use change_tracking::{ChangeTrackingApi, ChangeTrackingService, SharedRegion};
//!
//! let region = SharedRegion::new("tracking");
//! region.attach(&config)?;
//! let service = ChangeTrackingService::from_region(&region, catalog, settings)?;
//!
//! service.register_database(dbid).await?;
//! service.record_object_modified(dbid, relfilenode);
//! let rows = service.read_modifications(dbid).await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod state;

// Re-exports for convenience
pub use adapters::{
    ClusterCoordinator, InMemoryCatalog, InMemorySettingsStore, JsonFileSettingsStore,
    RegistrationWorker, SweepReport,
};
pub use domain::{
    BloomFilter, BloomSet, DatabaseTrackingSettings, DropRecord, DropsTrack, SegmentStatus,
    TrackRow, TrackState, TrackingConfig, TrackingConfigBuilder,
};
pub use error::{ConfigError, DataError, TrackingError};
pub use metrics::{MetricsSnapshot, TrackingMetrics};
pub use ports::{CatalogProvider, ChangeTrackingApi, TrackingSettingsStore};
pub use service::{ChangeTrackingService, ReadTransaction, TxnPhase};
pub use state::{RegionState, SharedRegion, TrackingSharedState};
