//! Inbound Ports (Driving Ports)
//!
//! The API the engine, monitoring views and administrators call.

use async_trait::async_trait;

use crate::domain::{SegmentStatus, TrackRow};
use crate::error::TrackingError;
use shared_types::Oid;

/// Change-tracking API of one segment (Driving Port)
#[async_trait]
pub trait ChangeTrackingApi: Send + Sync {
    /// Start tracking a database. Idempotent.
    ///
    /// # Errors
    /// - `InvalidDatabase` for the sentinel id
    /// - `DatabaseNotFound` if the catalog does not know the database
    /// - `CapacityExceeded` if every filter slot is taken
    async fn register_database(&self, dbid: Oid) -> Result<(), TrackingError>;

    /// Stop tracking a database and drop its filter. Idempotent.
    async fn unregister_database(&self, dbid: Oid) -> Result<(), TrackingError>;

    /// Make the next read report every tracked relation.
    ///
    /// # Errors
    /// - `FilterNotFound` if the database is not bound
    fn trigger_initial_snapshot(&self, dbid: Oid) -> Result<(), TrackingError>;

    /// Whether the database's filter is in full-snapshot mode.
    /// Unbound databases report `false`.
    fn is_initial_snapshot_triggered(&self, dbid: Oid) -> bool;

    /// Write path hook: a storage file was created or extended.
    /// Ignored for unbound databases.
    fn record_object_modified(&self, dbid: Oid, relfilenode: Oid);

    /// Write path hook: a storage file was deleted.
    /// Ignored for unbound databases.
    fn record_object_dropped(&self, dbid: Oid, relfilenode: Oid);

    /// Read and consume the change set in a single-statement transaction.
    ///
    /// On failure nothing is consumed.
    async fn read_modifications(&self, dbid: Oid) -> Result<Vec<TrackRow>, TrackingError>;

    /// Readiness of the tracking state on this segment.
    fn is_segment_initialized(&self) -> SegmentStatus;

    /// Override the snapshot-on-recovery default for one database.
    async fn set_snapshot_on_recovery(&self, dbid: Oid, on: bool) -> Result<(), TrackingError>;

    /// Add a schema to the database's tracked schemas.
    async fn register_schema(&self, dbid: Oid, name: &str) -> Result<(), TrackingError>;

    /// Remove a schema from the database's tracked schemas.
    async fn unregister_schema(&self, dbid: Oid, name: &str) -> Result<(), TrackingError>;

    /// Replace the database's tracked relkinds; an empty list restores the default.
    async fn set_rel_kinds(&self, dbid: Oid, list: &str) -> Result<(), TrackingError>;

    /// Replace the database's tracked relstorages; an empty list restores the default.
    async fn set_rel_storages(&self, dbid: Oid, list: &str) -> Result<(), TrackingError>;

    /// Lower the sticky inconsistency flag. Returns whether it was raised.
    fn reset_tracking_error(&self) -> bool;
}
