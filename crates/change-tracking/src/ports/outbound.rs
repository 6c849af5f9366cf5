//! Outbound Ports (Driven Ports)
//!
//! What the tracking core needs from the surrounding engine: a view of the
//! relation catalog and a place to persist per-database settings.

use async_trait::async_trait;

use crate::domain::DatabaseTrackingSettings;
use crate::error::DataError;
use shared_types::{Oid, RelationEntry};

/// Read access to the relation catalog of one segment (Driven Port)
///
/// No tracking lock is held while these methods run.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Whether a database with this id exists
    async fn database_exists(&self, dbid: Oid) -> Result<bool, DataError>;

    /// Resolve a schema name inside a database
    async fn schema_oid(&self, dbid: Oid, name: &str) -> Result<Option<Oid>, DataError>;

    /// Every relation of a database
    async fn scan_relations(&self, dbid: Oid) -> Result<Vec<RelationEntry>, DataError>;

    /// On-disk size of a relation in bytes
    async fn relation_size(&self, dbid: Oid, relid: Oid) -> Result<u64, DataError>;
}

/// Persistent per-database tracking settings (Driven Port)
#[async_trait]
pub trait TrackingSettingsStore: Send + Sync {
    /// Settings of one database, `None` if never written
    async fn load(&self, dbid: Oid) -> Result<Option<DatabaseTrackingSettings>, DataError>;

    /// Insert or replace the settings of `settings.dbid`
    async fn save(&self, settings: &DatabaseTrackingSettings) -> Result<(), DataError>;

    /// Settings of every database with `is_tracked` set
    async fn list_tracked(&self) -> Result<Vec<DatabaseTrackingSettings>, DataError>;
}
