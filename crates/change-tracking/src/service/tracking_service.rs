//! Change Tracking Service
//!
//! Orchestrates the shared directory and drop ring with the catalog and
//! settings ports. One service per segment.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::transaction::ReadTransaction;
use crate::domain::{
    add_or_remove_schema, normalize_rel_kinds, normalize_rel_storages, DatabaseTrackingSettings,
    SegmentStatus, TrackRow,
};
use crate::error::TrackingError;
use crate::ports::{CatalogProvider, ChangeTrackingApi, TrackingSettingsStore};
use crate::state::{SharedRegion, TrackingSharedState};
use shared_types::{oid_is_valid, Oid};

/// Change tracking service implementation
///
/// Implements the `ChangeTrackingApi` port using injected dependencies.
pub struct ChangeTrackingService<C: CatalogProvider, S: TrackingSettingsStore> {
    shared: Arc<TrackingSharedState>,
    catalog: Arc<C>,
    settings: Arc<S>,
}

impl<C: CatalogProvider, S: TrackingSettingsStore> ChangeTrackingService<C, S> {
    pub fn new(shared: Arc<TrackingSharedState>, catalog: Arc<C>, settings: Arc<S>) -> Self {
        Self {
            shared,
            catalog,
            settings,
        }
    }

    /// Build a service over an already attached region.
    pub fn from_region(
        region: &SharedRegion,
        catalog: Arc<C>,
        settings: Arc<S>,
    ) -> Result<Self, TrackingError> {
        let shared = region.get().ok_or(TrackingError::SharedStateUnavailable)?;
        Ok(Self::new(shared, catalog, settings))
    }

    pub fn shared(&self) -> &Arc<TrackingSharedState> {
        &self.shared
    }

    pub fn catalog(&self) -> &Arc<C> {
        &self.catalog
    }

    pub fn settings_store(&self) -> &Arc<S> {
        &self.settings
    }

    fn check_dbid(dbid: Oid) -> Result<(), TrackingError> {
        if !oid_is_valid(dbid) {
            return Err(TrackingError::InvalidDatabase);
        }
        Ok(())
    }

    async fn existing_database(&self, dbid: Oid) -> Result<(), TrackingError> {
        Self::check_dbid(dbid)?;
        if !self.catalog.database_exists(dbid).await? {
            return Err(TrackingError::DatabaseNotFound { dbid });
        }
        Ok(())
    }

    async fn load_settings(&self, dbid: Oid) -> Result<DatabaseTrackingSettings, TrackingError> {
        Ok(self
            .settings
            .load(dbid)
            .await?
            .unwrap_or_else(|| DatabaseTrackingSettings::new(dbid)))
    }

    async fn update_settings(
        &self,
        dbid: Oid,
        update: impl FnOnce(&mut DatabaseTrackingSettings),
    ) -> Result<(), TrackingError> {
        let mut settings = self.load_settings(dbid).await?;
        update(&mut settings);
        self.settings.save(&settings).await?;
        Ok(())
    }

    /// Open a read transaction for `dbid`.
    ///
    /// Nothing is taken until the first `read_modifications` call.
    pub async fn begin_read(&self, dbid: Oid) -> Result<ReadTransaction<C>, TrackingError> {
        Self::check_dbid(dbid)?;
        let settings = self.load_settings(dbid).await?;
        Ok(ReadTransaction::new(
            Arc::clone(&self.shared),
            Arc::clone(&self.catalog),
            settings,
        ))
    }

    async fn schema_change(&self, dbid: Oid, name: &str, add: bool) -> Result<(), TrackingError> {
        self.existing_database(dbid).await?;
        if self.catalog.schema_oid(dbid, name).await?.is_none() {
            return Err(TrackingError::SchemaNotFound {
                name: name.to_string(),
            });
        }
        self.update_settings(dbid, |s| {
            s.schemas = add_or_remove_schema(s.schemas.as_deref(), name, add);
        })
        .await?;
        info!(dbid, schema = name, add, "tracked schemas changed");
        Ok(())
    }
}

#[async_trait]
impl<C, S> ChangeTrackingApi for ChangeTrackingService<C, S>
where
    C: CatalogProvider + 'static,
    S: TrackingSettingsStore + 'static,
{
    async fn register_database(&self, dbid: Oid) -> Result<(), TrackingError> {
        self.existing_database(dbid).await?;

        let bloom_set = self.shared.bloom_set();
        let newly_bound = !bloom_set.is_bound(dbid);
        if !bloom_set.bind(dbid) {
            return Err(TrackingError::CapacityExceeded {
                max: bloom_set.capacity(),
            });
        }
        if let Err(e) = self.update_settings(dbid, |s| s.is_tracked = true).await {
            // A slot without a persisted registration trips the consistency check
            if newly_bound {
                bloom_set.unbind(dbid);
            }
            warn!(dbid, error = %e, "registration not persisted, slot released");
            return Err(e);
        }
        info!(dbid, segment = self.shared.segment_index(), "database registered");
        Ok(())
    }

    async fn unregister_database(&self, dbid: Oid) -> Result<(), TrackingError> {
        self.existing_database(dbid).await?;

        self.update_settings(dbid, |s| s.is_tracked = false).await?;
        self.shared.bloom_set().unbind(dbid);
        info!(dbid, segment = self.shared.segment_index(), "database unregistered");
        Ok(())
    }

    fn trigger_initial_snapshot(&self, dbid: Oid) -> Result<(), TrackingError> {
        if !self.shared.bloom_set().trigger_full_snapshot(dbid, true) {
            return Err(TrackingError::FilterNotFound { dbid });
        }
        info!(dbid, segment = self.shared.segment_index(), "initial snapshot triggered");
        Ok(())
    }

    fn is_initial_snapshot_triggered(&self, dbid: Oid) -> bool {
        self.shared.bloom_set().is_saturated(dbid).unwrap_or(false)
    }

    fn record_object_modified(&self, dbid: Oid, relfilenode: Oid) {
        if self.shared.bloom_set().set_bit(dbid, relfilenode) {
            self.shared.metrics().record_bit_set();
        }
    }

    fn record_object_dropped(&self, dbid: Oid, relfilenode: Oid) {
        if !self.shared.bloom_set().is_bound(dbid) {
            debug!(dbid, relfilenode, "drop for untracked database ignored");
            return;
        }
        let evicted = self.shared.drops().add(relfilenode, dbid);
        self.shared.metrics().record_drop(evicted.is_some());
    }

    async fn read_modifications(&self, dbid: Oid) -> Result<Vec<TrackRow>, TrackingError> {
        let mut txn = self.begin_read(dbid).await?;
        match txn.read_modifications().await {
            Ok(rows) => {
                txn.commit()?;
                Ok(rows)
            }
            Err(e) => {
                warn!(dbid, error = %e, "read failed, restoring taken state");
                txn.abort();
                Err(e)
            }
        }
    }

    fn is_segment_initialized(&self) -> SegmentStatus {
        SegmentStatus {
            segment_index: self.shared.segment_index(),
            is_initialized: self.shared.is_initialized(),
        }
    }

    async fn set_snapshot_on_recovery(&self, dbid: Oid, on: bool) -> Result<(), TrackingError> {
        self.existing_database(dbid).await?;
        self.update_settings(dbid, |s| s.snapshot_on_recovery = Some(on))
            .await
    }

    async fn register_schema(&self, dbid: Oid, name: &str) -> Result<(), TrackingError> {
        self.schema_change(dbid, name, true).await
    }

    async fn unregister_schema(&self, dbid: Oid, name: &str) -> Result<(), TrackingError> {
        self.schema_change(dbid, name, false).await
    }

    async fn set_rel_kinds(&self, dbid: Oid, list: &str) -> Result<(), TrackingError> {
        self.existing_database(dbid).await?;
        let kinds = normalize_rel_kinds(list)?;
        self.update_settings(dbid, |s| s.rel_kinds = kinds).await
    }

    async fn set_rel_storages(&self, dbid: Oid, list: &str) -> Result<(), TrackingError> {
        self.existing_database(dbid).await?;
        let storages = normalize_rel_storages(list)?;
        self.update_settings(dbid, |s| s.rel_storages = storages)
            .await
    }

    fn reset_tracking_error(&self) -> bool {
        self.shared.reset_tracking_error()
    }
}
