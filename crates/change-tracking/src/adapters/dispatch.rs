//! Cluster coordinator
//!
//! Fans tracking operations out to every segment of a cluster. Segment 0 of
//! the list is the coordinator itself. A coordinated read opens one read
//! transaction per segment and either commits all of them or aborts all of
//! them, so a failure anywhere leaves every segment's filters and drop
//! records as they were.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{SegmentStatus, TrackRow};
use crate::error::TrackingError;
use crate::ports::{CatalogProvider, ChangeTrackingApi, TrackingSettingsStore};
use crate::service::ChangeTrackingService;
use shared_types::Oid;

pub struct ClusterCoordinator<C: CatalogProvider, S: TrackingSettingsStore> {
    segments: Vec<Arc<ChangeTrackingService<C, S>>>,
}

impl<C, S> ClusterCoordinator<C, S>
where
    C: CatalogProvider + 'static,
    S: TrackingSettingsStore + 'static,
{
    pub fn new(segments: Vec<Arc<ChangeTrackingService<C, S>>>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Arc<ChangeTrackingService<C, S>>] {
        &self.segments
    }

    /// Register on every segment, stopping at the first failure.
    pub async fn register_database(&self, dbid: Oid) -> Result<(), TrackingError> {
        for segment in &self.segments {
            segment.register_database(dbid).await?;
        }
        info!(dbid, segments = self.segments.len(), "database registered cluster-wide");
        Ok(())
    }

    pub async fn unregister_database(&self, dbid: Oid) -> Result<(), TrackingError> {
        for segment in &self.segments {
            segment.unregister_database(dbid).await?;
        }
        Ok(())
    }

    pub fn trigger_initial_snapshot(&self, dbid: Oid) -> Result<(), TrackingError> {
        for segment in &self.segments {
            segment.trigger_initial_snapshot(dbid)?;
        }
        Ok(())
    }

    pub async fn set_snapshot_on_recovery(&self, dbid: Oid, on: bool) -> Result<(), TrackingError> {
        for segment in &self.segments {
            segment.set_snapshot_on_recovery(dbid, on).await?;
        }
        Ok(())
    }

    pub async fn register_schema(&self, dbid: Oid, name: &str) -> Result<(), TrackingError> {
        for segment in &self.segments {
            segment.register_schema(dbid, name).await?;
        }
        Ok(())
    }

    pub async fn unregister_schema(&self, dbid: Oid, name: &str) -> Result<(), TrackingError> {
        for segment in &self.segments {
            segment.unregister_schema(dbid, name).await?;
        }
        Ok(())
    }

    pub async fn set_rel_kinds(&self, dbid: Oid, list: &str) -> Result<(), TrackingError> {
        for segment in &self.segments {
            segment.set_rel_kinds(dbid, list).await?;
        }
        Ok(())
    }

    pub async fn set_rel_storages(&self, dbid: Oid, list: &str) -> Result<(), TrackingError> {
        for segment in &self.segments {
            segment.set_rel_storages(dbid, list).await?;
        }
        Ok(())
    }

    /// Read the change set of every segment in one all-or-nothing step.
    pub async fn read_modifications(&self, dbid: Oid) -> Result<Vec<TrackRow>, TrackingError> {
        let mut txns = Vec::with_capacity(self.segments.len());
        let mut rows = Vec::new();
        let mut failure = None;

        for segment in &self.segments {
            let mut txn = match segment.begin_read(dbid).await {
                Ok(txn) => txn,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            };
            let result = txn.read_modifications().await;
            txns.push(txn);
            match result {
                Ok(segment_rows) => rows.extend(segment_rows),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        if let Some(e) = failure {
            warn!(dbid, error = %e, "coordinated read failed, aborting on every segment");
            for txn in txns {
                txn.abort();
            }
            return Err(e);
        }

        for txn in txns {
            txn.commit()?;
        }
        Ok(rows)
    }

    /// Readiness of every segment, in segment order.
    pub fn segment_statuses(&self) -> Vec<SegmentStatus> {
        self.segments
            .iter()
            .map(|s| s.is_segment_initialized())
            .collect()
    }

    /// Lower the sticky error on every segment. Returns how many had it raised.
    pub fn reset_tracking_error(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| s.reset_tracking_error())
            .count()
    }
}
