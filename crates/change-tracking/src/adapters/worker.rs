//! Registration worker
//!
//! Periodically sweeps the settings store. The first sweep that finds
//! tracked databases after boot binds each of them and starts its filter
//! either in full-snapshot mode or cleared (per snapshot-on-recovery), then
//! raises the initialized flag. Every sweep compares the number of tracked
//! databases with the number of bound filter slots and raises the sticky
//! tracking error on a mismatch.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::TrackingError;
use crate::ports::TrackingSettingsStore;
use crate::state::TrackingSharedState;

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub tracked: usize,
    pub bound: usize,
    /// This sweep performed the boot-time binding
    pub initialized_now: bool,
    pub consistent: bool,
}

/// Background sweeper of one segment.
pub struct RegistrationWorker<S: TrackingSettingsStore> {
    shared: Arc<TrackingSharedState>,
    settings: Arc<S>,
}

impl<S: TrackingSettingsStore + 'static> RegistrationWorker<S> {
    pub fn new(shared: Arc<TrackingSharedState>, settings: Arc<S>) -> Self {
        Self { shared, settings }
    }

    /// One synchronous sweep.
    pub async fn status_check(&self) -> Result<SweepReport, TrackingError> {
        let tracked = self.settings.list_tracked().await?;
        let bloom_set = self.shared.bloom_set();
        let config = self.shared.config();
        let segment = self.shared.segment_index();

        let mut initialized_now = false;
        if !self.shared.is_initialized() && !tracked.is_empty() {
            for db in &tracked {
                if !bloom_set.bind(db.dbid) {
                    warn!(dbid = db.dbid, segment, "no free filter slot for tracked database");
                    continue;
                }
                bloom_set.trigger_full_snapshot(db.dbid, db.snapshot_on_recovery_or(config));
            }
            self.shared.mark_initialized();
            initialized_now = true;
            info!(segment, databases = tracked.len(), "tracking initialized");
        }

        let bound = bloom_set.count_bound();
        let consistent = tracked.len() == bound;
        if !consistent {
            warn!(
                segment,
                tracked = tracked.len(),
                bound,
                "tracked databases and bound filters disagree"
            );
            self.shared.raise_tracking_error();
        }

        Ok(SweepReport {
            tracked: tracked.len(),
            bound,
            initialized_now,
            consistent,
        })
    }

    /// Sweep every naptime until `shutdown` flips.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let naptime = Duration::from_secs(self.shared.config().worker_naptime_secs);
        let segment = self.shared.segment_index();
        info!(segment, naptime_secs = naptime.as_secs(), "registration worker started");

        loop {
            if let Err(e) = self.status_check().await {
                warn!(segment, error = %e, "registration sweep failed");
            }

            tokio::select! {
                _ = tokio::time::sleep(naptime) => {}
                _ = shutdown.changed() => {
                    info!(segment, "registration worker shutdown signal received");
                    break;
                }
            }
        }
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
