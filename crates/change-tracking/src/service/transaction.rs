//! Per-transaction read protocol
//!
//! A [`ReadTransaction`] moves a database's filter out of the directory,
//! drains its drop records and enumerates the catalog against the private
//! copy. Commit consumes what was taken. Abort (explicit, or by dropping an
//! unfinished transaction) ORs the filter back and re-inserts the drops, so
//! an aborted read is invisible to the next reader.
//!
//! Phases: `Idle -> Captured -> {Committed | Aborted}`.

use std::sync::Arc;

use tracing::debug;

use crate::domain::{
    BloomFilter, DatabaseTrackingSettings, TrackRow, TrackState, TrackingFilters,
};
use crate::error::TrackingError;
use crate::ports::CatalogProvider;
use crate::state::TrackingSharedState;
use shared_types::{Oid, INVALID_OID};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnPhase {
    Idle,
    Captured,
    Committed,
    Aborted,
}

#[derive(Debug)]
struct CaptureState {
    /// Bits taken by the latest read
    bloom: BloomFilter,
    /// Bits taken by every earlier read of this transaction
    rollback_bloom: Option<BloomFilter>,
    /// Drops drained by every read of this transaction, oldest first
    drops: Vec<Oid>,
    /// First drop not yet emitted
    next_drop: usize,
    filters: TrackingFilters,
}

/// One read transaction against one database.
pub struct ReadTransaction<C: CatalogProvider> {
    shared: Arc<TrackingSharedState>,
    catalog: Arc<C>,
    settings: DatabaseTrackingSettings,
    dbid: Oid,
    capture: Option<CaptureState>,
    phase: TxnPhase,
    rows_emitted: usize,
}

impl<C: CatalogProvider> ReadTransaction<C> {
    pub(crate) fn new(
        shared: Arc<TrackingSharedState>,
        catalog: Arc<C>,
        settings: DatabaseTrackingSettings,
    ) -> Self {
        Self {
            dbid: settings.dbid,
            shared,
            catalog,
            settings,
            capture: None,
            phase: TxnPhase::Idle,
            rows_emitted: 0,
        }
    }

    pub fn dbid(&self) -> Oid {
        self.dbid
    }

    pub fn phase(&self) -> TxnPhase {
        self.phase
    }

    async fn resolve_filters(&self) -> Result<TrackingFilters, TrackingError> {
        let config = self.shared.config();

        let mut schemas = Vec::new();
        for name in self.settings.schema_names(config) {
            match self.catalog.schema_oid(self.dbid, &name).await? {
                Some(oid) => schemas.push(oid),
                None => debug!(dbid = self.dbid, schema = %name, "tracked schema not found, skipped"),
            }
        }

        let filters = TrackingFilters {
            schemas,
            rel_kinds: self.settings.rel_kinds(config),
            rel_storages: self.settings.rel_storages(config),
        };
        if filters.is_incomplete() {
            return Err(TrackingError::MissingConfiguration { dbid: self.dbid });
        }
        Ok(filters)
    }

    fn take_filter(&mut self) -> Result<(), TrackingError> {
        let bloom_set = self.shared.bloom_set();
        let capture = self
            .capture
            .as_mut()
            .ok_or(TrackingError::FilterNotFound { dbid: self.dbid })?;

        if self.phase == TxnPhase::Captured {
            // Re-entrant read: keep every earlier take for the abort path
            let rollback = capture
                .rollback_bloom
                .get_or_insert_with(|| BloomFilter::new(bloom_set.bloom_size()));
            rollback.merge(&capture.bloom);
            capture.bloom.clear();
        }

        if !bloom_set.take(self.dbid, &mut capture.bloom) {
            return Err(TrackingError::NotTracked { dbid: self.dbid });
        }
        self.shared.metrics().record_take();
        self.phase = TxnPhase::Captured;
        Ok(())
    }

    /// Read the change set accumulated since the previous read.
    ///
    /// Calling this again in the same transaction returns the delta since
    /// the earlier call. On error the transaction should be aborted.
    pub async fn read_modifications(&mut self) -> Result<Vec<TrackRow>, TrackingError> {
        if matches!(self.phase, TxnPhase::Committed | TxnPhase::Aborted) {
            return Err(TrackingError::TransactionFinished);
        }

        if self.shared.has_tracking_error() {
            return Err(TrackingError::TrackingInconsistent { dbid: self.dbid });
        }
        if !self.shared.is_initialized() {
            debug!(dbid = self.dbid, "tracking not initialized yet, empty result");
            return Ok(Vec::new());
        }

        if self.capture.is_none() {
            let filters = self.resolve_filters().await?;
            self.capture = Some(CaptureState {
                bloom: BloomFilter::new(self.shared.bloom_set().bloom_size()),
                rollback_bloom: None,
                drops: Vec::new(),
                next_drop: 0,
                filters,
            });
        }
        self.take_filter()?;

        let segment_index = self.shared.segment_index();
        let dbid = self.dbid;
        let drops = self.shared.drops();
        let Some(capture) = self.capture.as_mut() else {
            return Err(TrackingError::FilterNotFound { dbid });
        };

        // A full snapshot reports no drops
        if !capture.bloom.is_set_all() {
            capture.drops.extend(drops.drain(dbid));
        }

        let state = if capture.bloom.is_set_all() {
            TrackState::Initial
        } else {
            TrackState::Added
        };

        // No tracking lock is held from here on
        let relations = self.catalog.scan_relations(dbid).await?;
        let mut rows = Vec::new();
        for rel in &relations {
            let Some(relfilenode) = rel.relfilenode.filter(|r| *r != INVALID_OID) else {
                continue;
            };
            if !capture.filters.matches(rel) || !capture.bloom.contains_relfilenode(relfilenode) {
                continue;
            }
            let size = self.catalog.relation_size(dbid, rel.oid).await?;
            rows.push(TrackRow::from_relation(
                rel,
                relfilenode,
                size,
                state,
                segment_index,
            ));
        }

        for relfilenode in &capture.drops[capture.next_drop..] {
            rows.push(TrackRow::deleted(*relfilenode, segment_index));
        }
        capture.next_drop = capture.drops.len();

        debug!(
            dbid,
            segment = segment_index,
            rows = rows.len(),
            full = state == TrackState::Initial,
            "change set read"
        );
        self.rows_emitted += rows.len();
        Ok(rows)
    }

    /// Consume everything taken by this transaction.
    pub fn commit(mut self) -> Result<(), TrackingError> {
        if matches!(self.phase, TxnPhase::Committed | TxnPhase::Aborted) {
            return Err(TrackingError::TransactionFinished);
        }
        self.capture = None;
        self.phase = TxnPhase::Committed;
        self.shared.metrics().record_commit(self.rows_emitted);
        debug!(dbid = self.dbid, rows = self.rows_emitted, "read transaction committed");
        Ok(())
    }

    /// Give back everything taken by this transaction.
    pub fn abort(mut self) {
        self.rollback();
    }

    pub(crate) fn rollback(&mut self) {
        if matches!(self.phase, TxnPhase::Committed | TxnPhase::Aborted) {
            return;
        }
        self.phase = TxnPhase::Aborted;
        self.shared.metrics().record_abort();

        let Some(capture) = self.capture.take() else {
            return;
        };
        let bloom_set = self.shared.bloom_set();

        let mut restore = capture.bloom;
        if let Some(rollback) = &capture.rollback_bloom {
            restore.merge(rollback);
        }
        if bloom_set.merge_back(self.dbid, &restore) {
            self.shared.metrics().record_merge_back();
        } else {
            debug!(dbid = self.dbid, "database unbound before abort, filter dropped");
        }

        if !capture.drops.is_empty() {
            let restored = self.shared.drops().undo(&capture.drops, self.dbid);
            self.shared
                .metrics()
                .record_undo(capture.drops.len(), restored);
        }
        debug!(dbid = self.dbid, "read transaction aborted, state restored");
    }
}

impl<C: CatalogProvider> Drop for ReadTransaction<C> {
    fn drop(&mut self) {
        if matches!(self.phase, TxnPhase::Idle | TxnPhase::Captured) {
            debug!(dbid = self.dbid, "read transaction dropped unfinished, aborting");
            self.rollback();
        }
    }
}
