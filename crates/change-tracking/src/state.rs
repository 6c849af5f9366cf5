//! Process-wide tracking state
//!
//! [`TrackingSharedState`] holds the filter directory, the drop ring and the
//! two process-wide flags. It is sized once from [`TrackingConfig`] and never
//! resized. Workers share it through an `Arc`.
//!
//! [`SharedRegion`] is the init-once handle: the first worker to attach
//! allocates and initializes the state under the region's init lock, later
//! workers find it ready and reuse it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::domain::{BloomSet, DropsTrack, TrackingConfig};
use crate::error::ConfigError;
use crate::metrics::TrackingMetrics;
use shared_types::SegmentIndex;

/// The shared directory, drop ring and flags of one segment.
#[derive(Debug)]
pub struct TrackingSharedState {
    config: TrackingConfig,
    bloom_set: BloomSet,
    drops: DropsTrack,
    /// Raised once the first registration sweep has bound every tracked db
    is_initialized: AtomicBool,
    /// Sticky inconsistency flag; reads are refused while raised
    tracking_error: AtomicBool,
    metrics: TrackingMetrics,
}

impl TrackingSharedState {
    /// Allocate a fresh state. The config is trusted; use
    /// [`SharedRegion::attach`] to get validation.
    pub fn new(config: TrackingConfig) -> Self {
        let bloom_set = BloomSet::new(config.db_track_count, config.bloom_size);
        let drops = DropsTrack::new(config.drops_count);
        Self {
            config,
            bloom_set,
            drops,
            is_initialized: AtomicBool::new(false),
            tracking_error: AtomicBool::new(false),
            metrics: TrackingMetrics::new(),
        }
    }

    /// Bytes taken by the directory and the drop ring for `config`.
    pub fn required_size(config: &TrackingConfig) -> usize {
        std::mem::size_of::<Self>()
            + BloomSet::required_size(config.db_track_count, config.bloom_size)
            + DropsTrack::required_size(config.drops_count)
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    pub fn bloom_set(&self) -> &BloomSet {
        &self.bloom_set
    }

    pub fn drops(&self) -> &DropsTrack {
        &self.drops
    }

    pub fn metrics(&self) -> &TrackingMetrics {
        &self.metrics
    }

    pub fn segment_index(&self) -> SegmentIndex {
        self.config.segment_index
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized.load(Ordering::Acquire)
    }

    pub fn mark_initialized(&self) {
        self.is_initialized.store(true, Ordering::Release);
    }

    pub fn has_tracking_error(&self) -> bool {
        self.tracking_error.load(Ordering::Acquire)
    }

    /// Raise the sticky error flag. Returns true if it was already raised.
    pub fn raise_tracking_error(&self) -> bool {
        let was = self.tracking_error.swap(true, Ordering::AcqRel);
        if !was {
            warn!(
                segment = self.config.segment_index,
                "tracking error raised, reads are refused until reset"
            );
        }
        was
    }

    /// Lower the sticky error flag. Returns true if it was raised.
    pub fn reset_tracking_error(&self) -> bool {
        let was = self.tracking_error.swap(false, Ordering::AcqRel);
        if was {
            info!(segment = self.config.segment_index, "tracking error reset");
        }
        was
    }
}

/// Lifecycle of a [`SharedRegion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionState {
    Uninitialized,
    Allocated,
    Ready,
}

#[derive(Debug)]
struct RegionInner {
    state: RegionState,
    shared: Option<Arc<TrackingSharedState>>,
}

/// Named, init-once home of a [`TrackingSharedState`].
#[derive(Debug)]
pub struct SharedRegion {
    name: String,
    inner: Mutex<RegionInner>,
}

impl SharedRegion {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: Mutex::new(RegionInner {
                state: RegionState::Uninitialized,
                shared: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> RegionState {
        self.inner.lock().state
    }

    /// Attach to the region, allocating it on first use.
    ///
    /// Only the first caller's config is used; later callers get the
    /// existing state whatever config they pass.
    pub fn attach(&self, config: &TrackingConfig) -> Result<Arc<TrackingSharedState>, ConfigError> {
        let mut inner = self.inner.lock();

        if let Some(shared) = &inner.shared {
            debug!(region = %self.name, "attached to existing tracking region");
            return Ok(Arc::clone(shared));
        }

        config.validate()?;
        inner.state = RegionState::Allocated;
        let shared = Arc::new(TrackingSharedState::new(config.clone()));
        info!(
            region = %self.name,
            segment = config.segment_index,
            bytes = TrackingSharedState::required_size(config),
            slots = config.db_track_count,
            drops = config.drops_count,
            "tracking region allocated"
        );

        inner.shared = Some(Arc::clone(&shared));
        inner.state = RegionState::Ready;
        Ok(shared)
    }

    /// The state if the region is ready.
    pub fn get(&self) -> Option<Arc<TrackingSharedState>> {
        self.inner.lock().shared.clone()
    }
}
