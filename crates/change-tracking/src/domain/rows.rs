//! Rows produced by a read of the change set

use serde::{Deserialize, Serialize};

use shared_types::{Oid, RelKind, RelStorage, RelationEntry, SegmentIndex};

/// Why a relation appears in the change set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackState {
    /// Modified since the last read (`a`)
    Added,
    /// Reported by a full snapshot (`i`)
    Initial,
    /// Storage file was dropped (`d`)
    Deleted,
}

impl TrackState {
    pub fn code(self) -> char {
        match self {
            TrackState::Added => 'a',
            TrackState::Initial => 'i',
            TrackState::Deleted => 'd',
        }
    }
}

/// One row of the change set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRow {
    pub relid: Option<Oid>,
    pub name: Option<String>,
    pub relfilenode: Oid,
    pub size: u64,
    pub state: TrackState,
    pub segment_index: SegmentIndex,
    pub relnamespace: Option<Oid>,
    pub relkind: Option<RelKind>,
    pub relstorage: Option<RelStorage>,
}

impl TrackRow {
    /// Row for a catalog relation that matched the filter.
    pub fn from_relation(
        rel: &RelationEntry,
        relfilenode: Oid,
        size: u64,
        state: TrackState,
        segment_index: SegmentIndex,
    ) -> Self {
        Self {
            relid: Some(rel.oid),
            name: Some(rel.name.clone()),
            relfilenode,
            size,
            state,
            segment_index,
            relnamespace: Some(rel.relnamespace),
            relkind: Some(rel.relkind),
            relstorage: Some(rel.relstorage),
        }
    }

    /// Row for a dropped storage file.
    pub fn deleted(relfilenode: Oid, segment_index: SegmentIndex) -> Self {
        Self {
            relid: None,
            name: None,
            relfilenode,
            size: 0,
            state: TrackState::Deleted,
            segment_index,
            relnamespace: None,
            relkind: None,
            relstorage: None,
        }
    }
}

/// Readiness of the tracking state on one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentStatus {
    pub segment_index: SegmentIndex,
    pub is_initialized: bool,
}
