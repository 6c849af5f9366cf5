//! # Core Catalog Entities
//!
//! Identifiers and catalog rows that every tracking crate speaks in.
//!
//! ## Clusters
//!
//! - **Identifiers**: `Oid`, `SegmentIndex`
//! - **Catalog**: `RelationEntry`

use serde::{Deserialize, Serialize};

use crate::catalog::{RelKind, RelStorage};

// =============================================================================
// CLUSTER A: IDENTIFIERS
// =============================================================================

/// A catalog object identifier (databases, schemas, relations, relfilenodes).
pub type Oid = u32;

/// The "no object" identifier. Unbound directory slots and free drop nodes
/// carry this value.
pub const INVALID_OID: Oid = 0;

/// Index of a segment (storage worker) inside the cluster.
pub type SegmentIndex = i32;

/// Segment index of the coordinator.
pub const COORDINATOR_SEGMENT: SegmentIndex = -1;

/// Returns true if `oid` names a real object.
#[inline]
pub fn oid_is_valid(oid: Oid) -> bool {
    oid != INVALID_OID
}

// =============================================================================
// CLUSTER B: CATALOG
// =============================================================================

/// One relation as seen by a scan of the relation catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationEntry {
    /// Relation id.
    pub oid: Oid,
    /// Relation name.
    pub name: String,
    /// Storage file number; `None` for relations without storage.
    pub relfilenode: Option<Oid>,
    /// Owning schema.
    pub relnamespace: Oid,
    /// Relation kind.
    pub relkind: RelKind,
    /// Storage kind.
    pub relstorage: RelStorage,
}

impl RelationEntry {
    /// Convenience constructor for a heap table in `relnamespace`.
    pub fn heap_table(oid: Oid, name: impl Into<String>, relfilenode: Oid, relnamespace: Oid) -> Self {
        Self {
            oid,
            name: name.into(),
            relfilenode: Some(relfilenode),
            relnamespace,
            relkind: RelKind::Relation,
            relstorage: RelStorage::Heap,
        }
    }
}
