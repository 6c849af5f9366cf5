//! # Catalog Vocabulary
//!
//! Relation kinds and storage kinds with their one-character catalog codes.

use serde::{Deserialize, Serialize};

use crate::errors::CatalogCodeError;

/// Kind of a relation, as stored in the relation catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelKind {
    /// Ordinary table (`r`).
    Relation,
    /// Index (`i`).
    Index,
    /// Sequence (`S`).
    Sequence,
    /// Toast table (`t`).
    Toast,
    /// View (`v`).
    View,
    /// Composite type (`c`).
    CompositeType,
    /// Foreign table (`f`).
    ForeignTable,
    /// Uncatalogued relation (`u`).
    Uncatalogued,
    /// Materialized view (`m`).
    MatView,
    /// Append-optimized segment table (`o`).
    AoSegments,
    /// Append-optimized block directory (`b`).
    AoBlockDir,
    /// Append-optimized visibility map (`M`).
    AoVisiMap,
}

impl RelKind {
    pub const ALL: [RelKind; 12] = [
        RelKind::Relation,
        RelKind::Index,
        RelKind::Sequence,
        RelKind::Toast,
        RelKind::View,
        RelKind::CompositeType,
        RelKind::ForeignTable,
        RelKind::Uncatalogued,
        RelKind::MatView,
        RelKind::AoSegments,
        RelKind::AoBlockDir,
        RelKind::AoVisiMap,
    ];

    pub fn code(self) -> char {
        match self {
            RelKind::Relation => 'r',
            RelKind::Index => 'i',
            RelKind::Sequence => 'S',
            RelKind::Toast => 't',
            RelKind::View => 'v',
            RelKind::CompositeType => 'c',
            RelKind::ForeignTable => 'f',
            RelKind::Uncatalogued => 'u',
            RelKind::MatView => 'm',
            RelKind::AoSegments => 'o',
            RelKind::AoBlockDir => 'b',
            RelKind::AoVisiMap => 'M',
        }
    }

    pub fn from_code(code: char) -> Result<Self, CatalogCodeError> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.code() == code)
            .ok_or(CatalogCodeError::UnknownRelKind(code))
    }
}

/// Physical storage kind of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelStorage {
    /// Heap (`h`).
    Heap,
    /// Append-optimized, row oriented (`a`).
    AppendOptimized,
    /// Append-optimized, column oriented (`c`).
    AoColumn,
    /// External table (`x`).
    External,
    /// No storage (`v`).
    Virtual,
    /// Foreign storage (`f`).
    Foreign,
}

impl RelStorage {
    pub const ALL: [RelStorage; 6] = [
        RelStorage::Heap,
        RelStorage::AppendOptimized,
        RelStorage::AoColumn,
        RelStorage::External,
        RelStorage::Virtual,
        RelStorage::Foreign,
    ];

    pub fn code(self) -> char {
        match self {
            RelStorage::Heap => 'h',
            RelStorage::AppendOptimized => 'a',
            RelStorage::AoColumn => 'c',
            RelStorage::External => 'x',
            RelStorage::Virtual => 'v',
            RelStorage::Foreign => 'f',
        }
    }

    pub fn from_code(code: char) -> Result<Self, CatalogCodeError> {
        Self::ALL
            .iter()
            .copied()
            .find(|storage| storage.code() == code)
            .ok_or(CatalogCodeError::UnknownRelStorage(code))
    }
}
