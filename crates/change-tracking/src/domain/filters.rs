//! Per-database tracking settings and the relation filter they resolve to

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::{split_list, TrackingConfig};
use crate::error::TrackingError;
use shared_types::{Oid, RelKind, RelStorage, RelationEntry};

/// Persistent tracking settings of one database.
///
/// `None` overrides fall back to the process-wide defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseTrackingSettings {
    pub dbid: Oid,
    pub is_tracked: bool,
    pub snapshot_on_recovery: Option<bool>,
    pub schemas: Option<String>,
    pub rel_kinds: Option<String>,
    pub rel_storages: Option<String>,
}

impl DatabaseTrackingSettings {
    pub fn new(dbid: Oid) -> Self {
        Self {
            dbid,
            ..Default::default()
        }
    }

    pub fn snapshot_on_recovery_or(&self, config: &TrackingConfig) -> bool {
        self.snapshot_on_recovery
            .unwrap_or(config.snapshot_on_recovery)
    }

    /// Schema names in effect: override, else default.
    pub fn schema_names(&self, config: &TrackingConfig) -> Vec<String> {
        match &self.schemas {
            Some(list) => split_list(list),
            None => config.schema_list(),
        }
    }

    /// Relation kinds in effect. Unknown codes are skipped.
    pub fn rel_kinds(&self, config: &TrackingConfig) -> Vec<RelKind> {
        let list = match &self.rel_kinds {
            Some(list) => split_list(list),
            None => config.rel_kind_list(),
        };
        parse_codes(&list, RelKind::from_code)
    }

    /// Storage kinds in effect. Unknown codes are skipped.
    pub fn rel_storages(&self, config: &TrackingConfig) -> Vec<RelStorage> {
        let list = match &self.rel_storages {
            Some(list) => split_list(list),
            None => config.rel_storage_list(),
        };
        parse_codes(&list, RelStorage::from_code)
    }
}

fn single_char(token: &str) -> Option<char> {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn parse_codes<T, E>(tokens: &[String], parse: impl Fn(char) -> Result<T, E>) -> Vec<T> {
    tokens
        .iter()
        .filter_map(|token| match single_char(token).map(&parse) {
            Some(Ok(value)) => Some(value),
            _ => {
                debug!(code = %token, "skipping unknown catalog code");
                None
            }
        })
        .collect()
}

fn normalize_codes(
    list: &str,
    valid: impl Fn(char) -> bool,
    invalid: impl Fn(String) -> TrackingError,
) -> Result<Option<String>, TrackingError> {
    let mut seen: Vec<char> = Vec::new();
    for token in split_list(list) {
        let code = single_char(&token)
            .filter(|c| valid(*c))
            .ok_or_else(|| invalid(token.clone()))?;
        if !seen.contains(&code) {
            seen.push(code);
        }
    }

    if seen.is_empty() {
        return Ok(None);
    }
    let joined = seen
        .iter()
        .map(char::to_string)
        .collect::<Vec<_>>()
        .join(",");
    Ok(Some(joined))
}

/// Validate and deduplicate a relkind list. An empty list yields `None`.
pub fn normalize_rel_kinds(list: &str) -> Result<Option<String>, TrackingError> {
    normalize_codes(
        list,
        |c| RelKind::from_code(c).is_ok(),
        TrackingError::InvalidRelKind,
    )
}

/// Validate and deduplicate a relstorage list. An empty list yields `None`.
pub fn normalize_rel_storages(list: &str) -> Result<Option<String>, TrackingError> {
    normalize_codes(
        list,
        |c| RelStorage::from_code(c).is_ok(),
        TrackingError::InvalidRelStorage,
    )
}

/// Add or remove `name` in a schema override list.
///
/// Order is preserved and duplicates never appear. Removing the last name
/// yields `None`.
pub fn add_or_remove_schema(current: Option<&str>, name: &str, add: bool) -> Option<String> {
    let mut names = current.map(split_list).unwrap_or_default();
    let present = names.iter().any(|n| n == name);

    if add && !present {
        names.push(name.to_string());
    } else if !add && present {
        names.retain(|n| n != name);
    }

    if names.is_empty() {
        None
    } else {
        Some(names.join(","))
    }
}

/// Relation filter resolved once per read transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackingFilters {
    pub schemas: Vec<Oid>,
    pub rel_kinds: Vec<RelKind>,
    pub rel_storages: Vec<RelStorage>,
}

impl TrackingFilters {
    /// True if any of the three allow-lists is empty.
    pub fn is_incomplete(&self) -> bool {
        self.schemas.is_empty() || self.rel_kinds.is_empty() || self.rel_storages.is_empty()
    }

    /// Whether a catalog row passes all three allow-lists.
    pub fn matches(&self, rel: &RelationEntry) -> bool {
        self.schemas.contains(&rel.relnamespace)
            && self.rel_kinds.contains(&rel.relkind)
            && self.rel_storages.contains(&rel.relstorage)
    }
}
