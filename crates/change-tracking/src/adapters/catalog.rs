//! In-memory relation catalog
//!
//! Backs the node binary's demo mode and every test. Scans and size lookups
//! can be made to fail to exercise the abort path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::DataError;
use crate::ports::CatalogProvider;
use shared_types::{Oid, RelationEntry};

/// Well-known schema ids installed by [`InMemoryCatalog::add_database`].
pub const PG_CATALOG_NAMESPACE: Oid = 11;
pub const PG_TOAST_NAMESPACE: Oid = 99;
pub const PG_PUBLIC_NAMESPACE: Oid = 2200;
pub const PG_AOSEGMENT_NAMESPACE: Oid = 6104;
pub const INFORMATION_SCHEMA_NAMESPACE: Oid = 13_153;

#[derive(Debug, Default)]
struct DatabaseCatalog {
    schemas: HashMap<String, Oid>,
    relations: Vec<RelationEntry>,
    sizes: HashMap<Oid, u64>,
}

/// Catalog kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    databases: RwLock<HashMap<Oid, DatabaseCatalog>>,
    fail_scans: AtomicBool,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a database with the standard schemas. Idempotent.
    pub fn add_database(&self, dbid: Oid) {
        let mut dbs = self.databases.write();
        let db = dbs.entry(dbid).or_default();
        for (name, oid) in [
            ("pg_catalog", PG_CATALOG_NAMESPACE),
            ("pg_toast", PG_TOAST_NAMESPACE),
            ("public", PG_PUBLIC_NAMESPACE),
            ("pg_aoseg", PG_AOSEGMENT_NAMESPACE),
            ("information_schema", INFORMATION_SCHEMA_NAMESPACE),
        ] {
            db.schemas.insert(name.to_string(), oid);
        }
    }

    pub fn add_schema(&self, dbid: Oid, name: &str, oid: Oid) {
        self.databases
            .write()
            .entry(dbid)
            .or_default()
            .schemas
            .insert(name.to_string(), oid);
    }

    /// Add or replace a relation (matched by relation id).
    pub fn add_relation(&self, dbid: Oid, rel: RelationEntry) {
        let mut dbs = self.databases.write();
        let db = dbs.entry(dbid).or_default();
        db.relations.retain(|r| r.oid != rel.oid);
        db.relations.push(rel);
    }

    pub fn set_relation_size(&self, dbid: Oid, relid: Oid, size: u64) {
        self.databases
            .write()
            .entry(dbid)
            .or_default()
            .sizes
            .insert(relid, size);
    }

    /// Remove a relation, returning it.
    pub fn remove_relation(&self, dbid: Oid, relid: Oid) -> Option<RelationEntry> {
        let mut dbs = self.databases.write();
        let db = dbs.get_mut(&dbid)?;
        let pos = db.relations.iter().position(|r| r.oid == relid)?;
        db.sizes.remove(&relid);
        Some(db.relations.remove(pos))
    }

    /// Make every following scan fail with a query error.
    pub fn set_fail_scans(&self, fail: bool) {
        self.fail_scans.store(fail, Ordering::Relaxed);
    }
}

#[async_trait]
impl CatalogProvider for InMemoryCatalog {
    async fn database_exists(&self, dbid: Oid) -> Result<bool, DataError> {
        Ok(self.databases.read().contains_key(&dbid))
    }

    async fn schema_oid(&self, dbid: Oid, name: &str) -> Result<Option<Oid>, DataError> {
        Ok(self
            .databases
            .read()
            .get(&dbid)
            .and_then(|db| db.schemas.get(name).copied()))
    }

    async fn scan_relations(&self, dbid: Oid) -> Result<Vec<RelationEntry>, DataError> {
        if self.fail_scans.load(Ordering::Relaxed) {
            return Err(DataError::QueryError(format!(
                "relation scan of database {dbid} failed"
            )));
        }
        Ok(self
            .databases
            .read()
            .get(&dbid)
            .map(|db| db.relations.clone())
            .unwrap_or_default())
    }

    async fn relation_size(&self, dbid: Oid, relid: Oid) -> Result<u64, DataError> {
        Ok(self
            .databases
            .read()
            .get(&dbid)
            .and_then(|db| db.sizes.get(&relid).copied())
            .unwrap_or(0))
    }
}
