//! Settings store adapters
//!
//! - `InMemorySettingsStore`: a map behind a lock
//! - `JsonFileSettingsStore`: the same map persisted as a JSON array

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::DatabaseTrackingSettings;
use crate::error::DataError;
use crate::ports::TrackingSettingsStore;
use shared_types::Oid;

/// Settings kept in process memory.
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    entries: RwLock<BTreeMap<Oid, DatabaseTrackingSettings>>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TrackingSettingsStore for InMemorySettingsStore {
    async fn load(&self, dbid: Oid) -> Result<Option<DatabaseTrackingSettings>, DataError> {
        Ok(self.entries.read().get(&dbid).cloned())
    }

    async fn save(&self, settings: &DatabaseTrackingSettings) -> Result<(), DataError> {
        self.entries
            .write()
            .insert(settings.dbid, settings.clone());
        Ok(())
    }

    async fn list_tracked(&self) -> Result<Vec<DatabaseTrackingSettings>, DataError> {
        Ok(self
            .entries
            .read()
            .values()
            .filter(|s| s.is_tracked)
            .cloned()
            .collect())
    }
}

/// Settings persisted in a JSON file.
///
/// Every save rewrites the whole file through a temp file and a rename;
/// writes are serialized by an async mutex. A missing file reads as empty.
#[derive(Debug)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileSettingsStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<Oid, DatabaseTrackingSettings>, DataError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(DataError::Io(e)),
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        let list: Vec<DatabaseTrackingSettings> =
            serde_json::from_str(&content).map_err(|e| DataError::ParseError(e.to_string()))?;
        Ok(list.into_iter().map(|s| (s.dbid, s)).collect())
    }
}

#[async_trait]
impl TrackingSettingsStore for JsonFileSettingsStore {
    async fn load(&self, dbid: Oid) -> Result<Option<DatabaseTrackingSettings>, DataError> {
        Ok(self.read_all().await?.remove(&dbid))
    }

    async fn save(&self, settings: &DatabaseTrackingSettings) -> Result<(), DataError> {
        let _guard = self.write_lock.lock().await;

        let mut all = self.read_all().await?;
        all.insert(settings.dbid, settings.clone());
        let list: Vec<&DatabaseTrackingSettings> = all.values().collect();
        let json = serde_json::to_string_pretty(&list)
            .map_err(|e| DataError::ParseError(e.to_string()))?;

        // Readers never see a truncated file
        let temp_path = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(json.as_bytes()).await?;
        file.sync_all().await?;
        tokio::fs::rename(&temp_path, &self.path).await?;
        debug!(dbid = settings.dbid, path = %self.path.display(), "tracking settings saved");
        Ok(())
    }

    async fn list_tracked(&self) -> Result<Vec<DatabaseTrackingSettings>, DataError> {
        Ok(self
            .read_all()
            .await?
            .into_values()
            .filter(|s| s.is_tracked)
            .collect())
    }
}
