//! # Boot, Recovery and Error Lifecycle
//!
//! Region attachment, the registration worker over a JSON settings file,
//! snapshot-on-recovery and the sticky tracking error.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use change_tracking::{
        ChangeTrackingApi, ChangeTrackingService, JsonFileSettingsStore, RegionState,
        RegistrationWorker, SharedRegion, TrackState, TrackingConfig, TrackingConfigBuilder,
        TrackingError,
    };
    use tokio::sync::watch;

    use crate::fixtures::{catalog_with_tables, DB, FIRST_RELFILENODE, OTHER_DB};

    fn boot_config(snapshot_on_recovery: bool) -> TrackingConfig {
        TrackingConfigBuilder::new()
            .bloom_size(2048)
            .db_track_count(4)
            .drops_count(32)
            .snapshot_on_recovery(snapshot_on_recovery)
            .worker_naptime_secs(1)
            .segment_index(1)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_service_requires_attached_region() {
        let region = SharedRegion::new("tracking");
        let store = Arc::new(JsonFileSettingsStore::new("unused.json"));
        let result = ChangeTrackingService::from_region(&region, catalog_with_tables(1), store);
        assert!(matches!(result, Err(TrackingError::SharedStateUnavailable)));

        region.attach(&boot_config(false)).unwrap();
        assert_eq!(region.state(), RegionState::Ready);
    }

    #[tokio::test]
    async fn test_reads_are_empty_until_worker_initializes() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonFileSettingsStore::new(dir.path().join("settings.json")));
        let catalog = catalog_with_tables(3);

        let region = SharedRegion::new("tracking");
        let shared = region.attach(&boot_config(false)).unwrap();
        let svc = ChangeTrackingService::from_region(&region, catalog, Arc::clone(&store)).unwrap();

        svc.register_database(DB).await.unwrap();
        svc.record_object_modified(DB, FIRST_RELFILENODE);
        assert!(!svc.is_segment_initialized().is_initialized);
        assert!(svc.read_modifications(DB).await.unwrap().is_empty());

        let report = RegistrationWorker::new(Arc::clone(&shared), store)
            .status_check()
            .await
            .unwrap();
        assert!(report.initialized_now);
        assert!(report.consistent);
        assert_eq!(report.tracked, 1);

        let status = svc.is_segment_initialized();
        assert_eq!(status.segment_index, 1);
        assert!(status.is_initialized);

        // Boot-time binding without recovery snapshot starts from a clear filter
        assert!(svc.read_modifications(DB).await.unwrap().is_empty());
        svc.record_object_modified(DB, FIRST_RELFILENODE);
        assert_eq!(svc.read_modifications(DB).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_restart_honours_snapshot_on_recovery() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let catalog = catalog_with_tables(4);

        // First boot: register both databases, opt one out of recovery snapshots
        {
            let store = Arc::new(JsonFileSettingsStore::new(&path));
            let region = SharedRegion::new("boot-1");
            region.attach(&boot_config(true)).unwrap();
            let svc = ChangeTrackingService::from_region(&region, Arc::clone(&catalog), store)
                .unwrap();
            svc.register_database(DB).await.unwrap();
            svc.register_database(OTHER_DB).await.unwrap();
            svc.set_snapshot_on_recovery(OTHER_DB, false).await.unwrap();
        }

        // Second boot over the same settings file
        let store = Arc::new(JsonFileSettingsStore::new(&path));
        let region = SharedRegion::new("boot-2");
        let shared = region.attach(&boot_config(true)).unwrap();
        let svc = ChangeTrackingService::from_region(&region, catalog, Arc::clone(&store)).unwrap();

        let report = RegistrationWorker::new(shared, store)
            .status_check()
            .await
            .unwrap();
        assert_eq!(report.bound, 2);
        assert!(svc.is_initial_snapshot_triggered(DB));
        assert!(!svc.is_initial_snapshot_triggered(OTHER_DB));

        let rows = svc.read_modifications(DB).await.unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.state == TrackState::Initial));
        assert!(svc.read_modifications(OTHER_DB).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_inconsistency_blocks_reads_until_reset() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonFileSettingsStore::new(dir.path().join("settings.json")));
        let region = SharedRegion::new("tracking");
        let shared = region.attach(&boot_config(false)).unwrap();
        let svc = ChangeTrackingService::from_region(&region, catalog_with_tables(2), Arc::clone(&store))
            .unwrap();
        let worker = RegistrationWorker::new(Arc::clone(&shared), store);

        svc.register_database(DB).await.unwrap();
        assert!(worker.status_check().await.unwrap().consistent);

        // A slot lost behind the settings' back
        shared.bloom_set().unbind(DB);
        assert!(!worker.status_check().await.unwrap().consistent);

        let err = svc.read_modifications(DB).await.unwrap_err();
        assert!(matches!(err, TrackingError::TrackingInconsistent { dbid: DB }));

        // Re-registering alone does not clear the sticky flag
        svc.register_database(DB).await.unwrap();
        assert!(svc.read_modifications(DB).await.is_err());

        assert!(svc.reset_tracking_error());
        assert!(!svc.reset_tracking_error());
        assert!(svc.read_modifications(DB).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_worker_stops_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonFileSettingsStore::new(dir.path().join("settings.json")));
        let region = SharedRegion::new("tracking");
        let shared = region.attach(&boot_config(false)).unwrap();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = RegistrationWorker::new(shared, store).spawn(shutdown_rx);

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("worker did not stop")
            .unwrap();
    }
}
