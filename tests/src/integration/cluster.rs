//! # Coordinated Cluster Reads
//!
//! A coordinator plus storage segments, driven through `ClusterCoordinator`.

#[cfg(test)]
mod tests {
    use change_tracking::{ChangeTrackingApi, TrackState, TrackingError};
    use shared_types::COORDINATOR_SEGMENT;

    use crate::fixtures::{cluster, DB, FIRST_RELFILENODE, OTHER_DB};

    #[tokio::test]
    async fn test_rows_carry_their_segment() {
        let cluster = cluster(3, 2);
        cluster.register_database(DB).await.unwrap();
        for segment in cluster.segments() {
            segment.record_object_modified(DB, FIRST_RELFILENODE);
        }

        let rows = cluster.read_modifications(DB).await.unwrap();
        let mut segments: Vec<_> = rows.iter().map(|r| r.segment_index).collect();
        segments.sort_unstable();
        assert_eq!(segments, vec![COORDINATOR_SEGMENT, 0, 1, 2]);
        assert!(rows.iter().all(|r| r.state == TrackState::Added));

        assert!(cluster.read_modifications(DB).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_one_failing_segment_aborts_every_segment() {
        let cluster = cluster(2, 3);
        cluster.register_database(DB).await.unwrap();
        for segment in cluster.segments() {
            segment.record_object_modified(DB, FIRST_RELFILENODE + 1);
            segment.record_object_dropped(DB, 900);
        }

        let last = cluster.segments().last().unwrap();
        last.catalog().set_fail_scans(true);
        let err = cluster.read_modifications(DB).await.unwrap_err();
        assert!(matches!(err, TrackingError::DataError(_)));

        last.catalog().set_fail_scans(false);
        let rows = cluster.read_modifications(DB).await.unwrap();
        let added = rows.iter().filter(|r| r.state == TrackState::Added).count();
        let deleted = rows.iter().filter(|r| r.state == TrackState::Deleted).count();
        assert_eq!(added, 3);
        assert_eq!(deleted, 3);
    }

    #[tokio::test]
    async fn test_snapshot_fans_out() {
        let cluster = cluster(2, 4);
        cluster.register_database(DB).await.unwrap();
        cluster.trigger_initial_snapshot(DB).unwrap();
        assert!(cluster
            .segments()
            .iter()
            .all(|s| s.is_initial_snapshot_triggered(DB)));

        let rows = cluster.read_modifications(DB).await.unwrap();
        assert_eq!(rows.len(), 3 * 4);
        assert!(rows.iter().all(|r| r.state == TrackState::Initial));
    }

    #[tokio::test]
    async fn test_filters_apply_on_every_segment() {
        let cluster = cluster(1, 2);
        cluster.register_database(OTHER_DB).await.unwrap();
        cluster.set_rel_storages(OTHER_DB, "a").await.unwrap();
        cluster.trigger_initial_snapshot(OTHER_DB).unwrap();

        // Fixture tables are heap, so an append-only filter hides them all
        assert!(cluster.read_modifications(OTHER_DB).await.unwrap().is_empty());

        let err = cluster.set_rel_kinds(OTHER_DB, "r,q").await.unwrap_err();
        assert!(matches!(err, TrackingError::InvalidRelKind(_)));
    }

    #[tokio::test]
    async fn test_statuses_and_error_reset() {
        let cluster = cluster(2, 0);
        let statuses = cluster.segment_statuses();
        assert_eq!(statuses.len(), 3);
        assert!(statuses.iter().all(|s| s.is_initialized));

        cluster.segments()[2].shared().raise_tracking_error();
        assert_eq!(cluster.reset_tracking_error(), 1);
        assert_eq!(cluster.reset_tracking_error(), 0);
    }

    #[tokio::test]
    async fn test_unregister_fans_out() {
        let cluster = cluster(2, 1);
        cluster.register_database(DB).await.unwrap();
        cluster.unregister_database(DB).await.unwrap();

        let err = cluster.read_modifications(DB).await.unwrap_err();
        assert!(matches!(err, TrackingError::NotTracked { dbid: DB }));
        assert!(cluster
            .segments()
            .iter()
            .all(|s| !s.shared().bloom_set().is_bound(DB)));
    }
}
