//! # Concurrent Writers and Readers
//!
//! Writers record modifications and drops from plain threads while a reader
//! loop commits or aborts at random. Nothing recorded may be lost.

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    use change_tracking::{ChangeTrackingApi, InMemorySettingsStore, TrackState};
    use parking_lot::Mutex;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use shared_types::Oid;

    use crate::fixtures::{segment, small_config, DB, FIRST_RELFILENODE};

    const TABLES: u32 = 64;
    const WRITERS: u64 = 4;
    const WRITES_PER_THREAD: usize = 2_000;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_no_modification_lost_under_random_aborts() {
        let seg = Arc::new(segment(
            small_config(0),
            TABLES,
            Arc::new(InMemorySettingsStore::new()),
        ));
        seg.register_database(DB).await.unwrap();

        let written = Arc::new(Mutex::new(BTreeSet::new()));
        let done = Arc::new(AtomicBool::new(false));

        let writers: Vec<_> = (0..WRITERS)
            .map(|seed| {
                let seg = Arc::clone(&seg);
                let written = Arc::clone(&written);
                thread::spawn(move || {
                    let mut rng = StdRng::seed_from_u64(seed);
                    for _ in 0..WRITES_PER_THREAD {
                        let relfilenode = FIRST_RELFILENODE + rng.gen_range(0..TABLES);
                        seg.record_object_modified(DB, relfilenode);
                        written.lock().insert(relfilenode);
                    }
                })
            })
            .collect();

        let reader = {
            let seg = Arc::clone(&seg);
            let done = Arc::clone(&done);
            tokio::spawn(async move {
                let mut rng = StdRng::seed_from_u64(99);
                let mut seen = BTreeSet::new();
                while !done.load(Ordering::Acquire) {
                    let mut txn = seg.begin_read(DB).await.unwrap();
                    let rows = txn.read_modifications().await.unwrap();
                    if rng.gen_bool(0.5) {
                        txn.abort();
                    } else {
                        txn.commit().unwrap();
                        seen.extend(rows.iter().map(|r| r.relfilenode));
                    }
                    tokio::task::yield_now().await;
                }
                seen
            })
        };

        for writer in writers {
            writer.join().unwrap();
        }
        done.store(true, Ordering::Release);
        let mut seen = reader.await.unwrap();

        // Whatever the reader aborted or missed is still in the filter
        seen.extend(
            seg.read_modifications(DB)
                .await
                .unwrap()
                .iter()
                .map(|r| r.relfilenode),
        );

        let written = written.lock();
        let missing: Vec<Oid> = written.difference(&seen).copied().collect();
        assert!(missing.is_empty(), "lost modifications: {missing:?}");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_drops_survive_aborted_reads() {
        let seg = Arc::new(segment(
            small_config(0),
            0,
            Arc::new(InMemorySettingsStore::new()),
        ));
        seg.register_database(DB).await.unwrap();

        let dropper = {
            let seg = Arc::clone(&seg);
            thread::spawn(move || {
                for relfilenode in 1..=50 {
                    seg.record_object_dropped(DB, relfilenode);
                }
            })
        };

        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = Vec::new();
        for _ in 0..20 {
            let mut txn = seg.begin_read(DB).await.unwrap();
            let rows = txn.read_modifications().await.unwrap();
            assert!(rows.iter().all(|r| r.state == TrackState::Deleted));
            if rng.gen_bool(0.5) {
                txn.abort();
            } else {
                txn.commit().unwrap();
                seen.extend(rows.iter().map(|r| r.relfilenode));
            }
        }
        dropper.join().unwrap();
        seen.extend(
            seg.read_modifications(DB)
                .await
                .unwrap()
                .iter()
                .map(|r| r.relfilenode),
        );

        // 64-record ring never overflows here, so every drop is reported once
        seen.sort_unstable();
        assert_eq!(seen, (1..=50).collect::<Vec<Oid>>());
    }

    #[test]
    fn test_bind_races_never_double_bind() {
        let seg = Arc::new(segment(
            small_config(0),
            0,
            Arc::new(InMemorySettingsStore::new()),
        ));
        let bloom_set = seg.shared().bloom_set();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let seg = Arc::clone(&seg);
                thread::spawn(move || seg.shared().bloom_set().bind(DB))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(bloom_set.count_bound(), 1);
    }
}
