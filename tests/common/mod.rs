//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;

use std::time::{Duration, Instant};

use gridboard_rs::data::{EngineHandle, FeedEvent, FeedId, FeedSnapshot};

/// Default deadline for engine round trips
pub const WAIT_DEADLINE: Duration = Duration::from_secs(3);

/// Drain engine events until a snapshot for `feed` arrives
pub fn wait_for_snapshot(engine: &EngineHandle, feed: &FeedId) -> FeedSnapshot {
    wait_for_snapshot_where(engine, feed, |_| true)
}

/// Drain engine events until a snapshot for `feed` matches the predicate
pub fn wait_for_snapshot_where(
    engine: &EngineHandle,
    feed: &FeedId,
    predicate: impl Fn(&FeedSnapshot) -> bool,
) -> FeedSnapshot {
    let deadline = Instant::now() + WAIT_DEADLINE;
    while Instant::now() < deadline {
        for event in engine.drain() {
            if let FeedEvent::Snapshot {
                feed: event_feed,
                snapshot,
            } = event
            {
                if event_feed == *feed && predicate(&snapshot) {
                    return snapshot;
                }
            }
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("no matching snapshot for feed {} within deadline", feed);
}

/// Build a multi-thread tokio runtime for engine tests
pub fn test_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("test runtime")
}
