//! Data subscription engine
//!
//! The engine turns each widget's declared datasources into a
//! continuously updated [`FeedSnapshot`], using either periodic polling
//! or the persistent streaming channel. It runs on its own worker
//! thread and talks to the UI over crossbeam channels:
//!
//! - [`FeedCommand`] - sent from the UI (open/close feeds, intervals)
//! - [`FeedEvent`] - sent to the UI (snapshots, shutdown)
//! - [`EngineHandle`] - UI-side handle bundling both directions
//!
//! Polling ticks are interval-based, not chained to cycle completion:
//! cycles run as spawned tasks and the last completed cycle wins. All
//! streaming subscriptions opened for a feed are released when the feed
//! closes or its spec changes.

pub mod fetch;
pub mod merge;
pub mod worker;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::api::{StreamingChannel, TelemetryApi};
use crate::model::{Datasource, Timewindow, WidgetId};

pub use fetch::{run_poll_cycle, CycleOutcome};
pub use merge::{DataEntry, FeedSnapshot, MAX_STREAM_POINTS};
pub use worker::SubscriptionWorker;

/// Feeds are keyed by the widget they belong to
pub type FeedId = WidgetId;

/// Default polling interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How a feed keeps its values fresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedMode {
    /// Fetch on an interval; the interval restarts when changed
    Polling { interval: Duration },
    /// Push-based delivery over the streaming channel
    Streaming,
}

/// Everything the engine needs to serve one widget's data binding
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSpec {
    pub datasources: Vec<Datasource>,
    pub timewindow: Option<Timewindow>,
    pub mode: FeedMode,
}

/// Message sent from the UI to the engine
#[derive(Debug, Clone)]
pub enum FeedCommand {
    /// Open a feed, or reconfigure it (releasing prior subscriptions)
    OpenFeed { feed: FeedId, spec: FeedSpec },
    /// Tear a feed down: cancel its timer, release its subscriptions
    CloseFeed(FeedId),
    /// Cancel and restart the feed's polling interval
    SetPollInterval { feed: FeedId, interval: Duration },
    /// Stop the engine
    Shutdown,
}

/// Message sent from the engine to the UI
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// A feed's snapshot was replaced or merged into
    Snapshot { feed: FeedId, snapshot: FeedSnapshot },
    /// The engine stopped
    Shutdown,
}

/// UI-side handle to the engine
pub struct EngineHandle {
    command_tx: Sender<FeedCommand>,
    events_rx: Receiver<FeedEvent>,
    running: Arc<AtomicBool>,
}

impl EngineHandle {
    pub fn open_feed(&self, feed: FeedId, spec: FeedSpec) {
        let _ = self.command_tx.send(FeedCommand::OpenFeed { feed, spec });
    }

    pub fn close_feed(&self, feed: FeedId) {
        let _ = self.command_tx.send(FeedCommand::CloseFeed(feed));
    }

    pub fn set_poll_interval(&self, feed: FeedId, interval: Duration) {
        let _ = self
            .command_tx
            .send(FeedCommand::SetPollInterval { feed, interval });
    }

    pub fn shutdown(&self) {
        let _ = self.command_tx.send(FeedCommand::Shutdown);
        self.running.store(false, Ordering::SeqCst);
    }

    /// Receive all pending events without blocking
    pub fn drain(&self) -> Vec<FeedEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            events.push(event);
        }
        events
    }
}

/// The data engine: spawns the worker thread and hands back the handle
pub struct DataEngine;

impl DataEngine {
    pub fn spawn(
        telemetry: Arc<dyn TelemetryApi>,
        streaming: Arc<dyn StreamingChannel>,
        runtime: tokio::runtime::Handle,
    ) -> EngineHandle {
        let (command_tx, command_rx) = bounded(256);
        // Bounded for backpressure; snapshots are dropped, not queued
        // without limit, if the UI cannot keep up
        let (events_tx, events_rx) = bounded(10_000);
        let running = Arc::new(AtomicBool::new(true));

        let worker_running = running.clone();
        std::thread::Builder::new()
            .name("gridboard-data".to_string())
            .spawn(move || {
                let mut worker = SubscriptionWorker::new(
                    telemetry,
                    streaming,
                    command_rx,
                    events_tx,
                    runtime,
                    worker_running,
                );
                worker.run();
            })
            .expect("failed to spawn data engine thread");

        EngineHandle {
            command_tx,
            events_rx,
            running,
        }
    }
}
