//! Subscription worker
//!
//! Runs on a dedicated thread and owns every open feed: polling
//! schedules, streaming subscriptions and the latest snapshot per feed.
//! Fetch cycles are spawned onto the shared tokio runtime and report
//! back over an internal channel, so a slow cycle never blocks the next
//! tick and the last completed cycle wins.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};

use crate::api::{
    StreamKeySpec, StreamUpdate, StreamingChannel, SubscriptionHandle, TelemetryApi, DEVICE_ENTITY,
};
use crate::data::fetch::{run_poll_cycle, CycleOutcome};
use crate::data::merge::FeedSnapshot;
use crate::data::{FeedCommand, FeedEvent, FeedId, FeedMode, FeedSpec};
use crate::model::DataKeyType;

/// Scheduling resolution of the worker loop
const TICK: Duration = Duration::from_millis(20);

/// Fallback rolling window for streaming subscriptions
const DEFAULT_STREAM_WINDOW_MS: i64 = 60_000;

/// Completed cycle delivered back to the worker
struct CycleDone {
    feed: FeedId,
    generation: u64,
    outcome: CycleOutcome,
}

/// Per-feed state owned by the worker
struct FeedState {
    spec: FeedSpec,
    snapshot: FeedSnapshot,
    next_poll: Option<Instant>,
    /// Bumped on every (re)configuration; stale cycles are dropped
    generation: u64,
    subscriptions: Vec<SubscriptionHandle>,
    key_labels: HashMap<String, String>,
}

/// The worker that serves every widget data binding
pub struct SubscriptionWorker {
    telemetry: Arc<dyn TelemetryApi>,
    streaming: Arc<dyn StreamingChannel>,
    command_rx: Receiver<FeedCommand>,
    events_tx: Sender<FeedEvent>,
    runtime: tokio::runtime::Handle,
    running: Arc<AtomicBool>,

    feeds: HashMap<FeedId, FeedState>,
    subscription_index: HashMap<u64, FeedId>,

    cycle_tx: Sender<CycleDone>,
    cycle_rx: Receiver<CycleDone>,
    stream_tx: Sender<StreamUpdate>,
    stream_rx: Receiver<StreamUpdate>,

    dropped_events: u64,
}

impl SubscriptionWorker {
    pub fn new(
        telemetry: Arc<dyn TelemetryApi>,
        streaming: Arc<dyn StreamingChannel>,
        command_rx: Receiver<FeedCommand>,
        events_tx: Sender<FeedEvent>,
        runtime: tokio::runtime::Handle,
        running: Arc<AtomicBool>,
    ) -> Self {
        let (cycle_tx, cycle_rx) = unbounded();
        let (stream_tx, stream_rx) = unbounded();
        Self {
            telemetry,
            streaming,
            command_rx,
            events_tx,
            runtime,
            running,
            feeds: HashMap::new(),
            subscription_index: HashMap::new(),
            cycle_tx,
            cycle_rx,
            stream_tx,
            stream_rx,
            dropped_events: 0,
        }
    }

    /// Run the main worker loop
    pub fn run(&mut self) {
        tracing::info!("Subscription worker started");

        while self.running.load(Ordering::SeqCst) {
            self.process_commands();
            self.process_results();
            self.poll_due_feeds();
            std::thread::sleep(TICK);
        }

        // Teardown: every open subscription is released
        let feeds: Vec<FeedId> = self.feeds.keys().cloned().collect();
        for feed in feeds {
            self.close_feed(&feed);
        }

        let _ = self.events_tx.send(FeedEvent::Shutdown);
        tracing::info!("Subscription worker stopped");
    }

    /// Process pending commands from the UI
    fn process_commands(&mut self) {
        loop {
            match self.command_rx.try_recv() {
                Ok(command) => self.handle_command(command),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.running.store(false, Ordering::SeqCst);
                    break;
                }
            }
        }
    }

    fn handle_command(&mut self, command: FeedCommand) {
        match command {
            FeedCommand::OpenFeed { feed, spec } => self.open_feed(feed, spec),
            FeedCommand::CloseFeed(feed) => self.close_feed(&feed),
            FeedCommand::SetPollInterval { feed, interval } => {
                if let Some(state) = self.feeds.get_mut(&feed) {
                    if let FeedMode::Polling {
                        interval: ref mut current,
                    } = state.spec.mode
                    {
                        *current = interval;
                        // Cancel and restart the schedule
                        state.next_poll = Some(Instant::now() + interval);
                    }
                }
            }
            FeedCommand::Shutdown => {
                self.running.store(false, Ordering::SeqCst);
            }
        }
    }

    /// Open or reconfigure a feed
    fn open_feed(&mut self, feed: FeedId, spec: FeedSpec) {
        // Reconfiguration releases everything the old spec owned
        let (snapshot, generation) = match self.feeds.remove(&feed) {
            Some(mut old) => {
                self.release_subscriptions(&mut old);
                (old.snapshot, old.generation + 1)
            }
            None => (FeedSnapshot::default(), 0),
        };

        let key_labels = spec
            .datasources
            .iter()
            .flat_map(|ds| ds.data_keys.iter())
            .map(|k| (k.name.clone(), k.display_label().to_string()))
            .collect();

        let mut state = FeedState {
            spec,
            snapshot,
            next_poll: None,
            generation,
            subscriptions: Vec::new(),
            key_labels,
        };
        state.snapshot.loading = true;

        match state.spec.mode {
            FeedMode::Polling { .. } => {
                // First cycle fires immediately
                state.next_poll = Some(Instant::now());
            }
            FeedMode::Streaming => {
                self.open_subscriptions(&feed, &mut state);
            }
        }

        self.feeds.insert(feed, state);
    }

    /// One logical subscription per datasource, routed by its first key
    fn open_subscriptions(&mut self, feed: &FeedId, state: &mut FeedState) {
        let window_ms = state
            .spec
            .timewindow
            .as_ref()
            .and_then(|tw| tw.rolling_ms())
            .unwrap_or(DEFAULT_STREAM_WINDOW_MS);

        let plans: Vec<(String, StreamKeySpec)> = state
            .spec
            .datasources
            .iter()
            .filter(|ds| !ds.data_keys.is_empty())
            .filter_map(|ds| {
                let device_id = ds.device_id.clone()?;
                let spec = match ds.fetch_kind() {
                    DataKeyType::Timeseries => StreamKeySpec::Timeseries {
                        keys: ds.joined_keys(),
                        window_ms,
                    },
                    DataKeyType::Attribute => StreamKeySpec::Attributes {
                        scope: crate::api::AttributeScope::Client,
                        keys: ds.joined_keys(),
                    },
                };
                Some((device_id, spec))
            })
            .collect();

        for (device_id, spec) in plans {
            let result = self.runtime.block_on(self.streaming.subscribe(
                DEVICE_ENTITY,
                &device_id,
                spec,
                self.stream_tx.clone(),
            ));
            match result {
                Ok(handle) => {
                    state.subscriptions.push(handle);
                    self.subscription_index.insert(handle.0, feed.clone());
                }
                Err(e) => {
                    tracing::warn!("Failed to open subscription for {}: {}", device_id, e);
                    state.snapshot.error = Some(e.to_string());
                }
            }
        }
    }

    /// Cancel the timer and release every subscription of a feed
    fn close_feed(&mut self, feed: &FeedId) {
        if let Some(mut state) = self.feeds.remove(feed) {
            self.release_subscriptions(&mut state);
        }
    }

    fn release_subscriptions(&mut self, state: &mut FeedState) {
        for handle in state.subscriptions.drain(..) {
            self.subscription_index.remove(&handle.0);
            if let Err(e) = self.runtime.block_on(self.streaming.unsubscribe(handle)) {
                tracing::warn!("Failed to release subscription {:?}: {}", handle, e);
            }
        }
    }

    /// Apply completed cycles and inbound streamed batches
    fn process_results(&mut self) {
        while let Ok(done) = self.cycle_rx.try_recv() {
            let Some(state) = self.feeds.get_mut(&done.feed) else {
                continue;
            };
            // A cycle spawned for a previous spec no longer applies
            if done.generation != state.generation {
                continue;
            }
            state
                .snapshot
                .apply_cycle(done.outcome.entries, done.outcome.error);
            let snapshot = state.snapshot.clone();
            self.emit(FeedEvent::Snapshot {
                feed: done.feed,
                snapshot,
            });
        }

        while let Ok(update) = self.stream_rx.try_recv() {
            let Some(feed) = self.subscription_index.get(&update.handle.0).cloned() else {
                continue;
            };
            let Some(state) = self.feeds.get_mut(&feed) else {
                continue;
            };
            for (key, points) in update.data {
                let label = state
                    .key_labels
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| key.clone());
                state.snapshot.merge_stream_points(&key, &label, points);
            }
            state.snapshot.loading = false;
            let snapshot = state.snapshot.clone();
            self.emit(FeedEvent::Snapshot { feed, snapshot });
        }
    }

    /// Spawn a cycle for every feed whose interval is due
    fn poll_due_feeds(&mut self) {
        let now = Instant::now();
        for (feed, state) in self.feeds.iter_mut() {
            let FeedMode::Polling { interval } = state.spec.mode else {
                continue;
            };
            let Some(due) = state.next_poll else {
                continue;
            };
            if due > now {
                continue;
            }
            // Interval-based, not completion-chained
            state.next_poll = Some(now + interval);

            let telemetry = self.telemetry.clone();
            let datasources = state.spec.datasources.clone();
            let timewindow = state.spec.timewindow;
            let feed = feed.clone();
            let generation = state.generation;
            let cycle_tx = self.cycle_tx.clone();

            self.runtime.spawn(async move {
                let now_ms = chrono::Utc::now().timestamp_millis();
                let outcome =
                    run_poll_cycle(&telemetry, &datasources, timewindow.as_ref(), now_ms).await;
                let _ = cycle_tx.send(CycleDone {
                    feed,
                    generation,
                    outcome,
                });
            });
        }
    }

    /// Try to send an event, counting drops if the UI can't keep up
    fn emit(&mut self, event: FeedEvent) {
        if self.events_tx.try_send(event).is_err() {
            self.dropped_events += 1;
            tracing::debug!("UI event queue full, {} events dropped", self.dropped_events);
        }
    }
}
