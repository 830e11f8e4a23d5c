//! Deterministic in-process implementation of every collaborator API
//!
//! Used by the integration tests and by the `mock-api` demo mode: the
//! full engine and editor run against generated telemetry without a
//! server. Time-series values are a pure function of `(key, ts)`, so
//! repeated reads of the same range return identical data.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use crossbeam_channel::Sender;
use serde_json::{json, Value};

use crate::api::{
    AttributeScope, AttributeValue, DashboardStore, DeviceCommandApi, RpcRequest, StreamKeySpec,
    StreamUpdate, StreamingChannel, SubscriptionHandle, TelemetryApi, TsPoint,
};
use crate::error::{GridboardError, Result};
use crate::model::Dashboard;

/// Spacing of generated time-series points
const MOCK_SAMPLE_INTERVAL_MS: i64 = 5_000;

/// Cap on generated points per key per read
const MOCK_MAX_POINTS: usize = 500;

/// A command recorded by the mock command API
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCommand {
    pub device_id: String,
    pub request: RpcRequest,
    pub two_way: bool,
}

#[derive(Default)]
struct MockState {
    dashboards: HashMap<String, Dashboard>,
    attributes: HashMap<(String, String), (Value, i64)>,
    commands: Vec<RecordedCommand>,
    failing_devices: Vec<String>,
    subscriptions: HashMap<u64, Sender<StreamUpdate>>,
}

/// In-process mock of the server
pub struct MockApi {
    state: Mutex<MockState>,
    next_id: AtomicU64,
    fail_commands: AtomicBool,
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            next_id: AtomicU64::new(1),
            fail_commands: AtomicBool::new(false),
        }
    }

    /// Seed a dashboard so `load_dashboard` can find it
    pub fn put_dashboard(&self, dashboard: Dashboard) {
        let id = dashboard.id.clone().unwrap_or_else(|| "dashboard-0".to_string());
        self.state.lock().unwrap().dashboards.insert(id, dashboard);
    }

    /// Seed an attribute value
    pub fn set_attribute(&self, device_id: &str, key: &str, value: Value, last_update_ts: i64) {
        self.state
            .lock()
            .unwrap()
            .attributes
            .insert((device_id.to_string(), key.to_string()), (value, last_update_ts));
    }

    /// Make every telemetry read for this device fail
    pub fn fail_device(&self, device_id: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_devices
            .push(device_id.to_string());
    }

    /// Make every command fail until cleared
    pub fn set_command_failure(&self, fail: bool) {
        self.fail_commands.store(fail, Ordering::SeqCst);
    }

    /// Commands recorded so far
    pub fn recorded_commands(&self) -> Vec<RecordedCommand> {
        self.state.lock().unwrap().commands.clone()
    }

    /// Handles of the currently open streaming subscriptions
    pub fn open_subscriptions(&self) -> Vec<SubscriptionHandle> {
        let mut handles: Vec<SubscriptionHandle> = self
            .state
            .lock()
            .unwrap()
            .subscriptions
            .keys()
            .map(|id| SubscriptionHandle(*id))
            .collect();
        handles.sort_by_key(|h| h.0);
        handles
    }

    /// Push points into an open subscription (test hook)
    pub fn emit(&self, handle: SubscriptionHandle, key: &str, points: Vec<TsPoint>) {
        let state = self.state.lock().unwrap();
        if let Some(tx) = state.subscriptions.get(&handle.0) {
            let mut data = HashMap::new();
            data.insert(key.to_string(), points);
            let _ = tx.send(StreamUpdate { handle, data });
        }
    }

    fn device_fails(&self, device_id: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .failing_devices
            .iter()
            .any(|d| d == device_id)
    }

    /// Deterministic generated value for a key at a timestamp
    fn sample(key: &str, ts: i64) -> f64 {
        let phase: u32 = key.bytes().map(u32::from).sum();
        let t = ts as f64 / 60_000.0 + phase as f64;
        20.0 + 10.0 * t.sin()
    }
}

#[async_trait]
impl DashboardStore for MockApi {
    async fn load_dashboard(&self, id: &str) -> Result<Dashboard> {
        self.state
            .lock()
            .unwrap()
            .dashboards
            .get(id)
            .cloned()
            .ok_or_else(|| GridboardError::Api(format!("dashboard {} not found", id)))
    }

    async fn save_dashboard(&self, dashboard: &Dashboard) -> Result<Dashboard> {
        let mut saved = dashboard.clone();
        if saved.id.is_none() {
            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
            saved.id = Some(format!("dashboard-{}", n));
        }
        if saved.created_time.is_none() {
            saved.created_time = Some(chrono::Utc::now().timestamp_millis());
        }
        let id = saved.id.clone().unwrap_or_default();
        self.state
            .lock()
            .unwrap()
            .dashboards
            .insert(id, saved.clone());
        Ok(saved)
    }
}

#[async_trait]
impl TelemetryApi for MockApi {
    async fn read_timeseries(
        &self,
        device_id: &str,
        keys: &str,
        start_ts: i64,
        end_ts: i64,
    ) -> Result<HashMap<String, Vec<TsPoint>>> {
        if self.device_fails(device_id) {
            return Err(GridboardError::Api(format!("device {} unreachable", device_id)));
        }

        let mut series = HashMap::new();
        for key in keys.split(',').filter(|k| !k.is_empty()) {
            let mut points = Vec::new();
            let mut ts = start_ts - start_ts.rem_euclid(MOCK_SAMPLE_INTERVAL_MS)
                + MOCK_SAMPLE_INTERVAL_MS;
            while ts <= end_ts && points.len() < MOCK_MAX_POINTS {
                points.push(TsPoint::new(ts, format!("{:.2}", Self::sample(key, ts))));
                ts += MOCK_SAMPLE_INTERVAL_MS;
            }
            series.insert(key.to_string(), points);
        }
        Ok(series)
    }

    async fn read_latest_attributes(
        &self,
        device_id: &str,
        _scope: AttributeScope,
        keys: &str,
    ) -> Result<Vec<AttributeValue>> {
        if self.device_fails(device_id) {
            return Err(GridboardError::Api(format!("device {} unreachable", device_id)));
        }

        let state = self.state.lock().unwrap();
        let mut attributes = Vec::new();
        for key in keys.split(',').filter(|k| !k.is_empty()) {
            if let Some((value, ts)) = state.attributes.get(&(device_id.to_string(), key.to_string()))
            {
                attributes.push(AttributeValue {
                    key: key.to_string(),
                    value: value.clone(),
                    last_update_ts: *ts,
                });
            }
        }
        Ok(attributes)
    }
}

#[async_trait]
impl DeviceCommandApi for MockApi {
    async fn send_command(
        &self,
        device_id: &str,
        request: &RpcRequest,
        two_way: bool,
    ) -> Result<Value> {
        if self.fail_commands.load(Ordering::SeqCst) {
            return Err(GridboardError::Api("command rejected by device".to_string()));
        }

        self.state.lock().unwrap().commands.push(RecordedCommand {
            device_id: device_id.to_string(),
            request: request.clone(),
            two_way,
        });

        if two_way {
            Ok(json!({"success": true}))
        } else {
            Ok(Value::Null)
        }
    }
}

#[async_trait]
impl StreamingChannel for MockApi {
    async fn subscribe(
        &self,
        _entity_type: &str,
        _entity_id: &str,
        _spec: StreamKeySpec,
        updates: Sender<StreamUpdate>,
    ) -> Result<SubscriptionHandle> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.state
            .lock()
            .unwrap()
            .subscriptions
            .insert(id, updates);
        Ok(SubscriptionHandle(id))
    }

    async fn unsubscribe(&self, handle: SubscriptionHandle) -> Result<()> {
        self.state.lock().unwrap().subscriptions.remove(&handle.0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(future)
    }

    #[test]
    fn test_timeseries_are_deterministic_and_in_range() {
        let api = MockApi::new();
        let a = block_on(api.read_timeseries("dev-1", "temp", 0, 60_000)).unwrap();
        let b = block_on(api.read_timeseries("dev-1", "temp", 0, 60_000)).unwrap();
        assert_eq!(a, b);
        for point in &a["temp"] {
            assert!(point.ts > 0 && point.ts <= 60_000);
        }
    }

    #[test]
    fn test_failing_device_errors() {
        let api = MockApi::new();
        api.fail_device("dev-2");
        assert!(block_on(api.read_timeseries("dev-2", "temp", 0, 1000)).is_err());
        assert!(block_on(api.read_timeseries("dev-1", "temp", 0, 1000)).is_ok());
    }

    #[test]
    fn test_attributes_only_returns_seeded_keys() {
        let api = MockApi::new();
        api.set_attribute("dev-1", "switch1", json!("false"), 42);
        let attrs = block_on(api.read_latest_attributes(
            "dev-1",
            AttributeScope::Client,
            "switch1,missing",
        ))
        .unwrap();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].key, "switch1");
        assert_eq!(attrs[0].last_update_ts, 42);
    }

    #[test]
    fn test_save_assigns_identity_once() {
        let api = MockApi::new();
        let dashboard = Dashboard::new_empty("Mock");
        let saved = block_on(api.save_dashboard(&dashboard)).unwrap();
        assert!(saved.id.is_some());

        let again = block_on(api.save_dashboard(&saved)).unwrap();
        assert_eq!(again.id, saved.id);
    }

    #[test]
    fn test_subscription_bookkeeping() {
        let api = MockApi::new();
        let (tx, rx) = crossbeam_channel::unbounded();
        let handle = block_on(api.subscribe(
            "DEVICE",
            "dev-1",
            StreamKeySpec::Timeseries {
                keys: "temp".to_string(),
                window_ms: 60_000,
            },
            tx,
        ))
        .unwrap();
        assert_eq!(api.open_subscriptions(), vec![handle]);

        api.emit(handle, "temp", vec![TsPoint::new(1, "2")]);
        assert_eq!(rx.try_recv().unwrap().data["temp"].len(), 1);

        block_on(api.unsubscribe(handle)).unwrap();
        assert!(api.open_subscriptions().is_empty());
    }
}
