//! External collaborator interfaces
//!
//! The engine only ever talks to the outside world through the traits in
//! this module: dashboard persistence, telemetry/attribute reads, device
//! commands and the push-based streaming channel. Production
//! implementations live in [`http`] (REST) and [`ws`] (WebSocket); a
//! deterministic in-process implementation lives in [`mock`] for tests
//! and the `mock-api` demo mode.
//!
//! All traits are object-safe and `Send + Sync` so they can be shared
//! across the worker thread and spawned fetch tasks behind an `Arc`.

pub mod http;
pub mod mock;
pub mod ws;

use std::collections::HashMap;

use async_trait::async_trait;
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::model::Dashboard;

pub use http::HttpApi;
pub use mock::MockApi;
pub use ws::WsChannel;

/// Entity type used for all device-bound reads and subscriptions
pub const DEVICE_ENTITY: &str = "DEVICE";

/// One timestamped telemetry value (epoch milliseconds)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TsPoint {
    pub ts: i64,
    pub value: String,
}

impl TsPoint {
    pub fn new(ts: i64, value: impl Into<String>) -> Self {
        Self {
            ts,
            value: value.into(),
        }
    }

    /// Numeric view of the value, if it parses
    pub fn as_f64(&self) -> Option<f64> {
        self.value.parse::<f64>().ok()
    }
}

/// A latest attribute value with its last-update timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeValue {
    pub key: String,
    pub value: Value,
    pub last_update_ts: i64,
}

/// Attribute scope on the server side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AttributeScope {
    #[default]
    Client,
    Shared,
    Server,
}

impl AttributeScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeScope::Client => "CLIENT_SCOPE",
            AttributeScope::Shared => "SHARED_SCOPE",
            AttributeScope::Server => "SERVER_SCOPE",
        }
    }
}

/// An RPC command sent to a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    pub params: Value,
}

// ==================== Persistence ====================

/// Dashboard persistence API
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DashboardStore: Send + Sync {
    /// Load a dashboard by id
    async fn load_dashboard(&self, id: &str) -> Result<Dashboard>;

    /// Save a dashboard. The server may assign/refresh identity and
    /// timestamps; the returned document becomes the new baseline.
    async fn save_dashboard(&self, dashboard: &Dashboard) -> Result<Dashboard>;
}

// ==================== Telemetry reads ====================

/// Telemetry/attribute read API
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TelemetryApi: Send + Sync {
    /// Read a time-series range for comma-joined keys
    async fn read_timeseries(
        &self,
        device_id: &str,
        keys: &str,
        start_ts: i64,
        end_ts: i64,
    ) -> Result<HashMap<String, Vec<TsPoint>>>;

    /// Read latest attribute values for comma-joined keys
    async fn read_latest_attributes(
        &self,
        device_id: &str,
        scope: AttributeScope,
        keys: &str,
    ) -> Result<Vec<AttributeValue>>;
}

// ==================== Device commands ====================

/// Device command (RPC) API
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceCommandApi: Send + Sync {
    /// Send a command; two-way commands return the device's response
    async fn send_command(
        &self,
        device_id: &str,
        request: &RpcRequest,
        two_way: bool,
    ) -> Result<Value>;
}

// ==================== Streaming channel ====================

/// Key specification of one logical streaming subscription
#[derive(Debug, Clone, PartialEq)]
pub enum StreamKeySpec {
    /// Rolling time-series subscription
    Timeseries { keys: String, window_ms: i64 },
    /// Attribute change subscription
    Attributes { scope: AttributeScope, keys: String },
}

/// Opaque handle identifying one open subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub u64);

/// Inbound batch of points for one subscription
#[derive(Debug, Clone)]
pub struct StreamUpdate {
    pub handle: SubscriptionHandle,
    pub data: HashMap<String, Vec<TsPoint>>,
}

/// Persistent push-based telemetry transport
#[async_trait]
pub trait StreamingChannel: Send + Sync {
    /// Open one logical subscription; inbound batches are delivered on
    /// `updates` tagged with the returned handle.
    async fn subscribe(
        &self,
        entity_type: &str,
        entity_id: &str,
        spec: StreamKeySpec,
        updates: Sender<StreamUpdate>,
    ) -> Result<SubscriptionHandle>;

    /// Release a subscription; failing to call this leaks it
    async fn unsubscribe(&self, handle: SubscriptionHandle) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ts_point_numeric_view() {
        assert_eq!(TsPoint::new(1, "21.5").as_f64(), Some(21.5));
        assert_eq!(TsPoint::new(1, "on").as_f64(), None);
    }

    #[test]
    fn test_attribute_value_serde_shape() {
        let attr: AttributeValue = serde_json::from_str(
            r#"{"key": "switch1", "value": "false", "lastUpdateTs": 1700000000000}"#,
        )
        .unwrap();
        assert_eq!(attr.key, "switch1");
        assert_eq!(attr.last_update_ts, 1_700_000_000_000);
    }

    #[test]
    fn test_scope_strings() {
        assert_eq!(AttributeScope::Client.as_str(), "CLIENT_SCOPE");
        assert_eq!(AttributeScope::Server.as_str(), "SERVER_SCOPE");
    }
}
