//! WebSocket implementation of the streaming channel
//!
//! One socket carries every subscription, multiplexed by `cmdId`.
//! Commands issued while the socket is down are buffered and flushed on
//! (re)connect; reconnects use bounded exponential backoff. Inbound
//! frames are routed to the subscribing feed by `subscriptionId`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use crossbeam_channel::Sender;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::api::{StreamKeySpec, StreamUpdate, StreamingChannel, SubscriptionHandle, TsPoint};
use crate::error::{GridboardError, Result};

/// Give up reconnecting after this many consecutive failures
const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Base reconnect delay, doubled per attempt
const RECONNECT_DELAY_MS: u64 = 2_000;

// ==================== Wire frames ====================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TsSubCmd {
    entity_type: String,
    entity_id: String,
    scope: &'static str,
    cmd_id: u64,
    keys: String,
    start_ts: i64,
    time_window: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AttrSubCmd {
    entity_type: String,
    entity_id: String,
    scope: String,
    cmd_id: u64,
    keys: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UnsubscribeCmd {
    cmd_id: u64,
}

/// Outbound command envelope; empty sections are omitted
#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct WsCommandFrame {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ts_sub_cmds: Vec<TsSubCmd>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attr_sub_cmds: Vec<AttrSubCmd>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    unsubscribe_cmd: Vec<UnsubscribeCmd>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WsInbound {
    subscription_id: Option<u64>,
    #[serde(default)]
    data: Option<HashMap<String, Vec<(i64, Value)>>>,
}

// ==================== Client ====================

enum WsRequest {
    Subscribe {
        cmd_id: u64,
        frame: WsCommandFrame,
        updates: Sender<StreamUpdate>,
    },
    Unsubscribe {
        cmd_id: u64,
    },
}

/// Streaming channel backed by a single multiplexed WebSocket
pub struct WsChannel {
    request_tx: UnboundedSender<WsRequest>,
    next_cmd_id: AtomicU64,
}

impl WsChannel {
    /// Connect lazily: the socket is opened by a background task on the
    /// given runtime; subscriptions issued before it opens are buffered.
    pub fn connect(url: impl Into<String>, runtime: &tokio::runtime::Handle) -> Self {
        let (request_tx, request_rx) = unbounded_channel();
        let url = url.into();
        runtime.spawn(run_client(url, request_rx));

        Self {
            request_tx,
            next_cmd_id: AtomicU64::new(1),
        }
    }

    fn send_request(&self, request: WsRequest) -> Result<()> {
        self.request_tx
            .send(request)
            .map_err(|_| GridboardError::Streaming("streaming client is gone".to_string()))
    }
}

#[async_trait]
impl StreamingChannel for WsChannel {
    async fn subscribe(
        &self,
        entity_type: &str,
        entity_id: &str,
        spec: StreamKeySpec,
        updates: Sender<StreamUpdate>,
    ) -> Result<SubscriptionHandle> {
        let cmd_id = self.next_cmd_id.fetch_add(1, Ordering::SeqCst);

        let frame = match spec {
            StreamKeySpec::Timeseries { keys, window_ms } => {
                let now = chrono::Utc::now().timestamp_millis();
                WsCommandFrame {
                    ts_sub_cmds: vec![TsSubCmd {
                        entity_type: entity_type.to_string(),
                        entity_id: entity_id.to_string(),
                        scope: "LATEST_TELEMETRY",
                        cmd_id,
                        keys,
                        start_ts: now - window_ms,
                        time_window: window_ms,
                    }],
                    ..Default::default()
                }
            }
            StreamKeySpec::Attributes { scope, keys } => WsCommandFrame {
                attr_sub_cmds: vec![AttrSubCmd {
                    entity_type: entity_type.to_string(),
                    entity_id: entity_id.to_string(),
                    scope: scope.as_str().to_string(),
                    cmd_id,
                    keys,
                }],
                ..Default::default()
            },
        };

        self.send_request(WsRequest::Subscribe {
            cmd_id,
            frame,
            updates,
        })?;
        Ok(SubscriptionHandle(cmd_id))
    }

    async fn unsubscribe(&self, handle: SubscriptionHandle) -> Result<()> {
        self.send_request(WsRequest::Unsubscribe { cmd_id: handle.0 })
    }
}

/// Background task owning the socket and the subscription table
async fn run_client(url: String, mut request_rx: UnboundedReceiver<WsRequest>) {
    let mut subscriptions: HashMap<u64, Sender<StreamUpdate>> = HashMap::new();
    let mut pending: Vec<String> = Vec::new();
    let mut attempts: u32 = 0;

    'reconnect: loop {
        let stream = match connect_async(url.as_str()).await {
            Ok((stream, _)) => stream,
            Err(e) => {
                attempts += 1;
                if attempts > MAX_RECONNECT_ATTEMPTS {
                    tracing::error!("Streaming channel gave up after {} attempts: {}", attempts, e);
                    return;
                }
                let delay = RECONNECT_DELAY_MS * 2u64.pow(attempts - 1);
                tracing::warn!("Streaming connect failed ({}), retrying in {} ms", e, delay);
                tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
                continue;
            }
        };
        attempts = 0;
        tracing::info!("Streaming channel connected to {}", url);

        let (mut write, mut read) = stream.split();

        // Flush commands issued while the socket was down
        for text in pending.drain(..) {
            if write.send(Message::Text(text)).await.is_err() {
                continue 'reconnect;
            }
        }

        loop {
            tokio::select! {
                request = request_rx.recv() => match request {
                    None => {
                        let _ = write.close().await;
                        return;
                    }
                    Some(WsRequest::Subscribe { cmd_id, frame, updates }) => {
                        subscriptions.insert(cmd_id, updates);
                        if let Ok(text) = serde_json::to_string(&frame) {
                            if write.send(Message::Text(text.clone())).await.is_err() {
                                pending.push(text);
                                continue 'reconnect;
                            }
                        }
                    }
                    Some(WsRequest::Unsubscribe { cmd_id }) => {
                        subscriptions.remove(&cmd_id);
                        let frame = WsCommandFrame {
                            unsubscribe_cmd: vec![UnsubscribeCmd { cmd_id }],
                            ..Default::default()
                        };
                        if let Ok(text) = serde_json::to_string(&frame) {
                            if write.send(Message::Text(text.clone())).await.is_err() {
                                pending.push(text);
                                continue 'reconnect;
                            }
                        }
                    }
                },
                message = read.next() => match message {
                    Some(Ok(Message::Text(text))) => {
                        dispatch_inbound(&subscriptions, &text);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!("Streaming read error, reconnecting: {}", e);
                        tokio::time::sleep(std::time::Duration::from_millis(RECONNECT_DELAY_MS))
                            .await;
                        continue 'reconnect;
                    }
                    None => {
                        tracing::warn!("Streaming channel closed by server, reconnecting");
                        tokio::time::sleep(std::time::Duration::from_millis(RECONNECT_DELAY_MS))
                            .await;
                        continue 'reconnect;
                    }
                },
            }
        }
    }
}

/// Route one inbound frame to its subscriber, ignoring unparsable frames
fn dispatch_inbound(subscriptions: &HashMap<u64, Sender<StreamUpdate>>, text: &str) {
    let Ok(inbound) = serde_json::from_str::<WsInbound>(text) else {
        return;
    };
    let (Some(id), Some(data)) = (inbound.subscription_id, inbound.data) else {
        return;
    };
    let Some(updates) = subscriptions.get(&id) else {
        return;
    };

    let data = data
        .into_iter()
        .map(|(key, points)| {
            let points = points
                .into_iter()
                .map(|(ts, value)| match value {
                    Value::String(s) => TsPoint::new(ts, s),
                    other => TsPoint::new(ts, other.to_string()),
                })
                .collect();
            (key, points)
        })
        .collect();

    let _ = updates.send(StreamUpdate {
        handle: SubscriptionHandle(id),
        data,
    });
}
