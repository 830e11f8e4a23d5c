//! REST implementations of the persistence, telemetry and command APIs

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::api::{
    AttributeScope, AttributeValue, DashboardStore, DeviceCommandApi, RpcRequest, TelemetryApi,
    TsPoint, DEVICE_ENTITY,
};
use crate::error::{GridboardError, Result};
use crate::model::Dashboard;

/// REST client for the server API
///
/// One instance is shared by the engine and the editor coordinator; the
/// underlying `reqwest::Client` pools connections internally.
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl DashboardStore for HttpApi {
    async fn load_dashboard(&self, id: &str) -> Result<Dashboard> {
        let url = self.url(&format!("/api/dashboard/{}", id));
        tracing::debug!("Loading dashboard from {}", url);

        let dashboard = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<Dashboard>()
            .await?;
        Ok(dashboard)
    }

    async fn save_dashboard(&self, dashboard: &Dashboard) -> Result<Dashboard> {
        let url = self.url("/api/dashboard");
        tracing::debug!("Saving dashboard '{}' to {}", dashboard.title, url);

        let saved = self
            .client
            .post(&url)
            .json(dashboard)
            .send()
            .await?
            .error_for_status()?
            .json::<Dashboard>()
            .await?;
        Ok(saved)
    }
}

#[async_trait]
impl TelemetryApi for HttpApi {
    async fn read_timeseries(
        &self,
        device_id: &str,
        keys: &str,
        start_ts: i64,
        end_ts: i64,
    ) -> Result<HashMap<String, Vec<TsPoint>>> {
        let url = self.url(&format!(
            "/api/plugins/telemetry/{}/{}/values/timeseries",
            DEVICE_ENTITY, device_id
        ));

        let start_ts = start_ts.to_string();
        let end_ts = end_ts.to_string();
        let series = self
            .client
            .get(&url)
            .query(&[
                ("keys", keys),
                ("startTs", start_ts.as_str()),
                ("endTs", end_ts.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<HashMap<String, Vec<TsPoint>>>()
            .await?;
        Ok(series)
    }

    async fn read_latest_attributes(
        &self,
        device_id: &str,
        scope: AttributeScope,
        keys: &str,
    ) -> Result<Vec<AttributeValue>> {
        let url = self.url(&format!(
            "/api/plugins/telemetry/{}/{}/values/attributes/{}",
            DEVICE_ENTITY,
            device_id,
            scope.as_str()
        ));

        let attributes = self
            .client
            .get(&url)
            .query(&[("keys", keys)])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<AttributeValue>>()
            .await?;
        Ok(attributes)
    }
}

#[async_trait]
impl DeviceCommandApi for HttpApi {
    async fn send_command(
        &self,
        device_id: &str,
        request: &RpcRequest,
        two_way: bool,
    ) -> Result<Value> {
        let direction = if two_way { "twoway" } else { "oneway" };
        let url = self.url(&format!("/api/rpc/{}/{}", direction, device_id));
        tracing::debug!("Sending {} command '{}' to {}", direction, request.method, device_id);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| GridboardError::Api(format!("command rejected: {}", e)))?;

        // One-way commands return an empty body
        let body = response.text().await?;
        if body.is_empty() {
            Ok(Value::Null)
        } else {
            Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let api = HttpApi::new("http://localhost:8080/");
        assert_eq!(
            api.url("/api/dashboard/d1"),
            "http://localhost:8080/api/dashboard/d1"
        );
    }
}
