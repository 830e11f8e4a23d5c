//! One polling cycle
//!
//! A cycle resolves the feed's timewindow fresh, fetches every
//! datasource (routed by the type of its first key) and assembles the
//! replacement entries. A failing datasource contributes nothing but
//! never aborts the others.

use std::sync::Arc;

use crate::api::{AttributeScope, TelemetryApi, TsPoint};
use crate::data::merge::DataEntry;
use crate::model::timewindow::resolve_or_default;
use crate::model::{DataKeyType, Datasource, Timewindow};

/// Result of one completed polling cycle
#[derive(Debug, Clone, Default)]
pub struct CycleOutcome {
    pub entries: Vec<DataEntry>,
    pub error: Option<String>,
}

/// Fetch every datasource once and merge the results
pub async fn run_poll_cycle(
    api: &Arc<dyn TelemetryApi>,
    datasources: &[Datasource],
    timewindow: Option<&Timewindow>,
    now_ms: i64,
) -> CycleOutcome {
    let mut outcome = CycleOutcome::default();

    for datasource in datasources {
        let Some(device_id) = datasource.device_id.as_deref() else {
            continue;
        };
        if datasource.data_keys.is_empty() {
            continue;
        }

        let result = match datasource.fetch_kind() {
            DataKeyType::Timeseries => {
                fetch_timeseries(api, device_id, datasource, timewindow, now_ms).await
            }
            DataKeyType::Attribute => fetch_attributes(api, device_id, datasource).await,
        };

        match result {
            Ok(mut entries) => outcome.entries.append(&mut entries),
            Err(e) => {
                tracing::warn!("Datasource fetch failed for {}: {}", device_id, e);
                outcome.error = Some(e);
            }
        }
    }

    outcome
}

async fn fetch_timeseries(
    api: &Arc<dyn TelemetryApi>,
    device_id: &str,
    datasource: &Datasource,
    timewindow: Option<&Timewindow>,
    now_ms: i64,
) -> Result<Vec<DataEntry>, String> {
    // Resolved fresh on every cycle so realtime windows track "now"
    let range = resolve_or_default(timewindow, now_ms);

    let mut series = api
        .read_timeseries(device_id, &datasource.joined_keys(), range.start_ts, range.end_ts)
        .await
        .map_err(|e| e.to_string())?;

    let mut entries = Vec::with_capacity(datasource.data_keys.len());
    for key in &datasource.data_keys {
        let mut values = series.remove(&key.name).unwrap_or_default();
        values.sort_by_key(|p| p.ts);
        entries.push(DataEntry {
            key: key.name.clone(),
            label: key.display_label().to_string(),
            values,
        });
    }
    Ok(entries)
}

async fn fetch_attributes(
    api: &Arc<dyn TelemetryApi>,
    device_id: &str,
    datasource: &Datasource,
) -> Result<Vec<DataEntry>, String> {
    let attributes = api
        .read_latest_attributes(device_id, AttributeScope::Client, &datasource.joined_keys())
        .await
        .map_err(|e| e.to_string())?;

    let mut entries = Vec::with_capacity(datasource.data_keys.len());
    for key in &datasource.data_keys {
        let mut entry = DataEntry::new(key.name.clone(), key.display_label());
        if let Some(attr) = attributes.iter().find(|a| a.key == key.name) {
            let value = match &attr.value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            // A single synthesized point at the attribute's last update
            entry.values.push(TsPoint::new(attr.last_update_ts, value));
        }
        entries.push(entry);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockApi;
    use crate::model::DataKey;
    use serde_json::json;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(future)
    }

    fn api() -> Arc<dyn TelemetryApi> {
        Arc::new(MockApi::new())
    }

    #[test]
    fn test_empty_datasources_fetch_nothing() {
        let api = api();
        let outcome = block_on(run_poll_cycle(&api, &[], None, 1_000_000));
        assert!(outcome.entries.is_empty());
        assert!(outcome.error.is_none());
    }

    #[test]
    fn test_realtime_window_span_is_exact() {
        let mock = Arc::new(MockApi::new());
        let api: Arc<dyn TelemetryApi> = mock;
        let ds = Datasource::device("dev-1", vec![DataKey::timeseries("temp")]);
        let tw = Timewindow::realtime_ms(3_600_000);
        let now = 1_700_000_000_000;

        let outcome = block_on(run_poll_cycle(&api, &[ds], Some(&tw), now));
        let entry = &outcome.entries[0];
        // Every generated point lies inside [now - 3_600_000, now]
        assert!(!entry.values.is_empty());
        for point in &entry.values {
            assert!(point.ts > now - 3_600_000 && point.ts <= now);
        }
    }

    #[test]
    fn test_attribute_keys_synthesize_single_points() {
        let mock = Arc::new(MockApi::new());
        mock.set_attribute("dev-1", "switch1", json!("false"), 42_000);
        let api: Arc<dyn TelemetryApi> = mock;

        let ds = Datasource::device(
            "dev-1",
            vec![
                DataKey::attribute("switch1").with_label("Switch"),
                DataKey::attribute("missing"),
            ],
        );
        let outcome = block_on(run_poll_cycle(&api, &[ds], None, 1_000_000));

        assert_eq!(outcome.entries.len(), 2);
        let switch = &outcome.entries[0];
        assert_eq!(switch.label, "Switch");
        assert_eq!(switch.values, vec![TsPoint::new(42_000, "false")]);
        // Unset attributes still yield an (empty) entry
        assert!(outcome.entries[1].values.is_empty());
    }

    #[test]
    fn test_first_key_routes_mixed_datasource() {
        let mock = Arc::new(MockApi::new());
        mock.set_attribute("dev-1", "mode", json!("auto"), 5_000);
        let api: Arc<dyn TelemetryApi> = mock;

        // First key is an attribute, so the timeseries key is routed as
        // an attribute read too and comes back empty
        let ds = Datasource::device(
            "dev-1",
            vec![DataKey::attribute("mode"), DataKey::timeseries("temp")],
        );
        let outcome = block_on(run_poll_cycle(&api, &[ds], None, 1_000_000));

        assert_eq!(outcome.entries[0].values.len(), 1);
        assert!(outcome.entries[1].values.is_empty());
    }

    #[test]
    fn test_failing_datasource_does_not_block_others() {
        let mock = Arc::new(MockApi::new());
        mock.fail_device("dev-bad");
        let api: Arc<dyn TelemetryApi> = mock;

        let healthy = Datasource::device("dev-ok", vec![DataKey::timeseries("temp")]);
        let failing = Datasource::device("dev-bad", vec![DataKey::timeseries("temp")]);
        let outcome = block_on(run_poll_cycle(
            &api,
            &[failing, healthy],
            None,
            1_000_000,
        ));

        assert!(outcome.error.is_some());
        assert_eq!(outcome.entries.len(), 1);
        assert!(!outcome.entries[0].values.is_empty());
    }

    #[test]
    fn test_datasource_without_device_is_skipped() {
        let api = api();
        let ds = Datasource {
            device_id: None,
            ..Datasource::device("x", vec![DataKey::timeseries("temp")])
        };
        let outcome = block_on(run_poll_cycle(&api, &[ds], None, 1_000_000));
        assert!(outcome.entries.is_empty());
    }
}
