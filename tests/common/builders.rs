//! Builders for test documents and widgets

use gridboard_rs::model::{
    DataKey, Datasource, Widget, WidgetCategory, WidgetGeometry, WidgetId,
};
use gridboard_rs::Dashboard;
use serde_json::json;

/// A widget with a deterministic id
pub fn widget(id: &str, category: WidgetCategory, geometry: WidgetGeometry) -> Widget {
    let mut widget = Widget::new(category, format!("Widget {}", id), geometry);
    widget.id = WidgetId::from(id);
    widget
}

/// One device datasource with time-series keys
pub fn timeseries_datasource(device_id: &str, keys: &[&str]) -> Datasource {
    Datasource::device(
        device_id,
        keys.iter().map(|k| DataKey::timeseries(*k)).collect(),
    )
}

/// One device datasource with attribute keys
pub fn attribute_datasource(device_id: &str, keys: &[&str]) -> Datasource {
    Datasource::device(
        device_id,
        keys.iter().map(|k| DataKey::attribute(*k)).collect(),
    )
}

/// The toggle-switch dashboard used by the end-to-end editing scenario:
/// one `toggle` widget bound to a device attribute key `switch1`.
pub fn toggle_dashboard() -> Dashboard {
    let mut dashboard = Dashboard::new_empty("Device Control");
    dashboard.id = Some("dashboard-1".to_string());

    let mut toggle = widget("toggle-1", WidgetCategory::Rpc, WidgetGeometry::new(0, 0, 3, 3));
    toggle.title = "Switch".to_string();
    toggle.config.settings = json!({"widgetType": "toggle"});
    toggle.config.datasources = vec![attribute_datasource("demo-device", &["switch1"])];

    dashboard
        .configuration
        .widgets
        .insert(toggle.id.clone(), toggle);
    dashboard.configuration.sync_layouts();
    dashboard
}
