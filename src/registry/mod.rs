//! Widget type registry — data-driven widget type registration.
//!
//! The registry is the single source of truth for all built-in widget
//! types: category, display label, default size, and the factory that
//! produces the rendering capability. The "Add Widget" palette and the
//! renderer dispatcher are driven from this data.
//!
//! It is an explicit object: constructed once at startup, passed by
//! reference, and read-only afterwards — "populate once, read many"
//! without a process-wide singleton.

pub mod dispatch;

use std::collections::HashMap;

use crate::model::settings::type_keys;
use crate::model::WidgetCategory;
use crate::widgets::{
    AlarmTableView, GaugeView, LabelView, MapView, MarkdownView, RpcButtonView, SimpleTableView,
    SliderView, StatusView, TimeseriesChartView, ToggleView, ValueCardView, WidgetView,
};

pub use dispatch::{category_default, resolve, Resolved};

/// Metadata for one widget type, including its view factory
pub struct WidgetTypeInfo {
    pub type_key: &'static str,
    pub category: WidgetCategory,
    pub label: &'static str,
    pub description: &'static str,
    /// (size_x, size_y) used when adding this type from the palette
    pub default_size: (i32, i32),
    pub factory: fn() -> Box<dyn WidgetView>,
}

/// Build the registry with all built-in widget types
pub fn build_registry() -> Vec<WidgetTypeInfo> {
    vec![
        WidgetTypeInfo {
            type_key: type_keys::VALUE_CARD,
            category: WidgetCategory::Latest,
            label: "Value Card",
            description: "Display a single telemetry value",
            default_size: (4, 3),
            factory: || Box::new(ValueCardView),
        },
        WidgetTypeInfo {
            type_key: type_keys::GAUGE,
            category: WidgetCategory::Latest,
            label: "Gauge",
            description: "Bounded value with thresholds",
            default_size: (5, 5),
            factory: || Box::new(GaugeView),
        },
        WidgetTypeInfo {
            type_key: type_keys::SIMPLE_TABLE,
            category: WidgetCategory::Latest,
            label: "Simple Table",
            description: "Key-value table of latest values",
            default_size: (6, 4),
            factory: || Box::new(SimpleTableView),
        },
        WidgetTypeInfo {
            type_key: type_keys::STATUS,
            category: WidgetCategory::Latest,
            label: "Status Indicator",
            description: "Online/offline status indicator",
            default_size: (3, 3),
            factory: || Box::new(StatusView),
        },
        WidgetTypeInfo {
            type_key: type_keys::MAP,
            category: WidgetCategory::Latest,
            label: "Map",
            description: "Device position markers",
            default_size: (8, 6),
            factory: || Box::new(MapView),
        },
        WidgetTypeInfo {
            type_key: type_keys::TIMESERIES_CHART,
            category: WidgetCategory::Timeseries,
            label: "Line Chart",
            description: "Time-series line chart",
            default_size: (8, 5),
            factory: || Box::new(TimeseriesChartView),
        },
        WidgetTypeInfo {
            type_key: type_keys::ALARM_TABLE,
            category: WidgetCategory::Alarm,
            label: "Alarm Table",
            description: "Table of active alarms",
            default_size: (8, 5),
            factory: || Box::new(AlarmTableView),
        },
        WidgetTypeInfo {
            type_key: type_keys::RPC_BUTTON,
            category: WidgetCategory::Rpc,
            label: "RPC Button",
            description: "Send a command to a device",
            default_size: (4, 3),
            factory: || Box::new(RpcButtonView::default()),
        },
        WidgetTypeInfo {
            type_key: type_keys::TOGGLE,
            category: WidgetCategory::Rpc,
            label: "Toggle Switch",
            description: "Switch with a device command",
            default_size: (3, 3),
            factory: || Box::new(ToggleView::default()),
        },
        WidgetTypeInfo {
            type_key: type_keys::SLIDER,
            category: WidgetCategory::Rpc,
            label: "Slider Control",
            description: "Slider with a device command",
            default_size: (5, 3),
            factory: || Box::new(SliderView::default()),
        },
        WidgetTypeInfo {
            type_key: type_keys::LABEL,
            category: WidgetCategory::Static,
            label: "Label",
            description: "Static text content",
            default_size: (4, 2),
            factory: || Box::new(LabelView),
        },
        WidgetTypeInfo {
            type_key: type_keys::MARKDOWN,
            category: WidgetCategory::Static,
            label: "Markdown",
            description: "Rendered markdown content",
            default_size: (6, 4),
            factory: || Box::new(MarkdownView),
        },
    ]
}

/// Closed mapping from type key to widget type metadata; O(1) lookups
pub struct WidgetTypeRegistry {
    entries: Vec<WidgetTypeInfo>,
    index: HashMap<&'static str, usize>,
}

impl Default for WidgetTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetTypeRegistry {
    pub fn new() -> Self {
        Self::from_entries(build_registry())
    }

    pub fn from_entries(entries: Vec<WidgetTypeInfo>) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, info)| (info.type_key, i))
            .collect();
        Self { entries, index }
    }

    pub fn get(&self, type_key: &str) -> Option<&WidgetTypeInfo> {
        self.index.get(type_key).map(|&i| &self.entries[i])
    }

    /// All entries in registration order, for the "Add Widget" palette
    pub fn all(&self) -> &[WidgetTypeInfo] {
        &self.entries
    }

    pub fn create_view(&self, type_key: &str) -> Option<Box<dyn WidgetView>> {
        self.get(type_key).map(|info| (info.factory)())
    }
}
