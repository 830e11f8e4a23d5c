//! Typed view over the per-widget settings bag
//!
//! Each widget type owns a private shape inside `widget.config.settings`.
//! The engine never validates these — the bag is stored raw and passed
//! through untouched — but renderers work against the typed union below,
//! parsed on demand by registry type key. Unrecognized type keys map to
//! [`WidgetSettings::Unknown`], which preserves the raw value.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::widget::Widget;

/// Registry type keys of the built-in widget set
pub mod type_keys {
    pub const VALUE_CARD: &str = "value_card";
    pub const GAUGE: &str = "gauge";
    pub const LABEL: &str = "label";
    pub const MARKDOWN: &str = "markdown";
    pub const SIMPLE_TABLE: &str = "simple_table";
    pub const TIMESERIES_CHART: &str = "timeseries_chart";
    pub const STATUS: &str = "status";
    pub const ALARM_TABLE: &str = "alarm_table";
    pub const RPC_BUTTON: &str = "rpc_button";
    pub const TOGGLE: &str = "toggle";
    pub const SLIDER: &str = "slider";
    pub const MAP: &str = "map";
}

/// A colored threshold used by gauge-style widgets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Threshold {
    pub value: f64,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ValueCardSettings {
    #[serde(default)]
    pub units: String,
    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

fn default_decimals() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GaugeSettings {
    #[serde(default)]
    pub units: String,
    #[serde(default)]
    pub decimals: u32,
    #[serde(default)]
    pub min_value: f64,
    #[serde(default = "default_max_value")]
    pub max_value: f64,
    #[serde(default)]
    pub thresholds: Vec<Threshold>,
}

fn default_max_value() -> f64 {
    100.0
}

impl Default for GaugeSettings {
    fn default() -> Self {
        Self {
            units: String::new(),
            decimals: 0,
            min_value: 0.0,
            max_value: default_max_value(),
            thresholds: Vec::new(),
        }
    }
}

impl GaugeSettings {
    /// Color of the highest threshold at or below `value`, if any
    pub fn threshold_color(&self, value: f64) -> Option<&str> {
        self.thresholds
            .iter()
            .filter(|t| value >= t.value)
            .max_by(|a, b| a.value.total_cmp(&b.value))
            .map(|t| t.color.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LabelSettings {
    #[serde(default)]
    pub label_text: String,
    #[serde(default)]
    pub use_html: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MarkdownSettings {
    #[serde(default)]
    pub markdown_text: String,
    /// Fallback body shared with the label shape
    #[serde(default)]
    pub label_text: String,
    #[serde(default)]
    pub use_raw_html: bool,
}

impl MarkdownSettings {
    pub fn body(&self) -> &str {
        if self.markdown_text.is_empty() {
            &self.label_text
        } else {
            &self.markdown_text
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TableSettings {
    #[serde(default)]
    pub show_timestamp: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSettings {
    #[serde(default = "default_true")]
    pub show_legend: bool,
    #[serde(default = "default_line_width")]
    pub line_width: f32,
}

fn default_true() -> bool {
    true
}

fn default_line_width() -> f32 {
    1.5
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            show_legend: true,
            line_width: default_line_width(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatusSettings {
    /// Value treated as "online"; anything else renders offline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub online_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AlarmTableSettings {
    #[serde(default)]
    pub show_severity: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcButtonSettings {
    #[serde(default)]
    pub button_label: String,
    #[serde(default = "default_rpc_method")]
    pub rpc_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_params: Option<Value>,
    #[serde(default)]
    pub two_way_rpc: bool,
}

fn default_rpc_method() -> String {
    "setValue".to_string()
}

impl Default for RpcButtonSettings {
    fn default() -> Self {
        Self {
            button_label: String::new(),
            rpc_method: default_rpc_method(),
            rpc_params: None,
            two_way_rpc: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleSettings {
    #[serde(default)]
    pub switch_label: String,
    #[serde(default = "default_rpc_method")]
    pub rpc_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_key: Option<String>,
    #[serde(default)]
    pub two_way_rpc: bool,
}

impl Default for ToggleSettings {
    fn default() -> Self {
        Self {
            switch_label: String::new(),
            rpc_method: default_rpc_method(),
            rpc_key: None,
            two_way_rpc: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliderSettings {
    #[serde(default = "default_rpc_method")]
    pub rpc_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_key: Option<String>,
    #[serde(default)]
    pub min_value: f64,
    #[serde(default = "default_max_value")]
    pub max_value: f64,
    #[serde(default)]
    pub two_way_rpc: bool,
}

impl Default for SliderSettings {
    fn default() -> Self {
        Self {
            rpc_method: default_rpc_method(),
            rpc_key: None,
            min_value: 0.0,
            max_value: default_max_value(),
            two_way_rpc: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapSettings {
    #[serde(default = "default_latitude_key")]
    pub latitude_key: String,
    #[serde(default = "default_longitude_key")]
    pub longitude_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_key: Option<String>,
}

fn default_latitude_key() -> String {
    "latitude".to_string()
}

fn default_longitude_key() -> String {
    "longitude".to_string()
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            latitude_key: default_latitude_key(),
            longitude_key: default_longitude_key(),
            label_key: None,
        }
    }
}

/// Tagged union over the built-in settings shapes, keyed by registry type
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetSettings {
    ValueCard(ValueCardSettings),
    Gauge(GaugeSettings),
    Label(LabelSettings),
    Markdown(MarkdownSettings),
    SimpleTable(TableSettings),
    TimeseriesChart(ChartSettings),
    Status(StatusSettings),
    AlarmTable(AlarmTableSettings),
    RpcButton(RpcButtonSettings),
    Toggle(ToggleSettings),
    Slider(SliderSettings),
    Map(MapSettings),
    /// Unrecognized type key — the raw bag is preserved untouched
    Unknown(Value),
}

impl WidgetSettings {
    /// Parse the settings bag for the given registry type key.
    ///
    /// A bag that does not match the expected shape falls back to that
    /// type's defaults rather than failing; an unknown type key keeps
    /// the raw value.
    pub fn parse(type_key: &str, bag: &Value) -> Self {
        use type_keys::*;

        fn typed<T: serde::de::DeserializeOwned + Default>(bag: &Value) -> T {
            serde_json::from_value(bag.clone()).unwrap_or_default()
        }

        match type_key {
            VALUE_CARD => WidgetSettings::ValueCard(typed(bag)),
            GAUGE => WidgetSettings::Gauge(typed(bag)),
            LABEL => WidgetSettings::Label(typed(bag)),
            MARKDOWN => WidgetSettings::Markdown(typed(bag)),
            SIMPLE_TABLE => WidgetSettings::SimpleTable(typed(bag)),
            TIMESERIES_CHART => WidgetSettings::TimeseriesChart(typed(bag)),
            STATUS => WidgetSettings::Status(typed(bag)),
            ALARM_TABLE => WidgetSettings::AlarmTable(typed(bag)),
            RPC_BUTTON => WidgetSettings::RpcButton(typed(bag)),
            TOGGLE => WidgetSettings::Toggle(typed(bag)),
            SLIDER => WidgetSettings::Slider(typed(bag)),
            MAP => WidgetSettings::Map(typed(bag)),
            _ => WidgetSettings::Unknown(bag.clone()),
        }
    }

    /// Parse a widget's bag for a resolved type key
    pub fn for_widget(type_key: &str, widget: &Widget) -> Self {
        Self::parse(type_key, &widget.config.settings)
    }
}
