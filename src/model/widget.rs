//! Widget model types
//!
//! A widget is one visual unit on the dashboard grid. Its identity is
//! opaque and stable for the document's lifetime; only title, geometry
//! and config mutate after creation.

use serde::{Deserialize, Serialize};

use crate::model::datasource::Datasource;
use crate::model::timewindow::Timewindow;

/// Opaque, stable widget identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetId(pub String);

impl WidgetId {
    /// Generate a fresh random id
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WidgetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for WidgetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Coarse widget category, used for fallback dispatch and palette grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WidgetCategory {
    #[default]
    Latest,
    Timeseries,
    Alarm,
    Rpc,
    Static,
}

impl std::fmt::Display for WidgetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WidgetCategory::Latest => write!(f, "latest"),
            WidgetCategory::Timeseries => write!(f, "timeseries"),
            WidgetCategory::Alarm => write!(f, "alarm"),
            WidgetCategory::Rpc => write!(f, "rpc"),
            WidgetCategory::Static => write!(f, "static"),
        }
    }
}

/// Position and size of a widget, in grid cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct WidgetGeometry {
    pub col: i32,
    pub row: i32,
    pub size_x: i32,
    pub size_y: i32,
}

impl WidgetGeometry {
    pub fn new(col: i32, row: i32, size_x: i32, size_y: i32) -> Self {
        Self {
            col,
            row,
            size_x,
            size_y,
        }
    }
}

/// Widget configuration: data binding plus a free-form per-type settings bag
///
/// The `settings` bag is interpreted only by the widget's type (see
/// [`crate::model::settings::WidgetSettings`]); the engine passes it
/// through untouched so unrecognized shapes round-trip losslessly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    #[serde(default = "default_true")]
    pub show_title: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default)]
    pub datasources: Vec<Datasource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timewindow: Option<Timewindow>,

    #[serde(default = "default_settings")]
    pub settings: serde_json::Value,
}

fn default_true() -> bool {
    true
}

fn default_settings() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            show_title: true,
            background_color: None,
            color: None,
            datasources: Vec::new(),
            timewindow: None,
            settings: default_settings(),
        }
    }
}

impl WidgetConfig {
    /// Read a string field out of the settings bag
    pub fn setting_str(&self, key: &str) -> Option<&str> {
        self.settings.get(key).and_then(|v| v.as_str())
    }

    /// Shallow-merge a JSON object patch into this config
    ///
    /// Only fields present in the patch are replaced; the settings bag
    /// is swapped wholesale when the patch carries one.
    pub fn merge_patch(&mut self, patch: &serde_json::Value) {
        let Some(obj) = patch.as_object() else {
            return;
        };
        for (key, value) in obj {
            match key.as_str() {
                "showTitle" => {
                    if let Some(b) = value.as_bool() {
                        self.show_title = b;
                    }
                }
                "backgroundColor" => {
                    self.background_color = value.as_str().map(|s| s.to_string());
                }
                "color" => {
                    self.color = value.as_str().map(|s| s.to_string());
                }
                "datasources" => {
                    if let Ok(ds) = serde_json::from_value(value.clone()) {
                        self.datasources = ds;
                    }
                }
                "timewindow" => {
                    self.timewindow = serde_json::from_value(value.clone()).ok();
                }
                "settings" => {
                    self.settings = value.clone();
                }
                _ => {}
            }
        }
    }
}

/// One widget instance on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    pub id: WidgetId,

    /// Coarse category ("type" in the persisted JSON)
    #[serde(rename = "type", default)]
    pub category: WidgetCategory,

    /// Legacy fully-qualified type identifier, kept for dispatch fallback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_full_fqn: Option<String>,

    #[serde(default)]
    pub title: String,

    pub geometry: WidgetGeometry,

    #[serde(default)]
    pub config: WidgetConfig,
}

impl Widget {
    /// Create a widget with a fresh id and the given category/geometry
    pub fn new(category: WidgetCategory, title: impl Into<String>, geometry: WidgetGeometry) -> Self {
        Self {
            id: WidgetId::random(),
            category,
            type_full_fqn: None,
            title: title.into(),
            geometry,
            config: WidgetConfig::default(),
        }
    }

    /// The explicit registry type key, if the settings bag carries one
    pub fn explicit_type_key(&self) -> Option<&str> {
        self.config.setting_str("widgetType")
    }

    /// The first datasource's device id, used by command-issuing widgets
    pub fn primary_device_id(&self) -> Option<&str> {
        self.config
            .datasources
            .first()
            .and_then(|ds| ds.device_id.as_deref())
    }
}
