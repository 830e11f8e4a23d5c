//! Dashboard document
//!
//! The dashboard document is the persisted dashboard definition: widgets,
//! named view states with their layouts, entity aliases and display
//! settings. The invariant maintained by every mutating transition is
//! that the widget map and the active layout's geometry map stay in
//! lockstep — a widget id appears in one iff it appears in the other.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::alias::EntityAlias;
use crate::model::timewindow::Timewindow;
use crate::model::widget::{Widget, WidgetGeometry, WidgetId};

/// Name of the layout every widget is placed into
pub const MAIN_LAYOUT: &str = "main";

/// Name of the state created by default construction
pub const DEFAULT_STATE: &str = "default";

/// Default realtime window for a new dashboard (60 s)
pub const DEFAULT_DASHBOARD_TIMEWINDOW_MS: i64 = 60_000;

// ==================== Grid Settings ====================

/// Grid geometry parameters of one layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSettings {
    #[serde(default = "default_columns")]
    pub columns: i32,

    #[serde(default = "default_margin")]
    pub margin: i32,

    #[serde(default = "default_row_height")]
    pub row_height: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,

    #[serde(default)]
    pub auto_fill_height: bool,
}

fn default_columns() -> i32 {
    24
}

fn default_margin() -> i32 {
    10
}

fn default_row_height() -> i32 {
    50
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            columns: default_columns(),
            margin: default_margin(),
            row_height: default_row_height(),
            background_color: Some("#FFFFFF".to_string()),
            auto_fill_height: false,
        }
    }
}

// ==================== States & Layouts ====================

/// One layout of a view state: grid settings plus per-widget geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardLayout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_settings: Option<GridSettings>,

    #[serde(default)]
    pub widgets: HashMap<WidgetId, WidgetGeometry>,
}

/// A named view state holding one or more named layouts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub root: bool,

    #[serde(default)]
    pub layouts: HashMap<String, DashboardLayout>,
}

// ==================== Settings ====================

/// Dashboard-level display settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSettings {
    #[serde(default = "default_show_title")]
    pub show_title: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_css: Option<String>,
}

fn default_show_title() -> bool {
    true
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            show_title: true,
            title_color: None,
            dashboard_css: None,
        }
    }
}

// ==================== Configuration ====================

/// The content of a dashboard: widgets, states, aliases, settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardConfiguration {
    #[serde(default)]
    pub settings: DashboardSettings,

    #[serde(default)]
    pub widgets: HashMap<WidgetId, Widget>,

    #[serde(default)]
    pub states: HashMap<String, DashboardState>,

    #[serde(default)]
    pub entity_aliases: HashMap<String, EntityAlias>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timewindow: Option<Timewindow>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DashboardConfiguration {
    /// Name of the root state, falling back to `default`, then any state
    pub fn root_state_name(&self) -> Option<&str> {
        if let Some((name, _)) = self.states.iter().find(|(_, s)| s.root) {
            return Some(name.as_str());
        }
        if self.states.contains_key(DEFAULT_STATE) {
            return Some(DEFAULT_STATE);
        }
        self.states.keys().next().map(|s| s.as_str())
    }

    /// The active layout (the root state's `main` layout), if present
    pub fn active_layout(&self) -> Option<&DashboardLayout> {
        let state = self.root_state_name()?;
        self.states.get(state)?.layouts.get(MAIN_LAYOUT)
    }

    /// Grid settings of the active layout, or the defaults
    pub fn grid_settings(&self) -> GridSettings {
        self.active_layout()
            .and_then(|l| l.grid_settings.clone())
            .unwrap_or_default()
    }

    /// Rebuild every layout's geometry map from the widget set.
    ///
    /// The active layout mirrors every widget's geometry; every other
    /// layout only drops entries for widgets that no longer exist. This
    /// is what keeps the lockstep invariant after any widget mutation.
    pub fn sync_layouts(&mut self) {
        let root = self.root_state_name().map(|s| s.to_string());

        // Make sure the root state and its main layout exist at all
        if let Some(root) = &root {
            let state = self.states.entry(root.clone()).or_default();
            state.layouts.entry(MAIN_LAYOUT.to_string()).or_default();
        }

        let geometries: HashMap<WidgetId, WidgetGeometry> = self
            .widgets
            .iter()
            .map(|(id, w)| (id.clone(), w.geometry))
            .collect();

        for (state_name, state) in self.states.iter_mut() {
            for (layout_name, layout) in state.layouts.iter_mut() {
                layout.widgets.retain(|id, _| geometries.contains_key(id));

                let is_active = Some(state_name.as_str()) == root.as_deref()
                    && layout_name == MAIN_LAYOUT;
                if is_active {
                    for (id, geometry) in &geometries {
                        layout.widgets.insert(id.clone(), *geometry);
                    }
                }
            }
        }
    }

    /// True if any layout of any state still references the widget id
    pub fn any_layout_references(&self, id: &WidgetId) -> bool {
        self.states
            .values()
            .any(|s| s.layouts.values().any(|l| l.widgets.contains_key(id)))
    }
}

// ==================== Dashboard ====================

/// The persisted dashboard definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    /// Server-assigned identity; `None` until first save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<i64>,

    pub title: String,

    #[serde(default)]
    pub configuration: DashboardConfiguration,
}

impl Dashboard {
    /// Default construction for "new dashboard": one root state with an
    /// empty main layout, default grid settings and a 60 s realtime
    /// dashboard timewindow.
    pub fn new_empty(title: impl Into<String>) -> Self {
        let mut states = HashMap::new();
        states.insert(
            DEFAULT_STATE.to_string(),
            DashboardState {
                name: DEFAULT_STATE.to_string(),
                root: true,
                layouts: HashMap::from([(
                    MAIN_LAYOUT.to_string(),
                    DashboardLayout {
                        grid_settings: Some(GridSettings::default()),
                        widgets: HashMap::new(),
                    },
                )]),
            },
        );

        Self {
            id: None,
            created_time: None,
            title: title.into(),
            configuration: DashboardConfiguration {
                settings: DashboardSettings::default(),
                widgets: HashMap::new(),
                states,
                entity_aliases: HashMap::new(),
                timewindow: Some(Timewindow::realtime_ms(DEFAULT_DASHBOARD_TIMEWINDOW_MS)),
                description: None,
            },
        }
    }

    pub fn widget(&self, id: &WidgetId) -> Option<&Widget> {
        self.configuration.widgets.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::widget::WidgetCategory;

    fn widget_at(col: i32, row: i32) -> Widget {
        Widget::new(
            WidgetCategory::Latest,
            "w",
            WidgetGeometry::new(col, row, 4, 3),
        )
    }

    #[test]
    fn test_new_empty_has_root_state_and_main_layout() {
        let dashboard = Dashboard::new_empty("Test");
        let config = &dashboard.configuration;
        assert_eq!(config.root_state_name(), Some(DEFAULT_STATE));
        let layout = config.active_layout().expect("main layout");
        assert!(layout.widgets.is_empty());
        assert_eq!(config.grid_settings().columns, 24);
    }

    #[test]
    fn test_sync_layouts_mirrors_widgets_into_active_layout() {
        let mut dashboard = Dashboard::new_empty("Test");
        let widget = widget_at(2, 1);
        let id = widget.id.clone();
        dashboard
            .configuration
            .widgets
            .insert(id.clone(), widget);
        dashboard.configuration.sync_layouts();

        let layout = dashboard.configuration.active_layout().unwrap();
        assert_eq!(layout.widgets.get(&id).unwrap().col, 2);
        assert_eq!(layout.widgets.get(&id).unwrap().row, 1);
    }

    #[test]
    fn test_sync_layouts_drops_removed_ids_from_every_layout() {
        let mut dashboard = Dashboard::new_empty("Test");
        let widget = widget_at(0, 0);
        let id = widget.id.clone();
        dashboard
            .configuration
            .widgets
            .insert(id.clone(), widget);

        // A second, non-root state also references the widget
        dashboard.configuration.states.insert(
            "details".to_string(),
            DashboardState {
                name: "details".to_string(),
                root: false,
                layouts: HashMap::from([(
                    MAIN_LAYOUT.to_string(),
                    DashboardLayout {
                        grid_settings: None,
                        widgets: HashMap::from([(id.clone(), WidgetGeometry::new(1, 1, 2, 2))]),
                    },
                )]),
            },
        );

        dashboard.configuration.widgets.remove(&id);
        dashboard.configuration.sync_layouts();

        assert!(!dashboard.configuration.any_layout_references(&id));
    }

    #[test]
    fn test_document_roundtrip() {
        let mut dashboard = Dashboard::new_empty("Round trip");
        let widget = widget_at(3, 4);
        dashboard
            .configuration
            .widgets
            .insert(widget.id.clone(), widget);
        dashboard.configuration.sync_layouts();

        let json = serde_json::to_string(&dashboard).unwrap();
        let back: Dashboard = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dashboard);
    }

    #[test]
    fn test_root_state_fallbacks() {
        let mut config = DashboardConfiguration::default();
        assert_eq!(config.root_state_name(), None);

        config
            .states
            .insert("only".to_string(), DashboardState::default());
        assert_eq!(config.root_state_name(), Some("only"));

        config.states.insert(
            "home".to_string(),
            DashboardState {
                root: true,
                ..Default::default()
            },
        );
        assert_eq!(config.root_state_name(), Some("home"));
    }
}
