//! Editor actions
//!
//! The closed set of transitions understood by the reducer. Actions are
//! plain data; none of them perform I/O.

use std::collections::HashMap;

use crate::model::{
    Dashboard, DashboardSettings, DashboardState, EntityAlias, Timewindow, Widget, WidgetId,
};

/// One geometry update, produced by the grid reconciliation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryChange {
    pub id: WidgetId,
    pub col: i32,
    pub row: i32,
    pub size_x: i32,
    pub size_y: i32,
}

/// Typed shallow patch of the document configuration.
///
/// Only sections that are `Some` are replaced; everything else is left
/// untouched. Used for settings, entity aliases and states edits.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentPatch {
    pub settings: Option<DashboardSettings>,
    pub entity_aliases: Option<HashMap<String, EntityAlias>>,
    pub states: Option<HashMap<String, DashboardState>>,
    pub timewindow: Option<Option<Timewindow>>,
    pub description: Option<Option<String>>,
}

/// A transition of the editing state machine
#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    /// Replace document and baseline; clears dirty and selection
    Load(Dashboard),
    /// Toggle the load-in-progress flag
    SetLoading(bool),
    /// `viewing → editing`; no document change
    EnterEdit,
    /// `editing → viewing`, discarding unsaved changes
    ExitEdit,
    AddWidget(Widget),
    RemoveWidget(WidgetId),
    /// Shallow-merge a JSON object into the widget's config
    UpdateWidgetConfig {
        id: WidgetId,
        patch: serde_json::Value,
    },
    UpdateWidgetTitle {
        id: WidgetId,
        title: String,
    },
    /// Bulk geometry updates; unknown ids are ignored
    UpdateGeometry(Vec<GeometryChange>),
    /// Shallow-merge into the document configuration
    UpdateDocumentSettings(DocumentPatch),
    /// UI selection only, never affects the dirty flag
    SelectWidget(Option<WidgetId>),
    /// Explicit discard back to the baseline; edit mode unchanged
    Revert,
    SaveStart,
    SaveSucceeded(Dashboard),
    SaveFailed,
}
