//! Dashboard document model
//!
//! This module contains the serializable representation of a dashboard:
//! the document itself (widgets, states, layouts, aliases, settings),
//! widgets and their geometry, datasources and data keys, entity aliases
//! and timewindows. The model is pure data — every mutation goes through
//! the editor reducer in [`crate::editor`].
//!
//! # Main Types
//!
//! - [`Dashboard`] - The persisted dashboard definition
//! - [`Widget`] - One visual unit bound to zero or more data sources
//! - [`Datasource`] / [`DataKey`] - A device's selected telemetry/attribute keys
//! - [`Timewindow`] - The time range a widget's data should reflect
//! - [`WidgetSettings`] - Typed view over the free-form per-widget settings bag
//!
//! The JSON shape of these types is the persisted representation and must
//! round-trip through save/load without loss; the per-widget `settings`
//! bag is carried as a raw JSON value so unknown shapes survive untouched.

pub mod alias;
pub mod dashboard;
pub mod datasource;
pub mod settings;
pub mod timewindow;
pub mod widget;

pub use alias::{EntityAlias, EntityAliasFilter};
pub use dashboard::{
    Dashboard, DashboardConfiguration, DashboardLayout, DashboardSettings, DashboardState,
    GridSettings, MAIN_LAYOUT,
};
pub use datasource::{DataKey, DataKeyType, Datasource, DatasourceKind};
pub use settings::WidgetSettings;
pub use timewindow::{FixedWindow, HistoryWindow, RealtimeWindow, TimeRange, Timewindow};
pub use widget::{Widget, WidgetCategory, WidgetConfig, WidgetGeometry, WidgetId};
