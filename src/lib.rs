//! # Gridboard: grid-based IoT dashboard editor
//!
//! A dashboard composition tool: reusable widgets bound to live device
//! telemetry/attributes, arranged on a grid, edited transactionally and
//! rendered with continuously refreshed values.
//!
//! ## Architecture
//!
//! - **Editor**: a pure reducer over the dashboard document with
//!   dirty-tracking and revert semantics; async load/save orchestration
//!   lives in a thin coordinator
//! - **Registry**: a closed, data-driven mapping from widget type keys
//!   to rendering capabilities, with three-tier dispatch fallback
//! - **Data engine**: a worker thread resolving each widget's
//!   datasources into live value streams via polling or the streaming
//!   channel
//! - **Grid**: reconciliation between document geometry and the
//!   swappable grid surface
//! - **Communication**: crossbeam channels between the UI thread, the
//!   coordinator and the engine
//!
//! ## Configuration
//!
//! Application state (recent dashboards, preferences) is stored in the
//! platform-appropriate data directory under `dev.gridboard.gridboard-rs`.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gridboard_rs::{
//!     api::MockApi,
//!     app::DashboardApp,
//!     config::{AppConfig, AppState},
//!     data::DataEngine,
//! };
//!
//! fn main() -> eframe::Result<()> {
//!     let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
//!     let api = Arc::new(MockApi::new());
//!     let engine = DataEngine::spawn(api.clone(), api.clone(), runtime.handle().clone());
//!
//!     let app = DashboardApp::new(
//!         AppConfig::default(),
//!         AppState::load_or_default(),
//!         api.clone(),
//!         api,
//!         engine,
//!         runtime.handle().clone(),
//!         None,
//!     );
//!     eframe::run_native(
//!         "Gridboard",
//!         eframe::NativeOptions::default(),
//!         Box::new(|_cc| Ok(Box::new(app))),
//!     )
//! }
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod data;
pub mod editor;
pub mod error;
pub mod grid;
pub mod model;
pub mod registry;
pub mod widgets;

// Re-export commonly used types
pub use app::DashboardApp;
pub use config::{AppConfig, AppState};
pub use data::{DataEngine, EngineHandle, FeedSnapshot};
pub use editor::{reduce, EditorAction, EditorSession};
pub use error::{GridboardError, Result};
pub use model::{Dashboard, Datasource, Timewindow, Widget};
pub use registry::WidgetTypeRegistry;
