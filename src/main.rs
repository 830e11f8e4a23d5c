//! Gridboard - Main Entry Point
//!
//! Boots the data engine against the configured server (or the built-in
//! mock with the `mock-api` feature), restores the last session, and
//! runs the dashboard editor shell.

use std::sync::Arc;

use gridboard_rs::api::{DashboardStore, DeviceCommandApi, StreamingChannel, TelemetryApi};
use gridboard_rs::config::{AppConfig, AppState};
use gridboard_rs::data::DataEngine;
use gridboard_rs::model::Dashboard;
use gridboard_rs::DashboardApp;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

struct Backends {
    store: Arc<dyn DashboardStore>,
    telemetry: Arc<dyn TelemetryApi>,
    commands: Arc<dyn DeviceCommandApi>,
    streaming: Arc<dyn StreamingChannel>,
}

#[cfg(feature = "mock-api")]
fn build_backends(_config: &AppConfig, _runtime: &tokio::runtime::Handle) -> Backends {
    use gridboard_rs::api::MockApi;
    use serde_json::json;

    tracing::info!("Running against generated data (mock-api)");
    let api = Arc::new(MockApi::new());
    api.set_attribute("demo-device", "switch1", json!("false"), chrono::Utc::now().timestamp_millis());
    Backends {
        store: api.clone(),
        telemetry: api.clone(),
        commands: api.clone(),
        streaming: api,
    }
}

#[cfg(not(feature = "mock-api"))]
fn build_backends(config: &AppConfig, runtime: &tokio::runtime::Handle) -> Backends {
    use gridboard_rs::api::{HttpApi, WsChannel};

    let http = Arc::new(HttpApi::new(config.api_base_url.clone()));
    let ws = Arc::new(WsChannel::connect(config.ws_url.clone(), runtime));
    Backends {
        store: http.clone(),
        telemetry: http.clone(),
        commands: http,
        streaming: ws,
    }
}

fn main() -> eframe::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,gridboard_rs=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Gridboard");

    let config = AppConfig::load_or_default();
    let mut app_state = AppState::load_or_default();
    app_state.cleanup_missing();

    // Try to restore the last opened dashboard file
    let initial: Option<Dashboard> = app_state.get_last_dashboard().and_then(|path| {
        tracing::info!("Restoring last dashboard from {:?}", path);
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| tracing::warn!("Failed to parse last dashboard: {}", e))
                .ok(),
            Err(e) => {
                tracing::warn!("Failed to read last dashboard: {}", e);
                None
            }
        }
    });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime");

    let backends = build_backends(&config, runtime.handle());
    let engine = DataEngine::spawn(
        backends.telemetry,
        backends.streaming,
        runtime.handle().clone(),
    );

    let dark_mode = app_state.ui_preferences.dark_mode;
    let app = DashboardApp::new(
        config,
        app_state,
        backends.store,
        backends.commands,
        engine,
        runtime.handle().clone(),
        initial,
    );

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Gridboard"),
        ..Default::default()
    };

    let result = eframe::run_native(
        "Gridboard",
        native_options,
        Box::new(move |cc| {
            if dark_mode {
                cc.egui_ctx.set_visuals(egui::Visuals::dark());
            } else {
                cc.egui_ctx.set_visuals(egui::Visuals::light());
            }
            Ok(Box::new(app))
        }),
    );

    tracing::info!("Shutting down");
    result
}
