//! The Gridboard application shell
//!
//! Wires the pure editor, the widget registry, the grid surface and the
//! data engine together into an eframe app. Each frame drains the
//! coordinator and engine channels, reconciles open feeds with the
//! current widget set, and renders every widget through the dispatcher
//! with its latest snapshot.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use egui::RichText;
use serde_json::Value;

use crate::api::{DashboardStore, DeviceCommandApi};
use crate::config::{AppConfig, AppState};
use crate::data::{EngineHandle, FeedEvent, FeedMode, FeedSnapshot, FeedSpec};
use crate::editor::{
    reduce, CoordinatorEvent, EditorAction, EditorCoordinator, EditorSession,
};
use crate::grid::{self, EguiGridSurface, GridSurface};
use crate::model::{Dashboard, Widget, WidgetGeometry, WidgetId};
use crate::registry::{dispatch, WidgetTypeRegistry};
use crate::widgets::{parse_hex_color, WidgetAction, WidgetContext, WidgetView};

/// Outcome of one device command, routed back to the issuing widget
type CommandOutcome = (WidgetId, Result<Value, String>);

/// The main application
pub struct DashboardApp {
    session: EditorSession,
    registry: WidgetTypeRegistry,

    coordinator: EditorCoordinator,
    coordinator_rx: Receiver<CoordinatorEvent>,

    engine: EngineHandle,
    commands: Arc<dyn DeviceCommandApi>,
    runtime: tokio::runtime::Handle,

    grid: EguiGridSurface,
    views: HashMap<WidgetId, Box<dyn WidgetView>>,
    snapshots: HashMap<WidgetId, FeedSnapshot>,
    open_feeds: HashMap<WidgetId, FeedSpec>,

    command_tx: Sender<CommandOutcome>,
    command_rx: Receiver<CommandOutcome>,

    /// Editor actions produced while rendering, applied after the frame
    pending_actions: Vec<EditorAction>,

    config: AppConfig,
    app_state: AppState,
    dashboard_path: Option<PathBuf>,
    last_error: Option<String>,
}

impl DashboardApp {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: AppConfig,
        app_state: AppState,
        store: Arc<dyn DashboardStore>,
        commands: Arc<dyn DeviceCommandApi>,
        engine: EngineHandle,
        runtime: tokio::runtime::Handle,
        initial: Option<Dashboard>,
    ) -> Self {
        let (coordinator, coordinator_rx) = EditorCoordinator::new(store, runtime.clone());
        let (command_tx, command_rx) = unbounded();

        let mut session = EditorSession::new();
        if let Some(dashboard) = initial {
            session = reduce(session, EditorAction::Load(dashboard));
        }

        Self {
            session,
            registry: WidgetTypeRegistry::new(),
            coordinator,
            coordinator_rx,
            engine,
            commands,
            runtime,
            grid: EguiGridSurface::new(),
            views: HashMap::new(),
            snapshots: HashMap::new(),
            open_feeds: HashMap::new(),
            command_tx,
            command_rx,
            pending_actions: Vec::new(),
            config,
            app_state,
            dashboard_path: None,
            last_error: None,
        }
    }

    fn apply(&mut self, action: EditorAction) {
        self.session = reduce(std::mem::take(&mut self.session), action);
    }

    // ==================== Channel draining ====================

    fn drain_channels(&mut self) {
        while let Ok(event) = self.coordinator_rx.try_recv() {
            match event {
                CoordinatorEvent::Apply(action) => self.apply(action),
                CoordinatorEvent::Error(message) => self.last_error = Some(message),
            }
        }

        for event in self.engine.drain() {
            match event {
                FeedEvent::Snapshot { feed, snapshot } => {
                    self.snapshots.insert(feed, snapshot);
                }
                FeedEvent::Shutdown => {}
            }
        }

        while let Ok((widget_id, result)) = self.command_rx.try_recv() {
            if let Some(view) = self.views.get_mut(&widget_id) {
                view.command_result(result);
            }
        }
    }

    // ==================== Feed reconciliation ====================

    fn desired_spec(&self, widget: &Widget) -> FeedSpec {
        let document_timewindow = self
            .session
            .document
            .as_ref()
            .and_then(|d| d.configuration.timewindow);
        FeedSpec {
            datasources: widget.config.datasources.clone(),
            timewindow: widget.config.timewindow.or(document_timewindow),
            mode: if self.config.use_streaming {
                FeedMode::Streaming
            } else {
                FeedMode::Polling {
                    interval: std::time::Duration::from_millis(self.config.poll_interval_ms),
                }
            },
        }
    }

    /// Open feeds for new widgets, close feeds for removed ones, and
    /// re-open any whose datasources, timewindow or mode changed.
    fn sync_feeds(&mut self) {
        let desired: HashMap<WidgetId, FeedSpec> = match &self.session.document {
            Some(document) => document
                .configuration
                .widgets
                .values()
                .map(|w| (w.id.clone(), self.desired_spec(w)))
                .collect(),
            None => HashMap::new(),
        };

        let stale: Vec<WidgetId> = self
            .open_feeds
            .keys()
            .filter(|id| !desired.contains_key(*id))
            .cloned()
            .collect();
        for id in stale {
            self.engine.close_feed(id.clone());
            self.open_feeds.remove(&id);
            self.snapshots.remove(&id);
            self.views.remove(&id);
        }

        for (id, spec) in desired {
            if self.open_feeds.get(&id) != Some(&spec) {
                self.engine.open_feed(id.clone(), spec.clone());
                self.open_feeds.insert(id, spec);
            }
        }
    }

    /// Make sure every widget has a view of its resolved type
    fn sync_views(&mut self) {
        let Some(document) = self.session.document.as_ref() else {
            self.views.clear();
            return;
        };

        for widget in document.configuration.widgets.values() {
            let resolved = dispatch::resolve(&self.registry, widget)
                .type_key()
                .unwrap_or("unknown");
            let needs_new = self
                .views
                .get(&widget.id)
                .map(|view| view.type_key() != resolved)
                .unwrap_or(true);
            if needs_new {
                self.views.insert(
                    widget.id.clone(),
                    dispatch::create_view(&self.registry, widget),
                );
            }
        }
    }

    // ==================== Commands ====================

    fn send_command(&self, widget_id: WidgetId, action: WidgetAction) {
        let WidgetAction::SendCommand {
            device_id,
            request,
            two_way,
        } = action;

        let commands = self.commands.clone();
        let outcome_tx = self.command_tx.clone();
        self.runtime.spawn(async move {
            let result = commands
                .send_command(&device_id, &request, two_way)
                .await
                .map_err(|e| e.to_string());
            let _ = outcome_tx.send((widget_id, result));
        });
    }

    // ==================== Widget management ====================

    /// Place a new widget from the palette below everything else
    fn add_widget_from_palette(&mut self, palette_index: usize) {
        // Registry metadata is 'static, so copy it out before mutating
        let Some(info) = self.registry.all().get(palette_index) else {
            return;
        };
        let (category, label, type_key) = (info.category, info.label, info.type_key);
        let (size_x, size_y) = info.default_size;

        let Some(document) = self.session.document.as_ref() else {
            return;
        };
        let next_row = document
            .configuration
            .widgets
            .values()
            .map(|w| w.geometry.row + w.geometry.size_y)
            .max()
            .unwrap_or(0);

        let mut widget = Widget::new(
            category,
            label,
            WidgetGeometry::new(0, next_row, size_x, size_y),
        );
        widget.config.settings = serde_json::json!({ "widgetType": type_key });

        let id = widget.id.clone();
        self.apply(EditorAction::AddWidget(widget));
        self.apply(EditorAction::SelectWidget(Some(id)));
    }

    // ==================== Dashboard files ====================

    fn open_dashboard_file(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Dashboard", &["json"])
            .pick_file()
        else {
            return;
        };
        match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|content| serde_json::from_str::<Dashboard>(&content).map_err(|e| e.to_string()))
        {
            Ok(dashboard) => {
                self.app_state.add_recent_dashboard(&path, &dashboard.title);
                if let Err(e) = self.app_state.save() {
                    tracing::warn!("Failed to persist app state: {}", e);
                }
                self.dashboard_path = Some(path);
                self.apply(EditorAction::Load(dashboard));
            }
            Err(e) => {
                self.last_error = Some(format!("Failed to open dashboard: {}", e));
            }
        }
    }

    fn save_dashboard_file(&mut self) {
        let Some(document) = self.session.document.clone() else {
            return;
        };
        let path = self.dashboard_path.clone().or_else(|| {
            rfd::FileDialog::new()
                .add_filter("Dashboard", &["json"])
                .set_file_name(format!("{}.json", document.title))
                .save_file()
        });
        let Some(path) = path else { return };

        match serde_json::to_string_pretty(&document)
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(&path, json).map_err(|e| e.to_string()))
        {
            Ok(()) => {
                self.app_state.add_recent_dashboard(&path, &document.title);
                if let Err(e) = self.app_state.save() {
                    tracing::warn!("Failed to persist app state: {}", e);
                }
                self.dashboard_path = Some(path);
            }
            Err(e) => {
                self.last_error = Some(format!("Failed to save dashboard: {}", e));
            }
        }
    }

    // ==================== Toolbar ====================

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.menu_button("File", |ui| {
                if ui.button("New Dashboard").clicked() {
                    self.dashboard_path = None;
                    self.pending_actions
                        .push(EditorAction::Load(Dashboard::new_empty("New Dashboard")));
                    ui.close();
                }
                if ui.button("Open…").clicked() {
                    self.open_dashboard_file();
                    ui.close();
                }
                if ui.button("Save to File").clicked() {
                    self.save_dashboard_file();
                    ui.close();
                }
                if !self.app_state.recent_dashboards.is_empty() {
                    ui.separator();
                    let recents = self.app_state.recent_dashboards.clone();
                    for recent in recents {
                        if ui.button(&recent.title).clicked() {
                            if let Ok(content) = std::fs::read_to_string(&recent.path) {
                                if let Ok(dashboard) =
                                    serde_json::from_str::<Dashboard>(&content)
                                {
                                    self.dashboard_path = Some(recent.path.clone());
                                    self.pending_actions.push(EditorAction::Load(dashboard));
                                }
                            }
                            ui.close();
                        }
                    }
                }
            });

            ui.separator();

            match &self.session.document {
                Some(document) => {
                    let mut title = RichText::new(&document.title).strong();
                    if self.session.is_dirty {
                        title = RichText::new(format!("{} ●", document.title)).strong();
                    }
                    ui.label(title);
                }
                None => {
                    ui.label(RichText::new("No dashboard loaded").weak());
                }
            }

            ui.separator();

            let has_document = self.session.has_document();
            if self.session.is_editing {
                if ui.button("Done").clicked() {
                    self.pending_actions.push(EditorAction::ExitEdit);
                }

                ui.menu_button("Add Widget", |ui| {
                    let mut chosen: Option<usize> = None;
                    for (index, info) in self.registry.all().iter().enumerate() {
                        if ui.button(info.label).on_hover_text(info.description).clicked() {
                            chosen = Some(index);
                            ui.close();
                        }
                    }
                    if let Some(index) = chosen {
                        self.add_widget_from_palette(index);
                    }
                });

                let save = ui.add_enabled(
                    self.session.is_dirty && !self.session.save_in_flight,
                    egui::Button::new("Save"),
                );
                if save.clicked() {
                    self.coordinator.request_save(&self.session);
                }
                if self.session.save_in_flight {
                    ui.label(RichText::new("Saving…").weak());
                }

                let revert =
                    ui.add_enabled(self.session.is_dirty, egui::Button::new("Revert"));
                if revert.clicked() {
                    self.pending_actions.push(EditorAction::Revert);
                }
            } else if ui.add_enabled(has_document, egui::Button::new("Edit")).clicked() {
                self.pending_actions.push(EditorAction::EnterEdit);
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let mut streaming = self.config.use_streaming;
                if ui.checkbox(&mut streaming, "Streaming").changed() {
                    self.config.use_streaming = streaming;
                }
            });
        });
    }

    // ==================== Grid ====================

    fn render_widget_cell(&mut self, id: &WidgetId, ui: &mut egui::Ui) {
        let Some(document) = self.session.document.as_ref() else {
            return;
        };
        let Some(widget) = document.widget(id) else {
            return;
        };

        if let Some(color) = widget
            .config
            .background_color
            .as_deref()
            .and_then(parse_hex_color)
        {
            ui.painter().rect_filled(ui.max_rect(), 4.0, color);
        }

        let editing = self.session.is_editing;
        let selected = self.session.selected_widget.as_ref() == Some(id);

        if widget.config.show_title || editing {
            ui.horizontal(|ui| {
                let mut title = RichText::new(&widget.title).small().strong();
                if selected {
                    title = title.color(ui.visuals().hyperlink_color);
                }
                if ui.add(egui::Label::new(title).sense(egui::Sense::click())).clicked() {
                    self.pending_actions
                        .push(EditorAction::SelectWidget(Some(id.clone())));
                }
                if editing {
                    ui.with_layout(
                        egui::Layout::right_to_left(egui::Align::Center),
                        |ui| {
                            if ui.small_button("✕").clicked() {
                                self.pending_actions
                                    .push(EditorAction::RemoveWidget(id.clone()));
                            }
                        },
                    );
                }
            });
            ui.separator();
        }

        let snapshot = self.snapshots.get(id).cloned().unwrap_or_default();
        let ctx = WidgetContext {
            widget,
            snapshot: &snapshot,
            editing,
        };

        let actions = match self.views.get_mut(id) {
            Some(view) => view.render(&ctx, ui),
            None => Vec::new(),
        };
        for action in actions {
            self.send_command(id.clone(), action);
        }
    }

    fn grid_area(&mut self, ui: &mut egui::Ui) {
        let Some(document) = self.session.document.as_ref() else {
            ui.vertical_centered(|ui| {
                ui.add_space(80.0);
                if self.session.loading {
                    ui.add(egui::Spinner::new());
                    ui.label("Loading dashboard…");
                } else {
                    ui.label("Open a dashboard or create a new one to get started.");
                }
            });
            return;
        };

        let items = grid::layout_items(document);
        let settings = document.configuration.grid_settings();
        let editing = self.session.is_editing;

        if items.is_empty() {
            let message = if editing {
                "Use \"Add Widget\" to get started"
            } else {
                "This dashboard has no widgets. Click Edit to add widgets."
            };
            ui.vertical_centered(|ui| {
                ui.add_space(80.0);
                ui.label(RichText::new(message).weak());
            });
            return;
        }

        let mut grid = std::mem::take(&mut self.grid);
        let reported = egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                grid.show(ui, &settings, &items, editing, &mut |id, ui| {
                    self.render_widget_cell(id, ui)
                })
            })
            .inner;
        self.grid = grid;

        if let Some(reported) = reported {
            if let Some(action) = grid::geometry_changes(&self.session, &reported) {
                self.pending_actions.push(action);
            }
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_channels();
        self.sync_feeds();
        self.sync_views();

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.toolbar(ui);
        });

        if let Some(error) = self.last_error.clone() {
            egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(egui::Color32::from_rgb(0xd0, 0x3a, 0x3a), &error);
                    if ui.small_button("Dismiss").clicked() {
                        self.last_error = None;
                    }
                });
            });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.grid_area(ui);
        });

        let pending = std::mem::take(&mut self.pending_actions);
        for action in pending {
            self.apply(action);
        }

        // Keep snapshots flowing even without input events
        ctx.request_repaint_after(std::time::Duration::from_millis(250));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Err(e) = self.app_state.save() {
            tracing::warn!("Failed to persist app state on exit: {}", e);
        }
        self.engine.shutdown();
    }
}
