//! Table widgets — key/value table of latest values, alarm table

use chrono::TimeZone;
use egui::{RichText, Ui};

use crate::model::settings::type_keys;
use crate::model::WidgetSettings;
use crate::widgets::{
    empty_placeholder, loading_placeholder, WidgetAction, WidgetContext, WidgetView,
};

fn format_ts(ts: i64) -> String {
    chrono::Utc
        .timestamp_millis_opt(ts)
        .single()
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}

// ==================== Simple table ====================

#[derive(Default)]
pub struct SimpleTableView;

impl WidgetView for SimpleTableView {
    fn type_key(&self) -> &'static str {
        type_keys::SIMPLE_TABLE
    }

    fn render(&mut self, ctx: &WidgetContext<'_>, ui: &mut Ui) -> Vec<WidgetAction> {
        let snapshot = ctx.snapshot;
        if snapshot.loading && snapshot.entries.is_empty() {
            loading_placeholder(ui);
            return Vec::new();
        }
        if snapshot.entries.is_empty() {
            empty_placeholder(ui, "No datasource configured");
            return Vec::new();
        }

        let settings = match WidgetSettings::for_widget(self.type_key(), ctx.widget) {
            WidgetSettings::SimpleTable(s) => s,
            _ => Default::default(),
        };

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                egui::Grid::new(("simple_table", ctx.widget.id.as_str()))
                    .num_columns(if settings.show_timestamp { 3 } else { 2 })
                    .striped(true)
                    .show(ui, |ui| {
                        ui.strong("Key");
                        ui.strong("Value");
                        if settings.show_timestamp {
                            ui.strong("Updated");
                        }
                        ui.end_row();

                        for entry in &snapshot.entries {
                            ui.label(&entry.label);
                            match entry.latest() {
                                Some(point) => {
                                    ui.label(RichText::new(&point.value).monospace());
                                    if settings.show_timestamp {
                                        ui.label(RichText::new(format_ts(point.ts)).weak());
                                    }
                                }
                                None => {
                                    ui.label(RichText::new("--").weak());
                                    if settings.show_timestamp {
                                        ui.label("");
                                    }
                                }
                            }
                            ui.end_row();
                        }
                    });
            });

        Vec::new()
    }
}

// ==================== Alarm table ====================

#[derive(Default)]
pub struct AlarmTableView;

impl WidgetView for AlarmTableView {
    fn type_key(&self) -> &'static str {
        type_keys::ALARM_TABLE
    }

    fn render(&mut self, ctx: &WidgetContext<'_>, ui: &mut Ui) -> Vec<WidgetAction> {
        let snapshot = ctx.snapshot;
        if snapshot.loading && snapshot.entries.is_empty() {
            loading_placeholder(ui);
            return Vec::new();
        }

        let active: Vec<_> = snapshot
            .entries
            .iter()
            .filter(|e| e.latest().is_some())
            .collect();
        if active.is_empty() {
            empty_placeholder(ui, "No active alarms");
            return Vec::new();
        }

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                egui::Grid::new(("alarm_table", ctx.widget.id.as_str()))
                    .num_columns(3)
                    .striped(true)
                    .show(ui, |ui| {
                        ui.strong("Alarm");
                        ui.strong("Status");
                        ui.strong("Time");
                        ui.end_row();

                        for entry in active {
                            let Some(point) = entry.latest() else {
                                continue;
                            };
                            ui.label(&entry.label);
                            ui.label(RichText::new(&point.value).monospace());
                            ui.label(RichText::new(format_ts(point.ts)).weak());
                            ui.end_row();
                        }
                    });
            });

        Vec::new()
    }
}
