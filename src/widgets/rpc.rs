//! Command-capable widgets: RPC button, toggle switch, slider
//!
//! These views issue device commands through the external command API
//! using the first datasource's device id. Failures are reported inline
//! inside the widget — a failed command never crashes the dashboard.

use egui::{Color32, RichText, Ui};
use serde_json::{json, Value};

use crate::api::RpcRequest;
use crate::model::settings::type_keys;
use crate::model::WidgetSettings;
use crate::widgets::{is_truthy, WidgetAction, WidgetContext, WidgetView};

fn inline_error(ui: &mut Ui, error: &Option<String>) {
    if let Some(message) = error {
        ui.colored_label(Color32::from_rgb(0xd0, 0x3a, 0x3a), RichText::new(message).small());
    }
}

// ==================== RPC button ====================

#[derive(Default)]
pub struct RpcButtonView {
    sending: bool,
    last_error: Option<String>,
}

impl WidgetView for RpcButtonView {
    fn type_key(&self) -> &'static str {
        type_keys::RPC_BUTTON
    }

    fn render(&mut self, ctx: &WidgetContext<'_>, ui: &mut Ui) -> Vec<WidgetAction> {
        let settings = match WidgetSettings::for_widget(self.type_key(), ctx.widget) {
            WidgetSettings::RpcButton(s) => s,
            _ => Default::default(),
        };

        let device_id = ctx.widget.primary_device_id().map(|s| s.to_string());
        let label = if settings.button_label.is_empty() {
            "Send"
        } else {
            settings.button_label.as_str()
        };

        let mut actions = Vec::new();
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() / 4.0);
            let enabled = device_id.is_some() && !self.sending && !ctx.editing;
            let button = ui.add_enabled(enabled, egui::Button::new(label));
            if button.clicked() {
                if let Some(device_id) = device_id {
                    self.sending = true;
                    self.last_error = None;
                    actions.push(WidgetAction::SendCommand {
                        device_id,
                        request: RpcRequest {
                            method: settings.rpc_method.clone(),
                            params: settings.rpc_params.clone().unwrap_or_else(|| json!({})),
                        },
                        two_way: settings.two_way_rpc,
                    });
                }
            }
            if self.sending {
                ui.label(RichText::new("Sending…").weak().small());
            }
            inline_error(ui, &self.last_error);
        });

        actions
    }

    fn command_result(&mut self, result: Result<Value, String>) {
        self.sending = false;
        if let Err(message) = result {
            self.last_error = Some(message);
        }
    }
}

// ==================== Toggle switch ====================

#[derive(Default)]
pub struct ToggleView {
    sending: bool,
    /// Optimistic state shown until telemetry confirms it
    pending: Option<bool>,
    last_error: Option<String>,
}

impl WidgetView for ToggleView {
    fn type_key(&self) -> &'static str {
        type_keys::TOGGLE
    }

    fn render(&mut self, ctx: &WidgetContext<'_>, ui: &mut Ui) -> Vec<WidgetAction> {
        let settings = match WidgetSettings::for_widget(self.type_key(), ctx.widget) {
            WidgetSettings::Toggle(s) => s,
            _ => Default::default(),
        };

        let entry = ctx.snapshot.entries.first();
        let reported = entry
            .and_then(|e| e.latest())
            .map(|p| is_truthy(&p.value))
            .unwrap_or(false);

        // Telemetry caught up with the optimistic state
        if self.pending == Some(reported) {
            self.pending = None;
        }
        let mut checked = self.pending.unwrap_or(reported);

        let label = if !settings.switch_label.is_empty() {
            settings.switch_label.clone()
        } else {
            entry.map(|e| e.label.clone()).unwrap_or_else(|| "Toggle".to_string())
        };
        let rpc_key = settings
            .rpc_key
            .clone()
            .or_else(|| entry.map(|e| e.key.clone()))
            .unwrap_or_else(|| "value".to_string());
        let device_id = ctx.widget.primary_device_id().map(|s| s.to_string());

        let mut actions = Vec::new();
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() / 4.0);
            ui.label(RichText::new(&label).weak());

            let enabled = device_id.is_some() && !self.sending && !ctx.editing;
            let response = ui.add_enabled(enabled, egui::Checkbox::without_text(&mut checked));
            if response.changed() {
                if let Some(device_id) = device_id {
                    self.sending = true;
                    self.pending = Some(checked);
                    self.last_error = None;
                    actions.push(WidgetAction::SendCommand {
                        device_id,
                        request: RpcRequest {
                            method: settings.rpc_method.clone(),
                            params: json!({ rpc_key: checked }),
                        },
                        two_way: settings.two_way_rpc,
                    });
                }
            }

            let (color, text) = if checked {
                (Color32::from_rgb(0x2e, 0xcc, 0x71), "ON")
            } else {
                (Color32::GRAY, "OFF")
            };
            ui.colored_label(color, RichText::new(text).small());
            inline_error(ui, &self.last_error);
        });

        actions
    }

    fn command_result(&mut self, result: Result<Value, String>) {
        self.sending = false;
        if let Err(message) = result {
            // Roll the optimistic state back
            self.pending = None;
            self.last_error = Some(message);
        }
    }
}

// ==================== Slider ====================

#[derive(Default)]
pub struct SliderView {
    sending: bool,
    /// Local value while the user is interacting
    dragging: Option<f64>,
    last_error: Option<String>,
}

impl WidgetView for SliderView {
    fn type_key(&self) -> &'static str {
        type_keys::SLIDER
    }

    fn render(&mut self, ctx: &WidgetContext<'_>, ui: &mut Ui) -> Vec<WidgetAction> {
        let settings = match WidgetSettings::for_widget(self.type_key(), ctx.widget) {
            WidgetSettings::Slider(s) => s,
            _ => Default::default(),
        };

        let entry = ctx.snapshot.entries.first();
        let reported = entry
            .and_then(|e| e.latest())
            .and_then(|p| p.as_f64())
            .unwrap_or(settings.min_value);
        let mut value = self.dragging.unwrap_or(reported);

        let rpc_key = settings
            .rpc_key
            .clone()
            .or_else(|| entry.map(|e| e.key.clone()))
            .unwrap_or_else(|| "value".to_string());
        let device_id = ctx.widget.primary_device_id().map(|s| s.to_string());

        let min = settings.min_value;
        let max = settings.max_value.max(min + f64::EPSILON);

        let mut actions = Vec::new();
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() / 4.0);
            if let Some(entry) = entry {
                ui.label(RichText::new(&entry.label).weak());
            }

            let enabled = device_id.is_some() && !self.sending && !ctx.editing;
            let response = ui.add_enabled(enabled, egui::Slider::new(&mut value, min..=max));

            if response.dragged() || response.has_focus() {
                self.dragging = Some(value);
            }
            if response.drag_stopped() {
                self.dragging = None;
                if let Some(device_id) = device_id {
                    self.sending = true;
                    self.last_error = None;
                    actions.push(WidgetAction::SendCommand {
                        device_id,
                        request: RpcRequest {
                            method: settings.rpc_method.clone(),
                            params: json!({ rpc_key: value }),
                        },
                        two_way: settings.two_way_rpc,
                    });
                }
            }
            inline_error(ui, &self.last_error);
        });

        actions
    }

    fn command_result(&mut self, result: Result<Value, String>) {
        self.sending = false;
        if let Err(message) = result {
            self.last_error = Some(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_keys() {
        assert_eq!(RpcButtonView::default().type_key(), "rpc_button");
        assert_eq!(ToggleView::default().type_key(), "toggle");
        assert_eq!(SliderView::default().type_key(), "slider");
    }

    #[test]
    fn test_command_failure_reported_inline() {
        let mut view = ToggleView {
            sending: true,
            pending: Some(true),
            last_error: None,
        };
        view.command_result(Err("device unreachable".to_string()));
        assert!(!view.sending);
        assert!(view.pending.is_none());
        assert_eq!(view.last_error.as_deref(), Some("device unreachable"));
    }

    #[test]
    fn test_command_success_clears_sending() {
        let mut view = RpcButtonView {
            sending: true,
            last_error: Some("old".to_string()),
        };
        view.command_result(Ok(serde_json::json!({"success": true})));
        assert!(!view.sending);
        // A stale error stays until the next send clears it
        assert!(view.last_error.is_some());
    }
}
