//! Neutral placeholder for unresolvable widget types
//!
//! Persisted documents may reference types the registry no longer
//! carries. This view degrades gracefully and reports every identifier
//! that was tried; it must never fail.

use egui::{Color32, RichText, Ui};

use crate::widgets::{WidgetAction, WidgetContext, WidgetView};

pub struct PlaceholderView {
    /// The identifiers dispatch tried, in order
    attempted: Vec<String>,
}

impl PlaceholderView {
    pub fn new(attempted: Vec<String>) -> Self {
        Self { attempted }
    }

    pub fn attempted(&self) -> &[String] {
        &self.attempted
    }
}

impl WidgetView for PlaceholderView {
    fn type_key(&self) -> &'static str {
        "unknown"
    }

    fn render(&mut self, _ctx: &WidgetContext<'_>, ui: &mut Ui) -> Vec<WidgetAction> {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() / 3.0);
            ui.colored_label(Color32::GRAY, "Unknown widget type");
            let attempted = if self.attempted.is_empty() {
                "unspecified".to_string()
            } else {
                self.attempted.join(", ")
            };
            ui.label(RichText::new(attempted).small().weak());
        });
        Vec::new()
    }
}
