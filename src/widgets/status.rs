//! Status indicator — online/offline dot from the latest value

use egui::{Color32, RichText, Ui};

use crate::model::settings::type_keys;
use crate::model::WidgetSettings;
use crate::widgets::{
    empty_placeholder, is_truthy, loading_placeholder, WidgetAction, WidgetContext, WidgetView,
};

#[derive(Default)]
pub struct StatusView;

impl WidgetView for StatusView {
    fn type_key(&self) -> &'static str {
        type_keys::STATUS
    }

    fn render(&mut self, ctx: &WidgetContext<'_>, ui: &mut Ui) -> Vec<WidgetAction> {
        let snapshot = ctx.snapshot;
        if snapshot.loading && snapshot.entries.is_empty() {
            loading_placeholder(ui);
            return Vec::new();
        }

        let settings = match WidgetSettings::for_widget(self.type_key(), ctx.widget) {
            WidgetSettings::Status(s) => s,
            _ => Default::default(),
        };

        let Some(entry) = snapshot.entries.first() else {
            empty_placeholder(ui, "No datasource configured");
            return Vec::new();
        };

        let online = entry.latest().map(|p| match &settings.online_value {
            Some(expected) => p.value == *expected,
            None => is_truthy(&p.value),
        });

        let (color, text) = match online {
            Some(true) => (Color32::from_rgb(0x2e, 0xcc, 0x71), "Online"),
            Some(false) => (Color32::GRAY, "Offline"),
            None => (Color32::DARK_GRAY, "Unknown"),
        };

        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() / 4.0);
            let (rect, _) =
                ui.allocate_exact_size(egui::vec2(24.0, 24.0), egui::Sense::hover());
            ui.painter().circle_filled(rect.center(), 10.0, color);
            ui.label(RichText::new(text).strong());
            ui.label(RichText::new(&entry.label).weak());
        });

        Vec::new()
    }
}
