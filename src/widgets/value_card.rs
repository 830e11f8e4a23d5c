//! Value card — a single large latest value

use egui::{RichText, Ui};

use crate::model::settings::type_keys;
use crate::model::WidgetSettings;
use crate::widgets::{
    empty_placeholder, format_value, loading_placeholder, parse_hex_color, WidgetAction,
    WidgetContext, WidgetView,
};

#[derive(Default)]
pub struct ValueCardView;

impl WidgetView for ValueCardView {
    fn type_key(&self) -> &'static str {
        type_keys::VALUE_CARD
    }

    fn render(&mut self, ctx: &WidgetContext<'_>, ui: &mut Ui) -> Vec<WidgetAction> {
        let snapshot = ctx.snapshot;
        if snapshot.loading && snapshot.entries.is_empty() {
            loading_placeholder(ui);
            return Vec::new();
        }

        let settings = match WidgetSettings::for_widget(self.type_key(), ctx.widget) {
            WidgetSettings::ValueCard(s) => s,
            _ => Default::default(),
        };

        let Some(entry) = snapshot.entries.first() else {
            empty_placeholder(ui, "No datasource configured");
            return Vec::new();
        };

        let display = entry
            .latest()
            .map(|p| format_value(&p.value, settings.decimals))
            .unwrap_or_else(|| "--".to_string());

        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() / 4.0);
            let mut text = RichText::new(&display).size(32.0).strong();
            if let Some(color) = ctx
                .widget
                .config
                .color
                .as_deref()
                .and_then(parse_hex_color)
            {
                text = text.color(color);
            }
            ui.horizontal_wrapped(|ui| {
                ui.label(text);
                if !settings.units.is_empty() {
                    ui.label(RichText::new(&settings.units).size(18.0).weak());
                }
            });
            ui.label(RichText::new(&entry.label).weak());
        });

        Vec::new()
    }
}
