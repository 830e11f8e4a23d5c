//! Gauge — a bounded latest value with threshold colors

use egui::{ProgressBar, RichText, Ui};

use crate::model::settings::type_keys;
use crate::model::WidgetSettings;
use crate::widgets::{
    empty_placeholder, format_value, loading_placeholder, parse_hex_color, WidgetAction,
    WidgetContext, WidgetView,
};

#[derive(Default)]
pub struct GaugeView;

impl WidgetView for GaugeView {
    fn type_key(&self) -> &'static str {
        type_keys::GAUGE
    }

    fn render(&mut self, ctx: &WidgetContext<'_>, ui: &mut Ui) -> Vec<WidgetAction> {
        let snapshot = ctx.snapshot;
        if snapshot.loading && snapshot.entries.is_empty() {
            loading_placeholder(ui);
            return Vec::new();
        }

        let settings = match WidgetSettings::for_widget(self.type_key(), ctx.widget) {
            WidgetSettings::Gauge(s) => s,
            _ => Default::default(),
        };

        let Some(entry) = snapshot.entries.first() else {
            empty_placeholder(ui, "No datasource configured");
            return Vec::new();
        };
        let Some(value) = entry.latest().and_then(|p| p.as_f64()) else {
            empty_placeholder(ui, "No data");
            return Vec::new();
        };

        let span = (settings.max_value - settings.min_value).max(f64::EPSILON);
        let fraction = ((value - settings.min_value) / span).clamp(0.0, 1.0) as f32;

        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() / 4.0);
            ui.horizontal(|ui| {
                ui.label(RichText::new(format_value(
                    &value.to_string(),
                    settings.decimals,
                ))
                .size(24.0)
                .strong());
                if !settings.units.is_empty() {
                    ui.label(RichText::new(&settings.units).weak());
                }
            });

            let mut bar = ProgressBar::new(fraction);
            if let Some(color) = settings.threshold_color(value).and_then(parse_hex_color) {
                bar = bar.fill(color);
            }
            ui.add(bar);

            ui.label(
                RichText::new(format!(
                    "{} … {}",
                    settings.min_value, settings.max_value
                ))
                .small()
                .weak(),
            );
        });

        Vec::new()
    }
}
