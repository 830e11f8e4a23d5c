//! Time-series chart widget using egui_plot

use egui::Ui;
use egui_plot::{Legend, Line, Plot, PlotPoints};

use crate::model::settings::type_keys;
use crate::model::WidgetSettings;
use crate::widgets::{
    empty_placeholder, loading_placeholder, WidgetAction, WidgetContext, WidgetView,
};

#[derive(Default)]
pub struct TimeseriesChartView;

impl WidgetView for TimeseriesChartView {
    fn type_key(&self) -> &'static str {
        type_keys::TIMESERIES_CHART
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
            WidgetSettings::TimeseriesChart(s) => s,
            _ => Default::default(),
        };

        let mut plot = Plot::new(("timeseries_chart", ctx.widget.id.as_str()))
            .allow_drag(!ctx.editing)
            .allow_zoom(!ctx.editing)
            .allow_scroll(false);
        if settings.show_legend {
            plot = plot.legend(Legend::default());
        }

        plot.show(ui, |plot_ui| {
            for entry in &snapshot.entries {
                let points: Vec<[f64; 2]> = entry
                    .values
                    .iter()
                    .filter_map(|p| p.as_f64().map(|v| [p.ts as f64 / 1000.0, v]))
                    .collect();
                if points.is_empty() {
                    continue;
                }
                let line =
                    Line::new(entry.label.clone(), PlotPoints::from(points)).width(settings.line_width);
                plot_ui.line(line);
            }
        });

        Vec::new()
    }
}
