//! Map widget — device positions resolved from latest values
//!
//! The full tile-based map backend is outside this crate; positions are
//! plotted on a plain coordinate plane, which keeps the key-resolution
//! contract (`latitudeKey`/`longitudeKey`/`labelKey`) intact.

use egui::Ui;
use egui_plot::{MarkerShape, Plot, PlotPoints, Points};

use crate::data::FeedSnapshot;
use crate::model::settings::{type_keys, MapSettings};
use crate::model::WidgetSettings;
use crate::widgets::{
    empty_placeholder, loading_placeholder, WidgetAction, WidgetContext, WidgetView,
};

/// A resolved marker position
#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    pub latitude: f64,
    pub longitude: f64,
    pub label: String,
}

/// Resolve the marker from the most recent values of the matching keys
pub fn resolve_marker(settings: &MapSettings, snapshot: &FeedSnapshot) -> Option<MapMarker> {
    let latitude = snapshot.latest_f64(&settings.latitude_key)?;
    let longitude = snapshot.latest_f64(&settings.longitude_key)?;
    let label = settings
        .label_key
        .as_deref()
        .and_then(|key| snapshot.latest_value(key))
        .unwrap_or("Device")
        .to_string();
    Some(MapMarker {
        latitude,
        longitude,
        label,
    })
}

#[derive(Default)]
pub struct MapView;

impl WidgetView for MapView {
    fn type_key(&self) -> &'static str {
        type_keys::MAP
    }

    fn render(&mut self, ctx: &WidgetContext<'_>, ui: &mut Ui) -> Vec<WidgetAction> {
        let snapshot = ctx.snapshot;
        if snapshot.loading && snapshot.entries.is_empty() {
            loading_placeholder(ui);
            return Vec::new();
        }

        let settings = match WidgetSettings::for_widget(self.type_key(), ctx.widget) {
            WidgetSettings::Map(s) => s,
            _ => Default::default(),
        };

        let Some(marker) = resolve_marker(&settings, snapshot) else {
            empty_placeholder(ui, "No position data");
            return Vec::new();
        };

        Plot::new(("map", ctx.widget.id.as_str()))
            .allow_drag(!ctx.editing)
            .allow_zoom(!ctx.editing)
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                let points = Points::new(
                    marker.label.clone(),
                    PlotPoints::from(vec![[marker.longitude, marker.latitude]]),
                )
                .shape(MarkerShape::Circle)
                .radius(6.0);
                plot_ui.points(points);
            });

        Vec::new()
    }
}
