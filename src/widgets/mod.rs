//! Per-widget rendering adapters
//!
//! Every registry entry owns one [`WidgetView`] implementation. Views
//! render into an `egui::Ui` with the widget definition and its latest
//! feed snapshot, and return actions for the app to execute — they
//! never perform I/O themselves. Command-capable views receive the
//! outcome of their commands back through [`WidgetView::command_result`]
//! and report failures inline.

pub mod chart;
pub mod gauge;
pub mod label;
pub mod map_view;
pub mod placeholder;
pub mod rpc;
pub mod status;
pub mod table;
pub mod value_card;

use egui::{Color32, Ui};
use serde_json::Value;

use crate::api::RpcRequest;
use crate::data::FeedSnapshot;
use crate::model::Widget;

pub use chart::TimeseriesChartView;
pub use gauge::GaugeView;
pub use label::{LabelView, MarkdownView};
pub use map_view::MapView;
pub use placeholder::PlaceholderView;
pub use rpc::{RpcButtonView, SliderView, ToggleView};
pub use status::StatusView;
pub use table::{AlarmTableView, SimpleTableView};
pub use value_card::ValueCardView;

/// Everything a view needs to draw one frame
pub struct WidgetContext<'a> {
    pub widget: &'a Widget,
    pub snapshot: &'a FeedSnapshot,
    pub editing: bool,
}

/// Side effect requested by a view, executed by the app
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetAction {
    /// Issue a device command through the command API
    SendCommand {
        device_id: String,
        request: RpcRequest,
        two_way: bool,
    },
}

/// One widget rendering capability
pub trait WidgetView {
    /// Registry type key this view renders
    fn type_key(&self) -> &'static str;

    /// Draw one frame; returns actions for the app to execute
    fn render(&mut self, ctx: &WidgetContext<'_>, ui: &mut Ui) -> Vec<WidgetAction>;

    /// Outcome of a command this view issued, reported inline
    fn command_result(&mut self, _result: Result<Value, String>) {}
}

// ==================== Shared helpers ====================

/// Parse `#RRGGBB` / `#RRGGBBAA` into a color
pub fn parse_hex_color(s: &str) -> Option<Color32> {
    let hex = s.strip_prefix('#')?;
    let parse = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        6 => Some(Color32::from_rgb(parse(0)?, parse(2)?, parse(4)?)),
        8 => Some(Color32::from_rgba_unmultiplied(
            parse(0)?,
            parse(2)?,
            parse(4)?,
            parse(6)?,
        )),
        _ => None,
    }
}

/// Format a raw value for display, applying decimals when numeric
pub fn format_value(raw: &str, decimals: u32) -> String {
    match raw.parse::<f64>() {
        Ok(number) => format!("{:.*}", decimals as usize, number),
        Err(_) => raw.to_string(),
    }
}

/// Truthiness rule shared by toggle and status views
pub fn is_truthy(raw: &str) -> bool {
    matches!(raw, "true" | "1" | "on")
}

/// Centered hint while a feed is loading with no data yet
pub fn loading_placeholder(ui: &mut Ui) {
    ui.vertical_centered(|ui| {
        ui.add_space(ui.available_height() / 3.0);
        ui.add(egui::Spinner::new());
    });
}

/// Centered hint for an unconfigured widget
pub fn empty_placeholder(ui: &mut Ui, message: &str) {
    ui.vertical_centered(|ui| {
        ui.add_space(ui.available_height() / 3.0);
        ui.colored_label(Color32::GRAY, message);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#ff0000"), Some(Color32::from_rgb(255, 0, 0)));
        assert_eq!(
            parse_hex_color("#00ff0080"),
            Some(Color32::from_rgba_unmultiplied(0, 255, 0, 128))
        );
        assert_eq!(parse_hex_color("red"), None);
        assert_eq!(parse_hex_color("#12345"), None);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value("21.456", 1), "21.5");
        assert_eq!(format_value("21", 0), "21");
        assert_eq!(format_value("offline", 2), "offline");
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy("true"));
        assert!(is_truthy("1"));
        assert!(is_truthy("on"));
        assert!(!is_truthy("false"));
        assert!(!is_truthy("ON"));
    }
}
