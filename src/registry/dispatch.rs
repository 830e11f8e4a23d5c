//! Renderer dispatch — type-driven resolution with graceful fallback
//!
//! Resolution order, first match wins:
//!
//! 1. the explicit `widgetType` key in the widget's settings bag
//! 2. the legacy fully-qualified type identifier (`typeFullFqn`)
//! 3. the canonical type of the widget's coarse category
//!
//! Stale persisted configuration may reference types the registry no
//! longer carries; when every tier misses, dispatch yields the
//! identifiers it tried so the placeholder can report them. This path
//! never fails.

use crate::model::settings::type_keys;
use crate::model::{Widget, WidgetCategory};
use crate::registry::{WidgetTypeInfo, WidgetTypeRegistry};
use crate::widgets::{PlaceholderView, WidgetView};

/// The canonical type key rendered for a category when nothing else matches
pub fn category_default(category: WidgetCategory) -> &'static str {
    match category {
        WidgetCategory::Latest => type_keys::VALUE_CARD,
        WidgetCategory::Timeseries => type_keys::TIMESERIES_CHART,
        WidgetCategory::Alarm => type_keys::ALARM_TABLE,
        WidgetCategory::Rpc => type_keys::RPC_BUTTON,
        WidgetCategory::Static => type_keys::LABEL,
    }
}

/// Outcome of dispatch resolution
pub enum Resolved<'r> {
    /// A registered capability was found
    Known(&'r WidgetTypeInfo),
    /// Nothing matched; carries every identifier that was tried
    Unknown { attempted: Vec<String> },
}

impl<'r> Resolved<'r> {
    pub fn type_key(&self) -> Option<&'static str> {
        match self {
            Resolved::Known(info) => Some(info.type_key),
            Resolved::Unknown { .. } => None,
        }
    }
}

/// Resolve a widget to its rendering capability
pub fn resolve<'r>(registry: &'r WidgetTypeRegistry, widget: &Widget) -> Resolved<'r> {
    let mut attempted = Vec::new();

    if let Some(key) = widget.explicit_type_key() {
        if !key.is_empty() {
            if let Some(info) = registry.get(key) {
                return Resolved::Known(info);
            }
            attempted.push(key.to_string());
        }
    }

    if let Some(fqn) = widget.type_full_fqn.as_deref() {
        if !fqn.is_empty() {
            if let Some(info) = registry.get(fqn) {
                return Resolved::Known(info);
            }
            attempted.push(fqn.to_string());
        }
    }

    let fallback = category_default(widget.category);
    if let Some(info) = registry.get(fallback) {
        return Resolved::Known(info);
    }
    attempted.push(fallback.to_string());

    Resolved::Unknown { attempted }
}

/// Resolve and instantiate the view, degrading to the placeholder
pub fn create_view(registry: &WidgetTypeRegistry, widget: &Widget) -> Box<dyn WidgetView> {
    match resolve(registry, widget) {
        Resolved::Known(info) => (info.factory)(),
        Resolved::Unknown { attempted } => {
            tracing::warn!(
                "No renderer for widget '{}' (tried {:?}), using placeholder",
                widget.id,
                attempted
            );
            Box::new(PlaceholderView::new(attempted))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{WidgetGeometry, WidgetId};
    use serde_json::json;

    fn widget(category: WidgetCategory) -> Widget {
        let mut widget = Widget::new(category, "w", WidgetGeometry::new(0, 0, 4, 3));
        widget.id = WidgetId::from("w1");
        widget
    }

    #[test]
    fn test_explicit_type_key_wins() {
        let registry = WidgetTypeRegistry::new();
        let mut w = widget(WidgetCategory::Timeseries);
        w.config.settings = json!({"widgetType": "value_card"});

        match resolve(&registry, &w) {
            Resolved::Known(info) => assert_eq!(info.type_key, "value_card"),
            Resolved::Unknown { .. } => panic!("expected direct resolution"),
        }
    }

    #[test]
    fn test_fqn_used_when_explicit_key_unknown() {
        let registry = WidgetTypeRegistry::new();
        let mut w = widget(WidgetCategory::Latest);
        w.config.settings = json!({"widgetType": "retired_type"});
        w.type_full_fqn = Some("gauge".to_string());

        match resolve(&registry, &w) {
            Resolved::Known(info) => assert_eq!(info.type_key, "gauge"),
            Resolved::Unknown { .. } => panic!("expected fqn resolution"),
        }
    }

    #[test]
    fn test_category_fallback_for_garbage_type() {
        let registry = WidgetTypeRegistry::new();
        let mut w = widget(WidgetCategory::Timeseries);
        w.config.settings = json!({"widgetType": "???"});

        match resolve(&registry, &w) {
            Resolved::Known(info) => assert_eq!(info.type_key, "timeseries_chart"),
            Resolved::Unknown { .. } => panic!("expected category fallback"),
        }
    }

    #[test]
    fn test_empty_type_key_skips_to_fallback() {
        let registry = WidgetTypeRegistry::new();
        let mut w = widget(WidgetCategory::Rpc);
        w.config.settings = json!({"widgetType": ""});

        assert_eq!(resolve(&registry, &w).type_key(), Some("rpc_button"));
    }

    #[test]
    fn test_placeholder_when_nothing_matches() {
        // A registry stripped of everything the widget could resolve to
        let registry = WidgetTypeRegistry::from_entries(Vec::new());
        let mut w = widget(WidgetCategory::Alarm);
        w.config.settings = json!({"widgetType": "gone"});
        w.type_full_fqn = Some("also.gone".to_string());

        match resolve(&registry, &w) {
            Resolved::Unknown { attempted } => {
                assert_eq!(attempted, ["gone", "also.gone", "alarm_table"]);
            }
            Resolved::Known(_) => panic!("expected placeholder"),
        }

        // And the view path degrades without failing
        let view = create_view(&registry, &w);
        assert_eq!(view.type_key(), "unknown");
    }

    #[test]
    fn test_every_category_has_a_registered_default() {
        let registry = WidgetTypeRegistry::new();
        for category in [
            WidgetCategory::Latest,
            WidgetCategory::Timeseries,
            WidgetCategory::Alarm,
            WidgetCategory::Rpc,
            WidgetCategory::Static,
        ] {
            assert!(registry.get(category_default(category)).is_some());
        }
    }
}
