//! The pure state-transition function
//!
//! `reduce` is a pure function `(session, action) -> session`; it never
//! performs I/O and never suspends. Content-mutating transitions keep
//! the widget map and the layouts in lockstep and recompute the dirty
//! flag as structural inequality against the baseline, so "dirty iff
//! the document differs from the baseline" holds for every sequence of
//! transitions.

use crate::editor::action::{DocumentPatch, EditorAction};
use crate::editor::session::EditorSession;
use crate::model::dashboard::DashboardConfiguration;
use crate::model::WidgetGeometry;

/// Apply one transition, returning the next session state
pub fn reduce(mut session: EditorSession, action: EditorAction) -> EditorSession {
    match action {
        EditorAction::Load(document) => {
            session.baseline = Some(document.clone());
            session.document = Some(document);
            session.is_dirty = false;
            session.selected_widget = None;
            session.loading = false;
        }

        EditorAction::SetLoading(loading) => {
            session.loading = loading;
        }

        EditorAction::EnterEdit => {
            session.is_editing = true;
        }

        EditorAction::ExitEdit => {
            // The only transition that silently drops unsaved changes:
            // "Edit" un-toggled without an explicit save.
            session.is_editing = false;
            session.document = session.baseline.clone();
            session.is_dirty = false;
            session.selected_widget = None;
        }

        EditorAction::AddWidget(widget) => {
            mutate(&mut session, |config| {
                config.widgets.insert(widget.id.clone(), widget);
            });
        }

        EditorAction::RemoveWidget(id) => {
            let exists = session
                .document
                .as_ref()
                .map(|d| d.configuration.widgets.contains_key(&id))
                .unwrap_or(false);
            if exists && session.selected_widget.as_ref() == Some(&id) {
                session.selected_widget = None;
            }
            mutate(&mut session, |config| {
                config.widgets.remove(&id);
            });
        }

        EditorAction::UpdateWidgetConfig { id, patch } => {
            mutate(&mut session, |config| {
                if let Some(widget) = config.widgets.get_mut(&id) {
                    widget.config.merge_patch(&patch);
                }
            });
        }

        EditorAction::UpdateWidgetTitle { id, title } => {
            mutate(&mut session, |config| {
                if let Some(widget) = config.widgets.get_mut(&id) {
                    widget.title = title;
                }
            });
        }

        EditorAction::UpdateGeometry(changes) => {
            mutate(&mut session, |config| {
                for change in changes {
                    if let Some(widget) = config.widgets.get_mut(&change.id) {
                        widget.geometry =
                            WidgetGeometry::new(change.col, change.row, change.size_x, change.size_y);
                    }
                }
            });
        }

        EditorAction::UpdateDocumentSettings(patch) => {
            mutate(&mut session, |config| apply_patch(config, patch));
        }

        EditorAction::SelectWidget(id) => {
            session.selected_widget = id;
        }

        EditorAction::Revert => {
            session.document = session.baseline.clone();
            session.is_dirty = false;
            session.selected_widget = None;
        }

        EditorAction::SaveStart => {
            session.save_in_flight = true;
        }

        EditorAction::SaveSucceeded(saved) => {
            session.baseline = Some(saved.clone());
            session.document = Some(saved);
            session.is_dirty = false;
            session.save_in_flight = false;
        }

        EditorAction::SaveFailed => {
            // Working copy and dirty flag stay intact so the user can retry
            session.save_in_flight = false;
        }
    }

    session
}

/// Run a content mutation: no-op without a document; afterwards restore
/// the widget/layout lockstep invariant and recompute the dirty flag.
fn mutate(session: &mut EditorSession, f: impl FnOnce(&mut DashboardConfiguration)) {
    let Some(document) = session.document.as_mut() else {
        return;
    };
    f(&mut document.configuration);
    document.configuration.sync_layouts();
    session.is_dirty = session.document != session.baseline;
}

fn apply_patch(config: &mut DashboardConfiguration, patch: DocumentPatch) {
    if let Some(settings) = patch.settings {
        config.settings = settings;
    }
    if let Some(aliases) = patch.entity_aliases {
        config.entity_aliases = aliases;
    }
    if let Some(states) = patch.states {
        config.states = states;
    }
    if let Some(timewindow) = patch.timewindow {
        config.timewindow = timewindow;
    }
    if let Some(description) = patch.description {
        config.description = description;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::action::GeometryChange;
    use crate::model::{
        Dashboard, DashboardSettings, Timewindow, Widget, WidgetCategory, WidgetGeometry, WidgetId,
    };
    use serde_json::json;

    fn widget_with_id(id: &str) -> Widget {
        let mut widget = Widget::new(
            WidgetCategory::Latest,
            format!("Widget {}", id),
            WidgetGeometry::new(0, 0, 4, 3),
        );
        widget.id = WidgetId::from(id);
        widget
    }

    fn loaded_session() -> EditorSession {
        reduce(
            EditorSession::new(),
            EditorAction::Load(Dashboard::new_empty("Test")),
        )
    }

    #[test]
    fn test_load_clears_dirty_and_selection() {
        let mut session = loaded_session();
        session.is_dirty = true;
        session.selected_widget = Some(WidgetId::from("w1"));

        let session = reduce(session, EditorAction::Load(Dashboard::new_empty("Other")));
        assert!(!session.is_dirty);
        assert!(session.selected_widget.is_none());
        assert_eq!(session.document.as_ref().unwrap().title, "Other");
        assert_eq!(session.document, session.baseline);
    }

    #[test]
    fn test_enter_and_exit_edit() {
        let session = reduce(loaded_session(), EditorAction::EnterEdit);
        assert!(session.is_editing);

        let session = reduce(session, EditorAction::ExitEdit);
        assert!(!session.is_editing);
    }

    #[test]
    fn test_exit_edit_discards_all_mutations() {
        let mut session = reduce(loaded_session(), EditorAction::EnterEdit);
        let baseline = session.baseline.clone();

        for i in 0..3 {
            session = reduce(
                session,
                EditorAction::AddWidget(widget_with_id(&format!("w{}", i))),
            );
        }
        session = reduce(
            session,
            EditorAction::UpdateWidgetTitle {
                id: WidgetId::from("w0"),
                title: "Renamed".to_string(),
            },
        );
        assert!(session.is_dirty);

        let session = reduce(session, EditorAction::ExitEdit);
        assert!(!session.is_dirty);
        assert_eq!(session.document, baseline);
    }

    #[test]
    fn test_add_then_remove_restores_structural_equality() {
        let session = loaded_session();
        let before = session.document.clone();

        let widget = widget_with_id("w1");
        let session = reduce(session, EditorAction::AddWidget(widget.clone()));
        assert!(session.is_dirty);

        let session = reduce(session, EditorAction::RemoveWidget(widget.id));
        assert_eq!(session.document, before);
        assert!(!session.is_dirty);
    }

    #[test]
    fn test_remove_widget_clears_selection_and_every_layout() {
        let session = loaded_session();
        let widget = widget_with_id("w1");
        let id = widget.id.clone();

        let session = reduce(session, EditorAction::AddWidget(widget));
        let session = reduce(session, EditorAction::SelectWidget(Some(id.clone())));
        let session = reduce(session, EditorAction::RemoveWidget(id.clone()));

        assert!(session.selected_widget.is_none());
        let config = &session.document.as_ref().unwrap().configuration;
        assert!(!config.any_layout_references(&id));
    }

    #[test]
    fn test_remove_unrelated_widget_keeps_selection() {
        let session = loaded_session();
        let session = reduce(session, EditorAction::AddWidget(widget_with_id("w1")));
        let session = reduce(session, EditorAction::AddWidget(widget_with_id("w2")));
        let session = reduce(
            session,
            EditorAction::SelectWidget(Some(WidgetId::from("w1"))),
        );

        let session = reduce(session, EditorAction::RemoveWidget(WidgetId::from("w2")));
        assert_eq!(session.selected_widget, Some(WidgetId::from("w1")));
    }

    #[test]
    fn test_update_config_is_shallow_merge() {
        let session = loaded_session();
        let mut widget = widget_with_id("w1");
        widget.config.background_color = Some("#123456".to_string());
        let session = reduce(session, EditorAction::AddWidget(widget));

        let session = reduce(
            session,
            EditorAction::UpdateWidgetConfig {
                id: WidgetId::from("w1"),
                patch: json!({"showTitle": false}),
            },
        );

        let widget = session
            .document
            .as_ref()
            .unwrap()
            .widget(&WidgetId::from("w1"))
            .unwrap();
        assert!(!widget.config.show_title);
        assert_eq!(widget.config.background_color.as_deref(), Some("#123456"));
    }

    #[test]
    fn test_update_unknown_widget_is_noop() {
        let session = loaded_session();
        let before = session.clone();

        let session = reduce(
            session,
            EditorAction::UpdateWidgetTitle {
                id: WidgetId::from("ghost"),
                title: "X".to_string(),
            },
        );
        assert_eq!(session, before);
        assert!(!session.is_dirty);
    }

    #[test]
    fn test_update_geometry_ignores_unknown_ids() {
        let session = loaded_session();
        let session = reduce(session, EditorAction::AddWidget(widget_with_id("w1")));

        let session = reduce(
            session,
            EditorAction::UpdateGeometry(vec![
                GeometryChange {
                    id: WidgetId::from("w1"),
                    col: 5,
                    row: 6,
                    size_x: 7,
                    size_y: 8,
                },
                GeometryChange {
                    id: WidgetId::from("ghost"),
                    col: 0,
                    row: 0,
                    size_x: 1,
                    size_y: 1,
                },
            ]),
        );

        let doc = session.document.as_ref().unwrap();
        let geometry = doc.widget(&WidgetId::from("w1")).unwrap().geometry;
        assert_eq!(geometry, WidgetGeometry::new(5, 6, 7, 8));
        // Geometry mirrored into the active layout
        let layout = doc.configuration.active_layout().unwrap();
        assert_eq!(layout.widgets[&WidgetId::from("w1")], geometry);
    }

    #[test]
    fn test_select_widget_never_dirties() {
        let session = loaded_session();
        let session = reduce(
            session,
            EditorAction::SelectWidget(Some(WidgetId::from("w1"))),
        );
        assert!(!session.is_dirty);
    }

    #[test]
    fn test_revert_keeps_edit_mode() {
        let session = reduce(loaded_session(), EditorAction::EnterEdit);
        let baseline = session.baseline.clone();
        let session = reduce(session, EditorAction::AddWidget(widget_with_id("w1")));

        let session = reduce(session, EditorAction::Revert);
        assert!(session.is_editing);
        assert!(!session.is_dirty);
        assert_eq!(session.document, baseline);
    }

    #[test]
    fn test_save_flow() {
        let session = reduce(loaded_session(), EditorAction::AddWidget(widget_with_id("w1")));
        let session = reduce(session, EditorAction::SaveStart);
        assert!(session.save_in_flight);
        assert!(session.is_dirty); // saveStart does not touch dirty

        let mut saved = session.document.clone().unwrap();
        saved.id = Some("dashboard-1".to_string());
        let session = reduce(session, EditorAction::SaveSucceeded(saved.clone()));
        assert!(!session.save_in_flight);
        assert!(!session.is_dirty);
        assert_eq!(session.baseline, Some(saved));
    }

    #[test]
    fn test_save_failed_keeps_working_copy() {
        let session = reduce(loaded_session(), EditorAction::AddWidget(widget_with_id("w1")));
        let document = session.document.clone();

        let session = reduce(session, EditorAction::SaveStart);
        let session = reduce(session, EditorAction::SaveFailed);
        assert!(!session.save_in_flight);
        assert!(session.is_dirty);
        assert_eq!(session.document, document);
    }

    #[test]
    fn test_mutations_without_document_are_noops() {
        let session = EditorSession::new();
        let session = reduce(session, EditorAction::AddWidget(widget_with_id("w1")));
        assert!(!session.is_dirty);
        assert!(session.document.is_none());
    }

    #[test]
    fn test_document_settings_patch_is_shallow() {
        let session = loaded_session();
        let session = reduce(
            session,
            EditorAction::UpdateDocumentSettings(DocumentPatch {
                settings: Some(DashboardSettings {
                    show_title: false,
                    ..Default::default()
                }),
                timewindow: Some(Some(Timewindow::realtime_ms(120_000))),
                ..Default::default()
            }),
        );

        let config = &session.document.as_ref().unwrap().configuration;
        assert!(!config.settings.show_title);
        assert_eq!(config.timewindow, Some(Timewindow::realtime_ms(120_000)));
        // States untouched by the patch
        assert!(config.states.contains_key("default"));
        assert!(session.is_dirty);
    }

    // Property-based coverage of the dirty and lockstep invariants
    mod properties {
        use super::*;
        use proptest::prelude::*;
        use std::collections::HashSet;

        fn arb_action() -> impl Strategy<Value = EditorAction> {
            let id = (0u8..5).prop_map(|i| WidgetId::from(format!("w{}", i).as_str()));
            prop_oneof![
                id.clone().prop_map(|id| {
                    let mut widget = widget_with_id(id.as_str());
                    widget.id = id;
                    EditorAction::AddWidget(widget)
                }),
                id.clone().prop_map(EditorAction::RemoveWidget),
                (id.clone(), "[a-z]{1,8}").prop_map(|(id, title)| {
                    EditorAction::UpdateWidgetTitle { id, title }
                }),
                (id.clone(), 0i32..24, 0i32..24).prop_map(|(id, col, row)| {
                    EditorAction::UpdateGeometry(vec![GeometryChange {
                        id,
                        col,
                        row,
                        size_x: 4,
                        size_y: 3,
                    }])
                }),
                id.prop_map(|id| EditorAction::SelectWidget(Some(id))),
                Just(EditorAction::EnterEdit),
                Just(EditorAction::ExitEdit),
                Just(EditorAction::Revert),
            ]
        }

        proptest! {
            #[test]
            fn prop_dirty_iff_document_differs_from_baseline(
                actions in prop::collection::vec(arb_action(), 0..24)
            ) {
                let mut session = loaded_session();
                for action in actions {
                    session = reduce(session, action);
                    prop_assert_eq!(
                        session.is_dirty,
                        session.document != session.baseline
                    );
                }
            }

            #[test]
            fn prop_widgets_and_active_layout_stay_in_lockstep(
                actions in prop::collection::vec(arb_action(), 0..24)
            ) {
                let mut session = loaded_session();
                for action in actions {
                    session = reduce(session, action);
                    let doc = session.document.as_ref().unwrap();
                    let layout = doc.configuration.active_layout().unwrap();
                    let widget_ids: HashSet<_> =
                        doc.configuration.widgets.keys().cloned().collect();
                    let layout_ids: HashSet<_> =
                        layout.widgets.keys().cloned().collect();
                    prop_assert_eq!(widget_ids, layout_ids);
                }
            }
        }
    }
}
