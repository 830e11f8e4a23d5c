//! Integration tests for the editing state machine
//!
//! Covers the end-to-end editing scenarios: load, edit, dirty tracking,
//! revert, save-through-persistence and grid reconciliation.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::builders::{toggle_dashboard, widget};
use crossbeam_channel::Receiver;
use gridboard_rs::api::MockApi;
use gridboard_rs::editor::{
    reduce, CoordinatorEvent, EditorAction, EditorCoordinator, EditorSession,
};
use gridboard_rs::grid;
use gridboard_rs::model::{WidgetCategory, WidgetGeometry, WidgetId};

fn apply_events(
    rx: &Receiver<CoordinatorEvent>,
    mut session: EditorSession,
    count: usize,
) -> EditorSession {
    for _ in 0..count {
        match rx.recv_timeout(Duration::from_secs(3)).expect("event") {
            CoordinatorEvent::Apply(action) => session = reduce(session, action),
            CoordinatorEvent::Error(_) => {}
        }
    }
    session
}

#[test]
fn edit_title_then_revert_restores_snapshot() {
    let rt = common::test_runtime();
    let api = Arc::new(MockApi::new());
    api.put_dashboard(toggle_dashboard());

    // Load through the coordinator, exactly as the app does
    let (coordinator, rx) = EditorCoordinator::new(api, rt.handle().clone());
    coordinator.request_load("dashboard-1".to_string());
    let session = apply_events(&rx, EditorSession::new(), 2);
    assert!(session.has_document());
    assert!(!session.is_dirty);

    let toggle_id = WidgetId::from("toggle-1");
    let original_title = session
        .document
        .as_ref()
        .unwrap()
        .widget(&toggle_id)
        .unwrap()
        .title
        .clone();

    // Enter edit and rename the widget
    let session = reduce(session, EditorAction::EnterEdit);
    let session = reduce(
        session,
        EditorAction::UpdateWidgetTitle {
            id: toggle_id.clone(),
            title: "Main Switch".to_string(),
        },
    );
    assert!(session.is_dirty);
    assert_eq!(
        session.document.as_ref().unwrap().widget(&toggle_id).unwrap().title,
        "Main Switch"
    );

    // Revert discards the rename but stays in edit mode
    let session = reduce(session, EditorAction::Revert);
    assert!(!session.is_dirty);
    assert!(session.is_editing);
    assert_eq!(
        session.document.as_ref().unwrap().widget(&toggle_id).unwrap().title,
        original_title
    );
}

#[test]
fn added_widget_appears_in_grid_layout() {
    let session = EditorSession::with_document(toggle_dashboard());
    let session = reduce(session, EditorAction::EnterEdit);

    let new_widget = widget("card-1", WidgetCategory::Latest, WidgetGeometry::new(0, 0, 4, 3));
    let session = reduce(session, EditorAction::AddWidget(new_widget));

    let items = grid::layout_items(session.document.as_ref().unwrap());
    let card: Vec<_> = items
        .iter()
        .filter(|i| i.id == WidgetId::from("card-1"))
        .collect();
    assert_eq!(card.len(), 1);
    assert_eq!((card[0].x, card[0].y, card[0].w, card[0].h), (0, 0, 4, 3));
}

#[test]
fn exit_edit_restores_last_loaded_snapshot() {
    let session = EditorSession::with_document(toggle_dashboard());
    let baseline = session.baseline.clone();
    let session = reduce(session, EditorAction::EnterEdit);

    // Arbitrary mutations
    let session = reduce(
        session,
        EditorAction::AddWidget(widget(
            "w-extra",
            WidgetCategory::Latest,
            WidgetGeometry::new(4, 0, 4, 3),
        )),
    );
    let session = reduce(session, EditorAction::RemoveWidget(WidgetId::from("toggle-1")));
    let session = reduce(
        session,
        EditorAction::UpdateGeometry(vec![gridboard_rs::editor::GeometryChange {
            id: WidgetId::from("w-extra"),
            col: 8,
            row: 8,
            size_x: 2,
            size_y: 2,
        }]),
    );
    assert!(session.is_dirty);

    let session = reduce(session, EditorAction::ExitEdit);
    assert!(!session.is_editing);
    assert!(!session.is_dirty);
    assert_eq!(session.document, baseline);
}

#[test]
fn removed_widget_never_referenced_by_any_layout() {
    let session = EditorSession::with_document(toggle_dashboard());
    let id = WidgetId::from("toggle-1");
    let session = reduce(session, EditorAction::RemoveWidget(id.clone()));

    let config = &session.document.as_ref().unwrap().configuration;
    assert!(!config.any_layout_references(&id));
    assert!(grid::layout_items(session.document.as_ref().unwrap()).is_empty());
}

#[test]
fn save_through_persistence_replaces_baseline() {
    let rt = common::test_runtime();
    let api = Arc::new(MockApi::new());

    let mut dashboard = toggle_dashboard();
    dashboard.id = None; // unsaved document
    let session = EditorSession::with_document(dashboard);
    let session = reduce(
        session,
        EditorAction::UpdateWidgetTitle {
            id: WidgetId::from("toggle-1"),
            title: "Renamed".to_string(),
        },
    );
    assert!(session.is_dirty);

    let (coordinator, rx) = EditorCoordinator::new(api.clone(), rt.handle().clone());
    assert!(coordinator.request_save(&session));
    let session = apply_events(&rx, session, 2);

    assert!(!session.is_dirty);
    assert!(!session.save_in_flight);
    // The server assigned identity and the result became the baseline
    let baseline = session.baseline.as_ref().unwrap();
    assert!(baseline.id.is_some());
    assert_eq!(
        baseline.widget(&WidgetId::from("toggle-1")).unwrap().title,
        "Renamed"
    );

    // The document round-tripped through the store losslessly
    let stored = rt
        .block_on(async {
            use gridboard_rs::api::DashboardStore;
            api.load_dashboard(baseline.id.as_deref().unwrap()).await
        })
        .unwrap();
    assert_eq!(&stored, baseline);
}

#[test]
fn document_json_shape_round_trips() {
    let raw = serde_json::json!({
        "id": "dashboard-9",
        "title": "Plant Overview",
        "configuration": {
            "settings": {"showTitle": true},
            "widgets": {
                "w1": {
                    "id": "w1",
                    "type": "latest",
                    "title": "Temperature",
                    "geometry": {"col": 0, "row": 0, "sizeX": 4, "sizeY": 3},
                    "config": {
                        "showTitle": true,
                        "datasources": [{
                            "type": "device",
                            "deviceId": "dev-1",
                            "dataKeys": [{"name": "temp", "type": "timeseries", "label": "T"}]
                        }],
                        "timewindow": {"realtime": {"timewindowMs": 60000}},
                        "settings": {"widgetType": "value_card", "units": "°C"}
                    }
                }
            },
            "states": {
                "default": {
                    "name": "default",
                    "root": true,
                    "layouts": {
                        "main": {
                            "gridSettings": {"columns": 24, "margin": 10, "rowHeight": 50},
                            "widgets": {"w1": {"col": 0, "row": 0, "sizeX": 4, "sizeY": 3}}
                        }
                    }
                }
            },
            "entityAliases": {
                "a1": {
                    "id": "a1",
                    "alias": "All devices",
                    "filter": {"type": "entityType", "entityType": "DEVICE", "resolveMultiple": true}
                }
            }
        }
    });

    let dashboard: gridboard_rs::Dashboard = serde_json::from_value(raw.clone()).unwrap();
    let back = serde_json::to_value(&dashboard).unwrap();

    // Every field enumerated by the document model survives
    assert_eq!(back["id"], raw["id"]);
    assert_eq!(back["title"], raw["title"]);
    assert_eq!(
        back["configuration"]["widgets"]["w1"]["geometry"],
        raw["configuration"]["widgets"]["w1"]["geometry"]
    );
    assert_eq!(
        back["configuration"]["widgets"]["w1"]["config"]["settings"],
        raw["configuration"]["widgets"]["w1"]["config"]["settings"]
    );
    assert_eq!(
        back["configuration"]["states"]["default"]["layouts"]["main"]["widgets"],
        raw["configuration"]["states"]["default"]["layouts"]["main"]["widgets"]
    );
    assert_eq!(
        back["configuration"]["entityAliases"],
        raw["configuration"]["entityAliases"]
    );
}
