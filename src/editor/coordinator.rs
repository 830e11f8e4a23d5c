//! Save/load coordinator
//!
//! The reducer never awaits; this thin coordinator owns the async
//! orchestration around it. It spawns persistence calls on the shared
//! runtime and delivers the resulting transitions over a channel that
//! the app drains once per frame. A second save while one is in flight
//! is rejected here, guarded by `save_in_flight` — never by the reducer.

use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::api::DashboardStore;
use crate::editor::action::EditorAction;
use crate::editor::session::EditorSession;

/// Follow-up emitted by an asynchronous persistence call
#[derive(Debug, Clone)]
pub enum CoordinatorEvent {
    /// Apply this transition to the session
    Apply(EditorAction),
    /// Surface this error to the user
    Error(String),
}

/// Thin async orchestrator around the pure reducer
pub struct EditorCoordinator {
    store: Arc<dyn DashboardStore>,
    runtime: tokio::runtime::Handle,
    events_tx: Sender<CoordinatorEvent>,
}

impl EditorCoordinator {
    pub fn new(
        store: Arc<dyn DashboardStore>,
        runtime: tokio::runtime::Handle,
    ) -> (Self, Receiver<CoordinatorEvent>) {
        let (events_tx, events_rx) = unbounded();
        (
            Self {
                store,
                runtime,
                events_tx,
            },
            events_rx,
        )
    }

    /// Start loading a dashboard; emits `Load` on success, otherwise
    /// clears the loading flag and surfaces the error (the session is
    /// left without a document).
    pub fn request_load(&self, id: String) {
        let store = self.store.clone();
        let events = self.events_tx.clone();

        let _ = events.send(CoordinatorEvent::Apply(EditorAction::SetLoading(true)));
        self.runtime.spawn(async move {
            match store.load_dashboard(&id).await {
                Ok(dashboard) => {
                    tracing::info!("Loaded dashboard '{}'", dashboard.title);
                    let _ = events.send(CoordinatorEvent::Apply(EditorAction::Load(dashboard)));
                }
                Err(e) => {
                    tracing::error!("Failed to load dashboard {}: {}", id, e);
                    let _ = events.send(CoordinatorEvent::Apply(EditorAction::SetLoading(false)));
                    let _ = events.send(CoordinatorEvent::Error(format!(
                        "Failed to load dashboard: {}",
                        e
                    )));
                }
            }
        });
    }

    /// Start saving the working copy. Returns `false` (rejected) when a
    /// save is already outstanding or there is nothing to save; returns
    /// `true` after emitting `SaveStart` and spawning the call.
    pub fn request_save(&self, session: &EditorSession) -> bool {
        if session.save_in_flight {
            tracing::warn!("Save rejected: another save is in flight");
            return false;
        }
        let Some(document) = session.document.clone() else {
            return false;
        };

        let store = self.store.clone();
        let events = self.events_tx.clone();

        let _ = events.send(CoordinatorEvent::Apply(EditorAction::SaveStart));
        self.runtime.spawn(async move {
            match store.save_dashboard(&document).await {
                Ok(saved) => {
                    tracing::info!("Saved dashboard '{}'", saved.title);
                    let _ = events.send(CoordinatorEvent::Apply(EditorAction::SaveSucceeded(saved)));
                }
                Err(e) => {
                    tracing::error!("Failed to save dashboard: {}", e);
                    let _ = events.send(CoordinatorEvent::Apply(EditorAction::SaveFailed));
                    let _ = events.send(CoordinatorEvent::Error(format!(
                        "Failed to save dashboard: {}",
                        e
                    )));
                }
            }
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockApi, MockDashboardStore};
    use crate::editor::reducer::reduce;
    use crate::error::GridboardError;
    use crate::model::Dashboard;
    use std::time::Duration;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
    }

    fn drain_apply(
        rx: &Receiver<CoordinatorEvent>,
        mut session: EditorSession,
        expected: usize,
    ) -> EditorSession {
        for _ in 0..expected {
            match rx.recv_timeout(Duration::from_secs(2)).unwrap() {
                CoordinatorEvent::Apply(action) => session = reduce(session, action),
                CoordinatorEvent::Error(_) => {}
            }
        }
        session
    }

    #[test]
    fn test_load_applies_document() {
        let rt = runtime();
        let api = Arc::new(MockApi::new());
        let mut seeded = Dashboard::new_empty("Seeded");
        seeded.id = Some("dashboard-1".to_string());
        api.put_dashboard(seeded);

        let (coordinator, rx) = EditorCoordinator::new(api, rt.handle().clone());
        coordinator.request_load("dashboard-1".to_string());

        let session = drain_apply(&rx, EditorSession::new(), 2);
        assert!(session.has_document());
        assert!(!session.loading);
        assert_eq!(session.document.as_ref().unwrap().title, "Seeded");
    }

    #[test]
    fn test_load_failure_leaves_session_without_document() {
        let rt = runtime();
        let mut store = MockDashboardStore::new();
        store
            .expect_load_dashboard()
            .returning(|_| Err(GridboardError::Api("not found".to_string())));

        let (coordinator, rx) = EditorCoordinator::new(Arc::new(store), rt.handle().clone());
        coordinator.request_load("missing".to_string());

        let session = drain_apply(&rx, EditorSession::new(), 2);
        assert!(!session.has_document());
        assert!(!session.loading);

        // The error was surfaced
        let saw_error = matches!(
            rx.recv_timeout(Duration::from_secs(2)),
            Ok(CoordinatorEvent::Error(_))
        );
        assert!(saw_error);
    }

    #[test]
    fn test_save_roundtrip_updates_baseline() {
        let rt = runtime();
        let api = Arc::new(MockApi::new());
        let (coordinator, rx) = EditorCoordinator::new(api, rt.handle().clone());

        let session = EditorSession::with_document(Dashboard::new_empty("To save"));
        assert!(coordinator.request_save(&session));

        let session = drain_apply(&rx, session, 2);
        assert!(!session.save_in_flight);
        assert!(!session.is_dirty);
        assert!(session.baseline.as_ref().unwrap().id.is_some());
    }

    #[test]
    fn test_second_save_rejected_while_in_flight() {
        let rt = runtime();
        let api = Arc::new(MockApi::new());
        let (coordinator, rx) = EditorCoordinator::new(api, rt.handle().clone());

        let session = EditorSession::with_document(Dashboard::new_empty("Guarded"));
        assert!(coordinator.request_save(&session));

        // Apply only SaveStart, leaving the call outstanding
        let session = drain_apply(&rx, session, 1);
        assert!(session.save_in_flight);
        assert!(!coordinator.request_save(&session));
    }

    #[test]
    fn test_save_without_document_rejected() {
        let rt = runtime();
        let api = Arc::new(MockApi::new());
        let (coordinator, _rx) = EditorCoordinator::new(api, rt.handle().clone());
        assert!(!coordinator.request_save(&EditorSession::new()));
    }

    #[test]
    fn test_save_failure_keeps_dirty_working_copy() {
        let rt = runtime();
        let mut store = MockDashboardStore::new();
        store
            .expect_save_dashboard()
            .returning(|_| Err(GridboardError::Api("503".to_string())));

        let (coordinator, rx) = EditorCoordinator::new(Arc::new(store), rt.handle().clone());

        let mut session = EditorSession::with_document(Dashboard::new_empty("Failing"));
        session.is_dirty = true;
        assert!(coordinator.request_save(&session));

        let session = drain_apply(&rx, session, 2);
        assert!(!session.save_in_flight);
        assert!(session.is_dirty);
        assert!(session.has_document());
    }
}
