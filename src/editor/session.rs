//! Editing session state
//!
//! One session owns one working document plus the edit-mode metadata.
//! The baseline is the last loaded or saved snapshot and is the target
//! of revert; the working copy is only ever replaced through reducer
//! transitions.

use crate::model::{Dashboard, WidgetId};

/// In-memory state of one dashboard editing session (not persisted)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditorSession {
    /// The working copy, mutated by transitions
    pub document: Option<Dashboard>,

    /// Last-saved-or-loaded snapshot, the revert target
    pub baseline: Option<Dashboard>,

    /// Whether the session is in edit mode
    pub is_editing: bool,

    /// True iff the working copy differs from the baseline
    pub is_dirty: bool,

    /// Currently selected widget, UI state only
    pub selected_widget: Option<WidgetId>,

    /// True while a save call is outstanding
    pub save_in_flight: bool,

    /// True while a load call is outstanding
    pub loading: bool,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session that starts from an already-loaded document
    pub fn with_document(document: Dashboard) -> Self {
        Self {
            baseline: Some(document.clone()),
            document: Some(document),
            ..Self::default()
        }
    }

    pub fn has_document(&self) -> bool {
        self.document.is_some()
    }

    /// Widget count of the working copy
    pub fn widget_count(&self) -> usize {
        self.document
            .as_ref()
            .map(|d| d.configuration.widgets.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_session_is_viewing_and_clean() {
        let session = EditorSession::new();
        assert!(!session.is_editing);
        assert!(!session.is_dirty);
        assert!(!session.has_document());
        assert!(session.selected_widget.is_none());
    }

    #[test]
    fn test_with_document_sets_baseline() {
        let session = EditorSession::with_document(Dashboard::new_empty("Test"));
        assert_eq!(session.document, session.baseline);
        assert!(!session.is_dirty);
    }
}
