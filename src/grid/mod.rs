//! Grid reconciliation layer
//!
//! Translates between the document's per-widget geometry and the grid
//! surface's layout format, and turns externally reported layout
//! changes back into editor transitions. Geometry is immutable from the
//! viewer's perspective: reported changes are ignored outside edit
//! mode.
//!
//! The rendering backend behind [`GridSurface`] is opaque and swappable;
//! [`surface::EguiGridSurface`] is the bundled implementation.

pub mod surface;

use crate::editor::{EditorAction, EditorSession, GeometryChange};
use crate::model::{Dashboard, GridSettings, WidgetId};

pub use surface::EguiGridSurface;

/// Minimum widget span in either direction, in cells
pub const MIN_SPAN: i32 = 2;

/// One widget's presentation geometry in the surface's layout format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridItem {
    pub id: WidgetId,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// Derive the presentation layout from the document's widget set.
///
/// Regenerated whenever the widget set or any geometry changes; sorted
/// by id so the output is stable across frames.
pub fn layout_items(document: &Dashboard) -> Vec<GridItem> {
    let mut items: Vec<GridItem> = document
        .configuration
        .widgets
        .values()
        .map(|w| GridItem {
            id: w.id.clone(),
            x: w.geometry.col,
            y: w.geometry.row,
            w: w.geometry.size_x,
            h: w.geometry.size_y,
        })
        .collect();
    items.sort_by(|a, b| a.id.0.cmp(&b.id.0));
    items
}

/// Translate a reported layout back into a bulk geometry transition.
///
/// Returns `None` outside edit mode, without a document, or when
/// nothing actually moved.
pub fn geometry_changes(session: &EditorSession, reported: &[GridItem]) -> Option<EditorAction> {
    if !session.is_editing {
        return None;
    }
    let document = session.document.as_ref()?;

    let changes: Vec<GeometryChange> = reported
        .iter()
        .filter(|item| {
            document
                .widget(&item.id)
                .map(|w| {
                    w.geometry.col != item.x
                        || w.geometry.row != item.y
                        || w.geometry.size_x != item.w
                        || w.geometry.size_y != item.h
                })
                .unwrap_or(false)
        })
        .map(|item| GeometryChange {
            id: item.id.clone(),
            col: item.x,
            row: item.y,
            size_x: item.w,
            size_y: item.h,
        })
        .collect();

    if changes.is_empty() {
        None
    } else {
        Some(EditorAction::UpdateGeometry(changes))
    }
}

/// Apply a drag/resize delta in cells to one item, clamped to the grid
pub fn apply_drag(item: &GridItem, dx: i32, dy: i32, resize: bool, columns: i32) -> GridItem {
    let mut moved = item.clone();
    if resize {
        moved.w = (item.w + dx).clamp(MIN_SPAN, columns);
        moved.h = (item.h + dy).max(MIN_SPAN);
        moved.x = moved.x.min(columns - moved.w).max(0);
    } else {
        moved.x = (item.x + dx).clamp(0, (columns - item.w).max(0));
        moved.y = (item.y + dy).max(0);
    }
    moved
}

/// The opaque, swappable grid rendering backend.
///
/// Consumes a layout, renders each cell through the callback, and emits
/// the full layout back when the user finished a drag or resize.
pub trait GridSurface {
    fn show(
        &mut self,
        ui: &mut egui::Ui,
        settings: &GridSettings,
        items: &[GridItem],
        editing: bool,
        render_cell: &mut dyn FnMut(&WidgetId, &mut egui::Ui),
    ) -> Option<Vec<GridItem>>;
}
