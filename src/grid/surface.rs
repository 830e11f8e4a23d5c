//! Bundled egui grid surface
//!
//! Places each cell at its computed rect, draws a light frame, and in
//! edit mode exposes a drag strip along the top of each widget plus a
//! resize handle in the bottom-right corner. A finished drag or resize
//! reports the whole layout back through [`GridSurface::show`].

use egui::{Rect, Stroke, StrokeKind, Ui, UiBuilder};

use crate::grid::{apply_drag, GridItem, GridSurface};
use crate::model::{GridSettings, WidgetId};
use crate::widgets::parse_hex_color;

/// Height of the drag strip at the top of each cell
const DRAG_STRIP_HEIGHT: f32 = 18.0;

/// Side length of the resize handle
const RESIZE_HANDLE: f32 = 14.0;

/// Minimum number of grid rows drawn even when the dashboard is empty
const MIN_VISIBLE_ROWS: i32 = 6;

struct DragState {
    id: WidgetId,
    resize: bool,
    dx: f32,
    dy: f32,
}

/// Default grid rendering backend
#[derive(Default)]
pub struct EguiGridSurface {
    drag: Option<DragState>,
}

impl EguiGridSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn finish_drag(
        &mut self,
        items: &[GridItem],
        cell_w: f32,
        row_h: f32,
        columns: i32,
    ) -> Option<Vec<GridItem>> {
        let drag = self.drag.take()?;
        let dx = (drag.dx / cell_w).round() as i32;
        let dy = (drag.dy / row_h).round() as i32;
        if dx == 0 && dy == 0 {
            return None;
        }
        Some(
            items
                .iter()
                .map(|item| {
                    if item.id == drag.id {
                        apply_drag(item, dx, dy, drag.resize, columns)
                    } else {
                        item.clone()
                    }
                })
                .collect(),
        )
    }
}

impl GridSurface for EguiGridSurface {
    fn show(
        &mut self,
        ui: &mut Ui,
        settings: &GridSettings,
        items: &[GridItem],
        editing: bool,
        render_cell: &mut dyn FnMut(&WidgetId, &mut Ui),
    ) -> Option<Vec<GridItem>> {
        let columns = settings.columns.max(1);
        let margin = settings.margin.max(0) as f32;
        let available = ui.available_width();
        let cell_w = (available - margin) / columns as f32;
        let row_h = settings.row_height.max(8) as f32 + margin;

        let rows = items
            .iter()
            .map(|i| i.y + i.h)
            .max()
            .unwrap_or(0)
            .max(MIN_VISIBLE_ROWS);
        let total = egui::vec2(available, rows as f32 * row_h + margin);
        let (outer, _) = ui.allocate_exact_size(total, egui::Sense::hover());

        if let Some(color) = settings
            .background_color
            .as_deref()
            .and_then(parse_hex_color)
        {
            ui.painter().rect_filled(outer, 0.0, color);
        }

        let origin = outer.min;
        let mut reported = None;

        for item in items {
            let mut rect = Rect::from_min_size(
                egui::pos2(
                    origin.x + item.x as f32 * cell_w + margin,
                    origin.y + item.y as f32 * row_h + margin,
                ),
                egui::vec2(
                    item.w as f32 * cell_w - margin,
                    item.h as f32 * row_h - margin,
                ),
            );

            // Live preview while this widget is being dragged/resized
            if let Some(drag) = &self.drag {
                if drag.id == item.id {
                    if drag.resize {
                        rect = Rect::from_min_size(
                            rect.min,
                            (rect.size() + egui::vec2(drag.dx, drag.dy))
                                .max(egui::vec2(cell_w, row_h)),
                        );
                    } else {
                        rect = rect.translate(egui::vec2(drag.dx, drag.dy));
                    }
                }
            }

            ui.painter().rect_stroke(
                rect,
                4.0,
                Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color),
                StrokeKind::Inside,
            );

            let content = rect.shrink(4.0);
            ui.scope_builder(UiBuilder::new().max_rect(content), |ui| {
                render_cell(&item.id, ui);
            });

            if !editing {
                continue;
            }

            // Drag strip along the top edge
            let strip = Rect::from_min_size(rect.min, egui::vec2(rect.width(), DRAG_STRIP_HEIGHT));
            let drag_response = ui.interact(
                strip,
                egui::Id::new(("grid-drag", item.id.as_str())),
                egui::Sense::drag(),
            );
            // Resize handle in the bottom-right corner
            let corner = Rect::from_min_size(
                rect.max - egui::vec2(RESIZE_HANDLE, RESIZE_HANDLE),
                egui::vec2(RESIZE_HANDLE, RESIZE_HANDLE),
            );
            let resize_response = ui.interact(
                corner,
                egui::Id::new(("grid-resize", item.id.as_str())),
                egui::Sense::drag(),
            );

            for (response, resize) in [(&drag_response, false), (&resize_response, true)] {
                if response.drag_started() {
                    self.drag = Some(DragState {
                        id: item.id.clone(),
                        resize,
                        dx: 0.0,
                        dy: 0.0,
                    });
                }
                if response.dragged() {
                    if let Some(drag) = &mut self.drag {
                        if drag.id == item.id && drag.resize == resize {
                            drag.dx += response.drag_delta().x;
                            drag.dy += response.drag_delta().y;
                        }
                    }
                }
                if response.drag_stopped() {
                    if let Some(changed) = self.finish_drag(items, cell_w, row_h, columns) {
                        reported = Some(changed);
                    }
                }
            }
        }

        reported
    }
}
