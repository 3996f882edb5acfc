use eframe::egui;
use egui::{Color32, Pos2, Rect, Sense, Stroke, Vec2};

use crate::canvas::{PixelCanvas, PixelColor, StrokeEngine, cell_at};

fn to_color32(c: PixelColor) -> Color32 {
    Color32::from_rgb(c.r, c.g, c.b)
}

// ============================================================================
// EditorPanel — the drawing surface
// ============================================================================

/// Renders the pixel grid and turns pointer input into stroke events.
///
/// Press starts a stroke, drag continues it (with line interpolation between
/// the previous and current cell), release or losing the pointer ends it.
/// All painting is synchronous inside the frame that received the event.
#[derive(Default)]
pub struct EditorPanel {
    stroke: StrokeEngine,
}

impl EditorPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_drawing(&self) -> bool {
        self.stroke.is_drawing()
    }

    /// Lay out the canvas and process this frame's pointer state.
    /// Returns `true` when any cell value changed (caller marks the draft
    /// dirty and the grid repaints).
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        canvas: &mut PixelCanvas,
        active_color: PixelColor,
        cell_px: f32,
        show_grid_lines: bool,
    ) -> bool {
        let n = canvas.size();
        let side = cell_px * n as f32;
        let (rect, response) = ui.allocate_exact_size(Vec2::splat(side), Sense::click_and_drag());

        let mut changed = false;
        if ui.is_rect_visible(rect) {
            changed = self.handle_pointer(ui, canvas, active_color, rect, cell_px, response.hovered());
            self.paint_grid(ui, canvas, rect, cell_px, show_grid_lines);
            if response.hovered() {
                ui.ctx().set_cursor_icon(egui::CursorIcon::Crosshair);
            }
        }
        changed
    }

    fn handle_pointer(
        &mut self,
        ui: &egui::Ui,
        canvas: &mut PixelCanvas,
        active_color: PixelColor,
        rect: Rect,
        cell_px: f32,
        hovered: bool,
    ) -> bool {
        let n = canvas.size();
        let origin = (rect.min.x, rect.min.y);

        let (pressed, down, released, pos, pointer_present) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_down(),
                i.pointer.primary_released(),
                i.pointer.interact_pos(),
                i.pointer.has_pointer(),
            )
        });

        let cell = pos.and_then(|p| cell_at((p.x, p.y), origin, cell_px, n));

        let mut changed = false;
        if pressed && hovered {
            // Hover check keeps presses on overlay windows from painting
            // through; a press outside the grid never starts a stroke.
            changed |= self.stroke.begin_stroke(canvas, cell, active_color);
        } else if down && self.stroke.is_drawing() {
            // One cheap call per pointer event; off-grid positions are
            // skipped but keep the stroke alive so re-entry resumes it.
            changed |= self.stroke.continue_stroke(canvas, cell, active_color);
        }

        // Pointer-up ends the stroke; so does losing the pointer entirely
        // (window leave, touch cancel), which covers a missed release event.
        if released || !down || !pointer_present {
            self.stroke.end_stroke();
        }

        changed
    }

    fn paint_grid(
        &self,
        ui: &egui::Ui,
        canvas: &PixelCanvas,
        rect: Rect,
        cell_px: f32,
        show_grid_lines: bool,
    ) {
        let painter = ui.painter_at(rect);
        let n = canvas.size();

        for row in 0..n {
            for col in 0..n {
                let min = Pos2::new(
                    rect.min.x + col as f32 * cell_px,
                    rect.min.y + row as f32 * cell_px,
                );
                let cell_rect = Rect::from_min_size(min, Vec2::splat(cell_px));
                if let Some(color) = canvas.get(row, col) {
                    painter.rect_filled(cell_rect, 0.0, to_color32(color));
                }
            }
        }

        if show_grid_lines {
            let line = Stroke::new(1.0, Color32::from_gray(70));
            for i in 0..=n {
                let x = rect.min.x + i as f32 * cell_px;
                let y = rect.min.y + i as f32 * cell_px;
                painter.line_segment([Pos2::new(x, rect.min.y), Pos2::new(x, rect.max.y)], line);
                painter.line_segment([Pos2::new(rect.min.x, y), Pos2::new(rect.max.x, y)], line);
            }
        } else {
            painter.rect_stroke(rect, 0.0, Stroke::new(1.0, Color32::from_gray(70)));
        }
    }
}
