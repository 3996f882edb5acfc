use eframe::egui;
use egui::{Color32, Sense, Stroke, Vec2};

use crate::canvas::PixelColor;

// ============================================================================
// ColorsPanel — active color, hex entry, quick palette
// ============================================================================

/// Sixteen-swatch starter palette (classic EGA-ish ramp plus grays).
const PALETTE: [PixelColor; 16] = [
    PixelColor::new(0, 0, 0),
    PixelColor::new(127, 127, 127),
    PixelColor::new(195, 195, 195),
    PixelColor::new(255, 255, 255),
    PixelColor::new(136, 0, 21),
    PixelColor::new(237, 28, 36),
    PixelColor::new(255, 127, 39),
    PixelColor::new(255, 242, 0),
    PixelColor::new(34, 177, 76),
    PixelColor::new(181, 230, 29),
    PixelColor::new(0, 162, 232),
    PixelColor::new(63, 72, 204),
    PixelColor::new(112, 146, 190),
    PixelColor::new(163, 73, 164),
    PixelColor::new(255, 174, 201),
    PixelColor::new(185, 122, 87),
];

pub struct ColorsPanel {
    active: PixelColor,
    /// Text currently shown in the hex field; may lag `active` while the
    /// user is typing an incomplete value.
    hex_field: String,
}

impl ColorsPanel {
    pub fn new(initial: PixelColor) -> Self {
        Self {
            active: initial,
            hex_field: initial.to_hex(),
        }
    }

    pub fn active_color(&self) -> PixelColor {
        self.active
    }

    /// Set the active color from outside (settings load, eyedropper-style
    /// actions) and resync the hex field.
    pub fn set_active(&mut self, color: PixelColor) {
        self.active = color;
        self.hex_field = color.to_hex();
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        ui.label("Selected Color");
        ui.horizontal(|ui| {
            // Large preview swatch next to the canonical hex form.
            let (rect, _) = ui.allocate_exact_size(Vec2::splat(36.0), Sense::hover());
            ui.painter().rect_filled(
                rect,
                4.0,
                Color32::from_rgb(self.active.r, self.active.g, self.active.b),
            );
            ui.painter()
                .rect_stroke(rect, 4.0, Stroke::new(1.0, Color32::from_gray(90)));
            ui.monospace(self.active.to_hex().to_uppercase());
        });
        ui.add_space(4.0);

        // RGB picker widget; syncs back into the hex field on change.
        let mut rgb = [self.active.r, self.active.g, self.active.b];
        if ui.color_edit_button_srgb(&mut rgb).changed() {
            self.set_active(PixelColor::new(rgb[0], rgb[1], rgb[2]));
        }

        // Free-form hex entry, applied as soon as it parses.
        ui.horizontal(|ui| {
            ui.label("Hex");
            let edit = ui.add(
                egui::TextEdit::singleline(&mut self.hex_field)
                    .desired_width(80.0)
                    .font(egui::TextStyle::Monospace),
            );
            if edit.changed()
                && let Ok(color) = PixelColor::from_hex(&self.hex_field)
            {
                self.active = color;
            }
            if edit.lost_focus() {
                // Snap the field back to the canonical form.
                self.hex_field = self.active.to_hex();
            }
        });
        ui.add_space(6.0);

        self.show_palette(ui);
    }

    fn show_palette(&mut self, ui: &mut egui::Ui) {
        ui.label("Palette");
        let swatch = 22.0;
        egui::Grid::new("palette_grid")
            .num_columns(8)
            .spacing([4.0, 4.0])
            .show(ui, |ui| {
                for (i, color) in PALETTE.iter().enumerate() {
                    let (rect, response) =
                        ui.allocate_exact_size(Vec2::splat(swatch), Sense::click());
                    ui.painter().rect_filled(
                        rect,
                        3.0,
                        Color32::from_rgb(color.r, color.g, color.b),
                    );
                    let outline = if *color == self.active {
                        Stroke::new(2.0, Color32::WHITE)
                    } else {
                        Stroke::new(1.0, Color32::from_gray(90))
                    };
                    ui.painter().rect_stroke(rect, 3.0, outline);
                    if response.clicked() {
                        self.set_active(*color);
                    }
                    if i % 8 == 7 {
                        ui.end_row();
                    }
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_active_resyncs_hex_field() {
        let mut panel = ColorsPanel::new(PixelColor::BLACK);
        assert_eq!(panel.hex_field, "#000000");
        panel.set_active(PixelColor::new(255, 128, 0));
        assert_eq!(panel.hex_field, "#ff8000");
        assert_eq!(panel.active_color(), PixelColor::new(255, 128, 0));
    }
}
