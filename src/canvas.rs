use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default grid dimension (the backend stores 32×32 drawings).
pub const DEFAULT_GRID_SIZE: usize = 32;
/// Default on-screen edge length of one cell, in points.
pub const DEFAULT_CELL_PIXELS: f32 = 16.0;

// ============================================================================
// PIXEL COLOR — 24-bit RGB, wire format "#rrggbb"
// ============================================================================

/// One canvas cell value.  Serialized as a lowercase 7-character hex string
/// (`#rrggbb`), the format the posts API expects in `pixelData`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl PixelColor {
    pub const WHITE: PixelColor = PixelColor::new(255, 255, 255);
    pub const BLACK: PixelColor = PixelColor::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a hex color string, e.g. `#ff8000` or `FF8000`.
    /// Case-insensitive; the leading `#` is optional.
    pub fn from_hex(hex: &str) -> Result<Self, String> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(format!("invalid hex color '{}'", hex));
        }
        let r = u8::from_str_radix(&digits[0..2], 16).map_err(|e| e.to_string())?;
        let g = u8::from_str_radix(&digits[2..4], 16).map_err(|e| e.to_string())?;
        let b = u8::from_str_radix(&digits[4..6], 16).map_err(|e| e.to_string())?;
        Ok(Self { r, g, b })
    }

    /// Canonical lowercase `#rrggbb` form.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for PixelColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for PixelColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

struct PixelColorVisitor;

impl<'de> Visitor<'de> for PixelColorVisitor {
    type Value = PixelColor;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a '#rrggbb' hex color string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<PixelColor, E> {
        PixelColor::from_hex(v).map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for PixelColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(PixelColorVisitor)
    }
}

// ============================================================================
// PIXEL CANVAS — fixed N×N color grid
// ============================================================================

/// Square drawing surface.  Cells are stored row-major; every cell always
/// holds a valid color and out-of-range coordinates are never written.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PixelCanvas {
    size: usize,
    background: PixelColor,
    cells: Vec<PixelColor>,
}

impl PixelCanvas {
    /// Create a uniform background-colored grid.  A zero size is clamped to 1
    /// so the grid invariant (exactly N×N, N ≥ 1) can never be violated.
    pub fn new(size: usize, background: PixelColor) -> Self {
        let size = size.max(1);
        Self {
            size,
            background,
            cells: vec![background; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn background(&self) -> PixelColor {
        self.background
    }

    pub fn get(&self, row: usize, col: usize) -> Option<PixelColor> {
        if row < self.size && col < self.size {
            Some(self.cells[row * self.size + col])
        } else {
            None
        }
    }

    /// Paint one cell.  Returns `true` when the cell value actually changed;
    /// out-of-range coordinates are ignored and return `false`.
    pub fn paint(&mut self, row: usize, col: usize, color: PixelColor) -> bool {
        if row >= self.size || col >= self.size {
            return false;
        }
        let cell = &mut self.cells[row * self.size + col];
        if *cell == color {
            false
        } else {
            *cell = color;
            true
        }
    }

    /// Paint every cell on the discrete line from `from` to `to` (inclusive).
    /// Cells falling outside the grid are skipped without aborting the line.
    /// Returns `true` when at least one cell value changed.
    pub fn paint_line(
        &mut self,
        from: (usize, usize),
        to: (usize, usize),
        color: PixelColor,
    ) -> bool {
        let mut changed = false;
        for (r, c) in line_cells(
            (from.0 as i32, from.1 as i32),
            (to.0 as i32, to.1 as i32),
        ) {
            if r >= 0 && c >= 0 {
                changed |= self.paint(r as usize, c as usize, color);
            }
        }
        changed
    }

    /// Reset every cell to the background color.
    pub fn clear(&mut self) {
        self.cells.fill(self.background);
    }

    /// True iff at least one cell differs from the background color.
    /// Gates submission — an all-background canvas is rejected client-side.
    pub fn has_content(&self) -> bool {
        self.cells.iter().any(|c| *c != self.background)
    }

    /// Copy-on-read snapshot as an N×N array of rows, safe to hand to the
    /// networking layer: it shares no storage with subsequent edits.
    pub fn snapshot(&self) -> Vec<Vec<PixelColor>> {
        self.cells
            .chunks(self.size)
            .map(|row| row.to_vec())
            .collect()
    }
}

// ============================================================================
// LINE RASTERIZATION — integer Bresenham
// ============================================================================

/// All cells on the discrete line between two grid cells, endpoints included.
///
/// A fast drag delivers pointer events several cells apart; rasterizing the
/// segment between the previous and current cell keeps the stroke unbroken.
/// Standard doubled-error Bresenham stepping over (row, col).
pub fn line_cells(from: (i32, i32), to: (i32, i32)) -> Vec<(i32, i32)> {
    let (mut r0, mut c0) = from;
    let (r1, c1) = to;

    let dr = (r1 - r0).abs();
    let dc = (c1 - c0).abs();
    let sr = if r0 < r1 { 1 } else { -1 };
    let sc = if c0 < c1 { 1 } else { -1 };
    let mut err = dr - dc;

    let mut cells = Vec::with_capacity((dr.max(dc) + 1) as usize);
    loop {
        cells.push((r0, c0));
        if r0 == r1 && c0 == c1 {
            break;
        }
        let e2 = 2 * err;
        if e2 > -dc {
            err -= dc;
            r0 += sr;
        }
        if e2 < dr {
            err += dr;
            c0 += sc;
        }
    }
    cells
}

// ============================================================================
// POINTER MAPPING — screen position → grid cell
// ============================================================================

/// Map an on-screen pointer position to a grid cell.
///
/// `origin` is the top-left corner of the canvas surface and `cell_px` the
/// edge length of one cell.  Mouse and touch positions feed the same mapping.
/// Returns `None` for positions resolving outside `[0, grid)` on either axis.
pub fn cell_at(
    pos: (f32, f32),
    origin: (f32, f32),
    cell_px: f32,
    grid: usize,
) -> Option<(usize, usize)> {
    if cell_px <= 0.0 {
        return None;
    }
    let col = ((pos.0 - origin.0) / cell_px).floor();
    let row = ((pos.1 - origin.1) / cell_px).floor();
    if row < 0.0 || col < 0.0 {
        return None;
    }
    let (row, col) = (row as usize, col as usize);
    if row >= grid || col >= grid {
        return None;
    }
    Some((row, col))
}

// ============================================================================
// STROKE ENGINE — pointer-down → pointer-up painting state machine
// ============================================================================

/// Tracks one continuous painting gesture in cell space.
///
/// The caller maps pointer positions to cells with [`cell_at`] and feeds them
/// in; the engine paints single cells on stroke start and Bresenham segments
/// while the pointer moves, so that a drag faster than the event rate never
/// leaves gaps.
#[derive(Debug, Default)]
pub struct StrokeEngine {
    drawing: bool,
    last_cell: Option<(usize, usize)>,
}

impl StrokeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// Start a stroke at the cell under the pointer.  A press outside the
    /// grid (`cell == None`) is a no-op and does not start a stroke.
    /// Returns `true` when a cell value changed.
    pub fn begin_stroke(
        &mut self,
        canvas: &mut PixelCanvas,
        cell: Option<(usize, usize)>,
        color: PixelColor,
    ) -> bool {
        let Some((row, col)) = cell else {
            return false;
        };
        self.drawing = true;
        self.last_cell = Some((row, col));
        canvas.paint(row, col, color)
    }

    /// Continue the active stroke.  No-op when not drawing.  A position
    /// outside the grid is skipped but keeps the stroke alive, so a drag that
    /// briefly exits and returns resumes from the last painted cell.
    /// Returns `true` when a cell value changed.
    pub fn continue_stroke(
        &mut self,
        canvas: &mut PixelCanvas,
        cell: Option<(usize, usize)>,
        color: PixelColor,
    ) -> bool {
        if !self.drawing {
            return false;
        }
        let Some(cell) = cell else {
            return false;
        };
        match self.last_cell {
            Some(last) if last == cell => false,
            Some(last) => {
                let changed = canvas.paint_line(last, cell, color);
                self.last_cell = Some(cell);
                changed
            }
            None => {
                // Stroke started off-grid events only; treat as a fresh dab.
                self.last_cell = Some(cell);
                canvas.paint(cell.0, cell.1, color)
            }
        }
    }

    /// End the stroke.  Idempotent — safe to call on pointer-up, pointer
    /// leave and touch-cancel alike.
    pub fn end_stroke(&mut self) {
        self.drawing = false;
        self.last_cell = None;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const RED: PixelColor = PixelColor::new(255, 0, 0);

    fn small_canvas(n: usize) -> PixelCanvas {
        PixelCanvas::new(n, PixelColor::WHITE)
    }

    // -- colors --------------------------------------------------------------

    #[test]
    fn test_hex_parse_and_format() {
        let c = PixelColor::from_hex("#FF8000").unwrap();
        assert_eq!(c, PixelColor::new(255, 128, 0));
        assert_eq!(c.to_hex(), "#ff8000");
        assert_eq!(PixelColor::from_hex("00ff00").unwrap(), PixelColor::new(0, 255, 0));
    }

    #[test]
    fn test_hex_parse_rejects_malformed() {
        assert!(PixelColor::from_hex("#fff").is_err());
        assert!(PixelColor::from_hex("#gggggg").is_err());
        assert!(PixelColor::from_hex("").is_err());
        assert!(PixelColor::from_hex("#ff00112").is_err());
    }

    #[test]
    fn test_color_serde_round_trip() {
        let json = serde_json::to_string(&RED).unwrap();
        assert_eq!(json, "\"#ff0000\"");
        let back: PixelColor = serde_json::from_str("\"#FF0000\"").unwrap();
        assert_eq!(back, RED);
        assert!(serde_json::from_str::<PixelColor>("\"red\"").is_err());
    }

    // -- canvas basics -------------------------------------------------------

    #[test]
    fn test_new_canvas_is_uniform_background() {
        for n in [1, 2, 5, 32] {
            let canvas = small_canvas(n);
            let snap = canvas.snapshot();
            assert_eq!(snap.len(), n);
            for row in &snap {
                assert_eq!(row.len(), n);
                assert!(row.iter().all(|c| *c == PixelColor::WHITE));
            }
            assert!(!canvas.has_content());
        }
    }

    #[test]
    fn test_clear_resets_every_cell() {
        let mut canvas = small_canvas(5);
        canvas.paint(0, 0, RED);
        canvas.paint(4, 4, PixelColor::BLACK);
        assert!(canvas.has_content());
        canvas.clear();
        assert!(!canvas.has_content());
        let snap = canvas.snapshot();
        assert!(snap.iter().flatten().all(|c| *c == PixelColor::WHITE));
    }

    #[test]
    fn test_paint_out_of_range_is_ignored() {
        let mut canvas = small_canvas(4);
        assert!(!canvas.paint(4, 0, RED));
        assert!(!canvas.paint(0, 4, RED));
        assert!(!canvas.paint(100, 100, RED));
        assert!(!canvas.has_content());
    }

    #[test]
    fn test_paint_is_idempotent() {
        let mut canvas = small_canvas(4);
        assert!(canvas.paint(1, 2, RED));
        let snap = canvas.snapshot();
        assert!(!canvas.paint(1, 2, RED));
        assert_eq!(canvas.snapshot(), snap);
    }

    #[test]
    fn test_snapshot_does_not_share_storage() {
        let mut canvas = small_canvas(3);
        let before = canvas.snapshot();
        canvas.paint(1, 1, RED);
        assert_eq!(before[1][1], PixelColor::WHITE);
        assert_eq!(canvas.get(1, 1), Some(RED));
    }

    #[test]
    fn test_zero_size_is_clamped() {
        let canvas = PixelCanvas::new(0, PixelColor::WHITE);
        assert_eq!(canvas.size(), 1);
        assert_eq!(canvas.snapshot(), vec![vec![PixelColor::WHITE]]);
    }

    // -- line rasterization --------------------------------------------------

    /// Independent restatement of integer Bresenham (doubled-error stepping,
    /// start-to-end direction preserved), used only to cross-check
    /// `line_cells`.  Direction matters: Bresenham is not symmetric under
    /// endpoint swap on exact-half ties, so the reference must walk the same
    /// way the stroke does.
    fn reference_line(from: (i32, i32), to: (i32, i32)) -> Vec<(i32, i32)> {
        let (mut r, mut c) = from;
        let (r1, c1) = to;
        let dr = (r1 - r).abs();
        let dc = (c1 - c).abs();
        let step_r = (r1 - r).signum();
        let step_c = (c1 - c).signum();
        let mut err = dr - dc;

        let mut out = vec![from];
        while (r, c) != (r1, c1) {
            let doubled = 2 * err;
            if doubled > -dc {
                err -= dc;
                r += step_r;
            }
            if doubled < dr {
                err += dr;
                c += step_c;
            }
            out.push((r, c));
        }
        out
    }

    #[test]
    fn test_line_contains_endpoints_and_is_connected() {
        let n = 8i32;
        for r0 in 0..n {
            for c0 in 0..n {
                for r1 in 0..n {
                    for c1 in 0..n {
                        let cells = line_cells((r0, c0), (r1, c1));
                        assert_eq!(cells.first(), Some(&(r0, c0)));
                        assert_eq!(cells.last(), Some(&(r1, c1)));
                        for pair in cells.windows(2) {
                            let dr = (pair[1].0 - pair[0].0).abs();
                            let dc = (pair[1].1 - pair[0].1).abs();
                            assert!(dr <= 1 && dc <= 1, "gap between {:?} and {:?}", pair[0], pair[1]);
                            assert!(dr + dc > 0, "duplicate cell {:?}", pair[0]);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_line_matches_reference_cell_for_cell() {
        let n = 8i32;
        for r0 in 0..n {
            for c0 in 0..n {
                for r1 in 0..n {
                    for c1 in 0..n {
                        assert_eq!(
                            line_cells((r0, c0), (r1, c1)),
                            reference_line((r0, c0), (r1, c1)),
                            "mismatch for ({},{}) -> ({},{})",
                            r0, c0, r1, c1
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_axis_aligned_lines() {
        let horiz = line_cells((2, 0), (2, 4));
        assert_eq!(horiz, vec![(2, 0), (2, 1), (2, 2), (2, 3), (2, 4)]);
        let vert = line_cells((4, 1), (0, 1));
        assert_eq!(vert, vec![(4, 1), (3, 1), (2, 1), (1, 1), (0, 1)]);
        assert_eq!(line_cells((3, 3), (3, 3)), vec![(3, 3)]);
    }

    #[test]
    fn test_paint_line_skips_out_of_bounds_cells() {
        // The target cell lies past the 3×3 grid: in-bounds cells along the
        // segment are painted, the rest are skipped without aborting.
        let mut canvas = small_canvas(3);
        assert!(canvas.paint_line((0, 0), (5, 5), RED));
        assert_eq!(canvas.get(0, 0), Some(RED));
        assert_eq!(canvas.get(1, 1), Some(RED));
        assert_eq!(canvas.get(2, 2), Some(RED));
        assert!(canvas.snapshot().iter().flatten().filter(|c| **c == RED).count() == 3);
    }

    // -- pointer mapping -----------------------------------------------------

    #[test]
    fn test_cell_at_maps_positions() {
        let origin = (10.0, 20.0);
        assert_eq!(cell_at((10.0, 20.0), origin, 16.0, 32), Some((0, 0)));
        assert_eq!(cell_at((25.9, 20.0), origin, 16.0, 32), Some((0, 0)));
        assert_eq!(cell_at((26.0, 52.0), origin, 16.0, 32), Some((2, 1)));
        // Bottom-right interior corner of the last cell.
        assert_eq!(cell_at((10.0 + 511.9, 20.0 + 511.9), origin, 16.0, 32), Some((31, 31)));
    }

    #[test]
    fn test_cell_at_rejects_outside_positions() {
        let origin = (0.0, 0.0);
        assert_eq!(cell_at((-0.1, 5.0), origin, 16.0, 32), None);
        assert_eq!(cell_at((5.0, -0.1), origin, 16.0, 32), None);
        assert_eq!(cell_at((512.0, 5.0), origin, 16.0, 32), None);
        assert_eq!(cell_at((5.0, 512.0), origin, 16.0, 32), None);
        assert_eq!(cell_at((5.0, 5.0), origin, 0.0, 32), None);
    }

    // -- stroke engine -------------------------------------------------------

    #[test]
    fn test_continue_before_begin_never_mutates() {
        let mut canvas = small_canvas(4);
        let mut stroke = StrokeEngine::new();
        assert!(!stroke.continue_stroke(&mut canvas, Some((1, 1)), RED));
        assert!(!canvas.has_content());
        assert!(!stroke.is_drawing());
    }

    #[test]
    fn test_begin_outside_grid_is_noop() {
        let mut canvas = small_canvas(4);
        let mut stroke = StrokeEngine::new();
        assert!(!stroke.begin_stroke(&mut canvas, None, RED));
        assert!(!stroke.is_drawing());
        assert!(!canvas.has_content());
    }

    #[test]
    fn test_diagonal_drag_paints_unbroken_stroke() {
        // End-to-end scenario from the drawing contract: N=4, begin at (0,0),
        // drag to (3,3) — exactly the diagonal turns red.
        let mut canvas = small_canvas(4);
        let mut stroke = StrokeEngine::new();
        assert!(stroke.begin_stroke(&mut canvas, Some((0, 0)), RED));
        assert!(stroke.continue_stroke(&mut canvas, Some((3, 3)), RED));
        stroke.end_stroke();

        for row in 0..4 {
            for col in 0..4 {
                let expected = if row == col { RED } else { PixelColor::WHITE };
                assert_eq!(canvas.get(row, col), Some(expected), "cell ({},{})", row, col);
            }
        }
    }

    #[test]
    fn test_stroke_resumes_after_leaving_grid() {
        let mut canvas = small_canvas(4);
        let mut stroke = StrokeEngine::new();
        stroke.begin_stroke(&mut canvas, Some((0, 0)), RED);
        // Pointer wanders off the surface: nothing painted, stroke stays live.
        assert!(!stroke.continue_stroke(&mut canvas, None, RED));
        assert!(stroke.is_drawing());
        // Re-entry draws the connecting line from the last painted cell.
        assert!(stroke.continue_stroke(&mut canvas, Some((0, 3)), RED));
        assert_eq!(canvas.get(0, 1), Some(RED));
        assert_eq!(canvas.get(0, 2), Some(RED));
    }

    #[test]
    fn test_same_cell_events_paint_once() {
        let mut canvas = small_canvas(4);
        let mut stroke = StrokeEngine::new();
        assert!(stroke.begin_stroke(&mut canvas, Some((2, 2)), RED));
        // Repeated move events inside one cell are cheap no-ops.
        assert!(!stroke.continue_stroke(&mut canvas, Some((2, 2)), RED));
        assert!(!stroke.continue_stroke(&mut canvas, Some((2, 2)), RED));
        let snap = canvas.snapshot();
        assert_eq!(snap.iter().flatten().filter(|c| **c == RED).count(), 1);
    }

    #[test]
    fn test_end_stroke_is_idempotent() {
        let mut stroke = StrokeEngine::new();
        stroke.end_stroke();
        stroke.end_stroke();
        assert!(!stroke.is_drawing());

        let mut canvas = small_canvas(4);
        stroke.begin_stroke(&mut canvas, Some((0, 0)), RED);
        stroke.end_stroke();
        // A new press starts a fresh stroke with no line back to (0,0).
        stroke.begin_stroke(&mut canvas, Some((3, 3)), RED);
        assert_eq!(canvas.get(1, 1), Some(PixelColor::WHITE));
        assert_eq!(canvas.get(2, 2), Some(PixelColor::WHITE));
    }

    #[test]
    fn test_has_content_after_single_paint() {
        let mut canvas = small_canvas(32);
        assert!(!canvas.has_content());
        canvas.paint(17, 3, PixelColor::BLACK);
        assert!(canvas.has_content());
        // Painting background color over background does not count as content.
        let mut blank = small_canvas(32);
        blank.paint(0, 0, PixelColor::WHITE);
        assert!(!blank.has_content());
    }
}
