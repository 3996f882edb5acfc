//! Draft persistence and PNG export.
//!
//! Drafts are bincode-serialized `.pxd` documents with a magic string inside
//! the payload for versioning.  PNG export scales each cell to a square block
//! so a 32×32 drawing becomes a crisp 512×512 image at the default scale.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::canvas::{PixelCanvas, PixelColor};
use crate::project::Draft;

const PXD_MAGIC_V1: &str = "PXD1";

/// Default per-cell block size for exported PNGs.
pub const DEFAULT_EXPORT_SCALE: u32 = 16;

// ============================================================================
// .pxd draft format
// ============================================================================

/// On-disk draft document (v1).  The magic is serialized as part of the
/// struct; `load_draft` peeks at it before trusting the rest of the bytes.
#[derive(Serialize, Deserialize)]
struct DraftFileV1 {
    magic: String,
    caption: String,
    canvas: PixelCanvas,
}

/// Write a draft to `path` as a v1 `.pxd` document.
pub fn save_draft(draft: &Draft, path: &Path) -> Result<(), String> {
    let doc = DraftFileV1 {
        magic: PXD_MAGIC_V1.to_string(),
        caption: draft.caption.clone(),
        canvas: draft.canvas.clone(),
    };
    let bytes = bincode::serialize(&doc).map_err(|e| format!("encode failed: {}", e))?;
    std::fs::write(path, bytes)
        .map_err(|e| format!("could not write '{}': {}", path.display(), e))
}

/// Load a draft document.  Returns the canvas and caption; the caller wraps
/// them into a [`Draft`] with the file path attached.
pub fn load_draft(path: &Path) -> Result<(PixelCanvas, String), String> {
    let raw = std::fs::read(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;

    // Bincode lays the struct out field-by-field, so the magic string sits at
    // a fixed offset: 8-byte length prefix, then the 4 magic chars.
    if raw.len() < 12 || &raw[8..12] != PXD_MAGIC_V1.as_bytes() {
        return Err(format!(
            "'{}' is not a PixelPost draft (bad or unsupported header)",
            path.display()
        ));
    }

    let doc: DraftFileV1 =
        bincode::deserialize(&raw).map_err(|e| format!("corrupt draft file: {}", e))?;
    Ok((doc.canvas, doc.caption))
}

// ============================================================================
// PNG export
// ============================================================================

/// Render the canvas to a PNG at `scale` screen pixels per cell.
pub fn export_png(canvas: &PixelCanvas, path: &Path, scale: u32) -> Result<(), String> {
    let scale = scale.max(1);
    let n = canvas.size() as u32;
    let edge = n * scale;
    let mut img = image::RgbImage::new(edge, edge);

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let row = (y / scale) as usize;
        let col = (x / scale) as usize;
        // Every position maps to a valid cell since edge = n * scale.
        let color = canvas.get(row, col).unwrap_or(PixelColor::WHITE);
        *pixel = image::Rgb([color.r, color.g, color.b]);
    }

    img.save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| format!("could not write '{}': {}", path.display(), e))
}

// ============================================================================
// Native file dialogs
// ============================================================================

/// Ask for a draft file to open.
pub fn pick_draft_to_open() -> Option<std::path::PathBuf> {
    rfd::FileDialog::new()
        .add_filter("PixelPost draft", &["pxd"])
        .pick_file()
}

/// Ask where to save the current draft.
pub fn pick_draft_save_path(suggested: &str) -> Option<std::path::PathBuf> {
    rfd::FileDialog::new()
        .add_filter("PixelPost draft", &["pxd"])
        .set_file_name(suggested)
        .save_file()
}

/// Ask where to export a PNG.
pub fn pick_png_export_path(suggested: &str) -> Option<std::path::PathBuf> {
    rfd::FileDialog::new()
        .add_filter("PNG image", &["png"])
        .set_file_name(suggested)
        .save_file()
}

// ============================================================================
// Tests
// ============================================================================
