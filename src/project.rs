use std::path::PathBuf;

use crate::canvas::{PixelCanvas, PixelColor};

/// The drawing currently open in the editor: canvas, caption, and where (if
/// anywhere) it lives on disk.
pub struct Draft {
    pub canvas: PixelCanvas,
    pub caption: String,
    /// `None` for unsaved/untitled drafts.
    pub path: Option<PathBuf>,
    pub is_dirty: bool,

    /// Display name (derived from path or "Untitled-X")
    pub name: String,
}

impl Draft {
    pub fn new_untitled(untitled_counter: usize, size: usize, background: PixelColor) -> Self {
        Self {
            canvas: PixelCanvas::new(size, background),
            caption: String::new(),
            path: None,
            is_dirty: false,
            name: format!("Untitled-{}", untitled_counter),
        }
    }

    pub fn from_file(path: PathBuf, canvas: PixelCanvas, caption: String) -> Self {
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        Self {
            canvas,
            caption,
            path: Some(path),
            is_dirty: false,
            name,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.is_dirty = false;
    }

    pub fn update_name_from_path(&mut self) {
        if let Some(ref path) = self.path {
            self.name = path
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "Unknown".to_string());
        }
    }

    /// Get the display title (name with dirty indicator)
    pub fn display_title(&self) -> String {
        if self.is_dirty {
            format!("{}*", self.name)
        } else {
            self.name.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_title_marks_dirty_drafts() {
        let mut draft = Draft::new_untitled(3, 4, PixelColor::WHITE);
        assert_eq!(draft.display_title(), "Untitled-3");
        draft.mark_dirty();
        assert_eq!(draft.display_title(), "Untitled-3*");
        draft.mark_clean();
        assert_eq!(draft.display_title(), "Untitled-3");
    }

    #[test]
    fn test_name_follows_path() {
        let mut draft = Draft::new_untitled(1, 4, PixelColor::WHITE);
        draft.path = Some(PathBuf::from("/tmp/cat.pxd"));
        draft.update_name_from_path();
        assert_eq!(draft.name, "cat.pxd");
    }
}
