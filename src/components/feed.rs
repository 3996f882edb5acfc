use eframe::egui;
use egui::{Color32, ColorImage, TextureHandle, TextureOptions};
use std::collections::HashMap;

use crate::api::{FeedPage, Post};

// ============================================================================
// FeedPanel — recent posts from the sharing server
// ============================================================================

/// Action the app should run in response to feed interaction.
pub enum FeedAction {
    /// Fetch page 0, discarding what is loaded.
    Refresh,
    /// Fetch the next page and append it.
    LoadMore,
    /// Toggle the current user's like on a post.
    ToggleLike(String),
}

/// Page-at-a-time list of recent posts with thumbnails rendered straight
/// from the inline pixel data.
#[derive(Default)]
pub struct FeedPanel {
    posts: Vec<Post>,
    next_page: usize,
    reached_end: bool,
    pub loading: bool,
    /// Last fetch error, shown inline until the next refresh.
    pub error: Option<String>,
    thumbnails: HashMap<String, TextureHandle>,
}

impl FeedPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Install a fetched page.  Page 0 replaces the list; later pages append.
    /// The server's `last` flag decides when to stop offering "Load more".
    pub fn apply_page(&mut self, page: FeedPage) {
        self.loading = false;
        self.error = None;
        self.reached_end = page.last;
        if page.number == 0 {
            self.posts = page.content;
            self.thumbnails.clear();
        } else {
            self.posts.extend(page.content);
        }
        self.next_page = page.number + 1;
    }

    pub fn apply_error(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
    }

    /// Optimistically flip the like state after the server accepted a toggle.
    pub fn apply_like_toggled(&mut self, post_id: &str) {
        if let Some(post) = self.posts.iter_mut().find(|p| p.id == post_id) {
            post.liked = !post.liked;
            post.like_count += if post.liked { 1 } else { -1 };
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui) -> Option<FeedAction> {
        let mut action = None;

        ui.horizontal(|ui| {
            ui.heading("Recent");
            if ui
                .add_enabled(!self.loading, egui::Button::new("⟳"))
                .on_hover_text("Refresh feed")
                .clicked()
            {
                action = Some(FeedAction::Refresh);
            }
        });
        ui.separator();

        if let Some(err) = &self.error {
            ui.colored_label(Color32::LIGHT_RED, err);
            ui.add_space(4.0);
        }

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                // Indexed loop: thumbnail_for needs &mut self, which an
                // iterator over self.posts would hold borrowed.
                for idx in 0..self.posts.len() {
                    if let Some(a) = self.show_post(ui, idx) {
                        action = Some(a);
                    }
                    ui.add_space(8.0);
                }

                if self.loading {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Loading…");
                    });
                } else if !self.reached_end && !self.posts.is_empty() {
                    if ui.button("Load more").clicked() {
                        action = Some(FeedAction::LoadMore);
                    }
                } else if self.posts.is_empty() && self.error.is_none() {
                    ui.label("No posts yet.");
                }
            });

        action
    }

    fn show_post(&mut self, ui: &mut egui::Ui, idx: usize) -> Option<FeedAction> {
        let texture = self.thumbnail_for(ui, idx);
        let post = &self.posts[idx];
        let mut action = None;

        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.horizontal(|ui| {
                if let Some(tex) = &texture {
                    let sized = egui::load::SizedTexture::new(tex.id(), egui::vec2(72.0, 72.0));
                    ui.image(sized);
                }
                ui.vertical(|ui| {
                    ui.strong(&post.title);
                    ui.small(format!("by {}", post.author_username));
                    ui.horizontal(|ui| {
                        let heart = if post.liked { "♥" } else { "♡" };
                        if ui
                            .button(format!("{} {}", heart, post.like_count))
                            .on_hover_text("Like")
                            .clicked()
                        {
                            action = Some(FeedAction::ToggleLike(post.id.clone()));
                        }
                        ui.small(format!("💬 {}", post.comment_count));
                    });
                });
            });
        });

        action
    }

    /// Build (and cache) the thumbnail texture for one post.  Posts without
    /// inline pixel data get a flat placeholder.
    fn thumbnail_for(&mut self, ui: &egui::Ui, idx: usize) -> Option<TextureHandle> {
        let post = &self.posts[idx];
        if let Some(tex) = self.thumbnails.get(&post.id) {
            return Some(tex.clone());
        }

        let image = match &post.pixel_data {
            Some(rows) if !rows.is_empty() => {
                let n = rows.len();
                let mut pixels = Vec::with_capacity(n * n);
                for row in rows {
                    for col in 0..n {
                        let c = row.get(col).copied().unwrap_or(crate::canvas::PixelColor::WHITE);
                        pixels.push(Color32::from_rgb(c.r, c.g, c.b));
                    }
                }
                ColorImage {
                    size: [n, n],
                    pixels,
                }
            }
            _ => ColorImage::new([8, 8], Color32::from_gray(60)),
        };

        let texture = ui.ctx().load_texture(
            format!("feed_thumb_{}", post.id),
            image,
            // Nearest filtering keeps the pixel art crisp at any zoom.
            TextureOptions::NEAREST,
        );
        self.thumbnails.insert(post.id.clone(), texture.clone());
        Some(texture)
    }

    pub fn next_page(&self) -> usize {
        self.next_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: &str) -> Post {
        serde_json::from_str(&format!(r#"{{"id":"{}","title":"t","likeCount":1}}"#, id)).unwrap()
    }

    fn page(number: usize, last: bool, ids: &[&str]) -> FeedPage {
        FeedPage {
            content: ids.iter().map(|id| post(id)).collect(),
            last,
            number,
        }
    }

    #[test]
    fn test_apply_page_replaces_then_appends() {
        let mut feed = FeedPanel::new();
        feed.apply_page(page(0, false, &["a", "b"]));
        assert_eq!(feed.posts.len(), 2);
        assert!(!feed.reached_end);
        assert_eq!(feed.next_page(), 1);

        feed.apply_page(page(1, true, &["c"]));
        assert_eq!(feed.posts.len(), 3);
        assert!(feed.reached_end, "server's last flag marks the end");

        feed.apply_page(page(0, true, &["d"]));
        assert_eq!(feed.posts.len(), 1, "refresh replaces the list");
    }

    #[test]
    fn test_reached_end_follows_last_flag_not_page_length() {
        // A full-length page can still be the final one; only the envelope's
        // last flag decides.
        let mut feed = FeedPanel::new();
        let ids: Vec<String> = (0..12).map(|i| i.to_string()).collect();
        let refs: Vec<&str> = ids.iter().map(|s| s.as_str()).collect();
        feed.apply_page(page(0, true, &refs));
        assert_eq!(feed.posts.len(), 12);
        assert!(feed.reached_end);

        let mut feed = FeedPanel::new();
        feed.apply_page(page(0, false, &["solo"]));
        assert!(!feed.reached_end, "a short page alone does not end the feed");
    }

    #[test]
    fn test_apply_like_toggled_flips_count() {
        let mut feed = FeedPanel::new();
        feed.apply_page(page(0, true, &["a"]));
        feed.apply_like_toggled("a");
        assert!(feed.posts[0].liked);
        assert_eq!(feed.posts[0].like_count, 2);
        feed.apply_like_toggled("a");
        assert!(!feed.posts[0].liked);
        assert_eq!(feed.posts[0].like_count, 1);
    }
}
