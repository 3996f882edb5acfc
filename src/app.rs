use eframe::egui;
use std::sync::mpsc;
use std::thread;

use crate::api::{ApiClient, FEED_PAGE_SIZE, FeedPage, PostPayload};
use crate::components::colors::ColorsPanel;
use crate::components::dialogs::{ClearConfirmDialog, LoginDialog, Toasts};
use crate::components::editor::EditorPanel;
use crate::components::feed::{FeedAction, FeedPanel};
use crate::io;
use crate::project::Draft;
use crate::settings::AppSettings;

// ============================================================================
// ASYNC NET PIPELINE — background requests with channel completion
// ============================================================================

/// Result delivered from a background network thread.  The update loop
/// drains these with `try_recv` before laying out the frame.
pub enum NetResult {
    /// `POST /posts` accepted the drawing.
    PostPublished,
    PublishFailed(String),
    /// One page of the recent feed arrived.
    FeedPage(FeedPage),
    FeedFailed(String),
    /// The server acknowledged a like toggle for this post id.
    LikeToggled(String),
    LikeFailed(String),
    /// Login succeeded; carries the bearer token.
    LoggedIn(String),
    LoginFailed(String),
}

/// Completion side of the background pipeline.  Delivering a result also
/// wakes the UI thread, which may otherwise sit idle with no input events
/// and never reach the next `try_recv`.
#[derive(Clone)]
struct NetPipe {
    sender: mpsc::Sender<NetResult>,
    ctx: egui::Context,
}

impl NetPipe {
    fn send(&self, result: NetResult) {
        let _ = self.sender.send(result);
        self.ctx.request_repaint();
    }
}

pub struct PixelPostApp {
    settings: AppSettings,
    /// Settings snapshot from the last disk write, used to persist on change.
    persisted_settings: AppSettings,

    draft: Draft,
    untitled_counter: usize,

    // UI components
    editor: EditorPanel,
    colors_panel: ColorsPanel,
    feed_panel: FeedPanel,
    show_feed: bool,

    // Dialogs & messages
    clear_dialog: ClearConfirmDialog,
    login_dialog: LoginDialog,
    toasts: Toasts,

    // Background network pipeline
    net_pipe: NetPipe,
    net_receiver: mpsc::Receiver<NetResult>,
    publish_pending: bool,
}

impl PixelPostApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = AppSettings::load();
        cc.egui_ctx.set_visuals(if settings.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });

        let (net_sender, net_receiver) = mpsc::channel();
        let net_pipe = NetPipe {
            sender: net_sender,
            ctx: cc.egui_ctx.clone(),
        };
        let untitled_counter = 1;
        let draft = Draft::new_untitled(untitled_counter, settings.grid_size, settings.background);
        let colors_panel = ColorsPanel::new(settings.active_color);

        let mut app = Self {
            persisted_settings: settings.clone(),
            settings,
            draft,
            untitled_counter,
            editor: EditorPanel::new(),
            colors_panel,
            feed_panel: FeedPanel::new(),
            show_feed: true,
            clear_dialog: ClearConfirmDialog::default(),
            login_dialog: LoginDialog::default(),
            toasts: Toasts::default(),
            net_pipe,
            net_receiver,
            publish_pending: false,
        };
        app.fetch_feed_page(0);
        app
    }

    // -- background requests -------------------------------------------------

    fn client(&self) -> Result<ApiClient, String> {
        let token = if self.settings.auth_token.is_empty() {
            None
        } else {
            Some(self.settings.auth_token.clone())
        };
        ApiClient::new(&self.settings.server_url, token)
    }

    fn fetch_feed_page(&mut self, page: usize) {
        if self.feed_panel.loading {
            return;
        }
        let client = match self.client() {
            Ok(c) => c,
            Err(e) => {
                self.feed_panel.apply_error(e);
                return;
            }
        };
        self.feed_panel.loading = true;
        let pipe = self.net_pipe.clone();
        thread::spawn(move || {
            let result = match client.recent_posts(page, FEED_PAGE_SIZE) {
                Ok(page) => NetResult::FeedPage(page),
                Err(e) => NetResult::FeedFailed(e),
            };
            pipe.send(result);
        });
    }

    fn toggle_like(&mut self, post_id: String) {
        if !self.settings.is_logged_in() {
            self.toasts.error("Log in to like posts");
            return;
        }
        let client = match self.client() {
            Ok(c) => c,
            Err(e) => {
                self.toasts.error(e);
                return;
            }
        };
        let pipe = self.net_pipe.clone();
        thread::spawn(move || {
            let result = match client.toggle_like(&post_id) {
                Ok(()) => NetResult::LikeToggled(post_id),
                Err(e) => NetResult::LikeFailed(e),
            };
            pipe.send(result);
        });
    }

    /// Validate the draft and hand it to the posting endpoint.  Validation
    /// failures surface as toasts; no network call is attempted for them.
    fn publish(&mut self) {
        if self.publish_pending {
            return;
        }
        if !self.draft.canvas.has_content() {
            self.toasts.error("Canvas is empty! Draw something");
            return;
        }
        let title = self.draft.caption.trim().to_string();
        if title.is_empty() {
            self.toasts.error("Please write a description for your post");
            return;
        }
        if !self.settings.is_logged_in() {
            self.toasts.error("Log in before publishing");
            return;
        }
        let client = match self.client() {
            Ok(c) => c,
            Err(e) => {
                self.toasts.error(e);
                return;
            }
        };

        let payload = PostPayload {
            title,
            pixel_data: self.draft.canvas.snapshot(),
        };
        self.publish_pending = true;
        let pipe = self.net_pipe.clone();
        thread::spawn(move || {
            let result = match client.submit_post(&payload) {
                Ok(()) => NetResult::PostPublished,
                Err(e) => NetResult::PublishFailed(e),
            };
            pipe.send(result);
        });
    }

    fn login(&mut self, email: String, password: String) {
        let client = match self.client() {
            Ok(c) => c,
            Err(e) => {
                self.login_dialog.set_error(e);
                return;
            }
        };
        let pipe = self.net_pipe.clone();
        thread::spawn(move || {
            let result = match client.login(&email, &password) {
                Ok(token) => NetResult::LoggedIn(token),
                Err(e) => NetResult::LoginFailed(e),
            };
            pipe.send(result);
        });
    }

    fn drain_net_results(&mut self) {
        while let Ok(result) = self.net_receiver.try_recv() {
            match result {
                NetResult::PostPublished => {
                    self.publish_pending = false;
                    log_info!("published '{}'", self.draft.caption.trim());
                    self.toasts.info("Posted!");
                    self.untitled_counter += 1;
                    self.draft = Draft::new_untitled(
                        self.untitled_counter,
                        self.settings.grid_size,
                        self.settings.background,
                    );
                    self.fetch_feed_page(0);
                }
                NetResult::PublishFailed(e) => {
                    self.publish_pending = false;
                    log_err!("publish failed: {}", e);
                    self.toasts.error(format!("Could not publish: {}", e));
                }
                NetResult::FeedPage(page) => {
                    self.feed_panel.apply_page(page);
                }
                NetResult::FeedFailed(e) => {
                    log_warn!("feed fetch failed: {}", e);
                    self.feed_panel.apply_error(e);
                }
                NetResult::LikeToggled(post_id) => {
                    self.feed_panel.apply_like_toggled(&post_id);
                }
                NetResult::LikeFailed(e) => {
                    self.toasts.error(format!("Could not like post: {}", e));
                }
                NetResult::LoggedIn(token) => {
                    log_info!("logged in");
                    self.settings.auth_token = token;
                    self.login_dialog.close();
                    self.toasts.info("Logged in");
                    // Refetch so `liked` flags reflect the account.
                    self.fetch_feed_page(0);
                }
                NetResult::LoginFailed(e) => {
                    log_warn!("login failed: {}", e);
                    self.login_dialog.set_error(e);
                }
            }
        }
    }

    // -- draft file actions --------------------------------------------------

    fn new_draft(&mut self) {
        self.untitled_counter += 1;
        self.draft = Draft::new_untitled(
            self.untitled_counter,
            self.settings.grid_size,
            self.settings.background,
        );
    }

    fn open_draft(&mut self) {
        let Some(path) = io::pick_draft_to_open() else {
            return;
        };
        match io::load_draft(&path) {
            Ok((canvas, caption)) => {
                log_info!("opened draft {:?}", path);
                self.draft = Draft::from_file(path, canvas, caption);
            }
            Err(e) => {
                log_err!("open failed: {}", e);
                self.toasts.error(e);
            }
        }
    }

    fn save_draft(&mut self, always_ask: bool) {
        let path = match (&self.draft.path, always_ask) {
            (Some(p), false) => p.clone(),
            _ => {
                let suggested = format!("{}.pxd", self.draft.name.trim_end_matches(".pxd"));
                match io::pick_draft_save_path(&suggested) {
                    Some(p) => p,
                    None => return,
                }
            }
        };

        match io::save_draft(&self.draft, &path) {
            Ok(()) => {
                self.draft.path = Some(path);
                self.draft.update_name_from_path();
                self.draft.mark_clean();
                self.toasts.info("Draft saved");
            }
            Err(e) => {
                log_err!("save failed: {}", e);
                self.toasts.error(e);
            }
        }
    }

    fn export_png(&mut self) {
        let suggested = format!("{}.png", self.draft.name.trim_end_matches(".pxd"));
        let Some(path) = io::pick_png_export_path(&suggested) else {
            return;
        };
        match io::export_png(&self.draft.canvas, &path, io::DEFAULT_EXPORT_SCALE) {
            Ok(()) => self.toasts.info("PNG exported"),
            Err(e) => {
                log_err!("export failed: {}", e);
                self.toasts.error(e);
            }
        }
    }

    /// Clear is confirmation-gated; an already-blank canvas skips the dialog
    /// and the whole operation is a no-op.
    fn request_clear(&mut self) {
        if self.draft.canvas.has_content() {
            self.clear_dialog.open = true;
        }
    }

    // -- layout --------------------------------------------------------------

    fn show_menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("New").clicked() {
                        self.new_draft();
                        ui.close_menu();
                    }
                    if ui.button("Open Draft…").clicked() {
                        self.open_draft();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Save Draft").clicked() {
                        self.save_draft(false);
                        ui.close_menu();
                    }
                    if ui.button("Save Draft As…").clicked() {
                        self.save_draft(true);
                        ui.close_menu();
                    }
                    if ui.button("Export PNG…").clicked() {
                        self.export_png();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Account", |ui| {
                    if self.settings.is_logged_in() {
                        if ui.button("Log out").clicked() {
                            self.settings.auth_token.clear();
                            self.toasts.info("Logged out");
                            ui.close_menu();
                        }
                    } else if ui.button("Log in…").clicked() {
                        self.login_dialog.open_fresh();
                        ui.close_menu();
                    }
                    ui.separator();
                    ui.label("Server");
                    ui.text_edit_singleline(&mut self.settings.server_url);
                });

                ui.menu_button("View", |ui| {
                    ui.checkbox(&mut self.show_feed, "Feed panel");
                    ui.checkbox(&mut self.settings.show_grid_lines, "Grid lines");
                    if ui.checkbox(&mut self.settings.dark_mode, "Dark mode").changed() {
                        ctx.set_visuals(if self.settings.dark_mode {
                            egui::Visuals::dark()
                        } else {
                            egui::Visuals::light()
                        });
                    }
                });
            });
        });
    }

    fn show_side_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("tools_panel")
            .resizable(false)
            .default_width(230.0)
            .show(ctx, |ui| {
                ui.add_space(8.0);
                self.colors_panel.show(ui);
                self.settings.active_color = self.colors_panel.active_color();

                ui.add_space(10.0);
                ui.separator();
                ui.label("Description");
                ui.add(
                    egui::TextEdit::multiline(&mut self.draft.caption)
                        .desired_rows(3)
                        .desired_width(f32::INFINITY)
                        .hint_text("Write a description for your pixel art..."),
                );

                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    if ui.button("Clear").on_hover_text("Clear canvas").clicked() {
                        self.request_clear();
                    }
                    let label = if self.publish_pending {
                        "Submitting…"
                    } else {
                        "Submit"
                    };
                    if ui
                        .add_enabled(!self.publish_pending, egui::Button::new(label))
                        .clicked()
                    {
                        self.publish();
                    }
                });

                if !self.settings.is_logged_in() {
                    ui.add_space(6.0);
                    ui.small("Not logged in — publishing is disabled.");
                }
            });
    }

    fn show_feed_panel(&mut self, ctx: &egui::Context) {
        let mut action = None;
        egui::SidePanel::left("feed_panel")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                action = self.feed_panel.show(ui);
            });
        match action {
            Some(FeedAction::Refresh) => self.fetch_feed_page(0),
            Some(FeedAction::LoadMore) => self.fetch_feed_page(self.feed_panel.next_page()),
            Some(FeedAction::ToggleLike(id)) => self.toggle_like(id),
            None => {}
        }
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.draft.display_title());
                ui.separator();
                ui.label(format!(
                    "{}×{}",
                    self.draft.canvas.size(),
                    self.draft.canvas.size()
                ));
                if self.editor.is_drawing() {
                    ui.separator();
                    ui.label("drawing");
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.small(&self.settings.server_url);
                });
            });
        });
    }

    /// Write settings to disk when they changed this frame.
    fn persist_settings_if_changed(&mut self) {
        if self.settings != self.persisted_settings {
            self.settings.save();
            self.persisted_settings = self.settings.clone();
        }
    }
}

impl eframe::App for PixelPostApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_net_results();

        self.show_menu_bar(ctx);
        self.show_status_bar(ctx);
        self.show_side_panel(ctx);
        if self.show_feed {
            self.show_feed_panel(ctx);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::both().show(ui, |ui| {
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    ui.add_space(8.0);
                    let changed = self.editor.show(
                        ui,
                        &mut self.draft.canvas,
                        self.colors_panel.active_color(),
                        self.settings.cell_pixels,
                        self.settings.show_grid_lines,
                    );
                    if changed {
                        self.draft.mark_dirty();
                    }
                });
            });
        });

        // Dialogs and overlays
        if let Some(confirmed) = self.clear_dialog.show(ctx) {
            if confirmed {
                self.draft.canvas.clear();
                self.draft.mark_dirty();
                log_info!("canvas cleared");
            }
        }
        if let Some(request) = self.login_dialog.show(ctx) {
            self.login(request.email, request.password);
        }
        self.toasts.show(ctx);

        self.persist_settings_if_changed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_send_wakes_an_idle_ui() {
        // A result landing while the window is idle must both arrive on the
        // channel and schedule a repaint, or it would sit undrained until
        // the next unrelated input event.
        let (sender, receiver) = mpsc::channel();
        let ctx = egui::Context::default();
        let pipe = NetPipe {
            sender,
            ctx: ctx.clone(),
        };

        let worker = thread::spawn(move || pipe.send(NetResult::LikeToggled("p1".to_string())));
        worker.join().unwrap();

        assert!(matches!(
            receiver.try_recv(),
            Ok(NetResult::LikeToggled(id)) if id == "p1"
        ));
        assert!(ctx.has_requested_repaint());
    }
}
