use eframe::egui;
use std::time::{Duration, Instant};

// ============================================================================
// CLEAR CONFIRMATION DIALOG
// ============================================================================

/// Yes/no acknowledgment before wiping the canvas.  The app only opens this
/// when the canvas actually has content; clearing an already-blank canvas is
/// a silent no-op.
#[derive(Default)]
pub struct ClearConfirmDialog {
    pub open: bool,
}

impl ClearConfirmDialog {
    /// Show the dialog.  Returns `Some(true)` when the user confirms,
    /// `Some(false)` on cancel, `None` while still open.
    pub fn show(&mut self, ctx: &egui::Context) -> Option<bool> {
        if !self.open {
            return None;
        }

        // Keyboard: Enter = confirm, Esc = cancel
        let enter = ctx.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::Enter));
        let esc = ctx.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::Escape));

        let mut result = if enter {
            Some(true)
        } else if esc {
            Some(false)
        } else {
            None
        };

        egui::Window::new("clear_confirm_dialog")
            .title_bar(false)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.set_min_width(300.0);
                ui.heading("Clear canvas?");
                ui.add_space(4.0);
                ui.label("This wipes every pixel back to the background color. It cannot be undone.");
                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    if ui.button("Clear").clicked() {
                        result = Some(true);
                    }
                    if ui.button("Cancel").clicked() {
                        result = Some(false);
                    }
                });
            });

        if result.is_some() {
            self.open = false;
        }
        result
    }
}

// ============================================================================
// LOGIN DIALOG
// ============================================================================

pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Default)]
pub struct LoginDialog {
    pub open: bool,
    email: String,
    password: String,
    /// Last failure message, shown inline until the next attempt.
    error: Option<String>,
    pub pending: bool,
}

impl LoginDialog {
    pub fn open_fresh(&mut self) {
        self.open = true;
        self.error = None;
        self.pending = false;
        self.password.clear();
    }

    pub fn set_error(&mut self, message: String) {
        self.error = Some(message);
        self.pending = false;
    }

    /// Show the dialog.  Returns a request when the user submits credentials;
    /// the app keeps the dialog open (pending) until the network result
    /// arrives and calls [`Self::close`] or [`Self::set_error`].
    pub fn show(&mut self, ctx: &egui::Context) -> Option<LoginRequest> {
        if !self.open {
            return None;
        }

        let enter = ctx.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::Enter));
        let esc = ctx.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::Escape));
        if esc && !self.pending {
            self.open = false;
            return None;
        }

        let mut submitted = false;
        egui::Window::new("login_dialog")
            .title_bar(false)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.set_min_width(280.0);
                ui.heading("Log in");
                ui.add_space(6.0);

                egui::Grid::new("login_grid")
                    .num_columns(2)
                    .spacing([8.0, 6.0])
                    .show(ui, |ui| {
                        ui.label("Email");
                        ui.text_edit_singleline(&mut self.email);
                        ui.end_row();
                        ui.label("Password");
                        ui.add(egui::TextEdit::singleline(&mut self.password).password(true));
                        ui.end_row();
                    });

                if let Some(err) = &self.error {
                    ui.add_space(4.0);
                    ui.colored_label(egui::Color32::LIGHT_RED, err);
                }

                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    let can_submit =
                        !self.pending && !self.email.trim().is_empty() && !self.password.is_empty();
                    let label = if self.pending { "Logging in…" } else { "Log in" };
                    if ui.add_enabled(can_submit, egui::Button::new(label)).clicked()
                        || (enter && can_submit)
                    {
                        submitted = true;
                    }
                    if ui
                        .add_enabled(!self.pending, egui::Button::new("Cancel"))
                        .clicked()
                    {
                        self.open = false;
                    }
                });
            });

        if submitted {
            self.pending = true;
            self.error = None;
            Some(LoginRequest {
                email: self.email.trim().to_string(),
                password: self.password.clone(),
            })
        } else {
            None
        }
    }

    pub fn close(&mut self) {
        self.open = false;
        self.pending = false;
        self.password.clear();
    }
}

// ============================================================================
// TOASTS — transient status messages
// ============================================================================

#[derive(Clone, Copy, PartialEq)]
pub enum ToastLevel {
    Info,
    Error,
}

struct Toast {
    text: String,
    level: ToastLevel,
    born: Instant,
}

/// Bottom-center stack of auto-expiring messages.  Validation rejections and
/// network outcomes land here; nothing in this app raises a modal error.
#[derive(Default)]
pub struct Toasts {
    entries: Vec<Toast>,
}

const TOAST_TTL: Duration = Duration::from_secs(4);

impl Toasts {
    pub fn info(&mut self, text: impl Into<String>) {
        self.push(text.into(), ToastLevel::Info);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(text.into(), ToastLevel::Error);
    }

    fn push(&mut self, text: String, level: ToastLevel) {
        self.entries.push(Toast {
            text,
            level,
            born: Instant::now(),
        });
        // Keep the stack short; oldest messages yield first.
        if self.entries.len() > 4 {
            self.entries.remove(0);
        }
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        self.entries.retain(|t| t.born.elapsed() < TOAST_TTL);
        if self.entries.is_empty() {
            return;
        }
        // Keep repainting so messages fade out on schedule even when idle.
        ctx.request_repaint_after(Duration::from_millis(250));

        egui::Area::new(egui::Id::new("toast_stack"))
            .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -24.0])
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                for toast in &self.entries {
                    let (bg, fg) = match toast.level {
                        ToastLevel::Info => {
                            (egui::Color32::from_rgb(30, 60, 35), egui::Color32::LIGHT_GREEN)
                        }
                        ToastLevel::Error => {
                            (egui::Color32::from_rgb(70, 25, 25), egui::Color32::LIGHT_RED)
                        }
                    };
                    egui::Frame::none()
                        .fill(bg)
                        .rounding(6.0)
                        .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                        .show(ui, |ui| {
                            ui.colored_label(fg, &toast.text);
                        });
                    ui.add_space(4.0);
                }
            });
    }
}
