//! Application settings — hand-rolled `key=value` config file.
//!
//! Stored next to the user's other app config:
//!   Linux:    `~/.config/pixelpost/pixelpost_settings.cfg` (XDG respected)
//!   Windows:  `%APPDATA%\PixelPost\pixelpost_settings.cfg`
//!   macOS:    `~/Library/Application Support/PixelPost/pixelpost_settings.cfg`
//! Unknown keys are ignored so older builds can read newer files.

use std::path::PathBuf;

use crate::api::DEFAULT_SERVER_URL;
use crate::canvas::{DEFAULT_CELL_PIXELS, DEFAULT_GRID_SIZE, PixelColor};

#[derive(Clone, Debug, PartialEq)]
pub struct AppSettings {
    /// Base URL of the sharing backend (e.g. `http://localhost:8080/api`).
    pub server_url: String,
    /// Bearer token from the last login; empty when logged out.
    pub auth_token: String,
    /// Grid dimension N (the canvas is N×N).
    pub grid_size: usize,
    /// On-screen edge length of one cell, in points.
    pub cell_pixels: f32,
    /// Uniform background color of a fresh canvas.
    pub background: PixelColor,
    /// Paint color selected on startup.
    pub active_color: PixelColor,
    /// Draw cell borders over the canvas.
    pub show_grid_lines: bool,
    /// Dark UI theme.
    pub dark_mode: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            auth_token: String::new(),
            grid_size: DEFAULT_GRID_SIZE,
            cell_pixels: DEFAULT_CELL_PIXELS,
            background: PixelColor::WHITE,
            active_color: PixelColor::BLACK,
            show_grid_lines: true,
            dark_mode: true,
        }
    }
}

impl AppSettings {
    /// Path to the settings file, creating the config directory on the way.
    pub(crate) fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
                    PathBuf::from(home).join(".config")
                })
                .join("pixelpost");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join("pixelpost_settings.cfg"));
        }
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA")
                .or_else(|_| std::env::var("USERPROFILE"))
                .ok()?;
            let config_dir = PathBuf::from(appdata).join("PixelPost");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join("pixelpost_settings.cfg"));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            let config_dir = PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("PixelPost");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join("pixelpost_settings.cfg"));
        }
        #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
        {
            std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|d| d.join("pixelpost_settings.cfg")))
        }
    }

    /// Serialize to the config-file text form.
    fn to_config_string(&self) -> String {
        format!(
            "server_url={}\n\
             auth_token={}\n\
             grid_size={}\n\
             cell_pixels={}\n\
             background={}\n\
             active_color={}\n\
             show_grid_lines={}\n\
             dark_mode={}\n",
            self.server_url,
            self.auth_token,
            self.grid_size,
            self.cell_pixels,
            self.background.to_hex(),
            self.active_color.to_hex(),
            self.show_grid_lines,
            self.dark_mode,
        )
    }

    /// Apply one `key=value` line.  Unknown keys and unparsable values leave
    /// the current value untouched.
    fn apply_line(&mut self, key: &str, value: &str) {
        match key {
            "server_url" => {
                if !value.is_empty() {
                    self.server_url = value.to_string();
                }
            }
            "auth_token" => self.auth_token = value.to_string(),
            "grid_size" => {
                if let Ok(n) = value.parse::<usize>()
                    && (1..=256).contains(&n)
                {
                    self.grid_size = n;
                }
            }
            "cell_pixels" => {
                if let Ok(s) = value.parse::<f32>()
                    && s >= 2.0
                    && s <= 128.0
                {
                    self.cell_pixels = s;
                }
            }
            "background" => {
                if let Ok(c) = PixelColor::from_hex(value) {
                    self.background = c;
                }
            }
            "active_color" => {
                if let Ok(c) = PixelColor::from_hex(value) {
                    self.active_color = c;
                }
            }
            "show_grid_lines" => {
                if let Ok(b) = value.parse::<bool>() {
                    self.show_grid_lines = b;
                }
            }
            "dark_mode" => {
                if let Ok(b) = value.parse::<bool>() {
                    self.dark_mode = b;
                }
            }
            _ => {}
        }
    }

    /// Parse the config-file text form, starting from defaults.
    fn from_config_string(content: &str) -> Self {
        let mut settings = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                settings.apply_line(key.trim(), value.trim());
            }
        }
        settings
    }

    /// Load settings from disk; missing or unreadable file yields defaults.
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            return Self::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_config_string(&content),
            Err(_) => Self::default(),
        }
    }

    /// Save settings to disk.  Failures are logged, never fatal.
    pub fn save(&self) {
        let Some(path) = Self::settings_path() else {
            return;
        };
        if let Err(e) = std::fs::write(&path, self.to_config_string()) {
            log_warn!("could not save settings to {:?}: {}", path, e);
        }
    }

    pub fn is_logged_in(&self) -> bool {
        !self.auth_token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_round_trip() {
        let mut settings = AppSettings::default();
        settings.server_url = "https://pixels.example/api".to_string();
        settings.auth_token = "tok123".to_string();
        settings.grid_size = 16;
        settings.cell_pixels = 24.0;
        settings.background = PixelColor::new(10, 20, 30);
        settings.active_color = PixelColor::new(200, 100, 0);
        settings.show_grid_lines = false;
        settings.dark_mode = false;

        let text = settings.to_config_string();
        assert_eq!(AppSettings::from_config_string(&text), settings);
    }

    #[test]
    fn test_unknown_keys_and_garbage_are_ignored() {
        let text = "grid_size=16\nshiny_new_option=yes\nnot a key value line\ncell_pixels=banana\n";
        let settings = AppSettings::from_config_string(text);
        assert_eq!(settings.grid_size, 16);
        assert_eq!(settings.cell_pixels, DEFAULT_CELL_PIXELS);
    }

    #[test]
    fn test_out_of_range_values_keep_defaults() {
        let settings = AppSettings::from_config_string("grid_size=0\ncell_pixels=0.5\n");
        assert_eq!(settings.grid_size, DEFAULT_GRID_SIZE);
        assert_eq!(settings.cell_pixels, DEFAULT_CELL_PIXELS);
    }

    #[test]
    fn test_empty_content_is_defaults() {
        assert_eq!(AppSettings::from_config_string(""), AppSettings::default());
    }
}
