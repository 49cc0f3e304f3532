//! Studio presentation settings: bundled default via include_str!, local file wins.

use serde::Deserialize;

const DEFAULT_UI_CONFIG: &str = include_str!("../assets/ui_config.json");

#[derive(Debug, Clone, Deserialize)]
pub struct StudioConfig {
    #[serde(default = "default_window_width")]
    pub window_width: f32,
    #[serde(default = "default_window_height")]
    pub window_height: f32,
    #[serde(default = "default_true")]
    pub theme_dark: bool,
    #[serde(default = "default_side_panel_width")]
    pub side_panel_width: f32,
    /// Radians per dragged pixel.
    #[serde(default = "default_sensitivity")]
    pub orbit_sensitivity: f32,
    /// Zoom steps per scrolled point.
    #[serde(default = "default_sensitivity")]
    pub zoom_sensitivity: f32,
}

fn default_window_width() -> f32 {
    1280.0
}
fn default_window_height() -> f32 {
    800.0
}
fn default_true() -> bool {
    true
}
fn default_side_panel_width() -> f32 {
    360.0
}
fn default_sensitivity() -> f32 {
    0.01
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self::parse(DEFAULT_UI_CONFIG)
    }
}

impl StudioConfig {
    /// `assets/ui_config.json` next to the manifest or under the working directory,
    /// else the bundled copy.
    pub fn load() -> Self {
        let manifest_assets = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets");
        let cwd_assets = std::env::current_dir()
            .ok()
            .map(|p| p.join("add-ons").join("copilot-studio-ui").join("assets"));

        let local = [Some(manifest_assets), cwd_assets]
            .into_iter()
            .flatten()
            .map(|dir| dir.join("ui_config.json"))
            .find(|p| p.exists())
            .and_then(|p| std::fs::read_to_string(p).ok());

        match local {
            Some(s) => Self::parse(&s),
            None => Self::default(),
        }
    }

    fn parse(s: &str) -> Self {
        serde_json::from_str(s).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ui_config.json unreadable; using built-in values");
            Self {
                window_width: default_window_width(),
                window_height: default_window_height(),
                theme_dark: default_true(),
                side_panel_width: default_side_panel_width(),
                orbit_sensitivity: default_sensitivity(),
                zoom_sensitivity: default_sensitivity(),
            }
        })
    }
}
