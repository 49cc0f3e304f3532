//! Client configuration: defaults, then `config/copilot.toml`, then `COPILOT__*` env.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "config/copilot.toml";

/// CAD Copilot client configuration.
///
/// | Key | Default | Description |
/// |-----|---------|-------------|
/// | backend_url | http://127.0.0.1:8000 | Base URL for `/api/*` and relative mesh references. |
/// | request_timeout_secs | 240 | Generate/refine timeout. `0` disables the client-side timer. |
/// | status_poll_secs | 30 | Interval of the `/api/status` health poll. |
/// | storage_path | ./data | Directory holding the sled database for the activity log. |
/// | script_filename | model.py | Default filename for script export. |
/// | export_dir | . | Directory script export writes into. |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopilotConfig {
    pub backend_url: String,
    /// Backend budget is LLM (180s) + FreeCAD (30s); the default leaves slack on top.
    pub request_timeout_secs: u64,
    pub status_poll_secs: u64,
    pub storage_path: String,
    pub script_filename: String,
    pub export_dir: String,
}

impl Default for CopilotConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_secs: 240,
            status_poll_secs: 30,
            storage_path: "./data".to_string(),
            script_filename: "model.py".to_string(),
            export_dir: ".".to_string(),
        }
    }
}

impl CopilotConfig {
    /// Load config from file and environment. Precedence: env `COPILOT__*` > file
    /// (`COPILOT_CONFIG` path, else `config/copilot.toml`) > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("COPILOT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Same as [`CopilotConfig::load`] with an explicit file path. A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        let builder = config::Config::builder()
            .set_default("backend_url", defaults.backend_url)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs as i64)?
            .set_default("status_poll_secs", defaults.status_poll_secs as i64)?
            .set_default("storage_path", defaults.storage_path)?
            .set_default("script_filename", defaults.script_filename)?
            .set_default("export_dir", defaults.export_dir)?;

        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("COPILOT").separator("__"))
            .build()?;

        built.try_deserialize()
    }

    /// `None` when the timeout is disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// Never shorter than one second so a bad value cannot spin the poller.
    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_secs(self.status_poll_secs.max(1))
    }

    /// Sled database path for the activity log.
    pub fn history_db_path(&self) -> PathBuf {
        Path::new(&self.storage_path).join("copilot_history")
    }

    pub fn script_export_path(&self) -> PathBuf {
        Path::new(&self.export_dir).join(&self.script_filename)
    }
}
