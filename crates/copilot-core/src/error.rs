//! Error taxonomy for the generation pipeline.
//!
//! Variants describe where a failure came from; `user_message` collapses them into
//! the strings the shell shows in its error panel.

use std::time::Duration;
use thiserror::Error;

pub type CopilotResult<T> = Result<T, CopilotError>;

/// Shown for unreachable backends and bodies that are not JSON at all.
pub const CONNECTIVITY_MESSAGE: &str = "Failed to connect to backend.";

/// Shown when the backend signals failure without a structured error object.
pub const UNKNOWN_GENERATION_MESSAGE: &str = "Unknown Generation Error";

#[derive(Error, Debug)]
pub enum CopilotError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("backend error: {message}")]
    Backend {
        message: String,
        details: Option<String>,
        /// Machine code such as `ERR_VALIDATION`; kept for logs only.
        code: Option<String>,
    },

    #[error("backend reported failure without an error body (HTTP {0})")]
    UnknownBackendFailure(u16),

    #[error("unparseable response body: {0}")]
    MalformedBody(String),

    #[error("response is missing required field `{0}`")]
    IncompleteResponse(&'static str),

    #[error("refinement requested with no prior script")]
    MissingScript,

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CopilotError {
    /// User-facing text for the error panel.
    pub fn user_message(&self) -> String {
        match self {
            CopilotError::Backend {
                message, details, ..
            } => match details.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
                Some(d) => format!("{} ({})", message, d),
                None => message.clone(),
            },
            CopilotError::UnknownBackendFailure(_) | CopilotError::IncompleteResponse(_) => {
                UNKNOWN_GENERATION_MESSAGE.to_string()
            }
            CopilotError::Transport(_) | CopilotError::MalformedBody(_) => {
                CONNECTIVITY_MESSAGE.to_string()
            }
            CopilotError::Timeout(d) => format!("Request timed out after {}s.", d.as_secs()),
            CopilotError::MissingScript => {
                "Nothing to refine yet: generate a model before asking for changes.".to_string()
            }
            CopilotError::Config(e) => format!("Configuration error: {}", e),
            CopilotError::Io(e) => format!("File error: {}", e),
        }
    }
}

impl From<reqwest::Error> for CopilotError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // reqwest does not report the configured limit; the controller's own timer does.
            CopilotError::Transport(format!("timed out: {}", err))
        } else {
            CopilotError::Transport(err.to_string())
        }
    }
}
