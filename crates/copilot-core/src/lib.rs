//! copilot-core: client core for CAD Copilot.
//!
//! Owns the request lifecycle against the generation backend (`/api/generate`,
//! `/api/refine`, `/api/status`), the bounded recent-activity log, and the small
//! pieces of shell state (prompt draft, script export) that sit next to them.
//! Rendering lives in `copilot-viewport`; the window lives in the studio add-on.

mod activity_log;
mod backend;
mod config;
mod controller;
mod error;
mod export;
mod prompt;
mod protocol;
mod status;
mod storage;

pub use activity_log::{
    ActivityEntry, ActivityLog, Outcome, ACTIVITY_LOG_CAPACITY, ACTIVITY_LOG_KEY,
};
pub use backend::{GenerationBackend, HttpBackend};
pub use config::CopilotConfig;
pub use controller::{
    ControllerState, GenerationController, PipelineState, SubmitMode, SubmitOutcome,
};
pub use error::{CopilotError, CopilotResult};
pub use export::export_script;
pub use prompt::{PromptDraft, MAX_PROMPT_CHARS};
pub use protocol::{
    interpret_generation, ErrorDetail, GenerateRequest, GenerationResponse, GenerationResult,
    RefineRequest, ServiceStatus, StatusResponse,
};
pub use status::{HealthIndicator, HealthSnapshot, StatusMonitor};
pub use storage::{KeyValueStore, MemoryStore, SledStore, StorageError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
