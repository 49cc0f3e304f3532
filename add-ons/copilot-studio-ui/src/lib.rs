//! copilot-studio-ui: desktop shell for CAD Copilot.
//!
//! Prompt and history on the left, the mesh viewport in the middle, the generated
//! script on the right. All request state comes from `copilot_core::GenerationController`.

pub mod app;
pub mod config;
pub mod panels;

pub use app::{build_studio_stack, StudioStack};
pub use config::StudioConfig;
