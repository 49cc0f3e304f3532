//! Script export as a plain-text file.

use crate::error::CopilotResult;
use std::path::{Path, PathBuf};

/// Writes `script` to `dir/filename`, creating `dir` if needed. Returns the written path.
pub fn export_script(dir: &Path, filename: &str, script: &str) -> CopilotResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(filename);
    std::fs::write(&path, script)?;
    tracing::info!(path = %path.display(), bytes = script.len(), "script exported");
    Ok(path)
}
