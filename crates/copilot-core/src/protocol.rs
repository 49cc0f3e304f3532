//! Wire types for the generation backend and the rules for reading its answers.

use crate::error::{CopilotError, CopilotResult};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest<'a> {
    pub prompt: &'a str,
}

/// Body of `POST /api/refine`.
#[derive(Debug, Clone, Serialize)]
pub struct RefineRequest<'a> {
    pub original_code: &'a str,
    pub instruction: &'a str,
}

/// Structured failure from the backend (`error` object).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorDetail {
    /// `validation_error`, `execution_error`, `timeout`, `llm_error`, `internal_error`.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

/// Shared shape of generate/refine answers. On success `code` is the script;
/// on failure the backend reuses it for an `ERR_*` code.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub stl_url: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub error: Option<ErrorDetail>,
}

/// Outcome of a successful generation or refinement. Replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub mesh_reference: String,
    pub script_text: String,
}

/// Reads a generate/refine answer.
///
/// Non-2xx or `status: "error"` is a failure even when the transport succeeded;
/// a body that is not the expected JSON object is reported as `MalformedBody`.
pub fn interpret_generation(http_status: u16, body: &[u8]) -> CopilotResult<GenerationResult> {
    let parsed: GenerationResponse =
        serde_json::from_slice(body).map_err(|e| CopilotError::MalformedBody(e.to_string()))?;

    let http_ok = (200..300).contains(&http_status);
    if !http_ok || parsed.status.as_deref() == Some("error") {
        let code = parsed.code;
        return Err(match parsed.error {
            Some(ErrorDetail {
                message: Some(message),
                details,
                kind,
            }) => {
                tracing::debug!(kind = ?kind, code = ?code, "backend reported structured error");
                CopilotError::Backend {
                    message,
                    details,
                    code,
                }
            }
            _ => CopilotError::UnknownBackendFailure(http_status),
        });
    }

    let mesh_reference = parsed
        .stl_url
        .filter(|u| !u.trim().is_empty())
        .ok_or(CopilotError::IncompleteResponse("stl_url"))?;
    let script_text = parsed.code.ok_or(CopilotError::IncompleteResponse("code"))?;

    Ok(GenerationResult {
        mesh_reference,
        script_text,
    })
}

/// Overall health reported by `GET /api/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Ok,
    Warning,
    Error,
    #[serde(other)]
    Unknown,
}

/// `GET /api/status` body. Only `status` is required; the rest feeds the tooltip.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub status: ServiceStatus,
    #[serde(default)]
    pub ollama_reachable: Option<bool>,
    #[serde(default)]
    pub freecad_available: Option<bool>,
    #[serde(default)]
    pub freecad_executable: Option<String>,
    #[serde(default)]
    pub rag_status: Option<serde_json::Value>,
    #[serde(default)]
    pub output_dir_writable: Option<bool>,
}

impl StatusResponse {
    /// One line per known component, e.g. `LLM: reachable`.
    pub fn component_summary(&self) -> Vec<String> {
        let flag = |ok: bool, yes: &str, no: &str| {
            if ok {
                yes.to_string()
            } else {
                no.to_string()
            }
        };
        let mut out = Vec::new();
        if let Some(ok) = self.ollama_reachable {
            out.push(format!("LLM: {}", flag(ok, "reachable", "unreachable")));
        }
        if let Some(ok) = self.freecad_available {
            out.push(format!("FreeCAD: {}", flag(ok, "available", "missing")));
        }
        if let Some(ok) = self.output_dir_writable {
            out.push(format!("Output dir: {}", flag(ok, "writable", "read-only")));
        }
        out
    }
}
