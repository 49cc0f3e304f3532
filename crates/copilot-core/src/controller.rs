//! Generation request controller.
//!
//! Owns the pipeline state and the single authoritative in-flight request. Every
//! submission cancels the previous one's token; a resolution only applies its
//! effects if its request is still the current one, so a slow stale answer can never
//! overwrite a newer interaction. State is published on a `watch` channel; the shell
//! subscribes and never mutates it directly.

use crate::activity_log::{ActivityLog, Outcome};
use crate::backend::GenerationBackend;
use crate::error::{CopilotError, CopilotResult};
use crate::protocol::GenerationResult;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Phase of the current attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Generating,
    Success,
    Error,
}

/// Generate from scratch, or modify the last script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    Fresh,
    Refine,
}

/// What happened to one `submit` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Succeeded,
    Failed,
    /// Superseded or aborted; no state was touched and nothing was logged.
    Canceled,
}

/// Published controller state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerState {
    pub pipeline: PipelineState,
    /// User-facing message while `pipeline == Error`.
    pub error_message: Option<String>,
    /// Present only when the most recent resolved request succeeded.
    pub result: Option<GenerationResult>,
    /// Mesh the viewport should display. Cleared at submission, set on success.
    pub mesh_reference: Option<String>,
    /// Script from the last successful request; kept across failures so it can
    /// still be viewed, exported and refined.
    pub last_script: Option<String>,
}

impl ControllerState {
    pub fn is_generating(&self) -> bool {
        self.pipeline == PipelineState::Generating
    }

    pub fn can_refine(&self) -> bool {
        self.last_script.is_some()
    }
}

struct InFlightRequest {
    id: u64,
    request_id: Uuid,
    token: CancellationToken,
}

/// Clears the slot if `submit` is dropped mid-flight. A no-op once the request
/// resolved or something newer took the slot.
struct AbandonGuard<'a> {
    controller: &'a GenerationController,
    id: u64,
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        self.controller.abandon(self.id);
    }
}

#[derive(Default)]
struct RequestSlot {
    next_id: u64,
    current: Option<InFlightRequest>,
}

/// Drives generate/refine exchanges against a [`GenerationBackend`].
pub struct GenerationController {
    backend: Arc<dyn GenerationBackend>,
    log: Arc<ActivityLog>,
    request_timeout: Option<Duration>,
    state_tx: watch::Sender<ControllerState>,
    slot: Mutex<RequestSlot>,
}

impl GenerationController {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        log: Arc<ActivityLog>,
        request_timeout: Option<Duration>,
    ) -> Self {
        let (state_tx, _) = watch::channel(ControllerState::default());
        Self {
            backend,
            log,
            request_timeout,
            state_tx,
            slot: Mutex::new(RequestSlot::default()),
        }
    }

    /// Receiver that sees every state change.
    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.state_tx.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ControllerState {
        self.state_tx.borrow().clone()
    }

    pub fn activity_log(&self) -> &Arc<ActivityLog> {
        &self.log
    }

    pub fn has_in_flight(&self) -> bool {
        self.lock_slot().current.is_some()
    }

    /// Runs one generation or refinement to completion.
    ///
    /// Cancels whatever was in flight, moves to `Generating`, clears the displayed
    /// mesh and error, then awaits the backend. Returns `Canceled` if a newer
    /// submission or [`cancel`](Self::cancel) took over before this one resolved.
    pub async fn submit(&self, instruction: &str, mode: SubmitMode) -> SubmitOutcome {
        let instruction = instruction.trim().to_string();
        let (id, request_id, token, script) = self.begin();
        let _abandoned = AbandonGuard { controller: self, id };
        let started = Instant::now();
        tracing::info!(request_id = %request_id, mode = ?mode, "generation request started");

        let exchange = async {
            match mode {
                SubmitMode::Fresh => self.backend.generate(&instruction).await,
                SubmitMode::Refine => match script.as_deref() {
                    Some(code) => self.backend.refine(code, &instruction).await,
                    None => Err(CopilotError::MissingScript),
                },
            }
        };
        let bounded = async {
            match self.request_timeout {
                Some(limit) => tokio::time::timeout(limit, exchange)
                    .await
                    .unwrap_or(Err(CopilotError::Timeout(limit))),
                None => exchange.await,
            }
        };

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!(request_id = %request_id, "generation request canceled");
                return SubmitOutcome::Canceled;
            }
            res = bounded => res,
        };

        let outcome = self.resolve(id, &instruction, result);
        tracing::info!(
            request_id = %request_id,
            outcome = ?outcome,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generation request resolved"
        );
        outcome
    }

    /// Aborts the in-flight request, if any, and returns to `Idle`. Nothing is logged.
    pub fn cancel(&self) -> bool {
        let mut slot = self.lock_slot();
        let Some(current) = slot.current.take() else {
            return false;
        };
        current.token.cancel();
        tracing::info!(request_id = %current.request_id, "in-flight request aborted");
        self.state_tx.send_modify(|s| {
            if s.pipeline == PipelineState::Generating {
                s.pipeline = PipelineState::Idle;
            }
        });
        true
    }

    fn begin(&self) -> (u64, Uuid, CancellationToken, Option<String>) {
        let mut slot = self.lock_slot();
        if let Some(previous) = slot.current.take() {
            previous.token.cancel();
            tracing::info!(request_id = %previous.request_id, "superseded in-flight request");
        }

        slot.next_id += 1;
        let id = slot.next_id;
        let request_id = Uuid::new_v4();
        let token = CancellationToken::new();
        slot.current = Some(InFlightRequest {
            id,
            request_id,
            token: token.clone(),
        });

        let mut script = None;
        self.state_tx.send_modify(|s| {
            s.pipeline = PipelineState::Generating;
            s.error_message = None;
            s.mesh_reference = None;
            script = s.last_script.clone();
        });
        (id, request_id, token, script)
    }

    /// Releases request `id` when its `submit` future was dropped before resolving.
    fn abandon(&self, id: u64) {
        let mut slot = self.lock_slot();
        if slot.current.as_ref().map(|c| c.id) != Some(id) {
            return;
        }
        if let Some(current) = slot.current.take() {
            current.token.cancel();
            tracing::info!(request_id = %current.request_id, "in-flight request abandoned");
        }
        self.state_tx.send_modify(|s| {
            if s.pipeline == PipelineState::Generating {
                s.pipeline = PipelineState::Idle;
            }
        });
    }

    /// Applies a resolution if `id` is still the current request. Holds the slot lock
    /// across the state change so no newer submission can interleave.
    fn resolve(
        &self,
        id: u64,
        instruction: &str,
        result: CopilotResult<GenerationResult>,
    ) -> SubmitOutcome {
        let mut slot = self.lock_slot();
        if slot.current.as_ref().map(|c| c.id) != Some(id) {
            return SubmitOutcome::Canceled;
        }
        slot.current = None;

        match result {
            Ok(result) => {
                self.state_tx.send_modify(|s| {
                    s.pipeline = PipelineState::Success;
                    s.error_message = None;
                    s.mesh_reference = Some(result.mesh_reference.clone());
                    s.last_script = Some(result.script_text.clone());
                    s.result = Some(result);
                });
                self.log.record(instruction, Outcome::Success);
                SubmitOutcome::Succeeded
            }
            Err(err) => {
                tracing::warn!(error = %err, "generation request failed");
                let message = err.user_message();
                self.state_tx.send_modify(|s| {
                    s.pipeline = PipelineState::Error;
                    s.error_message = Some(message);
                    s.result = None;
                });
                self.log.record(instruction, Outcome::Error);
                SubmitOutcome::Failed
            }
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, RequestSlot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
