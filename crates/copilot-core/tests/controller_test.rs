//! Integration tests for the generation controller against a scripted backend.

use async_trait::async_trait;
use copilot_core::{
    ActivityLog, CopilotError, CopilotResult, GenerationBackend, GenerationController,
    GenerationResult, MemoryStore, Outcome, PipelineState, StatusResponse, SubmitMode,
    SubmitOutcome,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

enum Reply {
    Now(CopilotResult<GenerationResult>),
    Later(oneshot::Receiver<CopilotResult<GenerationResult>>),
    Never,
}

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Generate(String),
    Refine { original_code: String, instruction: String },
}

#[derive(Default)]
struct ScriptedBackend {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedBackend {
    fn with(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    async fn answer(&self, call: Call) -> CopilotResult<GenerationResult> {
        self.calls.lock().unwrap().push(call);
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Now(result)) => result,
            Some(Reply::Later(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(CopilotError::Transport("sender dropped".into()))),
            Some(Reply::Never) => std::future::pending().await,
            None => panic!("backend called more times than scripted"),
        }
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn generate(&self, prompt: &str) -> CopilotResult<GenerationResult> {
        self.answer(Call::Generate(prompt.to_string())).await
    }

    async fn refine(
        &self,
        original_code: &str,
        instruction: &str,
    ) -> CopilotResult<GenerationResult> {
        self.answer(Call::Refine {
            original_code: original_code.to_string(),
            instruction: instruction.to_string(),
        })
        .await
    }

    async fn status(&self) -> CopilotResult<StatusResponse> {
        Err(CopilotError::Transport("not scripted".into()))
    }
}

fn ok(mesh: &str, code: &str) -> Reply {
    Reply::Now(Ok(GenerationResult {
        mesh_reference: mesh.to_string(),
        script_text: code.to_string(),
    }))
}

fn controller(
    backend: Arc<ScriptedBackend>,
    timeout: Option<Duration>,
) -> Arc<GenerationController> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let log = Arc::new(ActivityLog::open(Arc::new(MemoryStore::new())));
    Arc::new(GenerationController::new(backend, log, timeout))
}

async fn wait_for_calls(backend: &ScriptedBackend, n: usize) {
    while backend.calls().len() < n {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_fresh_generation_success() {
    let backend = ScriptedBackend::with(vec![ok("m.stl", "import Part")]);
    let ctl = controller(backend.clone(), None);

    let outcome = ctl.submit("  a 10mm cube ", SubmitMode::Fresh).await;

    assert_eq!(outcome, SubmitOutcome::Succeeded);
    let state = ctl.state();
    assert_eq!(state.pipeline, PipelineState::Success);
    assert_eq!(state.mesh_reference.as_deref(), Some("m.stl"));
    assert_eq!(state.last_script.as_deref(), Some("import Part"));
    assert!(state.error_message.is_none());
    assert_eq!(backend.calls(), vec![Call::Generate("a 10mm cube".into())]);

    let entries = ctl.activity_log().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].prompt, "a 10mm cube");
    assert_eq!(entries[0].outcome, Outcome::Success);
}

#[tokio::test]
async fn test_structured_backend_error_reaches_user() {
    let backend = ScriptedBackend::with(vec![Reply::Now(Err(CopilotError::Backend {
        message: "Bad prompt".into(),
        details: Some("too vague".into()),
        code: Some("ERR_VALIDATION".into()),
    }))]);
    let ctl = controller(backend, None);

    assert_eq!(ctl.submit("x", SubmitMode::Fresh).await, SubmitOutcome::Failed);

    let state = ctl.state();
    assert_eq!(state.pipeline, PipelineState::Error);
    let message = state.error_message.unwrap();
    assert!(message.contains("Bad prompt"));
    assert!(message.contains("too vague"));
    assert!(state.result.is_none());
    assert!(state.mesh_reference.is_none());

    let entries = ctl.activity_log().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].outcome, Outcome::Error);
}

#[tokio::test]
async fn test_transport_failure_uses_connectivity_message() {
    let backend = ScriptedBackend::with(vec![Reply::Now(Err(CopilotError::Transport(
        "connection refused".into(),
    )))]);
    let ctl = controller(backend, None);

    ctl.submit("gear", SubmitMode::Fresh).await;

    assert_eq!(
        ctl.state().error_message.as_deref(),
        Some("Failed to connect to backend.")
    );
}

#[tokio::test]
async fn test_refine_without_script_makes_no_call() {
    let backend = ScriptedBackend::with(vec![]);
    let ctl = controller(backend.clone(), None);

    assert_eq!(ctl.submit("wider", SubmitMode::Refine).await, SubmitOutcome::Failed);

    assert!(backend.calls().is_empty());
    let state = ctl.state();
    assert_eq!(state.pipeline, PipelineState::Error);
    assert!(state.error_message.unwrap().contains("Nothing to refine"));
    assert_eq!(ctl.activity_log().entries()[0].outcome, Outcome::Error);
}

#[tokio::test]
async fn test_refine_sends_previous_script() {
    let backend = ScriptedBackend::with(vec![ok("a.stl", "box()"), ok("b.stl", "box(2)")]);
    let ctl = controller(backend.clone(), None);

    ctl.submit("a box", SubmitMode::Fresh).await;
    assert_eq!(ctl.submit("twice as big", SubmitMode::Refine).await, SubmitOutcome::Succeeded);

    assert_eq!(
        backend.calls()[1],
        Call::Refine {
            original_code: "box()".into(),
            instruction: "twice as big".into(),
        }
    );
    let state = ctl.state();
    assert_eq!(state.mesh_reference.as_deref(), Some("b.stl"));
    assert_eq!(state.last_script.as_deref(), Some("box(2)"));
    assert_eq!(ctl.activity_log().entries().len(), 2);
}

#[tokio::test]
async fn test_failed_refine_keeps_script_but_clears_mesh() {
    let backend = ScriptedBackend::with(vec![
        ok("a.stl", "box()"),
        Reply::Now(Err(CopilotError::UnknownBackendFailure(500))),
    ]);
    let ctl = controller(backend, None);

    ctl.submit("a box", SubmitMode::Fresh).await;
    ctl.submit("rounder", SubmitMode::Refine).await;

    let state = ctl.state();
    assert_eq!(state.pipeline, PipelineState::Error);
    assert_eq!(state.error_message.as_deref(), Some("Unknown Generation Error"));
    assert!(state.mesh_reference.is_none());
    assert!(state.result.is_none());
    assert_eq!(state.last_script.as_deref(), Some("box()"));
    assert!(state.can_refine());
}

#[tokio::test]
async fn test_newer_submission_supersedes_older() {
    let (slow_tx, slow_rx) = oneshot::channel();
    let backend = ScriptedBackend::with(vec![Reply::Later(slow_rx), ok("new.stl", "new()")]);
    let ctl = controller(backend.clone(), None);

    let first = {
        let ctl = ctl.clone();
        tokio::spawn(async move { ctl.submit("first", SubmitMode::Fresh).await })
    };
    wait_for_calls(&backend, 1).await;

    assert_eq!(ctl.submit("second", SubmitMode::Fresh).await, SubmitOutcome::Succeeded);
    assert_eq!(first.await.unwrap(), SubmitOutcome::Canceled);

    // A late answer for the superseded request has nowhere to go.
    let _ = slow_tx.send(Ok(GenerationResult {
        mesh_reference: "old.stl".into(),
        script_text: "old()".into(),
    }));
    tokio::task::yield_now().await;

    let state = ctl.state();
    assert_eq!(state.mesh_reference.as_deref(), Some("new.stl"));
    let entries = ctl.activity_log().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].prompt, "second");
}

#[tokio::test]
async fn test_cancel_returns_to_idle_without_logging() {
    let backend = ScriptedBackend::with(vec![Reply::Never]);
    let ctl = controller(backend.clone(), None);

    let pending = {
        let ctl = ctl.clone();
        tokio::spawn(async move { ctl.submit("slow", SubmitMode::Fresh).await })
    };
    wait_for_calls(&backend, 1).await;
    assert!(ctl.state().is_generating());
    assert!(ctl.has_in_flight());

    assert!(ctl.cancel());
    assert_eq!(pending.await.unwrap(), SubmitOutcome::Canceled);

    assert_eq!(ctl.state().pipeline, PipelineState::Idle);
    assert!(!ctl.has_in_flight());
    assert!(ctl.activity_log().entries().is_empty());
    assert!(!ctl.cancel());
}

#[tokio::test(start_paused = true)]
async fn test_request_timeout_is_reported() {
    let backend = ScriptedBackend::with(vec![Reply::Never]);
    let ctl = controller(backend, Some(Duration::from_secs(240)));

    assert_eq!(ctl.submit("slow", SubmitMode::Fresh).await, SubmitOutcome::Failed);

    let state = ctl.state();
    assert_eq!(state.pipeline, PipelineState::Error);
    assert_eq!(state.error_message.as_deref(), Some("Request timed out after 240s."));
    assert!(!ctl.has_in_flight());
}

#[tokio::test]
async fn test_subscribers_observe_transitions() {
    let (tx, rx) = oneshot::channel();
    let backend = ScriptedBackend::with(vec![Reply::Later(rx)]);
    let ctl = controller(backend.clone(), None);
    let mut states = ctl.subscribe();

    let running = {
        let ctl = ctl.clone();
        tokio::spawn(async move { ctl.submit("bracket", SubmitMode::Fresh).await })
    };
    wait_for_calls(&backend, 1).await;
    assert!(states.has_changed().unwrap());
    assert_eq!(states.borrow_and_update().pipeline, PipelineState::Generating);

    tx.send(Ok(GenerationResult {
        mesh_reference: "bracket.stl".into(),
        script_text: "bracket()".into(),
    }))
    .unwrap();
    states.changed().await.unwrap();
    assert_eq!(states.borrow().pipeline, PipelineState::Success);
    assert_eq!(running.await.unwrap(), SubmitOutcome::Succeeded);
}

#[tokio::test]
async fn test_error_then_success_recovers() {
    let backend = ScriptedBackend::with(vec![
        Reply::Now(Err(CopilotError::Transport("connection reset".into()))),
        ok("ok.stl", "ok()"),
    ]);
    let ctl = controller(backend, None);

    assert_eq!(ctl.submit("flange", SubmitMode::Fresh).await, SubmitOutcome::Failed);
    assert_eq!(ctl.state().pipeline, PipelineState::Error);

    assert_eq!(ctl.submit("flange", SubmitMode::Fresh).await, SubmitOutcome::Succeeded);

    let state = ctl.state();
    assert_eq!(state.pipeline, PipelineState::Success);
    assert!(state.error_message.is_none());
    assert_eq!(state.result.as_ref().map(|r| r.mesh_reference.as_str()), Some("ok.stl"));
    assert_eq!(state.mesh_reference.as_deref(), Some("ok.stl"));

    let entries = ctl.activity_log().entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].outcome, Outcome::Success);
    assert_eq!(entries[1].outcome, Outcome::Error);
}

#[tokio::test]
async fn test_dropped_submit_releases_request() {
    let backend = ScriptedBackend::with(vec![Reply::Never, ok("next.stl", "next()")]);
    let ctl = controller(backend.clone(), None);

    let pending = {
        let ctl = ctl.clone();
        tokio::spawn(async move { ctl.submit("stuck", SubmitMode::Fresh).await })
    };
    wait_for_calls(&backend, 1).await;
    assert!(ctl.has_in_flight());

    pending.abort();
    assert!(pending.await.unwrap_err().is_cancelled());

    assert!(!ctl.has_in_flight());
    assert_eq!(ctl.state().pipeline, PipelineState::Idle);
    assert!(ctl.activity_log().entries().is_empty());

    assert_eq!(ctl.submit("next", SubmitMode::Fresh).await, SubmitOutcome::Succeeded);
    assert_eq!(ctl.activity_log().entries().len(), 1);
}
