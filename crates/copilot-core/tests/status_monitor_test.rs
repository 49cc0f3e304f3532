//! Status monitor polling with paused time.

use async_trait::async_trait;
use copilot_core::{
    CopilotError, CopilotResult, GenerationBackend, GenerationResult, HealthIndicator,
    StatusMonitor, StatusResponse,
};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

struct StatusOnly {
    answers: Mutex<VecDeque<CopilotResult<StatusResponse>>>,
    probes: Mutex<usize>,
}

impl StatusOnly {
    fn new(answers: Vec<CopilotResult<StatusResponse>>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.into()),
            probes: Mutex::new(0),
        })
    }
}

fn status(value: &str) -> CopilotResult<StatusResponse> {
    Ok(serde_json::from_value(json!({ "status": value, "ollama_reachable": true })).unwrap())
}

#[async_trait]
impl GenerationBackend for StatusOnly {
    async fn generate(&self, _prompt: &str) -> CopilotResult<GenerationResult> {
        unreachable!("status monitor never generates")
    }

    async fn refine(&self, _code: &str, _instruction: &str) -> CopilotResult<GenerationResult> {
        unreachable!("status monitor never refines")
    }

    async fn status(&self) -> CopilotResult<StatusResponse> {
        *self.probes.lock().unwrap() += 1;
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CopilotError::Transport("down".into())))
    }
}

#[tokio::test]
async fn test_check_once_maps_statuses() {
    let backend = StatusOnly::new(vec![
        status("ok"),
        status("warning"),
        status("error"),
        status("rebooting"),
        Err(CopilotError::Transport("refused".into())),
    ]);
    let monitor = StatusMonitor::new(backend, Duration::from_secs(30));
    let rx = monitor.subscribe();
    assert_eq!(rx.borrow().indicator, HealthIndicator::Checking);

    assert_eq!(monitor.check_once().await, HealthIndicator::Ok);
    assert_eq!(rx.borrow().components, vec!["LLM: reachable".to_string()]);
    assert_eq!(monitor.check_once().await, HealthIndicator::Warning);
    assert_eq!(monitor.check_once().await, HealthIndicator::Error);
    assert_eq!(monitor.check_once().await, HealthIndicator::Error);
    assert_eq!(monitor.check_once().await, HealthIndicator::Error);
    assert!(rx.borrow().components.is_empty());
    assert!(rx.borrow().checked_at.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_run_polls_immediately_then_on_interval() {
    let backend = StatusOnly::new(vec![status("ok"), status("warning")]);
    let monitor = StatusMonitor::new(backend.clone(), Duration::from_secs(30));
    let mut rx = monitor.subscribe();
    let shutdown = CancellationToken::new();
    let handle = monitor.spawn(shutdown.clone());

    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().indicator, HealthIndicator::Ok);

    let before = tokio::time::Instant::now();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().indicator, HealthIndicator::Warning);
    assert!(before.elapsed() >= Duration::from_secs(30));

    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().indicator, HealthIndicator::Error);

    shutdown.cancel();
    handle.await.unwrap();
    assert_eq!(*backend.probes.lock().unwrap(), 3);
}
