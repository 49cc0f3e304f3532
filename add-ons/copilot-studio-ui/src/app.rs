//! Controller, activity log, status monitor and viewport wiring for the studio.

use copilot_core::{
    ActivityLog, CopilotConfig, GenerationBackend, GenerationController, HealthSnapshot,
    HttpBackend, KeyValueStore, MemoryStore, SledStore, StatusMonitor,
};
use copilot_viewport::{HttpMeshFetcher, MeshViewport, ViewportEvent};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Everything the window needs, built once at startup.
pub struct StudioStack {
    pub config: CopilotConfig,
    pub controller: Arc<GenerationController>,
    pub activity_log: Arc<ActivityLog>,
    pub health: watch::Receiver<HealthSnapshot>,
    pub viewport: MeshViewport,
    pub viewport_events: mpsc::UnboundedReceiver<ViewportEvent>,
    /// Stops the status monitor.
    pub shutdown: CancellationToken,
}

/// Builds the studio stack. The status monitor starts immediately on `runtime`.
///
/// An unusable history database is not fatal: the log falls back to memory for the session.
pub fn build_studio_stack(
    config: CopilotConfig,
    runtime: &Handle,
) -> Result<StudioStack, Box<dyn std::error::Error>> {
    let store: Arc<dyn KeyValueStore> = match SledStore::open_path(config.history_db_path()) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!(
                error = %e,
                path = %config.history_db_path().display(),
                "history database unavailable; recent activity will not persist"
            );
            Arc::new(MemoryStore::new())
        }
    };
    let activity_log = Arc::new(ActivityLog::open(store));

    let backend: Arc<dyn GenerationBackend> = Arc::new(HttpBackend::from_config(&config));
    let controller = Arc::new(GenerationController::new(
        Arc::clone(&backend),
        Arc::clone(&activity_log),
        config.request_timeout(),
    ));

    let shutdown = CancellationToken::new();
    let monitor = StatusMonitor::new(backend, config.status_poll_interval());
    let health = monitor.subscribe();
    runtime.spawn(monitor.run(shutdown.clone()));

    let fetcher = Arc::new(HttpMeshFetcher::new(&config.backend_url));
    let mut viewport = MeshViewport::new(fetcher, runtime.clone());
    let viewport_events = viewport
        .take_event_receiver()
        .ok_or("viewport event receiver already taken")?;

    tracing::info!(
        backend_url = %config.backend_url,
        history_entries = activity_log.entries().len(),
        "studio stack ready"
    );

    Ok(StudioStack {
        config,
        controller,
        activity_log,
        health,
        viewport,
        viewport_events,
        shutdown,
    })
}
