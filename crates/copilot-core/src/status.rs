//! Backend health polling for the status indicator.
//!
//! Independent of the generation pipeline: failures here only change the indicator.

use crate::backend::GenerationBackend;
use crate::protocol::ServiceStatus;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HealthIndicator {
    /// No answer yet.
    #[default]
    Checking,
    Ok,
    Warning,
    Error,
}

impl HealthIndicator {
    pub fn label(self) -> &'static str {
        match self {
            HealthIndicator::Checking => "checking",
            HealthIndicator::Ok => "ok",
            HealthIndicator::Warning => "warning",
            HealthIndicator::Error => "error",
        }
    }
}

/// Latest poll result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthSnapshot {
    pub indicator: HealthIndicator,
    /// Per-component lines from the status body (empty on transport failure).
    pub components: Vec<String>,
    pub checked_at: Option<DateTime<Utc>>,
}

/// Polls `status()` on a fixed interval and publishes the result.
pub struct StatusMonitor {
    backend: Arc<dyn GenerationBackend>,
    interval: Duration,
    tx: watch::Sender<HealthSnapshot>,
}

impl StatusMonitor {
    pub fn new(backend: Arc<dyn GenerationBackend>, interval: Duration) -> Self {
        let (tx, _) = watch::channel(HealthSnapshot::default());
        Self {
            backend,
            interval,
            tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<HealthSnapshot> {
        self.tx.subscribe()
    }

    /// One probe; publishes and returns the indicator.
    pub async fn check_once(&self) -> HealthIndicator {
        let (indicator, components) = match self.backend.status().await {
            Ok(status) => {
                let indicator = match status.status {
                    ServiceStatus::Ok => HealthIndicator::Ok,
                    ServiceStatus::Warning => HealthIndicator::Warning,
                    ServiceStatus::Error | ServiceStatus::Unknown => HealthIndicator::Error,
                };
                (indicator, status.component_summary())
            }
            Err(e) => {
                tracing::debug!(error = %e, "status check failed");
                (HealthIndicator::Error, Vec::new())
            }
        };
        self.tx.send_replace(HealthSnapshot {
            indicator,
            components,
            checked_at: Some(Utc::now()),
        });
        indicator
    }

    /// Checks immediately, then on every interval tick until `shutdown` fires.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::debug!("status monitor stopped");
                    break;
                }
                _ = interval.tick() => {
                    self.check_once().await;
                }
            }
        }
    }

    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
