//! Mesh viewport state machine.
//!
//! The shell pushes the current mesh reference and wireframe flag every frame; only a
//! reference change starts a load, and only a completed load re-frames the camera.
//! Loads run on the tokio runtime and are collected with [`MeshViewport::poll`].

use crate::camera::OrbitCamera;
use crate::error::{ViewportError, ViewportResult};
use crate::fetch::MeshFetcher;
use crate::mesh::TriangleMesh;
use crate::render::{build_frame, Frame};
use glam::Vec2;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Reported to the shell; the viewport never surfaces errors any other way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewportEvent {
    Loaded { reference: String, triangles: usize },
    LoadFailed { reference: String, message: String },
}

struct PendingLoad {
    reference: String,
    rx: oneshot::Receiver<ViewportResult<TriangleMesh>>,
    task: JoinHandle<()>,
}

pub struct MeshViewport {
    fetcher: Arc<dyn MeshFetcher>,
    runtime: Handle,
    reference: Option<String>,
    wireframe: bool,
    mesh: Option<Arc<TriangleMesh>>,
    camera: Option<OrbitCamera>,
    /// Framing saved by the last auto-fit; `reset_camera` restores it.
    home: Option<OrbitCamera>,
    pending: Option<PendingLoad>,
    fits: u64,
    events_tx: mpsc::UnboundedSender<ViewportEvent>,
    events_rx: Option<mpsc::UnboundedReceiver<ViewportEvent>>,
}

impl MeshViewport {
    pub fn new(fetcher: Arc<dyn MeshFetcher>, runtime: Handle) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            fetcher,
            runtime,
            reference: None,
            wireframe: false,
            mesh: None,
            camera: None,
            home: None,
            pending: None,
            fits: 0,
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Event receiver. Can be taken once.
    pub fn take_event_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<ViewportEvent>> {
        self.events_rx.take()
    }

    /// Sets the mesh to show. Same value as before: nothing happens. `None` shows the
    /// placeholder. A new reference starts a load; the current geometry stays on screen
    /// until it finishes.
    pub fn set_mesh_reference(&mut self, reference: Option<&str>) {
        if self.reference.as_deref() == reference {
            return;
        }
        self.reference = reference.map(str::to_string);
        if let Some(stale) = self.pending.take() {
            tracing::debug!(reference = %stale.reference, "mesh load superseded");
            stale.task.abort();
        }

        match reference {
            None => self.mesh = None,
            Some(reference) => self.start_load(reference.to_string()),
        }
    }

    fn start_load(&mut self, reference: String) {
        let (tx, rx) = oneshot::channel();
        let fetcher = Arc::clone(&self.fetcher);
        let key = reference.clone();
        let task = self.runtime.spawn(async move {
            let started = Instant::now();
            let result = match fetcher.fetch(&key).await {
                // Decoding is CPU-bound; keep it off the async workers.
                Ok(bytes) => tokio::task::spawn_blocking(move || TriangleMesh::from_stl(&bytes))
                    .await
                    .map_err(|_| ViewportError::Abandoned)
                    .and_then(|parsed| parsed.map_err(ViewportError::from)),
                Err(e) => Err(e),
            };
            tracing::debug!(
                reference = %key,
                ok = result.is_ok(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "mesh load finished"
            );
            let _ = tx.send(result);
        });
        self.pending = Some(PendingLoad {
            reference,
            rx,
            task,
        });
    }

    /// Applies a finished load, if any. Returns true when the displayed scene changed.
    /// Call once per repaint.
    pub fn poll(&mut self) -> bool {
        let Some(pending) = self.pending.as_mut() else {
            return false;
        };
        let result = match pending.rx.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => return false,
            Err(oneshot::error::TryRecvError::Closed) => Err(ViewportError::Abandoned),
        };
        if let Some(done) = self.pending.take() {
            self.apply(done.reference, result);
        }
        true
    }

    /// Waits for the in-flight load, if any, and applies it.
    pub async fn settle(&mut self) {
        if let Some(pending) = self.pending.take() {
            let result = pending.rx.await.unwrap_or(Err(ViewportError::Abandoned));
            self.apply(pending.reference, result);
        }
    }

    fn apply(&mut self, reference: String, result: ViewportResult<TriangleMesh>) {
        match result {
            Ok(mesh) => {
                let triangles = mesh.triangle_count();
                self.auto_fit(&mesh);
                self.mesh = Some(Arc::new(mesh));
                tracing::info!(reference = %reference, triangles, "mesh loaded");
                let _ = self.events_tx.send(ViewportEvent::Loaded {
                    reference,
                    triangles,
                });
            }
            Err(e) => {
                tracing::warn!(reference = %reference, error = %e, "mesh load failed");
                self.mesh = None;
                let _ = self.events_tx.send(ViewportEvent::LoadFailed {
                    reference,
                    message: e.to_string(),
                });
            }
        }
    }

    /// Frames the new mesh, keeping whatever orientation the camera has now.
    fn auto_fit(&mut self, mesh: &TriangleMesh) {
        let mut camera = self.camera.take().unwrap_or_default();
        camera.fit_to_bounds(&mesh.bounds());
        self.home = Some(camera.clone());
        self.camera = Some(camera);
        self.fits += 1;
    }

    /// Material change only.
    pub fn set_wireframe(&mut self, enabled: bool) {
        self.wireframe = enabled;
    }

    pub fn wireframe(&self) -> bool {
        self.wireframe
    }

    /// Back to the last auto-fit framing. No-op before the first load.
    pub fn reset_camera(&mut self) {
        if let Some(home) = &self.home {
            self.camera = Some(home.clone());
        }
    }

    pub fn orbit(&mut self, delta_theta: f32, delta_phi: f32) {
        if let Some(camera) = self.camera.as_mut() {
            camera.orbit(delta_theta, delta_phi);
        }
    }

    pub fn zoom(&mut self, delta: f32) {
        if let Some(camera) = self.camera.as_mut() {
            camera.zoom(delta);
        }
    }

    pub fn mesh_reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn mesh(&self) -> Option<&TriangleMesh> {
        self.mesh.as_deref()
    }

    pub fn camera(&self) -> Option<&OrbitCamera> {
        self.camera.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// How many times auto-fit has run.
    pub fn auto_fit_count(&self) -> u64 {
        self.fits
    }

    /// Draw list for a `size`-pixel viewport.
    pub fn frame(&self, size: Vec2) -> Frame {
        let camera = self.camera.clone().unwrap_or_default();
        build_frame(self.mesh.as_deref(), &camera, self.wireframe, size)
    }
}

impl Drop for MeshViewport {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.task.abort();
        }
    }
}
