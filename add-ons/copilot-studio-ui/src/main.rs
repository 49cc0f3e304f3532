//! CAD Copilot Studio: describe a part, preview the mesh, refine it, export the script.
//! Requests run on a tokio runtime beside the egui loop; the window only reads controller state.

use copilot_core::{
    export_script, ActivityEntry, ControllerState, CopilotConfig, GenerationController,
    HealthIndicator, PromptDraft, SubmitMode, MAX_PROMPT_CHARS,
};
use copilot_studio_ui::panels::{color32, health_color, history_time_label, numbered_lines};
use copilot_studio_ui::{build_studio_stack, StudioConfig, StudioStack};
use copilot_viewport::{Frame, ViewportEvent, BACKGROUND_COLOR};
use eframe::egui;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> eframe::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[copilot-studio] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CopilotConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "config unreadable; using defaults");
        CopilotConfig::default()
    });
    let runtime = tokio::runtime::Runtime::new().expect("start tokio runtime");
    let stack = build_studio_stack(config, runtime.handle()).expect("build studio stack");

    let studio_config = StudioConfig::load();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([studio_config.window_width, studio_config.window_height])
            .with_title("CAD Copilot Studio"),
        ..Default::default()
    };

    let handle = runtime.handle().clone();
    eframe::run_native(
        "CAD Copilot Studio",
        options,
        Box::new(move |cc| {
            if studio_config.theme_dark {
                cc.egui_ctx.set_visuals(egui::Visuals::dark());
            }
            Ok(Box::new(StudioApp::new(stack, handle, studio_config)))
        }),
    )
}

struct StudioApp {
    stack: StudioStack,
    runtime: Handle,
    config: StudioConfig,
    draft: PromptDraft,
    state: ControllerState,
    history: Vec<ActivityEntry>,
    wireframe: bool,
    /// Last viewport load failure, until dismissed or a mesh loads.
    viewport_banner: Option<String>,
    /// Result of the last copy/export action.
    notice: Option<String>,
}

impl StudioApp {
    fn new(stack: StudioStack, runtime: Handle, config: StudioConfig) -> Self {
        // Read once at mount; afterwards the log's mirror is the source.
        let history = stack.activity_log.load();
        let state = stack.controller.state();
        Self {
            stack,
            runtime,
            config,
            draft: PromptDraft::new(),
            state,
            history,
            wireframe: false,
            viewport_banner: None,
            notice: None,
        }
    }

    fn controller(&self) -> Arc<GenerationController> {
        Arc::clone(&self.stack.controller)
    }

    fn submit(&mut self, ctx: &egui::Context, instruction: String, mode: SubmitMode) {
        let controller = self.controller();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            controller.submit(&instruction, mode).await;
            ctx.request_repaint();
        });
    }

    /// Pulls controller, log and viewport state for this frame.
    fn sync(&mut self, ctx: &egui::Context) {
        self.state = self.stack.controller.state();
        self.history = self.stack.activity_log.entries();

        let viewport = &mut self.stack.viewport;
        viewport.set_mesh_reference(self.state.mesh_reference.as_deref());
        viewport.set_wireframe(self.wireframe);
        if viewport.poll() {
            ctx.request_repaint();
        }
        while let Ok(event) = self.stack.viewport_events.try_recv() {
            match event {
                ViewportEvent::Loaded { .. } => self.viewport_banner = None,
                ViewportEvent::LoadFailed { message, .. } => {
                    self.viewport_banner = Some(format!("Could not display model: {}", message));
                }
            }
        }

        if self.state.is_generating() || self.stack.viewport.is_loading() {
            ctx.request_repaint_after(Duration::from_millis(100));
        } else {
            // Pick up status poll results.
            ctx.request_repaint_after(Duration::from_secs(1));
        }
    }

    fn top_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("CAD Copilot");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let health = self.stack.health.borrow().clone();
                let label = match health.indicator {
                    HealthIndicator::Checking => "Checking backend…".to_string(),
                    other => format!("Backend {}", other.label()),
                };
                let response =
                    ui.colored_label(health_color(health.indicator), format!("● {}", label));
                if !health.components.is_empty() {
                    response.on_hover_text(health.components.join("\n"));
                }
            });
        });
    }

    fn prompt_panel(&mut self, ui: &mut egui::Ui) {
        let generating = self.state.is_generating();
        let has_script = self.state.can_refine();

        ui.label(egui::RichText::new("Describe your part").strong());
        let hint = self.draft.placeholder(has_script);
        let edit = ui.add_sized(
            [ui.available_width(), 120.0],
            egui::TextEdit::multiline(&mut self.draft.text)
                .hint_text(hint)
                .interactive(!generating),
        );
        if edit.changed() {
            self.draft.enforce_limit();
        }
        let ctrl_enter = edit.has_focus()
            && ui.input(|i| i.modifiers.command && i.key_pressed(egui::Key::Enter));

        ui.horizontal(|ui| {
            ui.small(format!("{}/{}", self.draft.char_count(), MAX_PROMPT_CHARS));
            if has_script {
                ui.checkbox(&mut self.draft.refine, "Refine existing model");
            }
        });

        let mut clicked = false;
        ui.horizontal(|ui| {
            let label = if self.draft.refine && has_script { "Refine" } else { "Generate" };
            clicked = ui
                .add_enabled(!generating, egui::Button::new(label))
                .clicked();
            if generating {
                ui.spinner();
                if ui.button("Cancel").clicked() {
                    self.stack.controller.cancel();
                }
            }
        });

        if clicked || ctrl_enter {
            if let Some((instruction, mode)) = self.draft.submission(has_script, generating) {
                let ctx = ui.ctx().clone();
                self.submit(&ctx, instruction, mode);
            }
        }

        if let Some(message) = &self.state.error_message {
            ui.add_space(6.0);
            egui::Frame::none()
                .fill(egui::Color32::from_rgb(0x45, 0x0a, 0x0a))
                .inner_margin(6.0)
                .rounding(4.0)
                .show(ui, |ui| {
                    ui.colored_label(egui::Color32::from_rgb(0xfc, 0xa5, 0xa5), message);
                });
        }
    }

    fn history_panel(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Recent activity").strong());
            if !self.history.is_empty() {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("Clear").clicked() {
                        self.stack.activity_log.clear();
                        self.history.clear();
                    }
                });
            }
        });

        if self.history.is_empty() {
            ui.weak("No recent prompts.");
            return;
        }

        let generating = self.state.is_generating();
        let mut resubmit = None;
        egui::ScrollArea::vertical().id_salt("history").show(ui, |ui| {
            for entry in &self.history {
                let mut text = format!("{}  {}", history_time_label(entry), entry.prompt);
                if !entry.succeeded() {
                    text.push_str("  (Failed)");
                }
                let response = ui.add_enabled(!generating, egui::SelectableLabel::new(false, text));
                if response.clicked() {
                    resubmit = Some(entry.prompt.clone());
                }
            }
        });
        // History always replays as a fresh generation.
        if let Some(prompt) = resubmit {
            self.draft.text = prompt.clone();
            self.draft.refine = false;
            let ctx = ui.ctx().clone();
            self.submit(&ctx, prompt, SubmitMode::Fresh);
        }
    }

    fn code_panel(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Generated script").strong());
        });
        let Some(script) = self.state.last_script.clone() else {
            ui.weak("Generate a model to see its script.");
            return;
        };

        ui.horizontal(|ui| {
            if ui.button("Copy").clicked() {
                ui.output_mut(|o| o.copied_text = script.clone());
                self.notice = Some("Copied to clipboard.".to_string());
            }
            if ui.button(format!("Export {}", self.stack.config.script_filename)).clicked() {
                let dir = std::path::Path::new(&self.stack.config.export_dir);
                self.notice = Some(
                    match export_script(dir, &self.stack.config.script_filename, &script) {
                        Ok(path) => format!("Saved {}", path.display()),
                        Err(e) => e.user_message(),
                    },
                );
            }
        });
        if let Some(notice) = &self.notice {
            ui.small(notice.as_str());
        }

        egui::ScrollArea::both().id_salt("code").show(ui, |ui| {
            ui.label(egui::RichText::new(numbered_lines(&script)).monospace());
        });
    }

    fn viewport_panel(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Reset view").clicked() {
                self.stack.viewport.reset_camera();
            }
            ui.toggle_value(&mut self.wireframe, "Wireframe");
            if self.stack.viewport.is_loading() {
                ui.spinner();
            }
        });

        if let Some(banner) = self.viewport_banner.clone() {
            ui.horizontal(|ui| {
                ui.colored_label(egui::Color32::from_rgb(0xfc, 0xa5, 0xa5), banner);
                if ui.small_button("Dismiss").clicked() {
                    self.viewport_banner = None;
                }
            });
        }

        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let rect = response.rect;

        if response.dragged() {
            let d = response.drag_delta() * self.config.orbit_sensitivity;
            self.stack.viewport.orbit(-d.x, -d.y);
        }
        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                self.stack.viewport.zoom(scroll * self.config.zoom_sensitivity);
            }
        }

        painter.rect_filled(rect, 0.0, color32(BACKGROUND_COLOR));
        let size = glam::Vec2::new(rect.width(), rect.height());
        let at = |p: glam::Vec2| rect.min + egui::vec2(p.x, p.y);
        match self.stack.viewport.frame(size) {
            Frame::Placeholder { message } => {
                let text = if self.state.is_generating() { "Generating…" } else { message };
                painter.text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    text,
                    egui::FontId::proportional(16.0),
                    egui::Color32::from_gray(110),
                );
            }
            Frame::Scene {
                triangles,
                edges,
                axes,
            } => {
                let mut mesh = egui::Mesh::default();
                for tri in &triangles {
                    let base = mesh.vertices.len() as u32;
                    for p in tri.points {
                        mesh.colored_vertex(at(p), color32(tri.color));
                    }
                    mesh.add_triangle(base, base + 1, base + 2);
                }
                painter.add(egui::Shape::mesh(mesh));
                for seg in edges.iter().chain(axes.iter()) {
                    painter.line_segment(
                        [at(seg.from), at(seg.to)],
                        egui::Stroke::new(1.0, color32(seg.color)),
                    );
                }
            }
        }
    }
}

impl eframe::App for StudioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.sync(ctx);

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| self.top_bar(ui));

        egui::SidePanel::left("prompt_and_history")
            .default_width(self.config.side_panel_width)
            .show(ctx, |ui| {
                self.prompt_panel(ui);
                ui.separator();
                self.history_panel(ui);
            });

        egui::SidePanel::right("code")
            .default_width(self.config.side_panel_width)
            .show(ctx, |ui| self.code_panel(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.viewport_panel(ui));
    }
}

impl Drop for StudioApp {
    fn drop(&mut self) {
        self.stack.shutdown.cancel();
        self.stack.controller.cancel();
    }
}
