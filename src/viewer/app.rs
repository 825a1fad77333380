//! Main application window

use anyhow::{anyhow, Result};
use egui::{CentralPanel, SidePanel};

use super::panel::{scene_panel, FrameStats};
use super::settings::Settings;
use super::viewport::Viewport;
use crate::gpu::KernelProvider;
use crate::scene::SceneModel;

pub struct PlaygroundApp {
    scene: SceneModel,
    viewport: Viewport,
    settings: Settings,
    stats: FrameStats,
}

impl PlaygroundApp {
    /// Build the GPU pipeline on eframe's device. Errors are fatal.
    pub fn new(cc: &eframe::CreationContext<'_>, settings: Settings) -> Result<Self> {
        let render_state = cc
            .wgpu_render_state
            .as_ref()
            .ok_or_else(|| anyhow!("wgpu renderer unavailable"))?;

        let kernels = KernelProvider::from_env_or(settings.shader_dir.as_deref());
        if let Some(dir) = kernels.dir() {
            tracing::info!(dir = %dir.display(), "using kernel override directory");
        }

        // Real size arrives with the first layout pass
        let ppp = cc.egui_ctx.pixels_per_point();
        let width = ((settings.window_width - settings.side_panel_width).max(16.0) * ppp) as u32;
        let height = (settings.window_height.max(16.0) * ppp) as u32;

        let mut scene = SceneModel::playground(width, height);
        let viewport = Viewport::new(render_state, &kernels, &mut scene, width, height)?;

        Ok(Self {
            scene,
            viewport,
            settings,
            stats: FrameStats::default(),
        })
    }
}

impl eframe::App for PlaygroundApp {
    fn on_exit(&mut self) {
        self.settings.save();
    }

    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        let _span = tracing::trace_span!("app_update").entered();

        let dt = ctx.input(|i| i.stable_dt).max(1e-6);
        self.stats = FrameStats {
            fps: 1.0 / dt,
            frame_time_ms: dt * 1000.0,
        };
        let stats = self.settings.show_fps.then_some(self.stats);

        let response = SidePanel::left("scene_panel")
            .default_width(self.settings.side_panel_width)
            .min_width(200.0)
            .max_width(600.0)
            .resizable(true)
            .show(ctx, |ui| {
                scene_panel(ui, &mut self.scene, stats);
            });
        self.settings.side_panel_width = response.response.rect.width();

        CentralPanel::default().frame(egui::Frame::NONE).show(ctx, |ui| {
            let Some(render_state) = frame.wgpu_render_state() else {
                return;
            };
            if let Err(e) = self.viewport.show(ui, render_state, &mut self.scene) {
                // Half-built GPU state cannot render; no recovery path
                tracing::error!("fatal GPU error: {e:#}");
                panic!("fatal GPU error: {e:#}");
            }
        });

        // Track window size for saving on exit
        ctx.input(|i| {
            if let Some(rect) = i.viewport().inner_rect {
                self.settings.window_width = rect.width();
                self.settings.window_height = rect.height();
            }
        });

        // Progressive accumulation: always another frame
        ctx.request_repaint();
    }
}
