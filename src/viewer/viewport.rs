//! Ray traced viewport widget for egui.
//!
//! The frame pipeline draws into an offscreen texture registered with
//! egui, which then paints it like any other image. One encoder and one
//! submit per frame.

use anyhow::{anyhow, Result};
use egui::{Sense, Ui, Vec2};

use crate::gpu::{FramePipeline, KernelProvider, WgpuContext};
use crate::scene::SceneModel;

/// Format of the texture egui samples. Gamma is applied by `quad.wgsl`.
const VIEWPORT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

struct RenderTexture {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: (u32, u32),
}

/// Viewport state
pub struct Viewport {
    ctx: WgpuContext,
    pipeline: FramePipeline<WgpuContext>,
    texture_id: Option<egui::TextureId>,
    render_texture: Option<RenderTexture>,
}

impl Viewport {
    /// Create the GPU pipeline at `width` x `height` pixels and size the
    /// scene to match. Fails if the device lacks a required capability.
    pub fn new(
        render_state: &egui_wgpu::RenderState,
        kernels: &KernelProvider,
        scene: &mut SceneModel,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let mut ctx = WgpuContext::new(
            &render_state.adapter,
            render_state.device.clone(),
            render_state.queue.clone(),
            VIEWPORT_FORMAT,
        )?;
        let mut pipeline = FramePipeline::new(&mut ctx, kernels, width, height)?;
        pipeline.resize(&mut ctx, scene, width, height)?;

        Ok(Self {
            ctx,
            pipeline,
            texture_id: None,
            render_texture: None,
        })
    }

    /// Trace one frame at the size of the available area and paint it.
    pub fn show(
        &mut self,
        ui: &mut Ui,
        render_state: &egui_wgpu::RenderState,
        scene: &mut SceneModel,
    ) -> Result<()> {
        let _span = tracing::trace_span!("viewport_show").entered();
        let available = ui.available_size();
        let size = Vec2::new(available.x.max(16.0), available.y.max(16.0));
        let (rect, _response) = ui.allocate_exact_size(size, Sense::hover());

        let ppp = ui.ctx().pixels_per_point();
        let width = (size.x * ppp).round() as u32;
        let height = (size.y * ppp).round() as u32;

        if self.pipeline.resize(&mut self.ctx, scene, width, height)? {
            tracing::debug!(width, height, "viewport resized");
        }
        self.ensure_render_texture(render_state, width, height);

        let rt = self
            .render_texture
            .as_ref()
            .ok_or_else(|| anyhow!("viewport texture missing"))?;
        self.pipeline.render_frame(&mut self.ctx, scene, &rt.view);
        self.ctx.submit();

        if let Some(tex_id) = self.texture_id {
            ui.painter().image(
                tex_id,
                rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
        Ok(())
    }

    fn ensure_render_texture(&mut self, render_state: &egui_wgpu::RenderState, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if self.render_texture.as_ref().is_some_and(|rt| rt.size == (width, height)) {
            return;
        }

        let device = &render_state.device;
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("viewport_render_texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: VIEWPORT_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Register with egui
        let tex_id = render_state
            .renderer
            .write()
            .register_native_texture(device, &view, wgpu::FilterMode::Nearest);

        // Unregister old texture
        if let Some(old_id) = self.texture_id.take() {
            render_state.renderer.write().free_texture(&old_id);
        }

        self.texture_id = Some(tex_id);
        self.render_texture = Some(RenderTexture {
            texture,
            view,
            size: (width, height),
        });
    }
}
