//! One frame: dispatch the ray tracer, then composite its output.

use crate::error::Result;
use crate::scene::SceneModel;

use super::compositor::QuadCompositor;
use super::context::GpuContext;
use super::dispatcher::ComputeDispatcher;
use super::kernels::KernelProvider;

pub struct FramePipeline<C: GpuContext> {
    dispatcher: ComputeDispatcher<C>,
    compositor: QuadCompositor<C>,
}

impl<C: GpuContext> FramePipeline<C> {
    /// Build every GPU resource. Any error here leaves nothing usable.
    pub fn new(ctx: &mut C, kernels: &KernelProvider, width: u32, height: u32) -> Result<Self> {
        let _span = tracing::info_span!("frame_pipeline_init").entered();
        let dispatcher = ComputeDispatcher::new(ctx, kernels, width, height)?;
        let compositor = QuadCompositor::new(ctx, kernels, dispatcher.output())?;
        Ok(Self { dispatcher, compositor })
    }

    /// Match the output image to a new viewport size and bring the scene
    /// (`width/height`, camera aspect) in line with it. Accumulation restarts
    /// when either one changed.
    pub fn resize(&mut self, ctx: &mut C, scene: &mut SceneModel, width: u32, height: u32) -> Result<bool> {
        let image_changed = self.dispatcher.resize(ctx, width, height)?;
        if image_changed {
            self.compositor.attach(ctx, self.dispatcher.output())?;
        }
        let (width, height) = self.dispatcher.dimensions();
        let scene_changed = scene.set_viewport(width, height);
        Ok(image_changed || scene_changed)
    }

    pub fn render_frame(&mut self, ctx: &mut C, scene: &mut SceneModel, target: &C::Target) {
        let _span = tracing::trace_span!("render_frame", frame = scene.frame_count()).entered();
        self.dispatcher.render(ctx, scene);
        self.compositor.draw(ctx, target);
    }

    pub fn dispatcher(&self) -> &ComputeDispatcher<C> {
        &self.dispatcher
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.dispatcher.dimensions()
    }
}
