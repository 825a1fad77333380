//! Compute dispatcher: per-frame upload and ray tracing kernel launch.
//!
//! ## Usage
//! ```ignore
//! let mut dispatcher = ComputeDispatcher::new(&mut ctx, &kernels, width, height)?;
//! dispatcher.render(&mut ctx, &mut scene); // uploads, dispatches, ticks frame_count
//! // composite dispatcher.output()
//! ```

use crate::error::Result;
use crate::scene::{Material, RaytracerProperties, SceneModel, Sphere, MAX_SPHERES};

use super::channel::StructuredBuffer;
use super::context::{ComputeKernelDesc, GpuContext};
use super::kernels::{KernelId, KernelProvider, COMPUTE_ENTRY};

/// Workgroup edge (must match @workgroup_size in raytracer.wgsl).
pub const WORKGROUP_SIZE: u32 = 8;

/// Thread groups covering a `width` x `height` image.
///
/// Rounds up; the kernel discards invocations past the image edge.
pub fn dispatch_groups(width: u32, height: u32) -> [u32; 3] {
    [width.div_ceil(WORKGROUP_SIZE), height.div_ceil(WORKGROUP_SIZE), 1]
}

pub struct ComputeDispatcher<C: GpuContext> {
    kernel: C::ComputeKernel,
    properties: StructuredBuffer<C, RaytracerProperties>,
    spheres: StructuredBuffer<C, Sphere>,
    materials: StructuredBuffer<C, Material>,
    output: C::Image,
    bindings: C::Bindings,
    width: u32,
    height: u32,
}

impl<C: GpuContext> ComputeDispatcher<C> {
    #[tracing::instrument(skip(ctx, kernels))]
    pub fn new(ctx: &mut C, kernels: &KernelProvider, width: u32, height: u32) -> Result<Self> {
        let source = kernels.load(KernelId::Raytracer)?;
        let kernel = ctx.create_compute_kernel(&ComputeKernelDesc {
            source: &source,
            entry_point: COMPUTE_ENTRY,
            storage_inputs: 3,
        })?;

        let properties = StructuredBuffer::create(ctx, "properties", 1)?;
        let spheres = StructuredBuffer::create(ctx, "spheres", MAX_SPHERES)?;
        let materials = StructuredBuffer::create(ctx, "materials", MAX_SPHERES)?;

        let (width, height) = (width.max(1), height.max(1));
        let output = ctx.create_image("raytracer_output", width, height)?;
        let bindings = Self::bind(ctx, &kernel, &properties, &spheres, &materials, &output)?;
        tracing::info!(width, height, "compute dispatcher ready");

        Ok(Self {
            kernel,
            properties,
            spheres,
            materials,
            output,
            bindings,
            width,
            height,
        })
    }

    fn bind(
        ctx: &mut C,
        kernel: &C::ComputeKernel,
        properties: &StructuredBuffer<C, RaytracerProperties>,
        spheres: &StructuredBuffer<C, Sphere>,
        materials: &StructuredBuffer<C, Material>,
        output: &C::Image,
    ) -> Result<C::Bindings> {
        ctx.create_compute_bindings(
            kernel,
            &[properties.buffer(), spheres.buffer(), materials.buffer()],
            output,
        )
    }

    /// Recreate the output image. Returns true if the size changed; the
    /// caller must then rebind the compositor and update the scene viewport.
    pub fn resize(&mut self, ctx: &mut C, width: u32, height: u32) -> Result<bool> {
        let (width, height) = (width.max(1), height.max(1));
        if self.width == width && self.height == height {
            return Ok(false);
        }
        let output = ctx.create_image("raytracer_output", width, height)?;
        let bindings = Self::bind(
            ctx,
            &self.kernel,
            &self.properties,
            &self.spheres,
            &self.materials,
            &output,
        )?;
        self.output = output;
        self.bindings = bindings;
        self.width = width;
        self.height = height;
        tracing::debug!(width, height, "compute output resized");
        Ok(true)
    }

    /// Upload the scene, dispatch one frame, then tick `frame_count`.
    ///
    /// The grid covers `properties.width/height`; the kernel also discards
    /// pixels outside the output image.
    ///
    /// The upload carries the counter value the kernel blends with; the
    /// increment lands after the dispatch so the next frame sees it.
    pub fn render(&mut self, ctx: &mut C, scene: &mut SceneModel) {
        self.properties.upload(ctx, std::slice::from_ref(scene.properties()));
        self.spheres.upload(ctx, scene.spheres());
        self.materials.upload(ctx, scene.materials());

        ctx.bind_compute(&self.kernel, &self.bindings);
        let properties = scene.properties();
        ctx.dispatch(dispatch_groups(properties.width, properties.height));

        scene.advance_frame();
        tracing::trace!(frame = scene.frame_count(), "dispatched");
    }

    /// The image the kernel writes; sampled by the compositor.
    pub fn output(&self) -> &C::Image {
        &self.output
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::layout::GpuRecord;
    use crate::gpu::recording::{Command, RecordingContext};

    #[test]
    fn test_dispatch_groups() {
        assert_eq!(dispatch_groups(1920, 1080), [240, 135, 1]);
        assert_eq!(dispatch_groups(1925, 1080), [241, 135, 1]);
        assert_eq!(dispatch_groups(1, 1), [1, 1, 1]);
        assert_eq!(dispatch_groups(1938, 1127), [243, 141, 1]);
    }

    #[test]
    fn test_groups_cover_image() {
        for (w, h) in [(7, 9), (8, 8), (17, 31), (640, 481)] {
            let [gx, gy, gz] = dispatch_groups(w, h);
            assert!(gx * WORKGROUP_SIZE >= w && (gx - 1) * WORKGROUP_SIZE < w);
            assert!(gy * WORKGROUP_SIZE >= h && (gy - 1) * WORKGROUP_SIZE < h);
            assert_eq!(gz, 1);
        }
    }

    #[test]
    fn test_render_sequence() {
        let mut ctx = RecordingContext::new();
        let mut scene = SceneModel::playground(1925, 1080);
        let mut dispatcher = ComputeDispatcher::new(&mut ctx, &KernelProvider::embedded(), 1925, 1080).unwrap();
        ctx.clear_commands();

        dispatcher.render(&mut ctx, &mut scene);

        let labels: Vec<_> = ctx
            .commands()
            .iter()
            .map(|c| match c {
                Command::WriteBuffer { label, bytes } => format!("write {label} {}", bytes.len()),
                Command::BindCompute { .. } => "bind".to_string(),
                Command::Dispatch { groups } => format!("dispatch {groups:?}"),
                other => format!("{other:?}"),
            })
            .collect();
        assert_eq!(
            labels,
            [
                "write properties 128",
                "write spheres 192",
                "write materials 384",
                "bind",
                "dispatch [241, 135, 1]",
            ]
        );
        assert_eq!(scene.frame_count(), 1);
    }

    #[test]
    fn test_uploaded_frame_count_precedes_increment() {
        let mut ctx = RecordingContext::new();
        let mut scene = SceneModel::playground(64, 64);
        let mut dispatcher = ComputeDispatcher::new(&mut ctx, &KernelProvider::embedded(), 64, 64).unwrap();

        for expected in 0..3u32 {
            ctx.clear_commands();
            dispatcher.render(&mut ctx, &mut scene);
            let Command::WriteBuffer { bytes, .. } = &ctx.commands()[0] else {
                panic!("properties upload must come first");
            };
            let uploaded = RaytracerProperties::decode(bytes).unwrap();
            assert_eq!(uploaded.frame_count, expected);
            assert_eq!(scene.frame_count(), expected + 1);
        }
    }

    #[test]
    fn test_resize_recreates_output() {
        let mut ctx = RecordingContext::new();
        let mut dispatcher = ComputeDispatcher::new(&mut ctx, &KernelProvider::embedded(), 64, 64).unwrap();
        let first = dispatcher.output().id;

        assert!(!dispatcher.resize(&mut ctx, 64, 64).unwrap());
        assert!(dispatcher.resize(&mut ctx, 100, 50).unwrap());
        assert_ne!(dispatcher.output().id, first);
        assert_eq!(dispatcher.dimensions(), (100, 50));
        assert_eq!(dispatcher.output().width, 100);
    }
}
