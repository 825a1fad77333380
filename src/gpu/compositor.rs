//! Quad compositor: draws the compute output as a full-screen textured quad.

use bytemuck::{Pod, Zeroable};

use crate::error::Result;

use super::context::{BorderMode, BufferDesc, BufferKind, GpuContext, QuadKernelDesc, SamplerDesc};
use super::kernels::{KernelId, KernelProvider, FRAGMENT_ENTRY, VERTEX_ENTRY};

/// Vertex format of `quad.wgsl`: location 0 = position, 1 = tex coords.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
}

const fn vertex(x: f32, y: f32, u: f32, v: f32) -> QuadVertex {
    QuadVertex {
        position: [x, y],
        tex_coords: [u, v],
    }
}

/// Two clockwise triangles covering clip space; v grows downwards.
pub const QUAD_VERTICES: [QuadVertex; 6] = [
    vertex(-1.0, 1.0, 0.0, 0.0),
    vertex(1.0, -1.0, 1.0, 1.0),
    vertex(-1.0, -1.0, 0.0, 1.0),
    vertex(-1.0, 1.0, 0.0, 0.0),
    vertex(1.0, 1.0, 1.0, 0.0),
    vertex(1.0, -1.0, 1.0, 1.0),
];

pub struct QuadCompositor<C: GpuContext> {
    vertices: C::Buffer,
    kernel: C::QuadKernel,
    sampler: C::Sampler,
    /// Bindings over the image last passed to `attach`
    bindings: C::Bindings,
}

impl<C: GpuContext> QuadCompositor<C> {
    #[tracing::instrument(skip_all)]
    pub fn new(ctx: &mut C, kernels: &KernelProvider, image: &C::Image) -> Result<Self> {
        let contents: &[u8] = bytemuck::cast_slice(&QUAD_VERTICES);
        let vertices = ctx.create_buffer(&BufferDesc {
            label: "quad_vertices",
            kind: BufferKind::Vertex,
            size: contents.len() as u64,
            contents: Some(contents),
        })?;

        let source = kernels.load(KernelId::Quad)?;
        let kernel = ctx.create_quad_kernel(&QuadKernelDesc {
            source: &source,
            vertex_entry: VERTEX_ENTRY,
            fragment_entry: FRAGMENT_ENTRY,
        })?;

        let sampler = ctx.create_sampler(&SamplerDesc {
            label: "quad_sampler",
            border: BorderMode::OpaqueWhite,
        })?;

        let bindings = ctx.create_quad_bindings(&kernel, image, &sampler)?;
        tracing::info!("quad compositor ready");

        Ok(Self {
            vertices,
            kernel,
            sampler,
            bindings,
        })
    }

    /// Sample `image` from now on (after the dispatcher recreates it).
    pub fn attach(&mut self, ctx: &mut C, image: &C::Image) -> Result<()> {
        self.bindings = ctx.create_quad_bindings(&self.kernel, image, &self.sampler)?;
        Ok(())
    }

    /// Release the compute output binding, then draw the quad into `target`.
    pub fn draw(&self, ctx: &mut C, target: &C::Target) {
        ctx.clear_compute_output();
        ctx.draw(
            &self.kernel,
            &self.bindings,
            &self.vertices,
            target,
            QUAD_VERTICES.len() as u32,
        );
    }
}
