//! Device/context seam.
//!
//! The frame pipeline never touches a global device. Components receive a
//! `&mut impl GpuContext` owned by the frame loop, create their resources
//! through it once, and submit per-frame commands through it in program
//! order. [`WgpuContext`](super::WgpuContext) drives a real device;
//! [`RecordingContext`](super::RecordingContext) records the stream.

use crate::error::Result;

use super::kernels::KernelSource;

/// What a buffer is bound as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    /// Read-only strided array for compute kernels, rewritten by uploads
    Structured { stride: u32 },
    /// Immutable vertex data, filled at creation
    Vertex,
}

#[derive(Debug, Clone, Copy)]
pub struct BufferDesc<'a> {
    pub label: &'a str,
    pub kind: BufferKind,
    /// Size in bytes
    pub size: u64,
    /// Initial contents; required for `BufferKind::Vertex`
    pub contents: Option<&'a [u8]>,
}

#[derive(Debug, Clone, Copy)]
pub struct ComputeKernelDesc<'a> {
    pub source: &'a KernelSource,
    pub entry_point: &'a str,
    /// Read-only structured buffers at bindings `0..storage_inputs`;
    /// the output image follows at binding `storage_inputs`
    pub storage_inputs: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct QuadKernelDesc<'a> {
    pub source: &'a KernelSource,
    pub vertex_entry: &'a str,
    pub fragment_entry: &'a str,
}

/// Addressing outside `[0, 1]` texture coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderMode {
    ClampToEdge,
    /// Clamp to an opaque white border
    OpaqueWhite,
}

/// Point-sampling sampler description.
#[derive(Debug, Clone, Copy)]
pub struct SamplerDesc<'a> {
    pub label: &'a str,
    pub border: BorderMode,
}

/// Graphics device plus its immediate command stream.
///
/// Creation methods fail with [`Error::ResourceCreation`](crate::Error)
/// (or `MissingFeature`); callers treat that as fatal. Submission methods
/// are infallible and are observed by the device in call order.
pub trait GpuContext {
    type Buffer;
    /// 2D image writable by compute kernels and sampled by the quad kernel
    type Image;
    type ComputeKernel;
    type QuadKernel;
    type Sampler;
    /// Resource bindings prepared for one kernel
    type Bindings;
    /// Render target the compositor draws into
    type Target: ?Sized;

    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<Self::Buffer>;

    fn create_image(&mut self, label: &str, width: u32, height: u32) -> Result<Self::Image>;

    fn create_compute_kernel(&mut self, desc: &ComputeKernelDesc<'_>) -> Result<Self::ComputeKernel>;

    fn create_quad_kernel(&mut self, desc: &QuadKernelDesc<'_>) -> Result<Self::QuadKernel>;

    fn create_sampler(&mut self, desc: &SamplerDesc<'_>) -> Result<Self::Sampler>;

    /// Bind `inputs` read-only and `output` as the sole writable target.
    fn create_compute_bindings(
        &mut self,
        kernel: &Self::ComputeKernel,
        inputs: &[&Self::Buffer],
        output: &Self::Image,
    ) -> Result<Self::Bindings>;

    /// Bind `image` as a sampled texture with `sampler`.
    fn create_quad_bindings(
        &mut self,
        kernel: &Self::QuadKernel,
        image: &Self::Image,
        sampler: &Self::Sampler,
    ) -> Result<Self::Bindings>;

    /// Overwrite the start of `buffer` with `bytes`. Queued on the command
    /// stream, ordered before any later dispatch.
    fn write_buffer(&mut self, buffer: &Self::Buffer, bytes: &[u8]);

    /// Make `kernel` with `bindings` current for the next dispatch.
    fn bind_compute(&mut self, kernel: &Self::ComputeKernel, bindings: &Self::Bindings);

    fn dispatch(&mut self, groups: [u32; 3]);

    /// Release the compute kernel's writable image binding so the image can
    /// be sampled by a later draw.
    fn clear_compute_output(&mut self);

    /// Draw `vertex_count` non-indexed vertices into `target`.
    fn draw(
        &mut self,
        kernel: &Self::QuadKernel,
        bindings: &Self::Bindings,
        vertices: &Self::Buffer,
        target: &Self::Target,
        vertex_count: u32,
    );
}
