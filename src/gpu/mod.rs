//! GPU side of the frame: record layouts, buffer channels, the compute
//! dispatcher and the quad compositor, all generic over [`GpuContext`].

mod channel;
mod compositor;
mod context;
mod dispatcher;
pub mod kernels;
pub mod layout;
mod pipeline;
pub mod recording;
mod wgpu_context;

pub use channel::StructuredBuffer;
pub use compositor::{QuadCompositor, QuadVertex, QUAD_VERTICES};
pub use context::{
    BorderMode, BufferDesc, BufferKind, ComputeKernelDesc, GpuContext, QuadKernelDesc, SamplerDesc,
};
pub use dispatcher::{dispatch_groups, ComputeDispatcher, WORKGROUP_SIZE};
pub use kernels::{KernelId, KernelProvider, KernelSource};
pub use layout::{GpuRecord, LAYOUT_VERSION};
pub use pipeline::FramePipeline;
pub use recording::{Command, RecordingContext};
pub use wgpu_context::{wanted_features, WgpuContext, WgpuImage, OUTPUT_FORMAT};
