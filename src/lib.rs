//! # Playground Tracer
//!
//! Interactive progressive GPU ray tracer for sphere scenes.
//!
//! Each frame the [`scene::SceneModel`] is serialized into fixed-capacity
//! structured buffers, a compute kernel traces one sample per pixel into a
//! float image (blending with the previous frames), and a full-screen quad
//! draws that image to the display. Any scene edit resets accumulation.
//!
//! ## Modules
//!
//! - [`math`] - `Vector3` and helpers
//! - [`scene`] - Camera, materials, spheres and the scene model
//! - [`gpu`] - Record layouts, `GpuContext`, dispatcher, compositor
//! - [`viewer`] - eframe window and control panel (feature `viewer`)
//!
//! ## Example
//!
//! ```ignore
//! use playground_tracer::gpu::{FramePipeline, KernelProvider};
//! use playground_tracer::scene::SceneModel;
//!
//! let mut scene = SceneModel::playground(width, height);
//! let mut pipeline = FramePipeline::new(&mut ctx, &KernelProvider::embedded(), width, height)?;
//! loop {
//!     pipeline.render_frame(&mut ctx, &mut scene, &target);
//!     ctx.submit();
//! }
//! ```

pub mod error;
pub mod gpu;
pub mod math;
pub mod scene;

// Interactive viewer (optional, enabled with "viewer" feature)
#[cfg(feature = "viewer")]
pub mod viewer;

// Re-export commonly used types
pub use error::{Error, Result};
pub use math::Vector3;
pub use scene::{Camera, CameraDesc, Material, MaterialKind, RaytracerProperties, SceneModel, Sphere, MAX_SPHERES};
