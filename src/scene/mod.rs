//! Scene model: camera, spheres, materials and accumulation state.
//!
//! ## Modules
//!
//! - [`camera`] - Thin-lens camera basis
//! - [`material`] - Material kinds and records
//! - [`model`] - `SceneModel` and its edit/invalidation operations

pub mod camera;
pub mod material;
pub mod model;

pub use camera::{Camera, CameraDesc};
pub use material::{Material, MaterialKind};
pub use model::{RaytracerProperties, SceneModel, Sphere, MAX_SPHERES};
