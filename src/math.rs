//! Vector math used by the scene model.
//!
//! `Vector3` is `glam::Vec3`: negation, add/sub, scalar mul/div, the
//! assigning variants, `dot`, `cross`, `length`, `normalize` and `lerp`
//! come from glam. The helpers below fill in what the shading side expects
//! on top of that. No NaN/Inf guards: IEEE-754 semantics propagate.

pub use glam::Vec3;

/// Three-component real-valued vector.
pub type Vector3 = Vec3;

/// Mirror `v` about the plane with unit normal `normal`.
#[inline]
pub fn reflect(v: Vec3, normal: Vec3) -> Vec3 {
    v - normal * 2.0 * v.dot(normal)
}

/// Scalar linear interpolation.
#[inline]
pub fn lerp(start: f32, end: f32, t: f32) -> f32 {
    start + (end - start) * t
}

/// Unit vector in the direction of `v`.
///
/// Unlike `Vec3::normalize` this never asserts in debug builds; a zero
/// vector yields NaN components.
#[inline]
pub fn unit_vector(v: Vec3) -> Vec3 {
    v / v.length()
}
