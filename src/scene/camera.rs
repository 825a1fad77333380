//! Thin-lens camera basis.

use crate::math::{unit_vector, Vec3};

/// Inputs a [`Camera`] is built from (aspect ratio comes from the viewport).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraDesc {
    pub position: Vec3,
    pub look_at: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees
    pub vertical_fov: f32,
    pub aperture: f32,
    pub focus_distance: f32,
}

impl Default for CameraDesc {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.0, 1.0),
            look_at: Vec3::new(0.0, 0.0, -1.0),
            up: Vec3::Y,
            vertical_fov: 90.0,
            aperture: 0.0,
            focus_distance: 1.5,
        }
    }
}

/// Projection basis consumed by the kernel.
///
/// `u`, `v`, `w` form a right-handed orthonormal frame with `w` pointing
/// from the look-at target back towards the eye. `horizontal` and
/// `vertical` span the viewport at `focus_distance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub origin: Vec3,
    pub lower_left_corner: Vec3,
    pub horizontal: Vec3,
    pub vertical: Vec3,
    pub u: Vec3,
    pub v: Vec3,
    pub w: Vec3,
    pub aspect_ratio: f32,
    pub lens_radius: f32,
}

impl Camera {
    /// Derive the basis for the given viewport aspect ratio.
    pub fn new(desc: &CameraDesc, aspect_ratio: f32) -> Self {
        let theta = desc.vertical_fov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h;
        let viewport_width = aspect_ratio * viewport_height;

        let w = unit_vector(desc.position - desc.look_at);
        let u = unit_vector(desc.up.cross(w));
        let v = unit_vector(w.cross(u));

        let origin = desc.position;
        let horizontal = u * viewport_width * desc.focus_distance;
        let vertical = v * viewport_height * desc.focus_distance;
        let lower_left_corner = origin - horizontal / 2.0 - vertical / 2.0 - w * desc.focus_distance;

        Self {
            origin,
            lower_left_corner,
            horizontal,
            vertical,
            u,
            v,
            w,
            aspect_ratio,
            lens_radius: desc.aperture / 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < EPS
    }

    #[test]
    fn test_basis_is_orthonormal_right_handed() {
        let cam = Camera::new(&CameraDesc::default(), 16.0 / 9.0);
        assert!((cam.u.length() - 1.0).abs() < EPS);
        assert!((cam.v.length() - 1.0).abs() < EPS);
        assert!((cam.w.length() - 1.0).abs() < EPS);
        assert!(cam.u.dot(cam.v).abs() < EPS);
        assert!(cam.v.dot(cam.w).abs() < EPS);
        assert!(approx(cam.u.cross(cam.v), cam.w));
    }

    #[test]
    fn test_axis_aligned_viewport() {
        let desc = CameraDesc {
            position: Vec3::ZERO,
            look_at: Vec3::NEG_Z,
            up: Vec3::Y,
            vertical_fov: 90.0,
            aperture: 0.5,
            focus_distance: 1.0,
        };
        let cam = Camera::new(&desc, 2.0);
        assert!(approx(cam.w, Vec3::Z));
        assert!(approx(cam.u, Vec3::X));
        assert!(approx(cam.v, Vec3::Y));
        // tan(45°) = 1 → viewport 2 high, 4 wide
        assert!(approx(cam.horizontal, Vec3::new(4.0, 0.0, 0.0)));
        assert!(approx(cam.vertical, Vec3::new(0.0, 2.0, 0.0)));
        assert!(approx(cam.lower_left_corner, Vec3::new(-2.0, -1.0, -1.0)));
        assert_eq!(cam.lens_radius, 0.25);
        assert_eq!(cam.aspect_ratio, 2.0);
    }

    #[test]
    fn test_focus_distance_scales_viewport() {
        let near = Camera::new(&CameraDesc { focus_distance: 1.0, ..Default::default() }, 1.0);
        let far = Camera::new(&CameraDesc { focus_distance: 3.0, ..Default::default() }, 1.0);
        assert!(approx(far.horizontal, near.horizontal * 3.0));
        assert!(approx(far.vertical, near.vertical * 3.0));
    }
}
