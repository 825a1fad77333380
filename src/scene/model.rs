//! Scene model: the single source of truth the frame loop uploads each frame.
//!
//! Sphere and material storage are fixed-capacity arrays sized to the GPU
//! buffers; `properties.sphere_count` is the live length of both. Every
//! mutation goes through a method that resets `frame_count` so progressive
//! accumulation restarts with the edited scene.

use crate::error::{Error, Result};
use crate::math::Vec3;

use super::camera::{Camera, CameraDesc};
use super::material::{Material, MaterialKind};

/// Maximum number of spheres (and materials) the GPU buffers hold.
pub const MAX_SPHERES: usize = 100;

/// Sphere primitive. Zero or negative radius is passed through unchecked.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// Per-frame kernel parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaytracerProperties {
    pub width: u32,
    pub height: u32,
    /// Accumulation counter: frames blended since the last edit
    pub frame_count: u32,
    pub sphere_count: u32,
    pub camera: Camera,
}

/// Camera, spheres, materials and the accumulation counter.
#[derive(Debug, Clone)]
pub struct SceneModel {
    properties: RaytracerProperties,
    camera_desc: CameraDesc,
    spheres: [Sphere; MAX_SPHERES],
    materials: [Material; MAX_SPHERES],
}

impl SceneModel {
    /// Empty scene rendered at `width` x `height`.
    pub fn new(width: u32, height: u32, camera_desc: CameraDesc) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            properties: RaytracerProperties {
                width,
                height,
                frame_count: 0,
                sphere_count: 0,
                camera: Camera::new(&camera_desc, aspect(width, height)),
            },
            camera_desc,
            spheres: [Sphere::default(); MAX_SPHERES],
            materials: [Material::default(); MAX_SPHERES],
        }
    }

    /// The startup scene: three coloured lights over a metal floor with
    /// mirrors, diffuse and brushed-metal spheres.
    pub fn playground(width: u32, height: u32) -> Self {
        let light_red = Material::emissive(Vec3::new(10.0, 0.0, 0.0));
        let light_green = Material::emissive(Vec3::new(0.0, 10.0, 0.0));
        let light_blue = Material::emissive(Vec3::new(0.0, 0.0, 10.0));
        let yellowish = Material::lambertian(Vec3::new(0.8, 0.8, 0.0));
        let reddish = Material::lambertian(Vec3::new(0.7, 0.3, 0.3));
        let greenish = Material::lambertian(Vec3::new(0.3, 0.7, 0.3));
        let bluish = Material::lambertian(Vec3::new(0.3, 0.3, 0.7));
        let mirror = Material::metal(Vec3::splat(0.8), 0.0);
        let pink_metal = Material::metal(Vec3::new(0.6, 0.0, 0.3), 0.5);
        let fuzzy_metal = Material::metal(Vec3::new(0.3, 0.6, 0.8), 0.7);

        let entries = [
            (Sphere::new(Vec3::new(0.0, 40.0, 0.0), 10.0), light_red),
            (Sphere::new(Vec3::new(0.0, 40.0, -40.0), 10.0), light_green),
            (Sphere::new(Vec3::new(0.0, 40.0, 40.0), 10.0), light_blue),
            (Sphere::new(Vec3::new(0.0, -100.5, -1.0), 100.0), fuzzy_metal),
            (Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5), mirror),
            (Sphere::new(Vec3::new(0.0, 1.0, -1.0), 0.5), mirror),
            (Sphere::new(Vec3::new(-1.2, 0.0, -1.5), 0.5), yellowish),
            (Sphere::new(Vec3::new(1.2, 0.0, -1.0), 0.5), reddish),
            (Sphere::new(Vec3::new(0.5, -0.2, 0.0), 0.3), greenish),
            (Sphere::new(Vec3::new(1.4, -0.2, 0.0), 0.3), fuzzy_metal),
            (Sphere::new(Vec3::new(-0.8, -0.2, -0.2), 0.3), bluish),
            (Sphere::new(Vec3::new(-0.2, -0.4, 0.0), 0.1), pink_metal),
        ];

        let mut scene = Self::new(width, height, CameraDesc::default());
        for (sphere, material) in entries {
            scene.spheres[scene.len()] = sphere;
            scene.materials[scene.len()] = material;
            scene.properties.sphere_count += 1;
        }
        scene
    }

    pub fn properties(&self) -> &RaytracerProperties {
        &self.properties
    }

    pub fn frame_count(&self) -> u32 {
        self.properties.frame_count
    }

    pub fn camera_desc(&self) -> &CameraDesc {
        &self.camera_desc
    }

    /// Live sphere count.
    pub fn len(&self) -> usize {
        self.properties.sphere_count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live spheres, in upload order.
    pub fn spheres(&self) -> &[Sphere] {
        &self.spheres[..self.len()]
    }

    /// Live materials; `materials()[i]` belongs to `spheres()[i]`.
    pub fn materials(&self) -> &[Material] {
        &self.materials[..self.len()]
    }

    /// Restart accumulation. Called by every edit below.
    pub fn invalidate(&mut self) {
        if self.properties.frame_count != 0 {
            tracing::debug!(frames = self.properties.frame_count, "accumulation reset");
        }
        self.properties.frame_count = 0;
    }

    /// Accumulation tick, issued once per dispatched frame.
    pub(crate) fn advance_frame(&mut self) {
        self.properties.frame_count = self.properties.frame_count.wrapping_add(1);
    }

    /// Append a sphere with its material, returning its index.
    pub fn push(&mut self, sphere: Sphere, material: Material) -> Result<usize> {
        let index = self.len();
        if index >= MAX_SPHERES {
            return Err(Error::CapacityExceeded {
                requested: index + 1,
                capacity: MAX_SPHERES,
            });
        }
        self.spheres[index] = sphere;
        self.materials[index] = material;
        self.properties.sphere_count += 1;
        self.invalidate();
        Ok(index)
    }

    /// Remove the sphere at `index`, shifting later entries down.
    pub fn remove(&mut self, index: usize) -> Option<(Sphere, Material)> {
        let len = self.len();
        if index >= len {
            return None;
        }
        let removed = (self.spheres[index], self.materials[index]);
        self.spheres.copy_within(index + 1..len, index);
        self.materials.copy_within(index + 1..len, index);
        self.properties.sphere_count -= 1;
        self.invalidate();
        Some(removed)
    }

    /// # Panics
    /// If `index` is not a live sphere (same for the setters below).
    pub fn set_sphere_center(&mut self, index: usize, center: Vec3) {
        self.live_index(index);
        self.spheres[index].center = center;
        self.invalidate();
    }

    pub fn set_sphere_radius(&mut self, index: usize, radius: f32) {
        self.live_index(index);
        self.spheres[index].radius = radius;
        self.invalidate();
    }

    pub fn set_albedo(&mut self, index: usize, albedo: Vec3) {
        self.live_index(index);
        self.materials[index].albedo = albedo;
        self.invalidate();
    }

    pub fn set_fuzziness(&mut self, index: usize, fuzziness: f32) {
        self.live_index(index);
        self.materials[index].fuzziness = fuzziness;
        self.invalidate();
    }

    pub fn set_material_kind(&mut self, index: usize, kind: MaterialKind) {
        self.live_index(index);
        self.materials[index].kind = kind;
        self.invalidate();
    }

    /// Rebuild the camera basis from new inputs.
    pub fn set_camera(&mut self, desc: CameraDesc) {
        self.camera_desc = desc;
        self.properties.camera = Camera::new(&desc, aspect(self.properties.width, self.properties.height));
        self.invalidate();
    }

    /// Track the output image size. Returns false if nothing changed.
    pub fn set_viewport(&mut self, width: u32, height: u32) -> bool {
        let width = width.max(1);
        let height = height.max(1);
        if self.properties.width == width && self.properties.height == height {
            return false;
        }
        self.properties.width = width;
        self.properties.height = height;
        self.properties.camera = Camera::new(&self.camera_desc, aspect(width, height));
        self.invalidate();
        true
    }

    fn live_index(&self, index: usize) {
        assert!(index < self.len(), "sphere index {index} out of range (count: {})", self.len());
    }
}

fn aspect(width: u32, height: u32) -> f32 {
    width as f32 / height as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_counts(scene: &SceneModel) {
        assert_eq!(scene.spheres().len(), scene.properties().sphere_count as usize);
        assert_eq!(scene.materials().len(), scene.properties().sphere_count as usize);
    }

    fn accumulated(frames: u32) -> SceneModel {
        let mut scene = SceneModel::playground(1920, 1080);
        for _ in 0..frames {
            scene.advance_frame();
        }
        scene
    }

    #[test]
    fn test_playground_scene() {
        let scene = SceneModel::playground(1920, 1080);
        assert_eq!(scene.len(), 12);
        assert_eq!(scene.frame_count(), 0);
        assert_eq!(scene.materials()[0].kind, MaterialKind::Emissive);
        assert_eq!(scene.spheres()[3].radius, 100.0);
        assert!((scene.properties().camera.aspect_ratio - 1920.0 / 1080.0).abs() < 1e-6);
        assert_counts(&scene);
    }

    #[test]
    fn test_each_edit_resets_accumulation() {
        let edits: [fn(&mut SceneModel); 7] = [
            |s| s.set_sphere_center(3, Vec3::ONE),
            |s| s.set_sphere_radius(0, 2.0),
            |s| s.set_albedo(1, Vec3::X),
            |s| s.set_fuzziness(4, 0.9),
            |s| s.set_material_kind(5, MaterialKind::Lambertian),
            |s| s.set_camera(CameraDesc { vertical_fov: 60.0, ..Default::default() }),
            |s| s.invalidate(),
        ];
        for edit in edits {
            let mut scene = accumulated(7);
            assert_eq!(scene.frame_count(), 7);
            edit(&mut scene);
            assert_eq!(scene.frame_count(), 0);
            assert_counts(&scene);
        }
    }

    #[test]
    fn test_push_and_capacity() {
        let mut scene = SceneModel::new(8, 8, CameraDesc::default());
        for i in 0..MAX_SPHERES {
            let idx = scene.push(Sphere::new(Vec3::ZERO, 1.0), Material::default()).unwrap();
            assert_eq!(idx, i);
            assert_counts(&scene);
        }
        let err = scene.push(Sphere::default(), Material::default()).unwrap_err();
        assert!(matches!(err, Error::CapacityExceeded { requested: 101, capacity: 100 }));
        assert_eq!(scene.len(), MAX_SPHERES);
    }

    #[test]
    fn test_remove_shifts_entries() {
        let mut scene = accumulated(3);
        let third = scene.spheres()[3];
        let (removed, material) = scene.remove(2).unwrap();
        assert_eq!(removed.center, Vec3::new(0.0, 40.0, 40.0));
        assert_eq!(material.kind, MaterialKind::Emissive);
        assert_eq!(scene.spheres()[2], third);
        assert_eq!(scene.len(), 11);
        assert_eq!(scene.frame_count(), 0);
        assert_counts(&scene);
        assert!(scene.remove(11).is_none());
    }

    #[test]
    fn test_set_viewport() {
        let mut scene = accumulated(4);
        assert!(!scene.set_viewport(1920, 1080));
        assert_eq!(scene.frame_count(), 4);

        assert!(scene.set_viewport(800, 800));
        assert_eq!(scene.frame_count(), 0);
        assert_eq!(scene.properties().width, 800);
        assert_eq!(scene.properties().camera.aspect_ratio, 1.0);
    }

    #[test]
    fn test_frame_count_wraps() {
        let mut scene = SceneModel::playground(4, 4);
        scene.properties.frame_count = u32::MAX;
        scene.advance_frame();
        assert_eq!(scene.frame_count(), 0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_edit_past_live_count_panics() {
        let mut scene = SceneModel::playground(4, 4);
        scene.set_albedo(12, Vec3::ONE);
    }
}
