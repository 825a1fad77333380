//! GPU record layouts.
//!
//! Each scene record has a `#[repr(C)]` twin whose field order, size and
//! padding match the WGSL struct declared in `shaders/raytracer.wgsl`.
//! WGSL aligns `vec3<f32>` to 16 bytes, so every vec3 is followed by a
//! scalar or an explicit pad. Records cross the CPU/GPU boundary only
//! through [`GpuRecord::encode_into`] / [`GpuRecord::decode`].
//!
//! ```text
//! Properties (128 B)  width u32 | height u32 | frame_count u32 | sphere_count u32 | Camera
//! Camera     (112 B)  origin vec3, aspect f32 | lower_left vec3, lens_radius f32
//!                     | horizontal | vertical | u | v | w   (vec3 + pad each)
//! Sphere      (16 B)  center vec3 | radius f32
//! Material    (32 B)  kind u32 | pad x3 | albedo vec3 | fuzziness f32
//! ```

use bytemuck::{Pod, Zeroable};

use crate::error::{Error, Result};
use crate::math::Vec3;
use crate::scene::{Camera, Material, MaterialKind, RaytracerProperties, Sphere};

/// Bumped whenever any record layout below changes.
pub const LAYOUT_VERSION: u32 = 1;

/// A CPU-side record with a fixed GPU byte layout.
pub trait GpuRecord: Sized {
    /// `#[repr(C)]` mirror of the WGSL struct.
    type Raw: Pod;

    /// Record name used in errors and buffer labels.
    const NAME: &'static str;

    fn to_raw(&self) -> Self::Raw;

    fn from_raw(raw: &Self::Raw) -> Result<Self>;

    /// Bytes per record in a structured buffer.
    fn stride() -> u32 {
        std::mem::size_of::<Self::Raw>() as u32
    }

    /// Append the record's bytes to `out`.
    fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(bytemuck::bytes_of(&self.to_raw()));
    }

    /// Parse exactly one record from `bytes`.
    fn decode(bytes: &[u8]) -> Result<Self> {
        let raw = bytemuck::try_pod_read_unaligned::<Self::Raw>(bytes).map_err(|e| {
            Error::InvalidLayout {
                record: Self::NAME,
                reason: format!("{e} ({} bytes, expected {})", bytes.len(), Self::stride()),
            }
        })?;
        Self::from_raw(&raw)
    }
}

/// Encode a run of records back to back.
pub fn encode_slice<T: GpuRecord>(records: &[T], out: &mut Vec<u8>) {
    out.reserve(records.len() * T::stride() as usize);
    for record in records {
        record.encode_into(out);
    }
}

/// Decode a run of records written by [`encode_slice`].
pub fn decode_slice<T: GpuRecord>(bytes: &[u8]) -> Result<Vec<T>> {
    let stride = T::stride() as usize;
    if bytes.len() % stride != 0 {
        return Err(Error::InvalidLayout {
            record: T::NAME,
            reason: format!("{} bytes is not a multiple of stride {stride}", bytes.len()),
        });
    }
    bytes.chunks_exact(stride).map(T::decode).collect()
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GpuCamera {
    pub origin: [f32; 3],
    pub aspect_ratio: f32,
    pub lower_left_corner: [f32; 3],
    pub lens_radius: f32,
    pub horizontal: [f32; 3],
    pub _pad0: f32,
    pub vertical: [f32; 3],
    pub _pad1: f32,
    pub u: [f32; 3],
    pub _pad2: f32,
    pub v: [f32; 3],
    pub _pad3: f32,
    pub w: [f32; 3],
    pub _pad4: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GpuProperties {
    pub width: u32,
    pub height: u32,
    pub frame_count: u32,
    pub sphere_count: u32,
    pub camera: GpuCamera,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GpuSphere {
    pub center: [f32; 3],
    pub radius: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GpuMaterial {
    pub kind: u32,
    pub _pad: [u32; 3],
    pub albedo: [f32; 3],
    pub fuzziness: f32,
}

impl From<&Camera> for GpuCamera {
    fn from(c: &Camera) -> Self {
        Self {
            origin: c.origin.to_array(),
            aspect_ratio: c.aspect_ratio,
            lower_left_corner: c.lower_left_corner.to_array(),
            lens_radius: c.lens_radius,
            horizontal: c.horizontal.to_array(),
            _pad0: 0.0,
            vertical: c.vertical.to_array(),
            _pad1: 0.0,
            u: c.u.to_array(),
            _pad2: 0.0,
            v: c.v.to_array(),
            _pad3: 0.0,
            w: c.w.to_array(),
            _pad4: 0.0,
        }
    }
}

impl From<&GpuCamera> for Camera {
    fn from(raw: &GpuCamera) -> Self {
        Self {
            origin: Vec3::from_array(raw.origin),
            lower_left_corner: Vec3::from_array(raw.lower_left_corner),
            horizontal: Vec3::from_array(raw.horizontal),
            vertical: Vec3::from_array(raw.vertical),
            u: Vec3::from_array(raw.u),
            v: Vec3::from_array(raw.v),
            w: Vec3::from_array(raw.w),
            aspect_ratio: raw.aspect_ratio,
            lens_radius: raw.lens_radius,
        }
    }
}

impl GpuRecord for RaytracerProperties {
    type Raw = GpuProperties;
    const NAME: &'static str = "properties";

    fn to_raw(&self) -> GpuProperties {
        GpuProperties {
            width: self.width,
            height: self.height,
            frame_count: self.frame_count,
            sphere_count: self.sphere_count,
            camera: GpuCamera::from(&self.camera),
        }
    }

    fn from_raw(raw: &GpuProperties) -> Result<Self> {
        Ok(Self {
            width: raw.width,
            height: raw.height,
            frame_count: raw.frame_count,
            sphere_count: raw.sphere_count,
            camera: Camera::from(&raw.camera),
        })
    }
}

impl GpuRecord for Sphere {
    type Raw = GpuSphere;
    const NAME: &'static str = "spheres";

    fn to_raw(&self) -> GpuSphere {
        GpuSphere {
            center: self.center.to_array(),
            radius: self.radius,
        }
    }

    fn from_raw(raw: &GpuSphere) -> Result<Self> {
        Ok(Self::new(Vec3::from_array(raw.center), raw.radius))
    }
}

impl GpuRecord for Material {
    type Raw = GpuMaterial;
    const NAME: &'static str = "materials";

    fn to_raw(&self) -> GpuMaterial {
        GpuMaterial {
            kind: self.kind as u32,
            _pad: [0; 3],
            albedo: self.albedo.to_array(),
            fuzziness: self.fuzziness,
        }
    }

    fn from_raw(raw: &GpuMaterial) -> Result<Self> {
        Ok(Self {
            kind: MaterialKind::try_from(raw.kind)?,
            albedo: Vec3::from_array(raw.albedo),
            fuzziness: raw.fuzziness,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{CameraDesc, SceneModel};
    use std::mem::{offset_of, size_of};

    #[test]
    fn test_record_sizes() {
        assert_eq!(size_of::<GpuCamera>(), 112);
        assert_eq!(size_of::<GpuProperties>(), 128);
        assert_eq!(size_of::<GpuSphere>(), 16);
        assert_eq!(size_of::<GpuMaterial>(), 32);
        assert_eq!(Sphere::stride(), 16);
        assert_eq!(Material::stride(), 32);
    }

    #[test]
    fn test_wgsl_offsets() {
        // vec3 members must start on 16-byte boundaries
        assert_eq!(offset_of!(GpuProperties, camera), 16);
        assert_eq!(offset_of!(GpuCamera, lower_left_corner), 16);
        assert_eq!(offset_of!(GpuCamera, horizontal), 32);
        assert_eq!(offset_of!(GpuCamera, w), 96);
        assert_eq!(offset_of!(GpuMaterial, albedo), 16);
        assert_eq!(offset_of!(GpuMaterial, fuzziness), 28);
    }

    #[test]
    fn test_properties_roundtrip_is_bit_identical() {
        let mut scene = SceneModel::new(1925, 1080, CameraDesc { aperture: 0.1, ..Default::default() });
        scene.advance_frame();
        let props = *scene.properties();

        let mut bytes = Vec::new();
        props.encode_into(&mut bytes);
        assert_eq!(bytes.len(), 128);

        let back = RaytracerProperties::decode(&bytes).unwrap();
        let mut again = Vec::new();
        back.encode_into(&mut again);
        assert_eq!(bytes, again);
        assert_eq!(back, props);
    }

    #[test]
    fn test_material_roundtrip_preserves_nan() {
        let m = Material::metal(Vec3::new(f32::NAN, 0.5, f32::INFINITY), -0.0);
        let mut bytes = Vec::new();
        m.encode_into(&mut bytes);
        let back = Material::decode(&bytes).unwrap();
        assert_eq!(back.kind, MaterialKind::Metal);
        assert_eq!(back.albedo.x.to_bits(), f32::NAN.to_bits());
        assert_eq!(back.albedo.z, f32::INFINITY);
        assert_eq!(back.fuzziness.to_bits(), (-0.0f32).to_bits());
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        let err = Sphere::decode(&[0u8; 12]).unwrap_err();
        assert!(matches!(err, Error::InvalidLayout { record: "spheres", .. }));

        let mut bytes = Vec::new();
        Material::lambertian(Vec3::ONE).encode_into(&mut bytes);
        bytes[0] = 9;
        assert!(matches!(Material::decode(&bytes), Err(Error::UnknownMaterialKind(9))));
    }

    #[test]
    fn test_slice_roundtrip() {
        let scene = SceneModel::playground(64, 64);
        let mut bytes = Vec::new();
        encode_slice(scene.spheres(), &mut bytes);
        assert_eq!(bytes.len(), 12 * 16);
        let back: Vec<Sphere> = decode_slice(&bytes).unwrap();
        assert_eq!(back, scene.spheres());

        assert!(decode_slice::<Sphere>(&bytes[..20]).is_err());
    }
}
