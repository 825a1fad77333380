//! Surface materials.

use crate::error::{Error, Result};
use crate::math::Vec3;

/// How a surface interacts with light. Discriminants are the GPU encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum MaterialKind {
    Emissive = 0,
    #[default]
    Lambertian = 1,
    Metal = 2,
}

impl MaterialKind {
    pub const ALL: [MaterialKind; 3] = [Self::Emissive, Self::Lambertian, Self::Metal];

    /// Label shown in the control panel.
    pub fn label(self) -> &'static str {
        match self {
            Self::Emissive => "Light",
            Self::Lambertian => "Lambertian",
            Self::Metal => "Metal",
        }
    }
}

impl TryFrom<u32> for MaterialKind {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Self::Emissive),
            1 => Ok(Self::Lambertian),
            2 => Ok(Self::Metal),
            other => Err(Error::UnknownMaterialKind(other)),
        }
    }
}

/// Material record, one per sphere.
///
/// `fuzziness` only affects `Metal` but is always stored so every record
/// has the same size on the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Material {
    pub kind: MaterialKind,
    pub albedo: Vec3,
    pub fuzziness: f32,
}

impl Material {
    /// Light source; `albedo` is the emitted radiance and may exceed 1.
    pub fn emissive(albedo: Vec3) -> Self {
        Self { kind: MaterialKind::Emissive, albedo, fuzziness: 0.0 }
    }

    pub fn lambertian(albedo: Vec3) -> Self {
        Self { kind: MaterialKind::Lambertian, albedo, fuzziness: 0.0 }
    }

    pub fn metal(albedo: Vec3, fuzziness: f32) -> Self {
        Self { kind: MaterialKind::Metal, albedo, fuzziness }
    }
}
