//! Material definitions.
//!
//! Materials are plain data here; their scattering behaviour lives in the
//! renderer.

use crate::property::PropertyRef;
use crate::table::Id;

/// Surface material of a mesh instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Material {
    /// Ideal diffuse reflector.
    Lambertian { albedo: PropertyRef },
    /// Mirror with a fuzzy lobe. Fuzz is read from the `x` channel of the
    /// resolved property and clamped to `[0, 1]`.
    Metal {
        albedo: PropertyRef,
        fuzz: PropertyRef,
    },
    /// Glass-like refractor.
    Dielectric { refraction_index: f32 },
    /// Area light, emitting from its front face only.
    DiffuseLight { emit: PropertyRef },
}

pub type MaterialId = Id<Material>;

impl Material {
    pub fn is_emissive(&self) -> bool {
        matches!(self, Material::DiffuseLight { .. })
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Material::Lambertian { .. } => "lambertian",
            Material::Metal { .. } => "metal",
            Material::Dielectric { .. } => "dielectric",
            Material::DiffuseLight { .. } => "diffuse_light",
        }
    }

    /// Property references held by this material.
    pub fn properties(&self) -> Vec<PropertyRef> {
        match *self {
            Material::Lambertian { albedo } => vec![albedo],
            Material::Metal { albedo, fuzz } => vec![albedo, fuzz],
            Material::Dielectric { .. } => Vec::new(),
            Material::DiffuseLight { emit } => vec![emit],
        }
    }
}
