//! Scattering and emission for each material kind.

use lumen_core::Material;
use lumen_math::{Ray, Vec3};

use crate::geometry::HitRecord;
use crate::resolver::PropertyResolver;
use crate::rng::Rng;

/// Color type alias (linear RGB)
pub type Color = Vec3;

/// Proposal distribution a non-specular material wants mixed with light
/// sampling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialPdfKind {
    /// Cosine-weighted hemisphere around the normal
    Cosine,
    /// Uniform over the whole sphere
    Sphere,
    None,
}

/// Outcome of a material's scatter step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScatterRecord {
    /// Path ends here.
    Absorbed,
    /// The material picked the direction itself; its attenuation already
    /// accounts for the sampling, so no pdf weighting applies.
    SkipPdf { attenuation: Color, ray: Ray },
    /// The direction is chosen by the MIS combiner from `kind` mixed with
    /// light sampling.
    Pdf {
        attenuation: Color,
        kind: MaterialPdfKind,
    },
}

impl ScatterRecord {
    pub fn is_scattered(&self) -> bool {
        !matches!(self, ScatterRecord::Absorbed)
    }

    pub fn skip_pdf(&self) -> bool {
        matches!(self, ScatterRecord::SkipPdf { .. })
    }

    pub fn attenuation(&self) -> Color {
        match *self {
            ScatterRecord::Absorbed => Color::ZERO,
            ScatterRecord::SkipPdf { attenuation, .. } => attenuation,
            ScatterRecord::Pdf { attenuation, .. } => attenuation,
        }
    }

    pub fn pdf_kind(&self) -> MaterialPdfKind {
        match *self {
            ScatterRecord::Pdf { kind, .. } => kind,
            _ => MaterialPdfKind::None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EmissionRecord {
    pub colour: Color,
}

/// How light interacts with a surface.
pub trait MaterialModel {
    /// Scatter an incoming ray at `hit`.
    fn scatter(
        &self,
        ray_in: &Ray,
        hit: &HitRecord,
        resolver: &PropertyResolver,
        rng: &mut Rng,
    ) -> ScatterRecord;

    /// Light emitted at `hit`. Black for everything but lights.
    fn emitted(&self, _hit: &HitRecord, _resolver: &PropertyResolver) -> EmissionRecord {
        EmissionRecord::default()
    }
}

impl MaterialModel for Material {
    fn scatter(
        &self,
        ray_in: &Ray,
        hit: &HitRecord,
        resolver: &PropertyResolver,
        rng: &mut Rng,
    ) -> ScatterRecord {
        match *self {
            Material::Lambertian { albedo } => ScatterRecord::Pdf {
                attenuation: resolver.resolve(albedo, hit),
                kind: MaterialPdfKind::Cosine,
            },

            Material::Metal { albedo, fuzz } => {
                let fuzz = resolver.resolve(fuzz, hit).x.clamp(0.0, 1.0);
                let reflected = reflect(ray_in.direction.normalize(), hit.normal).normalize();
                let direction = reflected + fuzz * rng.random_unit_vec3();

                // Only scatter if the reflected ray is in the same hemisphere as the normal
                if direction.dot(hit.normal) > 0.0 {
                    ScatterRecord::SkipPdf {
                        attenuation: resolver.resolve(albedo, hit),
                        ray: Ray::new(hit.position, direction),
                    }
                } else {
                    ScatterRecord::Absorbed
                }
            }

            Material::Dielectric { refraction_index } => {
                let ratio = if hit.front_face {
                    1.0 / refraction_index
                } else {
                    refraction_index
                };

                let unit_direction = ray_in.direction.normalize();
                let cos_theta = (-unit_direction).dot(hit.normal).min(1.0);
                let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

                // Check for total internal reflection
                let cannot_refract = ratio * sin_theta > 1.0;

                let direction =
                    if cannot_refract || reflectance(cos_theta, ratio) > rng.next_f32() {
                        reflect(unit_direction, hit.normal)
                    } else {
                        refract(unit_direction, hit.normal, ratio)
                    };

                ScatterRecord::SkipPdf {
                    attenuation: Color::ONE,
                    ray: Ray::new(hit.position, direction),
                }
            }

            Material::DiffuseLight { .. } => ScatterRecord::Absorbed,
        }
    }

    fn emitted(&self, hit: &HitRecord, resolver: &PropertyResolver) -> EmissionRecord {
        match *self {
            Material::DiffuseLight { emit } if hit.front_face => EmissionRecord {
                colour: resolver.resolve(emit, hit),
            },
            _ => EmissionRecord::default(),
        }
    }
}

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract a unit vector through a surface with relative index
/// `etai_over_etat`.
#[inline]
pub fn refract(uv: Vec3, n: Vec3, etai_over_etat: f32) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

/// Schlick's approximation for reflectance.
#[inline]
pub fn reflectance(cosine: f32, refraction_ratio: f32) -> f32 {
    let r0 = ((1.0 - refraction_ratio) / (1.0 + refraction_ratio)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::{PropertyRef, PropertyTables};

    fn hit(normal: Vec3, front_face: bool) -> HitRecord {
        HitRecord {
            position: Vec3::ZERO,
            local_position: Vec3::ZERO,
            u: 0.5,
            v: 0.5,
            normal,
            front_face,
        }
    }

    fn tables() -> (PropertyTables, PropertyRef, PropertyRef) {
        let mut tables = PropertyTables::default();
        let albedo = PropertyRef::Rgb(tables.colours.push(Vec3::new(0.8, 0.6, 0.2)));
        let zero = PropertyRef::Rgb(tables.colours.push(Vec3::ZERO));
        (tables, albedo, zero)
    }

    #[test]
    fn test_lambertian_defers_direction() {
        let (tables, albedo, _) = tables();
        let resolver = PropertyResolver::new(&tables);
        let ray = Ray::new(Vec3::Y, Vec3::NEG_Y);
        let mut rng = Rng::from_state(1);
        let before = rng;

        let lambertian = Material::Lambertian { albedo };
        let rec = lambertian.scatter(&ray, &hit(Vec3::Y, true), &resolver, &mut rng);
        assert!(rec.is_scattered());
        assert!(!rec.skip_pdf());
        assert_eq!(rec.pdf_kind(), MaterialPdfKind::Cosine);
        assert_eq!(rec.attenuation(), Vec3::new(0.8, 0.6, 0.2));
        // No randomness consumed
        assert_eq!(rng, before);
    }

    #[test]
    fn test_perfect_mirror() {
        let (tables, albedo, zero) = tables();
        let resolver = PropertyResolver::new(&tables);
        let metal = Material::Metal { albedo, fuzz: zero };
        let incoming = Vec3::new(1.0, -1.0, 0.0);
        let ray = Ray::new(Vec3::new(-1.0, 1.0, 0.0), incoming);

        let mut rng = Rng::from_state(3);
        let rec = metal.scatter(&ray, &hit(Vec3::Y, true), &resolver, &mut rng);
        match rec {
            ScatterRecord::SkipPdf { attenuation, ray } => {
                assert_eq!(attenuation, Vec3::new(0.8, 0.6, 0.2));
                let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
                assert!((ray.direction - expected).length() < 1e-6);
            }
            other => panic!("expected a specular bounce, got {other:?}"),
        }
    }

    #[test]
    fn test_metal_absorbs_below_surface() {
        let mut tables = PropertyTables::default();
        let albedo = PropertyRef::Rgb(tables.colours.push(Vec3::ONE));
        let fuzz = PropertyRef::Rgb(tables.colours.push(Vec3::splat(5.0)));
        let resolver = PropertyResolver::new(&tables);
        let metal = Material::Metal { albedo, fuzz };

        // Grazing ray with maximum fuzz: some draws must dip below the surface
        let ray = Ray::new(Vec3::ZERO, Vec3::new(1.0, -0.05, 0.0));
        let mut rng = Rng::from_state(11);
        let mut absorbed = 0;
        for _ in 0..1000 {
            let rec = metal.scatter(&ray, &hit(Vec3::Y, true), &resolver, &mut rng);
            match rec {
                ScatterRecord::Absorbed => absorbed += 1,
                ScatterRecord::SkipPdf { ray, .. } => assert!(ray.direction.dot(Vec3::Y) > 0.0),
                ScatterRecord::Pdf { .. } => panic!("metal never defers to MIS"),
            }
        }
        assert!(absorbed > 0 && absorbed < 1000);
    }

    #[test]
    fn test_specular_scatter_is_deterministic() {
        let (tables, albedo, _) = tables();
        let mut tables = tables;
        let fuzz = PropertyRef::Rgb(tables.colours.push(Vec3::splat(0.3)));
        let resolver = PropertyResolver::new(&tables);
        let materials = [
            Material::Metal { albedo, fuzz },
            Material::Dielectric {
                refraction_index: 1.5,
            },
        ];
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.3, -1.0, 0.1));
        let hit = hit(Vec3::Y, true);

        for material in materials {
            for state in [0, 1, 77, 123_456] {
                let mut a = Rng::from_state(state);
                let mut b = Rng::from_state(state);
                let first = material.scatter(&ray, &hit, &resolver, &mut a);
                let second = material.scatter(&ray, &hit, &resolver, &mut b);
                assert_eq!(first, second);
                assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn test_dielectric_refraction_follows_snell() {
        let tables = PropertyTables::default();
        let resolver = PropertyResolver::new(&tables);
        let glass = Material::Dielectric {
            refraction_index: 1.5,
        };
        let incoming = Vec3::new(0.5, -1.0, 0.0).normalize();
        let ray = Ray::new(Vec3::ZERO, incoming);

        let sin_in = incoming.x.abs();
        let mut saw_refraction = false;
        for state in 0..64 {
            let mut rng = Rng::from_state(state);
            let rec = glass.scatter(&ray, &hit(Vec3::Y, true), &resolver, &mut rng);
            let ScatterRecord::SkipPdf { attenuation, ray } = rec else {
                panic!("glass always scatters");
            };
            assert_eq!(attenuation, Vec3::ONE);
            if ray.direction.y < 0.0 {
                saw_refraction = true;
                let sin_out = ray.direction.normalize().x.abs();
                assert!((sin_in - 1.5 * sin_out).abs() < 1e-5);
            }
        }
        assert!(saw_refraction);
    }

    #[test]
    fn test_total_internal_reflection() {
        let tables = PropertyTables::default();
        let resolver = PropertyResolver::new(&tables);
        let glass = Material::Dielectric {
            refraction_index: 1.5,
        };
        // Leaving the glass at a steep angle, normal already flipped towards the ray
        let incoming = Vec3::new(0.9, -0.2, 0.0).normalize();
        let ray = Ray::new(Vec3::ZERO, incoming);
        for state in 0..16 {
            let mut rng = Rng::from_state(state);
            let rec = glass.scatter(&ray, &hit(Vec3::Y, false), &resolver, &mut rng);
            let ScatterRecord::SkipPdf { ray, .. } = rec else {
                panic!("glass always scatters");
            };
            assert!((ray.direction - reflect(incoming, Vec3::Y)).length() < 1e-6);
        }
    }

    #[test]
    fn test_light_emits_from_front_only() {
        let (tables, emit, _) = tables();
        let resolver = PropertyResolver::new(&tables);
        let light = Material::DiffuseLight { emit };
        let ray = Ray::new(Vec3::Y, Vec3::NEG_Y);

        assert_eq!(
            light.emitted(&hit(Vec3::Y, true), &resolver).colour,
            Vec3::new(0.8, 0.6, 0.2)
        );
        assert_eq!(light.emitted(&hit(Vec3::Y, false), &resolver).colour, Vec3::ZERO);
        assert_eq!(
            light.scatter(&ray, &hit(Vec3::Y, true), &resolver, &mut Rng::from_state(0)),
            ScatterRecord::Absorbed
        );
        let diffuse = Material::Lambertian { albedo: emit };
        assert_eq!(diffuse.emitted(&hit(Vec3::Y, true), &resolver), EmissionRecord::default());
    }

    #[test]
    fn test_schlick_limits() {
        assert!((reflectance(1.0, 1.0 / 1.5) - 0.04).abs() < 1e-6);
        assert!((reflectance(0.0, 1.0 / 1.5) - 1.0).abs() < 1e-6);
    }
}
