//! One-sample multiple importance sampling of material and light
//! proposals.

use std::f32::consts::PI;

use lumen_math::Vec3;

use crate::geometry::HitRecord;
use crate::light_sampler::{LightSampler, UNIFORM_SPHERE_PDF};
use crate::material::MaterialPdfKind;
use crate::rng::Rng;

/// Below this on every axis a generated direction counts as degenerate.
const DEGENERATE_DIRECTION: f32 = 1e-8;

/// Densities of one direction under each proposal.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MixtureValue {
    pub material: f32,
    pub light: f32,
    /// What the direction was actually drawn with
    pub combined: f32,
}

/// Equal-weight mixture of a material's proposal and light sampling,
/// falling back to the material alone when the scene has no lights.
pub struct MixturePdf<'a> {
    kind: MaterialPdfKind,
    origin: Vec3,
    normal: Vec3,
    lights: &'a LightSampler<'a>,
}

impl<'a> MixturePdf<'a> {
    pub fn new(kind: MaterialPdfKind, hit: &HitRecord, lights: &'a LightSampler<'a>) -> Self {
        Self {
            kind,
            origin: hit.position,
            normal: hit.normal,
            lights,
        }
    }

    /// Draw a unit direction.
    pub fn generate(&self, rng: &mut Rng) -> Vec3 {
        let choice = rng.next_f32();
        let direction = if self.lights.is_enabled() && choice < 0.5 {
            match self.lights.sample(rng) {
                Some(sample) => sample.position - self.origin,
                None => self.generate_material(rng),
            }
        } else {
            self.generate_material(rng)
        };

        // The oracle's ray bounds are parametric, so the length must be one
        non_degenerate(direction, self.normal).normalize_or_zero()
    }

    fn generate_material(&self, rng: &mut Rng) -> Vec3 {
        match self.kind {
            MaterialPdfKind::Cosine => rng.cosine_direction(self.normal),
            MaterialPdfKind::Sphere => rng.random_unit_vec3(),
            MaterialPdfKind::None => self.normal,
        }
    }

    pub fn evaluate(&self, direction: Vec3) -> MixtureValue {
        let material = scattering_pdf(self.kind, self.normal, direction);
        if !self.lights.is_enabled() {
            return MixtureValue {
                material,
                light: 0.0,
                combined: material,
            };
        }

        let light = self.lights.pdf_value(self.origin, direction);
        MixtureValue {
            material,
            light,
            combined: 0.5 * material + 0.5 * light,
        }
    }
}

fn non_degenerate(direction: Vec3, normal: Vec3) -> Vec3 {
    if direction.abs().cmplt(Vec3::splat(DEGENERATE_DIRECTION)).all() {
        normal
    } else {
        direction
    }
}

/// Density with which a material of `kind` scatters into `direction`.
///
/// Also the proposal density of that kind, since every proposal here
/// samples its own scattering lobe exactly.
pub fn scattering_pdf(kind: MaterialPdfKind, normal: Vec3, direction: Vec3) -> f32 {
    match kind {
        MaterialPdfKind::Cosine => {
            let cosine = normal.dot(direction.normalize_or_zero());
            cosine.max(0.0) / PI
        }
        MaterialPdfKind::Sphere => UNIFORM_SPHERE_PDF,
        MaterialPdfKind::None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::{scenes, Scene};

    fn receiver_hit() -> HitRecord {
        HitRecord {
            // Off the light's diagonal
            position: Vec3::new(0.1, 0.0, -0.2),
            local_position: Vec3::new(0.1, 0.0, -0.2),
            u: 0.5,
            v: 0.5,
            normal: Vec3::Y,
            front_face: true,
        }
    }

    fn quads() -> Scene {
        scenes::parallel_quads(Vec3::ONE, Vec3::ONE).unwrap()
    }

    #[test]
    fn test_scattering_pdf() {
        let cos_pdf = scattering_pdf(MaterialPdfKind::Cosine, Vec3::Y, Vec3::Y * 3.0);
        assert!((cos_pdf - 1.0 / PI).abs() < 1e-6);
        assert_eq!(scattering_pdf(MaterialPdfKind::Cosine, Vec3::Y, Vec3::NEG_Y), 0.0);
        let sphere = scattering_pdf(MaterialPdfKind::Sphere, Vec3::Y, Vec3::NEG_Y);
        assert!((sphere - 1.0 / (4.0 * PI)).abs() < 1e-7);
        assert_eq!(scattering_pdf(MaterialPdfKind::None, Vec3::Y, Vec3::Y), 0.0);
    }

    #[test]
    fn test_without_lights_only_material_pdf() {
        let mut scene = quads();
        scene.disable_light_sampling();
        let lights = LightSampler::new(&scene);
        let mixture = MixturePdf::new(MaterialPdfKind::Cosine, &receiver_hit(), &lights);

        let value = mixture.evaluate(Vec3::Y);
        assert_eq!(value.light, 0.0);
        assert_eq!(value.combined, value.material);

        let mut rng = Rng::from_state(1);
        for _ in 0..1000 {
            assert!(mixture.generate(&mut rng).dot(Vec3::Y) >= 0.0);
        }
    }

    #[test]
    fn test_combined_is_even_mix() {
        let scene = quads();
        let lights = LightSampler::new(&scene);
        let mixture = MixturePdf::new(MaterialPdfKind::Cosine, &receiver_hit(), &lights);

        let value = mixture.evaluate(Vec3::Y);
        assert!((value.material - 1.0 / PI).abs() < 1e-6);
        // Light straight above at distance 1 with unit area
        assert!((value.light - 1.0).abs() < 1e-5);
        assert!((value.combined - 0.5 * (1.0 + 1.0 / PI)).abs() < 1e-5);
    }

    #[test]
    fn test_light_half_of_the_time() {
        let scene = quads();
        let lights = LightSampler::new(&scene);
        let mixture = MixturePdf::new(MaterialPdfKind::Sphere, &receiver_hit(), &lights);

        let mut rng = Rng::from_state(77);
        let n = 20_000;
        let towards_light = (0..n)
            .filter(|_| mixture.evaluate(mixture.generate(&mut rng)).light > 0.0)
            .count();
        // Light sampling always hits the light, uniform sphere sampling
        // rarely does
        let frac = towards_light as f32 / n as f32;
        assert!(frac > 0.5 && frac < 0.6, "fraction {frac}");
    }

    #[test]
    fn test_one_sample_estimate_is_unbiased() {
        // E[p_scatter / p_combined] over mixture samples is the mass of the
        // scattering lobe, which is one
        let scene = quads();
        let lights = LightSampler::new(&scene);
        let mixture = MixturePdf::new(MaterialPdfKind::Cosine, &receiver_hit(), &lights);

        let mut rng = Rng::from_state(2024);
        let n = 100_000;
        let mut sum = 0.0f64;
        for _ in 0..n {
            let direction = mixture.generate(&mut rng);
            let value = mixture.evaluate(direction);
            if value.combined > 0.0 {
                sum += (value.material / value.combined) as f64;
            }
        }
        let estimate = sum / n as f64;
        assert!((estimate - 1.0).abs() < 0.02, "estimate {estimate}");
    }

    #[test]
    fn test_generated_directions_are_unit_length() {
        let scene = quads();
        let lights = LightSampler::new(&scene);
        let mut hit = receiver_hit();
        // Far from the light, so light samples are much longer than one
        hit.position.y = -50.0;
        let mixture = MixturePdf::new(MaterialPdfKind::Cosine, &hit, &lights);

        let mut rng = Rng::from_state(9);
        for _ in 0..1000 {
            let direction = mixture.generate(&mut rng);
            assert!((direction.length() - 1.0).abs() < 1e-5, "{direction:?}");
        }
    }

    #[test]
    fn test_degenerate_direction_falls_back_to_normal() {
        assert_eq!(non_degenerate(Vec3::splat(1e-9), Vec3::Y), Vec3::Y);
        assert_eq!(non_degenerate(Vec3::new(0.0, -1e-9, 0.0), Vec3::Z), Vec3::Z);
        let small = Vec3::new(1e-9, 2e-8, 0.0);
        assert_eq!(non_degenerate(small, Vec3::Y), small);
    }
}
