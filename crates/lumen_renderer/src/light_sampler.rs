//! Area-proportional sampling of emissive triangles.

use std::f32::consts::PI;

use lumen_core::Scene;
use lumen_math::{intersect_triangle, Interval, Ray, Vec2, Vec3};

use crate::geometry::{HitRecord, T_MIN};
use crate::rng::Rng;

/// A point picked on a light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightSample {
    pub position: Vec3,
    /// Unit geometric normal following the triangle winding
    pub normal: Vec3,
    pub instance_id: u32,
    pub primitive_id: u32,
    pub barycentrics: Vec2,
}

#[derive(Clone, Copy)]
pub struct LightSampler<'a> {
    scene: &'a Scene,
}

impl<'a> LightSampler<'a> {
    pub fn new(scene: &'a Scene) -> Self {
        Self { scene }
    }

    /// Is there anything to sample?
    pub fn is_enabled(&self) -> bool {
        self.scene.lights.has_lights()
    }

    /// Pick a triangle with the alias table, then a uniform point on it.
    ///
    /// `None` when the scene has no lights or the table row points at
    /// geometry that does not exist.
    pub fn sample(&self, rng: &mut Rng) -> Option<LightSample> {
        if !self.is_enabled() {
            return None;
        }

        let u1 = rng.next_f32();
        let u2 = rng.next_f32();
        let entry = self.scene.lights.pick(u1, u2)?;
        let [a, b, c] = self
            .scene
            .world_triangle(entry.instance_id, entry.primitive_id)?;

        let barycentrics = rng.sample_triangle_barycentrics();
        let position = a + barycentrics.x * (b - a) + barycentrics.y * (c - a);
        let normal = (b - a).cross(c - a).normalize_or_zero();

        Some(LightSample {
            position,
            normal,
            instance_id: entry.instance_id,
            primitive_id: entry.primitive_id,
            barycentrics,
        })
    }

    /// Solid-angle density of `sample` as seen from `origin`.
    ///
    /// Zero when the light faces away from `origin`, where it emits nothing.
    pub fn pdf(&self, origin: Vec3, sample: &LightSample) -> f32 {
        match self.geometry_term(origin, sample.position, sample.normal) {
            Some((distance_squared, cosine)) if cosine > 0.0 => {
                distance_squared / (cosine * self.scene.lights.total_area)
            }
            _ => 0.0,
        }
    }

    /// Squared distance from `origin` to `point` and the cosine between
    /// `normal` and the direction back to `origin`.
    fn geometry_term(&self, origin: Vec3, point: Vec3, normal: Vec3) -> Option<(f32, f32)> {
        if self.scene.lights.total_area <= 0.0 {
            return None;
        }

        let to_light = point - origin;
        let distance_squared = to_light.length_squared();
        if distance_squared <= 0.0 {
            return None;
        }
        let cosine = normal.dot(-to_light) / distance_squared.sqrt();
        Some((distance_squared, cosine))
    }

    /// Density with which [`LightSampler::sample`] produces `direction`
    /// from `origin`: the sum over every light point along the ray.
    ///
    /// Points seen from behind count too, since `sample` picks them just
    /// as often.
    ///
    /// Linear in the number of emissive triangles once the ray passes the
    /// lights' combined bounds, so a finely tessellated light costs that
    /// much on every diffuse bounce.
    pub fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f32 {
        if !self.is_enabled() {
            return 0.0;
        }

        let ray = Ray::new(origin, direction.normalize_or_zero());
        let interval = Interval::new(T_MIN, f32::INFINITY);
        if ray.direction == Vec3::ZERO || !self.scene.lights.bounds.hit(&ray, interval) {
            return 0.0;
        }

        let total_area = self.scene.lights.total_area;
        self.scene
            .lights
            .entries
            .iter()
            .filter_map(|entry| {
                let [a, b, c] = self
                    .scene
                    .world_triangle(entry.instance_id, entry.primitive_id)?;
                let hit = intersect_triangle(&ray, a, b, c, interval)?;
                let normal = (b - a).cross(c - a).normalize_or_zero();
                let (distance_squared, cosine) = self.geometry_term(origin, ray.at(hit.t), normal)?;
                (cosine != 0.0).then(|| distance_squared / (cosine.abs() * total_area))
            })
            .sum()
    }

    /// Shading record at a light sample, for resolving its emission.
    pub fn hit_record(&self, sample: &LightSample, direction: Vec3) -> Option<HitRecord> {
        let (instance, mesh) = self.scene.instance_mesh(sample.instance_id)?;
        let vertices = mesh.triangle_vertices(sample.primitive_id)?;
        Some(HitRecord::interpolate(
            vertices,
            sample.barycentrics,
            &instance.object_to_world,
            &instance.world_to_object,
            direction,
        ))
    }
}

/// Density of a uniformly sampled direction on the unit sphere.
pub const UNIFORM_SPHERE_PDF: f32 = 1.0 / (4.0 * PI);
