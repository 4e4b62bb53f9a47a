//! Per-sample radiance estimation.
//!
//! [`Integrator::trace_path`] is the unidirectional path tracer with one-sample
//! MIS at every diffuse bounce. [`Integrator::trace_direct`] stops at the
//! first diffuse surface and takes one explicitly shadowed light sample
//! there instead.

use lumen_core::{IntegratorMode, Material, Scene};
use lumen_math::{Ray, Vec3};

use crate::geometry::{GeometryOracle, HitRecord, Trace, T_MAX, T_MIN};
use crate::light_sampler::LightSampler;
use crate::material::{Color, MaterialModel, ScatterRecord};
use crate::mis::{scattering_pdf, MixturePdf};
use crate::resolver::PropertyResolver;
use crate::rng::Rng;

/// Where a ray ends up.
enum Landing<'a> {
    Surface(HitRecord, &'a Material),
    Sky(Color),
    /// The oracle reported ids the scene does not have
    Lost,
}

/// Everything a path needs that stays fixed for a whole render.
pub struct Integrator<'a> {
    scene: &'a Scene,
    oracle: &'a dyn GeometryOracle,
    resolver: PropertyResolver<'a>,
    lights: LightSampler<'a>,
    max_depth: u32,
}

impl<'a> Integrator<'a> {
    pub fn new(scene: &'a Scene, oracle: &'a dyn GeometryOracle, max_depth: u32) -> Self {
        Self {
            scene,
            oracle,
            resolver: PropertyResolver::new(&scene.properties),
            lights: LightSampler::new(scene),
            max_depth,
        }
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Radiance along `ray` with the chosen estimator.
    pub fn radiance(&self, mode: IntegratorMode, ray: Ray, rng: &mut Rng) -> Color {
        match mode {
            IntegratorMode::Path => self.trace_path(ray, rng),
            IntegratorMode::DirectLighting => self.trace_direct(ray, rng),
        }
    }

    fn intersect(&self, ray: &Ray) -> Landing<'a> {
        let raw = match self.oracle.trace(ray, T_MIN, T_MAX) {
            Trace::Hit(raw) => raw,
            Trace::Missed => return Landing::Sky(self.scene.sky.radiance(ray.direction)),
        };

        let hit = HitRecord::from_raw(self.scene, &raw);
        let material = self.scene.instance_material(raw.instance_id);
        match hit.zip(material) {
            Some((hit, material)) => Landing::Surface(hit, material),
            None => Landing::Lost,
        }
    }

    /// Full path tracing estimate for one camera ray.
    pub fn trace_path(&self, mut ray: Ray, rng: &mut Rng) -> Color {
        let mut radiance = Color::ZERO;
        let mut throughput = Color::ONE;

        for _ in 0..self.max_depth {
            let (hit, material) = match self.intersect(&ray) {
                Landing::Surface(hit, material) => (hit, material),
                Landing::Sky(sky) => {
                    radiance += throughput * sky;
                    break;
                }
                Landing::Lost => break,
            };

            radiance += throughput * material.emitted(&hit, &self.resolver).colour;

            match material.scatter(&ray, &hit, &self.resolver, rng) {
                ScatterRecord::Absorbed => break,
                ScatterRecord::SkipPdf { attenuation, ray: scattered } => {
                    throughput *= attenuation;
                    ray = scattered;
                }
                ScatterRecord::Pdf { attenuation, kind } => {
                    let mixture = MixturePdf::new(kind, &hit, &self.lights);
                    let direction = mixture.generate(rng);
                    let pdf = mixture.evaluate(direction);
                    if pdf.combined <= 0.0 {
                        break;
                    }

                    throughput *= attenuation * (pdf.material / pdf.combined);
                    ray = Ray::new(hit.position, direction);
                }
            }

            if throughput == Color::ZERO {
                break;
            }
        }

        radiance
    }

    /// Direct lighting only: emission is counted where a camera or
    /// specular ray lands, the first diffuse surface gets one light
    /// sample, and the path ends there.
    pub fn trace_direct(&self, mut ray: Ray, rng: &mut Rng) -> Color {
        let mut radiance = Color::ZERO;
        let mut throughput = Color::ONE;

        for _ in 0..self.max_depth {
            let (hit, material) = match self.intersect(&ray) {
                Landing::Surface(hit, material) => (hit, material),
                Landing::Sky(sky) => {
                    radiance += throughput * sky;
                    break;
                }
                Landing::Lost => break,
            };

            radiance += throughput * material.emitted(&hit, &self.resolver).colour;

            match material.scatter(&ray, &hit, &self.resolver, rng) {
                ScatterRecord::Absorbed => break,
                ScatterRecord::SkipPdf { attenuation, ray: scattered } => {
                    throughput *= attenuation;
                    ray = scattered;
                }
                ScatterRecord::Pdf { attenuation, kind } => {
                    let direct = self.sample_direct(&hit, rng);
                    let Some((direction, light_pdf, emitted)) = direct else {
                        break;
                    };
                    let scatter = scattering_pdf(kind, hit.normal, direction);
                    radiance += throughput * attenuation * emitted * (scatter / light_pdf);
                    break;
                }
            }
        }

        radiance
    }

    /// One unoccluded light sample seen from `hit`: the unit direction, its
    /// solid-angle pdf and the emitted radiance.
    fn sample_direct(&self, hit: &HitRecord, rng: &mut Rng) -> Option<(Vec3, f32, Color)> {
        let sample = self.lights.sample(rng)?;
        let pdf = self.lights.pdf(hit.position, &sample);
        if pdf <= 0.0 {
            return None;
        }

        let to_light = sample.position - hit.position;
        let distance = to_light.length();
        let direction = to_light / distance;
        if direction.dot(hit.normal) <= 0.0 {
            return None;
        }

        let shadow = Ray::new(hit.position, direction);
        if self.oracle.occluded(&shadow, T_MIN, distance - T_MIN) {
            return None;
        }

        let material = self.scene.instance_material(sample.instance_id)?;
        let light_hit = self.lights.hit_record(&sample, direction)?;
        let emitted = material.emitted(&light_hit, &self.resolver).colour;
        Some((direction, pdf, emitted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::SceneBvh;
    use lumen_core::{scenes, Material, Mesh, Scene, SceneBuilder, Sky};

    /// Form factor from the centre of a unit square to a parallel unit
    /// square one unit above it.
    const PARALLEL_QUADS_RADIANCE: f32 = 0.239_456_47;

    fn mean_radiance(
        integrator: &Integrator,
        mode: IntegratorMode,
        ray: Ray,
        samples: u32,
        seed: u32,
    ) -> Color {
        let mut sum = Color::ZERO;
        for i in 0..samples {
            let mut rng = Rng::from_state(seed.wrapping_add(i.wrapping_mul(7919)));
            sum += integrator.radiance(mode, ray, &mut rng);
        }
        sum / samples as f32
    }

    /// A white floor at `y = 0` under a square blocker at `y = gap`, lit by
    /// a 4x4 light facing down from `y = light_height`.
    fn shadowed_floor(gap: f32, blocker_size: f32, light_height: f32) -> Scene {
        let mut builder = SceneBuilder::new("shadowed_floor");
        let white = builder.add_colour(Vec3::splat(0.8));
        let emit = builder.add_colour(Vec3::splat(10.0));
        let diffuse = builder.add_material(Material::Lambertian { albedo: white });
        let light = builder.add_material(Material::DiffuseLight { emit });

        let corner = |size: f32, y: f32| Vec3::new(-0.5 * size, y, -0.5 * size);
        builder
            .add_object(
                Mesh::quad("light", corner(4.0, light_height), Vec3::X * 4.0, Vec3::Z * 4.0),
                light,
            )
            .unwrap();
        builder
            .add_object(
                Mesh::quad(
                    "blocker",
                    corner(blocker_size, gap),
                    Vec3::Z * blocker_size,
                    Vec3::X * blocker_size,
                ),
                diffuse,
            )
            .unwrap();
        builder
            .add_object(
                Mesh::quad("floor", corner(40.0, 0.0), Vec3::Z * 40.0, Vec3::X * 40.0),
                diffuse,
            )
            .unwrap();
        builder.sky(Sky::None);
        builder.build()
    }

    fn down_at_receiver() -> Ray {
        Ray::new(Vec3::new(0.0, 0.5, 0.0), Vec3::NEG_Y)
    }

    #[test]
    fn test_parallel_quads_path() {
        let scene = scenes::parallel_quads(Vec3::ONE, Vec3::ONE).unwrap();
        let bvh = SceneBvh::new(&scene);
        let integrator = Integrator::new(&scene, &bvh, 4);
        let l = mean_radiance(&integrator, IntegratorMode::Path, down_at_receiver(), 20_000, 1);
        assert!(
            (l.x - PARALLEL_QUADS_RADIANCE).abs() < 0.01,
            "radiance {l:?}"
        );
        assert!((l.x - l.y).abs() < 1e-6 && (l.y - l.z).abs() < 1e-6);
    }

    #[test]
    fn test_parallel_quads_direct() {
        let scene = scenes::parallel_quads(Vec3::ONE, Vec3::ONE).unwrap();
        let bvh = SceneBvh::new(&scene);
        let integrator = Integrator::new(&scene, &bvh, 4);
        let mode = IntegratorMode::DirectLighting;
        let l = mean_radiance(&integrator, mode, down_at_receiver(), 20_000, 2);
        assert!((l.x - PARALLEL_QUADS_RADIANCE).abs() < 0.01, "radiance {l:?}");
    }

    #[test]
    fn test_mis_matches_material_sampling() {
        let scene = scenes::parallel_quads(Vec3::ONE, Vec3::ONE).unwrap();
        let mut unlit = scene.clone();
        unlit.disable_light_sampling();

        let bvh = SceneBvh::new(&scene);
        let with_mis = Integrator::new(&scene, &bvh, 4);
        let without_mis = Integrator::new(&unlit, &bvh, 4);

        let ray = down_at_receiver();
        let a = mean_radiance(&with_mis, IntegratorMode::Path, ray, 40_000, 11);
        let b = mean_radiance(&without_mis, IntegratorMode::Path, ray, 40_000, 12);
        assert!((a.x - b.x).abs() < 0.05 * a.x, "with {a:?} without {b:?}");
    }

    #[test]
    fn test_seeing_the_light() {
        let scene = scenes::parallel_quads(Vec3::ONE, Vec3::splat(2.0)).unwrap();
        let bvh = SceneBvh::new(&scene);
        let integrator = Integrator::new(&scene, &bvh, 1);
        let mut rng = Rng::from_state(0);

        let up = Ray::new(Vec3::new(0.0, 0.5, 0.0), Vec3::Y);
        assert_eq!(integrator.trace_path(up, &mut rng), Vec3::splat(2.0));
        assert_eq!(integrator.trace_direct(up, &mut rng), Vec3::splat(2.0));

        // The light's back face is dark
        let from_above = Ray::new(Vec3::new(0.0, 2.0, 0.0), Vec3::NEG_Y);
        assert_eq!(integrator.trace_path(from_above, &mut rng), Vec3::ZERO);
    }

    #[test]
    fn test_miss_returns_sky() {
        let mut scene = scenes::parallel_quads(Vec3::ONE, Vec3::ONE).unwrap();
        scene.sky = Sky::Solid {
            rgb: [0.1, 0.2, 0.3],
        };
        let bvh = SceneBvh::new(&scene);
        let integrator = Integrator::new(&scene, &bvh, 8);
        let sideways = Ray::new(Vec3::new(0.0, 0.5, 0.0), Vec3::X);
        let l = integrator.trace_path(sideways, &mut Rng::from_state(4));
        assert_eq!(l, Vec3::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn test_zero_depth_is_black() {
        let scene = scenes::parallel_quads(Vec3::ONE, Vec3::ONE).unwrap();
        let bvh = SceneBvh::new(&scene);
        let integrator = Integrator::new(&scene, &bvh, 0);
        let up = Ray::new(Vec3::new(0.0, 0.5, 0.0), Vec3::Y);
        assert_eq!(integrator.trace_path(up, &mut Rng::from_state(0)), Vec3::ZERO);
    }

    #[test]
    fn test_closed_box_creates_no_energy() {
        let emit = 1.0;
        let scene = scenes::closed_box(Vec3::ONE, Vec3::splat(emit)).unwrap();
        let bvh = SceneBvh::new(&scene);
        let integrator = Integrator::new(&scene, &bvh, 8);

        let mut camera = scene.camera.clone();
        camera.update_image_size(8, 8);
        let mut sum = 0.0f64;
        let mut count = 0u32;
        for y in 0..8 {
            for x in 0..8 {
                for s in 0..64 {
                    let mut rng = Rng::from_state((y * 8 + x) * 64 + s);
                    let screen = (lumen_math::Vec2::new(x as f32, y as f32) + 0.5) / 8.0;
                    let ray = camera.ray(screen, lumen_math::Vec2::ZERO);
                    let l = integrator.trace_path(ray, &mut rng);
                    assert!(l.is_finite());
                    sum += l.x as f64;
                    count += 1;
                }
            }
        }
        let mean = sum / count as f64;
        assert!(mean > 0.0);
        assert!(mean <= 1.05 * emit as f64, "mean radiance {mean}");
    }

    #[test]
    fn test_light_samples_stop_at_a_nearby_blocker() {
        // The gap under the blocker is far smaller than a thousandth of the
        // distance to the light
        let scene = shadowed_floor(0.05, 30.0, 100.0);
        let bvh = SceneBvh::new(&scene);
        let integrator = Integrator::new(&scene, &bvh, 2);
        let ray = Ray::new(Vec3::new(0.0, 0.025, 0.0), Vec3::NEG_Y);

        let path = mean_radiance(&integrator, IntegratorMode::Path, ray, 5_000, 5);
        assert_eq!(path, Vec3::ZERO);
        let direct = mean_radiance(&integrator, IntegratorMode::DirectLighting, ray, 5_000, 6);
        assert_eq!(direct, Vec3::ZERO);
    }

    #[test]
    fn test_distant_light_behind_blocker() {
        let scene = shadowed_floor(0.01, 0.6, 20.0);
        let bvh = SceneBvh::new(&scene);
        let integrator = Integrator::new(&scene, &bvh, 2);

        // Straight under the blocker every path to the light is cut off
        let shadowed = Ray::new(Vec3::new(0.0, 0.005, 0.0), Vec3::NEG_Y);
        for mode in [IntegratorMode::Path, IntegratorMode::DirectLighting] {
            assert_eq!(mean_radiance(&integrator, mode, shadowed, 5_000, 7), Vec3::ZERO);
        }

        // Out in the open both estimators see the same light
        let open = Ray::new(Vec3::new(5.0, 1.0, 0.0), Vec3::NEG_Y);
        let path = mean_radiance(&integrator, IntegratorMode::Path, open, 20_000, 8);
        let direct = mean_radiance(&integrator, IntegratorMode::DirectLighting, open, 20_000, 9);
        assert!(direct.x > 0.0);
        assert!((path.x - direct.x).abs() < 0.05 * direct.x, "path {path:?} direct {direct:?}");
    }
}
