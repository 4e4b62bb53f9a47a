//! Progressive rendering: per-pixel sample batches, run in parallel over
//! buckets and folded into a [`FrameAccumulator`] after each batch.

use std::time::Instant;

use lumen_core::{Camera, PixelFilter, RenderSettings, Scene};
use lumen_math::{UVec2, Vec2};
use rayon::prelude::*;

use crate::accumulator::FrameAccumulator;
use crate::bucket::{generate_buckets, render_bucket, Bucket, BucketResult};
use crate::geometry::GeometryOracle;
use crate::integrator::Integrator;
use crate::material::Color;
use crate::rng::Rng;

/// Read-only state shared by every pixel of a render.
pub struct RenderContext<'a> {
    pub scene: &'a Scene,
    pub settings: RenderSettings,
    camera: Camera,
    integrator: Integrator<'a>,
}

impl<'a> RenderContext<'a> {
    /// `settings` are used as given; see [`RenderSettings::enforce_limits`].
    pub fn new(scene: &'a Scene, oracle: &'a dyn GeometryOracle, settings: RenderSettings) -> Self {
        let mut camera = scene.camera.clone();
        camera.update_image_size(settings.width, settings.height);
        Self {
            scene,
            integrator: Integrator::new(scene, oracle, settings.max_ray_depth),
            settings,
            camera,
        }
    }

    pub fn resolution(&self) -> UVec2 {
        UVec2::new(self.settings.width, self.settings.height)
    }

    /// Sub-pixel offset in `[-0.5, 0.5)^2` (unbounded for the Gaussian).
    fn pixel_offset(&self, rng: &mut Rng, si: u32, sj: u32, recip: f32) -> Vec2 {
        match self.settings.pixel_filter {
            PixelFilter::Box => rng.sample_square_stratified(si, sj, recip),
            PixelFilter::Gaussian { sigma } => {
                let centre = (Vec2::new(si as f32, sj as f32) + 0.5) * recip - 0.5;
                centre + sigma * rng.box_muller()
            }
        }
    }
}

/// Mean radiance of one batch of stratified samples through `pixel`.
///
/// Only `floor(sqrt(spp))^2` samples are taken. The result depends on
/// nothing but the scene, the settings, `pixel` and `batch`.
pub fn render_sample_batch(ctx: &RenderContext, pixel: UVec2, batch: u32) -> Color {
    let resolution = ctx.resolution();
    let mut rng = Rng::seed(batch, pixel, resolution);

    let strata = ctx.settings.strata_per_axis();
    let recip = 1.0 / strata as f32;
    let aperture_open = ctx.camera.aperture_size > 0.0;

    let samples = (0..strata)
        .flat_map(|sj| (0..strata).map(move |si| (si, sj)))
        .map(|(si, sj)| {
            let offset = ctx.pixel_offset(&mut rng, si, sj, recip);
            let screen = (pixel.as_vec2() + 0.5 + offset) / resolution.as_vec2();
            let lens = if aperture_open {
                rng.concentric_disk()
            } else {
                Vec2::ZERO
            };

            let ray = ctx.camera.ray(screen, lens);
            ctx.integrator.radiance(ctx.settings.integrator, ray, &mut rng)
        });
    finite_mean(samples)
}

/// Mean over the finite samples only; a NaN or inf would poison every
/// later batch. Black when nothing finite is left.
fn finite_mean(samples: impl IntoIterator<Item = Color>) -> Color {
    let (sum, count) = samples
        .into_iter()
        .filter(|radiance| radiance.is_finite())
        .fold((Color::ZERO, 0u32), |(sum, count), radiance| {
            (sum + radiance, count + 1)
        });
    if count == 0 {
        Color::ZERO
    } else {
        sum / count as f32
    }
}

/// A progressive render session.
///
/// Each call to [`Renderer::render_next_batch`] renders one full batch over
/// all buckets in parallel, waits for every bucket, then blends.
pub struct Renderer<'a> {
    ctx: RenderContext<'a>,
    buckets: Vec<Bucket>,
    frame: FrameAccumulator,
}

impl<'a> Renderer<'a> {
    pub fn new(
        scene: &'a Scene,
        oracle: &'a dyn GeometryOracle,
        mut settings: RenderSettings,
    ) -> Self {
        settings.enforce_limits();
        let buckets = generate_buckets(settings.width, settings.height, settings.bucket_size);
        let frame = FrameAccumulator::new(settings.width, settings.height);

        log::info!(
            "Rendering '{}' at {}x{}: {} batches of {} spp, depth {}, {} buckets",
            scene.name,
            settings.width,
            settings.height,
            settings.sample_batches,
            settings.effective_samples_per_pixel(),
            settings.max_ray_depth,
            buckets.len()
        );
        if settings.effective_samples_per_pixel() != settings.samples_per_pixel {
            log::warn!(
                "samples_per_pixel {} is not a square, taking {}",
                settings.samples_per_pixel,
                settings.effective_samples_per_pixel()
            );
        }

        Self {
            ctx: RenderContext::new(scene, oracle, settings),
            buckets,
            frame,
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.ctx.settings
    }

    pub fn frame(&self) -> &FrameAccumulator {
        &self.frame
    }

    pub fn is_complete(&self) -> bool {
        self.frame.batches() >= self.ctx.settings.sample_batches
    }

    /// Render and blend the next batch. Returns its index, or `None` once
    /// every batch is done.
    pub fn render_next_batch(&mut self) -> Option<u32> {
        if self.is_complete() {
            return None;
        }

        let batch = self.frame.batches();
        let start = Instant::now();

        let ctx = &self.ctx;
        let results: Vec<BucketResult> = self
            .buckets
            .par_iter()
            .map(|bucket| BucketResult::new(*bucket, render_bucket(bucket, ctx, batch)))
            .collect();

        let width = self.ctx.settings.width;
        let mut image = vec![Color::ZERO; self.frame.pixels().len()];
        for result in &results {
            result.write_into(&mut image, width);
        }
        self.frame.blend(&image);

        log::info!(
            "Batch {}/{} finished in {:.2?}",
            batch + 1,
            self.ctx.settings.sample_batches,
            start.elapsed()
        );
        Some(batch)
    }

    /// Render every remaining batch.
    pub fn render(&mut self) -> &FrameAccumulator {
        let start = Instant::now();
        while self.render_next_batch().is_some() {}
        log::info!("Render complete in {:.2?}", start.elapsed());
        &self.frame
    }

    /// Drop the accumulated image and start again from batch zero.
    pub fn restart(&mut self) {
        self.frame.reset();
    }
}
