//! Lumen Renderer - Monte Carlo light transport over [`lumen_core`] scenes.
//!
//! The pieces, bottom-up:
//!
//! - [`Rng`]: per-sample PCG hash stream, seeded from batch and pixel
//! - [`GeometryOracle`]: nearest-hit and shadow queries, with [`SceneBvh`]
//!   as the CPU implementation
//! - [`PropertyResolver`] and [`MaterialModel`]: textures and scattering
//! - [`LightSampler`] and [`MixturePdf`]: light sampling mixed 50/50 with
//!   the material's own lobe
//! - [`Integrator`]: the bounce loop
//! - [`Renderer`] and [`FrameAccumulator`]: parallel batches and the
//!   running mean across them

pub mod accumulator;
pub mod bucket;
pub mod bvh;
pub mod geometry;
pub mod integrator;
pub mod light_sampler;
pub mod material;
pub mod mis;
pub mod oracle;
pub mod renderer;
pub mod resolver;
pub mod rng;

pub use accumulator::{blend_batch, color_to_rgba, linear_to_gamma, FrameAccumulator};
pub use bvh::MeshBvh;
pub use bucket::{generate_buckets, render_bucket, Bucket, BucketResult};
pub use geometry::{GeometryOracle, HitRecord, RawHit, Trace, T_MAX, T_MIN};
pub use integrator::Integrator;
pub use light_sampler::{LightSample, LightSampler};
pub use material::{
    reflect, reflectance, refract, Color, EmissionRecord, MaterialModel, MaterialPdfKind,
    ScatterRecord,
};
pub use mis::{scattering_pdf, MixturePdf, MixtureValue};
pub use oracle::SceneBvh;
pub use renderer::{render_sample_batch, RenderContext, Renderer};
pub use resolver::PropertyResolver;
pub use rng::Rng;
