//! Render settings loaded from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hard caps on per-pixel work.
pub const MAX_SAMPLES_PER_PIXEL: u32 = 64;
pub const MAX_SAMPLE_BATCHES: u32 = 32;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to parse settings file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Which light transport estimator to run per sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorMode {
    /// Full path tracing with light/BSDF mixture sampling.
    #[default]
    Path,
    /// One shadow-tested light sample per diffuse hit.
    DirectLighting,
}

/// Sub-pixel jitter distribution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFilter {
    /// Uniform jitter within each stratum.
    #[default]
    Box,
    /// Gaussian jitter around each stratum centre.
    Gaussian { sigma: f32 },
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", default)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    /// Samples per pixel per batch; only `floor(sqrt(n))^2` are taken
    pub samples_per_pixel: u32,
    pub sample_batches: u32,
    pub max_ray_depth: u32,
    pub integrator: IntegratorMode,
    pub pixel_filter: PixelFilter,
    /// Bucket edge length in pixels for parallel scheduling
    pub bucket_size: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            samples_per_pixel: 16,
            sample_batches: 8,
            max_ray_depth: 8,
            integrator: IntegratorMode::Path,
            pixel_filter: PixelFilter::Box,
            bucket_size: 32,
        }
    }
}

impl RenderSettings {
    /// Load settings from a JSON file and clamp them to the supported range.
    pub fn from_json_file(path: impl AsRef<Path>) -> SettingsResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut settings = Self::from_json_str(&text).map_err(|source| SettingsError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        settings.enforce_limits();
        Ok(settings)
    }

    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Clamp sample counts to their caps and raise zeros to one.
    pub fn enforce_limits(&mut self) {
        if self.samples_per_pixel > MAX_SAMPLES_PER_PIXEL {
            log::info!(
                "Samples per pixel {} too high. Limiting to {}.",
                self.samples_per_pixel,
                MAX_SAMPLES_PER_PIXEL
            );
            self.samples_per_pixel = MAX_SAMPLES_PER_PIXEL;
        }
        if self.sample_batches > MAX_SAMPLE_BATCHES {
            log::info!(
                "Sample batches {} too high. Limiting to {}.",
                self.sample_batches,
                MAX_SAMPLE_BATCHES
            );
            self.sample_batches = MAX_SAMPLE_BATCHES;
        }

        for (name, value) in [
            ("width", &mut self.width),
            ("height", &mut self.height),
            ("samples_per_pixel", &mut self.samples_per_pixel),
            ("sample_batches", &mut self.sample_batches),
            ("bucket_size", &mut self.bucket_size),
        ] {
            if *value == 0 {
                log::warn!("{} is zero, using 1", name);
                *value = 1;
            }
        }
    }

    /// Side of the stratification grid, `floor(sqrt(samples_per_pixel))`.
    pub fn strata_per_axis(&self) -> u32 {
        ((self.samples_per_pixel as f64).sqrt().floor() as u32).max(1)
    }

    /// Samples actually taken per pixel per batch.
    pub fn effective_samples_per_pixel(&self) -> u32 {
        let n = self.strata_per_axis();
        n * n
    }
}
