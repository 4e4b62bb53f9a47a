//! Progressive per-pixel averaging across sample batches, and conversion
//! to display bytes.

use crate::material::Color;

/// Running mean after batch `batch` (zero-based) has produced `new`.
#[inline]
pub fn blend_batch(previous: Color, new: Color, batch: u32) -> Color {
    if batch == 0 {
        new
    } else {
        let b = batch as f32;
        (b * previous + new) / (b + 1.0)
    }
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a linear colour to 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let channel = |c: f32| (255.0 * linear_to_gamma(c).clamp(0.0, 1.0)) as u8;
    [channel(color.x), channel(color.y), channel(color.z), 255]
}

/// Linear radiance estimate per pixel, row-major from the top-left.
#[derive(Clone, Debug)]
pub struct FrameAccumulator {
    pub width: u32,
    pub height: u32,
    pixels: Vec<Color>,
    batches: u32,
}

impl FrameAccumulator {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; (width * height) as usize],
            batches: 0,
        }
    }

    /// Number of batches blended in so far.
    pub fn batches(&self) -> u32 {
        self.batches
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    /// Fold a complete batch into the running mean.
    ///
    /// `batch` must hold one value per pixel. A short batch only updates
    /// the pixels it covers.
    pub fn blend(&mut self, batch: &[Color]) {
        if batch.len() != self.pixels.len() {
            log::warn!(
                "Batch has {} pixels, frame has {}",
                batch.len(),
                self.pixels.len()
            );
        }

        let index = self.batches;
        for (pixel, &new) in self.pixels.iter_mut().zip(batch) {
            *pixel = blend_batch(*pixel, new, index);
        }
        self.batches += 1;
    }

    /// Forget all batches.
    pub fn reset(&mut self) {
        self.pixels.fill(Color::ZERO);
        self.batches = 0;
    }

    /// Gamma-corrected RGBA bytes for display or saving.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for color in &self.pixels {
            bytes.extend_from_slice(&color_to_rgba(*color));
        }
        bytes
    }
}
