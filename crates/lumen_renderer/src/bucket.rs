//! Tile scheduling for parallel batches.
//!
//! The image is cut into square buckets that render independently; within
//! a batch they are handed to rayon, centre first.

use lumen_math::UVec2;

use crate::material::Color;
use crate::renderer::{render_sample_batch, RenderContext};

/// A rectangular region of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// Top-left corner
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Position in render order
    pub index: usize,
}

impl Bucket {
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            index,
        }
    }

    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }

    /// Pixel coordinates covered, row by row.
    pub fn pixels(&self) -> impl Iterator<Item = UVec2> + '_ {
        (0..self.height).flat_map(move |dy| {
            (0..self.width).map(move |dx| UVec2::new(self.x + dx, self.y + dy))
        })
    }
}

/// Cover a `width` x `height` image with buckets, nearest to the centre
/// first.
pub fn generate_buckets(width: u32, height: u32, bucket_size: u32) -> Vec<Bucket> {
    let size = bucket_size.max(1);
    let mut buckets = Vec::new();

    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            let bw = size.min(width - x);
            let bh = size.min(height - y);
            buckets.push(Bucket::new(x, y, bw, bh, buckets.len()));
            x += size;
        }
        y += size;
    }

    sort_spiral(&mut buckets, width, height);
    for (i, bucket) in buckets.iter_mut().enumerate() {
        bucket.index = i;
    }
    buckets
}

fn sort_spiral(buckets: &mut [Bucket], width: u32, height: u32) {
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;
    let distance = |b: &Bucket| {
        let bx = b.x as f32 + b.width as f32 / 2.0;
        let by = b.y as f32 + b.height as f32 / 2.0;
        (bx - center_x).powi(2) + (by - center_y).powi(2)
    };

    buckets.sort_by(|a, b| {
        distance(a)
            .partial_cmp(&distance(b))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// One batch of samples for every pixel of a bucket, row-major.
pub fn render_bucket(bucket: &Bucket, ctx: &RenderContext, batch: u32) -> Vec<Color> {
    bucket
        .pixels()
        .map(|pixel| render_sample_batch(ctx, pixel, batch))
        .collect()
}

/// A finished bucket waiting to be written into the frame.
#[derive(Debug, Clone)]
pub struct BucketResult {
    pub bucket: Bucket,
    pub pixels: Vec<Color>,
}

impl BucketResult {
    pub fn new(bucket: Bucket, pixels: Vec<Color>) -> Self {
        Self { bucket, pixels }
    }

    /// Copy into a full-frame, row-major buffer of the given width.
    pub fn write_into(&self, frame: &mut [Color], frame_width: u32) {
        for (pixel, color) in self.bucket.pixels().zip(&self.pixels) {
            let index = (pixel.y * frame_width + pixel.x) as usize;
            if let Some(slot) = frame.get_mut(index) {
                *slot = *color;
            }
        }
    }
}
