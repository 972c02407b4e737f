//! Deterministic synthetic frames.
//!
//! Frames are fields of anisotropic Gaussian blobs kept near the centre, so
//! moderate rotations, scales and shifts never push content off-frame.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::common::Buffer2;
use crate::image::Image;

/// Parameters for [`blob_field_with`].
#[derive(Debug, Clone)]
pub struct BlobFieldConfig {
    pub width: usize,
    pub height: usize,
    pub num_blobs: usize,
    /// Blob centres stay within this fraction of `min(width, height)` from
    /// the frame centre.
    pub extent: f64,
    pub sigma_range: (f64, f64),
    pub amplitude_range: (f64, f64),
    pub background: f32,
    pub seed: u64,
}

impl Default for BlobFieldConfig {
    fn default() -> Self {
        Self {
            width: 128,
            height: 128,
            num_blobs: 40,
            extent: 0.28,
            sigma_range: (1.0, 2.5),
            amplitude_range: (0.3, 1.0),
            background: 0.0,
            seed: 7,
        }
    }
}

struct Blob {
    x: f64,
    y: f64,
    amplitude: f64,
    // Inverse covariance terms of the rotated Gaussian.
    a: f64,
    b: f64,
    c: f64,
    reach: f64,
}

/// Blob field with default parameters at the given size and seed.
pub fn blob_field(width: usize, height: usize, seed: u64) -> Buffer2<f32> {
    blob_field_with(&BlobFieldConfig {
        width,
        height,
        seed,
        ..Default::default()
    })
}

pub fn blob_field_with(config: &BlobFieldConfig) -> Buffer2<f32> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let cx = config.width as f64 / 2.0;
    let cy = config.height as f64 / 2.0;
    let max_offset = config.extent * config.width.min(config.height) as f64;

    let blobs: Vec<Blob> = (0..config.num_blobs)
        .map(|_| {
            let radius = max_offset * rng.random_range(0.0f64..1.0).sqrt();
            let direction = rng.random_range(0.0..std::f64::consts::TAU);
            let sigma_major = rng.random_range(config.sigma_range.0..=config.sigma_range.1);
            let sigma_minor = rng.random_range(config.sigma_range.0..=sigma_major);
            let orientation = rng.random_range(0.0..std::f64::consts::PI);
            let amplitude = rng.random_range(config.amplitude_range.0..=config.amplitude_range.1);

            let (sin, cos) = orientation.sin_cos();
            let inv_major = 1.0 / (2.0 * sigma_major * sigma_major);
            let inv_minor = 1.0 / (2.0 * sigma_minor * sigma_minor);
            Blob {
                x: cx + radius * direction.cos(),
                y: cy + radius * direction.sin(),
                amplitude,
                a: cos * cos * inv_major + sin * sin * inv_minor,
                b: 2.0 * sin * cos * (inv_major - inv_minor),
                c: sin * sin * inv_major + cos * cos * inv_minor,
                reach: 4.0 * sigma_major,
            }
        })
        .collect();

    Buffer2::from_fn(config.width, config.height, |x, y| {
        let (px, py) = (x as f64, y as f64);
        let sum: f64 = blobs
            .iter()
            .filter(|blob| (px - blob.x).abs() <= blob.reach && (py - blob.y).abs() <= blob.reach)
            .map(|blob| {
                let dx = px - blob.x;
                let dy = py - blob.y;
                blob.amplitude * (-(blob.a * dx * dx + blob.b * dx * dy + blob.c * dy * dy)).exp()
            })
            .sum();
        config.background + sum as f32
    })
}

/// Multi-channel frame whose channels are differently weighted copies of one
/// blob field, so every channel and the luminance share the same geometry.
pub fn blob_image(width: usize, height: usize, channels: usize, seed: u64) -> Image {
    let field = blob_field(width, height, seed);
    let planes: Vec<Buffer2<f32>> = (0..channels)
        .map(|c| {
            let gain = 1.0 - 0.2 * c as f32;
            field.map(|&v| v * gain)
        })
        .collect();
    Image::from_planes(&planes)
}

/// Single-channel blob frame.
pub fn gray_blob_image(width: usize, height: usize, seed: u64) -> Image {
    Image::from_gray(blob_field(width, height, seed))
}
