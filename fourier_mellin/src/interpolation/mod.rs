//! Resampling of planes and images under a centred similarity transform.
//!
//! # Interpolation Methods
//!
//! - **Lanczos3**: Highest quality, sinc windowed by sinc over a 6x6 footprint.
//! - **Bicubic**: Catmull-Rom cubic, good quality at moderate cost.
//! - **Bilinear**: Fast, linear in both dimensions.
//! - **Nearest**: Fastest, no interpolation.
//!
//! Samples falling outside the source read as 0.

use std::f32::consts::PI;
use std::sync::OnceLock;

use glam::DVec2;
use rayon::prelude::*;

use crate::common::Buffer2;
use crate::config::InterpolationMethod;
use crate::image::Image;
use crate::transform::Transform;

/// Number of rows to process per parallel chunk.
const ROWS_PER_CHUNK: usize = 32;


/// Lanczos window parameter.
const LANCZOS_A: usize = 3;

/// Samples per unit interval in the Lanczos lookup table.
const LANCZOS_LUT_RESOLUTION: usize = 4096;

/// `sinc(x) * sinc(x / a)` for `|x| < a`, else 0.
#[inline]
fn lanczos_kernel_direct(x: f32, a: f32) -> f32 {
    if x.abs() < 1e-6 {
        return 1.0;
    }
    if x.abs() >= a {
        return 0.0;
    }

    let pi_x = PI * x;
    let pi_x_a = pi_x / a;

    (pi_x.sin() / pi_x) * (pi_x_a.sin() / pi_x_a)
}

/// Lanczos3 kernel over `[0, 3]`, symmetric so only `|x|` is stored.
fn lanczos_lut() -> &'static [f32] {
    static LUT: OnceLock<Vec<f32>> = OnceLock::new();
    LUT.get_or_init(|| {
        (0..=LANCZOS_A * LANCZOS_LUT_RESOLUTION)
            .map(|i| {
                let x = i as f32 / LANCZOS_LUT_RESOLUTION as f32;
                lanczos_kernel_direct(x, LANCZOS_A as f32)
            })
            .collect()
    })
}

#[inline]
fn lanczos_kernel(x: f32) -> f32 {
    let abs_x = x.abs();
    if abs_x >= LANCZOS_A as f32 {
        return 0.0;
    }
    let lut = lanczos_lut();
    let idx = (abs_x * LANCZOS_LUT_RESOLUTION as f32 + 0.5) as usize;
    lut[idx.min(lut.len() - 1)]
}

/// Catmull-Rom cubic:
/// W(x) = (a+2)|x|^3 - (a+3)|x|^2 + 1       for |x| <= 1
/// W(x) = a|x|^3 - 5a|x|^2 + 8a|x| - 4a     for 1 < |x| < 2
/// W(x) = 0                                  otherwise
/// with a = -0.5.
#[inline]
fn bicubic_kernel(x: f32) -> f32 {
    const A: f32 = -0.5;

    let abs_x = x.abs();

    if abs_x <= 1.0 {
        ((A + 2.0) * abs_x - (A + 3.0)) * abs_x * abs_x + 1.0
    } else if abs_x < 2.0 {
        ((A * abs_x - 5.0 * A) * abs_x + 8.0 * A) * abs_x - 4.0 * A
    } else {
        0.0
    }
}

#[inline]
fn sample_pixel(data: &Buffer2<f32>, x: i64, y: i64) -> f32 {
    if x < 0 || y < 0 || x >= data.width() as i64 || y >= data.height() as i64 {
        0.0
    } else {
        data[(x as usize, y as usize)]
    }
}

#[inline]
fn interpolate_nearest(data: &Buffer2<f32>, x: f64, y: f64) -> f32 {
    sample_pixel(data, x.round() as i64, y.round() as i64)
}

#[inline]
fn interpolate_bilinear(data: &Buffer2<f32>, x: f64, y: f64) -> f32 {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = (x - x0) as f32;
    let fy = (y - y0) as f32;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let p00 = sample_pixel(data, x0, y0);
    let p10 = sample_pixel(data, x0 + 1, y0);
    let p01 = sample_pixel(data, x0, y0 + 1);
    let p11 = sample_pixel(data, x0 + 1, y0 + 1);

    let top = p00 + fx * (p10 - p00);
    let bottom = p01 + fx * (p11 - p01);

    top + fy * (bottom - top)
}

/// Separable kernel interpolation over a `SIZE x SIZE` footprint starting
/// `SIZE / 2 - 1` pixels before the floor position.
#[inline]
fn interpolate_separable<const SIZE: usize>(
    data: &Buffer2<f32>,
    x: f64,
    y: f64,
    kernel: impl Fn(f32) -> f32,
    normalize: bool,
) -> f32 {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = (x - x0) as f32;
    let fy = (y - y0) as f32;
    let first = SIZE as i64 / 2 - 1;
    let (x0, y0) = (x0 as i64 - first, y0 as i64 - first);

    let mut wx = [0.0f32; SIZE];
    let mut wy = [0.0f32; SIZE];
    for i in 0..SIZE {
        let tap = i as f32 - first as f32;
        wx[i] = kernel(fx - tap);
        wy[i] = kernel(fy - tap);
    }

    if normalize {
        for weights in [&mut wx, &mut wy] {
            let total: f32 = weights.iter().sum();
            if total.abs() > 1e-10 {
                weights.iter_mut().for_each(|w| *w /= total);
            }
        }
    }

    let mut sum = 0.0f32;
    for (j, &wyj) in wy.iter().enumerate() {
        let py = y0 + j as i64;
        for (i, &wxi) in wx.iter().enumerate() {
            sum += sample_pixel(data, x0 + i as i64, py) * wxi * wyj;
        }
    }
    sum
}

/// Interpolate a single pixel at sub-pixel coordinates.
#[inline]
pub fn interpolate_pixel(data: &Buffer2<f32>, x: f64, y: f64, method: InterpolationMethod) -> f32 {
    match method {
        InterpolationMethod::Nearest => interpolate_nearest(data, x, y),
        InterpolationMethod::Bilinear => interpolate_bilinear(data, x, y),
        InterpolationMethod::Bicubic => {
            interpolate_separable::<4>(data, x, y, bicubic_kernel, false)
        }
        InterpolationMethod::Lanczos3 => {
            interpolate_separable::<{ 2 * LANCZOS_A }>(data, x, y, lanczos_kernel, true)
        }
    }
}

/// Resample a plane so that the content at `p` moves to
/// `center + transform(p - center)`.
///
/// Each output pixel `q` reads the input at `center + transform⁻¹(q - center)`.
/// Rows are processed in parallel chunks.
pub fn warp_plane(
    input: &Buffer2<f32>,
    transform: &Transform,
    center: DVec2,
    method: InterpolationMethod,
) -> Buffer2<f32> {
    let width = input.width();
    let height = input.height();
    let inverse = transform.inverse().matrix();

    // Source position advances by the first matrix column per output pixel.
    let step = inverse.x_axis.truncate();

    let mut output = vec![0.0f32; width * height];
    output
        .par_chunks_mut(width * ROWS_PER_CHUNK)
        .enumerate()
        .for_each(|(chunk_idx, chunk)| {
            let start_y = chunk_idx * ROWS_PER_CHUNK;
            for (row_in_chunk, row) in chunk.chunks_exact_mut(width).enumerate() {
                let y = (start_y + row_in_chunk) as f64;
                let row_start = center + inverse.transform_point2(DVec2::new(-center.x, y - center.y));
                for (x, value) in row.iter_mut().enumerate() {
                    let src = row_start + step * x as f64;
                    *value = interpolate_pixel(input, src.x, src.y, method);
                }
            }
        });

    Buffer2::new(width, height, output)
}

/// Resample every channel of an image with [`warp_plane`] about the image
/// centre.
pub fn warp_image(image: &Image, transform: &Transform, method: InterpolationMethod) -> Image {
    let center = image.size().center();
    let planes: Vec<Buffer2<f32>> = image
        .planes()
        .iter()
        .map(|plane| warp_plane(plane, transform, center, method))
        .collect();
    Image::from_planes(&planes)
}
