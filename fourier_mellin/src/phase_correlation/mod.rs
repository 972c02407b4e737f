//! Phase correlation on equally sized planes.
//!
//! Phase correlation finds the translation between two planes by:
//! 1. Computing the 2D FFT of both planes
//! 2. Normalizing their cross-power spectrum to unit magnitude
//! 3. Finding the peak of its inverse FFT
//! 4. Optionally refining the peak to sub-bin accuracy
//!
//! The same correlator serves the log-polar stage (where the offset is an
//! angle/log-radius shift) and the spatial stage (where it is a translation).
//! Inputs are used as given: windowing is the caller's job.


use glam::DVec2;
use rustfft::num_complex::Complex;

use crate::common::Buffer2;
use crate::config::SubpixelMethod;
use crate::fft::Fft2d;

/// Outcome of one correlation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correlation {
    /// Shift `d` such that `b(p) ≈ a(p - d)`, wrapped to
    /// `(-size / 2, size / 2]` per axis.
    pub offset: DVec2,
    /// Peak height clamped to `[0, 1]`: ~1 for identical inputs, ~0 for
    /// unrelated ones.
    pub response: f64,
}

/// Phase correlator for one buffer shape.
#[derive(Debug, Clone)]
pub struct PhaseCorrelator {
    fft: Fft2d,
    subpixel_method: SubpixelMethod,
    min_response: f64,
}

impl PhaseCorrelator {
    pub fn new(
        width: usize,
        height: usize,
        subpixel_method: SubpixelMethod,
        min_response: f64,
    ) -> Self {
        Self {
            fft: Fft2d::new(width, height),
            subpixel_method,
            min_response,
        }
    }

    pub fn width(&self) -> usize {
        self.fft.width()
    }

    pub fn height(&self) -> usize {
        self.fft.height()
    }

    /// Estimate the shift that carries `a` onto `b`.
    ///
    /// Never fails: inputs without usable structure yield a zero response.
    /// A peak below `min_response` reports a zero offset with its response.
    pub fn correlate(&self, a: &Buffer2<f32>, b: &Buffer2<f32>) -> Correlation {
        let surface = self.correlation_surface(a, b);
        let (peak_x, peak_y, peak) = find_peak(&surface);

        let response = if peak.is_finite() {
            (peak as f64).clamp(0.0, 1.0)
        } else {
            0.0
        };
        if response < self.min_response {
            return Correlation {
                offset: DVec2::ZERO,
                response,
            };
        }

        let (w, h) = (surface.width(), surface.height());
        let coarse = DVec2::new(wrap_signed(peak_x, w), wrap_signed(peak_y, h));
        let refinement = match self.subpixel_method {
            SubpixelMethod::None => DVec2::ZERO,
            SubpixelMethod::Parabolic => subpixel_parabolic(&surface, peak_x, peak_y),
            SubpixelMethod::Gaussian => subpixel_gaussian(&surface, peak_x, peak_y),
            SubpixelMethod::Centroid => subpixel_centroid(&surface, peak_x, peak_y),
        };

        Correlation {
            offset: coarse + refinement,
            response,
        }
    }

    /// Real part of the inverse FFT of the normalized cross-power spectrum.
    fn correlation_surface(&self, a: &Buffer2<f32>, b: &Buffer2<f32>) -> Buffer2<f32> {
        let fa = self.fft.forward_real(a);
        let mut cross = self.fft.forward_real(b);

        // conj(A) * B puts the peak at +d when b is a shifted by d
        for (c, &a_bin) in cross.pixels_mut().iter_mut().zip(fa.pixels()) {
            let product = a_bin.conj() * *c;
            let magnitude = product.norm();
            *c = if magnitude > 1e-10 {
                product / magnitude
            } else {
                Complex::new(0.0, 0.0)
            };
        }

        self.fft.inverse(&mut cross);
        cross.map(|c| c.re)
    }
}

/// First maximum in row-major order. NaN values never win.
fn find_peak(surface: &Buffer2<f32>) -> (usize, usize, f32) {
    let w = surface.width();
    let mut max_val = f32::NEG_INFINITY;
    let mut max_idx = 0;

    for (idx, &val) in surface.pixels().iter().enumerate() {
        if val > max_val {
            max_val = val;
            max_idx = idx;
        }
    }

    (max_idx % w, max_idx / w, max_val)
}

/// Map a bin index to a signed shift: indices past the midpoint wrap negative.
fn wrap_signed(index: usize, size: usize) -> f64 {
    if index > size / 2 {
        index as f64 - size as f64
    } else {
        index as f64
    }
}

/// Read with periodic wraparound.
fn sample_wrapped(surface: &Buffer2<f32>, x: isize, y: isize) -> f32 {
    let w = surface.width() as isize;
    let h = surface.height() as isize;
    surface[(x.rem_euclid(w) as usize, y.rem_euclid(h) as usize)]
}

/// Vertex of a parabola through three samples, relative to the middle one.
fn parabolic_vertex(left: f64, center: f64, right: f64) -> f64 {
    let denom = 2.0 * (left + right - 2.0 * center);
    if denom.abs() > 1e-10 {
        ((left - right) / denom).clamp(-0.5, 0.5)
    } else {
        0.0
    }
}

/// Sub-bin refinement using a parabolic fit per axis.
fn subpixel_parabolic(surface: &Buffer2<f32>, peak_x: usize, peak_y: usize) -> DVec2 {
    let (px, py) = (peak_x as isize, peak_y as isize);
    let get = |x, y| sample_wrapped(surface, x, y) as f64;

    let c = get(px, py);
    let dx = parabolic_vertex(get(px - 1, py), c, get(px + 1, py));
    let dy = parabolic_vertex(get(px, py - 1), c, get(px, py + 1));
    DVec2::new(dx, dy)
}

/// Sub-bin refinement using a Gaussian fit (parabola on log values).
fn subpixel_gaussian(surface: &Buffer2<f32>, peak_x: usize, peak_y: usize) -> DVec2 {
    let (px, py) = (peak_x as isize, peak_y as isize);
    let get = |x, y| (sample_wrapped(surface, x, y).max(1e-10) as f64).ln();

    let c = get(px, py);
    let dx = parabolic_vertex(get(px - 1, py), c, get(px + 1, py));
    let dy = parabolic_vertex(get(px, py - 1), c, get(px, py + 1));
    DVec2::new(dx, dy)
}

/// Sub-bin refinement using the weighted centroid of the 5x5 neighborhood.
fn subpixel_centroid(surface: &Buffer2<f32>, peak_x: usize, peak_y: usize) -> DVec2 {
    const RADIUS: isize = 2;
    let (px, py) = (peak_x as isize, peak_y as isize);

    let mut sum = DVec2::ZERO;
    let mut sum_w = 0.0f64;
    for oy in -RADIUS..=RADIUS {
        for ox in -RADIUS..=RADIUS {
            let w = sample_wrapped(surface, px + ox, py + oy).max(0.0) as f64;
            sum += DVec2::new(ox as f64, oy as f64) * w;
            sum_w += w;
        }
    }

    if sum_w > 1e-10 {
        sum / sum_w
    } else {
        DVec2::ZERO
    }
}
