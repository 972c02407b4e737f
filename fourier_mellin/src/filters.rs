//! Frequency-domain high-pass filter and spatial apodization window.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::common::Buffer2;
use crate::image::FrameSize;

/// Masks shared by every registration at one frame size.
#[derive(Debug, Clone)]
pub struct FilterSet {
    /// Weights for the centred (fft-shifted) magnitude spectrum: zero at DC,
    /// rising towards one at the Nyquist border.
    pub high_pass: Buffer2<f32>,
    /// Separable Hann window multiplied into the spatial image before the
    /// forward transform.
    pub apodization: Buffer2<f32>,
}

impl FilterSet {
    pub fn build(size: FrameSize) -> Self {
        Self {
            high_pass: high_pass_filter(size),
            apodization: apodization_window(size),
        }
    }

    /// Multiply a plane by the apodization window.
    pub fn apodize(&self, plane: &Buffer2<f32>) -> Buffer2<f32> {
        debug_assert_eq!(plane.width(), self.apodization.width());
        debug_assert_eq!(plane.height(), self.apodization.height());

        let pixels = plane
            .pixels()
            .iter()
            .zip(self.apodization.pixels())
            .map(|(&v, &w)| v * w)
            .collect();
        Buffer2::new(plane.width(), plane.height(), pixels)
    }
}

/// `1 - cos^2(r)` over a `[-pi/2, pi/2]^2` grid centred on the DC bin.
fn high_pass_filter(size: FrameSize) -> Buffer2<f32> {
    let xs = linspace(-FRAC_PI_2, FRAC_PI_2, size.width);
    let ys = linspace(-FRAC_PI_2, FRAC_PI_2, size.height);

    Buffer2::from_fn(size.width, size.height, |x, y| {
        let r = (xs[x] * xs[x] + ys[y] * ys[y]).sqrt();
        let c = r.cos();
        (1.0 - c * c) as f32
    })
}

fn apodization_window(size: FrameSize) -> Buffer2<f32> {
    let wx = hann_window(size.width);
    let wy = hann_window(size.height);
    Buffer2::from_fn(size.width, size.height, |x, y| wx[x] * wy[y])
}

/// Symmetric 1D Hann window, zero at both ends.
pub fn hann_window(size: usize) -> Vec<f32> {
    if size == 1 {
        return vec![1.0];
    }
    (0..size)
        .map(|i| {
            let x = i as f64 / (size - 1) as f64;
            (0.5 * (1.0 - (2.0 * PI * x).cos())) as f32
        })
        .collect()
}

/// `count` evenly spaced values from `min` to `max` inclusive.
fn linspace(min: f64, max: f64, count: usize) -> Vec<f64> {
    if count == 1 {
        return vec![(min + max) / 2.0];
    }
    let step = (max - min) / (count - 1) as f64;
    (0..count).map(|i| min + step * i as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(width: usize, height: usize) -> FrameSize {
        FrameSize::new(width, height).unwrap()
    }

    #[test]
    fn test_hann_window() {
        let window = hann_window(65);
        assert_eq!(window.len(), 65);

        // Zero at the edges, one at the centre
        assert!(window[0] < 1e-6);
        assert!(window[64] < 1e-6);
        assert!((window[32] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_linspace_endpoints() {
        let values = linspace(-1.0, 1.0, 5);
        assert_eq!(values, vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
        assert_eq!(linspace(-1.0, 1.0, 1), vec![0.0]);
    }

    #[test]
    fn test_high_pass_suppresses_center() {
        let filters = FilterSet::build(size(65, 33));
        let hp = &filters.high_pass;

        // Odd sizes put an exact zero on the DC bin
        assert!(hp[(32, 16)].abs() < 1e-6);
        // Edge midpoints sit at radius pi/2 where the filter reaches one
        assert!((hp[(0, 16)] - 1.0).abs() < 1e-4);
        assert!((hp[(32, 0)] - 1.0).abs() < 1e-4);
        // Monotonic along the horizontal axis from the centre outwards
        for x in 33..64 {
            assert!(hp[(x + 1, 16)] >= hp[(x, 16)]);
        }
    }

    #[test]
    fn test_apodization_is_separable_and_tapered() {
        let filters = FilterSet::build(size(31, 21));
        let w = &filters.apodization;

        assert!(w[(0, 10)] < 1e-6);
        assert!(w[(15, 0)] < 1e-6);
        assert!((w[(15, 10)] - 1.0).abs() < 1e-6);

        let wx = hann_window(31);
        let wy = hann_window(21);
        assert!((w[(7, 4)] - wx[7] * wy[4]).abs() < 1e-6);
    }

    #[test]
    fn test_apodize_multiplies_pointwise() {
        let filters = FilterSet::build(size(9, 9));
        let plane = Buffer2::new_filled(9, 9, 2.0f32);
        let apodized = filters.apodize(&plane);
        assert!((apodized[(4, 4)] - 2.0).abs() < 1e-6);
        assert!(apodized[(0, 4)].abs() < 1e-6);
    }
}
