//! Rectangular 2D FFT built from `rustfft` row and column passes.

use std::fmt;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::common::Buffer2;

/// Planned forward and inverse 2D transforms for one buffer shape.
///
/// Plans are immutable and shared, so one `Fft2d` can serve any number of
/// threads. Each call allocates its own column scratch.
#[derive(Clone)]
pub struct Fft2d {
    width: usize,
    height: usize,
    row_forward: Arc<dyn Fft<f32>>,
    row_inverse: Arc<dyn Fft<f32>>,
    column_forward: Arc<dyn Fft<f32>>,
    column_inverse: Arc<dyn Fft<f32>>,
}

impl fmt::Debug for Fft2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fft2d")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl Fft2d {
    pub fn new(width: usize, height: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            width,
            height,
            row_forward: planner.plan_fft_forward(width),
            row_inverse: planner.plan_fft_inverse(width),
            column_forward: planner.plan_fft_forward(height),
            column_inverse: planner.plan_fft_inverse(height),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Forward transform of a real plane.
    pub fn forward_real(&self, plane: &Buffer2<f32>) -> Buffer2<Complex<f32>> {
        debug_assert_eq!(plane.width(), self.width);
        debug_assert_eq!(plane.height(), self.height);

        let mut data = plane.map(|&v| Complex::new(v, 0.0));
        self.forward(&mut data);
        data
    }

    /// In-place forward transform.
    pub fn forward(&self, data: &mut Buffer2<Complex<f32>>) {
        self.process(data, &self.row_forward, &self.column_forward);
    }

    /// In-place inverse transform, normalized by `1 / (width * height)`.
    pub fn inverse(&self, data: &mut Buffer2<Complex<f32>>) {
        self.process(data, &self.row_inverse, &self.column_inverse);

        let norm = 1.0 / (self.width * self.height) as f32;
        data.pixels_mut().iter_mut().for_each(|c| *c *= norm);
    }

    fn process(
        &self,
        data: &mut Buffer2<Complex<f32>>,
        row_fft: &Arc<dyn Fft<f32>>,
        column_fft: &Arc<dyn Fft<f32>>,
    ) {
        let (w, h) = (self.width, self.height);
        assert_eq!(data.width(), w, "FFT width mismatch");
        assert_eq!(data.height(), h, "FFT height mismatch");

        // Rows are contiguous.
        for row in data.pixels_mut().chunks_exact_mut(w) {
            row_fft.process(row);
        }

        // Columns go through a gather/scatter scratch buffer.
        let mut column = vec![Complex::new(0.0f32, 0.0); h];
        for x in 0..w {
            for (y, value) in column.iter_mut().enumerate() {
                *value = data[(x, y)];
            }
            column_fft.process(&mut column);
            for (y, value) in column.iter().enumerate() {
                data[(x, y)] = *value;
            }
        }
    }
}

/// Move the zero-frequency bin to `(width / 2, height / 2)`.
pub fn fft_shift<T: Copy + Default>(input: &Buffer2<T>) -> Buffer2<T> {
    let (w, h) = (input.width(), input.height());
    let mut out = Buffer2::new_default(w, h);
    for y in 0..h {
        let sy = (y + h / 2) % h;
        for x in 0..w {
            let sx = (x + w / 2) % w;
            out[(sx, sy)] = input[(x, y)];
        }
    }
    out
}
