//! Log-polar resampling of a centred magnitude spectrum.
//!
//! In log-polar coordinates a rotation of the image becomes a shift along
//! the angle axis and a uniform scale becomes a shift along the log-radius
//! axis, so both can be recovered with ordinary phase correlation.
//!
//! The output buffer has one row per angle bin and one column per
//! log-radius bin. Angles cover `[0, 180)` degrees only: the magnitude
//! spectrum of a real image is point-symmetric, so the other half carries
//! no extra information.

use std::f64::consts::PI;

use rayon::prelude::*;

use crate::common::Buffer2;
use crate::config::RegistrationConfig;
use crate::image::FrameSize;

/// Bilinear source taps for one log-polar cell.
///
/// Taps falling outside the spectrum keep index 0 with weight 0.
#[derive(Debug, Clone, Copy, Default)]
struct Cell {
    indices: [usize; 4],
    weights: [f32; 4],
}

/// Precomputed log-polar sampling table for one frame size.
#[derive(Debug, Clone)]
pub struct LogPolarTable {
    size: FrameSize,
    angle_bins: usize,
    radius_bins: usize,
    min_radius: f64,
    max_radius: f64,
    log_step: f64,
    cells: Vec<Cell>,
}

impl LogPolarTable {
    /// Build the table for `size`.
    ///
    /// Radii are measured in isotropic frequency units of `max(width, height)`
    /// bins, so rectangular frames see the same angular geometry as square
    /// ones. The radius range stops one bin short of the spectrum border on
    /// the shorter axis and starts at `config.min_radius` to skip the DC
    /// region.
    pub fn build(size: FrameSize, config: &RegistrationConfig) -> Self {
        let n = size.max_dimension();
        let angle_bins = config.angle_bins.unwrap_or(n).max(2);
        let radius_bins = config.radius_bins.unwrap_or(n).max(2);

        let shorter = size.width.min(size.height) as f64;
        let max_radius = (n as f64 / 2.0 - n as f64 / shorter).max(1.0);
        let min_radius = config.min_radius.min(max_radius * 0.5);
        let log_step = (max_radius / min_radius).ln() / (radius_bins - 1) as f64;

        // Integer centre: fft_shift moves DC to (width / 2, height / 2).
        let cx = (size.width / 2) as f64;
        let cy = (size.height / 2) as f64;
        let sx = size.width as f64 / n as f64;
        let sy = size.height as f64 / n as f64;

        let mut cells = Vec::with_capacity(angle_bins * radius_bins);
        for a in 0..angle_bins {
            let angle = a as f64 * PI / angle_bins as f64;
            let (sin, cos) = angle.sin_cos();
            for j in 0..radius_bins {
                let radius = min_radius * (j as f64 * log_step).exp();
                let x = cx + radius * cos * sx;
                let y = cy + radius * sin * sy;
                cells.push(bilinear_cell(size, x, y));
            }
        }

        Self {
            size,
            angle_bins,
            radius_bins,
            min_radius,
            max_radius,
            log_step,
            cells,
        }
    }

    /// Resample a centred spectrum of the table's frame size.
    pub fn remap(&self, spectrum: &Buffer2<f32>) -> Buffer2<f32> {
        assert_eq!(spectrum.width(), self.size.width, "Spectrum width mismatch");
        assert_eq!(spectrum.height(), self.size.height, "Spectrum height mismatch");

        let source = spectrum.pixels();
        let mut output = vec![0.0f32; self.angle_bins * self.radius_bins];
        output
            .par_chunks_mut(self.radius_bins)
            .zip(self.cells.par_chunks(self.radius_bins))
            .for_each(|(row, cells)| {
                for (value, cell) in row.iter_mut().zip(cells) {
                    *value = cell
                        .indices
                        .iter()
                        .zip(cell.weights)
                        .map(|(&idx, w)| source[idx] * w)
                        .sum();
                }
            });

        Buffer2::new(self.radius_bins, self.angle_bins, output)
    }

    pub fn frame_size(&self) -> FrameSize {
        self.size
    }

    /// Rows of the remapped buffer.
    pub fn angle_bins(&self) -> usize {
        self.angle_bins
    }

    /// Columns of the remapped buffer.
    pub fn radius_bins(&self) -> usize {
        self.radius_bins
    }

    pub fn min_radius(&self) -> f64 {
        self.min_radius
    }

    pub fn max_radius(&self) -> f64 {
        self.max_radius
    }

    /// Natural-log radius increment between adjacent radius bins.
    pub fn log_step(&self) -> f64 {
        self.log_step
    }

    /// Degrees represented by a shift of `angle_shift` bins along the angle axis.
    pub fn rotation_from_shift(&self, angle_shift: f64) -> f64 {
        angle_shift * 180.0 / self.angle_bins as f64
    }

    /// Scale factor represented by a shift of `radius_shift` bins along the
    /// log-radius axis. Enlarging an image shrinks its spectrum, hence the
    /// negative exponent.
    pub fn scale_from_shift(&self, radius_shift: f64) -> f64 {
        (-radius_shift * self.log_step).exp()
    }
}

fn bilinear_cell(size: FrameSize, x: f64, y: f64) -> Cell {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = (x - x0) as f32;
    let fy = (y - y0) as f32;

    let taps = [
        (x0, y0, (1.0 - fx) * (1.0 - fy)),
        (x0 + 1.0, y0, fx * (1.0 - fy)),
        (x0, y0 + 1.0, (1.0 - fx) * fy),
        (x0 + 1.0, y0 + 1.0, fx * fy),
    ];

    let mut cell = Cell::default();
    for (k, (tx, ty, w)) in taps.into_iter().enumerate() {
        let inside =
            tx >= 0.0 && ty >= 0.0 && tx < size.width as f64 && ty < size.height as f64;
        if inside {
            cell.indices[k] = ty as usize * size.width + tx as usize;
            cell.weights[k] = w;
        }
    }
    cell
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(width: usize, height: usize) -> LogPolarTable {
        LogPolarTable::build(
            FrameSize::new(width, height).unwrap(),
            &RegistrationConfig::default(),
        )
    }

    #[test]
    fn test_dimensions_follow_largest_side() {
        let t = table(96, 64);
        assert_eq!(t.angle_bins(), 96);
        assert_eq!(t.radius_bins(), 96);

        let spectrum = Buffer2::new_filled(96, 64, 1.0f32);
        let lp = t.remap(&spectrum);
        assert_eq!(lp.width(), 96);
        assert_eq!(lp.height(), 96);
    }

    #[test]
    fn test_configured_bins() {
        let config = RegistrationConfig {
            angle_bins: Some(45),
            radius_bins: Some(30),
            ..Default::default()
        };
        let t = LogPolarTable::build(FrameSize::new(64, 64).unwrap(), &config);
        let lp = t.remap(&Buffer2::new_filled(64, 64, 0.0f32));
        assert_eq!((lp.width(), lp.height()), (30, 45));
    }

    #[test]
    fn test_radius_range_excludes_dc_and_border() {
        let t = table(64, 64);
        assert!((t.min_radius() - 2.0).abs() < 1e-12);
        assert!((t.max_radius() - 31.0).abs() < 1e-12);

        let last = t.min_radius() * (t.log_step() * 63.0).exp();
        assert!((last - t.max_radius()).abs() < 1e-9);
    }

    #[test]
    fn test_constant_spectrum_stays_constant() {
        // Every sample lies inside the spectrum, so bilinear weights sum to one.
        let t = table(48, 40);
        let lp = t.remap(&Buffer2::new_filled(48, 40, 3.0f32));
        for &v in lp.pixels() {
            assert!((v - 3.0).abs() < 1e-4, "value {v}");
        }
    }

    #[test]
    fn test_angle_axis_samples_direction() {
        // Bright horizontal line through the centre: only angle row 0 sees it.
        let mut spectrum = Buffer2::new_filled(64, 64, 0.0f32);
        for x in 0..64 {
            spectrum[(x, 32)] = 1.0;
        }
        let t = table(64, 64);
        let lp = t.remap(&spectrum);

        assert!((lp[(40, 0)] - 1.0).abs() < 1e-5);
        // 90 degrees is row 32 and points straight down
        assert!(lp[(40, 32)].abs() < 1e-5);
    }

    #[test]
    fn test_shift_conversions() {
        let t = table(64, 64);
        assert!((t.rotation_from_shift(32.0) - 90.0).abs() < 1e-12);
        assert!((t.scale_from_shift(0.0) - 1.0).abs() < 1e-12);

        let up = t.scale_from_shift(-1.0);
        assert!((up.ln() - t.log_step()).abs() < 1e-12);
    }

    #[test]
    fn test_tiny_frame_is_well_formed() {
        let t = table(1, 1);
        assert!(t.max_radius() >= 1.0);
        assert!(t.min_radius() > 0.0);
        let lp = t.remap(&Buffer2::new_filled(1, 1, 1.0f32));
        assert!(lp.pixels().iter().all(|v| v.is_finite()));
    }
}
