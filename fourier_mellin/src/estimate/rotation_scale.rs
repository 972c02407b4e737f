use crate::config::RegistrationConfig;
use crate::log_polar::LogPolarTable;
use crate::phase_correlation::PhaseCorrelator;
use crate::spectrum::LogPolarSpectrum;

use super::{normalize_degrees, RotationScale};

/// Both rotation hypotheses left by a log-polar correlation.
///
/// The magnitude spectrum cannot tell `θ` from `θ + 180°`, so the two
/// candidates share a scale and differ by half a turn. The translation
/// stage decides between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationCandidates {
    /// Rotation in `[-90, 90)`.
    pub primary: RotationScale,
    /// `primary` turned by 180 degrees.
    pub flipped: RotationScale,
    /// Log-polar correlation peak.
    pub response: f64,
}

impl RotationCandidates {
    pub fn new(primary: RotationScale, response: f64) -> Self {
        Self {
            primary,
            flipped: RotationScale {
                rotation: normalize_degrees(primary.rotation + 180.0),
                scale: primary.scale,
            },
            response,
        }
    }

    /// Primary first.
    pub fn as_array(&self) -> [RotationScale; 2] {
        [self.primary, self.flipped]
    }
}

/// Rotation and scale from a pair of log-polar spectra.
#[derive(Debug, Clone)]
pub struct RotationScaleEstimator {
    correlator: PhaseCorrelator,
    max_scale: f64,
}

impl RotationScaleEstimator {
    pub fn new(table: &LogPolarTable, config: &RegistrationConfig) -> Self {
        Self {
            correlator: PhaseCorrelator::new(
                table.radius_bins(),
                table.angle_bins(),
                config.subpixel_method,
                config.min_response,
            ),
            max_scale: config.max_scale,
        }
    }

    /// Rotation and scale carrying the reference onto the target.
    ///
    /// Columns shift with log-scale, rows with angle. A peak below the
    /// minimum response yields the identity hypothesis.
    pub fn estimate(
        &self,
        reference: &LogPolarSpectrum,
        target: &LogPolarSpectrum,
        table: &LogPolarTable,
    ) -> RotationCandidates {
        let correlation = self
            .correlator
            .correlate(reference.as_buffer(), target.as_buffer());

        let rotation = table.rotation_from_shift(correlation.offset.y);
        // The angle axis only spans half a turn
        let rotation = (rotation + 90.0).rem_euclid(180.0) - 90.0;
        let scale = table
            .scale_from_shift(correlation.offset.x)
            .clamp(1.0 / self.max_scale, self.max_scale);

        tracing::trace!(
            rotation,
            scale,
            response = correlation.response,
            "Log-polar correlation"
        );

        RotationCandidates::new(RotationScale { rotation, scale }, correlation.response)
    }
}
