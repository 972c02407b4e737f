use glam::DVec2;

use crate::common::Buffer2;
use crate::config::{InterpolationMethod, RegistrationConfig};
use crate::filters::FilterSet;
use crate::image::FrameSize;
use crate::interpolation::warp_plane;
use crate::phase_correlation::PhaseCorrelator;
use crate::transform::Transform;

use super::RotationScale;

/// Translation under a fixed rotation/scale hypothesis.
#[derive(Debug, Clone)]
pub struct TranslationEstimator {
    correlator: PhaseCorrelator,
    interpolation: InterpolationMethod,
    center: DVec2,
}

impl TranslationEstimator {
    pub fn new(size: FrameSize, config: &RegistrationConfig) -> Self {
        Self {
            correlator: PhaseCorrelator::new(
                size.width,
                size.height,
                config.subpixel_method,
                config.min_response,
            ),
            interpolation: config.interpolation,
            center: size.center(),
        }
    }

    /// Complete the transform for one hypothesis.
    ///
    /// `reference` must already be apodized; `target` is the raw analysis
    /// plane. The target is brought back to the reference's rotation and
    /// scale, apodized and phase-correlated. The correlation peak becomes the
    /// transform's response.
    pub fn estimate(
        &self,
        reference: &Buffer2<f32>,
        target: &Buffer2<f32>,
        filters: &FilterSet,
        hypothesis: RotationScale,
    ) -> Transform {
        let rotation_scale = Transform::rotation_scale(hypothesis.rotation, hypothesis.scale);
        let derotated = warp_plane(
            target,
            &rotation_scale.inverse(),
            self.center,
            self.interpolation,
        );
        let correlation = self
            .correlator
            .correlate(reference, &filters.apodize(&derotated));

        // The shift was measured in the reference frame; carry it through
        // the rotation and scale.
        let offset = rotation_scale.apply(correlation.offset);
        Transform::new(
            offset.x,
            offset.y,
            hypothesis.rotation,
            hypothesis.scale,
            correlation.response,
        )
    }
}
