//! Registration engines.
//!
//! All engines share a [`FrameSetup`]: the immutable per-size tables and
//! correlators. Engines differ only in where the reference comes from:
//!
//! - [`FourierMellin`]: both images per call.
//! - [`FourierMellinWithReference`]: a stored reference snapshot, shared by
//!   concurrent and batched calls.
//! - [`FourierMellinContinuous`]: the previous frame of a sequence.

mod continuous;
mod reference;
mod stateless;


use std::sync::Arc;

pub use continuous::{ContinuousFrame, FourierMellinContinuous};
pub use reference::FourierMellinWithReference;
pub use stateless::FourierMellin;

use crate::common::Buffer2;
use crate::config::RegistrationConfig;
use crate::error::{RegistrationError, Result};
use crate::estimate::{RotationScaleEstimator, TranslationEstimator};
use crate::fft::Fft2d;
use crate::filters::FilterSet;
use crate::image::{ChannelSelection, FrameSize, Image};
use crate::interpolation::warp_image;
use crate::log_polar::LogPolarTable;
use crate::spectrum::{LogPolarSpectrum, SpectrumPipeline};
use crate::transform::Transform;

/// Output of a full registration.
#[derive(Debug, Clone)]
pub struct Registration {
    /// The target resampled into the reference frame.
    pub image: Image,
    /// Carries the reference onto the target.
    pub transform: Transform,
}

/// Everything derived once per frame size and configuration.
///
/// Immutable after construction. Wrap in an `Arc` and hand it to several
/// engines with their `from_setup` constructors to build the tables once.
#[derive(Debug)]
pub struct FrameSetup {
    size: FrameSize,
    config: RegistrationConfig,
    filters: FilterSet,
    log_polar: LogPolarTable,
    fft: Fft2d,
    rotation_scale: RotationScaleEstimator,
    translation: TranslationEstimator,
}

/// Analysis products of one frame, reusable as a reference.
#[derive(Debug, Clone)]
pub(crate) struct PreparedFrame {
    pub gray: Buffer2<f32>,
    pub apodized: Buffer2<f32>,
    pub spectrum: LogPolarSpectrum,
    /// The analysis plane has no variation to correlate.
    pub flat: bool,
}

impl FrameSetup {
    /// # Panics
    /// Panics if `config` fails [`RegistrationConfig::validate`].
    pub fn new(width: usize, height: usize, config: RegistrationConfig) -> Result<Arc<Self>> {
        let size = FrameSize::new(width, height)?;
        config.validate();

        let log_polar = LogPolarTable::build(size, &config);
        tracing::debug!(
            %size,
            angle_bins = log_polar.angle_bins(),
            radius_bins = log_polar.radius_bins(),
            min_radius = log_polar.min_radius(),
            max_radius = log_polar.max_radius(),
            "Built registration tables"
        );

        Ok(Arc::new(Self {
            size,
            filters: FilterSet::build(size),
            fft: Fft2d::new(width, height),
            rotation_scale: RotationScaleEstimator::new(&log_polar, &config),
            translation: TranslationEstimator::new(size, &config),
            log_polar,
            config,
        }))
    }

    pub fn size(&self) -> FrameSize {
        self.size
    }

    pub fn config(&self) -> &RegistrationConfig {
        &self.config
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn log_polar(&self) -> &LogPolarTable {
        &self.log_polar
    }

    pub fn pipeline(&self) -> SpectrumPipeline<'_> {
        SpectrumPipeline::new(&self.filters, &self.log_polar, &self.fft)
    }

    pub(crate) fn check_size(&self, image: &Image) -> Result<()> {
        let actual = image.size();
        if actual != self.size {
            return Err(RegistrationError::ShapeMismatch {
                expected: self.size,
                actual,
            });
        }
        Ok(())
    }

    pub(crate) fn prepare(&self, image: &Image, selection: ChannelSelection) -> Result<PreparedFrame> {
        self.check_size(image)?;
        let gray = image.select(selection)?;
        let apodized = self.filters.apodize(&gray);
        let spectrum = self.pipeline().spectrum_of_apodized(&apodized);
        Ok(PreparedFrame {
            flat: is_flat(&gray),
            gray,
            apodized,
            spectrum,
        })
    }

    /// Transform carrying `reference` onto `target`.
    ///
    /// Both rotation candidates go through the translation stage; the one
    /// with the higher response wins, the primary on ties. A uniform frame on
    /// either side gives the identity with response 0.
    pub(crate) fn register_prepared(
        &self,
        reference: &PreparedFrame,
        target: &PreparedFrame,
    ) -> Transform {
        if reference.flat || target.flat {
            tracing::debug!(
                reference_flat = reference.flat,
                target_flat = target.flat,
                "Uniform frame, nothing to register"
            );
            return Transform::identity().with_response(0.0);
        }

        let candidates =
            self.rotation_scale
                .estimate(&reference.spectrum, &target.spectrum, &self.log_polar);

        let [primary, flipped] = candidates.as_array().map(|hypothesis| {
            self.translation.estimate(
                &reference.apodized,
                &target.gray,
                &self.filters,
                hypothesis,
            )
        });
        tracing::trace!(%primary, %flipped, "Scored rotation candidates");
        let transform = if flipped.response() > primary.response() {
            flipped
        } else {
            primary
        };

        if transform.response() < self.config.min_response {
            tracing::debug!(
                %transform,
                log_polar_response = candidates.response,
                "Low-confidence registration"
            );
        }
        transform
    }

    /// Resample `image` by `transform` about the frame centre: content at
    /// `p` moves to `center + transform(p - center)`. Uncovered pixels are 0.
    pub fn get_transformed(&self, image: &Image, transform: &Transform) -> Result<Image> {
        self.check_size(image)?;
        Ok(warp_image(image, transform, self.config.interpolation))
    }

    /// Bring a target into the reference frame of `transform`.
    pub(crate) fn align(&self, target: &Image, transform: &Transform) -> Image {
        warp_image(target, &transform.inverse(), self.config.interpolation)
    }
}

/// True when the value range is within f32 rounding.
fn is_flat(plane: &Buffer2<f32>) -> bool {
    let (min, max) = plane
        .pixels()
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let magnitude = min.abs().max(max.abs()).max(1.0);
    max - min <= f32::EPSILON * magnitude
}
