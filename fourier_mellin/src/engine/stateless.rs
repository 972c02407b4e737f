use std::sync::Arc;

use crate::config::RegistrationConfig;
use crate::error::Result;
use crate::image::{ChannelSelection, Image};
use crate::spectrum::LogPolarSpectrum;
use crate::transform::Transform;

use super::{FrameSetup, Registration};

/// Registers image pairs. Keeps no state between calls, so one instance can
/// serve any number of threads.
#[derive(Debug, Clone)]
pub struct FourierMellin {
    setup: Arc<FrameSetup>,
}

impl FourierMellin {
    /// Engine for `width x height` frames with the default configuration.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        Self::with_config(width, height, RegistrationConfig::default())
    }

    pub fn with_config(width: usize, height: usize, config: RegistrationConfig) -> Result<Self> {
        Ok(Self::from_setup(FrameSetup::new(width, height, config)?))
    }

    pub fn from_setup(setup: Arc<FrameSetup>) -> Self {
        Self { setup }
    }

    pub fn setup(&self) -> &Arc<FrameSetup> {
        &self.setup
    }

    /// Log-polar spectrum of the luminance of `image`.
    pub fn process_image(&self, image: &Image) -> Result<LogPolarSpectrum> {
        self.setup.pipeline().process(image, ChannelSelection::Luminance)
    }

    /// Align `target` to `reference`.
    ///
    /// The returned transform carries the reference onto the target; the
    /// returned image is the target resampled into the reference frame.
    pub fn register(&self, reference: &Image, target: &Image) -> Result<Registration> {
        let transform = self.register_transform_only(reference, target)?;
        Ok(Registration {
            image: self.setup.align(target, &transform),
            transform,
        })
    }

    /// Like [`register`](Self::register) without resampling the target.
    pub fn register_transform_only(&self, reference: &Image, target: &Image) -> Result<Transform> {
        let reference = self.setup.prepare(reference, ChannelSelection::Luminance)?;
        let target = self.setup.prepare(target, ChannelSelection::Luminance)?;
        Ok(self.setup.register_prepared(&reference, &target))
    }

    /// See [`FrameSetup::get_transformed`].
    pub fn get_transformed(&self, image: &Image, transform: &Transform) -> Result<Image> {
        self.setup.get_transformed(image, transform)
    }
}
