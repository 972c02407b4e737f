use std::sync::Arc;

use crate::config::RegistrationConfig;
use crate::error::Result;
use crate::image::{ChannelSelection, Image};
use crate::interpolation::warp_image;
use crate::transform::Transform;

use super::{FrameSetup, PreparedFrame};

/// Outcome of one [`FourierMellinContinuous::register`] call.
#[derive(Debug, Clone)]
pub enum ContinuousFrame {
    /// First frame of a sequence. It became the reference; nothing was
    /// registered.
    ReferenceInitialized,
    /// Frame registered against its predecessor.
    Registered {
        /// The frame resampled into the coordinates of the first frame.
        image: Image,
        /// Carries the previous frame onto this one.
        step: Transform,
        /// Carries the first frame onto this one, after `pull_to_center`.
        accumulated: Transform,
    },
}

impl ContinuousFrame {
    /// Per-step transform; identity for the first frame.
    pub fn step(&self) -> Transform {
        match self {
            Self::ReferenceInitialized => Transform::identity(),
            Self::Registered { step, .. } => *step,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Self::ReferenceInitialized)
    }
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Uninitialized,
    Running {
        previous: PreparedFrame,
        accumulated: Transform,
    },
}

/// Registers each frame of a sequence against the one before it and keeps
/// the running composition, for video stabilization.
///
/// Frames must arrive in order through `&mut self`; one engine tracks one
/// sequence.
#[derive(Debug)]
pub struct FourierMellinContinuous {
    setup: Arc<FrameSetup>,
    state: State,
}

impl FourierMellinContinuous {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        Self::with_config(width, height, RegistrationConfig::default())
    }

    pub fn with_config(width: usize, height: usize, config: RegistrationConfig) -> Result<Self> {
        Ok(Self::from_setup(FrameSetup::new(width, height, config)?))
    }

    pub fn from_setup(setup: Arc<FrameSetup>) -> Self {
        Self {
            setup,
            state: State::Uninitialized,
        }
    }

    pub fn setup(&self) -> &Arc<FrameSetup> {
        &self.setup
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, State::Running { .. })
    }

    /// Transform from the first frame to the latest one; identity before the
    /// second frame.
    pub fn accumulated(&self) -> Transform {
        match &self.state {
            State::Uninitialized => Transform::identity(),
            State::Running { accumulated, .. } => *accumulated,
        }
    }

    /// Forget the sequence. The next frame starts a new one.
    pub fn reset(&mut self) {
        self.state = State::Uninitialized;
    }

    /// Register the next frame of the sequence.
    ///
    /// A frame of the wrong size is rejected and leaves the state untouched.
    pub fn register(&mut self, frame: &Image) -> Result<ContinuousFrame> {
        let current = self.setup.prepare(frame, ChannelSelection::Luminance)?;

        match std::mem::take(&mut self.state) {
            State::Uninitialized => {
                tracing::debug!(size = %self.setup.size(), "Continuous reference initialized");
                self.state = State::Running {
                    previous: current,
                    accumulated: Transform::identity(),
                };
                Ok(ContinuousFrame::ReferenceInitialized)
            }
            State::Running {
                previous,
                accumulated,
            } => {
                let step = self.setup.register_prepared(&previous, &current);
                let accumulated = self.pull_to_center(accumulated.then(&step));
                tracing::trace!(%step, %accumulated, "Continuous step");

                let image = self.stabilize(frame, &accumulated);
                self.state = State::Running {
                    previous: current,
                    accumulated,
                };
                Ok(ContinuousFrame::Registered {
                    image,
                    step,
                    accumulated,
                })
            }
        }
    }

    /// See [`FrameSetup::get_transformed`].
    pub fn get_transformed(&self, image: &Image, transform: &Transform) -> Result<Image> {
        self.setup.get_transformed(image, transform)
    }

    fn pull_to_center(&self, accumulated: Transform) -> Transform {
        let keep = 1.0 - self.setup.config().pull_to_center;
        Transform::new(
            accumulated.x() * keep,
            accumulated.y() * keep,
            accumulated.rotation(),
            accumulated.scale(),
            accumulated.response(),
        )
    }

    /// Undo the accumulated motion, then zoom in to hide the `edge_crop`
    /// border.
    fn stabilize(&self, frame: &Image, accumulated: &Transform) -> Image {
        let edge_crop = self.setup.config().edge_crop;
        let mut correction = accumulated.inverse();
        if edge_crop > 0.0 {
            correction += Transform::rotation_scale(0.0, 1.0 / (1.0 - 2.0 * edge_crop));
        }
        warp_image(frame, &correction, self.setup.config().interpolation)
    }
}
