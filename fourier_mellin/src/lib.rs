//! Fourier-Mellin image registration.
//!
//! Recovers the similarity transform (translation, rotation, uniform scale)
//! between two images of the same size:
//! - Rotation and scale come from phase correlation of high-pass filtered
//!   log-polar magnitude spectra, where they appear as plain shifts.
//! - Translation comes from phase correlation of the reference with the
//!   derotated target.
//!
//! Three engines share one set of per-size tables:
//! - [`FourierMellin`]: stateless, both images per call.
//! - [`FourierMellinWithReference`]: stored reference, concurrent and
//!   batched registration.
//! - [`FourierMellinContinuous`]: frame-to-frame registration of a sequence
//!   for stabilization.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use fourier_mellin::{FourierMellin, Image};
//!
//! let engine = FourierMellin::new(width, height)?;
//! let registration = engine.register(&reference, &target)?;
//!
//! println!("{}", registration.transform);
//! // registration.image is the target resampled onto the reference
//! ```

pub(crate) mod common;
pub mod config;
pub mod engine;
pub mod error;
pub mod estimate;
pub mod fft;
pub mod filters;
pub mod image;
pub mod interpolation;
pub mod log_polar;
pub mod phase_correlation;
pub mod spectrum;
pub mod transform;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use common::Buffer2;

// ============================================================================
// Engines
// ============================================================================

pub use engine::{
    ContinuousFrame, FourierMellin, FourierMellinContinuous, FourierMellinWithReference,
    FrameSetup, Registration,
};

// ============================================================================
// Data types and configuration
// ============================================================================

pub use config::{InterpolationMethod, RegistrationConfig, SubpixelMethod};
pub use error::{RegistrationError, Result};
pub use image::{ChannelSelection, FrameSize, Image};
pub use spectrum::LogPolarSpectrum;
pub use transform::Transform;
