//! Two-stage similarity estimation.
//!
//! Rotation and scale come first, from log-polar spectra that are blind to
//! translation. Translation follows, by undoing the rotation and scale on the
//! target and phase-correlating in the spatial domain.

mod rotation_scale;
mod translation;


pub use rotation_scale::{RotationCandidates, RotationScaleEstimator};
pub use translation::TranslationEstimator;

/// Rotation (degrees) and uniform scale hypothesis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationScale {
    pub rotation: f64,
    pub scale: f64,
}

/// Normalize an angle in degrees to `(-180, 180]`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}
