//! Error types for registration.

use thiserror::Error;

use crate::image::FrameSize;

/// Errors surfaced by the registration engines.
///
/// Only contract violations are errors. A poor alignment is still returned as a
/// [`Transform`](crate::Transform) with a low `response`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("Invalid frame size {width}x{height}: width and height must be positive")]
    InvalidFrameSize { width: usize, height: usize },

    #[error("No reference frame set; call set_reference first")]
    ReferenceNotSet,

    #[error("Image size mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        expected: FrameSize,
        actual: FrameSize,
    },

    #[error("Image size mismatch for batch element {index}: expected {expected}, got {actual}")]
    BatchShapeMismatch {
        index: usize,
        expected: FrameSize,
        actual: FrameSize,
    },

    #[error("Channel {channel} out of range for image with {channels} channels")]
    ChannelOutOfRange { channel: usize, channels: usize },

    #[error("No reference stored under designation {0}")]
    UnknownDesignation(u32),
}

pub type Result<T> = std::result::Result<T, RegistrationError>;
