//! Pixel buffers crossing the registration boundary.

use std::fmt;

use glam::DVec2;
use rayon::prelude::*;

use crate::common::Buffer2;
use crate::error::{RegistrationError, Result};

/// Rec. 601 luminance weights for channels in R, G, B order.
const LUMINANCE_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// Width and height of a frame in pixels. Both are always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameSize {
    pub width: usize,
    pub height: usize,
}

impl FrameSize {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RegistrationError::InvalidFrameSize { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    pub fn max_dimension(&self) -> usize {
        self.width.max(self.height)
    }

    /// Rotation centre used by every warp: `(width / 2, height / 2)`.
    pub fn center(&self) -> DVec2 {
        DVec2::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Which intensity plane of a (possibly multi-channel) image is analysed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelSelection {
    /// Reduce all channels to luminance.
    #[default]
    Luminance,
    /// Use one channel as-is.
    Channel(usize),
}

impl ChannelSelection {
    /// Host-style channel index: any negative value means luminance.
    pub fn from_index(index: i64) -> Self {
        if index < 0 {
            Self::Luminance
        } else {
            Self::Channel(index as usize)
        }
    }
}

/// Interleaved multi-channel f32 image.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: usize,
    height: usize,
    channels: usize,
    pixels: Vec<f32>,
}

impl Image {
    /// Create an image from interleaved pixel data.
    ///
    /// # Panics
    /// Panics if any dimension is zero or the buffer length does not equal
    /// `width * height * channels`.
    pub fn new(width: usize, height: usize, channels: usize, pixels: Vec<f32>) -> Self {
        assert!(width > 0, "Width must be positive");
        assert!(height > 0, "Height must be positive");
        assert!(channels > 0, "Channels must be positive");
        assert_eq!(
            pixels.len(),
            width * height * channels,
            "pixels length must equal width * height * channels"
        );
        Self {
            width,
            height,
            channels,
            pixels,
        }
    }

    /// Single-channel image taking ownership of a plane.
    pub fn from_gray(plane: Buffer2<f32>) -> Self {
        let (width, height) = (plane.width(), plane.height());
        Self::new(width, height, 1, plane.into_pixels())
    }

    /// Interleave equally sized planes into one image.
    pub fn from_planes(planes: &[Buffer2<f32>]) -> Self {
        assert!(!planes.is_empty(), "At least one plane is required");
        let width = planes[0].width();
        let height = planes[0].height();
        assert!(
            planes
                .iter()
                .all(|p| p.width() == width && p.height() == height),
            "All planes must have the same size"
        );

        let channels = planes.len();
        let mut pixels = vec![0.0f32; width * height * channels];
        pixels
            .par_chunks_mut(channels)
            .enumerate()
            .for_each(|(idx, px)| {
                for (c, value) in px.iter_mut().enumerate() {
                    *value = planes[c][idx];
                }
            });

        Self::new(width, height, channels, pixels)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    #[inline]
    pub fn pixels(&self) -> &[f32] {
        &self.pixels
    }

    pub fn size(&self) -> FrameSize {
        FrameSize {
            width: self.width,
            height: self.height,
        }
    }

    /// Copy one channel out into its own plane.
    pub fn channel(&self, channel: usize) -> Result<Buffer2<f32>> {
        if channel >= self.channels {
            return Err(RegistrationError::ChannelOutOfRange {
                channel,
                channels: self.channels,
            });
        }
        if self.channels == 1 {
            return Ok(Buffer2::new(self.width, self.height, self.pixels.clone()));
        }

        let pixels = self
            .pixels
            .par_chunks_exact(self.channels)
            .map(|px| px[channel])
            .collect();
        Ok(Buffer2::new(self.width, self.height, pixels))
    }

    /// Split into one plane per channel.
    pub fn planes(&self) -> Vec<Buffer2<f32>> {
        (0..self.channels)
            .map(|c| {
                let pixels = self.pixels.iter().skip(c).step_by(self.channels).copied();
                Buffer2::new(self.width, self.height, pixels.collect())
            })
            .collect()
    }

    /// Reduce to a single luminance plane.
    ///
    /// Gray and gray+alpha images use their first channel. RGB(A) images use
    /// Rec. 601 weights with channels in R, G, B order; any other layout is
    /// averaged.
    pub fn to_luminance(&self) -> Buffer2<f32> {
        let channels = self.channels;
        let pixels: Vec<f32> = match channels {
            1 => self.pixels.clone(),
            2 => self.pixels.iter().step_by(2).copied().collect(),
            3 | 4 => self
                .pixels
                .par_chunks_exact(channels)
                .map(|px| {
                    LUMINANCE_WEIGHTS[0] * px[0]
                        + LUMINANCE_WEIGHTS[1] * px[1]
                        + LUMINANCE_WEIGHTS[2] * px[2]
                })
                .collect(),
            _ => self
                .pixels
                .par_chunks_exact(channels)
                .map(|px| px.iter().sum::<f32>() / channels as f32)
                .collect(),
        };
        Buffer2::new(self.width, self.height, pixels)
    }

    /// The analysis plane chosen by `selection`.
    pub fn select(&self, selection: ChannelSelection) -> Result<Buffer2<f32>> {
        match selection {
            ChannelSelection::Luminance => Ok(self.to_luminance()),
            ChannelSelection::Channel(channel) => self.channel(channel),
        }
    }
}
