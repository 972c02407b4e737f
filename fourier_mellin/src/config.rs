//! Registration configuration.

/// Sub-bin peak refinement used by the phase correlator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubpixelMethod {
    /// No sub-pixel refinement.
    None,
    /// Parabolic fit (fast, ~0.1 pixel accuracy).
    #[default]
    Parabolic,
    /// Gaussian fit on log values.
    Gaussian,
    /// Weighted centroid over a 5x5 neighborhood (robust to noise).
    Centroid,
}

/// Interpolation kernel for warping images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMethod {
    /// Nearest neighbor - fastest, lowest quality
    Nearest,
    /// Bilinear interpolation - fast, reasonable quality
    #[default]
    Bilinear,
    /// Bicubic interpolation (Catmull-Rom) - good quality
    Bicubic,
    /// Lanczos-3 (6x6 kernel) - highest quality
    Lanczos3,
}

/// Registration configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationConfig {
    /// Peak refinement for both the log-polar and the spatial correlation.
    pub subpixel_method: SubpixelMethod,
    /// Kernel for derotation and for the returned resampled images.
    pub interpolation: InterpolationMethod,

    /// Correlation peaks below this value carry no reliable location.
    /// Their offset is reported as zero while the response is kept.
    pub min_response: f64,

    /// Angle bins spanning 0..180 degrees. `None` uses `max(width, height)`.
    pub angle_bins: Option<usize>,
    /// Log-radius bins. `None` uses `max(width, height)`.
    pub radius_bins: Option<usize>,
    /// Innermost log-polar radius in spectrum bins; excludes the DC region.
    pub min_radius: f64,
    /// Recovered scale is clamped to `[1 / max_scale, max_scale]`.
    pub max_scale: f64,

    /// Continuous mode: fraction of the accumulated translation removed on
    /// every frame, so stabilization follows slow pans instead of drifting
    /// off-frame. 0 keeps the full accumulated offset.
    pub pull_to_center: f64,
    /// Continuous mode: fraction cropped from each edge of the stabilized
    /// frame before scaling it back to full size.
    pub edge_crop: f64,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            subpixel_method: SubpixelMethod::Parabolic,
            interpolation: InterpolationMethod::Bilinear,
            min_response: 0.01,
            angle_bins: None,
            radius_bins: None,
            min_radius: 2.0,
            max_scale: 4.0,
            pull_to_center: 0.0,
            edge_crop: 0.0,
        }
    }
}

impl RegistrationConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) {
        assert!(
            (0.0..=1.0).contains(&self.min_response),
            "min_response must be in [0, 1]"
        );
        if let Some(bins) = self.angle_bins {
            assert!(bins >= 2, "angle_bins must be at least 2");
        }
        if let Some(bins) = self.radius_bins {
            assert!(bins >= 2, "radius_bins must be at least 2");
        }
        assert!(self.min_radius > 0.0, "min_radius must be positive");
        assert!(self.max_scale >= 1.0, "max_scale must be >= 1");
        assert!(
            (0.0..=1.0).contains(&self.pull_to_center),
            "pull_to_center must be in [0, 1]"
        );
        assert!(
            (0.0..0.5).contains(&self.edge_crop),
            "edge_crop must be in [0, 0.5)"
        );
    }
}
