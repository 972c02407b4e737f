//! Image to log-polar magnitude spectrum.

use crate::common::Buffer2;
use crate::error::{RegistrationError, Result};
use crate::fft::{fft_shift, Fft2d};
use crate::filters::FilterSet;
use crate::image::{ChannelSelection, Image};
use crate::log_polar::LogPolarTable;

/// High-pass filtered magnitude spectrum in log-polar coordinates.
///
/// Rows are angle bins, columns are log-radius bins. Translation of the
/// source image does not change it; rotation and scale shift it.
#[derive(Debug, Clone, PartialEq)]
pub struct LogPolarSpectrum(Buffer2<f32>);

impl LogPolarSpectrum {
    pub fn as_buffer(&self) -> &Buffer2<f32> {
        &self.0
    }

    pub fn into_buffer(self) -> Buffer2<f32> {
        self.0
    }

    pub fn angle_bins(&self) -> usize {
        self.0.height()
    }

    pub fn radius_bins(&self) -> usize {
        self.0.width()
    }
}

/// Borrowed view of the per-size tables needed to turn frames into spectra.
#[derive(Debug, Clone, Copy)]
pub struct SpectrumPipeline<'a> {
    filters: &'a FilterSet,
    log_polar: &'a LogPolarTable,
    fft: &'a Fft2d,
}

impl<'a> SpectrumPipeline<'a> {
    pub fn new(filters: &'a FilterSet, log_polar: &'a LogPolarTable, fft: &'a Fft2d) -> Self {
        Self {
            filters,
            log_polar,
            fft,
        }
    }

    /// Full pipeline: channel selection, apodization, forward FFT, centred
    /// magnitude, high-pass, log-polar remap.
    pub fn process(&self, image: &Image, selection: ChannelSelection) -> Result<LogPolarSpectrum> {
        let expected = self.log_polar.frame_size();
        let actual = image.size();
        if actual != expected {
            return Err(RegistrationError::ShapeMismatch { expected, actual });
        }

        let plane = image.select(selection)?;
        Ok(self.process_plane(&plane))
    }

    /// Pipeline for an already selected intensity plane of the right size.
    pub fn process_plane(&self, plane: &Buffer2<f32>) -> LogPolarSpectrum {
        let apodized = self.filters.apodize(plane);
        self.spectrum_of_apodized(&apodized)
    }

    /// Tail of the pipeline, for callers that keep the apodized plane around.
    pub fn spectrum_of_apodized(&self, apodized: &Buffer2<f32>) -> LogPolarSpectrum {
        let frequencies = self.fft.forward_real(apodized);
        let mut magnitude = fft_shift(&frequencies.map(|c| c.norm()));

        magnitude
            .pixels_mut()
            .iter_mut()
            .zip(self.filters.high_pass.pixels())
            .for_each(|(m, &h)| *m *= h);

        LogPolarSpectrum(self.log_polar.remap(&magnitude))
    }
}
