#![no_std]
extern crate alloc;

use alloc::{vec, vec::Vec};
use microfft::Complex32;
#[allow(unused_imports)]
use micromath::F32Ext;
use thiserror::Error;

/// Smallest real FFT length the analyzer accepts.
pub const MIN_FFT_SIZE: usize = 64;
/// Largest real FFT length the analyzer accepts.
pub const MAX_FFT_SIZE: usize = 4096;

/// Shaping exponent applied to the bin power. Sits between a square root and a
/// cube root of the magnitude, which reads well on a coarse LED grid.
pub const MAGNITUDE_EXPONENT: f32 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DspError {
    #[error("unsupported FFT size {0}: expected a power of two between 64 and 4096")]
    UnsupportedSize(usize),
    #[error("expected {expected} samples, got {actual}")]
    SampleCount { expected: usize, actual: usize },
    #[error("magnitude buffer holds {actual} bins, need {expected}")]
    OutputLength { expected: usize, actual: usize },
}

/// Returns true when `size` can be handed to [`SpectrumAnalyzer::new`].
pub fn is_supported_fft_size(size: usize) -> bool {
    size.is_power_of_two() && (MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&size)
}

/// Perceptual magnitude of one FFT output: `(re² + im²)^0.4`.
pub fn perceptual_magnitude(bin: Complex32) -> f32 {
    let power = bin.re * bin.re + bin.im * bin.im;
    if power > 0.0 {
        power.powf(MAGNITUDE_EXPONENT)
    } else {
        0.0
    }
}

/// Runs the real FFT in place, dispatching on the buffer length.
/// The returned slice holds `buffer.len() / 2` bins.
pub fn real_fft(buffer: &mut [f32]) -> Result<&mut [Complex32], DspError> {
    macro_rules! dispatch {
        ($($size:literal => $rfft:ident),* $(,)?) => {
            match buffer.len() {
                $(
                    $size => {
                        let input: &mut [f32; $size] = buffer
                            .try_into()
                            .map_err(|_| DspError::UnsupportedSize($size))?;
                        Ok(&mut microfft::real::$rfft(input)[..])
                    }
                )*
                other => Err(DspError::UnsupportedSize(other)),
            }
        };
    }

    dispatch!(
        64 => rfft_64,
        128 => rfft_128,
        256 => rfft_256,
        512 => rfft_512,
        1024 => rfft_1024,
        2048 => rfft_2048,
        4096 => rfft_4096,
    )
}

/// Turns blocks of signed 16-bit samples into perceptual bin magnitudes.
///
/// A block of `fft_size` samples produces `fft_size / 2` bins. Samples keep their
/// raw 16-bit scale and the transform is scaled by `1/sqrt(fft_size)`, so the bin
/// values stay in the range the column tuning constants were chosen for.
pub struct SpectrumAnalyzer {
    buffer: Vec<f32>,
    scale: f32,
}

impl SpectrumAnalyzer {
    pub fn new(fft_size: usize) -> Result<Self, DspError> {
        if !is_supported_fft_size(fft_size) {
            return Err(DspError::UnsupportedSize(fft_size));
        }
        Ok(Self {
            buffer: vec![0.0; fft_size],
            scale: 1.0 / (fft_size as f32).sqrt(),
        })
    }

    pub fn fft_size(&self) -> usize {
        self.buffer.len()
    }

    pub fn bin_count(&self) -> usize {
        self.buffer.len() / 2
    }

    /// Transforms one block and writes `bin_count()` magnitudes into `magnitudes`.
    pub fn analyze(&mut self, samples: &[i16], magnitudes: &mut [f32]) -> Result<(), DspError> {
        if samples.len() != self.fft_size() {
            return Err(DspError::SampleCount {
                expected: self.fft_size(),
                actual: samples.len(),
            });
        }
        if magnitudes.len() < self.bin_count() {
            return Err(DspError::OutputLength {
                expected: self.bin_count(),
                actual: magnitudes.len(),
            });
        }

        let scale = self.scale;
        for (slot, &sample) in self.buffer.iter_mut().zip(samples) {
            *slot = sample as f32 * scale;
        }

        let spectrum = real_fft(&mut self.buffer)?;
        // microfft packs the Nyquist term into the imaginary part of the DC bin.
        spectrum[0].im = 0.0;

        for (magnitude, &bin) in magnitudes.iter_mut().zip(spectrum.iter()) {
            *magnitude = perceptual_magnitude(bin);
        }
        Ok(())
    }
}
