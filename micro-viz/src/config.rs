use micro_dsp::is_supported_fft_size;

use crate::error::ConfigError;

// --- Audio Config ---
pub const SAMPLE_RATE_HZ: u32 = 32_000; // Balances audio quality against frame rate
pub const BLOCK_SIZE: usize = 512; // Usable spectrum bins per frame (FFT length is twice this)

// --- Column Mapping ---
pub const LOW_BIN: usize = 50; // Lowest bin drawn on the display
pub const HIGH_BIN: usize = 300; // Highest bin, a little above C7 at 32 kHz
pub const EXPONENT: f32 = 2.5; // Column-to-bin nonlinear mapping
pub const NOISE_FLOOR: f32 = 2.0; // Subtracted from each column to avoid sparkles

// --- Display Config ---
pub const WIDTH: u16 = 32;
pub const HEIGHT: u16 = 32;

// --- Animation ---
pub const PEAK_ACCEL: f32 = 0.15; // Peak dot fall acceleration, display units per frame²
pub const AUTOLEVEL_FLOOR_RATIO: f32 = 1.0 / 8.0; // Autolevel never drops below height / 8

/// Tuning and geometry of the spectrum display. Fixed for the lifetime of a
/// [`FrameDriver`](crate::frame_driver::FrameDriver).
///
/// The bin range and exponent are calibration data for a given sample rate and
/// block size, not values derived from first principles.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumConfig {
    pub sample_rate: u32,
    /// Number of usable bins N. One capture block holds `2 * N` samples.
    pub block_size: usize,
    pub low_bin: usize,
    pub high_bin: usize,
    pub exponent: f32,
    pub noise_floor: f32,
    /// Number of display columns.
    pub width: u16,
    /// Display height in pixels; bar heights and peaks live in `0..=height`.
    pub height: u16,
    pub peak_accel: f32,
    pub autolevel_floor_ratio: f32,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE_HZ,
            block_size: BLOCK_SIZE,
            low_bin: LOW_BIN,
            high_bin: HIGH_BIN,
            exponent: EXPONENT,
            noise_floor: NOISE_FLOOR,
            width: WIDTH,
            height: HEIGHT,
            peak_accel: PEAK_ACCEL,
            autolevel_floor_ratio: AUTOLEVEL_FLOOR_RATIO,
        }
    }
}

impl SpectrumConfig {
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_bin_range(mut self, low_bin: usize, high_bin: usize) -> Self {
        self.low_bin = low_bin;
        self.high_bin = high_bin;
        self
    }

    pub fn with_exponent(mut self, exponent: f32) -> Self {
        self.exponent = exponent;
        self
    }

    pub fn with_noise_floor(mut self, noise_floor: f32) -> Self {
        self.noise_floor = noise_floor;
        self
    }

    pub fn with_display(mut self, width: u16, height: u16) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_peak_accel(mut self, peak_accel: f32) -> Self {
        self.peak_accel = peak_accel;
        self
    }

    pub fn with_autolevel_floor_ratio(mut self, ratio: f32) -> Self {
        self.autolevel_floor_ratio = ratio;
        self
    }

    /// Samples consumed per frame.
    pub fn fft_size(&self) -> usize {
        self.block_size * 2
    }

    pub fn columns(&self) -> usize {
        self.width as usize
    }

    pub fn display_height(&self) -> f32 {
        self.height as f32
    }

    /// Lowest value the per-column autolevel may take.
    pub fn autolevel_floor(&self) -> f32 {
        self.display_height() * self.autolevel_floor_ratio
    }

    /// Wall-clock length of one capture block in microseconds.
    pub fn block_period_us(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.fft_size() as u64 * 1_000_000 / self.sample_rate as u64
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < 2 {
            return Err(ConfigError::TooFewColumns(self.width));
        }
        if self.height == 0 {
            return Err(ConfigError::ZeroHeight);
        }
        if self.block_size == 0 || !is_supported_fft_size(self.fft_size()) {
            return Err(ConfigError::UnsupportedBlockSize(self.block_size));
        }
        if self.low_bin >= self.high_bin {
            return Err(ConfigError::EmptyBinRange {
                low: self.low_bin,
                high: self.high_bin,
            });
        }
        if self.high_bin >= self.block_size {
            return Err(ConfigError::BinOutOfRange {
                high: self.high_bin,
                block_size: self.block_size,
            });
        }
        if !self.exponent.is_finite() || self.exponent <= 0.0 {
            return Err(ConfigError::InvalidExponent(self.exponent));
        }
        if !self.noise_floor.is_finite() || self.noise_floor < 0.0 {
            return Err(ConfigError::InvalidNoiseFloor(self.noise_floor));
        }
        if !self.peak_accel.is_finite() || self.peak_accel <= 0.0 {
            return Err(ConfigError::InvalidPeakAccel(self.peak_accel));
        }
        if !(self.autolevel_floor_ratio > 0.0 && self.autolevel_floor_ratio <= 1.0) {
            return Err(ConfigError::InvalidFloorRatio(self.autolevel_floor_ratio));
        }
        Ok(())
    }
}
