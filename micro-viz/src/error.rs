use micro_dsp::DspError;
use thiserror::Error;

/// Reasons a [`SpectrumConfig`](crate::config::SpectrumConfig) is rejected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("display needs at least 2 columns, got {0}")]
    TooFewColumns(u16),
    #[error("display height must be at least 1 pixel")]
    ZeroHeight,
    #[error("block size {0} is not a supported power of two (32..=2048 bins)")]
    UnsupportedBlockSize(usize),
    #[error("low bin {low} must be below high bin {high}")]
    EmptyBinRange { low: usize, high: usize },
    #[error("high bin {high} must be below the block size {block_size}")]
    BinOutOfRange { high: usize, block_size: usize },
    #[error("mapping exponent must be finite and positive, got {0}")]
    InvalidExponent(f32),
    #[error("noise floor must be finite and non-negative, got {0}")]
    InvalidNoiseFloor(f32),
    #[error("peak acceleration must be finite and positive, got {0}")]
    InvalidPeakAccel(f32),
    #[error("autolevel floor ratio must be in (0, 1], got {0}")]
    InvalidFloorRatio(f32),
    #[error("column {0} received no spectrum bins")]
    EmptyColumn(usize),
}

/// Failure of one [`FrameDriver::run_frame`](crate::frame_driver::FrameDriver::run_frame)
/// iteration, split by the collaborator that caused it.
#[derive(Debug, Error)]
pub enum FrameError<S, P> {
    #[error("sample source failed: {0}")]
    Capture(#[source] S),
    #[error("frame presenter failed: {0}")]
    Present(#[source] P),
    #[error("spectrum transform failed: {0}")]
    Transform(#[from] DspError),
    #[error("drawing the frame failed")]
    Draw,
}
