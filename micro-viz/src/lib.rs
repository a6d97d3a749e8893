#![no_std]
//! Turns blocks of audio samples into animated spectrum bars for small LED
//! matrices: one column per display pixel, each with a bar and a falling peak dot.
//!
//! [`FrameDriver`] owns the whole per-frame pipeline. Capture and display are
//! supplied by the caller through [`SampleSource`] and [`FramePresenter`].

extern crate alloc;

pub mod auto_level;
pub mod color_strategy;
pub mod column_mapper;
pub mod config;
pub mod curves;
pub mod error;
pub mod frame_driver;
pub mod peak_tracker;
pub mod renderer;
pub mod spectrum_reducer;
pub mod temporal_filter;

pub use color_strategy::{ColorStrategy, ColorWheel, HueSweep};
pub use column_mapper::{BinWeight, ColumnMap};
pub use config::SpectrumConfig;
pub use error::{ConfigError, FrameError};
pub use frame_driver::{BlockStatus, ColumnFrame, FrameDriver, FramePresenter, SampleSource};
pub use renderer::{BarGraphRenderer, Renderer};

pub use micro_dsp::DspError;
