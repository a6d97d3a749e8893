use alloc::{vec, vec::Vec};

use embedded_graphics::{draw_target::DrawTarget, pixelcolor::Rgb888, prelude::*};
use micro_dsp::{DspError, SpectrumAnalyzer};

use crate::auto_level::AutoLevel;
use crate::color_strategy::{column_colors, ColorStrategy, HueSweep};
use crate::column_mapper::ColumnMap;
use crate::config::SpectrumConfig;
use crate::error::{ConfigError, FrameError};
use crate::peak_tracker::PeakTracker;
use crate::renderer::{BarGraphRenderer, Renderer};
use crate::spectrum_reducer::reduce;
use crate::temporal_filter::TemporalFilter;

/// Frames between throttled debug summaries.
const LOG_INTERVAL: u32 = 200;

/// Everything the renderer needs to draw one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnFrame {
    pub height: f32,
    pub peak: f32,
    pub color: Rgb888,
}

/// Outcome of a capture read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStatus {
    Complete,
    /// The source fell behind and lost `dropped` samples; the block was still
    /// filled as well as it could be.
    Overrun { dropped: usize },
}

/// Supplier of audio blocks. `read_block` fills the whole slice and may block
/// until enough samples have arrived, which is what paces the frame loop.
pub trait SampleSource {
    type Error;

    fn read_block(&mut self, block: &mut [i16]) -> Result<BlockStatus, Self::Error>;
}

/// Receiver of finished frames. The frame is drawn into `canvas()`, then
/// `present` shows it and may block until the display takes the next one.
pub trait FramePresenter {
    type Canvas: DrawTarget<Color = Rgb888>;
    type Error;

    fn canvas(&mut self) -> &mut Self::Canvas;
    fn present(&mut self) -> Result<(), Self::Error>;
}

/// Runs the per-frame pipeline (transform, reduce, auto-level, filter, peak) and
/// owns all mutable column state.
pub struct FrameDriver {
    config: SpectrumConfig,
    column_map: ColumnMap,
    analyzer: SpectrumAnalyzer,
    block: Vec<i16>,
    magnitudes: Vec<f32>,
    raw: Vec<f32>,
    auto_level: AutoLevel,
    filter: TemporalFilter,
    peaks: PeakTracker,
    colors: Vec<Rgb888>,
    frame: Vec<ColumnFrame>,
    renderer: BarGraphRenderer,
    frame_counter: u64,
    overruns: u64,
}

impl FrameDriver {
    pub fn new(config: SpectrumConfig) -> Result<Self, ConfigError> {
        Self::with_color_strategy(config, &HueSweep)
    }

    pub fn with_color_strategy(
        config: SpectrumConfig,
        colors: &dyn ColorStrategy,
    ) -> Result<Self, ConfigError> {
        let column_map = ColumnMap::new(&config)?;
        let analyzer = SpectrumAnalyzer::new(config.fft_size())
            .map_err(|_| ConfigError::UnsupportedBlockSize(config.block_size))?;

        let columns = config.columns();
        let height = config.display_height();
        let colors = column_colors(colors, columns);
        let frame = colors
            .iter()
            .map(|&color| ColumnFrame {
                height: 0.0,
                peak: 0.0,
                color,
            })
            .collect();

        log::info!(
            "FrameDriver::new: {} columns x {} rows, {} bins ({}..={}), fft size {}",
            columns,
            config.height,
            config.block_size,
            config.low_bin,
            config.high_bin,
            config.fft_size()
        );

        Ok(Self {
            column_map,
            analyzer,
            block: vec![0; config.fft_size()],
            magnitudes: vec![0.0; config.block_size],
            raw: vec![0.0; columns],
            auto_level: AutoLevel::new(columns, config.autolevel_floor(), height),
            filter: TemporalFilter::new(columns, height),
            peaks: PeakTracker::new(columns, config.peak_accel, height),
            colors,
            frame,
            renderer: BarGraphRenderer::new(config.height),
            frame_counter: 0,
            overruns: 0,
            config,
        })
    }

    pub fn with_renderer(mut self, renderer: BarGraphRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Transforms one block of `fft_size()` samples and advances every column.
    pub fn process_block(&mut self, samples: &[i16]) -> Result<&[ColumnFrame], DspError> {
        self.analyzer.analyze(samples, &mut self.magnitudes)?;
        self.update_columns();
        Ok(&self.frame)
    }

    /// Advances every column from an already computed magnitude spectrum.
    /// Bins missing from `magnitudes` count as silent.
    pub fn process_magnitudes(&mut self, magnitudes: &[f32]) -> &[ColumnFrame] {
        let count = magnitudes.len().min(self.magnitudes.len());
        self.magnitudes[..count].copy_from_slice(&magnitudes[..count]);
        self.magnitudes[count..].fill(0.0);
        self.update_columns();
        &self.frame
    }

    fn update_columns(&mut self) {
        reduce(
            &self.magnitudes,
            &self.column_map,
            self.config.noise_floor,
            &mut self.raw,
        );

        for (column, slot) in self.frame.iter_mut().enumerate() {
            let normalized = self.auto_level.update(column, self.raw[column]);
            let height = self.filter.update(column, normalized);
            let peak = self.peaks.update(column, height);
            *slot = ColumnFrame {
                height,
                peak,
                color: self.colors[column],
            };
        }

        self.frame_counter = self.frame_counter.wrapping_add(1);
        log::trace!("frame {}: raw {:?}", self.frame_counter, self.raw);
        if self.frame_counter % LOG_INTERVAL as u64 == 0 {
            log::debug!(
                "frame {}: heights {:?}, autolevels {:?}",
                self.frame_counter,
                self.filter.heights(),
                self.auto_level.levels()
            );
        }
    }

    /// Draws the current frame, plus the autolevel overlay when enabled.
    pub fn draw<D>(&self, fb: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        self.renderer.draw(fb, &self.frame)?;
        self.renderer.draw_autolevels(fb, self.auto_level.levels())
    }

    /// One full iteration: read a block, process it, draw it and present it.
    pub fn run_frame<S, P>(
        &mut self,
        source: &mut S,
        presenter: &mut P,
    ) -> Result<BlockStatus, FrameError<S::Error, P::Error>>
    where
        S: SampleSource + ?Sized,
        P: FramePresenter + ?Sized,
    {
        let status = source
            .read_block(&mut self.block)
            .map_err(FrameError::Capture)?;
        if let BlockStatus::Overrun { dropped } = status {
            self.overruns += 1;
            log::debug!(
                "capture overrun: {} samples dropped ({} overruns so far)",
                dropped,
                self.overruns
            );
        }

        self.analyzer.analyze(&self.block, &mut self.magnitudes)?;
        self.update_columns();

        let canvas = presenter.canvas();
        if canvas.clear(Rgb888::BLACK).is_err() {
            log::error!("failed to clear canvas on frame {}", self.frame_counter);
            return Err(FrameError::Draw);
        }
        if self.draw(canvas).is_err() {
            log::error!("failed to draw frame {}", self.frame_counter);
            return Err(FrameError::Draw);
        }
        presenter.present().map_err(FrameError::Present)?;

        Ok(status)
    }

    pub fn config(&self) -> &SpectrumConfig {
        &self.config
    }

    pub fn column_map(&self) -> &ColumnMap {
        &self.column_map
    }

    pub fn frame(&self) -> &[ColumnFrame] {
        &self.frame
    }

    pub fn autolevels(&self) -> &[f32] {
        self.auto_level.levels()
    }

    pub fn peak_velocities(&self) -> &[f32] {
        self.peaks.velocities()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frame_counter
    }

    pub fn overruns(&self) -> u64 {
        self.overruns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_graphics::mock_display::MockDisplay;

    fn config() -> SpectrumConfig {
        SpectrumConfig::default().with_display(8, 32)
    }

    struct ConstantSource {
        value: i16,
        overrun_every: usize,
        reads: usize,
    }

    impl SampleSource for ConstantSource {
        type Error = Infallible;

        fn read_block(&mut self, block: &mut [i16]) -> Result<BlockStatus, Infallible> {
            block.fill(self.value);
            self.reads += 1;
            if self.overrun_every > 0 && self.reads % self.overrun_every == 0 {
                Ok(BlockStatus::Overrun { dropped: 16 })
            } else {
                Ok(BlockStatus::Complete)
            }
        }
    }

    struct MockPresenter {
        display: MockDisplay<Rgb888>,
        presented: usize,
    }

    impl FramePresenter for MockPresenter {
        type Canvas = MockDisplay<Rgb888>;
        type Error = Infallible;

        fn canvas(&mut self) -> &mut Self::Canvas {
            &mut self.display
        }

        fn present(&mut self) -> Result<(), Infallible> {
            self.presented += 1;
            Ok(())
        }
    }

    fn presenter() -> MockPresenter {
        let mut display = MockDisplay::new();
        display.set_allow_overdraw(true);
        MockPresenter {
            display,
            presented: 0,
        }
    }

    #[test]
    fn test_initial_state() {
        let driver = FrameDriver::new(config()).unwrap();
        assert_eq!(driver.frame().len(), 8);
        assert!(driver.autolevels().iter().all(|&l| l == 4.0));
        assert!(driver.peak_velocities().iter().all(|&v| v == 0.0));
        for column in driver.frame() {
            assert_eq!(column.height, 0.0);
            assert_eq!(column.peak, 0.0);
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let bad = SpectrumConfig::default().with_display(1, 32);
        assert!(FrameDriver::new(bad).is_err());
    }

    #[test]
    fn test_colors_are_fixed_per_column() {
        let mut driver = FrameDriver::new(config()).unwrap();
        let before: Vec<Rgb888> = driver.frame().iter().map(|c| c.color).collect();
        let mut magnitudes = vec![0.0f32; 512];
        magnitudes[100] = 5000.0;
        driver.process_magnitudes(&magnitudes);
        let after: Vec<Rgb888> = driver.frame().iter().map(|c| c.color).collect();
        assert_eq!(before, after);
        assert_eq!(before[0], Rgb888::new(255, 0, 0));
    }

    #[test]
    fn test_process_block_rejects_wrong_length() {
        let mut driver = FrameDriver::new(config()).unwrap();
        assert!(driver.process_block(&[0i16; 100]).is_err());
        assert_eq!(driver.frames_processed(), 0);
    }

    #[test]
    fn test_run_frame_presents_each_block() {
        let mut driver = FrameDriver::new(config()).unwrap();
        let mut source = ConstantSource {
            value: 0,
            overrun_every: 2,
            reads: 0,
        };
        let mut presenter = presenter();

        for _ in 0..4 {
            driver.run_frame(&mut source, &mut presenter).unwrap();
        }
        assert_eq!(presenter.presented, 4);
        assert_eq!(driver.frames_processed(), 4);
        assert_eq!(driver.overruns(), 2);
    }

    #[test]
    fn test_run_frame_draws_peak_dots() {
        let mut driver = FrameDriver::new(config()).unwrap();
        let mut magnitudes = vec![0.0f32; 512];
        let bin = driver.column_map().center(4) as usize;
        magnitudes[bin] = 20_000.0;
        for _ in 0..3 {
            driver.process_magnitudes(&magnitudes);
        }
        let frame = driver.frame()[4];
        assert!(frame.height > 1.0);

        let mut fb = MockDisplay::new();
        fb.set_allow_overdraw(true);
        driver.draw(&mut fb).unwrap();
        let y_top = 32 - ((frame.height + 0.5) as i32);
        assert_eq!(fb.get_pixel(Point::new(4, 31)), Some(frame.color));
        assert_eq!(fb.get_pixel(Point::new(4, y_top)), Some(frame.color));
    }
}
