use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use micro_viz::{config, BarGraphRenderer, ColorStrategy, ColorWheel, HueSweep, SpectrumConfig};

/// Audio spectrum bars for small LED matrices, rendered to a simulated panel.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Raw S16LE mono PCM file, `-` for stdin, or a `.wav` file.
    #[arg(short, long, default_value = "-", conflicts_with = "mic")]
    pub input: String,

    /// Capture from the default input device instead of `--input`.
    #[arg(long)]
    pub mic: bool,

    #[arg(long, default_value_t = config::SAMPLE_RATE_HZ)]
    pub sample_rate: u32,

    /// Number of spectrum bins; one block is twice this many samples.
    #[arg(long, default_value_t = config::BLOCK_SIZE)]
    pub block_size: usize,

    #[arg(long, default_value_t = config::LOW_BIN)]
    pub low_bin: usize,

    #[arg(long, default_value_t = config::HIGH_BIN)]
    pub high_bin: usize,

    /// Column-to-bin mapping exponent.
    #[arg(long, default_value_t = config::EXPONENT)]
    pub exponent: f32,

    #[arg(long, default_value_t = config::NOISE_FLOOR)]
    pub noise_floor: f32,

    /// Number of columns.
    #[arg(long, default_value_t = config::WIDTH)]
    pub width: u16,

    /// Panel height in pixels.
    #[arg(long, default_value_t = config::HEIGHT)]
    pub height: u16,

    #[arg(long, default_value_t = config::PEAK_ACCEL)]
    pub peak_accel: f32,

    #[arg(long, default_value_t = config::AUTOLEVEL_FLOOR_RATIO)]
    pub autolevel_floor_ratio: f32,

    #[arg(long, value_enum, default_value_t = Palette::Hue)]
    pub palette: Palette,

    /// Pixels per column.
    #[arg(long, default_value_t = 1)]
    pub column_width: u16,

    /// Panel brightness in percent.
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub brightness: u8,

    /// Draw each column's autolevel as a red dot.
    #[arg(long)]
    pub show_autolevel: bool,

    /// Simulator pixel scale for windows and snapshots.
    #[arg(long, default_value_t = 8)]
    pub scale: u32,

    /// Stop after this many frames.
    #[arg(long)]
    pub frames: Option<u64>,

    /// Save the last frame as a PNG on exit.
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Show the panel in a desktop window.
    #[arg(long)]
    pub window: bool,

    /// Process file input as fast as possible instead of in real time.
    #[arg(long)]
    pub unpaced: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Palette {
    /// Red through purple across the panel.
    Hue,
    /// Three-segment RGB wheel.
    Wheel,
}

impl Palette {
    pub fn strategy(self) -> &'static dyn ColorStrategy {
        match self {
            Palette::Hue => &HueSweep,
            Palette::Wheel => &ColorWheel,
        }
    }
}

impl Args {
    pub fn spectrum_config(&self) -> SpectrumConfig {
        SpectrumConfig::default()
            .with_sample_rate(self.sample_rate)
            .with_block_size(self.block_size)
            .with_bin_range(self.low_bin, self.high_bin)
            .with_exponent(self.exponent)
            .with_noise_floor(self.noise_floor)
            .with_display(self.width, self.height)
            .with_peak_accel(self.peak_accel)
            .with_autolevel_floor_ratio(self.autolevel_floor_ratio)
    }

    pub fn renderer(&self) -> BarGraphRenderer {
        BarGraphRenderer::new(self.height)
            .with_column_width(self.column_width)
            .with_brightness(self.brightness)
            .with_autolevel_overlay(self.show_autolevel)
    }

    /// Whether the input is a WAV file rather than raw PCM.
    pub fn is_wav(&self) -> bool {
        self.input != "-"
            && std::path::Path::new(&self.input)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
    }
}
