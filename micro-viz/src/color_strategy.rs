use alloc::vec::Vec;

use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
#[allow(unused_imports)]
use micromath::F32Ext;

/// Where a column sits on the display, handed to a [`ColorStrategy`].
pub struct ColorContext {
    pub column: usize,
    pub num_columns: usize,
}

/// Picks the fixed color of each column. Called once per column at startup.
pub trait ColorStrategy {
    fn color(&self, context: &ColorContext) -> Rgb888;
}

/// Sweeps the hue from red at the left edge toward purple at the right
/// (300° over the full width, stopping short of wrapping back to red), at full
/// saturation and 50 % lightness.
pub struct HueSweep;

impl ColorStrategy for HueSweep {
    fn color(&self, context: &ColorContext) -> Rgb888 {
        let hue = (context.column * 300 / context.num_columns.max(1)) as f32;
        hsl_to_rgb(hue, 1.0, 0.5)
    }
}

/// Spreads the columns evenly over a three-segment RGB color wheel.
pub struct ColorWheel;

impl ColorStrategy for ColorWheel {
    fn color(&self, context: &ColorContext) -> Rgb888 {
        let position = ((context.column as u32 * 255 / context.num_columns.max(1) as u32) % 255) as u8;
        map_position_to_rgb_on_wheel(position)
    }
}

/// Computes every column's color for a display `num_columns` wide.
pub fn column_colors(strategy: &dyn ColorStrategy, num_columns: usize) -> Vec<Rgb888> {
    (0..num_columns)
        .map(|column| strategy.color(&ColorContext { column, num_columns }))
        .collect()
}

/// HSL to RGB, hue in degrees, saturation and lightness in `0.0..=1.0`.
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> Rgb888 {
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let sector = (hue % 360.0) / 60.0;
    let x = chroma * (1.0 - ((sector % 2.0) - 1.0).abs());
    let m = lightness - chroma / 2.0;

    let (r, g, b) = match sector as u8 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    Rgb888::new(to_channel(r + m), to_channel(g + m), to_channel(b + m))
}

fn to_channel(value: f32) -> u8 {
    (value * 255.0 + 0.5).clamp(0.0, 255.0) as u8
}

/// Scales a color by `percent` (clamped to 0..=100), like a panel brightness setting.
pub fn scale_brightness(color: Rgb888, percent: u8) -> Rgb888 {
    let percent = percent.min(100) as u16;
    let scale = |channel: u8| (channel as u16 * percent / 100) as u8;
    Rgb888::new(scale(color.r()), scale(color.g()), scale(color.b()))
}

fn map_position_to_rgb_on_wheel(pos: u8) -> Rgb888 {
    let pos = pos % 255;
    if pos < 85 {
        Rgb888::new(
            pos.saturating_mul(3),
            255u8.saturating_sub(pos.saturating_mul(3)),
            0,
        )
    } else if pos < 170 {
        let pos = pos.saturating_sub(85);
        Rgb888::new(
            255u8.saturating_sub(pos.saturating_mul(3)),
            0,
            pos.saturating_mul(3),
        )
    } else {
        let pos = pos.saturating_sub(170);
        Rgb888::new(
            0,
            pos.saturating_mul(3),
            255u8.saturating_sub(pos.saturating_mul(3)),
        )
    }
}
