use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::Point,
    pixelcolor::{Rgb888, RgbColor},
    prelude::*,
    primitives::{Line, PrimitiveStyle},
    Pixel,
};

use crate::color_strategy::scale_brightness;
use crate::frame_driver::ColumnFrame;

const PEAK_COLOR: Rgb888 = Rgb888::WHITE;
const AUTOLEVEL_COLOR: Rgb888 = Rgb888::RED;

pub trait Renderer {
    fn draw<D: DrawTarget<Color = Rgb888>>(
        &self,
        target: &mut D,
        frame: &[ColumnFrame],
    ) -> Result<(), D::Error>;
}

/// Draws one frame as bottom-aligned vertical bars with a peak dot above each.
///
/// A value `v` in display units maps to pixel row `height - round(v)`, so a bar of
/// height `h` lights rows `height - h ..= height - 1` and a value of 0 lights
/// nothing. The peak dot is drawn before its bar, which may cover it.
pub struct BarGraphRenderer {
    screen_height: u16,
    column_width: u16,
    brightness: u8,
    show_autolevel: bool,
}

impl Renderer for BarGraphRenderer {
    fn draw<D>(&self, fb: &mut D, frame: &[ColumnFrame]) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        for (i, column) in frame.iter().enumerate() {
            let x_start = (i as u32 * self.column_width as u32) as i32;

            if let Some(y_peak) = self.row_for(column.peak) {
                let color = scale_brightness(PEAK_COLOR, self.brightness);
                for x_offset in 0..self.column_width as i32 {
                    Pixel(Point::new(x_start + x_offset, y_peak), color).draw(fb)?;
                }
            }

            if let Some(y_top) = self.row_for(column.height) {
                let y_bottom = self.screen_height as i32 - 1;
                let color = scale_brightness(column.color, self.brightness);
                for x_offset in 0..self.column_width as i32 {
                    let x = x_start + x_offset;
                    Line::new(Point::new(x, y_top), Point::new(x, y_bottom))
                        .into_styled(PrimitiveStyle::with_stroke(color, 1))
                        .draw(fb)?;
                }
            }
        }
        Ok(())
    }
}

impl BarGraphRenderer {
    pub fn new(screen_height: u16) -> Self {
        Self {
            screen_height,
            column_width: 1,
            brightness: 100,
            show_autolevel: false,
        }
    }

    /// Pixels per column, at least 1.
    pub fn with_column_width(mut self, column_width: u16) -> Self {
        self.column_width = column_width.max(1);
        self
    }

    /// Brightness in percent, 1..=100.
    pub fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = brightness.clamp(1, 100);
        self
    }

    pub fn with_autolevel_overlay(mut self, show_autolevel: bool) -> Self {
        self.show_autolevel = show_autolevel;
        self
    }

    /// Screen size needed to show `num_columns` columns.
    pub fn screen_size(&self, num_columns: usize) -> Size {
        Size::new(
            num_columns as u32 * self.column_width as u32,
            self.screen_height as u32,
        )
    }

    /// Debug overlay: a red dot at each column's autolevel.
    pub fn draw_autolevels<D>(&self, fb: &mut D, levels: &[f32]) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        if !self.show_autolevel {
            return Ok(());
        }
        let color = scale_brightness(AUTOLEVEL_COLOR, self.brightness);
        for (i, &level) in levels.iter().enumerate() {
            if let Some(y) = self.row_for(level) {
                let x_start = (i as u32 * self.column_width as u32) as i32;
                for x_offset in 0..self.column_width as i32 {
                    Pixel(Point::new(x_start + x_offset, y), color).draw(fb)?;
                }
            }
        }
        Ok(())
    }

    /// Row of a display-unit value, or `None` when it rounds to zero (below the screen).
    fn row_for(&self, value: f32) -> Option<i32> {
        let height = self.screen_height as i32;
        let lit = ((value.max(0.0) + 0.5) as i32).min(height);
        if lit <= 0 {
            None
        } else {
            Some(height - lit)
        }
    }
}
