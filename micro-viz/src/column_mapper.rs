use alloc::vec::Vec;
#[allow(unused_imports)]
use micromath::F32Ext;

use crate::config::SpectrumConfig;
use crate::curves::{column_gain, cubic_falloff, map_column_to_center};
use crate::error::ConfigError;

/// Minimum half-width of a column's falloff curve, in bins.
const MIN_HALF_WIDTH: f32 = 0.75;

/// Contribution of one spectrum bin to one display column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinWeight {
    pub bin: u16,
    pub weight: f32,
}

/// Read-only table mapping every display column to the spectrum bins it sums.
///
/// All weights live in one contiguous array; `column_ranges[c]` is the
/// `(start, end)` slice of that array belonging to column `c`. Neighbouring
/// columns overlap slightly so that no bin between the first and last column
/// centers is left out.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    weights: Vec<BinWeight>,
    column_ranges: Vec<(usize, usize)>,
    centers: Vec<f32>,
    max_weight_sum: f32,
}

impl ColumnMap {
    pub fn new(config: &SpectrumConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let columns = config.columns();
        let last_column = (columns - 1) as f32;
        let low = config.low_bin as f32;
        let high = config.high_bin as f32;
        let last_bin = config.block_size - 1;

        let centers: Vec<f32> = (0..columns)
            .map(|c| map_column_to_center(c as f32 / last_column, low, high, config.exponent))
            .collect();

        let mut weights = Vec::new();
        let mut column_ranges = Vec::with_capacity(columns);
        let mut column_sums = Vec::with_capacity(columns);

        for (column, &center) in centers.iter().enumerate() {
            // Spread is tied to the distance from the previous column (the next one
            // for column 0), giving full coverage with a little overlap.
            let neighbor = if column > 0 { column - 1 } else { column + 1 };
            let half_width = MIN_HALF_WIDTH + (center - centers[neighbor]).abs();

            let left = (center - half_width).max(0.0) as usize;
            let right = ((center + half_width + 1.0) as usize).min(last_bin);

            let start = weights.len();
            let mut sum = 0.0f32;
            for bin in left..right {
                let weight = cubic_falloff((bin as f32 + 0.5 - center) / half_width);
                if weight > 0.0 {
                    weights.push(BinWeight {
                        bin: bin as u16,
                        weight,
                    });
                    sum += weight;
                }
            }
            if weights.len() == start {
                return Err(ConfigError::EmptyColumn(column));
            }
            column_ranges.push((start, weights.len()));
            column_sums.push(sum);
        }

        let max_weight_sum = column_sums.iter().copied().fold(0.0f32, f32::max);

        for (column, &(start, end)) in column_ranges.iter().enumerate() {
            let frac = column as f32 / last_column;
            let scale = column_gain(frac) * max_weight_sum / column_sums[column];
            for entry in &mut weights[start..end] {
                entry.weight *= scale;
            }
            log::debug!(
                "column {}: center {:.2}, bins {}..={}, scale {:.4}",
                column,
                centers[column],
                weights[start].bin,
                weights[end - 1].bin,
                scale
            );
        }

        Ok(Self {
            weights,
            column_ranges,
            centers,
            max_weight_sum,
        })
    }

    pub fn len(&self) -> usize {
        self.column_ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.column_ranges.is_empty()
    }

    /// Weighted bins of one column, in ascending bin order.
    pub fn column(&self, column: usize) -> &[BinWeight] {
        let (start, end) = self.column_ranges[column];
        &self.weights[start..end]
    }

    pub fn columns(&self) -> impl Iterator<Item = &[BinWeight]> + '_ {
        self.column_ranges
            .iter()
            .map(move |&(start, end)| &self.weights[start..end])
    }

    pub fn column_ranges(&self) -> &[(usize, usize)] {
        &self.column_ranges
    }

    /// Fractional bin at the center of `column`.
    pub fn center(&self, column: usize) -> f32 {
        self.centers[column]
    }

    /// Largest raw (pre-normalization) sum of falloff weights over all columns.
    pub fn max_weight_sum(&self) -> f32 {
        self.max_weight_sum
    }
}
