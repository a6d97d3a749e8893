use alloc::{vec, vec::Vec};

/// Share of the old height kept when the target is above it.
const ATTACK_KEEP: f32 = 0.4;
/// Share of the old height kept when the target is at or below it.
const RELEASE_KEEP: f32 = 0.6;

/// Asymmetric one-pole smoothing of normalized column energy into bar heights:
/// quick to rise, gentler to fall.
pub struct TemporalFilter {
    heights: Vec<f32>,
    max_height: f32,
}

impl TemporalFilter {
    pub fn new(num_columns: usize, max_height: f32) -> Self {
        Self {
            heights: vec![0.0; num_columns],
            max_height,
        }
    }

    /// Moves `column` toward `target` and returns the new height, clamped to
    /// `0..=max_height`.
    pub fn update(&mut self, column: usize, target: f32) -> f32 {
        let target = if target.is_finite() { target } else { 0.0 };
        let height = &mut self.heights[column];

        let keep = if target > *height {
            ATTACK_KEEP
        } else {
            RELEASE_KEEP
        };
        *height = (*height * keep + target * (1.0 - keep)).clamp(0.0, self.max_height);
        *height
    }

    pub fn height(&self, column: usize) -> f32 {
        self.heights[column]
    }

    pub fn heights(&self) -> &[f32] {
        &self.heights
    }
}
