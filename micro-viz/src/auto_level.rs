use alloc::{vec, vec::Vec};

/// Share of the old level kept when a column gets louder than its ceiling.
const RISE_KEEP: f32 = 0.25;
/// Share of the old level kept while a column stays under its ceiling.
const FALL_KEEP: f32 = 0.98;

/// Adaptive per-column ceiling that turns raw column energy into display units.
///
/// The ceiling jumps up within two or three frames of a loud transient and
/// relaxes slowly in quiet passages, never dropping below `floor`. A column fed
/// persistently loud input therefore stops pinning at the top, and a quiet column
/// still shows small movements.
pub struct AutoLevel {
    levels: Vec<f32>,
    floor: f32,
    display_height: f32,
}

impl AutoLevel {
    pub fn new(num_columns: usize, floor: f32, display_height: f32) -> Self {
        Self {
            levels: vec![floor; num_columns],
            floor,
            display_height,
        }
    }

    /// Feeds one frame's raw energy for `column` and returns it normalized
    /// against the updated ceiling, in display units.
    pub fn update(&mut self, column: usize, raw: f32) -> f32 {
        let raw = if raw.is_finite() { raw } else { 0.0 };
        let level = &mut self.levels[column];

        *level = if raw > *level {
            *level * RISE_KEEP + raw * (1.0 - RISE_KEEP)
        } else {
            *level * FALL_KEEP + raw * (1.0 - FALL_KEEP)
        };
        if !(*level >= self.floor) {
            *level = self.floor;
        }

        raw * self.display_height / *level
    }

    pub fn level(&self, column: usize) -> f32 {
        self.levels[column]
    }

    pub fn levels(&self) -> &[f32] {
        &self.levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_starts_at_floor() {
        let auto_level = AutoLevel::new(4, 4.0, 32.0);
        assert!(auto_level.levels().iter().all(|&l| l == 4.0));
    }

    #[test]
    fn test_rises_fast() {
        let mut auto_level = AutoLevel::new(1, 4.0, 32.0);
        let norm = auto_level.update(0, 100.0);
        // 0.25 * 4 + 0.75 * 100
        assert_relative_eq!(auto_level.level(0), 76.0, epsilon = 1e-4);
        assert_relative_eq!(norm, 100.0 * 32.0 / 76.0, epsilon = 1e-4);
    }

    #[test]
    fn test_falls_slowly() {
        let mut auto_level = AutoLevel::new(1, 4.0, 32.0);
        auto_level.update(0, 100.0);
        auto_level.update(0, 10.0);
        // 0.98 * 76 + 0.02 * 10
        assert_relative_eq!(auto_level.level(0), 74.68, epsilon = 1e-4);
    }

    #[test]
    fn test_never_drops_below_floor() {
        let mut auto_level = AutoLevel::new(1, 4.0, 32.0);
        for raw in [-50.0, 0.0, -2.0, f32::NAN, f32::NEG_INFINITY, 3.0] {
            auto_level.update(0, raw);
            assert!(auto_level.level(0) >= 4.0);
        }
    }

    #[test]
    fn test_non_finite_input_counts_as_silence() {
        let mut auto_level = AutoLevel::new(1, 4.0, 32.0);
        assert_eq!(auto_level.update(0, f32::INFINITY), 0.0);
        assert_eq!(auto_level.level(0), 4.0);
    }

    #[test]
    fn test_sustained_input_stops_pinning() {
        let mut auto_level = AutoLevel::new(1, 4.0, 32.0);
        let mut norm = 0.0;
        for _ in 0..20 {
            norm = auto_level.update(0, 200.0);
        }
        assert_relative_eq!(norm, 32.0, max_relative = 1e-3);
    }
}
