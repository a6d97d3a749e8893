use alloc::{vec, vec::Vec};

/// Peak-hold dots that snap up to a new maximum and then fall with constant
/// acceleration, like a dropped object.
pub struct PeakTracker {
    peaks: Vec<f32>,
    velocities: Vec<f32>,
    accel: f32,
    max_height: f32,
}

impl PeakTracker {
    pub fn new(num_columns: usize, accel: f32, max_height: f32) -> Self {
        Self {
            peaks: vec![0.0; num_columns],
            velocities: vec![0.0; num_columns],
            accel,
            max_height,
        }
    }

    /// Advances the peak of `column` given the bar's current height and returns it.
    pub fn update(&mut self, column: usize, height: f32) -> f32 {
        let peak = &mut self.peaks[column];
        let velocity = &mut self.velocities[column];

        if height > *peak {
            *peak = height.min(self.max_height);
            *velocity = 0.0;
        } else {
            *velocity += self.accel;
            *peak = (*peak - *velocity).max(0.0);
        }
        *peak
    }

    pub fn peak(&self, column: usize) -> f32 {
        self.peaks[column]
    }

    pub fn velocity(&self, column: usize) -> f32 {
        self.velocities[column]
    }

    pub fn velocities(&self) -> &[f32] {
        &self.velocities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_snaps_to_new_height() {
        let mut peaks = PeakTracker::new(1, 0.15, 32.0);
        assert_eq!(peaks.update(0, 20.0), 20.0);
        assert_eq!(peaks.velocity(0), 0.0);

        peaks.update(0, 10.0);
        assert!(peaks.velocity(0) > 0.0);
        assert_eq!(peaks.update(0, 25.0), 25.0);
        assert_eq!(peaks.velocity(0), 0.0);
    }

    #[test]
    fn test_snap_is_capped_at_display_height() {
        let mut peaks = PeakTracker::new(1, 0.15, 32.0);
        assert_eq!(peaks.update(0, 40.0), 32.0);
    }

    #[test]
    fn test_falls_with_acceleration() {
        let mut peaks = PeakTracker::new(1, 0.15, 32.0);
        peaks.update(0, 30.0);

        let mut previous = peaks.peak(0);
        let mut previous_drop = 0.0;
        let mut frames = 0;
        while peaks.peak(0) > 0.0 {
            let peak = peaks.update(0, 0.0);
            let drop = previous - peak;
            assert!(peak <= previous);
            if peak > 0.0 {
                assert!(drop > previous_drop, "fall must accelerate");
            }
            previous = peak;
            previous_drop = drop;
            frames += 1;
            assert!(frames < 100, "peak never landed");
        }
        // Σ 0.15·k over k frames reaches 30 after 20 frames.
        assert_eq!(frames, 20);
    }

    #[test]
    fn test_first_drops_follow_velocity() {
        let mut peaks = PeakTracker::new(1, 0.15, 32.0);
        peaks.update(0, 10.0);
        assert_relative_eq!(peaks.update(0, 0.0), 9.85, epsilon = 1e-5);
        assert_relative_eq!(peaks.update(0, 0.0), 9.55, epsilon = 1e-5);
        assert_relative_eq!(peaks.update(0, 0.0), 9.10, epsilon = 1e-5);
    }
}
