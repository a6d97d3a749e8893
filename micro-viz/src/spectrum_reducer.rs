use crate::column_mapper::{BinWeight, ColumnMap};

/// Weighted energy of one column: the sum of its bin magnitudes times their
/// weights, less the noise floor. Bins past the end of `magnitudes` count as silent.
pub fn column_energy(magnitudes: &[f32], weights: &[BinWeight], noise_floor: f32) -> f32 {
    weights.iter().fold(-noise_floor, |total, entry| {
        total + magnitudes.get(entry.bin as usize).copied().unwrap_or(0.0) * entry.weight
    })
}

/// Reduces one frame of bin magnitudes to a raw energy per display column.
pub fn reduce(magnitudes: &[f32], map: &ColumnMap, noise_floor: f32, raw: &mut [f32]) {
    for (slot, weights) in raw.iter_mut().zip(map.columns()) {
        *slot = column_energy(magnitudes, weights, noise_floor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpectrumConfig;
    use crate::curves::column_gain;
    use approx::assert_relative_eq;

    #[test]
    fn test_column_energy() {
        let weights = [
            BinWeight { bin: 1, weight: 0.5 },
            BinWeight { bin: 2, weight: 0.25 },
        ];
        let magnitudes = [100.0, 4.0, 8.0, 100.0];
        assert_relative_eq!(column_energy(&magnitudes, &weights, 2.0), 2.0);
        assert_relative_eq!(column_energy(&[], &weights, 2.0), -2.0);
    }

    #[test]
    fn test_silence_reduces_to_negative_noise_floor() {
        let config = SpectrumConfig::default().with_display(8, 32);
        let map = ColumnMap::new(&config).unwrap();
        let magnitudes = [0.0f32; 512];
        let mut raw = [0.0f32; 8];
        reduce(&magnitudes, &map, config.noise_floor, &mut raw);
        assert!(raw.iter().all(|&r| r == -2.0));
    }

    #[test]
    fn test_flat_spectrum_follows_column_gain() {
        let config = SpectrumConfig::default().with_display(8, 32);
        let map = ColumnMap::new(&config).unwrap();
        let magnitudes = [1.0f32; 512];
        let mut raw = [0.0f32; 8];
        reduce(&magnitudes, &map, 0.0, &mut raw);

        for (column, &energy) in raw.iter().enumerate() {
            let expected = column_gain(column as f32 / 7.0) * map.max_weight_sum();
            assert_relative_eq!(energy, expected, max_relative = 1e-3);
        }
        assert!(raw[7] > raw[0]);
    }
}
