use micro_dsp::{SpectrumAnalyzer, MAGNITUDE_EXPONENT};
use rand::{rngs::StdRng, Rng, SeedableRng};

const FFT_SIZE: usize = 1024;
const BINS: usize = FFT_SIZE / 2;

fn sine_block(bin: usize, amplitude: f32) -> Vec<i16> {
    (0..FFT_SIZE)
        .map(|i| {
            let phase = 2.0 * std::f32::consts::PI * bin as f32 * i as f32 / FFT_SIZE as f32;
            (amplitude * phase.sin()) as i16
        })
        .collect()
}

fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f32::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
        .0
}

#[test]
fn test_silence_yields_zero_spectrum() {
    let mut analyzer = SpectrumAnalyzer::new(FFT_SIZE).unwrap();
    let mut magnitudes = vec![1.0f32; BINS];
    analyzer.analyze(&[0i16; FFT_SIZE], &mut magnitudes).unwrap();
    assert!(magnitudes.iter().all(|&m| m == 0.0));
}

#[test]
fn test_sine_peaks_at_its_bin() {
    let mut analyzer = SpectrumAnalyzer::new(FFT_SIZE).unwrap();
    let mut magnitudes = vec![0.0f32; BINS];

    for &bin in &[7usize, 50, 123, 300, 480] {
        analyzer.analyze(&sine_block(bin, 8000.0), &mut magnitudes).unwrap();
        assert_eq!(argmax(&magnitudes), bin, "sine at bin {} peaked elsewhere", bin);
    }
}

#[test]
fn test_sine_magnitude_matches_orthonormal_scaling() {
    let mut analyzer = SpectrumAnalyzer::new(FFT_SIZE).unwrap();
    let mut magnitudes = vec![0.0f32; BINS];
    let amplitude = 1000.0f32;
    analyzer.analyze(&sine_block(64, amplitude), &mut magnitudes).unwrap();

    // |X[k]| = A * N / 2, divided by sqrt(N).
    let expected_abs = amplitude * FFT_SIZE as f32 / 2.0 / (FFT_SIZE as f32).sqrt();
    let expected = (expected_abs * expected_abs).powf(MAGNITUDE_EXPONENT);
    let actual = magnitudes[64];
    assert!(
        (actual - expected).abs() / expected < 0.05,
        "expected ~{}, got {}",
        expected,
        actual
    );
}

#[test]
fn test_louder_noise_gives_larger_spectrum() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut analyzer = SpectrumAnalyzer::new(FFT_SIZE).unwrap();

    let quiet: Vec<i16> = (0..FFT_SIZE).map(|_| rng.random_range(-100..=100)).collect();
    let loud: Vec<i16> = quiet.iter().map(|&s| s * 50).collect();

    let mut quiet_mags = vec![0.0f32; BINS];
    let mut loud_mags = vec![0.0f32; BINS];
    analyzer.analyze(&quiet, &mut quiet_mags).unwrap();
    analyzer.analyze(&loud, &mut loud_mags).unwrap();

    let quiet_sum: f32 = quiet_mags.iter().sum();
    let loud_sum: f32 = loud_mags.iter().sum();
    assert!(loud_sum > quiet_sum * 10.0);
}
