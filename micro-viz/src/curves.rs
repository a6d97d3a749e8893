#[allow(unused_imports)]
use micromath::F32Ext;

/// Smoothstep-shaped weighting for a bin at normalized `distance` from a column
/// center: 1.0 at the center, falling to 0.0 at a distance of 1.0 with zero slope
/// at both ends, so bins fade in and out of a column instead of switching.
pub fn cubic_falloff(distance: f32) -> f32 {
    let d = distance.abs();
    if !(d < 1.0) {
        return 0.0;
    }
    let t = 1.0 - d;
    (3.0 - 2.0 * t) * t * t
}

/// Spectrum bin (fractional) at the center of the column at `column_frac` (0.0 to 1.0).
/// An exponent above 1 packs the low columns together and spreads the high ones.
pub fn map_column_to_center(column_frac: f32, low: f32, high: f32, exponent: f32) -> f32 {
    if column_frac <= 0.0 {
        return low;
    }
    low + (high - low) * column_frac.powf(exponent)
}

/// Relative gain of a column, rising from 0.02 at the left edge to 0.10 at the
/// right. Tames the bass columns, which otherwise dominate the display.
pub fn column_gain(column_frac: f32) -> f32 {
    if column_frac <= 0.0 {
        return 0.02;
    }
    0.02 + 0.08 * column_frac.powf(1.8)
}
