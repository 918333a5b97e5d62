//! Normalized ⇄ scaled value mapping with a skew exponent
//!
//! A continuous parameter is stored in its scaled (host) units. The control
//! surface works in normalized `[0, 1]` space. The skew bends the curve:
//!
//! - `skew < 1.0`: more slider travel near the start of the range
//! - `skew > 1.0`: more slider travel near the end of the range
//! - `skew = 1.0`: linear
//!
//! `to_scaled` applies `1/skew`, `to_normalized` applies `skew`. Only
//! `to_normalized(to_scaled(n))` is guaranteed to round-trip; the reverse
//! composition clamps out-of-range scaled values.

/// Ranges narrower than this are treated as degenerate
pub const DEGENERATE_RANGE_EPSILON: f64 = 1.0e-9;

/// Calibration of a continuous range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkewedRange {
    pub start: f64,
    pub end: f64,
    pub skew: f64,
}

impl SkewedRange {
    pub fn new(start: f64, end: f64, skew: f64) -> Self {
        Self { start, end, skew }
    }

    /// Map a normalized position to scaled units
    pub fn to_scaled(&self, normalized: f64) -> f64 {
        to_scaled(normalized, self.start, self.end, self.skew)
    }

    /// Map a scaled value to a normalized position
    pub fn to_normalized(&self, scaled: f64) -> f64 {
        to_normalized(scaled, self.start, self.end, self.skew)
    }
}

impl Default for SkewedRange {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: 1.0,
            skew: 1.0,
        }
    }
}

/// Non-finite or non-positive skew falls back to linear
pub fn effective_skew(skew: f64) -> f64 {
    if skew.is_finite() && skew > 0.0 {
        skew
    } else {
        1.0
    }
}

fn clamp_unit(value: f64) -> f64 {
    // NaN input collapses to the start of the range
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// `clamp(n)^(1/skew) * (end - start) + start`
pub fn to_scaled(normalized: f64, start: f64, end: f64, skew: f64) -> f64 {
    let skew = effective_skew(skew);
    clamp_unit(normalized).powf(1.0 / skew) * (end - start) + start
}

/// `clamp((scaled - start) / (end - start))^skew`, or `0` for a degenerate range
pub fn to_normalized(scaled: f64, start: f64, end: f64, skew: f64) -> f64 {
    let skew = effective_skew(skew);
    let span = end - start;
    if span.abs() < DEGENERATE_RANGE_EPSILON {
        return 0.0;
    }

    let linear = clamp_unit((scaled - start) / span);
    linear.powf(skew)
}
