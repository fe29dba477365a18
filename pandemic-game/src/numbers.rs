//! Numeric conversion helpers centralizing the casts used by probability math.

use num_traits::cast::cast;

/// Convert a card count to f64, allowing precision loss in a single location.
#[must_use]
pub fn count_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Clamp a probability into `[0, 1]`, returning 0.0 for non-finite values.
#[must_use]
pub fn clamp_probability(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Ratio of two counts as a probability; a zero denominator yields 0.0.
#[must_use]
pub fn ratio(numerator: f64, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    clamp_probability(numerator / count_to_f64(denominator))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_handles_non_finite() {
        assert!(clamp_probability(f64::NAN).abs() < f64::EPSILON);
        assert!((clamp_probability(f64::INFINITY)).abs() < f64::EPSILON);
        assert!((clamp_probability(1.5) - 1.0).abs() < f64::EPSILON);
        assert!(clamp_probability(-0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn ratio_guards_zero_denominator() {
        assert!(ratio(1.0, 0).abs() < f64::EPSILON);
        assert!((ratio(1.0, 4) - 0.25).abs() < f64::EPSILON);
        assert!((ratio(3.0, 2) - 1.0).abs() < f64::EPSILON);
    }
}
