//! Decimal rounding shared by every transform
//!
//! All jobs round half away from zero on the scaled value, which is what
//! [`f64::round`] does. `0.125` becomes `0.13`, never `0.12`.

/// Round `value` to `places` decimal places, half away from zero
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Round to two decimal places, the precision used by every job
pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(round2(0.375), 0.38);
    }

    #[test]
    fn test_round_course_values() {
        assert_eq!(round2(70.0 * 0.0254), 1.78);
        assert_eq!(round2(150.0 * 0.45359237), 68.04);
        assert_eq!(round_to(1234.5678, 0), 1235.0);
    }

    proptest! {
        #[test]
        fn prop_round2_stays_within_half_cent(x in -1.0e6f64..1.0e6f64) {
            let rounded = round2(x);
            prop_assert!((rounded - x).abs() <= 0.005 + 1e-9);
        }

        #[test]
        fn prop_round2_is_stable(x in -1.0e6f64..1.0e6f64) {
            let once = round2(x);
            prop_assert_eq!(round2(once), once);
        }
    }
}
