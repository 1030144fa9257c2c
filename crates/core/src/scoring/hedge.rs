pub const MAX_HEDGE_PCT: f64 = 87.5;
const HEDGE_PCT_PER_POINT: f64 = 8.75;

/// Recommended share of dollar beta to hedge, 0..=87.5.
///
/// A high VIX already prices in fear, so the hedge is trimmed; a very low VIX makes protection
/// cheap, so it is topped up. The percentile adjustment applies on top of the level adjustment,
/// and only the final value is clamped.
pub fn hedge_percentage(score: u8, vix_percentile: f64, vix_level: f64) -> f64 {
    let mut pct = (f64::from(score) * HEDGE_PCT_PER_POINT).min(MAX_HEDGE_PCT);

    if vix_level > 35.0 {
        pct -= 15.0;
    } else if vix_level > 25.0 {
        pct -= 10.0;
    } else if vix_level < 12.0 {
        pct += 12.5;
    }

    if vix_percentile > 90.0 {
        pct -= 12.5;
    } else if vix_percentile < 10.0 {
        pct += 12.5;
    }

    pct.clamp(0.0, MAX_HEDGE_PCT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn base_is_linear_in_score() {
        assert_eq!(hedge_percentage(0, 50.0, 18.0), 0.0);
        assert_eq!(hedge_percentage(4, 50.0, 18.0), 35.0);
        assert_eq!(hedge_percentage(10, 50.0, 18.0), 87.5);
    }

    #[test]
    fn vix_level_adjustments() {
        assert_eq!(hedge_percentage(6, 50.0, 36.0), 37.5);
        assert_eq!(hedge_percentage(6, 50.0, 30.0), 42.5);
        assert_eq!(hedge_percentage(6, 50.0, 11.0), 65.0);
        assert_eq!(hedge_percentage(10, 50.0, 11.0), 87.5);
    }

    #[test]
    fn percentile_adjustments_stack_on_level() {
        assert_eq!(hedge_percentage(6, 95.0, 30.0), 30.0);
        assert_eq!(hedge_percentage(2, 5.0, 11.0), 42.5);
    }

    #[test]
    fn clamps_only_the_final_value() {
        // 0 - 15 + 12.5 = -2.5 -> 0
        assert_eq!(hedge_percentage(0, 5.0, 40.0), 0.0);
        // 17.5 - 15 + 12.5 = 15
        assert_eq!(hedge_percentage(2, 5.0, 40.0), 15.0);
        assert_eq!(hedge_percentage(1, 95.0, 40.0), 0.0);
    }

    proptest! {
        #[test]
        fn always_within_bounds(score in 0u8..=10, pct in 0.0..=100.0f64, vix in 5.0..90.0f64) {
            let h = hedge_percentage(score, pct, vix);
            prop_assert!((0.0..=MAX_HEDGE_PCT).contains(&h));
        }
    }
}
