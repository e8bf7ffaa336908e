//! Degradation detection (spec §4.6): a resource is degraded when its latest
//! `quality_overall` falls at least [`crate::config::Config::degradation_threshold`]
//! below its rolling 30-day mean.

/// `true` when `latest` is at least `threshold` fraction below `rolling_mean`.
pub fn is_degraded(latest: f32, rolling_mean: f32, threshold: f32) -> bool {
    if rolling_mean <= 0.0 {
        return false;
    }
    latest <= rolling_mean * (1.0 - threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_drop_of_twenty_percent_or_more() {
        assert!(is_degraded(0.6, 0.8, 0.2));
        assert!(is_degraded(0.64, 0.8, 0.2));
    }

    #[test]
    fn does_not_flag_small_drop() {
        assert!(!is_degraded(0.7, 0.8, 0.2));
    }

    #[test]
    fn zero_mean_never_flags() {
        assert!(!is_degraded(0.0, 0.0, 0.2));
    }
}
