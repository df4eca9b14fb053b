//! Exponential backoff with jitter.

use std::time::Duration;
use rand::Rng;

/// Exponent cap; `2^31` is the largest power of two a `u32` multiplier holds.
const MAX_EXPONENT: u32 = 31;

/// Non-jittered delay for an attempt: `min(base * 2^attempt, max)`.
pub fn base_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    let exponential_base = 1u32 << attempt.min(MAX_EXPONENT);
    base.saturating_mul(exponential_base).min(max)
}

/// Calculate exponential backoff delay with jitter.
///
/// The jitter is drawn uniformly from `[0, delay / 10)` and added on top of
/// the capped delay, so the result may slightly exceed `max`.
pub fn calculate_backoff(attempt: u32, base: Duration, max: Duration) -> Duration {
    let capped_delay = base_delay(attempt, base, max);

    let jitter_range = u64::try_from((capped_delay / 10).as_nanos()).unwrap_or(u64::MAX);
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    capped_delay.saturating_add(Duration::from_nanos(jitter))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Duration = Duration::from_secs(1);
    const MAX: Duration = Duration::from_secs(30);

    #[test]
    fn test_base_delay_strictly_increasing_until_cap() {
        let delays: Vec<_> = (0..5).map(|a| base_delay(a, BASE, MAX)).collect();
        assert_eq!(delays[0], Duration::from_secs(1));
        assert_eq!(delays[4], Duration::from_secs(16));
        for pair in delays.windows(2) {
            assert!(pair[0] < pair[1]);
        }

        assert_eq!(base_delay(5, BASE, MAX), MAX);
        assert_eq!(base_delay(200, BASE, MAX), MAX);
    }

    #[test]
    fn test_backoff_jitter_bounds() {
        for attempt in 0..8 {
            let base = base_delay(attempt, BASE, MAX);
            let jittered = calculate_backoff(attempt, BASE, MAX);
            assert!(jittered >= base);
            assert!(jittered < base + base / 10 + Duration::from_nanos(1));
        }
    }

    #[test]
    fn test_sub_millisecond_base_keeps_precision() {
        let base = Duration::from_micros(500);
        assert_eq!(base_delay(0, base, MAX), base);
        assert_eq!(base_delay(3, base, MAX), Duration::from_millis(4));

        let jittered = calculate_backoff(0, base, MAX);
        assert!(jittered >= base);
        assert!(jittered < base + Duration::from_micros(50));
    }

    #[test]
    fn test_huge_attempt_saturates_to_cap() {
        let max = Duration::from_secs(u64::MAX / 4);
        assert_eq!(base_delay(u32::MAX, BASE, max), BASE * (1 << 31));
        assert_eq!(base_delay(u32::MAX, BASE, MAX), MAX);
    }

    #[test]
    fn test_zero_base_has_no_jitter() {
        assert_eq!(calculate_backoff(3, Duration::ZERO, MAX), Duration::ZERO);
    }
}
