//! TTL jitter and refresh delay.
//!
//! Entries written in the same instant should not all expire in the same
//! instant, and hits on many keys at once should not refresh in lockstep.

use std::time::Duration;

use rand::Rng;

/// Adds a uniform offset in `[-bound, +bound]` to `ttl`.
///
/// A zero `ttl` means "no expiry" and is returned unchanged. The result never
/// underflows; it bottoms out at `ttl - bound` clamped to zero, and if that
/// clamp would turn a finite TTL into "no expiry" the smallest non-zero
/// duration is used instead.
pub fn jittered_ttl<R: Rng + ?Sized>(ttl: Duration, bound: Duration, rng: &mut R) -> Duration {
    if ttl.is_zero() || bound.is_zero() {
        return ttl;
    }

    let bound_ms = bound.as_millis().min(i64::MAX as u128) as i64;
    let offset_ms = rng.gen_range(-bound_ms..=bound_ms);
    let offset = Duration::from_millis(offset_ms.unsigned_abs());

    let jittered = if offset_ms >= 0 {
        ttl.saturating_add(offset)
    } else {
        ttl.saturating_sub(offset)
    };

    if jittered.is_zero() {
        Duration::from_millis(1)
    } else {
        jittered
    }
}

/// Picks a delay in `[0, max)` before a background refresh starts.
pub fn refresh_delay<R: Rng + ?Sized>(max: Duration, rng: &mut R) -> Duration {
    let max_ms = max.as_millis().min(u64::MAX as u128) as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rng.gen_range(0..max_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_zero_ttl_passes_through() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            jittered_ttl(Duration::ZERO, Duration::from_secs(15), &mut rng),
            Duration::ZERO
        );
    }

    #[test]
    fn test_zero_bound_is_identity() {
        let mut rng = StdRng::seed_from_u64(1);
        let ttl = Duration::from_secs(300);
        assert_eq!(jittered_ttl(ttl, Duration::ZERO, &mut rng), ttl);
    }

    #[test]
    fn test_five_minutes_within_fifteen_seconds() {
        let mut rng = StdRng::seed_from_u64(42);
        let ttl = Duration::from_secs(300);
        let bound = Duration::from_secs(15);

        for _ in 0..1_000 {
            let got = jittered_ttl(ttl, bound, &mut rng);
            assert!(got >= Duration::from_secs(285), "{:?} below 4m45s", got);
            assert!(got <= Duration::from_secs(315), "{:?} above 5m15s", got);
        }
    }

    #[test]
    fn test_jitter_actually_spreads() {
        let mut rng = StdRng::seed_from_u64(7);
        let ttl = Duration::from_secs(300);
        let distinct: std::collections::HashSet<_> = (0..50)
            .map(|_| jittered_ttl(ttl, Duration::from_secs(15), &mut rng))
            .collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn test_small_ttl_never_becomes_no_expiry() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            let got = jittered_ttl(Duration::from_secs(1), Duration::from_secs(15), &mut rng);
            assert!(!got.is_zero());
            assert!(got <= Duration::from_secs(16));
        }
    }

    #[test]
    fn test_refresh_delay_bounds() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..500 {
            assert!(refresh_delay(Duration::from_secs(1), &mut rng) < Duration::from_secs(1));
        }
        assert_eq!(refresh_delay(Duration::ZERO, &mut rng), Duration::ZERO);
    }
}
