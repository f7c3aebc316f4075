//! Seeded random delays for shaking out interleavings.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Per-actor delay source. Disabled jitter never suspends.
#[derive(Debug)]
pub struct Jitter {
    max_micros: u64,
    rng: StdRng,
}

impl Jitter {
    /// Jitter that never sleeps.
    pub fn disabled() -> Self {
        Self {
            max_micros: 0,
            rng: StdRng::seed_from_u64(0),
        }
    }

    /// Delays in `0..=max`, drawn from a generator derived from `seed` and `stream`.
    pub fn new(max: Option<Duration>, seed: u64, stream: u64) -> Self {
        let max_micros = max.map_or(0, |m| u64::try_from(m.as_micros()).unwrap_or(u64::MAX));
        Self {
            max_micros,
            rng: StdRng::seed_from_u64(seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_micros > 0
    }

    /// Draw the next delay.
    pub fn next_delay(&mut self) -> Duration {
        if !self.is_enabled() {
            return Duration::ZERO;
        }
        Duration::from_micros(self.rng.gen_range(0..=self.max_micros))
    }

    /// Sleep for the next delay, if any.
    pub async fn pause(&mut self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_never_delays() {
        let mut jitter = Jitter::disabled();
        assert!(!jitter.is_enabled());
        assert_eq!(jitter.next_delay(), Duration::ZERO);
    }

    #[test]
    fn delays_stay_in_bounds() {
        let mut jitter = Jitter::new(Some(Duration::from_micros(100)), 1, 2);
        for _ in 0..1000 {
            assert!(jitter.next_delay() <= Duration::from_micros(100));
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Jitter::new(Some(Duration::from_millis(1)), 42, 3);
        let mut b = Jitter::new(Some(Duration::from_millis(1)), 42, 3);
        let da: Vec<_> = (0..16).map(|_| a.next_delay()).collect();
        let db: Vec<_> = (0..16).map(|_| b.next_delay()).collect();
        assert_eq!(da, db);
    }
}
