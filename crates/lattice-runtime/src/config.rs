//! Run configuration.

use std::time::Duration;

use lattice_rule::{RuleTable, Seed};
use lattice_topology::{BoundaryPolicy, TopologyError};

use crate::error::{Error, Result};

/// Configuration for one lattice run.
///
/// Every limit the runtime observes lives here; nothing is read from
/// process-wide defaults once a [`Lattice`](crate::Lattice) is built.
#[derive(Debug, Clone)]
pub struct LatticeConfig {
    /// Number of positions (at least 1).
    pub size: usize,

    /// Rule number, validated to 0..=255.
    pub rule: u32,

    /// Initial pattern, position 0 first.
    pub seed: Seed,

    /// Number of generations to produce after the seed row.
    pub generations: u64,

    /// Worker thread hint for the hosting runtime. Does not affect results.
    pub parallelism: Option<usize>,

    /// Boundary handling.
    pub boundary: BoundaryPolicy,

    /// Longest the barrier waits for the next output before declaring a stall.
    /// `None` waits indefinitely.
    pub stall_timeout: Option<Duration>,

    /// Upper bound of the random delay inserted before each publish and read.
    pub jitter: Option<Duration>,

    /// Seed for the per-actor jitter generators.
    pub jitter_seed: u64,

    /// Record every release and collection in order.
    pub record_trace: bool,

    /// Collect lock-step and mailbox counters.
    pub telemetry: bool,
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            size: 32,
            rule: 30,
            seed: Seed::from_integer(1 << 16),
            generations: 30,
            parallelism: None,
            boundary: BoundaryPolicy::ZeroPadded,
            stall_timeout: None,
            jitter: None,
            jitter_seed: 0,
            record_trace: false,
            telemetry: false,
        }
    }
}

impl LatticeConfig {
    /// Create a config for the given lattice, rule, seed and generation limit.
    #[must_use]
    pub fn new(size: usize, rule: u32, seed: Seed, generations: u64) -> Self {
        Self {
            size,
            rule,
            seed,
            generations,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_boundary(mut self, boundary: BoundaryPolicy) -> Self {
        self.boundary = boundary;
        self
    }

    #[must_use]
    pub fn with_parallelism(mut self, workers: usize) -> Self {
        self.parallelism = Some(workers);
        self
    }

    #[must_use]
    pub fn with_stall_timeout(mut self, timeout: Duration) -> Self {
        self.stall_timeout = Some(timeout);
        self
    }

    /// Randomize scheduling with delays up to `max`, reproducible via `seed`.
    #[must_use]
    pub fn with_jitter(mut self, max: Duration, seed: u64) -> Self {
        self.jitter = Some(max);
        self.jitter_seed = seed;
        self
    }

    #[must_use]
    pub fn with_trace(mut self) -> Self {
        self.record_trace = true;
        self
    }

    #[must_use]
    pub fn with_telemetry(mut self) -> Self {
        self.telemetry = true;
        self
    }

    /// Defaults overlaid with `LATTICE_SIZE`, `LATTICE_RULE`, `LATTICE_SEED`,
    /// `LATTICE_GENERATIONS` and `LATTICE_PARALLELISM`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(size) = env_value("LATTICE_SIZE")? {
            config.size = size;
        }
        if let Some(rule) = env_value("LATTICE_RULE")? {
            config.rule = rule;
        }
        if let Some(seed) = env_value::<Seed>("LATTICE_SEED")? {
            config.seed = seed;
        }
        if let Some(generations) = env_value("LATTICE_GENERATIONS")? {
            config.generations = generations;
        }
        if let Some(workers) = env_value("LATTICE_PARALLELISM")? {
            config.parallelism = Some(workers);
        }
        Ok(config)
    }

    /// Reject out-of-range values instead of letting them wrap.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(TopologyError::EmptyLattice.into());
        }
        RuleTable::from_number(self.rule)?;
        self.seed.expand(self.size)?;
        if self.stall_timeout == Some(Duration::ZERO) {
            return Err(Error::InvalidConfig("stall timeout must be non-zero".into()));
        }
        if self.parallelism == Some(0) {
            return Err(Error::InvalidConfig("parallelism must be at least 1".into()));
        }
        Ok(())
    }
}

fn env_value<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::InvalidConfig(format!("{key}={raw:?}: {e}"))),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(Error::InvalidConfig(format!("{key}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_rule::RuleError;

    #[test]
    fn defaults_match_reference_run() {
        let config = LatticeConfig::default();
        assert_eq!(config.size, 32);
        assert_eq!(config.rule, 30);
        assert_eq!(config.generations, 30);
        assert_eq!(config.seed, Seed::single(16));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rule_above_255_fails_fast() {
        let config = LatticeConfig::new(8, 256, Seed::default(), 1);
        assert!(matches!(
            config.validate(),
            Err(Error::Rule(RuleError::RuleOutOfRange(256)))
        ));
    }

    #[test]
    fn empty_lattice_fails_fast() {
        let config = LatticeConfig::new(0, 30, Seed::default(), 1);
        assert!(matches!(
            config.validate(),
            Err(Error::Topology(TopologyError::EmptyLattice))
        ));
    }

    #[test]
    fn seed_wider_than_lattice_fails_fast() {
        let config = LatticeConfig::new(4, 30, Seed::single(4), 1);
        assert!(matches!(
            config.validate(),
            Err(Error::Rule(RuleError::SeedOverflow { bit: 4, width: 4 }))
        ));
    }

    #[test]
    fn zero_limits_rejected() {
        let config = LatticeConfig::default().with_stall_timeout(Duration::ZERO);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = LatticeConfig::default().with_parallelism(0);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn builders_compose() {
        let config = LatticeConfig::new(5, 90, Seed::single(2), 3)
            .with_boundary(BoundaryPolicy::Ring)
            .with_jitter(Duration::from_micros(50), 7)
            .with_trace()
            .with_telemetry();
        assert_eq!(config.boundary, BoundaryPolicy::Ring);
        assert_eq!(config.jitter, Some(Duration::from_micros(50)));
        assert_eq!(config.jitter_seed, 7);
        assert!(config.record_trace && config.telemetry);
    }
}
