//! Boundary policies.

use std::fmt;
use std::str::FromStr;

use crate::TopologyError;

/// What lies beyond the first and last positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BoundaryPolicy {
    /// Missing neighbors read as a dead cell.
    #[default]
    ZeroPadded,
    /// Position 0 and position N-1 are neighbors.
    Ring,
}

impl BoundaryPolicy {
    /// Resolve `position + offset` on a lattice of `size`, or `None` if it
    /// falls off the edge.
    pub fn resolve(self, position: usize, offset: isize, size: usize) -> Option<usize> {
        debug_assert!(position < size);
        let target = position as isize + offset;
        match self {
            Self::ZeroPadded => usize::try_from(target).ok().filter(|&t| t < size),
            Self::Ring => Some(target.rem_euclid(size as isize) as usize),
        }
    }
}

impl fmt::Display for BoundaryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroPadded => f.write_str("zero"),
            Self::Ring => f.write_str("ring"),
        }
    }
}

impl FromStr for BoundaryPolicy {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero" | "zero-padded" | "zero_padded" | "fixed" => Ok(Self::ZeroPadded),
            "ring" | "wrap" | "periodic" => Ok(Self::Ring),
            other => Err(TopologyError::UnknownBoundary(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_padded_falls_off_edges() {
        let policy = BoundaryPolicy::ZeroPadded;
        assert_eq!(policy.resolve(0, -1, 4), None);
        assert_eq!(policy.resolve(3, 1, 4), None);
        assert_eq!(policy.resolve(1, -1, 4), Some(0));
        assert_eq!(policy.resolve(2, 1, 4), Some(3));
    }

    #[test]
    fn ring_wraps() {
        let policy = BoundaryPolicy::Ring;
        assert_eq!(policy.resolve(0, -1, 4), Some(3));
        assert_eq!(policy.resolve(3, 1, 4), Some(0));
        assert_eq!(policy.resolve(0, 1, 1), Some(0));
    }

    #[test]
    fn parses_names() {
        assert_eq!("zero".parse(), Ok(BoundaryPolicy::ZeroPadded));
        assert_eq!("Ring".parse(), Ok(BoundaryPolicy::Ring));
        assert!("torus".parse::<BoundaryPolicy>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for policy in [BoundaryPolicy::ZeroPadded, BoundaryPolicy::Ring] {
            assert_eq!(policy.to_string().parse(), Ok(policy));
        }
    }
}
